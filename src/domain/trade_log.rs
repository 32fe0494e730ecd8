//! Append-only log of closed trades.

use std::ops::Deref;

use super::position::Trade;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLog {
    trades: Vec<Trade>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: Trade) {
        debug_assert!(
            self.trades
                .last()
                .is_none_or(|prev| prev.exit_date <= trade.entry_date),
            "trades must be recorded in chronological order"
        );
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }
}

impl Deref for TradeLog {
    type Target = [Trade];

    fn deref(&self) -> &[Trade] {
        &self.trades
    }
}

impl<'a> IntoIterator for &'a TradeLog {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}
