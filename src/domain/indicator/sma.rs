//! Simple Moving Average over closing prices.
//!
//! Each window is summed afresh with Neumaier compensation so the average
//! does not drift over long series. A window of identical closes yields
//! that close exactly.
//! Warmup: first (period - 1) values are `None`.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    (0..closes.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &closes[i + 1 - period..=i];
            let first = window[0];
            if window.iter().all(|&c| c == first) {
                Some(first)
            } else {
                Some(compensated_sum(window) / period as f64)
            }
        })
        .collect()
}

fn compensated_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for &v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let values = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        assert!(values[0].is_none());
        assert!(values[1].is_none());
        assert!(values[2].is_some());
        assert!(values[3].is_some());
        assert!(values[4].is_some());
    }

    #[test]
    fn sma_values() {
        let values = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        assert!((values[2].unwrap() - 20.0).abs() < 1e-12);
        assert!((values[3].unwrap() - 30.0).abs() < 1e-12);
        assert!((values[4].unwrap() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_one_is_close() {
        let closes = [3.0, 1.5, 7.25];
        let values = calculate_sma(&closes, 1);
        for (v, c) in values.iter().zip(closes.iter()) {
            assert!((v.unwrap() - c).abs() < 1e-12);
        }
    }

    #[test]
    fn sma_period_longer_than_series() {
        let values = calculate_sma(&[1.0, 2.0], 5);
        assert_eq!(values, vec![None, None]);
    }

    #[test]
    fn sma_zero_period_all_undefined() {
        let values = calculate_sma(&[1.0, 2.0, 3.0], 0);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn sma_empty() {
        assert!(calculate_sma(&[], 200).is_empty());
    }

    #[test]
    fn sma_200_first_defined_at_index_199() {
        let closes: Vec<f64> = (0..210).map(|i| 100.0 + i as f64).collect();
        let values = calculate_sma(&closes, 200);
        assert!(values[198].is_none());
        // mean of 100..=299
        assert!((values[199].unwrap() - 199.5).abs() < 1e-9);
        // mean of 110..=309
        assert!((values[209].unwrap() - 209.5).abs() < 1e-9);
    }

    #[test]
    fn constant_window_is_exact() {
        for close in [1.1, 3.3, 12.34, 0.3, 0.1, 99.99] {
            let closes = vec![close; 400];
            let values = calculate_sma(&closes, 200);
            for v in &values[199..] {
                assert_eq!(*v, Some(close), "close {close}");
            }
        }
    }

    #[test]
    fn compensated_sum_recovers_small_terms() {
        let values = [1.0, 1e100, 1.0, -1e100];
        assert_eq!(compensated_sum(&values), 2.0);
    }
}
