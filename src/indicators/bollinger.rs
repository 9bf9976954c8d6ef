//! Bollinger Bands
//!
//! Volatility envelope around a simple moving average:
//!
//! - Middle band: `SMA(close, period)`
//! - Upper/lower: middle ± `std_dev` × population standard deviation of the
//!   window, computed around the SMA itself (not a separate mean)

use crate::{indicators::sma, Candle, Period};

/// Bollinger output: three series, all positionally aligned with the input
/// bars.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl BollingerSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }
}

/// Bollinger bands over the close series.
///
/// The first `period - 1` entries of every band are `None`. See
/// [`crate::indicators::BOLLINGER_PERIOD`] and
/// [`crate::indicators::BOLLINGER_STD_DEV`] for the conventional 20/2.0
/// parameters.
pub fn bollinger(candles: &[Candle], period: Period, std_dev: f64) -> BollingerSeries {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let n = closes.len();
    let p = period.get();

    let middle = sma(&closes, period);
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    for i in 0..n {
        let Some(mid) = middle[i] else { continue };
        let window = &closes[(i + 1 - p)..=i];
        // population variance around the SMA
        let variance = window.iter().map(|x| (x - mid).powi(2)).sum::<f64>() / p as f64;
        let band = std_dev * variance.sqrt();
        if band.is_finite() {
            upper[i] = Some(mid + band);
            lower[i] = Some(mid - band);
        }
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closes(values: &[f64]) -> Vec<Candle> {
        values
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(c, c + 1.0, c - 1.0, c, i as i64))
            .collect()
    }

    #[test]
    fn test_bollinger_alignment_and_prefix() {
        let candles = closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = bollinger(&candles, Period::new(3).unwrap(), 2.0);
        assert_eq!(out.len(), candles.len());
        assert!(out.middle[..2].iter().all(Option::is_none));
        assert!(out.upper[..2].iter().all(Option::is_none));
        assert!(out.middle[2..].iter().all(Option::is_some));
    }

    #[test]
    fn test_bollinger_band_width() {
        // window [1, 2, 3]: SMA = 2, population variance = 2/3
        let candles = closes(&[1.0, 2.0, 3.0]);
        let out = bollinger(&candles, Period::new(3).unwrap(), 2.0);
        let mid = out.middle[2].unwrap();
        let expected_band = 2.0 * (2.0f64 / 3.0).sqrt();
        assert!((mid - 2.0).abs() < 1e-12);
        assert!((out.upper[2].unwrap() - (mid + expected_band)).abs() < 1e-12);
        assert!((out.lower[2].unwrap() - (mid - expected_band)).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_flat_window_collapses_bands() {
        let candles = closes(&[5.0, 5.0, 5.0, 5.0]);
        let out = bollinger(&candles, Period::new(4).unwrap(), 2.0);
        assert_eq!(out.upper[3], Some(5.0));
        assert_eq!(out.lower[3], Some(5.0));
    }
}
