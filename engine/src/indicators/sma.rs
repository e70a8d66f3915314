// Simple Moving Average (SMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::{Candle, SeriesKey, SeriesValues};

pub struct Sma {
    name: String,
    period: usize,
}

impl Sma {
    /// A zero period yields an all-gap series.
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("SMA({})", period),
            period,
        }
    }

    /// Rolling mean of `values`; `None` until `period` values have been seen.
    pub fn rolling_mean(values: &[f64], period: usize) -> SeriesValues {
        if period == 0 || values.len() < period {
            return vec![None; values.len()];
        }
        let mut results = vec![None; period - 1];
        let mut sum: f64 = values.iter().take(period).sum();
        results.push(Some(sum / period as f64));
        for i in period..values.len() {
            sum = sum - values[i - period] + values[i];
            results.push(Some(sum / period as f64));
        }
        results
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<(SeriesKey, SeriesValues)> {
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        vec![(
            SeriesKey::MovingAverage(self.period as u32),
            Self::rolling_mean(&closes, self.period),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::closes;

    fn values(sma: &Sma, candles: &[Candle]) -> SeriesValues {
        sma.calculate(candles).remove(0).1
    }

    #[test]
    fn test_sma_calculation() {
        let candles = closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sma = Sma::new(3);
        assert_eq!(values(&sma, &candles), vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(sma.calculate(&candles)[0].0, SeriesKey::MovingAverage(3));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let candles = closes(&[1.0, 2.0]);
        assert_eq!(values(&Sma::new(3), &candles), vec![None, None]);
    }

    #[test]
    fn test_sma_period_one() {
        let candles = closes(&[1.0, 2.0, 3.0]);
        // SMA(1) is just the close price
        assert_eq!(values(&Sma::new(1), &candles), vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sma_empty_and_zero_period() {
        assert!(values(&Sma::new(3), &[]).is_empty());
        assert_eq!(values(&Sma::new(0), &closes(&[1.0, 2.0])), vec![None, None]);
        assert_eq!(Sma::new(7).parameters(), serde_json::json!({ "period": 7 }));
    }
}
