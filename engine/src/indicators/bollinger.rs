// Bollinger bands: SMA middle line with boundaries at several standard
// deviations (population) of the same window.
use super::sma::Sma;
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::{Candle, SeriesKey, SeriesValues};

pub struct Bollinger {
    name: String,
    period: usize,
    sigmas: Vec<u8>,
}

impl Bollinger {
    pub fn new(period: usize, sigmas: Vec<u8>) -> Self {
        Self {
            name: format!("BB({})", period),
            period,
            sigmas,
        }
    }

    fn deviations(closes: &[f64], middle: &SeriesValues, period: usize) -> SeriesValues {
        middle
            .iter()
            .enumerate()
            .map(|(i, mean)| {
                let mean = (*mean)?;
                let window = &closes[i + 1 - period..=i];
                let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / period as f64;
                Some(variance.sqrt())
            })
            .collect()
    }
}

impl IndicatorCalculator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "sigmas": self.sigmas })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<(SeriesKey, SeriesValues)> {
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        let middle = Sma::rolling_mean(&closes, self.period);
        let deviation = Self::deviations(&closes, &middle, self.period);

        let mut series = Vec::with_capacity(1 + self.sigmas.len() * 2);
        for sigma in &self.sigmas {
            let width = *sigma as f64;
            let offset = |sign: f64| -> SeriesValues {
                middle
                    .iter()
                    .zip(deviation.iter())
                    .map(|(m, d)| Some(m.as_ref()? + sign * width * d.as_ref()?))
                    .collect()
            };
            series.push((SeriesKey::BandUpper(*sigma), offset(1.0)));
            series.push((SeriesKey::BandLower(*sigma), offset(-1.0)));
        }
        series.push((SeriesKey::BandMiddle, middle));
        series
    }
}
