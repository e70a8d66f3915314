// Indicator calculators backing the local series source. Each produces one
// or more keyed series aligned index-for-index with its input candles.
pub mod bollinger;
pub mod ichimoku;
pub mod sma;

use serde_json::Value;
use shared::models::{Candle, SeriesKey, SeriesValues};

pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    /// `None` where the window has insufficient history.
    fn calculate(&self, data: &[Candle]) -> Vec<(SeriesKey, SeriesValues)>;
}

/// Highest high and lowest low over `data[end + 1 - period..=end]`.
pub(crate) fn window_extremes(data: &[Candle], end: usize, period: usize) -> Option<(f64, f64)> {
    if period == 0 || end + 1 < period || end >= data.len() {
        return None;
    }
    let window = &data[end + 1 - period..=end];
    let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    Some((high, low))
}
