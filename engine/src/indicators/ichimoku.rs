// Ichimoku cloud components. Values are unshifted: the renderer moves the
// leading spans forward and the lagging span back by the configured shift.
use super::{window_extremes, IndicatorCalculator};
use serde_json::Value;
use shared::models::{Candle, CloudComponent, SeriesKey, SeriesValues};

pub struct Ichimoku {
    conversion: usize,
    base: usize,
    span_b: usize,
}

impl Default for Ichimoku {
    fn default() -> Self {
        Self::new(9, 26, 52)
    }
}

impl Ichimoku {
    pub fn new(conversion: usize, base: usize, span_b: usize) -> Self {
        Self { conversion, base, span_b }
    }

    fn midpoints(data: &[Candle], period: usize) -> SeriesValues {
        (0..data.len())
            .map(|i| window_extremes(data, i, period).map(|(high, low)| (high + low) / 2.0))
            .collect()
    }
}

impl IndicatorCalculator for Ichimoku {
    fn name(&self) -> &str {
        "Ichimoku"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "conversion": self.conversion,
            "base": self.base,
            "span_b": self.span_b,
        })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<(SeriesKey, SeriesValues)> {
        let conversion = Self::midpoints(data, self.conversion);
        let base = Self::midpoints(data, self.base);
        let leading_a: SeriesValues = conversion
            .iter()
            .zip(base.iter())
            .map(|(c, b)| Some((c.as_ref()? + b.as_ref()?) / 2.0))
            .collect();
        let leading_b = Self::midpoints(data, self.span_b);
        let lagging: SeriesValues = data.iter().map(|c| Some(c.close)).collect();

        vec![
            (SeriesKey::Cloud(CloudComponent::Conversion), conversion),
            (SeriesKey::Cloud(CloudComponent::Base), base),
            (SeriesKey::Cloud(CloudComponent::LeadingA), leading_a),
            (SeriesKey::Cloud(CloudComponent::LeadingB), leading_b),
            (SeriesKey::Cloud(CloudComponent::Lagging), lagging),
        ]
    }
}
