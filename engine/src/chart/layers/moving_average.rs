// One line per moving-average period, colored from the palette.
use super::{aligned_range, line_shapes, ChartLayer, RenderContext};
use crate::chart::frame::ChartFrame;
use crate::chart::geometry::ValueRange;
use crate::chart::svg::{Layer, Stroke};
use crate::config::ChartPalette;
use shared::models::SeriesKey;

pub struct MovingAverageLayer {
    pub period: u32,
}

impl MovingAverageLayer {
    pub fn new(period: u32) -> Self {
        Self { period }
    }

    fn key(&self) -> SeriesKey {
        SeriesKey::MovingAverage(self.period)
    }

    /// A series with fewer than two present samples has nothing to draw.
    pub fn has_enough_data(&self, frame: &ChartFrame) -> bool {
        frame
            .aligned(self.key(), 0)
            .map(|values| values.iter().filter(|v| v.is_some()).count() >= 2)
            .unwrap_or(false)
    }
}

impl ChartLayer for MovingAverageLayer {
    fn name(&self) -> String {
        format!("ma-{}", self.period)
    }

    fn value_range(&self, frame: &ChartFrame) -> ValueRange {
        if !self.has_enough_data(frame) {
            return ValueRange::new();
        }
        aligned_range(frame.aligned(self.key(), 0))
    }

    fn draw(&self, ctx: &RenderContext<'_>) -> Layer {
        let mut layer = Layer::data(self.name());
        if !self.has_enough_data(ctx.frame) {
            tracing::debug!(period = self.period, "Moving average has insufficient data, skipping");
            return layer;
        }
        if let Some(values) = ctx.frame.aligned(self.key(), 0) {
            let stroke = Stroke::solid(ctx.palette.moving_average_color(self.period), 1.5);
            for shape in line_shapes(ctx, &values, "moving-average", stroke, ctx.options.simplify_indicators) {
                layer.push(shape);
            }
        }
        layer
    }

    fn legend(&self, palette: &ChartPalette) -> Vec<(String, String)> {
        vec![(format!("MA {}", self.period), palette.moving_average_color(self.period).to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::frame::test_support::frame;
    use crate::chart::layers::price::CandlestickLayer;
    use crate::chart::layers::test_support::scale_for;
    use crate::chart::options::ChartOptions;
    use crate::chart::svg::Shape;

    #[test]
    fn test_gaps_produce_no_points() {
        let mut f = frame(10);
        let mut values: Vec<Option<f64>> = vec![None; 3];
        values.extend((3..10).map(|i| Some(100.0 + i as f64)));
        values[6] = None;
        f.series.insert(SeriesKey::MovingAverage(3), values);

        let ma = MovingAverageLayer::new(3);
        let mut range = CandlestickLayer.value_range(&f);
        range.merge(&ma.value_range(&f));
        let scale = scale_for(&f, &range);
        let palette = ChartPalette::default();
        let options = ChartOptions::default();
        let ctx = RenderContext { frame: &f, scale: &scale, palette: &palette, options: &options };
        let layer = ma.draw(&ctx);

        // runs 3..=5 and 7..=9 become two polylines of three points each
        assert_eq!(layer.shapes.len(), 2);
        for shape in &layer.shapes {
            match shape {
                Shape::Polyline { points, .. } => assert_eq!(points.len(), 3),
                other => panic!("expected polyline, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_or_short_series_draws_nothing() {
        let mut f = frame(10);
        let ma = MovingAverageLayer::new(50);
        assert!(!ma.has_enough_data(&f));
        assert!(ma.value_range(&f).is_empty());

        let mut values = vec![None; 10];
        values[9] = Some(101.0);
        f.series.insert(SeriesKey::MovingAverage(50), values);
        assert!(!ma.has_enough_data(&f));
    }

    #[test]
    fn test_legend_uses_palette_color() {
        let palette = ChartPalette::default();
        let legend = MovingAverageLayer::new(20).legend(&palette);
        assert_eq!(legend, vec![("MA 20".to_string(), palette.moving_average_color(20).to_string())]);
    }
}
