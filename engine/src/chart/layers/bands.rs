// Volatility bands: a single shaded band, or three nested sigma levels with
// only the primary band shaded. Missing boundary series draw nothing.
use super::{aligned_range, line_shapes, ChartLayer, RenderContext};
use crate::chart::frame::ChartFrame;
use crate::chart::geometry::{Point, ValueRange};
use crate::chart::options::{BandMode, PRIMARY_BAND_SIGMA};
use crate::chart::svg::{Fill, Layer, Shape, Stroke};
use crate::config::ChartPalette;
use shared::models::SeriesKey;

const BAND_FILL_OPACITY: f64 = 0.12;

pub struct BandLayer {
    pub mode: BandMode,
    pub sigmas: Vec<u8>,
}

impl BandLayer {
    pub fn new(mode: BandMode, sigmas: Vec<u8>) -> Self {
        Self { mode, sigmas }
    }

    /// The sigma level whose band gets the fill.
    fn shaded_sigma(&self) -> Option<u8> {
        match self.mode {
            BandMode::Off => None,
            BandMode::Single => self.sigmas.first().copied(),
            BandMode::Multi => Some(PRIMARY_BAND_SIGMA),
        }
    }

    fn boundary_stroke(&self, sigma: u8, palette: &ChartPalette) -> Stroke {
        match self.mode {
            BandMode::Multi => match sigma {
                1 => Stroke::solid(palette.band_inner.as_str(), 0.8),
                3 => Stroke::solid(palette.band_outer.as_str(), 1.2),
                _ => Stroke::solid(palette.band_primary.as_str(), 1.5),
            },
            _ => Stroke::solid(palette.band_primary.as_str(), 1.2),
        }
    }

    fn keys(&self) -> Vec<SeriesKey> {
        let mut keys = vec![SeriesKey::BandMiddle];
        for sigma in &self.sigmas {
            keys.push(SeriesKey::BandUpper(*sigma));
            keys.push(SeriesKey::BandLower(*sigma));
        }
        keys
    }
}

/// Closed polygons covering the area between `upper` and `lower` wherever
/// both are present.
pub(crate) fn band_polygons(
    upper: &[Option<f64>],
    lower: &[Option<f64>],
    to_point: impl Fn(usize, f64) -> Point,
) -> Vec<Vec<Point>> {
    let paired: Vec<Option<(f64, f64)>> = upper
        .iter()
        .zip(lower.iter())
        .map(|(u, l)| match (u, l) {
            (Some(u), Some(l)) => Some((*u, *l)),
            _ => None,
        })
        .collect();

    let mut polygons = Vec::new();
    let mut current: Vec<(usize, f64, f64)> = Vec::new();
    let mut flush = |current: &mut Vec<(usize, f64, f64)>| {
        if current.len() >= 2 {
            let mut points: Vec<Point> = current.iter().map(|&(i, u, _)| to_point(i, u)).collect();
            points.extend(current.iter().rev().map(|&(i, _, l)| to_point(i, l)));
            polygons.push(points);
        }
        current.clear();
    };
    for (i, pair) in paired.iter().enumerate() {
        match pair {
            Some((u, l)) => current.push((i, *u, *l)),
            None => flush(&mut current),
        }
    }
    flush(&mut current);
    polygons
}

impl ChartLayer for BandLayer {
    fn name(&self) -> String {
        "bands".to_string()
    }

    fn value_range(&self, frame: &ChartFrame) -> ValueRange {
        let mut range = ValueRange::new();
        for key in self.keys() {
            range.merge(&aligned_range(frame.aligned(key, 0)));
        }
        range
    }

    fn draw(&self, ctx: &RenderContext<'_>) -> Layer {
        let mut layer = Layer::data(self.name());
        let frame = ctx.frame;

        if let Some(sigma) = self.shaded_sigma() {
            if let (Some(upper), Some(lower)) = (
                frame.aligned(SeriesKey::BandUpper(sigma), 0),
                frame.aligned(SeriesKey::BandLower(sigma), 0),
            ) {
                for points in band_polygons(&upper, &lower, |i, v| ctx.scale.point(i as f64, v)) {
                    layer.push(Shape::Polygon {
                        class: Some("band-fill"),
                        points,
                        fill: Fill::translucent(ctx.palette.band_fill.as_str(), BAND_FILL_OPACITY),
                    });
                }
            }
        }

        for sigma in &self.sigmas {
            let stroke = self.boundary_stroke(*sigma, ctx.palette);
            for key in [SeriesKey::BandUpper(*sigma), SeriesKey::BandLower(*sigma)] {
                match frame.aligned(key, 0) {
                    Some(values) => {
                        for shape in line_shapes(ctx, &values, "band-line", stroke.clone(), ctx.options.simplify_indicators) {
                            layer.push(shape);
                        }
                    }
                    None => tracing::debug!(%key, "Band boundary not provided by source, skipping"),
                }
            }
        }

        if let Some(middle) = frame.aligned(SeriesKey::BandMiddle, 0) {
            let stroke = Stroke::dashed(ctx.palette.band_middle.as_str(), 1.0, "4 3");
            for shape in line_shapes(ctx, &middle, "band-middle", stroke, ctx.options.simplify_indicators) {
                layer.push(shape);
            }
        }
        layer
    }

    fn legend(&self, palette: &ChartPalette) -> Vec<(String, String)> {
        match self.mode {
            BandMode::Off => Vec::new(),
            BandMode::Single => self
                .sigmas
                .iter()
                .map(|s| (format!("Bollinger {}σ", s), palette.band_primary.clone()))
                .collect(),
            BandMode::Multi => self
                .sigmas
                .iter()
                .map(|s| (format!("Bollinger {}σ", s), self.boundary_stroke(*s, palette).color))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::frame::test_support::frame;
    use crate::chart::layers::test_support::scale_for;
    use crate::chart::options::ChartOptions;

    fn seeded_frame(sigmas: &[u8]) -> ChartFrame {
        let mut f = frame(20);
        let middle: Vec<Option<f64>> = (0..20).map(|i| if i < 4 { None } else { Some(100.0) }).collect();
        for sigma in sigmas {
            let offset = *sigma as f64 * 5.0;
            f.series.insert(SeriesKey::BandUpper(*sigma), middle.iter().map(|v| v.map(|m| m + offset)).collect());
            f.series.insert(SeriesKey::BandLower(*sigma), middle.iter().map(|v| v.map(|m| m - offset)).collect());
        }
        f.series.insert(SeriesKey::BandMiddle, middle);
        f
    }

    fn draw(layer_impl: &BandLayer, f: &ChartFrame) -> Layer {
        let scale = scale_for(f, &layer_impl.value_range(f));
        let palette = ChartPalette::default();
        let options = ChartOptions::default();
        let ctx = RenderContext { frame: f, scale: &scale, palette: &palette, options: &options };
        layer_impl.draw(&ctx)
    }

    fn count(layer: &Layer, class: &str) -> usize {
        layer
            .shapes
            .iter()
            .filter(|s| match s {
                Shape::Polygon { class: Some(c), .. } | Shape::Polyline { class: Some(c), .. } => *c == class,
                _ => false,
            })
            .count()
    }

    #[test]
    fn test_band_polygons_close_around_area() {
        let upper = vec![None, Some(3.0), Some(4.0), None, Some(5.0)];
        let lower = vec![None, Some(1.0), Some(2.0), None, Some(1.0)];
        let polygons = band_polygons(&upper, &lower, |i, v| Point::new(i as f64, v));
        assert_eq!(polygons.len(), 1);
        assert_eq!(
            polygons[0],
            vec![Point::new(1.0, 3.0), Point::new(2.0, 4.0), Point::new(2.0, 2.0), Point::new(1.0, 1.0)]
        );
    }

    #[test]
    fn test_single_band_draws_fill_two_boundaries_and_middle() {
        let f = seeded_frame(&[2]);
        let layer = draw(&BandLayer::new(BandMode::Single, vec![2]), &f);
        assert_eq!(count(&layer, "band-fill"), 1);
        assert_eq!(count(&layer, "band-line"), 2);
        assert_eq!(count(&layer, "band-middle"), 1);
    }

    #[test]
    fn test_multi_band_shades_only_primary() {
        let f = seeded_frame(&[1, 2, 3]);
        let layer_impl = BandLayer::new(BandMode::Multi, vec![1, 2, 3]);
        let layer = draw(&layer_impl, &f);
        assert_eq!(count(&layer, "band-fill"), 1);
        assert_eq!(count(&layer, "band-line"), 6);

        let range = layer_impl.value_range(&f);
        assert_eq!(range.bounds(), Some((85.0, 115.0)));
    }

    #[test]
    fn test_unavailable_sigma_draws_nothing_for_missing_keys() {
        let f = seeded_frame(&[2]);
        let layer = draw(&BandLayer::new(BandMode::Single, vec![1]), &f);
        assert_eq!(count(&layer, "band-fill"), 0);
        assert_eq!(count(&layer, "band-line"), 0);
        // the middle line is sigma-independent
        assert_eq!(count(&layer, "band-middle"), 1);
    }
}
