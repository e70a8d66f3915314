//! Cloud indicator: two forward-shifted component lines with the area between
//! them filled bullish where the first component is on top and bearish
//! where the second is.
//!
//! Where the components swap order between two samples the fill is split at
//! the interpolated crossing, so each polygon closes with zero width there. A
//! missing sample closes the current polygon without interpolation.

use super::{aligned_range, line_shapes, ChartLayer, RenderContext};
use crate::chart::frame::ChartFrame;
use crate::chart::geometry::{Point, ValueRange};
use crate::chart::options::CloudMode;
use crate::chart::svg::{Fill, Layer, Shape, Stroke};
use crate::config::ChartPalette;
use shared::models::{CloudComponent, SeriesKey};

const CLOUD_FILL_OPACITY: f64 = 0.18;

/// A cloud polygon in data space: `x` is a (possibly fractional) slot index.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudPolygon {
    pub bullish: bool,
    /// First component, left to right.
    pub first: Vec<(f64, f64)>,
    /// Second component, left to right.
    pub second: Vec<(f64, f64)>,
}

impl CloudPolygon {
    fn start(bullish: bool, x: f64, a: f64, b: f64) -> Self {
        Self { bullish, first: vec![(x, a)], second: vec![(x, b)] }
    }

    fn push(&mut self, x: f64, a: f64, b: f64) {
        self.first.push((x, a));
        self.second.push((x, b));
    }

    /// Outline: first component forward, second component backward.
    pub fn outline(&self) -> Vec<(f64, f64)> {
        self.first.iter().chain(self.second.iter().rev()).copied().collect()
    }
}

/// Parameter in [0, 1] where the segments `a0->a1` and `b0->b1` meet.
pub fn crossing_t(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    let denominator = (b1 - b0) - (a1 - a0);
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }
    ((a0 - b0) / denominator).clamp(0.0, 1.0)
}

fn close_polygon(polygon: Option<CloudPolygon>, polygons: &mut Vec<CloudPolygon>) {
    if let Some(polygon) = polygon {
        if polygon.first.len() >= 2 {
            polygons.push(polygon);
        }
    }
}

/// Splits the area between two slot-aligned series into bullish/bearish
/// polygons. Equal samples keep the current polygon's side.
pub fn build_cloud(first: &[Option<f64>], second: &[Option<f64>]) -> Vec<CloudPolygon> {
    let mut polygons = Vec::new();
    let mut current: Option<CloudPolygon> = None;
    let mut previous: Option<(f64, f64)> = None;

    for (slot, pair) in first.iter().zip(second.iter()).enumerate() {
        let x = slot as f64;
        let (a, b) = match pair {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => (*a, *b),
            _ => {
                close_polygon(current.take(), &mut polygons);
                previous = None;
                continue;
            }
        };

        let current_side = current.as_ref().map(|p| p.bullish);
        let bullish = if a > b {
            true
        } else if a < b {
            false
        } else {
            current_side.unwrap_or(true)
        };

        match (current.take(), previous) {
            (Some(mut polygon), Some((a0, b0))) if polygon.bullish != bullish => {
                let t = crossing_t(a0, a, b0, b);
                let cross_x = x - 1.0 + t;
                let cross_v = a0 + t * (a - a0);
                polygon.push(cross_x, cross_v, cross_v);
                close_polygon(Some(polygon), &mut polygons);

                let mut next = CloudPolygon::start(bullish, cross_x, cross_v, cross_v);
                next.push(x, a, b);
                current = Some(next);
            }
            (Some(mut polygon), _) => {
                polygon.push(x, a, b);
                current = Some(polygon);
            }
            (None, _) => current = Some(CloudPolygon::start(bullish, x, a, b)),
        }
        previous = Some((a, b));
    }
    close_polygon(current, &mut polygons);
    polygons
}

pub struct CloudLayer {
    pub mode: CloudMode,
}

impl CloudLayer {
    pub fn new(mode: CloudMode) -> Self {
        Self { mode }
    }

    fn shift(frame: &ChartFrame) -> isize {
        frame.forward_shift as isize
    }

    /// (component, slot offset, class, dashed) for every line this mode draws.
    fn lines(&self, frame: &ChartFrame) -> Vec<(CloudComponent, isize, &'static str, bool)> {
        let shift = Self::shift(frame);
        let mut lines = vec![
            (CloudComponent::LeadingA, shift, "cloud-leading-a", false),
            (CloudComponent::LeadingB, shift, "cloud-leading-b", false),
        ];
        if self.mode == CloudMode::Extended {
            lines.push((CloudComponent::Conversion, 0, "cloud-conversion", false));
            lines.push((CloudComponent::Base, 0, "cloud-base", false));
            lines.push((CloudComponent::Lagging, -shift, "cloud-lagging", true));
        }
        lines
    }

    fn color<'p>(component: CloudComponent, palette: &'p ChartPalette) -> &'p str {
        match component {
            CloudComponent::LeadingA => &palette.cloud_leading_a,
            CloudComponent::LeadingB => &palette.cloud_leading_b,
            CloudComponent::Conversion => &palette.cloud_conversion,
            CloudComponent::Base => &palette.cloud_base,
            CloudComponent::Lagging => &palette.cloud_lagging,
        }
    }
}

impl ChartLayer for CloudLayer {
    fn name(&self) -> String {
        "cloud".to_string()
    }

    fn value_range(&self, frame: &ChartFrame) -> ValueRange {
        let mut range = ValueRange::new();
        for (component, offset, _, _) in self.lines(frame) {
            range.merge(&aligned_range(frame.aligned(SeriesKey::Cloud(component), offset)));
        }
        range
    }

    fn draw(&self, ctx: &RenderContext<'_>) -> Layer {
        let mut layer = Layer::data(self.name());
        let frame = ctx.frame;
        let shift = Self::shift(frame);

        if let (Some(a), Some(b)) = (
            frame.aligned(SeriesKey::Cloud(CloudComponent::LeadingA), shift),
            frame.aligned(SeriesKey::Cloud(CloudComponent::LeadingB), shift),
        ) {
            for polygon in build_cloud(&a, &b) {
                let (class, color) = if polygon.bullish {
                    ("cloud-bullish", &ctx.palette.cloud_bullish)
                } else {
                    ("cloud-bearish", &ctx.palette.cloud_bearish)
                };
                let points: Vec<Point> = polygon
                    .outline()
                    .into_iter()
                    .map(|(x, v)| ctx.scale.point(x, v))
                    .collect();
                layer.push(Shape::Polygon {
                    class: Some(class),
                    points,
                    fill: Fill::translucent(color.as_str(), CLOUD_FILL_OPACITY),
                });
            }
        }

        for (component, offset, class, dashed) in self.lines(frame) {
            let Some(values) = frame.aligned(SeriesKey::Cloud(component), offset) else {
                tracing::debug!(?component, "Cloud component not provided by source, skipping");
                continue;
            };
            let color = Self::color(component, ctx.palette);
            let stroke = if dashed {
                Stroke::dashed(color, 1.0, "5 3").with_opacity(0.8)
            } else {
                Stroke::solid(color, 1.2)
            };
            for shape in line_shapes(ctx, &values, class, stroke, ctx.options.simplify_indicators) {
                layer.push(shape);
            }
        }
        layer
    }

    fn legend(&self, palette: &ChartPalette) -> Vec<(String, String)> {
        let mut entries = vec![
            ("Cloud (bullish)".to_string(), palette.cloud_bullish.clone()),
            ("Cloud (bearish)".to_string(), palette.cloud_bearish.clone()),
            ("Leading span A".to_string(), palette.cloud_leading_a.clone()),
            ("Leading span B".to_string(), palette.cloud_leading_b.clone()),
        ];
        if self.mode == CloudMode::Extended {
            entries.push(("Conversion line".to_string(), palette.cloud_conversion.clone()));
            entries.push(("Base line".to_string(), palette.cloud_base.clone()));
            entries.push(("Lagging span".to_string(), palette.cloud_lagging.clone()));
        }
        entries
    }
}
