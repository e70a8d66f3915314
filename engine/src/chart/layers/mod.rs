// Overlay renderers. Each layer reports the values it will draw (so the axis
// covers every enabled layer) and then draws itself against the shared scale.
pub mod bands;
pub mod cloud;
pub mod moving_average;
pub mod overlays;
pub mod price;

use super::frame::ChartFrame;
use super::geometry::{Point, Scale, ValueRange};
use super::options::ChartOptions;
use super::simplify::simplify;
use super::svg::{Layer, Shape, Stroke};
use crate::config::ChartPalette;

pub struct RenderContext<'a> {
    pub frame: &'a ChartFrame,
    pub scale: &'a Scale,
    pub palette: &'a ChartPalette,
    pub options: &'a ChartOptions,
}

pub trait ChartLayer {
    fn name(&self) -> String;

    /// Every value this layer will plot.
    fn value_range(&self, frame: &ChartFrame) -> ValueRange;

    fn draw(&self, ctx: &RenderContext<'_>) -> Layer;

    /// Legend entries as (label, color).
    fn legend(&self, _palette: &ChartPalette) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Splits slot-aligned values into contiguous runs of present samples.
pub(crate) fn runs(values: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut out = Vec::new();
    let mut current: Vec<(usize, f64)> = Vec::new();
    for (slot, value) in values.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => current.push((slot, *v)),
            _ => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// One polyline per run of at least two samples; gaps break the line.
pub(crate) fn line_shapes(
    ctx: &RenderContext<'_>,
    values: &[Option<f64>],
    class: &'static str,
    stroke: Stroke,
    simplified: bool,
) -> Vec<Shape> {
    runs(values)
        .into_iter()
        .filter(|run| run.len() >= 2)
        .map(|run| {
            let points: Vec<Point> = run
                .iter()
                .map(|&(slot, v)| ctx.scale.point(slot as f64, v))
                .collect();
            let points = if simplified {
                simplify(&points, ctx.options.simplify_tolerance)
            } else {
                points
            };
            Shape::Polyline { class: Some(class), points, stroke: stroke.clone() }
        })
        .collect()
}

/// Range over the values that fall on display slots.
pub(crate) fn aligned_range(values: Option<Vec<Option<f64>>>) -> ValueRange {
    let mut range = ValueRange::new();
    if let Some(values) = values {
        range.include_all(values);
    }
    range
}
