// Non-data decoration: grid, tick labels, date labels and the legend. Built
// as chrome layers so they never count toward the artifact's layer count.
use super::geometry::{PlotArea, Point};
use super::svg::{Fill, Layer, Shape, Stroke, TextAnchor};
use super::LegendEntry;
use crate::config::RenderSettings;
use chrono::{DateTime, Utc};

const LEGEND_SWATCH: f64 = 10.0;
const LEGEND_GAP: f64 = 14.0;

/// Horizontal grid line and a right-aligned label for each `(y, label)` tick.
pub fn value_axis(plot: PlotArea, ticks: &[(f64, String)], settings: &RenderSettings) -> Layer {
    let palette = &settings.palette;
    let mut layer = Layer::chrome("axis");
    for (y, label) in ticks {
        layer.push(Shape::Line {
            class: Some("grid"),
            from: Point::new(plot.left, *y),
            to: Point::new(plot.right(), *y),
            stroke: Stroke::solid(palette.grid.as_str(), 1.0),
        });
        layer.push(Shape::Text {
            class: Some("tick-label"),
            at: Point::new(plot.left - 6.0, y + settings.font_size / 3.0),
            content: label.clone(),
            anchor: TextAnchor::End,
            size: settings.font_size,
            color: palette.axis_text.clone(),
        });
    }
    layer
}

/// Centered labels under the plot at the given x positions.
pub fn bottom_axis(plot: PlotArea, labels: &[(f64, String)], settings: &RenderSettings) -> Layer {
    let mut layer = Layer::chrome("time-axis");
    for (x, label) in labels {
        layer.push(Shape::Text {
            class: Some("date-label"),
            at: Point::new(*x, plot.bottom() + settings.font_size + 4.0),
            content: label.clone(),
            anchor: TextAnchor::Middle,
            size: settings.font_size,
            color: settings.palette.axis_text.clone(),
        });
    }
    layer
}

/// Up to `wanted` evenly spread indices out of `count`, first and last included.
pub fn spread_indices(count: usize, wanted: usize) -> Vec<usize> {
    if count == 0 || wanted == 0 {
        return Vec::new();
    }
    if wanted == 1 || count == 1 {
        return vec![0];
    }
    let wanted = wanted.min(count);
    let mut indices: Vec<usize> = (0..wanted)
        .map(|i| ((i * (count - 1)) as f64 / (wanted - 1) as f64).round() as usize)
        .collect();
    indices.dedup();
    indices
}

/// Date format for the axis: time of day when candles are less than a day apart.
pub fn date_label(timestamp: DateTime<Utc>, intraday: bool) -> String {
    if intraday {
        timestamp.format("%m-%d %H:%M").to_string()
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}

/// Swatch and label for each entry, laid out left to right inside the top of
/// the plot.
pub fn legend(plot: PlotArea, entries: &[LegendEntry], settings: &RenderSettings) -> Layer {
    let mut layer = Layer::chrome("legend");
    let mut x = plot.left + 8.0;
    let y = plot.top + 8.0;
    for entry in entries {
        layer.push(Shape::Rect {
            class: Some("legend-swatch"),
            x,
            y,
            width: LEGEND_SWATCH,
            height: LEGEND_SWATCH,
            fill: Fill::solid(entry.color.as_str()),
            stroke: None,
        });
        layer.push(Shape::Text {
            class: Some("legend-label"),
            at: Point::new(x + LEGEND_SWATCH + 4.0, y + LEGEND_SWATCH - 1.0),
            content: entry.label.clone(),
            anchor: TextAnchor::Start,
            size: settings.font_size,
            color: settings.palette.axis_text.clone(),
        });
        x += LEGEND_SWATCH + 4.0 + entry.label.chars().count() as f64 * settings.label_char_width + LEGEND_GAP;
    }
    layer
}
