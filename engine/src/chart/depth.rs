//! Order-book depth chart. Independent of the candle pipeline: it maps
//! cumulative bid/ask quantity against price on its own local scale.

use super::chrome;
use super::geometry::{format_tick, nice_ticks, round_to, PlotArea, Point};
use super::svg::{Fill, Layer, Shape, Stroke, SvgDocument};
use super::{LegendEntry, RenderedChart};
use crate::config::RenderSettings;
use crate::error::EngineError;
use shared::models::{DepthLevel, DepthSnapshot};

const DEPTH_FILL_OPACITY: f64 = 0.2;

/// Running quantity totals moving away from the touch: bids by descending
/// price, asks by ascending price. Non-finite or non-positive levels are dropped.
pub fn cumulative_levels(levels: &[DepthLevel], descending: bool) -> Vec<(f64, f64)> {
    let mut sorted: Vec<&DepthLevel> = levels
        .iter()
        .filter(|l| l.price.is_finite() && l.quantity.is_finite() && l.quantity > 0.0)
        .collect();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));
    if descending {
        sorted.reverse();
    }
    let mut total = 0.0;
    sorted
        .into_iter()
        .map(|level| {
            total += level.quantity;
            (level.price, total)
        })
        .collect()
}

/// Step outline in (price, quantity) space, starting on the zero line at the
/// best price.
pub fn step_points(cumulative: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(cumulative.len() * 2 + 1);
    let mut previous = 0.0;
    for &(price, total) in cumulative {
        points.push((price, previous));
        points.push((price, total));
        previous = total;
    }
    points
}

struct DepthScale {
    plot: PlotArea,
    price_min: f64,
    price_max: f64,
    qty_max: f64,
    precision: u8,
}

impl DepthScale {
    fn x(&self, price: f64) -> f64 {
        let span = self.price_max - self.price_min;
        let x = if span.abs() < f64::EPSILON {
            self.plot.left + self.plot.width / 2.0
        } else {
            self.plot.left + (price - self.price_min) / span * self.plot.width
        };
        round_to(x, self.precision)
    }

    fn y(&self, quantity: f64) -> f64 {
        let y = if self.qty_max <= 0.0 {
            self.plot.bottom()
        } else {
            self.plot.bottom() - quantity / self.qty_max * self.plot.height
        };
        round_to(y, self.precision)
    }

    fn point(&self, (price, quantity): (f64, f64)) -> Point {
        Point::new(self.x(price), self.y(quantity))
    }
}

fn side_layer(name: &str, class: &'static str, steps: &[(f64, f64)], color: &str, scale: &DepthScale) -> Layer {
    let mut layer = Layer::data(name);
    if steps.is_empty() {
        return layer;
    }
    let line: Vec<Point> = steps.iter().map(|p| scale.point(*p)).collect();
    let mut area = line.clone();
    if let Some(&(last_price, _)) = steps.last() {
        area.push(scale.point((last_price, 0.0)));
    }
    layer.push(Shape::Polygon {
        class: Some("depth-fill"),
        points: area,
        fill: Fill::translucent(color, DEPTH_FILL_OPACITY),
    });
    layer.push(Shape::Polyline {
        class: Some(class),
        points: line,
        stroke: Stroke::solid(color, 1.5),
    });
    layer
}

/// Renders a depth snapshot. Fails with a user error when both sides are empty.
pub fn render_depth_chart(
    snapshot: &DepthSnapshot,
    precision: u8,
    tight: bool,
    settings: &RenderSettings,
) -> Result<RenderedChart, EngineError> {
    let bids = cumulative_levels(&snapshot.bids, true);
    let asks = cumulative_levels(&snapshot.asks, false);
    if bids.is_empty() && asks.is_empty() {
        return Err(EngineError::NoRenderableData(format!(
            "No order book levels available for {}",
            snapshot.symbol
        )));
    }

    let prices = bids.iter().chain(asks.iter()).map(|(p, _)| *p);
    let (price_lo, price_hi) = prices.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p), hi.max(p)));
    let qty_peak = bids.iter().chain(asks.iter()).map(|(_, q)| *q).fold(0.0, f64::max);

    let price_ticks = nice_ticks(price_lo, price_hi, settings.target_ticks);
    let qty_ticks = nice_ticks(0.0, qty_peak, settings.target_ticks);
    let price_step = if price_ticks.len() > 1 { price_ticks[1] - price_ticks[0] } else { 1.0 };
    let qty_step = if qty_ticks.len() > 1 { qty_ticks[1] - qty_ticks[0] } else { 1.0 };

    let margins = if tight { settings.tight_margins } else { settings.margins };
    let widest = qty_ticks.iter().map(|t| format_tick(*t, qty_step).chars().count()).max().unwrap_or(1);
    let left = margins.left + widest as f64 * settings.label_char_width + settings.label_margin;
    let plot = PlotArea {
        left,
        top: margins.top,
        width: (settings.width - left - margins.right).max(1.0),
        height: (settings.height - margins.top - margins.bottom).max(1.0),
    };
    let scale = DepthScale {
        plot,
        price_min: *price_ticks.first().unwrap_or(&price_lo),
        price_max: *price_ticks.last().unwrap_or(&price_hi),
        qty_max: *qty_ticks.last().unwrap_or(&qty_peak),
        precision,
    };

    let palette = &settings.palette;
    let mut document = SvgDocument::new(settings.width, settings.height, palette.background.as_str(), precision);

    let qty_labels: Vec<(f64, String)> = qty_ticks.iter().map(|q| (scale.y(*q), format_tick(*q, qty_step))).collect();
    document.add_layer(chrome::value_axis(plot, &qty_labels, settings));
    let price_labels: Vec<(f64, String)> = price_ticks
        .iter()
        .map(|p| (scale.x(*p), format_tick(*p, price_step)))
        .collect();
    document.add_layer(chrome::bottom_axis(plot, &price_labels, settings));

    document.add_layer(side_layer("depth-bids", "depth-bid", &step_points(&bids), &palette.depth_bid, &scale));
    document.add_layer(side_layer("depth-asks", "depth-ask", &step_points(&asks), &palette.depth_ask, &scale));

    let mut legend = vec![
        LegendEntry::new("Bids", &palette.depth_bid),
        LegendEntry::new("Asks", &palette.depth_ask),
    ];
    if let (Some(best_bid), Some(best_ask)) = (bids.first(), asks.first()) {
        let mid = (best_bid.0 + best_ask.0) / 2.0;
        let x = scale.x(mid);
        let mut marker = Layer::data("mid-price");
        marker.push(Shape::Line {
            class: Some("mid-price"),
            from: Point::new(x, plot.top),
            to: Point::new(x, plot.bottom()),
            stroke: Stroke::dashed(palette.mid_price.as_str(), 1.0, "4 4"),
        });
        document.add_layer(marker);
        legend.push(LegendEntry::new(format!("Mid {}", format_tick(mid, price_step / 10.0)), &palette.mid_price));
    }
    document.add_layer(chrome::legend(plot, &legend, settings));

    tracing::debug!(
        symbol = %snapshot.symbol,
        bids = bids.len(),
        asks = asks.len(),
        "Depth chart drawn"
    );

    Ok(RenderedChart {
        layer_count: document.data_layer_count(),
        document,
        legend,
        skipped: Vec::new(),
        date_range: None,
    })
}
