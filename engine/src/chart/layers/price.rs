// Price layer: candlesticks or a close-price line, never both.
use super::{line_shapes, ChartLayer, RenderContext};
use crate::chart::frame::ChartFrame;
use crate::chart::geometry::{Point, ValueRange};
use crate::chart::svg::{Fill, Layer, Shape, Stroke};
use crate::config::ChartPalette;

/// Body width as a fraction of the slot width, by displayed candle count.
pub fn body_width_ratio(candle_count: usize) -> f64 {
    match candle_count {
        0..=30 => 0.8,
        31..=60 => 0.7,
        _ => 0.6,
    }
}

/// Minimum body height so doji candles stay visible.
const MIN_BODY_HEIGHT: f64 = 1.0;

pub struct CandlestickLayer;

impl ChartLayer for CandlestickLayer {
    fn name(&self) -> String {
        "price".to_string()
    }

    fn value_range(&self, frame: &ChartFrame) -> ValueRange {
        let mut range = ValueRange::new();
        for candle in frame.displayed_candles() {
            range.include(candle.high);
            range.include(candle.low);
        }
        range
    }

    fn draw(&self, ctx: &RenderContext<'_>) -> Layer {
        let mut layer = Layer::data(self.name());
        let candles = ctx.frame.displayed_candles();
        let body_width = ctx.scale.round(ctx.scale.slot_width() * body_width_ratio(candles.len()));

        for (i, candle) in candles.iter().enumerate() {
            let color = if candle.is_bullish() { &ctx.palette.bullish } else { &ctx.palette.bearish };
            let x = ctx.scale.x(i as f64);

            layer.push(Shape::Line {
                class: Some("candle-wick"),
                from: Point::new(x, ctx.scale.y(candle.high)),
                to: Point::new(x, ctx.scale.y(candle.low)),
                stroke: Stroke::solid(color.as_str(), 1.0),
            });

            let y_open = ctx.scale.y(candle.open);
            let y_close = ctx.scale.y(candle.close);
            let top = y_open.min(y_close);
            let height = ctx.scale.round((y_open - y_close).abs().max(MIN_BODY_HEIGHT));
            layer.push(Shape::Rect {
                class: Some("candle-body"),
                x: ctx.scale.round(x - body_width / 2.0),
                y: top,
                width: body_width,
                height,
                fill: Fill::solid(color.as_str()),
                stroke: None,
            });
        }
        layer
    }

    fn legend(&self, palette: &ChartPalette) -> Vec<(String, String)> {
        vec![
            ("Bullish candle".to_string(), palette.bullish.clone()),
            ("Bearish candle".to_string(), palette.bearish.clone()),
        ]
    }
}

pub struct CloseLineLayer;

impl CloseLineLayer {
    fn closes(frame: &ChartFrame) -> Vec<Option<f64>> {
        frame.displayed_candles().iter().map(|c| Some(c.close)).collect()
    }
}

impl ChartLayer for CloseLineLayer {
    fn name(&self) -> String {
        "price".to_string()
    }

    fn value_range(&self, frame: &ChartFrame) -> ValueRange {
        let mut range = ValueRange::new();
        range.include_all(Self::closes(frame));
        range
    }

    fn draw(&self, ctx: &RenderContext<'_>) -> Layer {
        let mut layer = Layer::data(self.name());
        let closes = Self::closes(ctx.frame);
        let stroke = Stroke::solid(ctx.palette.close_line.as_str(), 1.5);
        if closes.len() == 1 {
            // a lone close still gets a marker
            if let Some(Some(close)) = closes.first() {
                layer.push(Shape::Circle {
                    class: Some("close-point"),
                    center: ctx.scale.point(0.0, *close),
                    radius: 2.0,
                    fill: Fill::solid(ctx.palette.close_line.as_str()),
                });
            }
            return layer;
        }
        for shape in line_shapes(ctx, &closes, "close-line", stroke, true) {
            layer.push(shape);
        }
        layer
    }

    fn legend(&self, palette: &ChartPalette) -> Vec<(String, String)> {
        vec![("Close".to_string(), palette.close_line.clone())]
    }
}
