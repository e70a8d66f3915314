//! Chart rendering core: turns a [`ChartFrame`] (or a depth snapshot) into an
//! [`SvgDocument`].
//!
//! The candle pipeline collects the enabled layers, merges their value
//! ranges into one [`Scale`], then draws chrome, data layers and overlays in
//! back-to-front order.

pub mod chrome;
pub mod depth;
pub mod frame;
pub mod geometry;
pub mod layers;
pub mod options;
pub mod simplify;
pub mod svg;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RenderSettings;
use crate::error::EngineError;
use frame::ChartFrame;
use geometry::{Scale, ScaleSpec, ValueRange};
use layers::bands::BandLayer;
use layers::cloud::CloudLayer;
use layers::moving_average::MovingAverageLayer;
use layers::overlays::{draw_annotations, draw_highlights, draw_zones, SkippedOverlay};
use layers::price::{CandlestickLayer, CloseLineLayer};
use layers::{ChartLayer, RenderContext};
use options::{BandMode, ChartOptions, ChartStyle};
use svg::SvgDocument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self { label: label.into(), color: color.into() }
    }
}

/// A drawn chart before serialization and placement.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub document: SvgDocument,
    pub legend: Vec<LegendEntry>,
    /// Non-empty data layers; chrome is not counted.
    pub layer_count: usize,
    pub skipped: Vec<SkippedOverlay>,
    /// First and last displayed candle.
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl RenderedChart {
    /// Serialized markup, whitespace-collapsed when `minified`.
    pub fn markup(&self, minified: bool) -> String {
        let markup = self.document.to_markup();
        if minified {
            svg::minify(&markup)
        } else {
            markup
        }
    }
}

/// The data layers enabled by `options`, back to front.
fn enabled_layers(options: &ChartOptions) -> Vec<Box<dyn ChartLayer>> {
    let mut enabled: Vec<Box<dyn ChartLayer>> = Vec::new();
    if options.cloud.is_enabled() {
        enabled.push(Box::new(CloudLayer::new(options.cloud)));
    }
    if options.bands != BandMode::Off {
        enabled.push(Box::new(BandLayer::new(options.bands, options.band_sigmas())));
    }
    match options.style {
        ChartStyle::Line => enabled.push(Box::new(CloseLineLayer)),
        _ => enabled.push(Box::new(CandlestickLayer)),
    }
    for period in &options.moving_averages {
        enabled.push(Box::new(MovingAverageLayer::new(*period)));
    }
    enabled
}

/// Renders candles plus the enabled indicators and overlays.
pub fn render_candle_chart(
    frame: &ChartFrame,
    options: &ChartOptions,
    settings: &RenderSettings,
) -> Result<RenderedChart, EngineError> {
    let symbol = frame.candles.first().map(|c| c.symbol.clone()).unwrap_or_default();
    if frame.displayed_count() == 0 {
        return Err(EngineError::NoRenderableData(format!("No candles to display for {}", symbol)));
    }

    let layers = enabled_layers(options);
    let mut range = ValueRange::new();
    for layer in &layers {
        range.merge(&layer.value_range(frame));
    }

    let margins = if options.tight_viewport { settings.tight_margins } else { settings.margins };
    let scale = Scale::build(
        &range,
        ScaleSpec {
            settings,
            margins,
            vertical_padding: options.vertical_padding,
            precision: options.precision,
            slots: frame.slots(),
        },
    )
    .ok_or_else(|| EngineError::NoRenderableData(format!("No renderable values for {}", symbol)))?;

    let palette = &settings.palette;
    let ctx = RenderContext { frame, scale: &scale, palette, options };
    let mut document = SvgDocument::new(settings.width, settings.height, palette.background.as_str(), options.precision);
    let mut legend = Vec::new();
    let mut skipped = Vec::new();

    let ticks: Vec<(f64, String)> = scale.ticks.iter().map(|t| (scale.y(*t), scale.tick_label(*t))).collect();
    document.add_layer(chrome::value_axis(scale.plot, &ticks, settings));

    let displayed = frame.displayed_candles();
    let intraday = displayed
        .windows(2)
        .next()
        .map(|w| w[1].timestamp - w[0].timestamp < chrono::Duration::days(1))
        .unwrap_or(true);
    let dates: Vec<(f64, String)> = chrome::spread_indices(displayed.len(), settings.date_labels)
        .into_iter()
        .map(|i| (scale.x(i as f64), chrome::date_label(displayed[i].timestamp, intraday)))
        .collect();
    document.add_layer(chrome::bottom_axis(scale.plot, &dates, settings));

    for outcome in [draw_zones(&ctx), draw_highlights(&ctx)] {
        skipped.extend(outcome.skipped);
        document.add_layer(outcome.layer);
    }

    for layer in &layers {
        let drawn = layer.draw(&ctx);
        if drawn.is_empty() {
            tracing::debug!(layer = %layer.name(), "Layer produced no shapes");
            continue;
        }
        legend.extend(layer.legend(palette).into_iter().map(|(label, color)| LegendEntry { label, color }));
        document.add_layer(drawn);
    }

    let annotations = draw_annotations(&ctx);
    skipped.extend(annotations.skipped);
    document.add_layer(annotations.layer);

    document.add_layer(chrome::legend(scale.plot, &legend, settings));

    Ok(RenderedChart {
        layer_count: document.data_layer_count(),
        document,
        legend,
        skipped,
        date_range: frame.date_range(),
    })
}
