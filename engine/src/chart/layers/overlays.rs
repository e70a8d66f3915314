// Auxiliary overlays: highlighted date ranges, point annotations and price
// zones. Every requested item is either drawn or reported as skipped.
use super::RenderContext;
use crate::chart::geometry::Point;
use crate::chart::svg::{Fill, Layer, Shape, Stroke, TextAnchor};
use serde::Serialize;
use std::fmt;

const HIGHLIGHT_OPACITY: f64 = 0.15;
const ZONE_OPACITY: f64 = 0.12;
const MARKER_RADIUS: f64 = 3.0;
/// Label offsets above the marker, alternated between neighbouring annotations.
const ANNOTATION_OFFSETS: [f64; 2] = [18.0, 34.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Highlight,
    Annotation,
    Zone,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Highlight => "highlight",
            OverlayKind::Annotation => "annotation",
            OverlayKind::Zone => "zone",
        }
    }
}

/// A requested overlay item that was not drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedOverlay {
    pub kind: OverlayKind,
    /// Position of the item in the request.
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for SkippedOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} skipped: {}", self.kind.as_str(), self.index, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOutcome {
    pub layer: Layer,
    pub skipped: Vec<SkippedOverlay>,
}

impl OverlayOutcome {
    fn new(name: &str) -> Self {
        Self { layer: Layer::data(name), skipped: Vec::new() }
    }

    fn skip(&mut self, kind: OverlayKind, index: usize, reason: impl Into<String>) {
        let skipped = SkippedOverlay { kind, index, reason: reason.into() };
        tracing::debug!(kind = kind.as_str(), index, reason = %skipped.reason, "Overlay item skipped");
        self.skipped.push(skipped);
    }
}

/// Shades the slots between two displayed timestamps. Both endpoints must
/// match a displayed candle exactly.
pub fn draw_highlights(ctx: &RenderContext<'_>) -> OverlayOutcome {
    let mut outcome = OverlayOutcome::new("highlights");
    let plot = ctx.scale.plot;
    let half_slot = ctx.scale.slot_width() / 2.0;

    for (index, range) in ctx.options.highlights.iter().enumerate() {
        let (Some(start), Some(end)) = (ctx.frame.slot_of(range.start), ctx.frame.slot_of(range.end)) else {
            outcome.skip(OverlayKind::Highlight, index, "endpoint not in displayed candles");
            continue;
        };
        let (first, last) = (start.min(end), start.max(end));
        let left = ctx.scale.round(ctx.scale.x(first as f64) - half_slot);
        let right = ctx.scale.round(ctx.scale.x(last as f64) + half_slot);
        let color = range.color.as_deref().unwrap_or(ctx.palette.highlight.as_str());

        outcome.layer.push(Shape::Rect {
            class: Some("highlight"),
            x: left,
            y: plot.top,
            width: ctx.scale.round(right - left),
            height: plot.height,
            fill: Fill::translucent(color, HIGHLIGHT_OPACITY),
            stroke: None,
        });
        if let Some(label) = &range.label {
            outcome.layer.push(Shape::Text {
                class: Some("highlight-label"),
                at: Point::new(left + 4.0, plot.top + 12.0),
                content: label.clone(),
                anchor: TextAnchor::Start,
                size: 10.0,
                color: ctx.palette.axis_text.clone(),
            });
        }
    }
    outcome
}

/// Marker, dashed stem and label for each annotation; labels alternate
/// between two heights so neighbours overlap less.
pub fn draw_annotations(ctx: &RenderContext<'_>) -> OverlayOutcome {
    let mut outcome = OverlayOutcome::new("annotations");
    let plot = ctx.scale.plot;
    let mut drawn = 0usize;

    for (index, note) in ctx.options.annotations.iter().enumerate() {
        let Some(slot) = ctx.frame.slot_of(note.time) else {
            outcome.skip(OverlayKind::Annotation, index, "time not in displayed candles");
            continue;
        };
        if !note.price.is_finite() || note.price < ctx.scale.axis_min || note.price > ctx.scale.axis_max {
            outcome.skip(OverlayKind::Annotation, index, "price outside the axis range");
            continue;
        }

        let color = note.color.as_deref().unwrap_or(ctx.palette.annotation.as_str());
        let marker = ctx.scale.point(slot as f64, note.price);
        let offset = ANNOTATION_OFFSETS[drawn % ANNOTATION_OFFSETS.len()];
        let label_y = ctx.scale.round((marker.y - offset).max(plot.top + 10.0));
        drawn += 1;

        outcome.layer.push(Shape::Line {
            class: Some("annotation-stem"),
            from: marker,
            to: Point::new(marker.x, label_y),
            stroke: Stroke::dashed(color, 1.0, "2 2"),
        });
        outcome.layer.push(Shape::Circle {
            class: Some("annotation-marker"),
            center: marker,
            radius: MARKER_RADIUS,
            fill: Fill::solid(color),
        });
        outcome.layer.push(Shape::Text {
            class: Some("annotation-label"),
            at: Point::new(marker.x, label_y - 2.0),
            content: note.text.clone(),
            anchor: TextAnchor::Middle,
            size: 10.0,
            color: color.to_string(),
        });
    }
    outcome
}

/// Horizontal bands between two prices, clipped to the axis.
pub fn draw_zones(ctx: &RenderContext<'_>) -> OverlayOutcome {
    let mut outcome = OverlayOutcome::new("zones");
    let plot = ctx.scale.plot;

    for (index, zone) in ctx.options.zones.iter().enumerate() {
        if !zone.low.is_finite() || !zone.high.is_finite() {
            outcome.skip(OverlayKind::Zone, index, "non-numeric bound");
            continue;
        }
        let (low, high) = (zone.low.min(zone.high), zone.low.max(zone.high));
        if high < ctx.scale.axis_min || low > ctx.scale.axis_max {
            outcome.skip(OverlayKind::Zone, index, "zone outside the axis range");
            continue;
        }
        let top = ctx.scale.y(high.min(ctx.scale.axis_max));
        let bottom = ctx.scale.y(low.max(ctx.scale.axis_min));
        let color = zone.color.as_deref().unwrap_or(ctx.palette.zone.as_str());

        outcome.layer.push(Shape::Rect {
            class: Some("zone"),
            x: plot.left,
            y: top,
            width: plot.width,
            height: ctx.scale.round((bottom - top).max(1.0)),
            fill: Fill::translucent(color, ZONE_OPACITY),
            stroke: None,
        });
        if let Some(label) = &zone.label {
            outcome.layer.push(Shape::Text {
                class: Some("zone-label"),
                at: Point::new(plot.left + 4.0, top + 11.0),
                content: label.clone(),
                anchor: TextAnchor::Start,
                size: 10.0,
                color: ctx.palette.axis_text.clone(),
            });
        }
    }
    outcome
}
