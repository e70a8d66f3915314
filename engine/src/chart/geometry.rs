//! Axis ranges, "nice" tick generation and the data-to-pixel mapping.

use crate::config::{Margins, RenderSettings};
use shared::utils::format_trimmed;

/// Upper bound on the number of ticks produced for one axis.
pub const MAX_TICKS: usize = 20;

pub const MAX_VERTICAL_PADDING: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Running min/max over every finite sample seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValueRange {
    bounds: Option<(f64, f64)>,
}

impl ValueRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    pub fn include_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        for value in values.into_iter().flatten() {
            self.include(value);
        }
    }

    pub fn merge(&mut self, other: &ValueRange) {
        if let Some((min, max)) = other.bounds {
            self.include(min);
            self.include(max);
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Widens the range by `fraction` of its span on both sides (capped at 20%).
    pub fn padded(&self, fraction: f64) -> Option<(f64, f64)> {
        let (min, max) = self.bounds?;
        let fraction = fraction.clamp(0.0, MAX_VERTICAL_PADDING);
        let pad = (max - min) * fraction;
        Some((min - pad, max + pad))
    }
}

/// Picks a 1/2/5 x 10^n step for `range / target` and returns the ticks
/// covering `[min, max]`, first tick <= min and last tick >= max.
///
/// A zero range returns the single value.
pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let range = max - min;
    if range <= f64::EPSILON * max.abs().max(1.0) {
        return vec![min];
    }

    let step = nice_step(range, target);
    let first = (min / step).floor();
    let last = (max / step).ceil();
    let count = ((last - first) as usize + 1).min(MAX_TICKS);

    (0..count)
        .map(|i| snap((first + i as f64) * step, step))
        .collect()
}

/// The step chosen by [`nice_ticks`] for a span and target tick count.
pub fn nice_step(range: f64, target: usize) -> f64 {
    let target = target.clamp(1, MAX_TICKS / 2) as f64;
    let raw_step = range / target;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let error = target / range * magnitude;

    if error <= 0.15 {
        magnitude * 10.0
    } else if error <= 0.35 {
        magnitude * 5.0
    } else if error <= 0.75 {
        magnitude * 2.0
    } else {
        magnitude
    }
}

// Removes float noise such as 0.30000000000000004 from a tick value.
fn snap(value: f64, step: f64) -> f64 {
    let decimals = step_decimals(step) as i32 + 2;
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Fractional digits needed to print ticks spaced `step` apart.
pub fn step_decimals(step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 || step >= 1.0 {
        return 0;
    }
    ((-step.log10()).ceil() as usize).min(8)
}

pub fn format_tick(value: f64, step: f64) -> String {
    format_trimmed(value, step_decimals(step))
}

/// Rounds to `precision` decimal places (0-3).
pub fn round_to(value: f64, precision: u8) -> f64 {
    let factor = 10f64.powi(precision.min(3) as i32);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Horizontal slot layout: displayed candles plus room reserved for
/// forward-shifted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub visible: usize,
    pub forward: usize,
}

impl SlotLayout {
    pub fn total(&self) -> usize {
        (self.visible + self.forward).max(1)
    }
}

/// Per-request scale state. Derived from the enabled layers' value range and
/// discarded after rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub data_min: f64,
    pub data_max: f64,
    pub axis_min: f64,
    pub axis_max: f64,
    pub ticks: Vec<f64>,
    pub tick_step: f64,
    pub plot: PlotArea,
    pub slots: SlotLayout,
    pub precision: u8,
}

/// Inputs for building a [`Scale`].
#[derive(Debug, Clone, Copy)]
pub struct ScaleSpec<'a> {
    pub settings: &'a RenderSettings,
    pub margins: Margins,
    pub vertical_padding: f64,
    pub precision: u8,
    pub slots: SlotLayout,
}

impl Scale {
    /// Returns `None` when the range holds no finite sample.
    pub fn build(range: &ValueRange, spec: ScaleSpec<'_>) -> Option<Scale> {
        let (data_min, data_max) = range.bounds()?;
        let (padded_min, padded_max) = range.padded(spec.vertical_padding)?;

        let ticks = nice_ticks(padded_min, padded_max, spec.settings.target_ticks);
        let axis_min = *ticks.first()?;
        let axis_max = *ticks.last()?;
        let tick_step = if ticks.len() > 1 { ticks[1] - ticks[0] } else { 1.0 };

        let widest_label = ticks
            .iter()
            .map(|t| format_tick(*t, tick_step).chars().count())
            .max()
            .unwrap_or(1);
        let label_width = widest_label as f64 * spec.settings.label_char_width + spec.settings.label_margin;

        let left = spec.margins.left + label_width;
        let plot = PlotArea {
            left,
            top: spec.margins.top,
            width: (spec.settings.width - left - spec.margins.right).max(1.0),
            height: (spec.settings.height - spec.margins.top - spec.margins.bottom).max(1.0),
        };

        Some(Scale {
            data_min,
            data_max,
            axis_min,
            axis_max,
            ticks,
            tick_step,
            plot,
            slots: spec.slots,
            precision: spec.precision.min(3),
        })
    }

    /// Width of one horizontal slot in pixels.
    pub fn slot_width(&self) -> f64 {
        self.plot.width / self.slots.total() as f64
    }

    /// Center of slot `index`; fractional indices land between slots.
    pub fn x(&self, index: f64) -> f64 {
        let x = self.plot.left + (index + 0.5) / self.slots.total() as f64 * self.plot.width;
        round_to(x, self.precision)
    }

    pub fn y(&self, value: f64) -> f64 {
        let span = self.axis_max - self.axis_min;
        let y = if span.abs() < f64::EPSILON {
            self.plot.top + self.plot.height / 2.0
        } else {
            self.plot.top + (self.axis_max - value) / span * self.plot.height
        };
        round_to(y, self.precision)
    }

    pub fn point(&self, index: f64, value: f64) -> Point {
        Point::new(self.x(index), self.y(value))
    }

    pub fn round(&self, value: f64) -> f64 {
        round_to(value, self.precision)
    }

    pub fn tick_label(&self, value: f64) -> String {
        format_tick(value, self.tick_step)
    }
}
