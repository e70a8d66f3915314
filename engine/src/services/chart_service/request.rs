// Render request as received from callers, and its one-time resolution into a
// validated chart configuration.
use crate::chart::geometry::MAX_VERTICAL_PADDING;
use crate::chart::options::{
    BandMode, ChartOptions, ChartStyle, CloudMode, HighlightRange, PointAnnotation, PriceZone, PRIMARY_BAND_SIGMA,
};
use crate::config::RenderSettings;
use serde::{Deserialize, Serialize};
use shared::models::TimeFrame;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub symbol: String,
    pub timeframe: TimeFrame,
    pub count: usize,
    pub style: String,
    pub moving_averages: Vec<u32>,
    pub bands: BandMode,
    pub band_sigma: u8,
    pub cloud: CloudMode,
    pub precision: i32,
    pub minify: bool,
    pub simplify_tolerance: f64,
    pub simplify_indicators: bool,
    pub tight_viewport: bool,
    /// Falls back to the configured default when absent.
    pub vertical_padding: Option<f64>,
    pub prefer_file: bool,
    pub auto_save: bool,
    pub output_name: Option<String>,
    /// Falls back to the governor's default when absent.
    pub max_svg_bytes: Option<usize>,
    pub depth_levels: usize,
    pub highlights: Vec<HighlightRange>,
    pub annotations: Vec<PointAnnotation>,
    pub zones: Vec<PriceZone>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        RenderRequest {
            symbol: "BTCUSDT".to_string(),
            timeframe: TimeFrame::Hour1,
            count: 100,
            style: "candlestick".to_string(),
            moving_averages: Vec::new(),
            bands: BandMode::Off,
            band_sigma: PRIMARY_BAND_SIGMA,
            cloud: CloudMode::Off,
            precision: 1,
            minify: true,
            simplify_tolerance: 0.5,
            simplify_indicators: false,
            tight_viewport: false,
            vertical_padding: None,
            prefer_file: false,
            auto_save: false,
            output_name: None,
            max_svg_bytes: None,
            depth_levels: 50,
            highlights: Vec::new(),
            annotations: Vec::new(),
            zones: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOptions {
    pub prefer_file: bool,
    pub auto_save: bool,
    pub output_name: Option<String>,
    pub max_svg_bytes: usize,
}

/// A request after validation; every field is final.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub symbol: String,
    pub timeframe: TimeFrame,
    pub count: usize,
    pub options: ChartOptions,
    pub placement: PlacementOptions,
    pub depth_levels: usize,
    /// Adjustments made while resolving, reported back to the caller.
    pub notes: Vec<String>,
}

impl RenderRequest {
    pub fn resolve(&self, render: &RenderSettings, default_max_svg_bytes: usize) -> ChartConfig {
        let mut notes = Vec::new();

        let style = match self.style.parse::<ChartStyle>() {
            Ok(style) => style,
            Err(reason) => {
                tracing::warn!(style = %self.style, "{}, falling back to candlestick", reason);
                notes.push(format!("{}; using candlestick", reason));
                ChartStyle::Candlestick
            }
        };

        let mut moving_averages: Vec<u32> = self.moving_averages.iter().copied().filter(|p| *p > 0).collect();
        moving_averages.sort_unstable();
        moving_averages.dedup();

        let vertical_padding = if self.tight_viewport {
            0.0
        } else {
            let requested = self.vertical_padding.unwrap_or(render.default_vertical_padding);
            if requested.is_finite() {
                requested.clamp(0.0, MAX_VERTICAL_PADDING)
            } else {
                render.default_vertical_padding
            }
        };

        let simplify_tolerance = if self.simplify_tolerance.is_finite() {
            self.simplify_tolerance.max(0.0)
        } else {
            0.0
        };

        let band_sigma = if self.band_sigma == 0 { PRIMARY_BAND_SIGMA } else { self.band_sigma };

        let options = ChartOptions {
            style,
            moving_averages,
            bands: self.bands,
            band_sigma,
            cloud: self.cloud,
            precision: self.precision.clamp(0, 3) as u8,
            minify: self.minify,
            simplify_tolerance,
            simplify_indicators: self.simplify_indicators,
            tight_viewport: self.tight_viewport,
            vertical_padding,
            highlights: self.highlights.clone(),
            annotations: self.annotations.clone(),
            zones: self.zones.clone(),
        };

        ChartConfig {
            symbol: self.symbol.trim().to_string(),
            timeframe: self.timeframe,
            count: self.count.max(1),
            options,
            placement: PlacementOptions {
                prefer_file: self.prefer_file,
                auto_save: self.auto_save,
                output_name: self.output_name.clone().filter(|n| !n.trim().is_empty()),
                max_svg_bytes: self.max_svg_bytes.unwrap_or(default_max_svg_bytes),
            },
            depth_levels: self.depth_levels.max(1),
            notes,
        }
    }
}
