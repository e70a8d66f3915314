// Engine settings, loaded from the embedded default JSON or an explicit file.
// Passed into the chart service at construction; never mutated afterwards.
use crate::error::EngineError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    pub output_dir: PathBuf,
    pub fallback_output_dir: PathBuf,
    pub public_base_url: Option<String>,
    /// Forward shift of the cloud indicator, also the extra history fetched for it.
    pub cloud_shift: usize,
    pub render: RenderSettings,
    pub governor: GovernorSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            output_dir: PathBuf::from("output/charts"),
            fallback_output_dir: std::env::temp_dir().join("chart-engine"),
            public_base_url: None,
            cloud_shift: 26,
            render: RenderSettings::default(),
            governor: GovernorSettings::default(),
        }
    }
}

impl EngineSettings {
    pub fn load_default() -> Result<Self, EngineError> {
        let config_str = include_str!("../../assets/config/default.json");
        serde_json::from_str(config_str)
            .map_err(|e| EngineError::ConfigError(format!("Embedded default configuration is invalid: {}", e)))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings file '{}': {}", path.display(), e)))
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub tight_margins: Margins,
    pub target_ticks: usize,
    /// Approximate width of one tick-label character, in pixels.
    pub label_char_width: f64,
    pub label_margin: f64,
    pub font_size: f64,
    pub default_vertical_padding: f64,
    pub date_labels: usize,
    pub palette: ChartPalette,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            width: 1200.0,
            height: 600.0,
            margins: Margins { top: 30.0, right: 20.0, bottom: 40.0, left: 10.0 },
            tight_margins: Margins { top: 8.0, right: 8.0, bottom: 24.0, left: 4.0 },
            target_ticks: 6,
            label_char_width: 7.0,
            label_margin: 12.0,
            font_size: 11.0,
            default_vertical_padding: 0.03,
            date_labels: 6,
            palette: ChartPalette::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartPalette {
    pub background: String,
    pub grid: String,
    pub axis_text: String,
    pub bullish: String,
    pub bearish: String,
    pub close_line: String,
    pub moving_averages: BTreeMap<u32, String>,
    pub moving_average_fallback: String,
    pub band_fill: String,
    pub band_middle: String,
    pub band_inner: String,
    pub band_primary: String,
    pub band_outer: String,
    pub cloud_bullish: String,
    pub cloud_bearish: String,
    pub cloud_leading_a: String,
    pub cloud_leading_b: String,
    pub cloud_conversion: String,
    pub cloud_base: String,
    pub cloud_lagging: String,
    pub depth_bid: String,
    pub depth_ask: String,
    pub mid_price: String,
    pub highlight: String,
    pub annotation: String,
    pub zone: String,
}

impl Default for ChartPalette {
    fn default() -> Self {
        let moving_averages = [
            (5, "#e91e63"),
            (7, "#ff9800"),
            (10, "#ffc107"),
            (20, "#03a9f4"),
            (25, "#00bcd4"),
            (50, "#9c27b0"),
            (99, "#795548"),
            (100, "#795548"),
            (200, "#607d8b"),
        ]
        .into_iter()
        .map(|(period, color)| (period, color.to_string()))
        .collect();

        ChartPalette {
            background: "#1e1e1e".to_string(),
            grid: "#2e2e2e".to_string(),
            axis_text: "#d1d4dc".to_string(),
            bullish: "#26a69a".to_string(),
            bearish: "#ef5350".to_string(),
            close_line: "#2196f3".to_string(),
            moving_averages,
            moving_average_fallback: "#9e9e9e".to_string(),
            band_fill: "#7e57c2".to_string(),
            band_middle: "#b39ddb".to_string(),
            band_inner: "#90caf9".to_string(),
            band_primary: "#7e57c2".to_string(),
            band_outer: "#f48fb1".to_string(),
            cloud_bullish: "#4caf50".to_string(),
            cloud_bearish: "#f44336".to_string(),
            cloud_leading_a: "#66bb6a".to_string(),
            cloud_leading_b: "#e57373".to_string(),
            cloud_conversion: "#29b6f6".to_string(),
            cloud_base: "#ab47bc".to_string(),
            cloud_lagging: "#fdd835".to_string(),
            depth_bid: "#26a69a".to_string(),
            depth_ask: "#ef5350".to_string(),
            mid_price: "#ffeb3b".to_string(),
            highlight: "#ffeb3b".to_string(),
            annotation: "#ffffff".to_string(),
            zone: "#42a5f5".to_string(),
        }
    }
}

impl ChartPalette {
    pub fn moving_average_color(&self, period: u32) -> &str {
        self.moving_averages
            .get(&period)
            .map(String::as_str)
            .unwrap_or(&self.moving_average_fallback)
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct GovernorSettings {
    /// Budget for `visible_count * estimated_layers` before bands and moving averages are dropped.
    pub layer_budget: usize,
    /// Budget for `visible_count * (1 + band_count)` before the cloud is dropped too.
    pub cloud_budget: usize,
    pub default_max_svg_bytes: usize,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        GovernorSettings {
            layer_budget: 500,
            cloud_budget: 800,
            default_max_svg_bytes: 100_000,
        }
    }
}
