// Resolved, validated drawing options for one chart.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    Candlestick,
    Line,
    Depth,
}

impl ChartStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartStyle::Candlestick => "candlestick",
            ChartStyle::Line => "line",
            ChartStyle::Depth => "depth",
        }
    }
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "candlestick" | "candle" | "candles" => Ok(ChartStyle::Candlestick),
            "line" => Ok(ChartStyle::Line),
            "depth" | "orderbook" => Ok(ChartStyle::Depth),
            other => Err(format!("Unsupported chart style '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BandMode {
    #[default]
    Off,
    Single,
    Multi,
}

impl BandMode {
    /// Number of band boundaries pairs this mode draws.
    pub fn band_count(&self) -> usize {
        match self {
            BandMode::Off => 0,
            BandMode::Single => 1,
            BandMode::Multi => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BandMode::Off => "off",
            BandMode::Single => "single",
            BandMode::Multi => "multi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CloudMode {
    #[default]
    Off,
    Default,
    Extended,
}

impl CloudMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CloudMode::Off)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAnnotation {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub text: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceZone {
    pub low: f64,
    pub high: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Sigma levels drawn in multi-band mode, inner to outer.
pub const MULTI_BAND_SIGMAS: [u8; 3] = [1, 2, 3];
pub const PRIMARY_BAND_SIGMA: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub style: ChartStyle,
    pub moving_averages: Vec<u32>,
    pub bands: BandMode,
    pub band_sigma: u8,
    pub cloud: CloudMode,
    pub precision: u8,
    pub minify: bool,
    pub simplify_tolerance: f64,
    pub simplify_indicators: bool,
    pub tight_viewport: bool,
    pub vertical_padding: f64,
    pub highlights: Vec<HighlightRange>,
    pub annotations: Vec<PointAnnotation>,
    pub zones: Vec<PriceZone>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            style: ChartStyle::Candlestick,
            moving_averages: Vec::new(),
            bands: BandMode::Off,
            band_sigma: PRIMARY_BAND_SIGMA,
            cloud: CloudMode::Off,
            precision: 1,
            minify: true,
            simplify_tolerance: 0.5,
            simplify_indicators: false,
            tight_viewport: false,
            vertical_padding: 0.03,
            highlights: Vec::new(),
            annotations: Vec::new(),
            zones: Vec::new(),
        }
    }
}

impl ChartOptions {
    /// Sigma levels whose boundaries the band layer will look up.
    pub fn band_sigmas(&self) -> Vec<u8> {
        match self.bands {
            BandMode::Off => Vec::new(),
            BandMode::Single => vec![self.band_sigma],
            BandMode::Multi => MULTI_BAND_SIGMAS.to_vec(),
        }
    }

    /// Human-readable names of the enabled indicator layers.
    pub fn indicator_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.moving_averages.iter().map(|p| format!("MA{}", p)).collect();
        match self.bands {
            BandMode::Off => {}
            BandMode::Single => names.push(format!("BB{}σ", self.band_sigma)),
            BandMode::Multi => names.push("BB1-3σ".to_string()),
        }
        match self.cloud {
            CloudMode::Off => {}
            CloudMode::Default => names.push("Ichimoku".to_string()),
            CloudMode::Extended => names.push("Ichimoku+".to_string()),
        }
        names
    }
}
