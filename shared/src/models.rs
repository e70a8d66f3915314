use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trades: u32,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Minute1 => "1m",
            TimeFrame::Minute5 => "5m",
            TimeFrame::Minute15 => "15m",
            TimeFrame::Minute30 => "30m",
            TimeFrame::Hour1 => "1h",
            TimeFrame::Hour4 => "4h",
            TimeFrame::Day1 => "1d",
            TimeFrame::Week1 => "1w",
        }
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        TimeFrame::Hour1
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "minute" => Ok(TimeFrame::Minute1),
            "5m" => Ok(TimeFrame::Minute5),
            "15m" => Ok(TimeFrame::Minute15),
            "30m" => Ok(TimeFrame::Minute30),
            "1h" | "hour" => Ok(TimeFrame::Hour1),
            "4h" => Ok(TimeFrame::Hour4),
            "1d" | "day" => Ok(TimeFrame::Day1),
            "1w" | "week" => Ok(TimeFrame::Week1),
            other => Err(format!("Unknown timeframe '{}'", other)),
        }
    }
}

/// Which component of the cloud indicator a series holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudComponent {
    Conversion,
    Base,
    LeadingA,
    LeadingB,
    Lagging,
}

/// Identifies one numeric series produced by the indicator source.
///
/// Band keys carry the sigma level as an integer (1, 2, 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "param", rename_all = "snake_case")]
pub enum SeriesKey {
    MovingAverage(u32),
    BandMiddle,
    BandUpper(u8),
    BandLower(u8),
    Cloud(CloudComponent),
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::MovingAverage(period) => write!(f, "ma{}", period),
            SeriesKey::BandMiddle => f.write_str("band_middle"),
            SeriesKey::BandUpper(sigma) => write!(f, "band_upper_{}", sigma),
            SeriesKey::BandLower(sigma) => write!(f, "band_lower_{}", sigma),
            SeriesKey::Cloud(component) => match component {
                CloudComponent::Conversion => f.write_str("cloud_conversion"),
                CloudComponent::Base => f.write_str("cloud_base"),
                CloudComponent::LeadingA => f.write_str("cloud_leading_a"),
                CloudComponent::LeadingB => f.write_str("cloud_leading_b"),
                CloudComponent::Lagging => f.write_str("cloud_lagging"),
            },
        }
    }
}

/// A sequence of optional values aligned with the fetched candles.
/// `None` marks a slot without enough history.
pub type SeriesValues = Vec<Option<f64>>;

pub type SeriesMap = BTreeMap<SeriesKey, SeriesValues>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub symbol: String,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

impl DepthSnapshot {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
