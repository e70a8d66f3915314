// Result envelope returned to callers.
use crate::chart::LegendEntry;
use crate::error::ErrorEnvelope;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartMetadata {
    pub symbol: String,
    pub timeframe: String,
    pub requested_count: usize,
    /// `candlestick`, `line` or `depth`.
    #[serde(rename = "type")]
    pub chart_type: String,
    pub indicators: Vec<String>,
    pub band_mode: String,
    pub date_range: Option<DateRange>,
    pub size_bytes: usize,
    pub layer_count: usize,
    pub truncated: bool,
    pub degradation: Option<String>,
    pub fallback_reason: Option<String>,
    /// Request adjustments and skipped overlay items.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartResponse {
    pub summary: String,
    pub data: ChartPayload,
    pub metadata: ChartMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResultEnvelope {
    Success(ChartResponse),
    Error(ErrorEnvelope),
}

impl ResultEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success(_))
    }
}
