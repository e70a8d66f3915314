// Source traits the chart service reads through. Implementations report
// failures as `EngineError::SourceError` carrying their own kind.
use crate::error::EngineError;
use async_trait::async_trait;
use shared::models::{Candle, DepthSnapshot, SeriesMap, TimeFrame};

/// Indicators a series fetch should compute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorSelection {
    pub moving_averages: Vec<u32>,
    pub band_sigmas: Vec<u8>,
    pub cloud: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    pub symbol: String,
    pub timeframe: TimeFrame,
    /// Rows requested, leading buffer included.
    pub rows: usize,
    pub indicators: IndicatorSelection,
}

/// What a series source returns: the most recent rows (at most
/// `SeriesQuery::rows`) with series aligned to them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesFrame {
    pub candles: Vec<Candle>,
    pub series: SeriesMap,
    /// Slots the source's shifted series extend past the last candle.
    pub forward_shift: usize,
}

#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<SeriesFrame, EngineError>;
}

#[async_trait]
pub trait DepthSource: Send + Sync {
    async fn fetch_depth(&self, symbol: &str, max_levels: usize) -> Result<DepthSnapshot, EngineError>;
}
