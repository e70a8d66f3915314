// Series provider adapter: asks the source for the visible rows plus the
// extra history forward-shifted series need, and turns the answer into a
// chart frame.
use super::request::ChartConfig;
use crate::chart::frame::ChartFrame;
use crate::data::source::{IndicatorSelection, SeriesQuery, SeriesSource};
use crate::error::{EngineError, ErrorKind};

/// Extra rows fetched ahead of the visible window.
pub fn extra_buffer(config: &ChartConfig, cloud_shift: usize) -> usize {
    if config.options.cloud.is_enabled() {
        cloud_shift
    } else {
        0
    }
}

pub fn series_query(config: &ChartConfig, cloud_shift: usize) -> SeriesQuery {
    let options = &config.options;
    SeriesQuery {
        symbol: config.symbol.clone(),
        timeframe: config.timeframe,
        rows: config.count + extra_buffer(config, cloud_shift),
        indicators: IndicatorSelection {
            moving_averages: options.moving_averages.clone(),
            band_sigmas: options.band_sigmas(),
            cloud: options.cloud.is_enabled(),
        },
    }
}

/// Keeps the source's kind and message, minus any leading "Error: ".
fn rewrap(err: EngineError) -> EngineError {
    match err {
        EngineError::SourceError { kind, message } => EngineError::from_source(kind, message),
        other => EngineError::from_source(other.kind(), other.to_string()),
    }
}

pub async fn fetch_frame(
    source: &dyn SeriesSource,
    config: &ChartConfig,
    cloud_shift: usize,
) -> Result<ChartFrame, EngineError> {
    let query = series_query(config, cloud_shift);
    let fetched = source.fetch_series(&query).await.map_err(rewrap)?;

    if fetched.candles.is_empty() {
        return Err(EngineError::from_source(
            ErrorKind::Data,
            format!("No data returned for {} {}", config.symbol, config.timeframe),
        ));
    }
    if let Some((key, values)) = fetched.series.iter().find(|(_, v)| v.len() != fetched.candles.len()) {
        return Err(EngineError::from_source(
            ErrorKind::Internal,
            format!("Series {} has {} values for {} candles", key, values.len(), fetched.candles.len()),
        ));
    }

    let total = fetched.candles.len();
    let extra = extra_buffer(config, cloud_shift);
    let leading_buffer = extra.min(total.saturating_sub(config.count));
    tracing::debug!(
        symbol = %config.symbol,
        rows = total,
        leading_buffer,
        forward_shift = fetched.forward_shift,
        "Series fetched"
    );

    Ok(ChartFrame {
        candles: fetched.candles,
        series: fetched.series,
        leading_buffer,
        forward_shift: fetched.forward_shift,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::StubSource;
    use super::*;
    use crate::chart::frame::test_support::candles;
    use crate::chart::options::CloudMode;
    use crate::data::source::SeriesFrame;
    use crate::services::chart_service::request::RenderRequest;

    fn config(count: usize, cloud: CloudMode) -> ChartConfig {
        RenderRequest { count, cloud, ..RenderRequest::default() }.resolve(&Default::default(), 100_000)
    }

    #[tokio::test]
    async fn test_cloud_requests_buffer_rows() {
        let source = StubSource::with_frame(SeriesFrame { candles: candles(200), forward_shift: 26, ..SeriesFrame::default() });
        let frame = fetch_frame(&source, &config(60, CloudMode::Default), 26).await.unwrap();

        assert_eq!(source.queries.lock().unwrap()[0].rows, 86);
        assert!(source.queries.lock().unwrap()[0].indicators.cloud);
        assert_eq!(frame.candles.len(), 86);
        assert_eq!(frame.leading_buffer, 26);
        assert_eq!(frame.displayed_count(), 60);
        assert_eq!(frame.forward_shift, 26);
    }

    #[tokio::test]
    async fn test_short_history_shrinks_buffer() {
        let source = StubSource::with_frame(SeriesFrame { candles: candles(70), forward_shift: 26, ..SeriesFrame::default() });
        let frame = fetch_frame(&source, &config(60, CloudMode::Default), 26).await.unwrap();
        assert_eq!(frame.leading_buffer, 10);
        assert_eq!(frame.displayed_count(), 60);
    }

    #[tokio::test]
    async fn test_no_buffer_without_cloud() {
        let source = StubSource::with_frame(SeriesFrame { candles: candles(200), ..SeriesFrame::default() });
        let frame = fetch_frame(&source, &config(60, CloudMode::Off), 26).await.unwrap();
        assert_eq!(source.queries.lock().unwrap()[0].rows, 60);
        assert_eq!(frame.leading_buffer, 0);
    }

    #[tokio::test]
    async fn test_zero_rows_is_data_error() {
        let source = StubSource::with_frame(SeriesFrame::default());
        let err = fetch_frame(&source, &config(10, CloudMode::Off), 26).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[tokio::test]
    async fn test_source_failure_keeps_kind_and_strips_prefix() {
        let source = StubSource::failing(ErrorKind::Internal, "Error: indicator backend down");
        let err = fetch_frame(&source, &config(10, CloudMode::Off), 26).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "indicator backend down");
    }
}
