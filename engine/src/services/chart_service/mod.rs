// Chart service hub: holds the settings and data sources, resolves each
// request once, and dispatches to the candle or depth handler.
use crate::chart::options::ChartStyle;
use crate::config::EngineSettings;
use crate::data::source::{DepthSource, SeriesSource};
use crate::error::{EngineError, ErrorEnvelope};
use std::sync::Arc;

pub mod governor;
pub mod helpers;
pub mod placement;
pub mod provider;
pub mod render_candles;
pub mod render_depth;
pub mod request;
pub mod response;

pub use request::{ChartConfig, PlacementOptions, RenderRequest};
pub use response::{ChartMetadata, ChartPayload, ChartResponse, DateRange, ResultEnvelope};

pub struct ChartService {
    settings: Arc<EngineSettings>,
    series_source: Arc<dyn SeriesSource>,
    depth_source: Option<Arc<dyn DepthSource>>,
}

impl ChartService {
    pub fn new(settings: Arc<EngineSettings>, series_source: Arc<dyn SeriesSource>) -> Self {
        ChartService { settings, series_source, depth_source: None }
    }

    pub fn with_depth_source(mut self, depth_source: Arc<dyn DepthSource>) -> Self {
        self.depth_source = Some(depth_source);
        self
    }

    /// Renders one chart. The request runs on its own task, so a panic
    /// anywhere in resolution, fetching, drawing or placement comes back as
    /// an internal error instead of unwinding into the caller.
    pub async fn render_chart(&self, request: &RenderRequest) -> Result<ChartResponse, EngineError> {
        let task = tokio::spawn(dispatch(
            request.clone(),
            Arc::clone(&self.settings),
            Arc::clone(&self.series_source),
            self.depth_source.clone(),
        ));
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                let message = helpers::panic_message(err.into_panic());
                tracing::error!(%message, symbol = %request.symbol, "Render request panicked");
                Err(EngineError::ProcessingError(message))
            }
            Err(err) => Err(EngineError::ProcessingError(err.to_string())),
        }
    }

    /// Like `render_chart`, but folds failures into the result envelope.
    pub async fn handle(&self, request: &RenderRequest) -> ResultEnvelope {
        match self.render_chart(request).await {
            Ok(response) => ResultEnvelope::Success(response),
            Err(err) => ResultEnvelope::Error(ErrorEnvelope::from(err)),
        }
    }
}

async fn dispatch(
    request: RenderRequest,
    settings: Arc<EngineSettings>,
    series_source: Arc<dyn SeriesSource>,
    depth_source: Option<Arc<dyn DepthSource>>,
) -> Result<ChartResponse, EngineError> {
    let config = request.resolve(&settings.render, settings.governor.default_max_svg_bytes);
    tracing::info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        count = config.count,
        style = %config.options.style,
        "Received render request, dispatching to handler"
    );
    match config.options.style {
        ChartStyle::Depth => render_depth::handle_render_depth(config, depth_source.as_deref(), &settings).await,
        ChartStyle::Candlestick | ChartStyle::Line => {
            render_candles::handle_render_candles(config, series_source.as_ref(), &settings).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::provider::test_support::StubSource;
    use super::*;
    use crate::chart::frame::test_support::candles;
    use crate::chart::options::{BandMode, CloudMode};
    use crate::data::{LocalSeriesSource, MarketDataStore, SeriesFrame, SeriesQuery};
    use crate::error::ErrorKind;
    use shared::models::{DepthLevel, DepthSnapshot, TimeFrame};
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn settings(dir: &TempDir) -> Arc<EngineSettings> {
        Arc::new(EngineSettings {
            output_dir: dir.path().join("charts"),
            fallback_output_dir: dir.path().join("fallback"),
            ..EngineSettings::default()
        })
    }

    async fn service(dir: &TempDir, count: usize) -> ChartService {
        let store = Arc::new(RwLock::new(MarketDataStore::new()));
        store.write().await.add_candles("TEST", TimeFrame::Hour1, candles(count)).unwrap();
        store.write().await.set_depth(DepthSnapshot {
            symbol: "TEST".into(),
            bids: vec![
                DepthLevel { price: 99.0, quantity: 2.0 },
                DepthLevel { price: 99.5, quantity: 1.0 },
            ],
            asks: vec![
                DepthLevel { price: 100.5, quantity: 1.5 },
                DepthLevel { price: 101.0, quantity: 3.0 },
            ],
        });
        let settings = settings(dir);
        let source = Arc::new(LocalSeriesSource::new(store, settings.cloud_shift));
        ChartService::new(settings, source.clone()).with_depth_source(source)
    }

    fn request(count: usize) -> RenderRequest {
        RenderRequest { symbol: "TEST".into(), timeframe: TimeFrame::Hour1, count, ..RenderRequest::default() }
    }

    fn all_indicators(count: usize) -> RenderRequest {
        RenderRequest {
            moving_averages: vec![20, 50],
            bands: BandMode::Single,
            cloud: CloudMode::Default,
            ..request(count)
        }
    }

    #[tokio::test]
    async fn test_candlestick_only_end_to_end() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 100).await;
        let response = service.render_chart(&request(60)).await.unwrap();

        let svg = response.data.svg.as_deref().unwrap();
        assert_eq!(svg.matches(r#"class="candle-body""#).count(), 60);
        assert!(response.data.file_path.is_none());

        let meta = &response.metadata;
        assert_eq!(meta.layer_count, 1);
        assert_eq!(meta.chart_type, "candlestick");
        assert_eq!(meta.size_bytes, svg.len());
        assert!(!meta.truncated);
        assert!(meta.indicators.is_empty());
        let all = candles(100);
        let range = meta.date_range.unwrap();
        assert_eq!(range.start, all[40].timestamp);
        assert_eq!(range.end, all[99].timestamp);
        assert!(response.summary.contains("60 candles"));
    }

    #[tokio::test]
    async fn test_large_request_is_degraded() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 300).await;

        let degraded = service.render_chart(&all_indicators(200)).await.unwrap();
        assert!(degraded.metadata.degradation.is_some());
        assert_eq!(degraded.metadata.indicators, vec!["Ichimoku"]);
        assert_eq!(degraded.metadata.band_mode, "off");

        let full = service.render_chart(&all_indicators(50)).await.unwrap();
        assert!(full.metadata.degradation.is_none());
        assert_eq!(full.metadata.indicators, vec!["MA20", "MA50", "BB2σ", "Ichimoku"]);
        assert_eq!(full.metadata.layer_count, 5);
    }

    #[tokio::test]
    async fn test_depth_chart_ignores_candle_settings() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 10).await;
        let depth = RenderRequest { style: "depth".into(), ..all_indicators(500) };
        let response = service.render_chart(&depth).await.unwrap();

        assert_eq!(response.metadata.chart_type, "depth");
        assert!(response.metadata.indicators.is_empty());
        assert!(response.metadata.degradation.is_none());
        let svg = response.data.svg.unwrap();
        assert_eq!(svg.matches(r#"<polyline class="depth-bid""#).count(), 1);
        assert_eq!(svg.matches(r#"<polyline class="depth-ask""#).count(), 1);
        assert_eq!(svg.matches(r#"<line class="mid-price""#).count(), 1);
        assert!(!svg.contains("candle-body"));
    }

    #[tokio::test]
    async fn test_depth_without_source_is_user_error() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubSource::with_frame(Default::default()));
        let service = ChartService::new(settings(&dir), stub);
        let depth = RenderRequest { style: "depth".into(), ..request(10) };
        let err = service.render_chart(&depth).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::User);
    }

    #[tokio::test]
    async fn test_source_errors_reach_the_envelope() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 10).await;
        let unknown = RenderRequest { symbol: "NOPE".into(), ..request(10) };
        match service.handle(&unknown).await {
            ResultEnvelope::Error(envelope) => {
                assert_eq!(envelope.kind, ErrorKind::User);
                assert_eq!(envelope.message, "Unknown pair NOPE");
            }
            other => panic!("expected an error envelope, got {:?}", other),
        }

        let stub = Arc::new(StubSource::failing(ErrorKind::Internal, "Error: indicator backend down"));
        let failing = ChartService::new(settings(&dir), stub);
        let envelope = failing.handle(&request(10)).await;
        assert!(!envelope.is_success());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "internal");
        assert_eq!(json["message"], "indicator backend down");
    }

    struct PanickingSource;

    #[async_trait::async_trait]
    impl SeriesSource for PanickingSource {
        async fn fetch_series(&self, _query: &SeriesQuery) -> Result<SeriesFrame, EngineError> {
            panic!("series slice out of range")
        }
    }

    #[tokio::test]
    async fn test_panic_in_source_becomes_internal_error() {
        let dir = TempDir::new().unwrap();
        let service = ChartService::new(settings(&dir), Arc::new(PanickingSource));
        match service.handle(&request(10)).await {
            ResultEnvelope::Error(envelope) => {
                assert_eq!(envelope.kind, ErrorKind::Internal);
                assert!(envelope.message.contains("series slice out of range"));
            }
            other => panic!("expected an error envelope, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_chart_is_written_to_file() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 80).await;
        let small_limit = RenderRequest { max_svg_bytes: Some(100), ..request(60) };
        let response = service.render_chart(&small_limit).await.unwrap();

        assert!(response.metadata.truncated);
        assert!(response.data.svg.is_none());
        let path = response.data.file_path.unwrap();
        assert!(path.starts_with(dir.path().join("charts").to_str().unwrap()));
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written.len(), response.metadata.size_bytes);
    }

    #[tokio::test]
    async fn test_skipped_overlays_become_notes() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 30).await;
        let mut req = request(20);
        req.style = "heikin".into();
        req.zones = vec![crate::chart::options::PriceZone { low: 1e6, high: 2e6, label: None, color: None }];
        let response = service.render_chart(&req).await.unwrap();

        assert_eq!(response.metadata.chart_type, "candlestick");
        assert_eq!(response.metadata.notes.len(), 2);
        assert!(response.metadata.notes[1].starts_with("zone #0 skipped"));
    }
}
