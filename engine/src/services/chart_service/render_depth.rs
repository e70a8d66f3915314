// Handler for order-book depth charts
use super::helpers::{date_range, payload};
use super::placement::{self, ArtifactNaming};
use super::request::ChartConfig;
use super::response::{ChartMetadata, ChartResponse};
use crate::chart::depth::render_depth_chart;
use crate::config::EngineSettings;
use crate::data::source::DepthSource;
use crate::error::{EngineError, ErrorKind};

pub async fn handle_render_depth(
    config: ChartConfig,
    source: Option<&dyn DepthSource>,
    settings: &EngineSettings,
) -> Result<ChartResponse, EngineError> {
    let source = source.ok_or_else(|| {
        EngineError::from_source(ErrorKind::User, "Depth charts are not available: no order book source configured")
    })?;
    let snapshot = source
        .fetch_depth(&config.symbol, config.depth_levels)
        .await
        .map_err(|e| EngineError::from_source(e.kind(), e.to_string()))?;

    let options = &config.options;
    let chart = render_depth_chart(&snapshot, options.precision, options.tight_viewport, &settings.render)?;
    let markup = chart.markup(options.minify);
    let size_bytes = markup.len();

    let naming = ArtifactNaming { symbol: &config.symbol, timeframe: config.timeframe, style: options.style };
    let placement = placement::place(&markup, &config.placement, naming, settings).await?;

    tracing::info!(
        symbol = %config.symbol,
        bids = snapshot.bids.len(),
        asks = snapshot.asks.len(),
        size_bytes,
        mode = placement.mode(),
        "Depth chart rendered"
    );

    Ok(ChartResponse {
        summary: format!(
            "Rendered depth chart for {}: {} bids, {} asks, {} bytes, delivered {}",
            config.symbol,
            snapshot.bids.len(),
            snapshot.asks.len(),
            size_bytes,
            placement.mode()
        ),
        data: payload(&chart, &placement),
        metadata: ChartMetadata {
            symbol: config.symbol.clone(),
            timeframe: config.timeframe.to_string(),
            requested_count: config.count,
            chart_type: options.style.to_string(),
            indicators: Vec::new(),
            band_mode: "off".to_string(),
            date_range: date_range(&chart),
            size_bytes,
            layer_count: chart.layer_count,
            truncated: placement.truncated,
            degradation: None,
            fallback_reason: placement.fallback_reason.clone(),
            notes: config.notes.clone(),
        },
    })
}
