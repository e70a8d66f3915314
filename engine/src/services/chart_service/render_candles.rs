// Handler for candlestick and line charts
use super::helpers::{date_range, payload};
use super::placement::{self, ArtifactNaming};
use super::response::{ChartMetadata, ChartResponse};
use super::{governor, provider, request::ChartConfig};
use crate::chart::render_candle_chart;
use crate::config::EngineSettings;
use crate::data::source::SeriesSource;
use crate::error::EngineError;

pub async fn handle_render_candles(
    config: ChartConfig,
    source: &dyn SeriesSource,
    settings: &EngineSettings,
) -> Result<ChartResponse, EngineError> {
    let mut options = config.options.clone();
    let degradation = governor::apply_budget(config.count, &mut options, &settings.governor);

    let resolved = ChartConfig { options: options.clone(), ..config.clone() };
    let frame = provider::fetch_frame(source, &resolved, settings.cloud_shift).await?;

    let chart = render_candle_chart(&frame, &options, &settings.render)?;
    let markup = chart.markup(options.minify);
    let size_bytes = markup.len();

    let naming = ArtifactNaming { symbol: &config.symbol, timeframe: config.timeframe, style: options.style };
    let placement = placement::place(&markup, &config.placement, naming, settings).await?;

    let mut notes = config.notes.clone();
    notes.extend(chart.skipped.iter().map(|s| s.to_string()));

    let summary = format!(
        "Rendered {} chart for {} {}: {} candles, {} layer(s), {} bytes, delivered {}",
        options.style,
        config.symbol,
        config.timeframe,
        frame.displayed_count(),
        chart.layer_count,
        size_bytes,
        placement.mode()
    );
    tracing::info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        layers = chart.layer_count,
        size_bytes,
        mode = placement.mode(),
        "Chart rendered"
    );

    Ok(ChartResponse {
        summary,
        data: payload(&chart, &placement),
        metadata: ChartMetadata {
            symbol: config.symbol.clone(),
            timeframe: config.timeframe.to_string(),
            requested_count: config.count,
            chart_type: options.style.to_string(),
            indicators: options.indicator_names(),
            band_mode: options.bands.as_str().to_string(),
            date_range: date_range(&chart),
            size_bytes,
            layer_count: chart.layer_count,
            truncated: placement.truncated,
            degradation,
            fallback_reason: placement.fallback_reason.clone(),
            notes,
        },
    })
}
