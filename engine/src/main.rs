// Engine main entry point: renders one chart from a CSV file and a JSON request
use anyhow::{bail, Context};
use chart_engine::config::EngineSettings;
use chart_engine::data::csv_parser::load_candles_from_path;
use chart_engine::data::{LocalSeriesSource, MarketDataStore};
use chart_engine::services::{ChartService, RenderRequest};
use shared::models::DepthSnapshot;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: chart-engine <candles.csv> <request.json> [settings.json] [depth.json]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        bail!(USAGE);
    }

    let settings = match args.get(2) {
        Some(path) => EngineSettings::load_from_file(path)?,
        None => EngineSettings::load_default()?,
    };
    let request: RenderRequest = serde_json::from_str(
        &std::fs::read_to_string(&args[1]).with_context(|| format!("cannot read request '{}'", args[1]))?,
    )
    .with_context(|| format!("invalid request '{}'", args[1]))?;

    info!(symbol = %request.symbol, timeframe = %request.timeframe, "Starting chart engine");

    let store = Arc::new(RwLock::new(MarketDataStore::new()));
    let candles = load_candles_from_path(&args[0], &request.symbol)?;
    let stored = store.write().await.add_candles(&request.symbol, request.timeframe, candles)?;
    info!(symbol = %request.symbol, candles = stored, "Market data loaded");

    if let Some(path) = args.get(3) {
        let snapshot: DepthSnapshot = serde_json::from_str(
            &std::fs::read_to_string(path).with_context(|| format!("cannot read depth snapshot '{}'", path))?,
        )
        .with_context(|| format!("invalid depth snapshot '{}'", path))?;
        store.write().await.set_depth(snapshot);
    }

    let settings = Arc::new(settings);
    let source = Arc::new(LocalSeriesSource::new(store, settings.cloud_shift));
    let service = ChartService::new(settings, source.clone()).with_depth_source(source);

    let envelope = service.handle(&request).await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if !envelope.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
