// Series and depth sources backed by the in-memory store. Indicators are
// computed over the full stored history and then cut to the requested rows,
// so the first displayed rows are already warmed up.
use super::market_data::MarketDataStore;
use super::source::{DepthSource, SeriesFrame, SeriesQuery, SeriesSource};
use crate::error::{EngineError, ErrorKind};
use crate::indicators::bollinger::Bollinger;
use crate::indicators::ichimoku::Ichimoku;
use crate::indicators::sma::Sma;
use crate::indicators::IndicatorCalculator;
use async_trait::async_trait;
use shared::models::{DepthSnapshot, SeriesMap};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const BAND_PERIOD: usize = 20;

pub struct LocalSeriesSource {
    store: Arc<RwLock<MarketDataStore>>,
    cloud_shift: usize,
}

impl LocalSeriesSource {
    pub fn new(store: Arc<RwLock<MarketDataStore>>, cloud_shift: usize) -> Self {
        Self { store, cloud_shift }
    }

    fn calculators(query: &SeriesQuery) -> Vec<Box<dyn IndicatorCalculator>> {
        let selection = &query.indicators;
        let mut calculators: Vec<Box<dyn IndicatorCalculator>> = selection
            .moving_averages
            .iter()
            .map(|p| Box::new(Sma::new(*p as usize)) as Box<dyn IndicatorCalculator>)
            .collect();
        if !selection.band_sigmas.is_empty() {
            calculators.push(Box::new(Bollinger::new(BAND_PERIOD, selection.band_sigmas.clone())));
        }
        if selection.cloud {
            calculators.push(Box::new(Ichimoku::default()));
        }
        calculators
    }
}

#[async_trait]
impl SeriesSource for LocalSeriesSource {
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<SeriesFrame, EngineError> {
        let store = self.store.read().await;
        if !store.has_symbol(&query.symbol) {
            return Err(EngineError::from_source(
                ErrorKind::User,
                format!("Error: Unknown pair {}", query.symbol),
            ));
        }
        let history = store.history(&query.symbol, query.timeframe).unwrap_or_default();
        let start = history.len().saturating_sub(query.rows);

        let mut series = SeriesMap::new();
        for calculator in Self::calculators(query) {
            tracing::debug!(
                indicator = calculator.name(),
                parameters = %calculator.parameters(),
                "Computing indicator"
            );
            for (key, values) in calculator.calculate(history) {
                if values.len() != history.len() {
                    return Err(EngineError::from_source(
                        ErrorKind::Internal,
                        format!("Error: {} produced {} values for {} candles", calculator.name(), values.len(), history.len()),
                    ));
                }
                series.insert(key, values[start..].to_vec());
            }
        }

        Ok(SeriesFrame {
            candles: history[start..].to_vec(),
            series,
            forward_shift: if query.indicators.cloud { self.cloud_shift } else { 0 },
        })
    }
}

#[async_trait]
impl DepthSource for LocalSeriesSource {
    async fn fetch_depth(&self, symbol: &str, max_levels: usize) -> Result<DepthSnapshot, EngineError> {
        let store = self.store.read().await;
        let snapshot = store
            .depth(symbol)
            .ok_or_else(|| EngineError::from_source(ErrorKind::User, format!("Error: No order book for {}", symbol)))?;

        let mut bids = snapshot.bids.clone();
        let mut asks = snapshot.asks.clone();
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        bids.truncate(max_levels);
        asks.truncate(max_levels);
        Ok(DepthSnapshot { symbol: snapshot.symbol.clone(), bids, asks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::IndicatorSelection;
    use crate::indicators::test_support::candle;
    use shared::models::{CloudComponent, DepthLevel, SeriesKey, TimeFrame};

    async fn seeded(count: usize) -> LocalSeriesSource {
        let store = Arc::new(RwLock::new(MarketDataStore::new()));
        let candles = (0..count).map(|i| candle(i, 101.0 + i as f64, 99.0 + i as f64, 100.0 + i as f64)).collect();
        store.write().await.add_candles("TEST", TimeFrame::Hour1, candles).unwrap();
        store.write().await.set_depth(DepthSnapshot {
            symbol: "TEST".into(),
            bids: (1..=5).map(|i| DepthLevel { price: 100.0 - i as f64, quantity: 1.0 }).collect(),
            asks: (1..=5).map(|i| DepthLevel { price: 100.0 + i as f64, quantity: 1.0 }).collect(),
        });
        LocalSeriesSource::new(store, 26)
    }

    fn query(rows: usize, indicators: IndicatorSelection) -> SeriesQuery {
        SeriesQuery { symbol: "TEST".into(), timeframe: TimeFrame::Hour1, rows, indicators }
    }

    #[tokio::test]
    async fn test_fetch_returns_most_recent_rows_with_warm_indicators() {
        let source = seeded(100).await;
        let selection = IndicatorSelection { moving_averages: vec![20], band_sigmas: vec![2], cloud: false };
        let frame = source.fetch_series(&query(30, selection)).await.unwrap();

        assert_eq!(frame.candles.len(), 30);
        assert_eq!(frame.candles[0].close, 170.0);
        let ma = &frame.series[&SeriesKey::MovingAverage(20)];
        assert_eq!(ma.len(), 30);
        assert!(ma.iter().all(Option::is_some));
        assert!(frame.series.contains_key(&SeriesKey::BandUpper(2)));
        assert_eq!(frame.forward_shift, 0);
    }

    #[tokio::test]
    async fn test_cloud_sets_forward_shift() {
        let source = seeded(120).await;
        let selection = IndicatorSelection { cloud: true, ..IndicatorSelection::default() };
        let frame = source.fetch_series(&query(86, selection)).await.unwrap();
        assert_eq!(frame.forward_shift, 26);
        assert!(frame.series.contains_key(&SeriesKey::Cloud(CloudComponent::LeadingB)));
    }

    #[tokio::test]
    async fn test_short_history_returns_what_exists() {
        let source = seeded(10).await;
        let frame = source.fetch_series(&query(50, IndicatorSelection::default())).await.unwrap();
        assert_eq!(frame.candles.len(), 10);

        let mut other_tf = query(50, IndicatorSelection::default());
        other_tf.timeframe = TimeFrame::Day1;
        assert!(source.fetch_series(&other_tf).await.unwrap().candles.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_user_error() {
        let source = seeded(10).await;
        let mut q = query(10, IndicatorSelection::default());
        q.symbol = "NOPE".into();
        let err = source.fetch_series(&q).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::User);
        assert_eq!(err.to_string(), "Unknown pair NOPE");
    }

    #[tokio::test]
    async fn test_depth_trimmed_to_max_levels() {
        let source = seeded(1).await;
        let depth = source.fetch_depth("TEST", 3).await.unwrap();
        assert_eq!(depth.bids.len(), 3);
        assert_eq!(depth.bids[0].price, 99.0);
        assert_eq!(depth.asks[0].price, 101.0);
        assert!(source.fetch_depth("NOPE", 3).await.is_err());
    }
}
