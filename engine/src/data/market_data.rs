// In-memory market data: candles per symbol and timeframe, plus the latest
// order-book snapshot per symbol.
use anyhow::{bail, Result};
use shared::models::{Candle, DepthSnapshot, TimeFrame};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MarketDataStore {
    data: HashMap<String, HashMap<TimeFrame, Vec<Candle>>>,
    depth: HashMap<String, DepthSnapshot>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `new_candles` into the series, keeping it sorted and unique by
    /// timestamp. Rejects candles whose high is below their low.
    pub fn add_candles(&mut self, symbol: &str, timeframe: TimeFrame, new_candles: Vec<Candle>) -> Result<usize> {
        if let Some(bad) = new_candles.iter().find(|c| c.high < c.low) {
            bail!("Candle at {} has high {} below low {}", bad.timestamp, bad.high, bad.low);
        }
        let series = self
            .data
            .entry(symbol.to_string())
            .or_default()
            .entry(timeframe)
            .or_default();
        series.extend(new_candles);
        series.sort_by_key(|c| c.timestamp);
        series.dedup_by_key(|c| c.timestamp);
        Ok(series.len())
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.data.contains_key(symbol) || self.depth.contains_key(symbol)
    }

    /// The full stored history for a series, oldest first.
    pub fn history(&self, symbol: &str, timeframe: TimeFrame) -> Option<&[Candle]> {
        self.data
            .get(symbol)
            .and_then(|symbol_data| symbol_data.get(&timeframe))
            .map(Vec::as_slice)
    }

    pub fn set_depth(&mut self, snapshot: DepthSnapshot) {
        self.depth.insert(snapshot.symbol.clone(), snapshot);
    }

    pub fn depth(&self, symbol: &str) -> Option<&DepthSnapshot> {
        self.depth.get(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle(hour: i64, close: f64) -> Candle {
        Candle {
            symbol: "TEST".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
            trades: 1,
        }
    }

    #[test]
    fn test_add_candles_sorts_and_dedups() {
        let mut store = MarketDataStore::new();
        store.add_candles("TEST", TimeFrame::Hour1, vec![candle(2, 3.0), candle(0, 1.0)]).unwrap();
        let total = store.add_candles("TEST", TimeFrame::Hour1, vec![candle(1, 2.0), candle(2, 9.0)]).unwrap();
        assert_eq!(total, 3);

        let history = store.history("TEST", TimeFrame::Hour1).unwrap();
        let closes: Vec<f64> = history.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert!(store.history("TEST", TimeFrame::Day1).is_none());
    }

    #[test]
    fn test_rejects_inverted_candle() {
        let mut store = MarketDataStore::new();
        let mut bad = candle(0, 5.0);
        bad.high = 1.0;
        assert!(store.add_candles("TEST", TimeFrame::Hour1, vec![bad]).is_err());
        assert!(!store.has_symbol("TEST"));
    }

    #[test]
    fn test_depth_snapshot_replaced() {
        let mut store = MarketDataStore::new();
        store.set_depth(DepthSnapshot { symbol: "BTC".into(), bids: vec![], asks: vec![] });
        assert!(store.depth("BTC").is_some());
        assert!(store.has_symbol("BTC"));
    }
}
