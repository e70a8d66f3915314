// Candles and indicator series for one request, with buffer/shift metadata.
use super::geometry::SlotLayout;
use chrono::{DateTime, Utc};
use shared::models::{Candle, SeriesKey, SeriesMap};

#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    /// Every fetched row, leading buffer included.
    pub candles: Vec<Candle>,
    /// Series aligned index-for-index with `candles`.
    pub series: SeriesMap,
    /// Rows fetched only to seed forward-shifted series; never displayed.
    pub leading_buffer: usize,
    /// Slots reserved after the last displayed candle.
    pub forward_shift: usize,
}

impl ChartFrame {
    pub fn displayed_candles(&self) -> &[Candle] {
        let start = self.leading_buffer.min(self.candles.len());
        &self.candles[start..]
    }

    pub fn displayed_count(&self) -> usize {
        self.candles.len().saturating_sub(self.leading_buffer)
    }

    pub fn slots(&self) -> SlotLayout {
        SlotLayout {
            visible: self.displayed_count(),
            forward: self.forward_shift,
        }
    }

    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let displayed = self.displayed_candles();
        Some((displayed.first()?.timestamp, displayed.last()?.timestamp))
    }

    /// Index of the displayed candle stamped exactly `timestamp`.
    pub fn slot_of(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.displayed_candles().iter().position(|c| c.timestamp == timestamp)
    }

    /// Maps series `key` onto display slots. Fetched row `k` lands on slot
    /// `k - leading_buffer + shift`; rows falling outside `0..total_slots`
    /// are dropped. Returns `None` when the source did not provide `key`.
    pub fn aligned(&self, key: SeriesKey, shift: isize) -> Option<Vec<Option<f64>>> {
        let raw = self.series.get(&key)?;
        let total = self.slots().total();
        let mut slots = vec![None; total];
        for (k, value) in raw.iter().enumerate() {
            let slot = k as isize - self.leading_buffer as isize + shift;
            if slot >= 0 && (slot as usize) < total {
                slots[slot as usize] = *value;
            }
        }
        Some(slots)
    }
}
