// Data access: CSV loading, the in-memory store and the series/depth sources
// the chart service reads from.
pub mod csv_parser;
pub mod local_source;
pub mod market_data;
pub mod source;

pub use local_source::LocalSeriesSource;
pub use market_data::MarketDataStore;
pub use source::{DepthSource, IndicatorSelection, SeriesFrame, SeriesQuery, SeriesSource};
