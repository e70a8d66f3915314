// Data models shared by the chart engine and its data sources.
pub mod models;
pub mod utils;
