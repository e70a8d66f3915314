// Services exposed by the engine
pub mod chart_service;

pub use chart_service::{ChartService, RenderRequest, ResultEnvelope};
