// Engine configuration module
pub mod settings;

pub use settings::{ChartPalette, EngineSettings, GovernorSettings, Margins, RenderSettings};
