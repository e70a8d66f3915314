// Helpers shared by the chart handlers
use super::placement::PlacementOutcome;
use super::response::{ChartPayload, DateRange};
use crate::chart::RenderedChart;
use std::any::Any;

pub const GENERIC_RENDER_FAILURE: &str = "Unexpected error while rendering chart";

/// Message carried by a panic payload, or a generic one for other payload types.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        GENERIC_RENDER_FAILURE.to_string()
    }
}

pub fn payload(chart: &RenderedChart, placement: &PlacementOutcome) -> ChartPayload {
    ChartPayload {
        svg: placement.inline.clone(),
        file_path: placement.path.as_ref().map(|p| p.display().to_string()),
        url: placement.url.clone(),
        legend: chart.legend.clone(),
    }
}

pub fn date_range(chart: &RenderedChart) -> Option<DateRange> {
    chart.date_range.map(|(start, end)| DateRange { start, end })
}
