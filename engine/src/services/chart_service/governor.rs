// Pre-render cost estimate. Requests whose visible rows times estimated layers
// exceed the budget lose their cheaper indicators first, then the cloud.
use crate::chart::options::{BandMode, ChartOptions, ChartStyle, CloudMode};
use crate::config::GovernorSettings;

/// `(cloud ? 1 : 0) + band count + moving averages + 1` for the price layer.
pub fn estimated_layers(options: &ChartOptions) -> usize {
    let cloud = usize::from(options.cloud.is_enabled());
    cloud + options.bands.band_count() + options.moving_averages.len() + 1
}

/// Downgrades `options` in place when over budget and returns a note
/// describing what was dropped. Depth charts are never downgraded.
pub fn apply_budget(visible: usize, options: &mut ChartOptions, budget: &GovernorSettings) -> Option<String> {
    if options.style == ChartStyle::Depth {
        return None;
    }
    let estimate = estimated_layers(options);
    if visible.saturating_mul(estimate) <= budget.layer_budget {
        return None;
    }

    let band_count = options.bands.band_count();
    let mut dropped = Vec::new();
    if options.bands != BandMode::Off {
        options.bands = BandMode::Off;
        dropped.push("bands");
    }
    if !options.moving_averages.is_empty() {
        options.moving_averages.clear();
        dropped.push("moving averages");
    }
    if options.cloud.is_enabled() && visible.saturating_mul(1 + band_count) > budget.cloud_budget {
        options.cloud = CloudMode::Off;
        dropped.push("cloud");
    }
    if dropped.is_empty() {
        return None;
    }

    let note = format!(
        "{} candles x {} layers exceeds the budget of {}; disabled {}",
        visible,
        estimate,
        budget.layer_budget,
        dropped.join(", ")
    );
    tracing::warn!(visible, estimate, "{}", note);
    Some(note)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_layers() -> ChartOptions {
        ChartOptions {
            moving_averages: vec![20, 50],
            bands: BandMode::Single,
            cloud: CloudMode::Default,
            ..ChartOptions::default()
        }
    }

    #[test]
    fn test_estimate_counts_every_enabled_layer() {
        assert_eq!(estimated_layers(&ChartOptions::default()), 1);
        assert_eq!(estimated_layers(&all_layers()), 5);
        let multi = ChartOptions { bands: BandMode::Multi, ..ChartOptions::default() };
        assert_eq!(estimated_layers(&multi), 4);
    }

    #[test]
    fn test_large_request_drops_bands_and_moving_averages() {
        let mut options = all_layers();
        let note = apply_budget(200, &mut options, &GovernorSettings::default());
        assert!(note.unwrap().contains("bands, moving averages"));
        assert_eq!(options.bands, BandMode::Off);
        assert!(options.moving_averages.is_empty());
        // 200 * (1 + 1) stays under the cloud budget
        assert_eq!(options.cloud, CloudMode::Default);
    }

    #[test]
    fn test_small_request_untouched() {
        let mut options = all_layers();
        assert!(apply_budget(50, &mut options, &GovernorSettings::default()).is_none());
        assert_eq!(options, all_layers());
    }

    #[test]
    fn test_very_large_request_drops_cloud_too() {
        let mut options = ChartOptions { bands: BandMode::Multi, cloud: CloudMode::Extended, ..ChartOptions::default() };
        // 250 * (1 + 3) > 800
        let note = apply_budget(250, &mut options, &GovernorSettings::default()).unwrap();
        assert!(note.contains("cloud"));
        assert_eq!(options.cloud, CloudMode::Off);
    }

    #[test]
    fn test_depth_style_skips_estimate() {
        let mut options = ChartOptions { style: ChartStyle::Depth, ..all_layers() };
        assert!(apply_budget(10_000, &mut options, &GovernorSettings::default()).is_none());
    }
}
