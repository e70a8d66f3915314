// Where a rendered chart goes: inline in the response, or a file under the
// output directory. Mandatory writes fail the request; optional ones degrade.
use super::request::PlacementOptions;
use crate::chart::options::ChartStyle;
use crate::config::EngineSettings;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use shared::models::TimeFrame;
use shared::utils::sanitize_file_component;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlacementOutcome {
    /// Markup to embed in the response; `None` when delivered by file.
    pub inline: Option<String>,
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    pub truncated: bool,
    pub fallback_reason: Option<String>,
}

impl PlacementOutcome {
    fn inline(markup: &str) -> Self {
        Self { inline: Some(markup.to_string()), ..Self::default() }
    }

    fn file(path: PathBuf, settings: &EngineSettings) -> Self {
        let url = artifact_url(settings.public_base_url.as_deref(), &path);
        Self { path: Some(path), url, ..Self::default() }
    }

    pub fn mode(&self) -> &'static str {
        if self.path.is_some() {
            "file"
        } else {
            "inline"
        }
    }
}

/// Identifies the artifact for file naming.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactNaming<'a> {
    pub symbol: &'a str,
    pub timeframe: TimeFrame,
    pub style: ChartStyle,
}

/// `{symbol}_{timeframe}_{YYYYMMDD_HHMMSS_mmm}[_{mode}].svg`, or the sanitized
/// explicit name with `.svg` appended when missing.
pub fn file_name(naming: ArtifactNaming<'_>, output_name: Option<&str>, now: DateTime<Utc>) -> String {
    if let Some(name) = output_name {
        let stem = name.trim().strip_suffix(".svg").unwrap_or(name.trim());
        return format!("{}.svg", sanitize_file_component(stem));
    }
    let suffix = match naming.style {
        ChartStyle::Candlestick => "",
        ChartStyle::Line => "_line",
        ChartStyle::Depth => "_depth",
    };
    format!(
        "{}_{}_{}{}.svg",
        sanitize_file_component(naming.symbol),
        naming.timeframe.as_str(),
        now.format("%Y%m%d_%H%M%S_%3f"),
        suffix
    )
}

pub fn artifact_url(base: Option<&str>, path: &Path) -> Option<String> {
    let base = base?.trim_end_matches('/');
    let name = path.file_name()?.to_string_lossy();
    Some(format!("{}/{}", base, name))
}

async fn write_artifact(dir: &Path, name: &str, markup: &str) -> Result<PathBuf, EngineError> {
    // tolerant of concurrent creation
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| EngineError::PersistenceError(format!("cannot create '{}': {}", dir.display(), e)))?;
    let path = dir.join(name);
    tokio::fs::write(&path, markup)
        .await
        .map_err(|e| EngineError::PersistenceError(format!("cannot write '{}': {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), bytes = markup.len(), "Chart written");
    Ok(path)
}

/// Primary directory first, then the fallback directory.
async fn write_with_fallback(name: &str, markup: &str, settings: &EngineSettings) -> Result<PathBuf, String> {
    match write_artifact(&settings.output_dir, name, markup).await {
        Ok(path) => Ok(path),
        Err(primary) => {
            tracing::warn!(error = %primary, "Primary output directory failed, trying fallback");
            write_artifact(&settings.fallback_output_dir, name, markup)
                .await
                .map_err(|fallback| format!("{}; {}", primary, fallback))
        }
    }
}

/// Applies the placement policy to serialized `markup`.
pub async fn place(
    markup: &str,
    options: &PlacementOptions,
    naming: ArtifactNaming<'_>,
    settings: &EngineSettings,
) -> Result<PlacementOutcome, EngineError> {
    let name = file_name(naming, options.output_name.as_deref(), Utc::now());

    if options.prefer_file {
        let path = write_artifact(&settings.output_dir, &name, markup).await?;
        return Ok(PlacementOutcome::file(path, settings));
    }

    let size = markup.len();
    if size <= options.max_svg_bytes {
        if !options.auto_save {
            return Ok(PlacementOutcome::inline(markup));
        }
        return Ok(match write_with_fallback(&name, markup, settings).await {
            Ok(path) => PlacementOutcome::file(path, settings),
            Err(reason) => {
                tracing::warn!(%reason, "Auto-save failed, delivering inline");
                PlacementOutcome {
                    fallback_reason: Some(format!("auto-save failed: {}", reason)),
                    ..PlacementOutcome::inline(markup)
                }
            }
        });
    }

    tracing::info!(size, max = options.max_svg_bytes, "Chart exceeds inline size limit, writing to file");
    match write_with_fallback(&name, markup, settings).await {
        Ok(path) => Ok(PlacementOutcome { truncated: true, ..PlacementOutcome::file(path, settings) }),
        Err(reason) => {
            tracing::warn!(%reason, size, "Oversized chart could not be written, delivering inline");
            Ok(PlacementOutcome {
                fallback_reason: Some(format!(
                    "chart is {} bytes (limit {}) but could not be saved: {}",
                    size, options.max_svg_bytes, reason
                )),
                ..PlacementOutcome::inline(markup)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn naming(style: ChartStyle) -> ArtifactNaming<'static> {
        ArtifactNaming { symbol: "BTC/USDT", timeframe: TimeFrame::Hour1, style }
    }

    fn options(max_svg_bytes: usize) -> PlacementOptions {
        PlacementOptions { prefer_file: false, auto_save: false, output_name: None, max_svg_bytes }
    }

    fn settings(dir: &TempDir) -> EngineSettings {
        EngineSettings {
            output_dir: dir.path().join("primary"),
            fallback_output_dir: dir.path().join("fallback"),
            ..EngineSettings::default()
        }
    }

    // A regular file where a directory is expected makes every write fail.
    fn blocked_settings(dir: &TempDir) -> EngineSettings {
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        EngineSettings {
            output_dir: blocker.join("primary"),
            fallback_output_dir: blocker.join("fallback"),
            ..EngineSettings::default()
        }
    }

    const MARKUP: &str = "<svg><rect/></svg>";

    #[test]
    fn test_file_name_formats() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap() + chrono::Duration::milliseconds(42);
        assert_eq!(file_name(naming(ChartStyle::Candlestick), None, now), "BTC_USDT_1h_20240506_070809_042.svg");
        assert_eq!(file_name(naming(ChartStyle::Depth), None, now), "BTC_USDT_1h_20240506_070809_042_depth.svg");
        assert_eq!(file_name(naming(ChartStyle::Line), Some("my chart.svg"), now), "my_chart.svg");
        assert_eq!(file_name(naming(ChartStyle::Line), Some("report"), now), "report.svg");
    }

    #[test]
    fn test_artifact_url() {
        let path = Path::new("/srv/charts/a.svg");
        assert_eq!(artifact_url(Some("https://cdn.example.com/charts/"), path).unwrap(), "https://cdn.example.com/charts/a.svg");
        assert!(artifact_url(None, path).is_none());
    }

    #[tokio::test]
    async fn test_under_limit_is_inline() {
        let dir = TempDir::new().unwrap();
        let outcome = place(MARKUP, &options(MARKUP.len() + 10), naming(ChartStyle::Candlestick), &settings(&dir))
            .await
            .unwrap();
        assert_eq!(outcome.inline.as_deref(), Some(MARKUP));
        assert!(outcome.path.is_none());
        assert!(!outcome.truncated);
        assert!(!dir.path().join("primary").exists());
    }

    #[tokio::test]
    async fn test_over_limit_is_written_and_truncated() {
        let dir = TempDir::new().unwrap();
        let outcome = place(MARKUP, &options(MARKUP.len() - 10), naming(ChartStyle::Candlestick), &settings(&dir))
            .await
            .unwrap();
        assert!(outcome.truncated);
        assert!(outcome.inline.is_none());
        let path = outcome.path.unwrap();
        assert!(path.starts_with(dir.path().join("primary")));
        assert_eq!(std::fs::read_to_string(path).unwrap(), MARKUP);
    }

    #[tokio::test]
    async fn test_prefer_file_never_inline_and_fails_hard() {
        let dir = TempDir::new().unwrap();
        let prefer = PlacementOptions { prefer_file: true, ..options(1_000_000) };
        let mut engine_settings = settings(&dir);
        engine_settings.public_base_url = Some("http://localhost/charts".into());
        let outcome = place(MARKUP, &prefer, naming(ChartStyle::Line), &engine_settings).await.unwrap();
        assert!(outcome.inline.is_none());
        assert!(outcome.url.unwrap().ends_with("_line.svg"));

        let err = place(MARKUP, &prefer, naming(ChartStyle::Line), &blocked_settings(&dir)).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_auto_save_uses_fallback_then_inline() {
        let dir = TempDir::new().unwrap();
        let auto = PlacementOptions { auto_save: true, ..options(1_000_000) };

        let mut half_blocked = blocked_settings(&dir);
        half_blocked.fallback_output_dir = dir.path().join("fallback");
        let outcome = place(MARKUP, &auto, naming(ChartStyle::Candlestick), &half_blocked).await.unwrap();
        assert!(outcome.path.unwrap().starts_with(dir.path().join("fallback")));

        let outcome = place(MARKUP, &auto, naming(ChartStyle::Candlestick), &blocked_settings(&dir)).await.unwrap();
        assert_eq!(outcome.inline.as_deref(), Some(MARKUP));
        assert!(outcome.fallback_reason.unwrap().starts_with("auto-save failed"));
    }

    #[tokio::test]
    async fn test_oversized_unwritable_falls_back_inline() {
        let dir = TempDir::new().unwrap();
        let outcome = place(MARKUP, &options(1), naming(ChartStyle::Candlestick), &blocked_settings(&dir))
            .await
            .unwrap();
        assert_eq!(outcome.inline.as_deref(), Some(MARKUP));
        assert!(!outcome.truncated);
        assert!(outcome.fallback_reason.is_some());
    }
}
