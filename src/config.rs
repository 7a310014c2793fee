//! Capture configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CaptureError;
use crate::models::ArtifactFormat;

const CONFIG_DIR: &str = "receipt-capture";
const CONFIG_FILE: &str = "config.json";
const OUTPUT_DIR: &str = "ReceiptCaptures";

/// What to do when the page is zoomed at commit time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZoomPolicy {
    /// Show the zoom warning and capture anyway.
    #[default]
    Warn,
    /// Show the zoom warning and refuse to commit until zoom is reset.
    Block,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    pub min_selection_size: f64,
    pub zoom_policy: ZoomPolicy,
    pub settle_delay_ms: u64,
    pub artifact_format: ArtifactFormat,
    pub debug_overlay: bool,
    pub output_dir: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_selection_size: 10.0,
            zoom_policy: ZoomPolicy::Warn,
            settle_delay_ms: 50,
            artifact_format: ArtifactFormat::Png,
            debug_overlay: false,
            output_dir: None,
        }
    }
}

impl CaptureConfig {
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let raw = std::fs::read_to_string(path)?;
        let config: CaptureConfig = serde_json::from_str(&raw)
            .map_err(|e| CaptureError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, else the per-user config file if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CaptureError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if !self.min_selection_size.is_finite() || self.min_selection_size < 0.0 {
            return Err(CaptureError::Config(format!(
                "minSelectionSize must be a non-negative number, got {}",
                self.min_selection_size
            )));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Where captured receipts are written; `~/ReceiptCaptures` unless configured.
    pub fn resolved_output_dir(&self) -> Result<PathBuf, CaptureError> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| CaptureError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(OUTPUT_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_capture_behaviour() {
        let config = CaptureConfig::default();
        assert_eq!(config.min_selection_size, 10.0);
        assert_eq!(config.zoom_policy, ZoomPolicy::Warn);
        assert_eq!(config.settle_delay(), Duration::from_millis(50));
        assert_eq!(config.artifact_format, ArtifactFormat::Png);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: CaptureConfig =
            serde_json::from_str(r#"{"zoomPolicy":"block","settleDelayMs":0}"#).expect("parse");
        assert_eq!(config.zoom_policy, ZoomPolicy::Block);
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.min_selection_size, 10.0);
    }

    #[test]
    fn load_reads_file_and_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"artifactFormat":"jpeg","debugOverlay":true}"#).expect("write");
        let config = CaptureConfig::load(&path).expect("load");
        assert_eq!(config.artifact_format, ArtifactFormat::Jpeg);
        assert!(config.debug_overlay);

        std::fs::write(&path, r#"{"minSelectionSize":-1}"#).expect("write");
        assert!(matches!(
            CaptureConfig::load(&path),
            Err(CaptureError::Config(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write");

        let err = CaptureConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn explicit_output_dir_wins() {
        let config = CaptureConfig {
            output_dir: Some(PathBuf::from("/tmp/receipts")),
            ..CaptureConfig::default()
        };
        assert_eq!(
            config.resolved_output_dir().expect("dir"),
            PathBuf::from("/tmp/receipts")
        );
    }
}
