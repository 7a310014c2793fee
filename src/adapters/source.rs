use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;

use crate::host::{ScreenshotSource, ViewportProbe};
use crate::models::{CaptureFrame, ViewportMetadata};

/// Serves a previously saved full-viewport capture from disk.
#[derive(Debug, Clone)]
pub struct FileScreenshotSource {
    path: PathBuf,
}

impl FileScreenshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScreenshotSource for FileScreenshotSource {
    async fn capture_visible(&self) -> anyhow::Result<Option<CaptureFrame>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Could not read {}", self.path.display()))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(CaptureFrame::new(bytes)))
    }
}

/// A viewport that never scrolls or zooms.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedViewport(pub ViewportMetadata);

impl ViewportProbe for FixedViewport {
    fn sample(&self) -> ViewportMetadata {
        self.0
    }
}
