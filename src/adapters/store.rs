use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use crate::host::ArtifactSink;
use crate::models::ReceiptImage;

/// Writes each receipt to `<dir>/receipt-<millis>.<ext>`.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, oldest first.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }

    fn unique_path(&self, ext: &str) -> PathBuf {
        let millis = Local::now().timestamp_millis();
        let mut path = self.dir.join(format!("receipt-{}.{}", millis, ext));

        // Two captures can land in the same millisecond.
        let mut counter = 1u32;
        while path.exists() {
            path = self
                .dir
                .join(format!("receipt-{}-{}.{}", millis, counter, ext));
            counter += 1;
        }
        path
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn persist(&self, artifact: ReceiptImage) -> anyhow::Result<bool> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Could not create {}", self.dir.display()))?;

        let path = self.unique_path(artifact.format.extension());
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .with_context(|| format!("Could not write {}", path.display()))?;

        info!(
            path = %path.display(),
            width = artifact.width,
            height = artifact.height,
            "receipt saved"
        );
        if let Ok(mut written) = self.written.lock() {
            written.push(path);
        }
        Ok(true)
    }
}
