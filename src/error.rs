//! Capture errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Selection too small: {width}x{height}")]
    SelectionTooSmall { width: f64, height: f64 },

    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Crop failed: {0}")]
    CropFailed(String),

    #[error("Persist failed: {0}")]
    PersistFailed(String),

    #[error("Capture blocked: browser zoomed to {level}%")]
    ZoomBlocked { level: i64 },

    #[error("A capture session is already active on this page")]
    SessionActive,

    #[error("Capture session is closed")]
    SessionClosed,

    #[error("Invalid session state: {0}")]
    InvalidState(&'static str),

    #[error("Cannot capture from this page: {0}")]
    UnsupportedPage(String),

    #[error("Capture cancelled")]
    Cancelled,

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Whether the host should surface this error to the user at all.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            CaptureError::SelectionTooSmall { .. } | CaptureError::Cancelled
        )
    }

    /// The one human-readable notice shown for this kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::SelectionTooSmall { .. } => "Selection is too small to capture.",
            CaptureError::CaptureUnavailable(_) | CaptureError::CropFailed(_) => {
                "Failed to capture receipt. Please try again."
            }
            CaptureError::PersistFailed(_) => "Failed to save capture. Please try again.",
            CaptureError::ZoomBlocked { .. } => {
                "Browser zoom may affect capture accuracy. Reset zoom to 100% and try again."
            }
            CaptureError::SessionActive => "A capture is already in progress on this page.",
            CaptureError::SessionClosed | CaptureError::InvalidState(_) => {
                "This capture is no longer active."
            }
            CaptureError::UnsupportedPage(_) => "Cannot capture from browser system pages.",
            CaptureError::Cancelled => "Capture cancelled.",
            CaptureError::Config(_) | CaptureError::Io(_) => "Capture settings could not be loaded.",
        }
    }
}
