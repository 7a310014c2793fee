//! Collaborators the capture session drives but does not own.
//!
//! A host (browser content script, desktop overlay, test harness) implements these; the
//! `adapters` module carries file- and log-backed versions.

use async_trait::async_trait;

use crate::models::{
    CaptureFrame, DebugReadout, Handle, PixelRect, ReceiptImage, Rect, ViewportMetadata, Zoom,
};

/// Takes a full-frame capture of the visible viewport at device resolution.
#[async_trait]
pub trait ScreenshotSource: Send + Sync {
    /// `Ok(None)` means the capability answered without image data.
    async fn capture_visible(&self) -> anyhow::Result<Option<CaptureFrame>>;
}

/// Cuts a pixel rectangle out of a frame and re-encodes it.
pub trait ImageCropper: Send + Sync {
    fn crop(&self, frame: &CaptureFrame, rect: PixelRect) -> anyhow::Result<ReceiptImage>;
}

/// Receives the finished receipt image. `Ok(false)` is a rejection.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn persist(&self, artifact: ReceiptImage) -> anyhow::Result<bool>;
}

pub trait ViewportProbe: Send + Sync {
    fn sample(&self) -> ViewportMetadata;
}

/// Opaque handle to something a renderer put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Pieces of the capture overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayPart {
    /// Full-page layer that receives pointer events.
    Surface,
    SelectionBox,
    Handle(Handle),
    CommitButton,
}

/// Transient messages for the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ZoomWarning(Zoom),
    Failure(&'static str),
    Debug(DebugReadout),
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::ZoomWarning(zoom) => format!(
                "Browser is zoomed to {}%. Reset zoom to 100% for accurate capture.",
                zoom.level
            ),
            Notice::Failure(message) => message.to_string(),
            Notice::Debug(readout) => readout.to_string(),
        }
    }
}

/// Render capability for the overlay.
///
/// Rectangles are in page coordinates; a zero-size rectangle places a point-anchored element
/// (handles, the commit button).
#[async_trait]
pub trait OverlayRenderer: Send {
    fn mount(&mut self, part: OverlayPart) -> ElementId;

    fn place(&mut self, element: ElementId, at: Rect);

    fn set_visible(&mut self, element: ElementId, visible: bool);

    fn unmount(&mut self, element: ElementId);

    fn notify(&mut self, notice: Notice);

    /// Resolves once everything requested so far has been painted.
    async fn next_paint(&mut self);
}
