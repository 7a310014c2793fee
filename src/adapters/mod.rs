//! Concrete collaborators for running a capture session outside a browser.

mod crop;
mod headless;
mod source;
mod store;

pub use crop::{frame_from_image, RasterCropper};
pub use headless::HeadlessRenderer;
pub use source::{FileScreenshotSource, FixedViewport};
pub use store::DirectorySink;
