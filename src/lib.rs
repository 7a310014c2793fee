//! Screen-region capture for receipts.
//!
//! A [`CaptureSession`] turns pointer input over a page into a selection rectangle, then
//! crops that rectangle out of a full-viewport capture and hands the image to a sink.
//! All geometry lives in [`geometry`]; everything the session talks to is a trait in
//! [`host`].

pub mod adapters;
pub mod capture;
pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod models;

pub use capture::{check_capture_target, CaptureServices, CaptureSession, PageContext, SessionState};
pub use config::{CaptureConfig, ZoomPolicy};
pub use error::CaptureError;
pub use models::{
    CaptureFrame, CaptureReport, EventTarget, Handle, PixelRect, Point, PointerEvent,
    ReceiptImage, Rect, Vector, ViewportMetadata, Zoom,
};
