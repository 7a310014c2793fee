//! Interactive region capture.

mod overlay;
pub mod page;
pub mod session;


pub use page::{check_capture_target, PageContext};
pub use session::{CaptureServices, CaptureSession, SessionState};
