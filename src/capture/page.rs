//! One live capture session per page context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use crate::capture::session::{CaptureServices, CaptureSession};
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::host::OverlayRenderer;

/// Browser-internal pages cannot be captured.
const BLOCKED_SCHEMES: &[&str] = &["chrome", "edge"];

pub fn check_capture_target(url: &str) -> Result<(), CaptureError> {
    let parsed = Url::parse(url)
        .map_err(|e| CaptureError::UnsupportedPage(format!("{}: {}", url, e)))?;
    if BLOCKED_SCHEMES.contains(&parsed.scheme()) {
        return Err(CaptureError::UnsupportedPage(url.to_string()));
    }
    Ok(())
}

/// A page that can host capture sessions.
///
/// Starting a session while another one on the same context is still live fails with
/// `SessionActive`; the running session is left untouched.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    active: Arc<AtomicBool>,
}

impl PageContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_url(url: &str) -> Result<Self, CaptureError> {
        check_capture_target(url)?;
        Ok(Self::new())
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn start_session<R: OverlayRenderer>(
        &self,
        config: CaptureConfig,
        renderer: R,
        services: CaptureServices,
    ) -> Result<CaptureSession<R>, CaptureError> {
        config.validate()?;
        let slot = self.claim()?;
        Ok(CaptureSession::new(config, renderer, services, slot))
    }

    fn claim(&self) -> Result<ActiveSlot, CaptureError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CaptureError::SessionActive)?;
        Ok(ActiveSlot {
            flag: Arc::clone(&self.active),
            held: true,
        })
    }
}

/// Marks the page context busy until released or dropped.
#[derive(Debug)]
pub(crate) struct ActiveSlot {
    flag: Arc<AtomicBool>,
    held: bool,
}

impl ActiveSlot {
    pub(crate) fn release(&mut self) {
        if self.held {
            self.held = false;
            self.flag.store(false, Ordering::Release);
        }
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.release();
    }
}
