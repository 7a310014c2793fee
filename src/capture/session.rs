//! A single interactive capture, from the first pointer-down to commit or cancel.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::overlay::OverlayResources;
use crate::capture::page::ActiveSlot;
use crate::config::{CaptureConfig, ZoomPolicy};
use crate::error::CaptureError;
use crate::geometry;
use crate::host::{
    ArtifactSink, ImageCropper, Notice, OverlayPart, OverlayRenderer, ScreenshotSource,
    ViewportProbe,
};
use crate::models::{
    CaptureReport, EventTarget, Handle, Point, PointerEvent, Rect, Vector, ViewportMetadata,
    Zoom,
};

/// External capabilities a session calls into.
#[derive(Clone)]
pub struct CaptureServices {
    pub screenshots: Arc<dyn ScreenshotSource>,
    pub cropper: Arc<dyn ImageCropper>,
    pub sink: Arc<dyn ArtifactSink>,
    pub viewport: Arc<dyn ViewportProbe>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    /// Waiting for a drag. A retained selection means the commit button is showing.
    Idle,
    Drawing {
        anchor: Point,
    },
    /// Dragging a resize handle. `snapshot` is the selection at grab time.
    Adjusting {
        handle: Handle,
        grab: Point,
        snapshot: Rect,
    },
    Committing,
    Done,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Done | SessionState::Cancelled | SessionState::Failed
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Drawing { .. } => "drawing",
            SessionState::Adjusting { .. } => "adjusting",
            SessionState::Committing => "committing",
            SessionState::Done => "done",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
        }
    }
}

pub struct CaptureSession<R: OverlayRenderer> {
    id: Uuid,
    config: CaptureConfig,
    renderer: R,
    services: CaptureServices,
    state: SessionState,
    selection: Option<Rect>,
    start_viewport: ViewportMetadata,
    overlay: OverlayResources,
    cancel: CancellationToken,
    slot: ActiveSlot,
}

impl<R: OverlayRenderer> CaptureSession<R> {
    pub(crate) fn new(
        config: CaptureConfig,
        renderer: R,
        services: CaptureServices,
        slot: ActiveSlot,
    ) -> Self {
        let start_viewport = services.viewport.sample();
        let mut session = Self {
            id: Uuid::new_v4(),
            config,
            renderer,
            services,
            state: SessionState::Idle,
            selection: None,
            start_viewport,
            overlay: OverlayResources::default(),
            cancel: CancellationToken::new(),
            slot,
        };

        session
            .overlay
            .show(&mut session.renderer, OverlayPart::Surface);

        let zoom = start_viewport.zoom();
        if zoom.is_zoomed {
            warn!(session = %session.id, level = zoom.level, "page is zoomed at capture start");
            session.renderer.notify(Notice::ZoomWarning(zoom));
        }

        debug!(
            session = %session.id,
            dpr = start_viewport.device_pixel_ratio,
            "capture session started"
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    pub fn start_viewport(&self) -> &ViewportMetadata {
        &self.start_viewport
    }

    /// True while a large-enough selection is waiting to be committed.
    pub fn has_commit_affordance(&self) -> bool {
        matches!(self.state, SessionState::Idle) && self.selection.is_some()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Token that cancels the session from outside, including while a commit is awaiting
    /// the screenshot. A commit in flight notices it once the pending call settles.
    ///
    /// Outside a commit the host applies it with [`poll_cancelled`](Self::poll_cancelled)
    /// from its event loop; pointer events and `commit` also apply it on entry.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ends the session if its cancel handle has fired. Returns true once the session is
    /// cancelled.
    pub fn poll_cancelled(&mut self) -> bool {
        match self.state {
            SessionState::Cancelled => true,
            s if s.is_terminal() => false,
            SessionState::Committing => false,
            _ if self.cancel.is_cancelled() => {
                info!(session = %self.id, "capture cancelled from handle");
                self.finish(SessionState::Cancelled);
                true
            }
            _ => false,
        }
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> Result<(), CaptureError> {
        self.ensure_open()?;

        match (self.state, event.target, self.selection) {
            (SessionState::Idle, EventTarget::Handle(handle), Some(snapshot)) => {
                self.overlay
                    .hide(&mut self.renderer, OverlayPart::CommitButton);
                self.set_state(SessionState::Adjusting {
                    handle,
                    grab: event.page,
                    snapshot,
                });
            }
            (SessionState::Idle, _, _) => {
                self.hide_affordances();
                let rect = geometry::compute_selection(event.page, event.page);
                self.selection = Some(rect);
                self.overlay
                    .place(&mut self.renderer, OverlayPart::SelectionBox, rect);
                self.set_state(SessionState::Drawing { anchor: event.page });
            }
            // A second button press mid-drag is ignored.
            _ => {}
        }
        Ok(())
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> Result<(), CaptureError> {
        self.ensure_open()?;

        let Some(rect) = self.track(event.page) else {
            return Ok(());
        };
        self.selection = Some(rect);
        self.overlay
            .place(&mut self.renderer, OverlayPart::SelectionBox, rect);

        match self.state {
            SessionState::Adjusting { .. } => self.place_handles(rect),
            SessionState::Drawing { .. } if self.config.debug_overlay => {
                let viewport = self.services.viewport.sample();
                let readout = geometry::debug_readout(event.page, rect, &viewport);
                self.renderer.notify(Notice::Debug(readout));
            }
            _ => {}
        }
        Ok(())
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> Result<(), CaptureError> {
        self.ensure_open()?;

        if let Some(rect) = self.track(event.page) {
            self.settle_selection(rect);
        }
        Ok(())
    }

    /// Escape / explicit cancel. Immediate unless a commit is in flight.
    pub fn cancel(&mut self) {
        match self.state {
            s if s.is_terminal() => {}
            SessionState::Committing => self.cancel.cancel(),
            _ => {
                info!(session = %self.id, "capture cancelled");
                self.finish(SessionState::Cancelled);
            }
        }
    }

    /// Captures the viewport, crops out the selection and hands the result to the sink.
    ///
    /// Exactly one capture attempt is made. Every outcome except a blocked zoom or a
    /// too-small selection ends the session and removes the overlay.
    pub async fn commit(&mut self) -> Result<CaptureReport, CaptureError> {
        self.ensure_open()?;

        let selection = match (self.state, self.selection) {
            (SessionState::Idle, Some(rect)) => rect,
            _ => return Err(CaptureError::InvalidState("no selection ready to capture")),
        };

        if geometry::is_too_small(&selection, self.config.min_selection_size) {
            self.discard_selection();
            return Err(CaptureError::SelectionTooSmall {
                width: selection.width,
                height: selection.height,
            });
        }

        let zoom = self.services.viewport.sample().zoom();
        if zoom.is_zoomed {
            warn!(session = %self.id, level = zoom.level, "committing on a zoomed page");
            self.renderer.notify(Notice::ZoomWarning(zoom));
            if self.config.zoom_policy == ZoomPolicy::Block {
                return Err(CaptureError::ZoomBlocked { level: zoom.level });
            }
        }

        self.set_state(SessionState::Committing);

        let guard = CommitGuard { session: self };
        let result = guard.session.capture(selection, zoom).await;
        result
    }

    async fn capture(&mut self, selection: Rect, zoom: Zoom) -> Result<CaptureReport, CaptureError> {
        // The overlay must be off screen before the frame is taken.
        self.overlay.hide_all(&mut self.renderer);
        self.renderer.next_paint().await;
        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        if self.cancel.is_cancelled() {
            return Err(self.abandon());
        }

        let viewport = self.services.viewport.sample();
        info!(
            session = %self.id,
            x = selection.x,
            y = selection.y,
            width = selection.width,
            height = selection.height,
            dpr = viewport.device_pixel_ratio,
            "requesting viewport capture"
        );

        let frame = match self.services.screenshots.capture_visible().await {
            Ok(Some(frame)) if !frame.is_empty() => frame,
            Ok(_) => {
                return Err(self.fail(CaptureError::CaptureUnavailable(
                    "Failed to capture screenshot".to_string(),
                )))
            }
            Err(e) => return Err(self.fail(CaptureError::CaptureUnavailable(e.to_string()))),
        };

        if self.cancel.is_cancelled() {
            return Err(self.abandon());
        }

        let crop = geometry::crop_rect_for(selection, &viewport);
        let artifact = match self.services.cropper.crop(&frame, crop) {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail(CaptureError::CropFailed(e.to_string()))),
        };
        drop(frame);

        let (width, height) = (artifact.width, artifact.height);
        match self.services.sink.persist(artifact).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(self.fail(CaptureError::PersistFailed(
                    "Failed to save capture".to_string(),
                )))
            }
            Err(e) => return Err(self.fail(CaptureError::PersistFailed(e.to_string()))),
        }

        self.finish(SessionState::Done);
        info!(session = %self.id, width, height, "receipt captured");

        Ok(CaptureReport {
            session_id: self.id.to_string(),
            selection,
            crop,
            viewport,
            zoom,
            width,
            height,
        })
    }

    /// Releases every overlay element and frees the page context. Safe to call repeatedly.
    ///
    /// Tearing down a live session cancels it.
    pub fn teardown(&mut self) {
        if !self.state.is_terminal() {
            self.state = SessionState::Cancelled;
        }
        let released = self.overlay.release_all(&mut self.renderer);
        if released > 0 {
            debug!(session = %self.id, released, "overlay removed");
        }
        self.selection = None;
        self.slot.release();
    }

    fn ensure_open(&mut self) -> Result<(), CaptureError> {
        if self.state.is_terminal() {
            return Err(CaptureError::SessionClosed);
        }
        if matches!(self.state, SessionState::Committing) {
            return Err(CaptureError::InvalidState("capture in progress"));
        }
        if self.poll_cancelled() {
            return Err(CaptureError::Cancelled);
        }
        Ok(())
    }

    /// Selection implied by a pointer position under the current drag, if any.
    fn track(&self, page: Point) -> Option<Rect> {
        match self.state {
            SessionState::Drawing { anchor } => Some(geometry::compute_selection(anchor, page)),
            SessionState::Adjusting {
                handle,
                grab,
                snapshot,
            } => Some(geometry::apply_resize(
                snapshot,
                handle,
                Vector::between(grab, page),
            )),
            _ => None,
        }
    }

    fn settle_selection(&mut self, rect: Rect) {
        self.set_state(SessionState::Idle);

        if geometry::is_too_small(&rect, self.config.min_selection_size) {
            debug!(
                session = %self.id,
                width = rect.width,
                height = rect.height,
                "selection too small, discarded"
            );
            self.discard_selection();
            return;
        }

        self.selection = Some(rect);
        self.overlay
            .place(&mut self.renderer, OverlayPart::SelectionBox, rect);
        self.place_handles(rect);
        let button = geometry::commit_affordance_anchor(&rect);
        self.overlay.place(
            &mut self.renderer,
            OverlayPart::CommitButton,
            Rect::new(button.x, button.y, 0.0, 0.0),
        );
    }

    fn place_handles(&mut self, rect: Rect) {
        for handle in Handle::ALL {
            let at = geometry::handle_anchor(&rect, handle);
            self.overlay.place(
                &mut self.renderer,
                OverlayPart::Handle(handle),
                Rect::new(at.x, at.y, 0.0, 0.0),
            );
        }
    }

    fn hide_affordances(&mut self) {
        self.overlay
            .hide(&mut self.renderer, OverlayPart::CommitButton);
        for handle in Handle::ALL {
            self.overlay
                .hide(&mut self.renderer, OverlayPart::Handle(handle));
        }
    }

    fn discard_selection(&mut self) {
        self.selection = None;
        self.set_state(SessionState::Idle);
        self.hide_affordances();
        self.overlay
            .hide(&mut self.renderer, OverlayPart::SelectionBox);
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state.name() != next.name() {
            debug!(session = %self.id, from = self.state.name(), to = next.name(), "state");
        }
        self.state = next;
    }

    fn finish(&mut self, terminal: SessionState) {
        self.set_state(terminal);
        self.teardown();
    }

    /// Cancellation observed mid-commit: whatever was captured is dropped.
    ///
    /// Ends `Cancelled` rather than `Failed` and shows no failure notice, matching an
    /// escape before commit.
    fn abandon(&mut self) -> CaptureError {
        info!(session = %self.id, "capture cancelled during commit, result discarded");
        self.finish(SessionState::Cancelled);
        CaptureError::Cancelled
    }

    fn fail(&mut self, err: CaptureError) -> CaptureError {
        warn!(session = %self.id, error = %err, "capture failed");
        self.finish(SessionState::Failed);
        self.renderer.notify(Notice::Failure(err.user_message()));
        err
    }
}

/// Ends a commit whose future is dropped before it settles (a host timeout or `select!`),
/// so the session never stays in `Committing`.
struct CommitGuard<'a, R: OverlayRenderer> {
    session: &'a mut CaptureSession<R>,
}

impl<R: OverlayRenderer> Drop for CommitGuard<'_, R> {
    fn drop(&mut self) {
        if matches!(self.session.state, SessionState::Committing) {
            warn!(session = %self.session.id, "commit abandoned before it settled");
            self.session.finish(SessionState::Cancelled);
        }
    }
}

impl<R: OverlayRenderer> Drop for CaptureSession<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
