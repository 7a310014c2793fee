use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::host::{ElementId, Notice, OverlayPart, OverlayRenderer};
use crate::models::Rect;

/// Renderer for runs without a display. Logs what a real overlay would draw.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_id: u64,
    live: Vec<(ElementId, OverlayPart)>,
    notices: Vec<String>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_elements(&self) -> usize {
        self.live.len()
    }

    /// Text of every notice shown so far.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    fn part(&self, element: ElementId) -> Option<OverlayPart> {
        self.live
            .iter()
            .find(|(id, _)| *id == element)
            .map(|(_, part)| *part)
    }
}

#[async_trait]
impl OverlayRenderer for HeadlessRenderer {
    fn mount(&mut self, part: OverlayPart) -> ElementId {
        self.next_id += 1;
        let id = ElementId(self.next_id);
        self.live.push((id, part));
        debug!(?part, id = id.0, "overlay mount");
        id
    }

    fn place(&mut self, element: ElementId, at: Rect) {
        trace!(part = ?self.part(element), x = at.x, y = at.y, width = at.width, height = at.height, "overlay place");
    }

    fn set_visible(&mut self, element: ElementId, visible: bool) {
        trace!(part = ?self.part(element), visible, "overlay visibility");
    }

    fn unmount(&mut self, element: ElementId) {
        if let Some(pos) = self.live.iter().position(|(id, _)| *id == element) {
            let (_, part) = self.live.remove(pos);
            debug!(?part, id = element.0, "overlay unmount");
        }
    }

    fn notify(&mut self, notice: Notice) {
        let text = notice.text();
        match notice {
            Notice::Debug(_) => debug!("{}", text),
            Notice::ZoomWarning(_) | Notice::Failure(_) => warn!("{}", text),
        }
        self.notices.push(text);
    }

    async fn next_paint(&mut self) {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Zoom;

    #[test]
    fn tracks_live_elements_and_notices() {
        let mut renderer = HeadlessRenderer::new();
        let surface = renderer.mount(OverlayPart::Surface);
        let button = renderer.mount(OverlayPart::CommitButton);
        assert_eq!(renderer.live_elements(), 2);

        renderer.unmount(button);
        renderer.unmount(button);
        renderer.unmount(surface);
        assert_eq!(renderer.live_elements(), 0);

        renderer.notify(Notice::ZoomWarning(Zoom {
            level: 110,
            is_zoomed: true,
        }));
        assert_eq!(renderer.notices().len(), 1);
        assert!(renderer.notices()[0].contains("110%"));
    }
}
