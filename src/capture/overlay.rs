//! The set of overlay elements a session has put on the page.

use crate::host::{ElementId, OverlayPart, OverlayRenderer};
use crate::models::Rect;

/// Owns every mounted overlay element so teardown is a single pass.
///
/// After `release_all` nothing can be mounted again and further releases are no-ops.
#[derive(Debug, Default)]
pub(crate) struct OverlayResources {
    mounted: Vec<(OverlayPart, ElementId)>,
    released: bool,
}

impl OverlayResources {
    pub(crate) fn get(&self, part: OverlayPart) -> Option<ElementId> {
        self.mounted
            .iter()
            .find(|(p, _)| *p == part)
            .map(|(_, id)| *id)
    }

    fn ensure<R: OverlayRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        part: OverlayPart,
    ) -> Option<ElementId> {
        if self.released {
            return None;
        }
        if let Some(id) = self.get(part) {
            return Some(id);
        }
        let id = renderer.mount(part);
        self.mounted.push((part, id));
        Some(id)
    }

    pub(crate) fn show<R: OverlayRenderer + ?Sized>(&mut self, renderer: &mut R, part: OverlayPart) {
        if let Some(id) = self.ensure(renderer, part) {
            renderer.set_visible(id, true);
        }
    }

    /// Mounts `part` if needed, moves it to `at` and makes it visible.
    pub(crate) fn place<R: OverlayRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        part: OverlayPart,
        at: Rect,
    ) {
        if let Some(id) = self.ensure(renderer, part) {
            renderer.place(id, at);
            renderer.set_visible(id, true);
        }
    }

    pub(crate) fn hide<R: OverlayRenderer + ?Sized>(&mut self, renderer: &mut R, part: OverlayPart) {
        if self.released {
            return;
        }
        if let Some(id) = self.get(part) {
            renderer.set_visible(id, false);
        }
    }

    pub(crate) fn hide_all<R: OverlayRenderer + ?Sized>(&mut self, renderer: &mut R) {
        if self.released {
            return;
        }
        for (_, id) in &self.mounted {
            renderer.set_visible(*id, false);
        }
    }

    /// Unmounts everything, newest first. Returns how many elements were released.
    pub(crate) fn release_all<R: OverlayRenderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;
        let count = self.mounted.len();
        for (_, id) in self.mounted.drain(..).rev() {
            renderer.unmount(id);
        }
        count
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        self.released
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.mounted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::RecordingRenderer;

    #[test]
    fn parts_are_mounted_once() {
        let mut renderer = RecordingRenderer::default();
        let mut overlay = OverlayResources::default();

        overlay.show(&mut renderer, OverlayPart::Surface);
        overlay.place(&mut renderer, OverlayPart::SelectionBox, Rect::default());
        overlay.place(&mut renderer, OverlayPart::SelectionBox, Rect::new(1.0, 1.0, 5.0, 5.0));

        assert_eq!(overlay.len(), 2);
        assert_eq!(renderer.mounted_count(), 2);
    }

    #[test]
    fn release_is_idempotent() {
        let mut renderer = RecordingRenderer::default();
        let mut overlay = OverlayResources::default();
        overlay.show(&mut renderer, OverlayPart::Surface);
        overlay.show(&mut renderer, OverlayPart::CommitButton);

        assert_eq!(overlay.release_all(&mut renderer), 2);
        assert_eq!(overlay.release_all(&mut renderer), 0);
        assert_eq!(renderer.unmount_count(), 2);
        assert!(renderer.live_elements().is_empty());
        assert!(overlay.is_released());
    }

    #[test]
    fn nothing_mounts_after_release() {
        let mut renderer = RecordingRenderer::default();
        let mut overlay = OverlayResources::default();
        overlay.release_all(&mut renderer);

        overlay.place(&mut renderer, OverlayPart::SelectionBox, Rect::default());
        assert_eq!(renderer.mounted_count(), 0);
    }
}
