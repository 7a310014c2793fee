//! Coordinate engine.
//!
//! Pure transforms between pointer space, page space and capture-frame pixel space.
//! Nothing here holds state; every function returns a fresh value.

use crate::models::{
    DebugReadout, Handle, PixelRect, Point, Rect, Vector, ViewportMetadata, Zoom,
};

/// The commit button is right-aligned to the selection, this far in from its right edge.
pub const COMMIT_BUTTON_INSET: f64 = 80.0;

/// Vertical gap between the selection's bottom edge and the commit button.
pub const COMMIT_BUTTON_GAP: f64 = 10.0;

/// Zoom deviation (in percent) tolerated before a page counts as zoomed.
pub const ZOOM_TOLERANCE: i64 = 1;

const DEBUG_GRID: f64 = 100.0;

/// Normalized rectangle spanned by a drag from `anchor` to `current`.
///
/// Drags in any direction produce the same rectangle; a click without movement yields a
/// zero-area rectangle.
pub fn compute_selection(anchor: Point, current: Point) -> Rect {
    Rect {
        x: anchor.x.min(current.x),
        y: anchor.y.min(current.y),
        width: (current.x - anchor.x).abs(),
        height: (current.y - anchor.y).abs(),
    }
}

/// Moves one edge of `rect` by `delta`, keeping the opposite edge fixed.
///
/// The dragged edge stops at the opposite edge instead of crossing it, so the result never
/// has a negative size and a handle never swaps sides mid-drag.
pub fn apply_resize(rect: Rect, handle: Handle, delta: Vector) -> Rect {
    match handle {
        Handle::North => {
            let bottom = rect.bottom();
            let y = (rect.y + delta.dy).min(bottom);
            Rect {
                y,
                height: bottom - y,
                ..rect
            }
        }
        Handle::South => Rect {
            height: (rect.height + delta.dy).max(0.0),
            ..rect
        },
        Handle::West => {
            let right = rect.right();
            let x = (rect.x + delta.dx).min(right);
            Rect {
                x,
                width: right - x,
                ..rect
            }
        }
        Handle::East => Rect {
            width: (rect.width + delta.dx).max(0.0),
            ..rect
        },
    }
}

/// Scales a rectangle into pixel space. Each field is multiplied first and rounded once.
pub fn to_pixel_rect(rect: Rect, dpr: f64) -> PixelRect {
    PixelRect {
        x: (rect.x * dpr).round() as i64,
        y: (rect.y * dpr).round() as i64,
        width: (rect.width * dpr).round() as i64,
        height: (rect.height * dpr).round() as i64,
    }
}

/// Browser zoom derived from the outer/inner window width ratio.
///
/// A zero or non-finite inner width reads as 100%.
pub fn compute_zoom(outer_width: f64, inner_width: f64) -> Zoom {
    if !(inner_width.is_finite() && inner_width > 0.0 && outer_width.is_finite()) {
        return Zoom {
            level: 100,
            is_zoomed: false,
        };
    }

    let level = (outer_width / inner_width * 100.0).round() as i64;
    Zoom {
        level,
        is_zoomed: (level - 100).abs() > ZOOM_TOLERANCE,
    }
}

pub fn viewport_to_page(point: Point, scroll: Vector) -> Point {
    Point {
        x: point.x + scroll.dx,
        y: point.y + scroll.dy,
    }
}

pub fn page_to_viewport(rect: Rect, scroll: Vector) -> Rect {
    Rect {
        x: rect.x - scroll.dx,
        y: rect.y - scroll.dy,
        ..rect
    }
}

/// Pixel rectangle to cut out of a frame captured with `viewport` in effect.
///
/// `viewport` must be the commit-time sample: the frame shows the viewport as scrolled and
/// scaled at the moment of capture, not as it was when the drag started.
pub fn crop_rect_for(selection: Rect, viewport: &ViewportMetadata) -> PixelRect {
    let dpr = viewport.device_pixel_ratio;
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    to_pixel_rect(page_to_viewport(selection, viewport.scroll()), dpr)
}

pub fn is_too_small(rect: &Rect, min_size: f64) -> bool {
    rect.width < min_size || rect.height < min_size
}

/// Midpoint of the edge a handle controls.
pub fn handle_anchor(rect: &Rect, handle: Handle) -> Point {
    let mid_x = rect.x + rect.width / 2.0;
    let mid_y = rect.y + rect.height / 2.0;
    match handle {
        Handle::North => Point::new(mid_x, rect.y),
        Handle::East => Point::new(rect.right(), mid_y),
        Handle::South => Point::new(mid_x, rect.bottom()),
        Handle::West => Point::new(rect.x, mid_y),
    }
}

/// Top-left corner of the commit button for a selection.
pub fn commit_affordance_anchor(rect: &Rect) -> Point {
    Point::new(
        rect.right() - COMMIT_BUTTON_INSET,
        rect.bottom() + COMMIT_BUTTON_GAP,
    )
}

/// Readout for the debug overlay, taken from a fresh viewport sample.
pub fn debug_readout(pointer: Point, selection: Rect, viewport: &ViewportMetadata) -> DebugReadout {
    DebugReadout {
        pointer,
        scroll: viewport.scroll(),
        selection,
        device_pixel_ratio: viewport.device_pixel_ratio,
        zoom_level: viewport.zoom().level,
        grid_cell: (
            (pointer.x / DEBUG_GRID).floor() as i64,
            (pointer.y / DEBUG_GRID).floor() as i64,
        ),
        grid_offset: (
            pointer.x.rem_euclid(DEBUG_GRID).round() as i64,
            pointer.y.rem_euclid(DEBUG_GRID).round() as i64,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, w, h)
    }

    fn sample_points() -> Vec<Point> {
        let coords = [-37.5, 0.0, 10.0, 50.0, 123.25, 900.0];
        let mut points = Vec::new();
        for &x in &coords {
            for &y in &coords {
                points.push(Point::new(x, y));
            }
        }
        points
    }

    #[test]
    fn selection_is_normalized_for_every_drag_direction() {
        let points = sample_points();
        for &a in &points {
            for &c in &points {
                let r = compute_selection(a, c);
                assert!(r.width >= 0.0 && r.height >= 0.0);
                assert_eq!(r.x, a.x.min(c.x));
                assert_eq!(r.y, a.y.min(c.y));
            }
        }
    }

    #[test]
    fn upward_left_drag_produces_expected_rect() {
        let r = compute_selection(Point::new(50.0, 50.0), Point::new(10.0, 10.0));
        assert_eq!(r, rect(10.0, 10.0, 40.0, 40.0));
    }

    #[test]
    fn click_without_drag_is_zero_area() {
        let p = Point::new(7.0, 9.0);
        assert_eq!(compute_selection(p, p), rect(7.0, 9.0, 0.0, 0.0));
    }

    #[test]
    fn resize_never_goes_negative_and_keeps_opposite_edge() {
        let base = rect(100.0, 100.0, 50.0, 40.0);
        let deltas = [-500.0, -60.0, -10.0, 0.0, 10.0, 60.0, 500.0];

        for handle in Handle::ALL {
            for &d in &deltas {
                let r = apply_resize(base, handle, Vector::new(d, d));
                assert!(r.width >= 0.0, "{:?} {} width {}", handle, d, r.width);
                assert!(r.height >= 0.0, "{:?} {} height {}", handle, d, r.height);

                match handle {
                    Handle::North => {
                        assert_eq!(r.bottom(), base.bottom());
                        assert_eq!((r.x, r.width), (base.x, base.width));
                    }
                    Handle::South => {
                        assert_eq!(r.y, base.y);
                        assert_eq!((r.x, r.width), (base.x, base.width));
                    }
                    Handle::West => {
                        assert_eq!(r.right(), base.right());
                        assert_eq!((r.y, r.height), (base.y, base.height));
                    }
                    Handle::East => {
                        assert_eq!(r.x, base.x);
                        assert_eq!((r.y, r.height), (base.y, base.height));
                    }
                }
            }
        }
    }

    #[test]
    fn dragged_edge_stops_at_opposite_edge() {
        let base = rect(100.0, 100.0, 50.0, 40.0);

        let r = apply_resize(base, Handle::North, Vector::new(0.0, 200.0));
        assert_eq!(r, rect(100.0, 140.0, 50.0, 0.0));

        let r = apply_resize(base, Handle::West, Vector::new(200.0, 0.0));
        assert_eq!(r, rect(150.0, 100.0, 0.0, 40.0));

        let r = apply_resize(base, Handle::East, Vector::new(-200.0, 0.0));
        assert_eq!(r, rect(100.0, 100.0, 0.0, 40.0));
    }

    #[test]
    fn north_and_west_move_the_origin() {
        let base = rect(100.0, 100.0, 50.0, 40.0);
        assert_eq!(
            apply_resize(base, Handle::North, Vector::new(0.0, -20.0)),
            rect(100.0, 80.0, 50.0, 60.0)
        );
        assert_eq!(
            apply_resize(base, Handle::West, Vector::new(-30.0, 0.0)),
            rect(70.0, 100.0, 80.0, 40.0)
        );
    }

    #[test]
    fn pixel_rect_scales_and_rounds_once() {
        let r = rect(20.0, 20.0, 200.0, 100.0);
        assert_eq!(
            to_pixel_rect(r, 2.0),
            PixelRect {
                x: 40,
                y: 40,
                width: 400,
                height: 200
            }
        );

        // Rounding 2.6 to 3 before scaling would give 7.5 -> 8.
        let r = rect(2.6, 0.0, 3.3, 3.3);
        let p = to_pixel_rect(r, 2.5);
        assert_eq!(p.x, 7);
        assert_eq!(p.width, (3.3f64 * 2.5).round() as i64);
    }

    #[test]
    fn pixel_rect_with_unit_dpr_is_idempotent() {
        let r = rect(10.4, 20.6, 99.5, 33.2);
        let once = to_pixel_rect(r, 1.0);
        let twice = to_pixel_rect(Rect::from(once), 1.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn zoom_levels() {
        assert_eq!(
            compute_zoom(100.0, 100.0),
            Zoom {
                level: 100,
                is_zoomed: false
            }
        );
        assert_eq!(
            compute_zoom(125.0, 100.0),
            Zoom {
                level: 125,
                is_zoomed: true
            }
        );
        assert!(!compute_zoom(101.0, 100.0).is_zoomed);
        assert!(compute_zoom(102.0, 100.0).is_zoomed);
        assert!(!compute_zoom(1280.0, 0.0).is_zoomed);
    }

    #[test]
    fn crop_rect_uses_commit_time_scroll_and_dpr() {
        let selection = rect(20.0, 520.0, 200.0, 100.0);
        let viewport = ViewportMetadata {
            scroll_y: 500.0,
            device_pixel_ratio: 2.0,
            ..ViewportMetadata::default()
        };
        assert_eq!(
            crop_rect_for(selection, &viewport),
            PixelRect {
                x: 40,
                y: 40,
                width: 400,
                height: 200
            }
        );
    }

    #[test]
    fn crop_rect_treats_invalid_dpr_as_one() {
        let viewport = ViewportMetadata {
            device_pixel_ratio: 0.0,
            ..ViewportMetadata::default()
        };
        let p = crop_rect_for(rect(1.0, 2.0, 30.0, 40.0), &viewport);
        assert_eq!((p.x, p.y, p.width, p.height), (1, 2, 30, 40));
    }

    #[test]
    fn too_small_threshold_is_strict() {
        assert!(is_too_small(&rect(0.0, 0.0, 5.0, 5.0), 10.0));
        assert!(is_too_small(&rect(0.0, 0.0, 200.0, 9.9), 10.0));
        assert!(!is_too_small(&rect(0.0, 0.0, 10.0, 10.0), 10.0));
    }

    #[test]
    fn affordances_sit_on_the_selection() {
        let r = rect(20.0, 20.0, 200.0, 100.0);
        assert_eq!(commit_affordance_anchor(&r), Point::new(140.0, 130.0));
        assert_eq!(handle_anchor(&r, Handle::North), Point::new(120.0, 20.0));
        assert_eq!(handle_anchor(&r, Handle::East), Point::new(220.0, 70.0));
        assert_eq!(handle_anchor(&r, Handle::South), Point::new(120.0, 120.0));
        assert_eq!(handle_anchor(&r, Handle::West), Point::new(20.0, 70.0));
    }

    #[test]
    fn debug_readout_grid() {
        let viewport = ViewportMetadata {
            scroll_x: 40.0,
            device_pixel_ratio: 1.5,
            outer_width: 1100.0,
            inner_width: 1000.0,
            ..ViewportMetadata::default()
        };
        let d = debug_readout(Point::new(250.0, 130.0), rect(0.0, 0.0, 1.0, 1.0), &viewport);
        assert_eq!(d.grid_cell, (2, 1));
        assert_eq!(d.grid_offset, (50, 30));
        assert_eq!(d.scroll, Vector::new(40.0, 0.0));
        assert_eq!(d.device_pixel_ratio, 1.5);
        assert_eq!(d.zoom_level, 110);
    }
}
