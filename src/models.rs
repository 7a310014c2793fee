use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A position in CSS pixels. Page or viewport space depending on where it came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A pointer displacement, or a scroll offset.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Displacement from `from` to `to`.
    pub fn between(from: Point, to: Point) -> Self {
        Self {
            dx: to.x - from.x,
            dy: to.y - from.y,
        }
    }
}

/// A selection rectangle in page coordinates.
///
/// Width and height are never negative; `x`/`y` is always the top-left corner.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

impl From<PixelRect> for Rect {
    fn from(p: PixelRect) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
            width: p.width as f64,
            height: p.height as f64,
        }
    }
}

/// A rectangle in capture-frame pixel space (physical pixels).
///
/// `x`/`y` may be negative when the selection starts above or left of the visible viewport;
/// the cropper clamps against the frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Viewport state sampled from the host page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewportMetadata {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub device_pixel_ratio: f64,
    pub outer_width: f64,
    pub inner_width: f64,
}

impl ViewportMetadata {
    pub fn scroll(&self) -> Vector {
        Vector::new(self.scroll_x, self.scroll_y)
    }

    pub fn zoom(&self) -> Zoom {
        crate::geometry::compute_zoom(self.outer_width, self.inner_width)
    }
}

impl Default for ViewportMetadata {
    fn default() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            device_pixel_ratio: 1.0,
            outer_width: 1280.0,
            inner_width: 1280.0,
        }
    }
}

/// Browser zoom as a rounded percentage.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Zoom {
    pub level: i64,
    pub is_zoomed: bool,
}

/// Edge handle used to resize an existing selection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    North,
    East,
    South,
    West,
}

impl Handle {
    pub const ALL: [Handle; 4] = [Handle::North, Handle::East, Handle::South, Handle::West];
}

/// What the pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Surface,
    Handle(Handle),
}

/// A pointer event already converted into page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub page: Point,
    pub target: EventTarget,
}

impl PointerEvent {
    pub fn at_page(page: Point, target: EventTarget) -> Self {
        Self { page, target }
    }

    /// Ingests a raw viewport-space pointer position. This is the only place viewport
    /// coordinates enter the session.
    pub fn from_client(client: Point, scroll: Vector, target: EventTarget) -> Self {
        Self {
            page: crate::geometry::viewport_to_page(client, scroll),
            target,
        }
    }

    pub fn surface(x: f64, y: f64) -> Self {
        Self::at_page(Point::new(x, y), EventTarget::Surface)
    }

    pub fn handle(handle: Handle, x: f64, y: f64) -> Self {
        Self::at_page(Point::new(x, y), EventTarget::Handle(handle))
    }
}

/// Encoded bitmap of the visible viewport, already at device pixel resolution.
#[derive(Debug, Clone, Default)]
pub struct CaptureFrame {
    pub bytes: Vec<u8>,
}

impl CaptureFrame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parses a `data:image/...;base64,` URL as returned by tab capture APIs.
    pub fn from_data_url(data_url: &str) -> Result<Self, String> {
        let (header, payload) = data_url
            .split_once(',')
            .ok_or_else(|| "Data URL is missing its payload.".to_string())?;
        if !header.starts_with("data:") || !header.ends_with(";base64") {
            return Err(format!("Unsupported data URL header: {}", header));
        }
        let bytes = STANDARD.decode(payload).map_err(|e| e.to_string())?;
        Ok(Self { bytes })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encoding of the receipt artifact.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Png,
    Jpeg,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Png => "png",
            ArtifactFormat::Jpeg => "jpg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ArtifactFormat::Png => "image/png",
            ArtifactFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            ArtifactFormat::Png => image::ImageFormat::Png,
            ArtifactFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// The cropped, re-encoded receipt. Moves to the sink on commit; the session keeps no copy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptImage {
    pub bytes: Vec<u8>,
    pub format: ArtifactFormat,
    pub width: u32,
    pub height: u32,
}

impl ReceiptImage {
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Live coordinate readout shown by the debug overlay.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebugReadout {
    pub pointer: Point,
    pub scroll: Vector,
    pub selection: Rect,
    pub device_pixel_ratio: f64,
    pub zoom_level: i64,
    pub grid_cell: (i64, i64),
    pub grid_offset: (i64, i64),
}

impl fmt::Display for DebugReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mouse: ({}, {})",
            self.pointer.x.round(),
            self.pointer.y.round()
        )?;
        writeln!(
            f,
            "Scroll: ({}, {})",
            self.scroll.dx.round(),
            self.scroll.dy.round()
        )?;
        writeln!(
            f,
            "Selection: ({}, {})",
            self.selection.x.round(),
            self.selection.y.round()
        )?;
        writeln!(
            f,
            "Size: {}x{}",
            self.selection.width.round(),
            self.selection.height.round()
        )?;
        writeln!(f, "DPR: {}", self.device_pixel_ratio)?;
        writeln!(f, "Zoom: {}%", self.zoom_level)?;
        writeln!(f, "Grid Cell: ({}, {})", self.grid_cell.0, self.grid_cell.1)?;
        write!(f, "Offset: ({}, {})", self.grid_offset.0, self.grid_offset.1)
    }
}

/// Summary of a successful commit, returned to the host.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub session_id: String,
    pub selection: Rect,
    pub crop: PixelRect,
    pub viewport: ViewportMetadata,
    /// Zoom at commit time. `isZoomed` is advisory under the warn policy.
    pub zoom: Zoom,
    pub width: u32,
    pub height: u32,
}
