use std::io::Cursor;

use anyhow::{bail, Context};
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::host::ImageCropper;
use crate::models::{ArtifactFormat, CaptureFrame, PixelRect, ReceiptImage};

/// Crops decoded frames with the `image` crate and re-encodes the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCropper {
    format: ArtifactFormat,
}

impl RasterCropper {
    pub fn new(format: ArtifactFormat) -> Self {
        Self { format }
    }
}

impl ImageCropper for RasterCropper {
    fn crop(&self, frame: &CaptureFrame, rect: PixelRect) -> anyhow::Result<ReceiptImage> {
        let img = image::load_from_memory(&frame.bytes).context("Could not decode capture frame")?;
        let (img_w, img_h) = img.dimensions();

        // Frame pixels already include the device pixel ratio; clamp to what was captured.
        let x = rect.x.max(0);
        let y = rect.y.max(0);
        let x2 = (rect.x + rect.width).min(img_w as i64);
        let y2 = (rect.y + rect.height).min(img_h as i64);
        if x >= x2 || y >= y2 {
            bail!("Crop area is outside the image bounds.");
        }

        let (w, h) = ((x2 - x) as u32, (y2 - y) as u32);
        let cropped = img.crop_imm(x as u32, y as u32, w, h);
        let cropped = match self.format {
            ArtifactFormat::Jpeg => DynamicImage::ImageRgb8(cropped.to_rgb8()),
            ArtifactFormat::Png => cropped,
        };

        let mut bytes = Vec::new();
        cropped
            .write_to(&mut Cursor::new(&mut bytes), self.format.image_format())
            .context("Could not encode receipt image")?;

        debug!(x, y, width = w, height = h, frame_width = img_w, frame_height = img_h, "cropped frame");

        Ok(ReceiptImage {
            bytes,
            format: self.format,
            width: w,
            height: h,
        })
    }
}

/// Encodes an RGBA buffer as a PNG capture frame.
pub fn frame_from_image(img: &DynamicImage) -> anyhow::Result<CaptureFrame> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .context("Could not encode capture frame")?;
    Ok(CaptureFrame::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// 100x60 frame: left half red, right half blue.
    fn split_frame() -> CaptureFrame {
        let img = RgbaImage::from_fn(100, 60, |x, _| {
            if x < 50 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        frame_from_image(&DynamicImage::ImageRgba8(img)).expect("encode")
    }

    #[test]
    fn crops_the_requested_pixels() {
        let cropper = RasterCropper::default();
        let rect = PixelRect {
            x: 40,
            y: 10,
            width: 20,
            height: 30,
        };

        let artifact = cropper.crop(&split_frame(), rect).expect("crop");
        assert_eq!((artifact.width, artifact.height), (20, 30));

        let decoded = image::load_from_memory(&artifact.bytes).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (20, 30));
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*decoded.get_pixel(19, 29), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn clamps_to_frame_bounds() {
        let cropper = RasterCropper::default();
        let rect = PixelRect {
            x: -10,
            y: 50,
            width: 40,
            height: 40,
        };

        let artifact = cropper.crop(&split_frame(), rect).expect("crop");
        assert_eq!((artifact.width, artifact.height), (30, 10));
    }

    #[test]
    fn rejects_rect_outside_frame() {
        let cropper = RasterCropper::default();
        let rect = PixelRect {
            x: 200,
            y: 0,
            width: 10,
            height: 10,
        };

        let err = cropper.crop(&split_frame(), rect).unwrap_err();
        assert!(err.to_string().contains("outside the image bounds"));
    }

    #[test]
    fn rejects_undecodable_frame() {
        let cropper = RasterCropper::default();
        let frame = CaptureFrame::new(vec![1, 2, 3]);
        assert!(cropper.crop(&frame, PixelRect::default()).is_err());
    }

    #[test]
    fn encodes_jpeg_when_configured() {
        let cropper = RasterCropper::new(ArtifactFormat::Jpeg);
        let rect = PixelRect {
            x: 0,
            y: 0,
            width: 16,
            height: 16,
        };

        let artifact = cropper.crop(&split_frame(), rect).expect("crop");
        assert_eq!(artifact.format, ArtifactFormat::Jpeg);
        assert_eq!(&artifact.bytes[..2], &[0xFF, 0xD8]);
    }
}
