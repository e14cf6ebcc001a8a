//! Thumbnail processor - generates square WebP thumbnails
//!
//! Takes an image, crops the largest centered square out of it, resizes that
//! square to the requested size with Lanczos3 and encodes it as lossy WebP.
//!
//! Uses `spawn_blocking` for CPU-intensive operations to avoid blocking the async runtime.

use crate::error::{NodeError, Result};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use tracing::debug;

/// Lossy WebP quality on a 0-100 scale
pub const THUMBNAIL_QUALITY: f32 = 80.0;

/// Default thumbnail edge length in pixels
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 200;

/// Configuration for thumbnail generation
#[derive(Clone, Debug)]
pub struct ThumbnailConfig {
    /// WebP quality (0-100)
    pub quality: f32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            quality: THUMBNAIL_QUALITY,
        }
    }
}

/// Image handed to the processor
#[derive(Debug, Clone)]
pub enum ThumbnailSource {
    /// Encoded image bytes in any format the decoder understands
    Encoded(Bytes),
    /// Already decoded bitmap
    Decoded(DynamicImage),
}

/// Centered square crop region, `right` and `bottom` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    /// Largest square centered in a `width` x `height` image
    pub fn centered_square(width: u32, height: u32) -> Self {
        let side = width.min(height);
        let left = (width - side) / 2;
        let top = (height - side) / 2;

        Self {
            left,
            top,
            right: left + side,
            bottom: top + side,
        }
    }

    pub fn side(&self) -> u32 {
        self.right - self.left
    }
}

/// Result of thumbnail generation
#[derive(Debug)]
pub struct ThumbnailResult {
    /// The thumbnail image data as WebP
    pub data: Bytes,
    /// Width of the thumbnail
    pub width: u32,
    /// Height of the thumbnail
    pub height: u32,
}

/// Thumbnail processor
pub struct ThumbnailProcessor {
    config: ThumbnailConfig,
}

impl ThumbnailProcessor {
    /// Create a new processor with the given configuration
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Create a processor with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ThumbnailConfig::default())
    }

    /// Generate a `width` x `height` thumbnail (blocking version)
    ///
    /// **Note:** This method performs CPU-intensive operations and should not be called
    /// directly from async code. Use `generate_async` instead.
    pub fn generate(
        &self,
        source: &ThumbnailSource,
        width: u32,
        height: u32,
    ) -> Result<ThumbnailResult> {
        validate_size("resizing_width", width)?;
        validate_size("resizing_height", height)?;

        let decoded;
        let img = match source {
            ThumbnailSource::Encoded(data) => {
                decoded = image::load_from_memory(data).map_err(NodeError::decode)?;
                &decoded
            }
            ThumbnailSource::Decoded(img) => img,
        };

        let (orig_w, orig_h) = img.dimensions();
        if orig_w == 0 || orig_h == 0 {
            return Err(NodeError::EmptyImage {
                width: orig_w,
                height: orig_h,
            });
        }

        let crop = CropBox::centered_square(orig_w, orig_h);
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            left = crop.left,
            top = crop.top,
            side = crop.side(),
            "Cropping image for thumbnail"
        );

        let square = img.crop_imm(crop.left, crop.top, crop.side(), crop.side());
        let resized = square.resize_exact(width, height, FilterType::Lanczos3);

        let data = self.encode_webp(&resized)?;

        debug!(width, height, size = data.len(), "Thumbnail generated");

        Ok(ThumbnailResult {
            data,
            width,
            height,
        })
    }

    /// Generate a thumbnail asynchronously using a blocking thread pool
    ///
    /// # Example
    /// ```ignore
    /// let processor = Arc::new(ThumbnailProcessor::with_defaults());
    /// let result = processor.generate_async(ThumbnailSource::Encoded(bytes), 200, 200).await?;
    /// ```
    pub async fn generate_async(
        self: Arc<Self>,
        source: ThumbnailSource,
        width: u32,
        height: u32,
    ) -> Result<ThumbnailResult> {
        tokio::task::spawn_blocking(move || self.generate(&source, width, height)).await?
    }

    /// Encode image as lossy WebP
    fn encode_webp(&self, img: &DynamicImage) -> Result<Bytes> {
        // libwebp only takes 8-bit RGB or RGBA
        let img = if img.color().has_alpha() {
            DynamicImage::ImageRgba8(img.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(img.to_rgb8())
        };

        let encoder = webp::Encoder::from_image(&img).map_err(|reason| NodeError::Encode {
            format: "webp",
            reason: reason.to_string(),
        })?;
        let encoded = encoder.encode(self.config.quality);

        Ok(Bytes::copy_from_slice(&encoded))
    }
}

fn validate_size(name: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(NodeError::invalid_parameter(name, "must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: &DynamicImage) -> Bytes {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    #[test]
    fn test_crop_box_landscape() {
        let crop = CropBox::centered_square(100, 50);
        assert_eq!(
            crop,
            CropBox {
                left: 25,
                top: 0,
                right: 75,
                bottom: 50
            }
        );
    }

    #[test]
    fn test_crop_box_portrait() {
        let crop = CropBox::centered_square(40, 101);
        assert_eq!((crop.left, crop.top, crop.right, crop.bottom), (0, 30, 40, 70));
    }

    #[test]
    fn test_crop_box_square_is_full_image() {
        let crop = CropBox::centered_square(64, 64);
        assert_eq!((crop.left, crop.top, crop.right, crop.bottom), (0, 0, 64, 64));
    }

    #[test]
    fn test_generate_has_requested_dimensions() {
        let processor = ThumbnailProcessor::with_defaults();
        let source = ThumbnailSource::Encoded(png_bytes(&DynamicImage::ImageRgb8(
            RgbImage::from_pixel(300, 120, Rgb([10, 200, 30])),
        )));

        let result = processor.generate(&source, 64, 48).unwrap();
        assert_eq!((result.width, result.height), (64, 48));

        assert_eq!(
            image::guess_format(&result.data).unwrap(),
            ImageFormat::WebP
        );
        let decoded = image::load_from_memory(&result.data).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_generate_keeps_center_of_landscape() {
        // Red side bars, blue center square
        let img = RgbImage::from_fn(90, 30, |x, _| {
            if (30..60).contains(&x) {
                Rgb([0, 0, 255])
            } else {
                Rgb([255, 0, 0])
            }
        });
        let processor = ThumbnailProcessor::with_defaults();

        let result = processor
            .generate(&ThumbnailSource::Decoded(DynamicImage::ImageRgb8(img)), 16, 16)
            .unwrap();

        let decoded = image::load_from_memory(&result.data).unwrap().to_rgb8();
        let center = decoded.get_pixel(8, 8);
        assert!(center[2] > 200 && center[0] < 60, "center pixel {center:?}");
    }

    #[test]
    fn test_generate_accepts_alpha_source() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 20, Rgba([1, 2, 3, 128])));
        let result = ThumbnailProcessor::with_defaults()
            .generate(&ThumbnailSource::Decoded(img), 10, 10)
            .unwrap();
        assert_eq!(
            image::load_from_memory(&result.data).unwrap().dimensions(),
            (10, 10)
        );
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        let processor = ThumbnailProcessor::with_defaults();
        let source = ThumbnailSource::Decoded(DynamicImage::new_rgb8(10, 10));

        let err = processor.generate(&source, 0, 10).unwrap_err();
        assert!(
            matches!(err, NodeError::InvalidParameter { ref name, .. } if name == "resizing_width")
        );
        let err = processor.generate(&source, 10, 0).unwrap_err();
        assert!(
            matches!(err, NodeError::InvalidParameter { ref name, .. } if name == "resizing_height")
        );
    }

    #[test]
    fn test_corrupt_input_is_decode_error() {
        let processor = ThumbnailProcessor::with_defaults();
        let source = ThumbnailSource::Encoded(Bytes::from_static(b"\x89PNG\r\n\x1a\ntruncated"));

        let err = processor.generate(&source, 10, 10).unwrap_err();
        assert!(matches!(err, NodeError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_generate_async() {
        let processor = Arc::new(ThumbnailProcessor::with_defaults());
        let source = ThumbnailSource::Decoded(DynamicImage::new_rgb8(50, 80));

        let result = processor.generate_async(source, 200, 200).await.unwrap();
        assert_eq!((result.width, result.height), (200, 200));
    }
}
