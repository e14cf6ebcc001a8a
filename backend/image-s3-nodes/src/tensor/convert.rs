//! Tensor <-> bitmap conversion and the PNG codec used for uploads.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Luma, LumaA, Rgb, Rgba};
use ndarray::{Array3, ArrayView3, Axis};

use crate::error::{NodeError, Result};

use super::{FrameTensor, ImageTensor};

/// Convert a `(height, width, channel)` tensor into an 8-bit bitmap.
///
/// Each value becomes `clamp(round(255 * v), 0, 255)`. One, two, three or
/// four channels map to luma, luma+alpha, RGB and RGBA.
pub fn tensor_to_image(tensor: ArrayView3<'_, f32>) -> Result<DynamicImage> {
    let (height, width, channels) = tensor.dim();
    let (w, h) = (dimension(width)?, dimension(height)?);
    if w == 0 || h == 0 {
        return Err(NodeError::EmptyImage {
            width: w,
            height: h,
        });
    }

    // `iter` walks in logical (row, column, channel) order whatever the memory layout
    let raw: Vec<u8> = tensor.iter().copied().map(quantize).collect();

    let image = match channels {
        1 => ImageBuffer::<Luma<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
        2 => ImageBuffer::<LumaA<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageLumaA8),
        3 => ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
        4 => ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
        other => {
            return Err(NodeError::ShapeMismatch {
                expected: "1, 2, 3 or 4 channels".to_string(),
                actual: format!("{other} channels"),
            })
        }
    };

    image.ok_or_else(|| NodeError::ShapeMismatch {
        expected: format!("{height}x{width}x{channels} buffer"),
        actual: "short pixel buffer".to_string(),
    })
}

/// Convert a bitmap into a `(height, width, channel)` tensor in [0, 1].
///
/// 8-bit layouts keep their channel count; anything wider is converted to
/// 3-channel float RGB.
pub fn image_to_tensor(img: &DynamicImage) -> FrameTensor {
    match img {
        DynamicImage::ImageLuma8(buf) => u8_tensor(buf.width(), buf.height(), 1, buf.as_raw()),
        DynamicImage::ImageLumaA8(buf) => u8_tensor(buf.width(), buf.height(), 2, buf.as_raw()),
        DynamicImage::ImageRgb8(buf) => u8_tensor(buf.width(), buf.height(), 3, buf.as_raw()),
        DynamicImage::ImageRgba8(buf) => u8_tensor(buf.width(), buf.height(), 4, buf.as_raw()),
        other => {
            let (width, height) = other.dimensions();
            let rgb = other.to_rgb32f();
            Array3::from_shape_fn(
                (height as usize, width as usize, 3),
                |(y, x, c)| rgb.get_pixel(x as u32, y as u32)[c].clamp(0.0, 1.0),
            )
        }
    }
}

/// PNG-encode a bitmap.
pub fn encode_png(img: &DynamicImage) -> Result<Bytes> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| NodeError::Encode {
            format: "png",
            reason: e.to_string(),
        })?;
    Ok(Bytes::from(buf))
}

/// Decode a PNG buffer straight into a tensor.
pub fn decode_png(data: &[u8]) -> Result<FrameTensor> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Png)
        .map_err(NodeError::decode)?;
    Ok(image_to_tensor(&img))
}

/// Borrow the only image of a batch.
pub fn single_frame(batch: &ImageTensor) -> Result<ArrayView3<'_, f32>> {
    let batch_size = batch.len_of(Axis(0));
    if batch_size != 1 {
        return Err(NodeError::ShapeMismatch {
            expected: "batch of 1 image".to_string(),
            actual: format!("batch of {batch_size}"),
        });
    }
    Ok(batch.index_axis(Axis(0), 0))
}

/// Wrap a single image as a batch of one.
pub fn batch_from_frame(frame: FrameTensor) -> ImageTensor {
    frame.insert_axis(Axis(0))
}

/// Stack equally sized frames along a new leading batch axis.
pub fn stack_frames(frames: &[FrameTensor]) -> Result<ImageTensor> {
    let first = frames.first().ok_or_else(|| NodeError::ShapeMismatch {
        expected: "at least one frame".to_string(),
        actual: "0 frames".to_string(),
    })?;

    if let Some((index, frame)) = frames
        .iter()
        .enumerate()
        .find(|(_, frame)| frame.dim() != first.dim())
    {
        return Err(NodeError::ShapeMismatch {
            expected: format_dim(first.dim()),
            actual: format!("{} at frame {index}", format_dim(frame.dim())),
        });
    }

    let views: Vec<_> = frames.iter().map(|frame| frame.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| NodeError::ShapeMismatch {
        expected: format_dim(first.dim()),
        actual: e.to_string(),
    })
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

fn u8_tensor(width: u32, height: u32, channels: usize, raw: &[u8]) -> FrameTensor {
    let row = width as usize * channels;
    Array3::from_shape_fn((height as usize, width as usize, channels), |(y, x, c)| {
        f32::from(raw[y * row + x * channels + c]) / 255.0
    })
}

fn dimension(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| NodeError::ShapeMismatch {
        expected: "dimension below 2^32".to_string(),
        actual: len.to_string(),
    })
}

fn format_dim((height, width, channels): (usize, usize, usize)) -> String {
    format!("{height}x{width}x{channels}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn gradient(height: usize, width: usize, channels: usize) -> FrameTensor {
        Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
            ((y * 31 + x * 17 + c * 53) % 256) as f32 / 255.0
        })
    }

    #[test]
    fn test_quantize_rounds_and_clamps() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-0.3), 0);
        assert_eq!(quantize(1.7), 255);
    }

    #[test]
    fn test_png_round_trip_within_one_level() {
        let tensor = Array3::from_shape_fn((7, 5, 3), |(y, x, c)| {
            (y as f32 * 0.13 + x as f32 * 0.07 + c as f32 * 0.21) % 1.0
        });

        let png = encode_png(&tensor_to_image(tensor.view()).unwrap()).unwrap();
        let decoded = decode_png(&png).unwrap();

        assert_eq!(decoded.dim(), tensor.dim());
        for (a, b) in tensor.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 1.0 / 255.0, "{a} vs {b}");
        }
    }

    #[test]
    fn test_png_round_trip_is_exact_on_8bit_levels() {
        for channels in 1..=4 {
            let tensor = gradient(4, 6, channels);
            let png = encode_png(&tensor_to_image(tensor.view()).unwrap()).unwrap();
            assert_eq!(decode_png(&png).unwrap(), tensor);
        }
    }

    #[test]
    fn test_tensor_to_image_layout() {
        let mut tensor = Array3::<f32>::zeros((2, 3, 3));
        tensor[[1, 2, 0]] = 1.0;

        let img = tensor_to_image(tensor.view()).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        let rgb = img.to_rgb8();
        assert_eq!(rgb.get_pixel(2, 1), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_unsupported_channel_count() {
        let tensor = Array3::<f32>::zeros((2, 2, 5));
        let err = tensor_to_image(tensor.view()).unwrap_err();
        assert!(matches!(err, NodeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_tensor_is_rejected() {
        let tensor = Array3::<f32>::zeros((0, 4, 3));
        let err = tensor_to_image(tensor.view()).unwrap_err();
        assert!(matches!(err, NodeError::EmptyImage { width: 4, height: 0 }));
    }

    #[test]
    fn test_decode_png_rejects_garbage() {
        let err = decode_png(b"definitely not a png").unwrap_err();
        assert!(matches!(err, NodeError::Decode { .. }));
    }

    #[test]
    fn test_single_frame_requires_batch_of_one() {
        let batch = Array4::<f32>::zeros((1, 2, 2, 3));
        assert_eq!(single_frame(&batch).unwrap().dim(), (2, 2, 3));

        let batch = Array4::<f32>::zeros((2, 2, 2, 3));
        assert!(matches!(
            single_frame(&batch),
            Err(NodeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_stack_frames() {
        let frames = vec![gradient(3, 4, 3), gradient(3, 4, 3), gradient(3, 4, 3)];
        let batch = stack_frames(&frames).unwrap();
        assert_eq!(batch.dim(), (3, 3, 4, 3));
        assert_eq!(batch.index_axis(Axis(0), 2), frames[2]);
    }

    #[test]
    fn test_stack_frames_rejects_mismatched_sizes() {
        let frames = vec![gradient(3, 4, 3), gradient(4, 3, 3)];
        let err = stack_frames(&frames).unwrap_err();
        assert!(err.to_string().contains("frame 1"));

        assert!(stack_frames(&[]).is_err());
    }

    #[test]
    fn test_batch_from_frame() {
        let batch = batch_from_frame(gradient(2, 3, 3));
        assert_eq!(batch.dim(), (1, 2, 3, 3));
    }
}
