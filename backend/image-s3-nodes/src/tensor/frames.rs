//! Multi-frame decoding for downloaded objects.

use std::io::{BufRead, Seek};

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{
    AnimationDecoder, DynamicImage, GenericImageView, ImageDecoder, ImageError, ImageFormat,
    ImageReader, ImageResult,
};
use tracing::debug;

use crate::error::{NodeError, Result};

use super::{stack_frames, ImageTensor, PixelFormat};

/// Decode every frame of an encoded image.
///
/// Animated GIF, APNG and animated WebP yield one bitmap per frame; anything
/// else yields a single bitmap with its EXIF orientation already applied.
pub fn decode_frames<R: BufRead + Seek>(reader: R) -> Result<Vec<DynamicImage>> {
    let reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| NodeError::decode(ImageError::IoError(e)))?;
    let format = reader.format();

    let frames = match format {
        Some(ImageFormat::Gif) => {
            let decoder = GifDecoder::new(reader.into_inner()).map_err(NodeError::decode)?;
            collect_animation(decoder)?
        }
        Some(ImageFormat::Png) => {
            let decoder = PngDecoder::new(reader.into_inner()).map_err(NodeError::decode)?;
            if decoder.is_apng().map_err(NodeError::decode)? {
                collect_animation(decoder.apng().map_err(NodeError::decode)?)?
            } else {
                vec![oriented_frame(decoder)?]
            }
        }
        Some(ImageFormat::WebP) => {
            let decoder = WebPDecoder::new(reader.into_inner()).map_err(NodeError::decode)?;
            if decoder.has_animation() {
                collect_animation(decoder)?
            } else {
                vec![oriented_frame(decoder)?]
            }
        }
        _ => {
            let decoder = reader.into_decoder().map_err(NodeError::decode)?;
            vec![oriented_frame(decoder)?]
        }
    };

    if let Some(empty) = frames.iter().find(|frame| frame.width() == 0 || frame.height() == 0) {
        let (width, height) = empty.dimensions();
        return Err(NodeError::EmptyImage { width, height });
    }

    debug!(format = ?format, frames = frames.len(), "Decoded image frames");
    Ok(frames)
}

/// Decode an encoded image into a normalized RGB batch, one entry per frame.
pub fn load_batch<R: BufRead + Seek>(reader: R) -> Result<ImageTensor> {
    let frames: Vec<_> = decode_frames(reader)?
        .iter()
        .map(|frame| PixelFormat::of(frame).normalize(frame))
        .collect();

    stack_frames(&frames)
}

fn collect_animation<'a>(decoder: impl AnimationDecoder<'a>) -> Result<Vec<DynamicImage>> {
    decoder
        .into_frames()
        .map(|frame| frame.map(|f| DynamicImage::ImageRgba8(f.into_buffer())))
        .collect::<ImageResult<Vec<_>>>()
        .map_err(NodeError::decode)
}

fn oriented_frame(mut decoder: impl ImageDecoder) -> Result<DynamicImage> {
    let orientation = decoder.orientation().map_err(NodeError::decode)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(NodeError::decode)?;
    img.apply_orientation(orientation);
    Ok(img)
}
