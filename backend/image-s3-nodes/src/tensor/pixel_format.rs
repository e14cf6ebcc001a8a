//! Pixel format tags resolved at decode time.

use image::{ColorType, DynamicImage, GenericImageView};
use ndarray::Array3;

use super::{FrameTensor, RGB_CHANNELS};

/// Storage layout of a decoded frame, used to pick its normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8 bits per channel: luma, luma+alpha, RGB or RGBA.
    Standard,
    /// Single-channel 16-bit integer samples.
    ///
    /// These are rescaled by 1/255 and truncated to an 8-bit level before
    /// normalization so they land in the same range as `Standard` frames.
    Integer,
    /// Every other high-precision layout (16-bit colour, 32-bit float).
    Wide,
}

impl PixelFormat {
    pub fn of(img: &DynamicImage) -> Self {
        match img.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                PixelFormat::Standard
            }
            ColorType::L16 => PixelFormat::Integer,
            _ => PixelFormat::Wide,
        }
    }

    /// Convert a frame into a 3-channel `(height, width, 3)` tensor in [0, 1].
    pub fn normalize(self, img: &DynamicImage) -> FrameTensor {
        match self {
            PixelFormat::Standard => normalize_standard(img),
            PixelFormat::Integer => normalize_integer(img),
            PixelFormat::Wide => normalize_wide(img),
        }
    }
}

fn normalize_standard(img: &DynamicImage) -> FrameTensor {
    let rgb = img.to_rgb8();
    rgb_tensor(img, |x, y, c| f32::from(rgb.get_pixel(x, y)[c]) / 255.0)
}

fn normalize_integer(img: &DynamicImage) -> FrameTensor {
    let luma = img.to_luma16();
    rgb_tensor(img, |x, y, _| {
        let level = (f32::from(luma.get_pixel(x, y)[0]) / 255.0).floor().min(255.0);
        level / 255.0
    })
}

fn normalize_wide(img: &DynamicImage) -> FrameTensor {
    let rgb = img.to_rgb32f();
    rgb_tensor(img, |x, y, c| rgb.get_pixel(x, y)[c].clamp(0.0, 1.0))
}

fn rgb_tensor(img: &DynamicImage, sample: impl Fn(u32, u32, usize) -> f32) -> FrameTensor {
    let (width, height) = img.dimensions();
    Array3::from_shape_fn(
        (height as usize, width as usize, RGB_CHANNELS),
        |(y, x, c)| sample(x as u32, y as u32, c),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgb32FImage, Rgba};

    #[test]
    fn test_format_tags() {
        assert_eq!(
            PixelFormat::of(&DynamicImage::new_rgb8(2, 2)),
            PixelFormat::Standard
        );
        assert_eq!(
            PixelFormat::of(&DynamicImage::new_luma_a8(2, 2)),
            PixelFormat::Standard
        );
        assert_eq!(
            PixelFormat::of(&DynamicImage::new_luma16(2, 2)),
            PixelFormat::Integer
        );
        assert_eq!(
            PixelFormat::of(&DynamicImage::new_rgb16(2, 2)),
            PixelFormat::Wide
        );
        assert_eq!(
            PixelFormat::of(&DynamicImage::new_rgba32f(2, 2)),
            PixelFormat::Wide
        );
    }

    #[test]
    fn test_standard_drops_alpha_and_scales() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(3, 2, Rgba([255, 51, 0, 10])));
        let tensor = PixelFormat::Standard.normalize(&img);

        assert_eq!(tensor.dim(), (2, 3, 3));
        assert_eq!(tensor[[1, 2, 0]], 1.0);
        assert!((tensor[[1, 2, 1]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[1, 2, 2]], 0.0);
    }

    #[test]
    fn test_standard_expands_luma() {
        let img = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(1, 1, Luma([102])));
        let tensor = PixelFormat::Standard.normalize(&img);
        assert_eq!(tensor.dim(), (1, 1, 3));
        assert!(tensor.iter().all(|v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_integer_rescales_by_255() {
        let mut buf = ImageBuffer::<Luma<u16>, Vec<u16>>::new(3, 1);
        buf.put_pixel(0, 0, Luma([255 * 51]));
        buf.put_pixel(1, 0, Luma([65535]));
        buf.put_pixel(2, 0, Luma([254]));
        let img = DynamicImage::ImageLuma16(buf);

        let tensor = PixelFormat::of(&img).normalize(&img);

        assert_eq!(tensor.dim(), (1, 3, 3));
        assert!((tensor[[0, 0, 0]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 1, 2]], 1.0);
        assert_eq!(tensor[[0, 2, 1]], 0.0);
    }

    #[test]
    fn test_wide_clamps_into_unit_range() {
        let img = DynamicImage::ImageRgb32F(Rgb32FImage::from_pixel(2, 2, Rgb([1.5, 0.25, -0.5])));
        let tensor = PixelFormat::Wide.normalize(&img);

        assert_eq!(tensor[[0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 0, 1]], 0.25);
        assert_eq!(tensor[[0, 0, 2]], 0.0);
    }
}
