//! Host tensor representation and conversion to and from encoded images.

mod convert;
mod frames;
mod pixel_format;

pub use convert::{
    batch_from_frame, decode_png, encode_png, image_to_tensor, single_frame, stack_frames,
    tensor_to_image,
};
pub use frames::{decode_frames, load_batch};
pub use pixel_format::PixelFormat;

use ndarray::{Array3, Array4};

/// Batch of images in `(batch, height, width, channel)` layout, values in [0, 1].
pub type ImageTensor = Array4<f32>;

/// Single image in `(height, width, channel)` layout, values in [0, 1].
pub type FrameTensor = Array3<f32>;

/// Channel count of normalized output frames.
pub const RGB_CHANNELS: usize = 3;
