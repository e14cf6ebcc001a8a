//! Square WebP thumbnail generation

pub mod processor;

pub use processor::{
    CropBox, ThumbnailConfig, ThumbnailProcessor, ThumbnailResult, ThumbnailSource,
    DEFAULT_THUMBNAIL_SIZE, THUMBNAIL_QUALITY,
};
