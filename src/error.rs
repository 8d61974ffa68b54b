//! Error types for image conversion

use thiserror::Error;

/// Error raised by the conversion pipeline.
///
/// Encoders either return a complete bundle or one of these errors; no
/// partially filled buffers ever escape a failed call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// Mode string not recognized, or a mode used with the wrong entry point
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),
    /// Grid does not have the pixel dimensions the mode mandates
    #[error("{mode} requires {expected_w}x{expected_h} input, got {actual_w}x{actual_h}", expected_w = expected.0, expected_h = expected.1, actual_w = actual.0, actual_h = actual.1)]
    DimensionMismatch { mode: String, expected: (u32, u32), actual: (u32, u32) },
    /// Sprite source size is not a multiple of the sprite size and no regions were given
    #[error("Image size {image_w}x{image_h} does not align to the {sprite_w}x{sprite_h} sprite grid; provide regions", image_w = image.0, image_h = image.1, sprite_w = sprite.0, sprite_h = sprite.1)]
    UnalignedRegionGrid { image: (u32, u32), sprite: (u32, u32) },
    /// Strict mode found a unit with more colors than its budget
    #[error("Color conflict in {unit}: {colors:?}")]
    ColorBudgetExceeded { unit: String, colors: Vec<u8> },
    /// Explicit region reaches past the image edge
    #[error("Region {x},{y} {w}x{h} lies outside the {image_w}x{image_h} image", image_w = image.0, image_h = image.1)]
    RegionOutOfBounds { x: u32, y: u32, w: u32, h: u32, image: (u32, u32) },
    /// Pixel value outside the 16-entry palette
    #[error("Palette index {0} out of range (0-15)")]
    InvalidPaletteIndex(u8),
    /// Pixel buffer length disagrees with the stated dimensions
    #[error("Pixel buffer holds {len} entries, expected {width}x{height}")]
    InvalidGrid { width: u32, height: u32, len: usize },
    /// Address string could not be parsed
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    /// Image container format not accepted by the loader
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    /// Error from the image decoding collaborator
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// Error from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
