//! c64gfx - Library for converting images into Commodore 64 graphics data
//!
//! This library provides functionality to:
//! - Map RGB images onto the fixed 16-color VIC-II palette, optionally dithered
//! - Encode hires and multicolor bitmaps and sprites under VIC-II color limits
//! - Report color conflicts and derive manifests with VIC-II register values
//! - Write the resulting buffers, reports and assembler includes to disk

pub mod cli;
pub mod config;
pub mod convert;
pub mod emit;
pub mod encode;
pub mod error;
pub mod grid;
pub mod manifest;
pub mod mapper;
pub mod palette;
pub mod regions;
pub mod report;

pub use convert::{
    analyze, convert_bitmap, convert_sprites, load_image, AnalyzeOptions, BitmapOptions,
    SpriteOptions,
};
pub use encode::Mode;
pub use error::{ConvertError, Result};
