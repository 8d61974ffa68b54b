//! Writing conversion results to an output directory.
//!
//! Emission happens only after a conversion has fully succeeded, so a failed
//! strict conversion never leaves partial output behind.

pub mod asm;

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::convert::{BitmapConversion, SpriteConversion};
use crate::encode::Mode;
use crate::grid::PixelGrid;
use crate::manifest::SPRITE_POSITIONS_FILE;
use crate::mapper::grid_to_image;

/// File name of the bitmap assembler include.
pub const BITMAP_INCLUDE_FILE: &str = "bitmap.inc";
/// File name of the bitmap manifest.
pub const BITMAP_MANIFEST_FILE: &str = "manifest.json";
/// File name of the palette-rendered preview image.
pub const PREVIEW_FILE: &str = "preview.png";
/// File name of the sprite assembler include.
pub const SPRITE_INCLUDE_FILE: &str = "sprites.inc";
/// File name of the sprite manifest.
pub const SPRITE_MANIFEST_FILE: &str = "sprite_manifest.json";

/// Error type for bundle emission
#[derive(Debug, Error)]
pub enum EmitError {
    /// Filesystem error, with the path being written
    #[error("IO error writing {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// PNG encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// Bundle does not carry the planes of the requested output
    #[error("{0} bundle has no planes to write here")]
    WrongBundle(Mode),
}

/// Paths written by one emission, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmittedFiles {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl EmittedFiles {
    fn new(dir: &Path) -> Result<Self, EmitError> {
        fs::create_dir_all(dir)
            .map_err(|source| EmitError::Io { path: dir.to_path_buf(), source })?;
        Ok(Self { dir: dir.to_path_buf(), files: Vec::new() })
    }

    fn write(&mut self, name: &str, contents: impl AsRef<[u8]>) -> Result<(), EmitError> {
        let path = self.dir.join(name);
        fs::write(&path, contents).map_err(|source| EmitError::Io { path: path.clone(), source })?;
        log::debug!("wrote {}", path.display());
        self.files.push(path);
        Ok(())
    }
}

/// Write the bitmap, screen and color planes plus reports and manifest.
pub fn write_bitmap_bundle(
    dir: &Path,
    conversion: &BitmapConversion,
    emit_asm: bool,
) -> Result<EmittedFiles, EmitError> {
    let (bitmap, screen, color) = conversion
        .bundle
        .bitmap_planes()
        .ok_or(EmitError::WrongBundle(conversion.bundle.mode))?;
    let names = conversion.manifest.output_files();

    let mut out = EmittedFiles::new(dir)?;
    out.write(&names.bitmap, bitmap)?;
    out.write(&names.screen, screen)?;
    out.write(&names.color, color)?;
    out.write(&names.report_json, conversion.report.to_json()?)?;
    out.write(&names.report_txt, conversion.report.to_text())?;
    out.write(BITMAP_MANIFEST_FILE, conversion.manifest.to_json()?)?;
    if emit_asm {
        out.write(BITMAP_INCLUDE_FILE, asm::bitmap_include(&conversion.manifest))?;
    }
    Ok(out)
}

/// Render the mapped grid with palette colors and save it as `preview.png`.
pub fn write_preview(dir: &Path, grid: &PixelGrid) -> Result<PathBuf, EmitError> {
    fs::create_dir_all(dir).map_err(|source| EmitError::Io { path: dir.to_path_buf(), source })?;
    let path = dir.join(PREVIEW_FILE);
    grid_to_image(grid).save(&path)?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}

/// Write one file per sprite plus the positions list and manifest.
pub fn write_sprite_bundle(
    dir: &Path,
    conversion: &SpriteConversion,
    emit_asm: bool,
) -> Result<EmittedFiles, EmitError> {
    let mut out = EmittedFiles::new(dir)?;
    for sprite in &conversion.sprites {
        let data = sprite.bundle.sprite_data().ok_or(EmitError::WrongBundle(sprite.bundle.mode))?;
        out.write(&sprite.meta.file, data)?;
    }
    out.write(SPRITE_POSITIONS_FILE, conversion.positions_json()?)?;
    out.write(SPRITE_MANIFEST_FILE, conversion.manifest.to_json()?)?;
    if emit_asm {
        out.write(SPRITE_INCLUDE_FILE, asm::sprite_include(&conversion.manifest))?;
    }
    Ok(out)
}
