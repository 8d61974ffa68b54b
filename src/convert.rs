//! Conversion pipeline: resize, palette-map, encode, aggregate.
//!
//! Each entry point is a pure function of its image and options. Nothing is
//! cached between calls, so conversions may run concurrently.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;

use crate::encode::sprite::sprite_color_roles;
use crate::encode::{
    check_background, encode_bitmap_hires, encode_bitmap_multicolor, encode_sprite_hires,
    encode_sprite_multicolor, ConflictRecord, EncodedBundle, Mode,
};
use crate::error::{ConvertError, Result};
use crate::grid::{rank_colors, PixelGrid};
use crate::manifest::{sprite_file_name, Addresses, Manifest, SpriteConflicts, SpriteManifest};
use crate::mapper::map_image;
use crate::palette::PaletteIndex;
use crate::regions::{region_list, Region};
use crate::report::Report;

/// Load and decode an image, accepting PNG, JPEG and BMP only.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    match reader.format() {
        Some(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp) => Ok(reader.decode()?),
        Some(other) => Err(ConvertError::UnsupportedFormat(format!("{:?}", other))),
        None => Err(ConvertError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Resize to `width`x`height` with Lanczos filtering, unless already that size.
fn resize_to(image: RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    image::imageops::resize(&image, width, height, FilterType::Lanczos3)
}

/// Options for [`convert_bitmap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapOptions {
    pub mode: Mode,
    pub addresses: Addresses,
    pub dither: bool,
    pub background_color: Option<PaletteIndex>,
    pub border_color: Option<PaletteIndex>,
    pub strict: bool,
}

impl Default for BitmapOptions {
    fn default() -> Self {
        Self {
            mode: Mode::BitmapMulticolor,
            addresses: Addresses::default(),
            dither: false,
            background_color: None,
            border_color: None,
            strict: false,
        }
    }
}

/// Result of a bitmap conversion.
#[derive(Debug, Clone)]
pub struct BitmapConversion {
    pub grid: PixelGrid,
    pub bundle: EncodedBundle,
    pub report: Report,
    pub manifest: Manifest,
}

fn require_bitmap_mode(mode: Mode) -> Result<()> {
    if !mode.is_bitmap() {
        return Err(ConvertError::UnsupportedMode(format!("{} (expected a bitmap mode)", mode)));
    }
    Ok(())
}

/// Map an image to the mode's bitmap resolution and return the grid and
/// the background the conversion settles on.
fn prepare_bitmap(
    image: &DynamicImage,
    mode: Mode,
    dither: bool,
    background: Option<PaletteIndex>,
) -> Result<(PixelGrid, PaletteIndex)> {
    let (width, height) = mode.image_size();
    let rgb = resize_to(image.to_rgb8(), width, height);
    let grid = map_image(&rgb, dither);
    let background = match background {
        Some(bg) => check_background(bg)?,
        None => grid.dominant_color(),
    };
    Ok((grid, background))
}

fn encode_bitmap_grid(
    grid: &PixelGrid,
    mode: Mode,
    background: PaletteIndex,
    strict: bool,
) -> Result<EncodedBundle> {
    match mode {
        Mode::BitmapMulticolor => encode_bitmap_multicolor(grid, Some(background), strict),
        _ => encode_bitmap_hires(grid, strict),
    }
}

/// Convert an image into a full-screen bitmap bundle.
pub fn convert_bitmap(image: &DynamicImage, options: &BitmapOptions) -> Result<BitmapConversion> {
    require_bitmap_mode(options.mode)?;
    if let Some(border) = options.border_color {
        check_background(border)?;
    }

    let (grid, background) =
        prepare_bitmap(image, options.mode, options.dither, options.background_color)?;
    let bundle = encode_bitmap_grid(&grid, options.mode, background, options.strict)?;
    let palette_used = grid.palette_used();

    log::debug!(
        "{}: {} colors used, background {}, {} fixed cells",
        options.mode,
        palette_used.len(),
        background,
        bundle.fixed_units
    );

    let report = Report::from_bundle(&bundle, grid.dimensions(), palette_used.clone(), background);
    let manifest = Manifest::new(
        options.mode,
        options.addresses,
        palette_used,
        background,
        options.border_color,
    );
    Ok(BitmapConversion { grid, bundle, report, manifest })
}

/// Options for [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeOptions {
    pub mode: Mode,
    pub constraints_only: bool,
    pub background_color: Option<PaletteIndex>,
    pub dither: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            mode: Mode::BitmapMulticolor,
            constraints_only: false,
            background_color: None,
            dither: false,
        }
    }
}

/// Constraint analysis of an image, without writing any buffers.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub report: Report,
    pub report_text: String,
}

/// Run the bitmap encoder in degrade mode and report what it would change.
///
/// With `constraints_only` the palette listing is left empty.
pub fn analyze(image: &DynamicImage, options: &AnalyzeOptions) -> Result<Analysis> {
    require_bitmap_mode(options.mode)?;
    let (grid, background) =
        prepare_bitmap(image, options.mode, options.dither, options.background_color)?;
    let bundle = encode_bitmap_grid(&grid, options.mode, background, false)?;
    let palette_used = if options.constraints_only { Vec::new() } else { grid.palette_used() };
    let report = Report::from_bundle(&bundle, grid.dimensions(), palette_used, background);
    let report_text = report.to_text();
    Ok(Analysis { report, report_text })
}

/// Options for [`convert_sprites`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteOptions {
    pub mode: Mode,
    pub regions: Option<Vec<Region>>,
    pub background_color: Option<PaletteIndex>,
    pub dither: bool,
    pub strict: bool,
    /// Address of the first sprite block
    pub sprite_base: u16,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            mode: Mode::SpriteHires,
            regions: None,
            background_color: None,
            dither: false,
            strict: false,
            sprite_base: Addresses::default().sprites,
        }
    }
}

/// Per-sprite metadata, as written to `sprite_positions.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteMeta {
    pub index: usize,
    pub file: String,
    pub region: Region,
    /// Colors present in the sprite, frequency-ranked
    pub palette_used: Vec<PaletteIndex>,
    pub primary_color: PaletteIndex,
    pub extra_colors: Vec<PaletteIndex>,
    pub conflicts: Vec<ConflictRecord>,
}

/// One encoded sprite with its metadata.
#[derive(Debug, Clone)]
pub struct SpriteAsset {
    pub meta: SpriteMeta,
    pub bundle: EncodedBundle,
}

impl SpriteAsset {
    /// The packed 64-byte sprite.
    pub fn data(&self) -> &[u8] {
        self.bundle.sprite_data().unwrap_or_default()
    }
}

/// Result of a sprite conversion.
#[derive(Debug, Clone)]
pub struct SpriteConversion {
    pub sprites: Vec<SpriteAsset>,
    pub manifest: SpriteManifest,
}

impl SpriteConversion {
    /// Metadata of every sprite, in region order.
    pub fn metadata(&self) -> Vec<&SpriteMeta> {
        self.sprites.iter().map(|s| &s.meta).collect()
    }

    /// Pretty JSON list of sprite metadata.
    pub fn positions_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.metadata())
    }
}

/// Convert an image into one sprite per region.
///
/// Every region is cropped, resized to the sprite size and encoded on its
/// own. In strict mode the first over-budget sprite fails the whole call.
pub fn convert_sprites(image: &DynamicImage, options: &SpriteOptions) -> Result<SpriteConversion> {
    if options.mode.is_bitmap() {
        return Err(ConvertError::UnsupportedMode(format!(
            "{} (expected a sprite mode)",
            options.mode
        )));
    }

    let (sprite_w, sprite_h) = options.mode.image_size();
    let regions = region_list(
        image.width(),
        image.height(),
        (sprite_w, sprite_h),
        options.regions.as_deref(),
    )?;
    log::debug!("{}: {} regions", options.mode, regions.len());

    let mut sprites = Vec::with_capacity(regions.len());
    for (index, region) in regions.into_iter().enumerate() {
        let crop = image.crop_imm(region.x, region.y, region.w, region.h).to_rgb8();
        let grid = map_image(&resize_to(crop, sprite_w, sprite_h), options.dither);

        let bundle = match options.mode {
            Mode::SpriteMulticolor => {
                encode_sprite_multicolor(&grid, options.background_color, options.strict)?
            }
            _ => encode_sprite_hires(&grid, options.strict)?,
        };
        let (primary_color, extra_colors) = sprite_color_roles(&bundle);

        sprites.push(SpriteAsset {
            meta: SpriteMeta {
                index,
                file: sprite_file_name(index),
                region,
                palette_used: rank_colors(&grid.counts()),
                primary_color,
                extra_colors,
                conflicts: bundle.conflicts.clone(),
            },
            bundle,
        });
    }

    let conflicts = sprites
        .iter()
        .filter(|s| !s.meta.conflicts.is_empty())
        .map(|s| SpriteConflicts { index: s.meta.index, conflicts: s.meta.conflicts.clone() })
        .collect();
    let manifest = SpriteManifest::new(options.mode, options.sprite_base, sprites.len(), conflicts);

    Ok(SpriteConversion { sprites, manifest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn image_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Rgb<u8>) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, f))
    }

    #[test]
    fn test_convert_bitmap_hires_native_size() {
        let image = image_from_fn(320, 200, |x, y| if x < 4 && y < 8 { WHITE } else { BLACK });
        let options = BitmapOptions { mode: Mode::BitmapHires, ..Default::default() };
        let result = convert_bitmap(&image, &options).unwrap();

        let (bitmap, screen, color) = result.bundle.bitmap_planes().unwrap();
        assert_eq!((bitmap.len(), screen.len(), color.len()), (8000, 1000, 1000));
        assert_eq!(screen[0], 0x10);
        assert_eq!(result.report.palette_used, vec![0, 1]);
        assert_eq!(result.report.background_color, 0);
        assert_eq!(result.report.fixed_cells, 0);
        assert_eq!(result.manifest.vic_registers().d016, 0x08);
    }

    #[test]
    fn test_convert_bitmap_resizes_input() {
        let image = image_from_fn(64, 40, |_, _| Rgb([0, 0, 170]));
        let result = convert_bitmap(&image, &BitmapOptions::default()).unwrap();
        assert_eq!(result.grid.dimensions(), (160, 200));
        assert_eq!(result.report.image_size, [160, 200]);
        assert_eq!(result.bundle.background_color, Some(6));
        assert_eq!(result.manifest.palette().used_indexes, vec![6]);
    }

    #[test]
    fn test_convert_bitmap_rejects_sprite_mode() {
        let image = image_from_fn(24, 21, |_, _| BLACK);
        let options = BitmapOptions { mode: Mode::SpriteHires, ..Default::default() };
        assert!(matches!(
            convert_bitmap(&image, &options),
            Err(ConvertError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn test_convert_bitmap_strict_fails_atomically() {
        let image = image_from_fn(320, 200, |x, _| match x % 3 {
            0 => BLACK,
            1 => WHITE,
            _ => Rgb([136, 0, 0]),
        });
        let options = BitmapOptions { mode: Mode::BitmapHires, strict: true, ..Default::default() };
        assert!(matches!(
            convert_bitmap(&image, &options),
            Err(ConvertError::ColorBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_analyze_constraints_only() {
        let image = image_from_fn(160, 200, |x, y| if (x + y) % 2 == 0 { WHITE } else { BLACK });
        let options = AnalyzeOptions { constraints_only: true, ..Default::default() };
        let analysis = analyze(&image, &options).unwrap();
        assert!(analysis.report.palette_used.is_empty());
        assert_eq!(analysis.report.fixed_cells, 0);
        assert!(analysis.report_text.starts_with("mode: bitmap_multicolor\n"));
    }

    #[test]
    fn test_convert_sprites_auto_tiles() {
        let image =
            image_from_fn(48, 42, |x, y| if (x / 24 + y / 21) % 2 == 0 { WHITE } else { BLACK });
        let result = convert_sprites(&image, &SpriteOptions::default()).unwrap();
        assert_eq!(result.sprites.len(), 4);
        let origins: Vec<(u32, u32)> =
            result.sprites.iter().map(|s| (s.meta.region.x, s.meta.region.y)).collect();
        assert_eq!(origins, vec![(0, 0), (24, 0), (0, 21), (24, 21)]);
        assert!(result.sprites.iter().all(|s| s.data().len() == 64));
        assert_eq!(result.manifest.output_files()[3], "sprite_003.bin");
        assert_eq!(result.sprites[1].meta.file, "sprite_001.bin");
    }

    #[test]
    fn test_convert_sprites_unaligned_fails() {
        let image = image_from_fn(30, 21, |_, _| BLACK);
        assert!(matches!(
            convert_sprites(&image, &SpriteOptions::default()),
            Err(ConvertError::UnalignedRegionGrid { .. })
        ));
    }

    #[test]
    fn test_convert_sprites_explicit_regions_resized() {
        let image = image_from_fn(100, 50, |x, _| if x < 50 { WHITE } else { BLACK });
        let options = SpriteOptions {
            mode: Mode::SpriteMulticolor,
            regions: Some(vec![Region::new(0, 0, 48, 42), Region::new(52, 4, 24, 21)]),
            ..Default::default()
        };
        let result = convert_sprites(&image, &options).unwrap();
        assert_eq!(result.sprites.len(), 2);
        assert_eq!(result.sprites[0].meta.palette_used, vec![1]);
        assert_eq!(result.sprites[1].meta.palette_used, vec![0]);
        assert_eq!(result.manifest.mode(), Mode::SpriteMulticolor);
    }

    #[test]
    fn test_sprite_conflicts_reach_manifest() {
        let image = image_from_fn(24, 21, |x, _| match x % 3 {
            0 => BLACK,
            1 => WHITE,
            _ => Rgb([0, 0, 170]),
        });
        let result = convert_sprites(&image, &SpriteOptions::default()).unwrap();
        assert_eq!(result.sprites[0].meta.conflicts.len(), 1);
        assert_eq!(result.manifest.conflicts().len(), 1);
        assert_eq!(result.manifest.conflicts()[0].index, 0);

        let strict = SpriteOptions { strict: true, ..Default::default() };
        assert!(convert_sprites(&image, &strict).is_err());
    }

    #[test]
    fn test_positions_json() {
        let image = image_from_fn(24, 21, |_, _| BLACK);
        let result = convert_sprites(&image, &SpriteOptions::default()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&result.positions_json().unwrap()).unwrap();
        assert_eq!(json[0]["file"], "sprite_000.bin");
        assert_eq!(json[0]["region"], serde_json::json!({"x": 0, "y": 0, "w": 24, "h": 21}));
        assert_eq!(json[0]["primary_color"], 0);
    }
}
