//! VIC-II cell and sprite encoders.
//!
//! All four encoders share the same shape: count the colors of an encoding
//! unit, rank them, pick as many as the unit's color budget allows, then pack
//! each pixel's code into bytes. What differs is captured by [`Mode`] (unit
//! geometry and mandated image size) and [`ColorScheme`] (budget, background
//! handling and pixel codes).

pub mod bitmap;
pub mod sprite;

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConvertError, Result};
use crate::grid::{rank_colors, ColorCounts, PixelGrid};
use crate::palette::{PaletteIndex, PALETTE_SIZE};

pub use bitmap::{encode_bitmap_hires, encode_bitmap_multicolor};
pub use sprite::{encode_sprite_hires, encode_sprite_multicolor};

/// Screen width in cells.
pub const CELLS_X: u32 = 40;
/// Screen height in cells.
pub const CELLS_Y: u32 = 25;
/// Bytes in the bitmap plane.
pub const BITMAP_BYTES: usize = 8000;
/// Bytes in the screen and color planes.
pub const CELL_BYTES: usize = 1000;
/// Bytes in one packed sprite, including the padding byte.
pub const SPRITE_BYTES: usize = 64;

/// Target display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    BitmapHires,
    BitmapMulticolor,
    SpriteHires,
    SpriteMulticolor,
}

impl Mode {
    /// Canonical mode name, as written to reports and manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::BitmapHires => "bitmap_hires",
            Mode::BitmapMulticolor => "bitmap_multicolor",
            Mode::SpriteHires => "sprite_hires",
            Mode::SpriteMulticolor => "sprite_multicolor",
        }
    }

    /// Pixel dimensions the source must be resized to.
    pub fn image_size(&self) -> (u32, u32) {
        match self {
            Mode::BitmapHires => (320, 200),
            Mode::BitmapMulticolor => (160, 200),
            Mode::SpriteHires => (24, 21),
            Mode::SpriteMulticolor => (12, 21),
        }
    }

    /// Size of one encoding unit in source pixels.
    pub fn unit_size(&self) -> (u32, u32) {
        match self {
            Mode::BitmapHires => (8, 8),
            Mode::BitmapMulticolor => (4, 8),
            Mode::SpriteHires | Mode::SpriteMulticolor => self.image_size(),
        }
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, Mode::BitmapHires | Mode::BitmapMulticolor)
    }

    pub fn is_multicolor(&self) -> bool {
        matches!(self, Mode::BitmapMulticolor | Mode::SpriteMulticolor)
    }

    /// Bits used per pixel code.
    pub fn bits_per_pixel(&self) -> u32 {
        if self.is_multicolor() {
            2
        } else {
            1
        }
    }
}

impl FromStr for Mode {
    type Err = ConvertError;

    /// Accepts bitmap mode names and sprite mode names with or without the
    /// `sprite_` prefix.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bitmap_hires" => Ok(Mode::BitmapHires),
            "bitmap_multicolor" => Ok(Mode::BitmapMulticolor),
            "hires" | "sprite_hires" => Ok(Mode::SpriteHires),
            "multicolor" | "sprite_multicolor" => Ok(Mode::SpriteMulticolor),
            other => Err(ConvertError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Colors chosen for one encoding unit.
///
/// Serializes as a plain list: `[color0, color1]` for hires units and
/// `[color1, color2, color3]` for multicolor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellColors {
    /// `(color0, color1)`: bit 0 shows color0, bit 1 shows color1
    Hires(PaletteIndex, PaletteIndex),
    /// `(color1, color2, color3)`: codes 1-3; code 0 is the shared background
    Multicolor(PaletteIndex, PaletteIndex, PaletteIndex),
}

impl CellColors {
    /// Screen-RAM byte for a bitmap cell.
    pub fn screen_byte(&self) -> u8 {
        match *self {
            CellColors::Hires(color0, color1) => (color1 << 4) | color0,
            CellColors::Multicolor(color1, color2, _) => (color2 << 4) | color1,
        }
    }

    /// Color-RAM byte for a bitmap cell. Hires cells leave color RAM unused.
    pub fn color_ram_byte(&self) -> u8 {
        match *self {
            CellColors::Hires(..) => 0,
            CellColors::Multicolor(_, _, color3) => color3 & 0x0F,
        }
    }
}

/// Budget arbitration and pixel coding for one family of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Two colors per unit, no background distinction.
    Hires,
    /// Three free colors per unit plus one background shared by every unit.
    Multicolor { background: PaletteIndex },
}

impl ColorScheme {
    /// Maximum number of distinct colors a unit may express.
    pub fn budget(&self) -> usize {
        match self {
            ColorScheme::Hires => 2,
            ColorScheme::Multicolor { .. } => 4,
        }
    }

    pub fn background(&self) -> Option<PaletteIndex> {
        match *self {
            ColorScheme::Hires => None,
            ColorScheme::Multicolor { background } => Some(background),
        }
    }

    /// Pick the unit's colors from a frequency ranking.
    ///
    /// Returns the selection and whether the ranking exceeded the budget.
    pub fn select(&self, ranked: &[PaletteIndex]) -> (CellColors, bool) {
        match *self {
            ColorScheme::Hires => {
                let color0 = ranked.first().copied().unwrap_or(0);
                let color1 = ranked.get(1).copied().unwrap_or(color0);
                (CellColors::Hires(color0, color1), ranked.len() > self.budget())
            }
            ColorScheme::Multicolor { background } => {
                let extra: Vec<PaletteIndex> =
                    ranked.iter().copied().filter(|&c| c != background).collect();
                let pick = |i: usize| extra.get(i).copied().unwrap_or(background);
                let over = extra.len() > self.budget() - 1;
                (CellColors::Multicolor(pick(0), pick(1), pick(2)), over)
            }
        }
    }

    /// Code written for `pixel` given the unit's selected colors.
    ///
    /// Multicolor pixels matching none of the selected colors (possible only
    /// after degradation) fall back to code 0. `colors` must come from this
    /// scheme's [`select`](Self::select).
    #[inline]
    pub fn code(&self, colors: &CellColors, pixel: PaletteIndex) -> u8 {
        debug_assert_eq!(
            matches!(self, ColorScheme::Hires),
            matches!(colors, CellColors::Hires(..)),
            "{:?} cannot code {:?}",
            self,
            colors
        );
        match *colors {
            CellColors::Hires(_, color1) => u8::from(pixel == color1),
            CellColors::Multicolor(c1, c2, c3) => match pixel {
                p if Some(p) == self.background() => 0,
                p if p == c1 => 1,
                p if p == c2 => 2,
                p if p == c3 => 3,
                _ => 0,
            },
        }
    }
}

/// A unit whose source pixels use more colors than its budget allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    /// Cell column (bitmap modes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_x: Option<u32>,
    /// Cell row (bitmap modes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_y: Option<u32>,
    /// Every color present, frequency-ranked
    pub colors: Vec<PaletteIndex>,
    /// Shared background (multicolor modes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<PaletteIndex>,
}

impl ConflictRecord {
    /// `cell (x,y)` for bitmap cells, `sprite` otherwise.
    pub fn unit_label(&self) -> String {
        match (self.cell_x, self.cell_y) {
            (Some(x), Some(y)) => format!("cell ({},{})", x, y),
            _ => "sprite".to_string(),
        }
    }
}

/// Packed output planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Planes {
    /// Bitmap modes: 8000-byte bitmap, 1000-byte screen RAM, 1000-byte color RAM
    Bitmap { bitmap: Vec<u8>, screen: Vec<u8>, color: Vec<u8> },
    /// Sprite modes: one 64-byte sprite
    Sprite { data: Vec<u8> },
}

/// Output of one encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBundle {
    pub mode: Mode,
    pub planes: Planes,
    pub conflicts: Vec<ConflictRecord>,
    /// Units whose colors had to be degraded
    pub fixed_units: usize,
    /// Chosen colors per cell (row-major) or the single sprite assignment
    pub assignments: Vec<CellColors>,
    /// Shared background for multicolor modes
    pub background_color: Option<PaletteIndex>,
}

impl EncodedBundle {
    /// Bitmap planes `(bitmap, screen, color)`, if this is a bitmap bundle.
    pub fn bitmap_planes(&self) -> Option<(&[u8], &[u8], &[u8])> {
        match &self.planes {
            Planes::Bitmap { bitmap, screen, color } => Some((bitmap, screen, color)),
            Planes::Sprite { .. } => None,
        }
    }

    /// Packed sprite bytes, if this is a sprite bundle.
    pub fn sprite_data(&self) -> Option<&[u8]> {
        match &self.planes {
            Planes::Sprite { data } => Some(data),
            Planes::Bitmap { .. } => None,
        }
    }
}

/// Reject grids that were not resized to the mode's mandated dimensions.
pub(crate) fn check_dimensions(grid: &PixelGrid, mode: Mode) -> Result<()> {
    let expected = mode.image_size();
    if grid.dimensions() != expected {
        return Err(ConvertError::DimensionMismatch {
            mode: mode.to_string(),
            expected,
            actual: grid.dimensions(),
        });
    }
    Ok(())
}

/// Validate a caller-supplied background index.
pub(crate) fn check_background(background: PaletteIndex) -> Result<PaletteIndex> {
    if background as usize >= PALETTE_SIZE {
        return Err(ConvertError::InvalidPaletteIndex(background));
    }
    Ok(background)
}

/// Rank a unit's colors, select within budget and record any conflict.
///
/// In strict mode an over-budget unit aborts the encode.
pub(crate) fn arbitrate(
    scheme: ColorScheme,
    counts: &ColorCounts,
    cell: Option<(u32, u32)>,
    strict: bool,
) -> Result<(CellColors, Option<ConflictRecord>)> {
    let ranked = rank_colors(counts);
    let (colors, over_budget) = scheme.select(&ranked);
    if !over_budget {
        return Ok((colors, None));
    }

    let record = ConflictRecord {
        cell_x: cell.map(|c| c.0),
        cell_y: cell.map(|c| c.1),
        colors: ranked,
        background_color: scheme.background(),
    };
    if strict {
        return Err(ConvertError::ColorBudgetExceeded {
            unit: record.unit_label(),
            colors: record.colors,
        });
    }
    Ok((colors, Some(record)))
}

/// Shift `codes` into one byte, first code in the most significant bits.
#[inline]
pub(crate) fn pack_codes(codes: impl IntoIterator<Item = u8>, bits_per_pixel: u32) -> u8 {
    codes.into_iter().fold(0u8, |acc, code| (acc << bits_per_pixel) | code)
}
