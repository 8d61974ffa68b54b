//! Sprite encoders (hires 24x21, multicolor 12x21).
//!
//! Both variants pack into the same 64-byte block: 21 rows of 3 bytes plus
//! one padding byte.

use crate::error::Result;
use crate::grid::PixelGrid;
use crate::palette::PaletteIndex;

use super::{
    arbitrate, check_background, check_dimensions, pack_codes, CellColors, ColorScheme,
    EncodedBundle, Mode, Planes, SPRITE_BYTES,
};

/// Packed bytes per sprite row.
const ROW_BYTES: u32 = 3;

/// Encode a 24x21 grid as a hires sprite.
///
/// The most frequent color is treated as transparent (bit 0) and the
/// runner-up becomes the sprite color (bit 1).
pub fn encode_sprite_hires(grid: &PixelGrid, strict: bool) -> Result<EncodedBundle> {
    encode_sprite(grid, Mode::SpriteHires, ColorScheme::Hires, strict)
}

/// Encode a 12x21 grid as a multicolor sprite.
///
/// `background` defaults to the sprite's own most frequent color.
pub fn encode_sprite_multicolor(
    grid: &PixelGrid,
    background: Option<PaletteIndex>,
    strict: bool,
) -> Result<EncodedBundle> {
    let background = match background {
        Some(bg) => check_background(bg)?,
        None => grid.dominant_color(),
    };
    encode_sprite(grid, Mode::SpriteMulticolor, ColorScheme::Multicolor { background }, strict)
}

fn encode_sprite(
    grid: &PixelGrid,
    mode: Mode,
    scheme: ColorScheme,
    strict: bool,
) -> Result<EncodedBundle> {
    check_dimensions(grid, mode)?;

    let (colors, conflict) = arbitrate(scheme, &grid.counts(), None, strict)?;

    let bits = mode.bits_per_pixel();
    let per_byte = 8 / bits;
    let mut data = vec![0u8; SPRITE_BYTES];
    for y in 0..grid.height() {
        for b in 0..ROW_BYTES {
            let x0 = b * per_byte;
            let codes = (x0..x0 + per_byte).map(|x| scheme.code(&colors, grid.get(x, y)));
            data[(y * ROW_BYTES + b) as usize] = pack_codes(codes, bits);
        }
    }

    let conflicts: Vec<_> = conflict.into_iter().collect();
    Ok(EncodedBundle {
        mode,
        planes: Planes::Sprite { data },
        fixed_units: conflicts.len(),
        conflicts,
        assignments: vec![colors],
        background_color: scheme.background(),
    })
}

/// The sprite's own color and the colors it shares with other registers.
///
/// Hires: the sprite color is color1 and the remaining color0 is shared.
/// Multicolor: color3 is the per-sprite color; color1, color2 and the
/// background come from shared registers.
pub fn sprite_color_roles(bundle: &EncodedBundle) -> (PaletteIndex, Vec<PaletteIndex>) {
    match bundle.assignments.first() {
        Some(&CellColors::Hires(color0, color1)) => (color1, vec![color0]),
        Some(&CellColors::Multicolor(color1, color2, color3)) => {
            let background = bundle.background_color.unwrap_or(0);
            (color3, vec![color1, color2, background])
        }
        None => (0, Vec::new()),
    }
}
