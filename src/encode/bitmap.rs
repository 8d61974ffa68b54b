//! Full-screen bitmap encoders (hires 320x200, multicolor 160x200).

use crate::error::Result;
use crate::grid::PixelGrid;
use crate::palette::PaletteIndex;

use super::{
    arbitrate, check_background, check_dimensions, pack_codes, ColorScheme, EncodedBundle, Mode,
    Planes, BITMAP_BYTES, CELLS_X, CELLS_Y, CELL_BYTES,
};

/// Encode a 320x200 grid as a hires bitmap.
///
/// Each 8x8 cell keeps its two most frequent colors: the most frequent is
/// color0 (bit 0, low screen nibble) and the runner-up color1 (bit 1, high
/// nibble). Color RAM is unused and left zeroed.
pub fn encode_bitmap_hires(grid: &PixelGrid, strict: bool) -> Result<EncodedBundle> {
    encode_bitmap(grid, Mode::BitmapHires, ColorScheme::Hires, strict)
}

/// Encode a 160x200 grid as a multicolor bitmap.
///
/// `background` defaults to the most frequent color of the whole grid. Each
/// 4x8 cell keeps its three most frequent non-background colors: color1 and
/// color2 go to screen RAM, color3 to the low nibble of color RAM.
pub fn encode_bitmap_multicolor(
    grid: &PixelGrid,
    background: Option<PaletteIndex>,
    strict: bool,
) -> Result<EncodedBundle> {
    let background = match background {
        Some(bg) => check_background(bg)?,
        None => grid.dominant_color(),
    };
    encode_bitmap(grid, Mode::BitmapMulticolor, ColorScheme::Multicolor { background }, strict)
}

fn encode_bitmap(
    grid: &PixelGrid,
    mode: Mode,
    scheme: ColorScheme,
    strict: bool,
) -> Result<EncodedBundle> {
    check_dimensions(grid, mode)?;

    let (cell_w, cell_h) = mode.unit_size();
    let bits = mode.bits_per_pixel();

    let mut bitmap = vec![0u8; BITMAP_BYTES];
    let mut screen = vec![0u8; CELL_BYTES];
    let mut color = vec![0u8; CELL_BYTES];
    let mut conflicts = Vec::new();
    let mut assignments = Vec::with_capacity(CELL_BYTES);

    for cell_y in 0..CELLS_Y {
        for cell_x in 0..CELLS_X {
            let x0 = cell_x * cell_w;
            let y0 = cell_y * cell_h;
            let counts = grid.block_counts(x0, y0, cell_w, cell_h);
            let (colors, conflict) = arbitrate(scheme, &counts, Some((cell_x, cell_y)), strict)?;
            conflicts.extend(conflict);

            let cell = (cell_y * CELLS_X + cell_x) as usize;
            screen[cell] = colors.screen_byte();
            color[cell] = colors.color_ram_byte();
            assignments.push(colors);

            for row in 0..cell_h {
                let y = y0 + row;
                let codes = (x0..x0 + cell_w).map(|x| scheme.code(&colors, grid.get(x, y)));
                bitmap[(y * CELLS_X + cell_x) as usize] = pack_codes(codes, bits);
            }
        }
    }

    let fixed_units = conflicts.len();
    if fixed_units > 0 {
        log::warn!("{}: {} cells exceed the color budget", mode, fixed_units);
    }

    Ok(EncodedBundle {
        mode,
        planes: Planes::Bitmap { bitmap, screen, color },
        conflicts,
        fixed_units,
        assignments,
        background_color: scheme.background(),
    })
}
