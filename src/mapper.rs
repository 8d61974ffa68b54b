//! Mapping true-color images onto the VIC-II palette.
//!
//! Two strategies are offered:
//! - nearest color (squared RGB distance, lowest index wins ties)
//! - Floyd-Steinberg error diffusion against the same table

use image::{Rgb, RgbImage};

use crate::grid::PixelGrid;
use crate::palette::{nearest_color_index, nearest_to, PaletteIndex, VIC_II_PALETTE};

/// Map an RGB image to palette indices.
pub fn map_image(image: &RgbImage, dither: bool) -> PixelGrid {
    let (width, height) = image.dimensions();
    let pixels = if dither {
        floyd_steinberg(image)
    } else {
        image.pixels().map(|p| nearest_color_index((p[0], p[1], p[2]))).collect()
    };
    log::debug!("mapped {}x{} image (dither: {})", width, height, dither);
    PixelGrid::from_mapped(width, height, pixels)
}

/// Raster-order Floyd-Steinberg diffusion.
///
/// Kernel: right 7/16, below-left 3/16, below 5/16, below-right 1/16. The
/// working color is clamped to `0..=255` before each lookup so accumulated
/// error never drives a channel out of gamut.
fn floyd_steinberg(image: &RgbImage) -> Vec<PaletteIndex> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    // Accumulated error per pixel, in 1/16 units.
    let mut error = vec![[0i32; 3]; w * h];
    let mut indices = Vec::with_capacity(w * h);

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let src = image.get_pixel(x as u32, y as u32);
            let mut want = [0i32; 3];
            for c in 0..3 {
                want[c] = (src[c] as i32 + div_round(error[idx][c], 16)).clamp(0, 255);
            }

            let chosen = nearest_to(want[0], want[1], want[2]);
            indices.push(chosen);

            let (pr, pg, pb) = VIC_II_PALETTE[chosen as usize].rgb;
            let err = [want[0] - pr as i32, want[1] - pg as i32, want[2] - pb as i32];

            let mut diffuse = |ti: usize, weight: i32| {
                for c in 0..3 {
                    error[ti][c] += err[c] * weight;
                }
            };
            if x + 1 < w {
                diffuse(idx + 1, 7);
            }
            if y + 1 < h {
                if x > 0 {
                    diffuse(idx + w - 1, 3);
                }
                diffuse(idx + w, 5);
                if x + 1 < w {
                    diffuse(idx + w + 1, 1);
                }
            }
        }
    }

    indices
}

/// Integer division rounding half away from zero.
fn div_round(value: i32, divisor: i32) -> i32 {
    if value >= 0 {
        (value + divisor / 2) / divisor
    } else {
        -((-value + divisor / 2) / divisor)
    }
}

/// Render a grid back to RGB using the palette colors.
pub fn grid_to_image(grid: &PixelGrid) -> RgbImage {
    RgbImage::from_fn(grid.width(), grid.height(), |x, y| {
        let (r, g, b) = VIC_II_PALETTE[grid.get(x, y) as usize].rgb;
        Rgb([r, g, b])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(rgb))
    }

    #[test]
    fn test_map_nearest_solid() {
        let grid = map_image(&solid(4, 3, [250, 250, 250]), false);
        assert_eq!(grid.dimensions(), (4, 3));
        assert!(grid.pixels().iter().all(|&p| p == 1));
    }

    #[test]
    fn test_map_exact_palette_colors_unchanged_by_dither() {
        let mut img = RgbImage::new(16, 1);
        for entry in &VIC_II_PALETTE {
            let (r, g, b) = entry.rgb;
            img.put_pixel(entry.index as u32, 0, Rgb([r, g, b]));
        }
        let plain = map_image(&img, false);
        let dithered = map_image(&img, true);
        let expected: Vec<u8> = (0..16).collect();
        assert_eq!(plain.pixels(), expected.as_slice());
        assert_eq!(dithered.pixels(), expected.as_slice());
    }

    #[test]
    fn test_dither_mixes_colors_for_midtone() {
        // 160 sits between gray (119) and light gray (187); dithering mixes both.
        let img = solid(16, 16, [160, 160, 160]);
        let plain = map_image(&img, false);
        let dithered = map_image(&img, true);
        assert_eq!(plain.palette_used().len(), 1);
        assert!(dithered.palette_used().len() > 1);
        assert!(dithered.pixels().iter().all(|&p| p < 16));
    }

    #[test]
    fn test_dither_stays_in_range_on_extremes() {
        let mut img = RgbImage::new(8, 8);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = if (x + y) % 2 == 0 { Rgb([255, 0, 255]) } else { Rgb([0, 255, 0]) };
        }
        let grid = map_image(&img, true);
        assert!(grid.pixels().iter().all(|&p| p < 16));
    }

    #[test]
    fn test_grid_to_image_round_trip() {
        let grid = PixelGrid::new(2, 1, vec![2, 14]).unwrap();
        let img = grid_to_image(&grid);
        assert_eq!(img.get_pixel(0, 0), &Rgb([136, 0, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([0, 136, 255]));
        assert_eq!(map_image(&img, false), grid);
    }

    #[test]
    fn test_div_round() {
        assert_eq!(div_round(8, 16), 1);
        assert_eq!(div_round(7, 16), 0);
        assert_eq!(div_round(-8, 16), -1);
        assert_eq!(div_round(-7, 16), 0);
    }
}
