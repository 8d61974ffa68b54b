//! Palette-indexed pixel grids and frequency ranking.

use crate::error::{ConvertError, Result};
use crate::palette::{PaletteIndex, PALETTE_SIZE};

/// Row-major grid of palette indices.
///
/// Invariants: `pixels.len() == width * height` and every entry is in `0..=15`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<PaletteIndex>,
}

/// Per-index pixel counts.
pub type ColorCounts = [u32; PALETTE_SIZE];

impl PixelGrid {
    /// Build a grid, validating its length and index range.
    pub fn new(width: u32, height: u32, pixels: Vec<PaletteIndex>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(ConvertError::InvalidGrid { width, height, len: pixels.len() });
        }
        if let Some(&bad) = pixels.iter().find(|&&p| p as usize >= PALETTE_SIZE) {
            return Err(ConvertError::InvalidPaletteIndex(bad));
        }
        Ok(Self { width, height, pixels })
    }

    /// Grid produced by the palette mapper, which only emits in-range indices.
    pub(crate) fn from_mapped(width: u32, height: u32, pixels: Vec<PaletteIndex>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        debug_assert!(pixels.iter().all(|&p| (p as usize) < PALETTE_SIZE));
        Self { width, height, pixels }
    }

    /// Grid filled with a single index.
    pub fn filled(width: u32, height: u32, index: PaletteIndex) -> Result<Self> {
        Self::new(width, height, vec![index; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[PaletteIndex] {
        &self.pixels
    }

    /// Index at `(x, y)`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> PaletteIndex {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Overwrite the index at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, index: PaletteIndex) -> Result<()> {
        if index as usize >= PALETTE_SIZE {
            return Err(ConvertError::InvalidPaletteIndex(index));
        }
        let w = self.width as usize;
        self.pixels[y as usize * w + x as usize] = index;
        Ok(())
    }

    /// Counts over the whole grid.
    pub fn counts(&self) -> ColorCounts {
        let mut counts = [0u32; PALETTE_SIZE];
        for &p in &self.pixels {
            counts[p as usize] += 1;
        }
        counts
    }

    /// Counts over the `w`x`h` block whose top-left corner is `(x0, y0)`.
    pub fn block_counts(&self, x0: u32, y0: u32, w: u32, h: u32) -> ColorCounts {
        let mut counts = [0u32; PALETTE_SIZE];
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                counts[self.get(x, y) as usize] += 1;
            }
        }
        counts
    }

    /// The most frequent index; ties go to the lowest index.
    pub fn dominant_color(&self) -> PaletteIndex {
        rank_colors(&self.counts()).first().copied().unwrap_or(0)
    }

    /// Distinct indices present, ascending.
    pub fn palette_used(&self) -> Vec<PaletteIndex> {
        self.counts()
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(i, _)| i as PaletteIndex)
            .collect()
    }
}

/// Present colors ordered by descending count, then ascending index.
///
/// The explicit `(-count, index)` key keeps the ranking bit-compatible no
/// matter how the counts were gathered.
pub fn rank_colors(counts: &ColorCounts) -> Vec<PaletteIndex> {
    let mut ranked: Vec<(u32, PaletteIndex)> = counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .map(|(i, &count)| (count, i as PaletteIndex))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.into_iter().map(|(_, index)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = PixelGrid::new(2, 2, vec![0, 0, 0]).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidGrid { len: 3, .. }));
    }

    #[test]
    fn test_new_rejects_out_of_range_index() {
        let err = PixelGrid::new(2, 1, vec![0, 16]).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidPaletteIndex(16)));
    }

    #[test]
    fn test_rank_orders_by_count_then_index() {
        let mut counts = [0u32; PALETTE_SIZE];
        counts[5] = 10;
        counts[2] = 10;
        counts[9] = 30;
        counts[1] = 1;
        assert_eq!(rank_colors(&counts), vec![9, 2, 5, 1]);
    }

    #[test]
    fn test_rank_skips_absent_colors() {
        let counts = [0u32; PALETTE_SIZE];
        assert!(rank_colors(&counts).is_empty());
    }

    #[test]
    fn test_dominant_color_tie_breaks_low() {
        let grid = PixelGrid::new(4, 1, vec![7, 3, 7, 3]).unwrap();
        assert_eq!(grid.dominant_color(), 3);
    }

    #[test]
    fn test_block_counts() {
        #[rustfmt::skip]
        let grid = PixelGrid::new(4, 2, vec![
            1, 1, 2, 2,
            1, 3, 2, 2,
        ]).unwrap();
        let left = grid.block_counts(0, 0, 2, 2);
        assert_eq!(left[1], 3);
        assert_eq!(left[3], 1);
        assert_eq!(left[2], 0);
        let right = grid.block_counts(2, 0, 2, 2);
        assert_eq!(right[2], 4);
    }

    #[test]
    fn test_palette_used_sorted() {
        let grid = PixelGrid::new(3, 1, vec![14, 0, 14]).unwrap();
        assert_eq!(grid.palette_used(), vec![0, 14]);
    }
}
