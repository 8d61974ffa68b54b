//! The fixed VIC-II color table.
//!
//! Every conversion maps into these 16 entries. The table is constant data:
//! it is never loaded, configured or mutated.

use serde::Serialize;

/// A palette index in `0..=15`.
pub type PaletteIndex = u8;

/// Number of entries in the hardware palette.
pub const PALETTE_SIZE: usize = 16;

/// One entry of the hardware palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub index: PaletteIndex,
    pub name: &'static str,
    pub rgb: (u8, u8, u8),
    pub hex: &'static str,
}

const fn entry(
    index: PaletteIndex,
    name: &'static str,
    rgb: (u8, u8, u8),
    hex: &'static str,
) -> PaletteEntry {
    PaletteEntry { index, name, rgb, hex }
}

/// The 16 VIC-II colors in index order.
pub static VIC_II_PALETTE: [PaletteEntry; PALETTE_SIZE] = [
    entry(0, "black", (0, 0, 0), "#000000"),
    entry(1, "white", (255, 255, 255), "#ffffff"),
    entry(2, "red", (136, 0, 0), "#880000"),
    entry(3, "cyan", (170, 255, 238), "#aaffee"),
    entry(4, "purple", (204, 68, 204), "#cc44cc"),
    entry(5, "green", (0, 204, 85), "#00cc55"),
    entry(6, "blue", (0, 0, 170), "#0000aa"),
    entry(7, "yellow", (238, 238, 119), "#eeee77"),
    entry(8, "orange", (221, 136, 85), "#dd8855"),
    entry(9, "brown", (102, 68, 0), "#664400"),
    entry(10, "light_red", (255, 119, 119), "#ff7777"),
    entry(11, "dark_gray", (51, 51, 51), "#333333"),
    entry(12, "gray", (119, 119, 119), "#777777"),
    entry(13, "light_green", (170, 255, 102), "#aaff66"),
    entry(14, "light_blue", (0, 136, 255), "#0088ff"),
    entry(15, "light_gray", (187, 187, 187), "#bbbbbb"),
];

/// Look up a palette index by its canonical name (case-insensitive).
pub fn index_by_name(name: &str) -> Option<PaletteIndex> {
    let name = name.to_ascii_lowercase().replace('-', "_");
    VIC_II_PALETTE.iter().find(|e| e.name == name).map(|e| e.index)
}

/// Squared Euclidean distance between two RGB triples.
pub fn distance_sq(a: (i32, i32, i32), b: (u8, u8, u8)) -> i32 {
    let dr = a.0 - b.0 as i32;
    let dg = a.1 - b.1 as i32;
    let db = a.2 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

/// Nearest palette index to an RGB color.
///
/// The table is scanned in index order and only a strictly smaller distance
/// replaces the current best, so ties resolve to the lowest index.
pub fn nearest_color_index(rgb: (u8, u8, u8)) -> PaletteIndex {
    nearest_to(rgb.0 as i32, rgb.1 as i32, rgb.2 as i32)
}

/// Nearest palette index for a color whose channels may lie outside `0..=255`.
pub(crate) fn nearest_to(r: i32, g: i32, b: i32) -> PaletteIndex {
    let mut best_index = 0;
    let mut best_dist = i32::MAX;
    for entry in &VIC_II_PALETTE {
        let dist = distance_sq((r, g, b), entry.rgb);
        if dist < best_dist {
            best_dist = dist;
            best_index = entry.index;
        }
    }
    best_index
}

/// Palette entries whose index appears in `used`, in index order.
pub fn entries_for(used: &[PaletteIndex]) -> Vec<PaletteEntry> {
    VIC_II_PALETTE.iter().filter(|e| used.contains(&e.index)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_indices_match_positions() {
        for (i, entry) in VIC_II_PALETTE.iter().enumerate() {
            assert_eq!(entry.index as usize, i);
            let hex = format!("#{:02x}{:02x}{:02x}", entry.rgb.0, entry.rgb.1, entry.rgb.2);
            assert_eq!(hex, entry.hex);
        }
    }

    #[test]
    fn test_nearest_exact_colors() {
        for entry in &VIC_II_PALETTE {
            assert_eq!(nearest_color_index(entry.rgb), entry.index);
        }
    }

    #[test]
    fn test_nearest_approximate_colors() {
        assert_eq!(nearest_color_index((10, 5, 0)), 0);
        assert_eq!(nearest_color_index((250, 250, 250)), 1);
        assert_eq!(nearest_color_index((140, 10, 10)), 2);
        assert_eq!(nearest_color_index((0, 0, 180)), 6);
    }

    #[test]
    fn test_nearest_tie_breaks_to_lowest_index() {
        // gray (119) and light_gray (187) are both 34 away from 153 on every channel
        assert_eq!(nearest_color_index((153, 153, 153)), 12);
        // dark_gray (51) and gray (119) are both 34 away from 85
        assert_eq!(nearest_color_index((85, 85, 85)), 11);
    }

    #[test]
    fn test_index_by_name() {
        assert_eq!(index_by_name("black"), Some(0));
        assert_eq!(index_by_name("Light-Blue"), Some(14));
        assert_eq!(index_by_name("magenta"), None);
    }

    #[test]
    fn test_entries_for_keeps_index_order() {
        let entries = entries_for(&[14, 0, 2]);
        let indices: Vec<u8> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 2, 14]);
    }
}
