//! Splitting a source image into sprite regions.

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// A rectangular crop of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    fn fits(&self, width: u32, height: u32) -> bool {
        self.w > 0
            && self.h > 0
            && self.x.checked_add(self.w).is_some_and(|r| r <= width)
            && self.y.checked_add(self.h).is_some_and(|b| b <= height)
    }
}

/// Regions to encode for an image of `width`x`height`.
///
/// Explicit regions are used verbatim (after a bounds check). Otherwise an
/// image of exactly sprite size is one region, and an image whose sides are
/// exact multiples of the sprite size is tiled row by row.
pub fn region_list(
    width: u32,
    height: u32,
    sprite: (u32, u32),
    explicit: Option<&[Region]>,
) -> Result<Vec<Region>> {
    let (sprite_w, sprite_h) = sprite;

    if let Some(regions) = explicit.filter(|r| !r.is_empty()) {
        if let Some(bad) = regions.iter().find(|r| !r.fits(width, height)) {
            return Err(ConvertError::RegionOutOfBounds {
                x: bad.x,
                y: bad.y,
                w: bad.w,
                h: bad.h,
                image: (width, height),
            });
        }
        return Ok(regions.to_vec());
    }

    if (width, height) == sprite {
        return Ok(vec![Region::new(0, 0, sprite_w, sprite_h)]);
    }

    if width > 0 && height > 0 && width % sprite_w == 0 && height % sprite_h == 0 {
        let tiles = (0..height)
            .step_by(sprite_h as usize)
            .flat_map(|y| {
                (0..width)
                    .step_by(sprite_w as usize)
                    .map(move |x| Region::new(x, y, sprite_w, sprite_h))
            })
            .collect();
        return Ok(tiles);
    }

    Err(ConvertError::UnalignedRegionGrid { image: (width, height), sprite })
}

/// Parse a JSON list of `{"x", "y", "w", "h"}` objects.
pub fn parse_regions(json: &str) -> std::result::Result<Vec<Region>, serde_json::Error> {
    serde_json::from_str(json)
}
