//! Configuration schema types for `c64gfx.toml`
//!
//! Defines the structure and validation rules for converter configuration.

use serde::{Deserialize, Deserializer, Serialize};

use crate::convert::{AnalyzeOptions, BitmapOptions, SpriteOptions};
use crate::encode::Mode;
use crate::manifest::Addresses;
use crate::palette::{PaletteIndex, PALETTE_SIZE};

/// Default conversion settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Mode for `convert-bitmap` and `analyze`
    #[serde(default = "default_bitmap_mode", deserialize_with = "deserialize_mode")]
    pub bitmap_mode: Mode,
    /// Mode for `convert-sprites`
    #[serde(default = "default_sprite_mode", deserialize_with = "deserialize_mode")]
    pub sprite_mode: Mode,
    /// Floyd-Steinberg dithering while mapping to the palette
    #[serde(default)]
    pub dither: bool,
    /// Fail on color conflicts instead of degrading
    #[serde(default)]
    pub strict: bool,
    /// Also write an assembler include
    #[serde(default)]
    pub emit_asm: bool,
    /// Explicit background color (palette index)
    #[serde(default)]
    pub background_color: Option<PaletteIndex>,
    /// Border color recorded in the manifest
    #[serde(default)]
    pub border_color: Option<PaletteIndex>,
}

fn default_bitmap_mode() -> Mode {
    Mode::BitmapMulticolor
}

fn default_sprite_mode() -> Mode {
    Mode::SpriteHires
}

fn deserialize_mode<'de, D>(deserializer: D) -> Result<Mode, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bitmap_mode: default_bitmap_mode(),
            sprite_mode: default_sprite_mode(),
            dither: false,
            strict: false,
            emit_asm: false,
            background_color: None,
            border_color: None,
        }
    }
}

/// Complete `c64gfx.toml` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct C64gfxConfig {
    /// Target memory layout
    #[serde(default)]
    pub addresses: Addresses,
    /// Conversion defaults
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "addresses.bitmap")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c64gfx.toml: '{}' {}", self.field, self.message)
    }
}

impl C64gfxConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigValidationError { field: field.to_string(), message });
        };

        if !self.defaults.bitmap_mode.is_bitmap() {
            let mode = self.defaults.bitmap_mode;
            push("defaults.bitmap_mode", format!("'{}' is not a bitmap mode", mode));
        }
        if self.defaults.sprite_mode.is_bitmap() {
            let mode = self.defaults.sprite_mode;
            push("defaults.sprite_mode", format!("'{}' is not a sprite mode", mode));
        }

        for (field, color) in [
            ("defaults.background_color", self.defaults.background_color),
            ("defaults.border_color", self.defaults.border_color),
        ] {
            if color.is_some_and(|c| c as usize >= PALETTE_SIZE) {
                push(field, "must be a palette index 0-15".to_string());
            }
        }

        // The VIC-II can only see the bitmap on 8K and the screen on 1K boundaries.
        let addresses = &self.addresses;
        if addresses.bitmap % 0x2000 != 0 {
            push("addresses.bitmap", "must be a multiple of $2000".to_string());
        }
        if addresses.screen % 0x0400 != 0 {
            push("addresses.screen", "must be a multiple of $0400".to_string());
        }
        if addresses.sprites % 64 != 0 {
            push("addresses.sprites", "must be a multiple of 64".to_string());
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Bitmap conversion options implied by this configuration
    pub fn bitmap_options(&self) -> BitmapOptions {
        BitmapOptions {
            mode: self.defaults.bitmap_mode,
            addresses: self.addresses,
            dither: self.defaults.dither,
            background_color: self.defaults.background_color,
            border_color: self.defaults.border_color,
            strict: self.defaults.strict,
        }
    }

    /// Sprite conversion options implied by this configuration
    pub fn sprite_options(&self) -> SpriteOptions {
        SpriteOptions {
            mode: self.defaults.sprite_mode,
            regions: None,
            background_color: self.defaults.background_color,
            dither: self.defaults.dither,
            strict: self.defaults.strict,
            sprite_base: self.addresses.sprites,
        }
    }

    /// Analysis options implied by this configuration
    pub fn analyze_options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            mode: self.defaults.bitmap_mode,
            constraints_only: false,
            background_color: self.defaults.background_color,
            dither: self.defaults.dither,
        }
    }
}
