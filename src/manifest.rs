//! Manifests describing where encoded buffers belong in C64 memory.
//!
//! A manifest is built once per conversion and never modified afterwards:
//! its fields are private and exposed through accessors and serialization.
//!
//! # Bitmap manifest format
//!
//! ```json
//! {
//!   "mode": "bitmap_multicolor",
//!   "addresses": { "bitmap": 8192, "screen": 1024, "color": 55296, "sprites": 12288 },
//!   "output_files": { "bitmap": "bitmap.bin", "screen": "screen.bin", ... },
//!   "palette": { "used_indexes": [0, 1], "entries": [...], "background_color": 0,
//!                "border_color": null, "color_ram_nibble": "low" },
//!   "vic_registers": { "d011": "$3B", "d016": "$18", "d018": "$12" },
//!   "notes": "color.bin uses low nibble for color RAM values."
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encode::{ConflictRecord, Mode};
use crate::error::{ConvertError, Result};
use crate::palette::{entries_for, PaletteEntry, PaletteIndex};

/// Note attached to every bitmap manifest.
pub const BITMAP_NOTES: &str = "color.bin uses low nibble for color RAM values.";

/// Bytes per sprite block; sprite pointers count in these units.
const SPRITE_BLOCK: u32 = 64;

/// Target memory addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addresses {
    #[serde(default = "default_bitmap", deserialize_with = "deserialize_address")]
    pub bitmap: u16,
    #[serde(default = "default_screen", deserialize_with = "deserialize_address")]
    pub screen: u16,
    #[serde(default = "default_color", deserialize_with = "deserialize_address")]
    pub color: u16,
    #[serde(default = "default_sprites", deserialize_with = "deserialize_address")]
    pub sprites: u16,
}

fn default_bitmap() -> u16 {
    0x2000
}

fn default_screen() -> u16 {
    0x0400
}

fn default_color() -> u16 {
    0xD800
}

fn default_sprites() -> u16 {
    0x3000
}

impl Default for Addresses {
    fn default() -> Self {
        Self {
            bitmap: default_bitmap(),
            screen: default_screen(),
            color: default_color(),
            sprites: default_sprites(),
        }
    }
}

/// Parse an address written as decimal, `0x` hex, `$` hex or `0o`/`0b`.
pub fn parse_address(s: &str) -> Result<u16> {
    let t = s.trim();
    let parsed = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = t.strip_prefix('$') {
        u32::from_str_radix(hex, 16)
    } else if let Some(oct) = t.strip_prefix("0o") {
        u32::from_str_radix(oct, 8)
    } else if let Some(bin) = t.strip_prefix("0b") {
        u32::from_str_radix(bin, 2)
    } else {
        t.parse::<u32>()
    };
    parsed
        .ok()
        .and_then(|v| u16::try_from(v).ok())
        .ok_or_else(|| ConvertError::InvalidAddress(s.to_string()))
}

/// Accepts either a number or a string understood by [`parse_address`].
fn deserialize_address<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => u16::try_from(v)
            .map_err(|_| serde::de::Error::custom(format!("address {} out of range", v))),
        Raw::Str(s) => parse_address(&s).map_err(serde::de::Error::custom),
    }
}

/// VIC-II register values implied by a mode and memory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VicRegisters {
    /// Control register 1: bitmap mode, display enable, 25 rows
    #[serde(serialize_with = "serialize_register")]
    pub d011: u8,
    /// Control register 2: 40 columns, multicolor bit
    #[serde(serialize_with = "serialize_register")]
    pub d016: u8,
    /// Memory setup: screen and bitmap base
    #[serde(serialize_with = "serialize_register")]
    pub d018: u8,
}

fn serialize_register<S>(value: &u8, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("${:02X}", value))
}

/// Register values for displaying a bitmap at `addresses`.
///
/// D018 packs the screen base (1K units) into bits 4-7 and the bitmap base
/// (8K units) into bits 1-3. D011 adds BMM to the default `$1B`; D016 adds
/// MCM for multicolor.
pub fn vic_registers(mode: Mode, addresses: &Addresses) -> VicRegisters {
    let screen_base = ((addresses.screen / 0x0400) & 0x0F) as u8;
    let bitmap_base = ((addresses.bitmap / 0x2000) & 0x07) as u8;
    let d018 = (screen_base << 4) | (bitmap_base << 1);
    let d011 = 0x1B | 0x20;
    let d016 = if mode == Mode::BitmapMulticolor { 0x18 } else { 0x08 };
    VicRegisters { d011, d016, d018 }
}

/// Sprite pointer values for `count` sprites stored consecutively from `base`.
///
/// Pointers address 64-byte blocks within the current 16K VIC bank.
pub fn sprite_pointers(base: u16, count: usize) -> Vec<u8> {
    (0..count as u32)
        .map(|i| (((base as u32 + i * SPRITE_BLOCK) & 0x3FFF) / SPRITE_BLOCK) as u8)
        .collect()
}

/// Output file names of a bitmap conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitmapFiles {
    pub bitmap: String,
    pub screen: String,
    pub color: String,
    pub report_json: String,
    pub report_txt: String,
}

impl Default for BitmapFiles {
    fn default() -> Self {
        Self {
            bitmap: "bitmap.bin".to_string(),
            screen: "screen.bin".to_string(),
            color: "color.bin".to_string(),
            report_json: "report.json".to_string(),
            report_txt: "report.txt".to_string(),
        }
    }
}

/// Palette section of a bitmap manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteSummary {
    pub used_indexes: Vec<PaletteIndex>,
    pub entries: Vec<PaletteEntry>,
    pub background_color: PaletteIndex,
    pub border_color: Option<PaletteIndex>,
    pub color_ram_nibble: &'static str,
}

/// Manifest for a bitmap conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    mode: Mode,
    addresses: Addresses,
    output_files: BitmapFiles,
    palette: PaletteSummary,
    vic_registers: VicRegisters,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl Manifest {
    pub fn new(
        mode: Mode,
        addresses: Addresses,
        palette_used: Vec<PaletteIndex>,
        background_color: PaletteIndex,
        border_color: Option<PaletteIndex>,
    ) -> Self {
        Self {
            mode,
            addresses,
            output_files: BitmapFiles::default(),
            palette: PaletteSummary {
                entries: entries_for(&palette_used),
                used_indexes: palette_used,
                background_color,
                border_color,
                color_ram_nibble: "low",
            },
            vic_registers: vic_registers(mode, &addresses),
            notes: Some(BITMAP_NOTES.to_string()),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn addresses(&self) -> &Addresses {
        &self.addresses
    }

    pub fn output_files(&self) -> &BitmapFiles {
        &self.output_files
    }

    pub fn palette(&self) -> &PaletteSummary {
        &self.palette
    }

    pub fn vic_registers(&self) -> &VicRegisters {
        &self.vic_registers
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Conflicts of one sprite, as listed in the sprite manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteConflicts {
    pub index: usize,
    pub conflicts: Vec<ConflictRecord>,
}

/// Manifest for a sprite conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteManifest {
    mode: Mode,
    sprite_base: u16,
    output_files: Vec<String>,
    sprite_positions: String,
    sprite_pointers: Vec<u8>,
    conflicts: Vec<SpriteConflicts>,
}

/// Name of the per-sprite metadata file.
pub const SPRITE_POSITIONS_FILE: &str = "sprite_positions.json";

/// File name of sprite number `index`.
pub fn sprite_file_name(index: usize) -> String {
    format!("sprite_{:03}.bin", index)
}

impl SpriteManifest {
    pub fn new(
        mode: Mode,
        sprite_base: u16,
        count: usize,
        conflicts: Vec<SpriteConflicts>,
    ) -> Self {
        Self {
            mode,
            sprite_base,
            output_files: (0..count).map(sprite_file_name).collect(),
            sprite_positions: SPRITE_POSITIONS_FILE.to_string(),
            sprite_pointers: sprite_pointers(sprite_base, count),
            conflicts,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sprite_base(&self) -> u16 {
        self.sprite_base
    }

    pub fn output_files(&self) -> &[String] {
        &self.output_files
    }

    pub fn sprite_positions(&self) -> &str {
        &self.sprite_positions
    }

    pub fn sprite_pointers(&self) -> &[u8] {
        &self.sprite_pointers
    }

    pub fn conflicts(&self) -> &[SpriteConflicts] {
        &self.conflicts
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registers() {
        let regs = vic_registers(Mode::BitmapHires, &Addresses::default());
        assert_eq!(regs.d011, 0x3B);
        assert_eq!(regs.d016, 0x08);
        // screen $0400 -> 1, bitmap $2000 -> 1
        assert_eq!(regs.d018, 0x12);
    }

    #[test]
    fn test_multicolor_sets_mcm() {
        let regs = vic_registers(Mode::BitmapMulticolor, &Addresses::default());
        assert_eq!(regs.d016, 0x18);
    }

    #[test]
    fn test_register_fields_follow_addresses() {
        let addresses = Addresses { bitmap: 0x6000, screen: 0x5C00, ..Addresses::default() };
        let regs = vic_registers(Mode::BitmapHires, &addresses);
        // screen $5C00 / $400 = 23 -> 7 after masking; bitmap $6000 / $2000 = 3
        assert_eq!(regs.d018, (7 << 4) | (3 << 1));
    }

    #[test]
    fn test_registers_serialize_as_hex_strings() {
        let regs = VicRegisters { d011: 0x3B, d016: 0x08, d018: 0x1A };
        let json = serde_json::to_value(regs).unwrap();
        assert_eq!(json, serde_json::json!({"d011": "$3B", "d016": "$08", "d018": "$1A"}));
    }

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(parse_address("0x2000").unwrap(), 0x2000);
        assert_eq!(parse_address("$D800").unwrap(), 0xD800);
        assert_eq!(parse_address("1024").unwrap(), 0x0400);
        assert_eq!(parse_address("0b100").unwrap(), 4);
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("banana").is_err());
    }

    #[test]
    fn test_addresses_deserialize_mixed() {
        let addresses: Addresses =
            serde_json::from_str(r#"{"bitmap": "0x4000", "screen": 2048}"#).unwrap();
        assert_eq!(addresses.bitmap, 0x4000);
        assert_eq!(addresses.screen, 0x0800);
        assert_eq!(addresses.color, 0xD800);
        assert_eq!(addresses.sprites, 0x3000);
    }

    #[test]
    fn test_sprite_pointers() {
        assert_eq!(sprite_pointers(0x3000, 3), vec![0xC0, 0xC1, 0xC2]);
        // Bank-relative: $7000 in bank 1 is the same block as $3000
        assert_eq!(sprite_pointers(0x7000, 1), vec![0xC0]);
    }

    #[test]
    fn test_bitmap_manifest_json() {
        let manifest =
            Manifest::new(Mode::BitmapMulticolor, Addresses::default(), vec![0, 6], 6, None);
        let json: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(json["mode"], "bitmap_multicolor");
        assert_eq!(json["addresses"]["bitmap"], 0x2000);
        assert_eq!(json["output_files"]["report_txt"], "report.txt");
        assert_eq!(json["palette"]["used_indexes"], serde_json::json!([0, 6]));
        assert_eq!(json["palette"]["entries"][1]["name"], "blue");
        assert_eq!(json["palette"]["border_color"], serde_json::Value::Null);
        assert_eq!(json["palette"]["color_ram_nibble"], "low");
        assert_eq!(json["vic_registers"]["d016"], "$18");
        assert_eq!(json["notes"], BITMAP_NOTES);
    }

    #[test]
    fn test_sprite_manifest() {
        let manifest = SpriteManifest::new(Mode::SpriteHires, 0x3000, 2, Vec::new());
        assert_eq!(manifest.output_files(), &["sprite_000.bin", "sprite_001.bin"]);
        assert_eq!(manifest.sprite_pointers(), &[0xC0, 0xC1]);
        let json: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(json["mode"], "sprite_hires");
        assert_eq!(json["sprite_positions"], SPRITE_POSITIONS_FILE);
    }
}
