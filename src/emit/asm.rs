//! ACME-style assembler includes: one `NAME = $XXXX` constant per line.

use crate::manifest::{Manifest, SpriteManifest};

fn header(mode: &str) -> Vec<String> {
    vec!["; generated by c64gfx".to_string(), format!("; mode: {}", mode)]
}

fn word(name: &str, value: u16) -> String {
    format!("{} = ${:04X}", name, value)
}

fn byte(name: &str, value: u8) -> String {
    format!("{} = ${:02X}", name, value)
}

/// Address, color and register constants for a bitmap bundle.
pub fn bitmap_include(manifest: &Manifest) -> String {
    let addresses = manifest.addresses();
    let palette = manifest.palette();
    let registers = manifest.vic_registers();

    let mut lines = header(manifest.mode().as_str());
    lines.push(word("BITMAP_ADDR", addresses.bitmap));
    lines.push(word("SCREEN_ADDR", addresses.screen));
    lines.push(word("COLOR_ADDR", addresses.color));
    lines.push(byte("BACKGROUND_COLOR", palette.background_color));
    if let Some(border) = palette.border_color {
        lines.push(byte("BORDER_COLOR", border));
    }
    lines.push(byte("VIC_D011", registers.d011));
    lines.push(byte("VIC_D016", registers.d016));
    lines.push(byte("VIC_D018", registers.d018));
    lines.join("\n") + "\n"
}

/// Base address, count and per-sprite pointer constants.
pub fn sprite_include(manifest: &SpriteManifest) -> String {
    let mut lines = header(manifest.mode().as_str());
    lines.push(word("SPRITE_BASE", manifest.sprite_base()));
    lines.push(format!("SPRITE_COUNT = {}", manifest.sprite_pointers().len()));
    for (i, pointer) in manifest.sprite_pointers().iter().enumerate() {
        lines.push(byte(&format!("SPRITE_PTR_{}", i), *pointer));
    }
    lines.join("\n") + "\n"
}
