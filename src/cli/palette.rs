//! Palette command implementation

use std::process::ExitCode;

use crate::palette::VIC_II_PALETTE;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the palette command
pub fn run_palette(json: bool) -> ExitCode {
    if json {
        return match serde_json::to_string_pretty(&VIC_II_PALETTE[..]) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    println!("VIC-II palette:");
    println!();
    for entry in &VIC_II_PALETTE {
        println!("  {:>2}  {}  {}", entry.index, entry.hex, entry.name);
    }
    ExitCode::from(EXIT_SUCCESS)
}
