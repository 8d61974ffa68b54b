//! Convert command implementations (convert-bitmap, convert-sprites)

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::convert::{convert_bitmap, convert_sprites, load_image};
use crate::emit::{write_bitmap_bundle, write_preview, write_sprite_bundle, EmittedFiles};
use crate::encode::Mode;
use crate::regions::parse_regions;

use super::{exit_code_for, resolve_config, ConversionArgs, EXIT_ERROR, EXIT_SUCCESS};

/// Print the written files as pretty JSON on stdout.
pub(crate) fn print_emitted(files: &EmittedFiles) -> ExitCode {
    match serde_json::to_string_pretty(files) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the convert-bitmap command
pub fn run_convert_bitmap(
    input: &Path,
    output: &Path,
    mode: Option<Mode>,
    preview: bool,
    args: &ConversionArgs,
    config_path: Option<&Path>,
) -> ExitCode {
    let mut overrides = args.overrides();
    overrides.bitmap_mode = mode;
    let config = match resolve_config(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let image = match load_image(input) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: Cannot open input file '{}': {}", input.display(), e);
            return exit_code_for(&e);
        }
    };

    let conversion = match convert_bitmap(&image, &config.bitmap_options()) {
        Ok(conversion) => conversion,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code_for(&e);
        }
    };

    if conversion.report.fixed_cells > 0 {
        eprintln!(
            "Warning: {} cells exceeded their color budget and were degraded",
            conversion.report.fixed_cells
        );
    }

    let written = write_bitmap_bundle(output, &conversion, config.defaults.emit_asm)
        .and_then(|mut files| {
            if preview {
                files.files.push(write_preview(output, &conversion.grid)?);
            }
            Ok(files)
        });
    match written {
        Ok(files) => print_emitted(&files),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the convert-sprites command
pub fn run_convert_sprites(
    input: &Path,
    output: &Path,
    mode: Option<Mode>,
    regions: Option<&Path>,
    args: &ConversionArgs,
    config_path: Option<&Path>,
) -> ExitCode {
    let mut overrides = args.overrides();
    overrides.sprite_mode = mode;
    let config = match resolve_config(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let mut options = config.sprite_options();
    if let Some(path) = regions {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| parse_regions(&json).map_err(|e| e.to_string()));
        match parsed {
            Ok(list) => options.regions = Some(list),
            Err(e) => {
                eprintln!("Error: Cannot read regions file '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    let image = match load_image(input) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: Cannot open input file '{}': {}", input.display(), e);
            return exit_code_for(&e);
        }
    };

    let conversion = match convert_sprites(&image, &options) {
        Ok(conversion) => conversion,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code_for(&e);
        }
    };

    match write_sprite_bundle(output, &conversion, config.defaults.emit_asm) {
        Ok(files) => print_emitted(&files),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
