//! Batch command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rayon::prelude::*;
use serde::Serialize;

use crate::convert::{convert_bitmap, load_image, BitmapOptions};
use crate::emit::write_bitmap_bundle;
use crate::encode::Mode;

use super::{find_image_files, resolve_config, ConversionArgs, EXIT_ERROR, EXIT_SUCCESS};

/// Outcome of converting one image in a batch.
#[derive(Debug, Serialize)]
struct BatchEntry {
    input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed_cells: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn convert_one(
    input: &Path,
    out_root: &Path,
    options: &BitmapOptions,
    emit_asm: bool,
) -> BatchEntry {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let out_dir = out_root.join(stem);

    let result = load_image(input)
        .and_then(|image| convert_bitmap(&image, options))
        .map_err(|e| e.to_string())
        .and_then(|conversion| {
            write_bitmap_bundle(&out_dir, &conversion, emit_asm)
                .map(|_| conversion.report.fixed_cells)
                .map_err(|e| e.to_string())
        });

    match result {
        Ok(fixed_cells) => BatchEntry {
            input: input.to_path_buf(),
            output: Some(out_dir),
            fixed_cells: Some(fixed_cells),
            error: None,
        },
        Err(e) => {
            log::warn!("{}: {}", input.display(), e);
            BatchEntry {
                input: input.to_path_buf(),
                output: None,
                fixed_cells: None,
                error: Some(e),
            }
        }
    }
}

/// Execute the batch command
pub fn run_batch(
    input_dir: &Path,
    output: &Path,
    mode: Option<Mode>,
    args: &ConversionArgs,
    config_path: Option<&Path>,
) -> ExitCode {
    let mut overrides = args.overrides();
    overrides.bitmap_mode = mode;
    let config = match resolve_config(config_path, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    if !input_dir.is_dir() {
        eprintln!("Error: '{}' is not a directory", input_dir.display());
        return ExitCode::from(EXIT_ERROR);
    }
    let files = find_image_files(input_dir);
    if files.is_empty() {
        eprintln!("Error: No PNG, JPEG or BMP files found in '{}'", input_dir.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let options = config.bitmap_options();
    let emit_asm = config.defaults.emit_asm;
    let entries: Vec<BatchEntry> =
        files.par_iter().map(|input| convert_one(input, output, &options, emit_asm)).collect();

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    match serde_json::to_string_pretty(&entries) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if failed > 0 {
        eprintln!("Error: {} of {} images failed", failed, entries.len());
        return ExitCode::from(EXIT_ERROR);
    }
    ExitCode::from(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_convert_one_writes_subdirectory() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("title.png");
        RgbImage::from_pixel(160, 200, Rgb([0, 0, 170])).save(&input).unwrap();

        let out_root = temp.path().join("out");
        let entry = convert_one(&input, &out_root, &BitmapOptions::default(), false);
        assert!(entry.error.is_none());
        assert_eq!(entry.output, Some(out_root.join("title")));
        assert_eq!(entry.fixed_cells, Some(0));
        assert!(out_root.join("title").join("bitmap.bin").exists());
    }

    #[test]
    fn test_convert_one_records_error() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("missing.png");
        let entry = convert_one(&input, temp.path(), &BitmapOptions::default(), false);
        assert!(entry.output.is_none());
        assert!(entry.error.is_some());
    }
}
