//! Analyze command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::convert::{analyze, load_image};
use crate::encode::Mode;
use crate::palette::PaletteIndex;

use super::{exit_code_for, resolve_config, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the analyze command
pub fn run_analyze(
    input: &Path,
    mode: Option<Mode>,
    constraints_only: bool,
    background: Option<PaletteIndex>,
    dither: bool,
    json: bool,
    config_path: Option<&Path>,
) -> ExitCode {
    let overrides = CliOverrides {
        bitmap_mode: mode,
        background_color: background,
        dither: dither.then_some(true),
        ..Default::default()
    };
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

    let mut options = config.analyze_options();
    options.constraints_only = constraints_only;
    let analysis = match analyze(&image, &options) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code_for(&e);
        }
    };

    if !json {
        print!("{}", analysis.report_text);
        return ExitCode::from(EXIT_SUCCESS);
    }
    match analysis.report.to_json() {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
