//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod analyze;
mod batch;
mod convert;
mod palette;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glob::glob;

use crate::config::{load_config_with_overrides, C64gfxConfig, CliOverrides, ConfigError};
use crate::encode::Mode;
use crate::error::ConvertError;
use crate::manifest::parse_address;
use crate::palette::{index_by_name, PaletteIndex, PALETTE_SIZE};

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Image extensions accepted as conversion input.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Check if a path has an accepted image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Find all input images directly inside a directory, sorted by path.
pub fn find_image_files(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!("{}/*", glob::Pattern::escape(&dir.display().to_string()));
    let mut files: Vec<PathBuf> = match glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).filter(|p| is_image_file(p)).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse().map_err(|e: ConvertError| e.to_string())
}

fn parse_addr(s: &str) -> Result<u16, String> {
    parse_address(s).map_err(|e| e.to_string())
}

/// Accepts a palette index (`0`-`15`) or a color name (`light_blue`).
fn parse_color(s: &str) -> Result<PaletteIndex, String> {
    if let Ok(index) = s.parse::<u8>() {
        if (index as usize) < PALETTE_SIZE {
            return Ok(index);
        }
        return Err(format!("palette index {} out of range (0-15)", index));
    }
    index_by_name(s).ok_or_else(|| format!("unknown color '{}'", s))
}

/// c64gfx - Convert images into VIC-II bitmap and sprite asset bundles
#[derive(Parser)]
#[command(name = "c64gfx")]
#[command(about = "c64gfx - Convert images into C64 bitmap and sprite data with VIC-II metadata")]
#[command(version)]
pub struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of searching for c64gfx.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by the converting commands
#[derive(Args, Debug, Clone, Default)]
pub struct ConversionArgs {
    /// Floyd-Steinberg dither while mapping to the palette
    #[arg(long)]
    pub dither: bool,

    /// Fail on color conflicts instead of degrading
    #[arg(long)]
    pub strict: bool,

    /// Also write an ACME-style assembler include
    #[arg(long)]
    pub emit_asm: bool,

    /// Background color (index 0-15 or name)
    #[arg(long, value_parser = parse_color)]
    pub background: Option<PaletteIndex>,

    /// Border color recorded in the manifest (index 0-15 or name)
    #[arg(long, value_parser = parse_color)]
    pub border: Option<PaletteIndex>,

    /// Bitmap address (e.g. 0x2000, $2000, 8192)
    #[arg(long, value_parser = parse_addr)]
    pub bitmap_addr: Option<u16>,

    /// Screen RAM address
    #[arg(long, value_parser = parse_addr)]
    pub screen_addr: Option<u16>,

    /// Color RAM address
    #[arg(long, value_parser = parse_addr)]
    pub color_addr: Option<u16>,

    /// Address of the first sprite block
    #[arg(long, value_parser = parse_addr)]
    pub sprite_addr: Option<u16>,
}

impl ConversionArgs {
    /// Config overrides for the flags that were actually given.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dither: self.dither.then_some(true),
            strict: self.strict.then_some(true),
            emit_asm: self.emit_asm.then_some(true),
            background_color: self.background,
            border_color: self.border,
            bitmap_addr: self.bitmap_addr,
            screen_addr: self.screen_addr,
            color_addr: self.color_addr,
            sprite_addr: self.sprite_addr,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert an image into a full-screen bitmap bundle
    ConvertBitmap {
        /// Input image (PNG, JPEG or BMP)
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// bitmap_hires or bitmap_multicolor
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Also write preview.png rendered with the palette
        #[arg(long)]
        preview: bool,

        #[command(flatten)]
        args: ConversionArgs,
    },

    /// Convert an image into one or more sprites
    ConvertSprites {
        /// Input image (PNG, JPEG or BMP)
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// hires or multicolor
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// JSON file with a list of {"x", "y", "w", "h"} regions
        #[arg(long)]
        regions: Option<PathBuf>,

        #[command(flatten)]
        args: ConversionArgs,
    },

    /// Report color conflicts without writing any output
    Analyze {
        /// Input image (PNG, JPEG or BMP)
        input: PathBuf,

        /// bitmap_hires or bitmap_multicolor
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Only report conflicts, not the palette in use
        #[arg(long)]
        constraints_only: bool,

        /// Background color (index 0-15 or name)
        #[arg(long, value_parser = parse_color)]
        background: Option<PaletteIndex>,

        /// Floyd-Steinberg dither while mapping to the palette
        #[arg(long)]
        dither: bool,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the 16 VIC-II palette colors
    Palette {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert every image in a directory into bitmap bundles, in parallel
    Batch {
        /// Directory containing input images
        input_dir: PathBuf,

        /// Output directory; each image gets a subdirectory named after it
        #[arg(short, long)]
        output: PathBuf,

        /// bitmap_hires or bitmap_multicolor
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        #[command(flatten)]
        args: ConversionArgs,
    },
}

/// Load config (explicit path or discovered), apply overrides and validate.
///
/// Errors are printed; the returned code is the one to exit with.
pub(crate) fn resolve_config(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<C64gfxConfig, ExitCode> {
    match load_config_with_overrides(path, overrides) {
        Ok(config) => Ok(config),
        Err(ConfigError::Validation(errors)) => {
            for error in errors {
                eprintln!("Error: {}", error);
            }
            Err(ExitCode::from(EXIT_INVALID_ARGS))
        }
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Exit code for a failed conversion.
pub(crate) fn exit_code_for(error: &ConvertError) -> ExitCode {
    match error {
        ConvertError::UnsupportedMode(_) | ConvertError::InvalidAddress(_) => {
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        _ => ExitCode::from(EXIT_ERROR),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .try_init();
}

/// Entry point for the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::ConvertBitmap { input, output, mode, preview, args } => {
            convert::run_convert_bitmap(&input, &output, mode, preview, &args, config_path)
        }
        Commands::ConvertSprites { input, output, mode, regions, args } => {
            convert::run_convert_sprites(
                &input,
                &output,
                mode,
                regions.as_deref(),
                &args,
                config_path,
            )
        }
        Commands::Analyze { input, mode, constraints_only, background, dither, json } => {
            analyze::run_analyze(
                &input,
                mode,
                constraints_only,
                background,
                dither,
                json,
                config_path,
            )
        }
        Commands::Palette { json } => palette::run_palette(json),
        Commands::Batch { input_dir, output, mode, args } => {
            batch::run_batch(&input_dir, &output, mode, &args, config_path)
        }
    }
}
