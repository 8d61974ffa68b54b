//! Configuration module for the converter
//!
//! Provides types, discovery and parsing for `c64gfx.toml`.

pub mod loader;
pub mod schema;

pub use loader::{
    find_config, find_config_from, load_config, load_config_with_overrides, merge_cli_overrides,
    CliOverrides, ConfigError, CONFIG_FILE_NAME,
};
pub use schema::*;
