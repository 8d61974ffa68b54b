//! Configuration loading and discovery for `c64gfx.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::C64gfxConfig;
use crate::encode::Mode;
use crate::palette::PaletteIndex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file searched for.
pub const CONFIG_FILE_NAME: &str = "c64gfx.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse c64gfx.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override bitmap mode
    pub bitmap_mode: Option<Mode>,
    /// Override sprite mode
    pub sprite_mode: Option<Mode>,
    /// Override dithering
    pub dither: Option<bool>,
    /// Override strict mode
    pub strict: Option<bool>,
    /// Override assembler include emission
    pub emit_asm: Option<bool>,
    /// Override background color
    pub background_color: Option<PaletteIndex>,
    /// Override border color
    pub border_color: Option<PaletteIndex>,
    /// Override bitmap address
    pub bitmap_addr: Option<u16>,
    /// Override screen address
    pub screen_addr: Option<u16>,
    /// Override color RAM address
    pub color_addr: Option<u16>,
    /// Override sprite base address
    pub sprite_addr: Option<u16>,
}

/// Find c64gfx.toml by walking up from the current working directory.
///
/// Falls back to `XDG_CONFIG_HOME/c64gfx/c64gfx.toml` (or
/// `~/.config/c64gfx/c64gfx.toml`).
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find c64gfx.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("c64gfx").join(CONFIG_FILE_NAME);
    config_path.exists().then_some(config_path)
}

/// Find c64gfx.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a c64gfx.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// [`find_config`] to locate one. If no config file is found, returns the
/// default configuration.
///
/// # Example
/// ```ignore
/// let config = load_config(Some(Path::new("game/c64gfx.toml")))?;
/// let options = config.bitmap_options();
/// ```
pub fn load_config(path: Option<&Path>) -> Result<C64gfxConfig, ConfigError> {
    load_config_with_overrides(path, &CliOverrides::default())
}

/// Load configuration, apply CLI overrides, then validate the merged result.
///
/// A flag can replace a config file value that would not validate on its own.
pub fn load_config_with_overrides(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<C64gfxConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    let mut config = match config_path {
        Some(p) => read_config_file(&p)?,
        None => C64gfxConfig::default(),
    };
    merge_cli_overrides(&mut config, overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Parse configuration from a specific file path, without validating it.
fn read_config_file(path: &Path) -> Result<C64gfxConfig, ConfigError> {
    log::debug!("loading config from {}", path.display());
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut C64gfxConfig, overrides: &CliOverrides) {
    let defaults = &mut config.defaults;
    if let Some(mode) = overrides.bitmap_mode {
        defaults.bitmap_mode = mode;
    }
    if let Some(mode) = overrides.sprite_mode {
        defaults.sprite_mode = mode;
    }
    if let Some(dither) = overrides.dither {
        defaults.dither = dither;
    }
    if let Some(strict) = overrides.strict {
        defaults.strict = strict;
    }
    if let Some(emit_asm) = overrides.emit_asm {
        defaults.emit_asm = emit_asm;
    }
    if overrides.background_color.is_some() {
        defaults.background_color = overrides.background_color;
    }
    if overrides.border_color.is_some() {
        defaults.border_color = overrides.border_color;
    }

    let addresses = &mut config.addresses;
    if let Some(addr) = overrides.bitmap_addr {
        addresses.bitmap = addr;
    }
    if let Some(addr) = overrides.screen_addr {
        addresses.screen = addr;
    }
    if let Some(addr) = overrides.color_addr {
        addresses.color = addr;
    }
    if let Some(addr) = overrides.sprite_addr {
        addresses.sprites = addr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &[u8]) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(contents)
            .expect("should write config content");
        config_path
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"[defaults]\ndither = true\n");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"");

        let subdir = temp.path().join("gfx").join("title");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        assert_eq!(find_config_from(temp.path().to_path_buf()), None);
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(
            temp.path(),
            br#"
[addresses]
bitmap = "$6000"
screen = "0x5C00"

[defaults]
bitmap_mode = "bitmap_hires"
emit_asm = true
"#,
        );

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.addresses.bitmap, 0x6000);
        assert_eq!(config.addresses.screen, 0x5C00);
        assert_eq!(config.addresses.color, 0xD800);
        assert_eq!(config.defaults.bitmap_mode, Mode::BitmapHires);
        assert!(config.defaults.emit_asm);
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"this is not valid toml {{{");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(
            temp.path(),
            br#"
[addresses]
bitmap = "0x2001"

[defaults]
border_color = 99
"#,
        );

        match load_config(Some(&config_path)) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_override_replaces_invalid_file_value() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"[addresses]\nbitmap = \"0x2100\"\n");

        let overrides = CliOverrides { bitmap_addr: Some(0x4000), ..Default::default() };
        let config = load_config_with_overrides(Some(&config_path), &overrides)
            .expect("override should fix the bitmap address");
        assert_eq!(config.addresses.bitmap, 0x4000);

        let result = load_config_with_overrides(Some(&config_path), &CliOverrides::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_override_validated_after_merge() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), b"");

        let overrides = CliOverrides { border_color: Some(16), ..Default::default() };
        match load_config_with_overrides(Some(&config_path), &overrides) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_cli_overrides_defaults() {
        let mut config = C64gfxConfig::default();
        let overrides = CliOverrides {
            bitmap_mode: Some(Mode::BitmapHires),
            strict: Some(true),
            background_color: Some(11),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.defaults.bitmap_mode, Mode::BitmapHires);
        assert!(config.defaults.strict);
        assert_eq!(config.defaults.background_color, Some(11));
        assert!(!config.defaults.dither);
    }

    #[test]
    fn test_merge_cli_overrides_keeps_unset_values() {
        let mut config = C64gfxConfig::default();
        config.defaults.border_color = Some(14);
        config.defaults.emit_asm = true;

        merge_cli_overrides(&mut config, &CliOverrides::default());
        assert_eq!(config.defaults.border_color, Some(14));
        assert!(config.defaults.emit_asm);
    }

    #[test]
    fn test_merge_cli_overrides_addresses() {
        let mut config = C64gfxConfig::default();
        let overrides = CliOverrides {
            bitmap_addr: Some(0xE000),
            sprite_addr: Some(0x2800),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.addresses.bitmap, 0xE000);
        assert_eq!(config.addresses.screen, 0x0400);
        assert_eq!(config.addresses.sprites, 0x2800);
    }
}
