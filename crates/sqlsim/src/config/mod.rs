//! Configuration module for sqlsim.
//!
//! Handles loading and managing configuration from:
//! - Default values
//! - Config file (~/.config/sqlsim/config.toml)
//! - Environment variables
//! - Command-line flags

mod schema;

pub use schema::{Config, DataConfig, DisplayConfig, EditorConfig, ExportConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Returns the config directory path.
///
/// Checks `SQLSIM_CONFIG_DIR` environment variable first, then falls back
/// to the system default (~/.config/sqlsim on Linux).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SQLSIM_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("sqlsim"))
}

/// Returns the default config file path (~/.config/sqlsim/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Returns the log file path (~/.config/sqlsim/sqlsim.log)
pub fn log_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("sqlsim.log"))
}

/// Returns the directory fetched CSV files are cached in.
pub fn csv_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("sqlsim").join("csv"))
}

/// Load configuration from the default path or return defaults
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

/// Load configuration from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.display.show_row_numbers);
        assert_eq!(config.editor.max_history_per_tab, 100);
        assert_eq!(config.data.base_url, crate::catalog::NORTHWIND_BASE);
    }

    #[test]
    #[serial]
    fn test_config_dir_env_override() {
        let previous = std::env::var_os("SQLSIM_CONFIG_DIR");
        std::env::set_var("SQLSIM_CONFIG_DIR", "/tmp/sqlsim-test-config");

        assert_eq!(
            config_dir(),
            Some(PathBuf::from("/tmp/sqlsim-test-config"))
        );
        assert_eq!(
            config_path(),
            Some(PathBuf::from("/tmp/sqlsim-test-config/config.toml"))
        );
        assert!(log_path().unwrap().ends_with("sqlsim.log"));

        match previous {
            Some(v) => std::env::set_var("SQLSIM_CONFIG_DIR", v),
            None => std::env::remove_var("SQLSIM_CONFIG_DIR"),
        }
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[display]
show_row_numbers = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.display.show_row_numbers);
        assert_eq!(config.editor.max_history_per_tab, 100);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[data]\noffline = true\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert!(config.data.offline);
    }

    #[test]
    fn test_load_config_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[data\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
