//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

use crate::catalog::NORTHWIND_BASE;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Display settings
    pub display: DisplayConfig,
    /// Editor and tab settings
    pub editor: EditorConfig,
    /// Dataset loading settings
    pub data: DataConfig,
    /// CSV export settings
    pub export: ExportConfig,
}

/// Display-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show row numbers in the grid
    pub show_row_numbers: bool,
    /// Minimum column width
    pub min_column_width: u16,
    /// Maximum column width
    pub max_column_width: u16,
    /// Text shown for NULL cells
    pub null_indicator: String,
    /// Rows rendered beyond the viewport on each side
    pub overscan_rows: usize,
    /// Show the query sidebar on startup
    pub sidebar_visible: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_row_numbers: true,
            min_column_width: 4,
            max_column_width: 40,
            null_indicator: String::new(),
            overscan_rows: 10,
            sidebar_visible: true,
        }
    }
}

/// Editor-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Restore tabs from the previous session
    pub persist_tabs: bool,
    /// Maximum history entries kept per tab
    pub max_history_per_tab: usize,
    /// Minimum delay between tab saves while typing, in milliseconds
    pub save_interval_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            persist_tabs: true,
            max_history_per_tab: 100,
            save_interval_ms: 1000,
        }
    }
}

/// Dataset loading settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Base URL the remote CSV files are fetched from
    pub base_url: String,
    /// HTTP timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Keep fetched CSV files on disk and reuse them
    pub cache_csv: bool,
    /// Never touch the network; only cached files are used
    pub offline: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: NORTHWIND_BASE.to_string(),
            fetch_timeout_secs: 15,
            cache_csv: true,
            offline: false,
        }
    }
}

/// CSV export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Path used by export when none is given
    pub default_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_path: "results.csv".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[display]
show_row_numbers = false
null_indicator = "<null>"
overscan_rows = 4

[editor]
persist_tabs = false
max_history_per_tab = 20

[data]
base_url = "http://localhost:8000/csv"
fetch_timeout_secs = 3
offline = true

[export]
default_path = "~/out.csv"
"#;

        let config: Config = toml::from_str(toml).unwrap();

        assert!(!config.display.show_row_numbers);
        assert_eq!(config.display.null_indicator, "<null>");
        assert_eq!(config.display.overscan_rows, 4);
        assert!(config.display.sidebar_visible);

        assert!(!config.editor.persist_tabs);
        assert_eq!(config.editor.max_history_per_tab, 20);
        assert_eq!(config.editor.save_interval_ms, 1000);

        assert_eq!(config.data.base_url, "http://localhost:8000/csv");
        assert_eq!(config.data.fetch_timeout_secs, 3);
        assert!(config.data.offline);
        assert!(config.data.cache_csv);

        assert_eq!(config.export.default_path, "~/out.csv");
    }

    #[test]
    fn test_serialize_config() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[display]"));
        assert!(toml_str.contains("[editor]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[export]"));
    }
}
