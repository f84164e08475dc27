//! Tab persistence between launches.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::config::config_dir;
use crate::model::{SavedQuery, SqlTab};

/// Current tabs file schema version.
const TABS_VERSION: u32 = 1;

/// The part of the query store that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTabs {
    #[serde(default)]
    pub tabs: Vec<SqlTab>,

    #[serde(default)]
    pub active_tab_id: Option<String>,

    #[serde(default)]
    pub saved_queries: Vec<SavedQuery>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TabsFile {
    version: u32,
    #[serde(flatten)]
    state: PersistedTabs,
}

/// Returns the tabs file path (`<config_dir>/tabs-v1.json`).
pub fn tabs_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("tabs-v1.json"))
}

/// Load persisted tabs from a specific path.
///
/// A missing file yields defaults; unreadable or corrupt files are errors.
pub fn load_tabs_from_path(path: &Path) -> Result<PersistedTabs> {
    if !path.exists() {
        return Ok(PersistedTabs::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tabs file: {}", path.display()))?;

    let file: TabsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tabs file: {}", path.display()))?;

    if file.version > TABS_VERSION {
        anyhow::bail!(
            "Tabs file {} has version {}, newer than supported version {}",
            path.display(),
            file.version,
            TABS_VERSION
        );
    }

    Ok(file.state)
}

/// Load persisted tabs, falling back to defaults on any failure.
///
/// A file that cannot be used is moved aside to `<name>.bak` so the next
/// save does not overwrite it.
pub fn load_tabs_or_default(path: &Path) -> PersistedTabs {
    load_tabs_from_path(path).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable tabs file");
        let backup = backup_path(path);
        match fs::rename(path, &backup) {
            Ok(()) => warn!(backup = %backup.display(), "moved unreadable tabs file aside"),
            Err(e) => warn!(error = %e, "failed to back up unreadable tabs file"),
        }
        PersistedTabs::default()
    })
}

/// `<path>.bak`, next to the tabs file.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Save persisted tabs to a specific path with an atomic replace.
pub fn save_tabs_to_path(state: &PersistedTabs, path: &Path) -> Result<()> {
    let parent = path.parent().context("Tabs path has no parent directory")?;

    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;

    let file = TabsFile {
        version: TABS_VERSION,
        state: state.clone(),
    };

    let content = serde_json::to_string_pretty(&file).context("Failed to serialize tabs")?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp tabs file in: {}", parent.display()))?;

    tmp.write_all(content.as_bytes())
        .context("Failed to write temp tabs file")?;
    tmp.flush().context("Failed to flush temp tabs file")?;

    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("Failed to persist tabs file: {}", e))?;

    Ok(())
}
