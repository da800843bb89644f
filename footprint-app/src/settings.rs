//! Persistent application settings (JSON file in app data directory).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_FILTER: &str = "footprint=info,footprint_core=info";

/// Special database path selecting the in-memory collaborators.
pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppSettings {
    /// SQLite file; `None` means `footprint.db` next to the settings file.
    pub database_path: Option<PathBuf>,
    pub log_filter: String,
    /// Print the spoken reply to stdout.
    pub speak_responses: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: DEFAULT_LOG_FILTER.into(),
            speak_responses: true,
        }
    }
}

impl AppSettings {
    pub fn normalize(&mut self) {
        self.log_filter = normalize_log_filter(&self.log_filter);
        self.database_path = self
            .database_path
            .as_ref()
            .map(|p| PathBuf::from(p.to_string_lossy().trim()))
            .filter(|p| !p.as_os_str().is_empty());
    }

    /// Database path, resolved against the settings file location.
    pub fn resolve_database_path(&self, settings_path: &Path) -> PathBuf {
        match &self.database_path {
            Some(path) if path.as_os_str() == MEMORY_DATABASE || path.is_absolute() => {
                path.clone()
            }
            Some(path) => settings_dir(settings_path).join(path),
            None => settings_dir(settings_path).join("footprint.db"),
        }
    }
}

fn settings_dir(settings_path: &Path) -> PathBuf {
    settings_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn normalize_log_filter(raw: &str) -> String {
    let filter = raw.trim();
    if filter.is_empty() {
        DEFAULT_LOG_FILTER.into()
    } else {
        filter.into()
    }
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Footprint")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("footprint")
            .join("settings.json")
    }
}

pub fn load_settings(path: &Path) -> AppSettings {
    let mut settings = fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<AppSettings>(&raw).ok())
        .unwrap_or_default();
    settings.normalize();
    settings
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, json)
}
