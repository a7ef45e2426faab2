// ─── Installer Settings ───
// Persistent settings read from `forge_installer.json` in the main directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

pub const SETTINGS_FILE: &str = "forge_installer.json";
pub const DEFAULT_FORGE_PREFIX: &str = "forge";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSettings {
    /// Prefix of the installed version id (`<prefix>-<forge version>`).
    pub forge_prefix: String,
    pub java_path: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub processor_timeout_secs: u64,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            forge_prefix: DEFAULT_FORGE_PREFIX.to_string(),
            java_path: None,
            http_timeout_secs: 120,
            connect_timeout_secs: 15,
            processor_timeout_secs: 900,
        }
    }
}

impl InstallerSettings {
    /// Load settings from `main_dir`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(main_dir: &Path) -> Self {
        let path = main_dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No settings file at {:?}, using defaults", path);
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, main_dir: &Path) -> LauncherResult<()> {
        let path = main_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| LauncherError::Io { path, source })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn processor_timeout(&self) -> Duration {
        Duration::from_secs(self.processor_timeout_secs)
    }
}

/// Standard `.minecraft` location for the current platform.
pub fn default_main_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("minecraft")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = InstallerSettings::load(dir.path());
        assert_eq!(settings.forge_prefix, "forge");
        assert_eq!(settings.processor_timeout(), Duration::from_secs(900));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"forge_prefix": "lexforge", "http_timeout_secs": 30}"#,
        )
        .unwrap();

        let settings = InstallerSettings::load(dir.path());
        assert_eq!(settings.forge_prefix, "lexforge");
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
        assert_eq!(settings.connect_timeout_secs, 15);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let settings = InstallerSettings {
            java_path: Some(PathBuf::from("/opt/jdk/bin/java")),
            ..Default::default()
        };
        settings.save(dir.path()).unwrap();

        let loaded = InstallerSettings::load(dir.path());
        assert_eq!(loaded.java_path, Some(PathBuf::from("/opt/jdk/bin/java")));
    }
}
