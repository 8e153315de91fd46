//! Persisted controller defaults.
//!
//! The extraction core takes all of its inputs explicitly. Front ends that
//! want to remember the last export directory and sampling interval between
//! runs can keep them in [`ControllerSettings`], stored as JSON under the
//! user's config directory.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Sampling interval used when nothing has been configured.
pub const DEFAULT_SAVE_INTERVAL: u64 = 5;

/// Front-end defaults for new extraction jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Directory under which per-video frame folders are created.
    pub export_dir: PathBuf,
    /// Keep every Nth frame.
    pub save_interval: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            save_interval: DEFAULT_SAVE_INTERVAL,
        }
    }
}

impl ControllerSettings {
    /// Location of the settings file: `<config dir>/framesnap/settings.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("framesnap")
            .join("settings.json")
    }

    /// Load from [`default_path`](ControllerSettings::default_path).
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Load from `path`.
    ///
    /// A missing file yields the defaults. An unreadable or unparsable file
    /// also yields the defaults, with a warning. Absent fields, an empty
    /// export directory and a zero interval are replaced by their defaults.
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
            Err(error) => {
                log::warn!(
                    "Cannot read settings file {} ({error}), using defaults",
                    path.display()
                );
                return Self::default();
            }
        };

        let mut settings = match serde_json::from_str::<Self>(&content) {
            Ok(settings) => settings,
            Err(error) => {
                log::warn!(
                    "Ignoring unparsable settings file {} ({error})",
                    path.display()
                );
                return Self::default();
            }
        };

        if settings.export_dir.as_os_str().is_empty() {
            settings.export_dir = default_export_dir();
        }
        if settings.save_interval == 0 {
            settings.save_interval = DEFAULT_SAVE_INTERVAL;
        }

        log::debug!("Loaded settings from {}", path.display());
        settings
    }

    /// Save to [`default_path`](ControllerSettings::default_path).
    ///
    /// # Errors
    ///
    /// See [`save_to`](ControllerSettings::save_to).
    pub fn save(&self) -> Result<(), FrameError> {
        self.save_to(&Self::default_path())
    }

    /// Write the settings to `path` as pretty JSON, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IoError`] if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), FrameError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

/// The desktop, falling back to home, then the working directory.
fn default_export_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
