//! Persisted editor settings.
//!
//! Settings are stored as JSON in the platform-specific config folder:
//! - macOS: `~/Library/Application Support/com.amyed.Amy Editor/`
//! - Windows: `%APPDATA%/amyed/config/`
//! - Linux: `~/.config/amyed/`
//!
//! The window keys are opaque strings owned by the GUI collaborator; this
//! crate only round-trips them.

use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "amyed";
const APP_NAME: &str = "Amy Editor";
const SETTINGS_FILENAME: &str = "settings.json";

/// How many entries `recent_files` keeps.
pub const MAX_RECENT_FILES: usize = 4;

/// Editor settings, persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Absolute path to the game executable.
    pub amy_path: Option<PathBuf>,

    /// Main window geometry, opaque to this crate.
    pub window_size: Option<String>,
    pub window_pos: Option<String>,
    pub window_maximized: Option<String>,
    pub window_state: Option<String>,

    /// Recently opened levels, most recent first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_files: Vec<PathBuf>,

    /// Last filter used in the level selection dialog.
    pub level_filter: String,
}

impl Settings {
    /// Load settings from the default path.
    ///
    /// Returns defaults if the file is missing, unreadable or unparseable;
    /// a corrupt settings file never blocks startup.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("could not determine settings path, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load settings from a specific path.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::debug!(path = %path.display(), "loaded settings");
                    settings
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to parse settings file, using defaults");
                    Self::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(error) => {
                tracing::warn!(%error, "failed to read settings file, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to the default path.
    pub fn save(&self) -> io::Result<()> {
        let path = Self::settings_path()
            .ok_or_else(|| io::Error::other("could not determine settings path"))?;
        self.save_to(&path)
    }

    /// Save settings to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, content)
    }

    /// The platform-specific settings file path.
    ///
    /// Returns `None` if the platform directory cannot be determined.
    pub fn settings_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILENAME))
    }

    /// Record a recently opened file, most recent first.
    ///
    /// An existing entry for the same path moves to the front; the list is
    /// capped at [`MAX_RECENT_FILES`].
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Drop recent entries whose files no longer exist.
    pub fn prune_recent_files(&mut self) {
        self.recent_files.retain(|p| p.exists());
    }
}
