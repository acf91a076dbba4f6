//! Configuration lookup for the loading screen.
//!
//! The settings live in the mod loader's config directory as an INI-like
//! file (`BepInEx/config/Bertogim.LoadingScreen.cfg`) that the mod loader
//! itself writes. This module only reads it:
//! - Locating the file by walking up from the executable's directory
//! - Looking up `[section]` / `key` pairs
//! - Turning the few values the core needs into typed [`SplashSettings`]
//!
//! Anything missing or malformed falls back to its default.
//!
//! # Example
//!
//! ```rust
//! use loading_screen_core::config::{ConfigStore, SplashSettings, WindowMode};
//!
//! let store = ConfigStore::parse("[2. Window]\nWindowType = FixedWindow\nExtraWaitTime = 90\n");
//! let settings = SplashSettings::from_store(&store);
//!
//! assert_eq!(settings.window_mode, WindowMode::FixedWindow);
//! assert_eq!(settings.extra_wait.as_secs(), 60);
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "Bertogim.LoadingScreen.cfg";
const LOADER_DIR_NAME: &str = "BepInEx";
const CONFIG_DIR_NAME: &str = "config";
/// How many parent directories are searched for the mod loader folder
const MAX_SEARCH_DEPTH: usize = 5;

pub const SECTION_GENERAL: &str = "1. LoadingScreen";
pub const SECTION_WINDOW: &str = "2. Window";
pub const KEY_ENABLED: &str = "Enabled";
pub const KEY_WINDOW_TYPE: &str = "WindowType";
pub const KEY_EXTRA_WAIT_TIME: &str = "ExtraWaitTime";

pub const DEFAULT_EXTRA_WAIT_SECS: u64 = 1;
pub const MAX_EXTRA_WAIT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown window type \"{0}\"")]
    UnknownWindowMode(String),
}

/// How the splash window behaves while the game starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// Looks like the game's own window until the real one shows up
    #[default]
    FakeGame,
    /// Pinned on top of everything, cannot be moved or closed
    FixedWindow,
}

impl FromStr for WindowMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FakeGame" => Ok(WindowMode::FakeGame),
            "FixedWindow" => Ok(WindowMode::FixedWindow),
            other => Err(SettingsError::UnknownWindowMode(other.to_string())),
        }
    }
}

/// Read-only `[section]` / `key` lookup
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: HashMap<(String, String), String>,
}

impl ConfigStore {
    /// Parse INI-like text. Lines starting with `#` or `;` are comments;
    /// values are the trimmed text after the first `=`.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        let mut section = String::new();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                if let Some(end) = rest.find(']') {
                    section = rest[..end].to_string();
                }
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(
                    (section.clone(), key.trim().to_string()),
                    value.trim().to_string(),
                );
            }
        }

        Self { values }
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Find the config file by searching `start` and its parents for the mod
/// loader folder. Stops at the first mod loader folder found, even if it
/// has no config file yet.
pub fn locate_config(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors().take(MAX_SEARCH_DEPTH) {
        let loader_dir = dir.join(LOADER_DIR_NAME);
        if loader_dir.is_dir() {
            let config_path = loader_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            return config_path.is_file().then_some(config_path);
        }
    }
    None
}

/// The settings the host and UI process act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplashSettings {
    /// Host side switch for showing the splash at all
    pub enabled: bool,
    pub window_mode: WindowMode,
    /// Extra time the splash stays up after loading finished
    pub extra_wait: Duration,
}

impl Default for SplashSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_mode: WindowMode::default(),
            extra_wait: Duration::from_secs(DEFAULT_EXTRA_WAIT_SECS),
        }
    }
}

impl SplashSettings {
    pub fn from_store(store: &ConfigStore) -> Self {
        let defaults = Self::default();

        let enabled = match store.get(SECTION_GENERAL, KEY_ENABLED) {
            Some(value) => value.parse::<bool>().unwrap_or_else(|_| {
                warn!("Invalid {} value \"{}\", using default", KEY_ENABLED, value);
                defaults.enabled
            }),
            None => defaults.enabled,
        };

        let window_mode = match store.get(SECTION_WINDOW, KEY_WINDOW_TYPE) {
            Some(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}, using {:?}", e, defaults.window_mode);
                defaults.window_mode
            }),
            None => defaults.window_mode,
        };

        let extra_wait = match store.get(SECTION_WINDOW, KEY_EXTRA_WAIT_TIME) {
            Some(value) => match value.parse::<i64>() {
                Ok(secs) => Duration::from_secs(secs.clamp(0, MAX_EXTRA_WAIT_SECS as i64) as u64),
                Err(_) => {
                    warn!("Invalid {} value \"{}\", using default", KEY_EXTRA_WAIT_TIME, value);
                    defaults.extra_wait
                }
            },
            None => defaults.extra_wait,
        };

        Self {
            enabled,
            window_mode,
            extra_wait,
        }
    }

    /// Load settings for an executable living somewhere under the game
    /// directory. Returns defaults if no config file can be found or read.
    pub fn load_near(exe_dir: &Path) -> Self {
        let Some(path) = locate_config(exe_dir) else {
            debug!("No {} found near {}, using defaults", CONFIG_FILE_NAME, exe_dir.display());
            return Self::default();
        };

        match ConfigStore::load(&path) {
            Ok(store) => {
                debug!("Loaded settings from {}", path.display());
                Self::from_store(&store)
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// [`SplashSettings::load_near`] the running executable
    pub fn load_for_current_exe() -> Self {
        match std::env::current_exe() {
            Ok(exe) => Self::load_near(exe.parent().unwrap_or(Path::new("."))),
            Err(e) => {
                warn!("Failed to resolve current executable: {}, using defaults", e);
                Self::default()
            }
        }
    }
}
