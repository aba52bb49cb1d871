//! Persisted settings and chat presets.
//!
//! Both live as pretty-printed JSON under the user's config directory:
//! `settings.json` holds `{ "defaultStart": bool }` and `chat_presets.json`
//! holds a list of strings.

use crate::error::{Result, WatchError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";
pub const CHAT_PRESETS_FILE: &str = "chat_presets.json";

/// Directory holding both files, e.g. `~/.config/osc-watch`
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::config_dir().with_context(|| "Could not determine config directory")?;
    Ok(config_dir.join("osc-watch"))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Start sending as soon as the app opens
    #[serde(rename = "defaultStart", default = "default_start")]
    pub default_start: bool,
}

fn default_start() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_start: default_start(),
        }
    }
}

impl Settings {
    /// Load settings. A missing file is created with defaults; an unreadable
    /// one is logged and replaced by defaults in memory.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let settings = Settings::default();
            if let Err(e) = settings.save_to(path) {
                log::error!("Error saving settings: {}", e);
            }
            return settings;
        }

        match fs::read_to_string(path)
            .map_err(WatchError::from)
            .and_then(|data| serde_json::from_str(&data).map_err(WatchError::from))
        {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Error loading settings: {}", e);
                Settings::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

/// Ordered list of saved chat messages, persisted on every change.
#[derive(Debug, Clone)]
pub struct ChatPresets {
    path: PathBuf,
    presets: Vec<String>,
}

impl ChatPresets {
    /// Load presets. A missing file is created empty; an unreadable one
    /// yields an empty list.
    pub fn load_from<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();

        let presets = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(WatchError::from)
                .and_then(|data| serde_json::from_str(&data).map_err(WatchError::from))
            {
                Ok(presets) => presets,
                Err(e) => {
                    log::error!("Error loading chat presets: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let store = Self { path, presets };
        if !store.path.exists() {
            if let Err(e) = store.save() {
                log::error!("Error saving chat presets: {}", e);
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[String] {
        &self.presets
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.presets.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.presets)
    }

    /// Append a trimmed message. Empty and duplicate messages are rejected.
    pub fn add(&mut self, message: &str) -> Result<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(WatchError::preset("The message to save is empty"));
        }
        if self.presets.iter().any(|p| p == message) {
            return Err(WatchError::preset("This message already exists as a preset"));
        }

        self.presets.push(message.to_string());
        self.save()
    }

    /// Remove by text. Returns whether anything was removed.
    pub fn remove(&mut self, message: &str) -> Result<bool> {
        match self.presets.iter().position(|p| p == message) {
            Some(pos) => {
                self.presets.remove(pos);
                self.save()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Swap with the previous entry. Out-of-range indices are a no-op.
    pub fn move_up(&mut self, index: usize) -> Result<bool> {
        if index == 0 || index >= self.presets.len() {
            return Ok(false);
        }
        self.presets.swap(index, index - 1);
        self.save()?;
        Ok(true)
    }

    /// Swap with the next entry. Out-of-range indices are a no-op.
    pub fn move_down(&mut self, index: usize) -> Result<bool> {
        if index + 1 >= self.presets.len() {
            return Ok(false);
        }
        self.presets.swap(index, index + 1);
        self.save()?;
        Ok(true)
    }
}
