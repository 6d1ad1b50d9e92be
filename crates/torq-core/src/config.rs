//! Settings store: loaded once at startup, mutable at runtime.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_max_concurrent() -> usize {
    3
}

/// Global settings loaded from `~/.config/torq/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum number of jobs transferring (or seeding) at once. Clamped to ≥ 1.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
    /// Keep completed jobs seeding instead of tearing them down.
    #[serde(default)]
    pub seed_after_download: bool,
    /// Upload cap in bytes/sec; 0 = unlimited.
    #[serde(default)]
    pub max_upload_speed: u64,
    /// Download cap in bytes/sec; 0 = unlimited.
    #[serde(default)]
    pub max_download_speed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_concurrent_downloads: default_max_concurrent(),
            seed_after_download: false,
            max_upload_speed: 0,
            max_download_speed: 0,
        }
    }
}

/// Partial settings change; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub max_concurrent_downloads: Option<usize>,
    pub seed_after_download: Option<bool>,
    pub max_upload_speed: Option<u64>,
    pub max_download_speed: Option<u64>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.max_concurrent_downloads.is_none()
            && self.seed_after_download.is_none()
            && self.max_upload_speed.is_none()
            && self.max_download_speed.is_none()
    }
}

impl Settings {
    /// Applies a partial update in place, clamping the concurrency limit.
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(n) = update.max_concurrent_downloads {
            self.max_concurrent_downloads = n.max(1);
        }
        if let Some(seed) = update.seed_after_download {
            self.seed_after_download = seed;
        }
        if let Some(up) = update.max_upload_speed {
            self.max_upload_speed = up;
        }
        if let Some(down) = update.max_download_speed {
            self.max_download_speed = down;
        }
    }

    /// Writes the settings back to the given path as TOML.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("torq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load settings from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<Settings> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as `load_or_init` with an explicit path (tests, CLI overrides).
pub fn load_or_init_at(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let defaults = Settings::default();
        defaults.save_to(path)?;
        tracing::info!("created default settings at {}", path.display());
        return Ok(defaults);
    }

    let data = fs::read_to_string(path)?;
    let mut settings: Settings = toml::from_str(&data)?;
    settings.max_concurrent_downloads = settings.max_concurrent_downloads.max(1);
    Ok(settings)
}
