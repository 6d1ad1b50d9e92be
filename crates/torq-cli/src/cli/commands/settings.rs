//! `torq settings` – show or change queue settings.

use anyhow::Result;

use torq_core::config::{self, SettingsUpdate};

pub fn run_settings(
    max_concurrent: Option<usize>,
    seed_after_download: Option<bool>,
    max_download_speed: Option<u64>,
    max_upload_speed: Option<u64>,
) -> Result<()> {
    let path = config::config_path()?;
    let mut settings = config::load_or_init_at(&path)?;

    let update = SettingsUpdate {
        max_concurrent_downloads: max_concurrent,
        seed_after_download,
        max_upload_speed,
        max_download_speed,
    };
    if !update.is_empty() {
        settings.apply(&update);
        settings.save_to(&path)?;
        println!("Settings updated.");
    }

    println!("max_concurrent_downloads = {}", settings.max_concurrent_downloads);
    println!("seed_after_download      = {}", settings.seed_after_download);
    println!("max_download_speed       = {}", settings.max_download_speed);
    println!("max_upload_speed         = {}", settings.max_upload_speed);
    Ok(())
}
