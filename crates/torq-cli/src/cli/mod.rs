//! CLI for the torq download queue.
//!
//! Manages the persisted queue snapshot and settings file. An embedding
//! application hosts the orchestrator itself; operations that need a live
//! engine handle (pause, file selection) go through its `QueueHandle`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use torq_core::snapshot::JobStore;

use commands::{run_add, run_remove, run_resume, run_settings, run_status};

/// Top-level CLI for the torq download queue.
#[derive(Debug, Parser)]
#[command(name = "torq")]
#[command(about = "torq: torrent download queue manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Queue a new transfer (magnet URI or descriptor file path).
    Add {
        /// Magnet URI or path to a descriptor file.
        source: String,

        /// Destination directory (defaults to the current directory).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,

        /// Display name (defaults to the magnet dn / descriptor file stem).
        #[arg(long)]
        name: Option<String>,

        /// Opaque owner/correlation key stored on the job.
        #[arg(long)]
        owner: Option<String>,

        /// Comma-separated file indices to fetch once metadata resolves
        /// (everything when omitted).
        #[arg(long, value_delimiter = ',', value_name = "IDX")]
        files: Option<Vec<usize>>,
    },

    /// Show all jobs in the queue.
    Status,

    /// Requeue a paused or errored job by its ID.
    Resume {
        /// Job identifier.
        id: u64,
    },

    /// Remove a job (and optionally its downloaded data) by ID.
    Remove {
        /// Job identifier.
        id: u64,

        /// Also delete the job's files from the download directory.
        #[arg(long)]
        delete_data: bool,
    },

    /// Show or change queue settings.
    Settings {
        /// Maximum number of jobs downloading/seeding at once.
        #[arg(long, value_name = "N")]
        max_concurrent: Option<usize>,

        /// Keep completed jobs seeding.
        #[arg(long, value_name = "BOOL")]
        seed_after_download: Option<bool>,

        /// Download cap in bytes/sec (0 = unlimited).
        #[arg(long, value_name = "BPS")]
        max_download_speed: Option<u64>,

        /// Upload cap in bytes/sec (0 = unlimited).
        #[arg(long, value_name = "BPS")]
        max_upload_speed: Option<u64>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let store = JobStore::open_default()?;

        match cli.command {
            CliCommand::Add {
                source,
                download_dir,
                name,
                owner,
                files,
            } => run_add(&store, &source, download_dir, name, owner, files).await?,
            CliCommand::Status => run_status(&store).await?,
            CliCommand::Resume { id } => run_resume(&store, id).await?,
            CliCommand::Remove { id, delete_data } => run_remove(&store, id, delete_data).await?,
            CliCommand::Settings {
                max_concurrent,
                seed_after_download,
                max_download_speed,
                max_upload_speed,
            } => run_settings(
                max_concurrent,
                seed_after_download,
                max_download_speed,
                max_upload_speed,
            )?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
