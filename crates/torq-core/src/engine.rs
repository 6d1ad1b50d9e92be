//! Transfer engine boundary.
//!
//! The peer-to-peer engine (swarm discovery, piece verification, disk I/O)
//! lives outside this crate. The orchestrator talks to it through these
//! traits: `start` is synchronous with the result arriving later as typed
//! events on the channel the orchestrator hands in, and a live handle
//! exposes stats, the resolved file list, and per-file selection.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::job::JobId;

/// Live transfer counters reported by an engine handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub download_speed: u64,
    pub upload_speed: u64,
    pub downloaded: u64,
    pub uploaded: u64,
    /// Total content length; 0 until metadata resolves.
    pub length: u64,
    pub num_peers: u32,
}

/// One file of the resolved content.
#[derive(Debug, Clone)]
pub struct EngineFile {
    pub name: String,
    /// Path relative to the destination directory.
    pub path: PathBuf,
    pub length: u64,
    pub downloaded: u64,
}

/// What happened to a job at the engine level.
#[derive(Debug, Clone)]
pub enum EngineEventKind {
    /// Metadata resolved; the handle's file list is now populated.
    Metadata,
    /// The whole content finished downloading. Never fired for a partial
    /// selection; the orchestrator detects that case itself.
    Done,
    /// Fatal transfer failure.
    Error(String),
}

/// Event pushed by the engine adapter onto the orchestrator's event channel.
#[derive(Debug, Clone)]
pub struct EngineEvent {
    pub job_id: JobId,
    pub kind: EngineEventKind,
}

/// A live engine-side job. Dropping the handle does not stop the transfer;
/// call `destroy` for that.
pub trait EngineHandle: Send + Sync {
    /// Display name once metadata resolves.
    fn name(&self) -> Option<String>;

    /// Content identity once known (immediately for descriptor sources).
    fn info_hash(&self) -> Option<String>;

    fn stats(&self) -> EngineStats;

    /// Resolved file list; empty before metadata.
    fn files(&self) -> Vec<EngineFile>;

    /// Marks one file for transfer or excludes it. Indices follow `files()`.
    fn set_file_selected(&self, index: usize, selected: bool);

    /// Tears the engine job down. Synchronous from the orchestrator's view:
    /// after this returns, no further events for the job are delivered.
    fn destroy(&self);
}

/// The external transfer engine.
pub trait TransferEngine: Send + Sync {
    /// Starts a transfer for `source` into `dest`. The call itself only
    /// registers the job; metadata/done/error arrive later via `events`.
    fn start(
        &self,
        job_id: JobId,
        source: &str,
        dest: &Path,
        events: mpsc::Sender<EngineEvent>,
    ) -> anyhow::Result<Box<dyn EngineHandle>>;

    /// Applies global speed caps in bytes/sec; 0 means unlimited.
    fn set_rate_limits(&self, max_download: u64, max_upload: u64);
}
