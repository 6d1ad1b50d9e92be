//! Typed errors returned by queue operations.
//!
//! Command operations (submit/pause/resume/remove/select) hand one of these
//! back to the immediate caller; engine failures are stored on the job and
//! never raised past the orchestrator boundary.

use crate::job::{JobId, JobStatus};

/// Error returned by a queue command.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// No job with the given id exists in the table.
    #[error("no job with id {0}")]
    NotFound(JobId),

    /// An active (non-completed, non-errored) job with the same source
    /// is already in the table.
    #[error("an active job for source {0:?} already exists")]
    Duplicate(String),

    /// The requested operation is not legal from the job's current status.
    #[error("cannot {op} a job that is {status}")]
    InvalidState { status: JobStatus, op: &'static str },

    /// A file index is outside the job's resolved file list.
    #[error("file index {index} out of range (job has {file_count} files)")]
    InvalidSelection { index: usize, file_count: usize },

    /// A selection must name at least one file.
    #[error("selection must include at least one file")]
    EmptySelection,

    /// The transfer engine refused to start the job.
    #[error("engine: {0}")]
    Engine(String),

    /// Reading or writing the job-table snapshot failed.
    #[error("snapshot: {0}")]
    Persistence(anyhow::Error),

    /// The orchestrator task is gone (command or reply channel closed).
    #[error("queue is shut down")]
    Shutdown,
}
