//! Notifications emitted to whatever UI or automation layer sits above the
//! orchestrator. Delivered over a broadcast channel; subscribers that lag or
//! disappear never block queue processing.

use tokio::sync::broadcast;

use crate::job::{Job, JobFile, JobId};

const CHANNEL_CAPACITY: usize = 64;

/// Outward-facing event.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A job changed status (including initial submission).
    StatusChanged { job: Job },
    /// Bulk progress refresh for the jobs whose stats changed this tick.
    Progress { jobs: Vec<Job> },
    /// Metadata resolved with no prior file selection; a consumer must pick
    /// the files to fetch.
    SelectionNeeded {
        job_id: JobId,
        name: String,
        files: Vec<JobFile>,
    },
}

/// Sender half owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Notifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: a send with no live subscribers is not an error.
    pub fn emit(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
