//! Caller-facing handle: typed commands over an mpsc channel with oneshot
//! replies. The orchestrator task is the only consumer.

use std::path::PathBuf;

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::{Settings, SettingsUpdate};
use crate::error::QueueError;
use crate::job::{Job, JobId};
use crate::notify::Notification;

/// Parameters for submitting a new job.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Magnet URI or descriptor file path.
    pub source: String,
    /// Display name; derived from the source when absent.
    pub name: Option<String>,
    /// Opaque caller correlation key.
    pub owner_id: Option<String>,
    /// Destination directory.
    pub download_path: PathBuf,
    /// Pre-selected file subset, applied once metadata resolves.
    pub selected_indices: Option<Vec<usize>>,
}

pub(crate) enum Command {
    Submit {
        request: SubmitRequest,
        reply: oneshot::Sender<Result<Job, QueueError>>,
    },
    Pause {
        job_id: JobId,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    Resume {
        job_id: JobId,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    Remove {
        job_id: JobId,
        delete_payload: bool,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    SelectFiles {
        job_id: JobId,
        indices: Vec<usize>,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    AddMoreFiles {
        job_id: JobId,
        indices: Vec<usize>,
        reply: oneshot::Sender<Result<(), QueueError>>,
    },
    ListJobs {
        reply: oneshot::Sender<Vec<Job>>,
    },
    GetSettings {
        reply: oneshot::Sender<Settings>,
    },
    UpdateSettings {
        update: SettingsUpdate,
        reply: oneshot::Sender<Settings>,
    },
    Subscribe {
        reply: oneshot::Sender<broadcast::Receiver<Notification>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running orchestrator.
#[derive(Clone)]
pub struct QueueHandle {
    pub(crate) command_tx: mpsc::Sender<Command>,
}

impl QueueHandle {
    async fn send<R>(
        &self,
        command: Command,
        reply_rx: oneshot::Receiver<R>,
    ) -> Result<R, QueueError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| QueueError::Shutdown)?;
        reply_rx.await.map_err(|_| QueueError::Shutdown)
    }

    /// Submits a new transfer; it enters the table `queued` and is admitted
    /// as soon as a concurrency slot frees up.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Job, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit { request, reply }, rx).await?
    }

    /// Pauses a downloading or seeding job, tearing down its engine handle.
    pub async fn pause(&self, job_id: JobId) -> Result<(), QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Pause { job_id, reply }, rx).await?
    }

    /// Requeues a paused or errored job, clearing any stored error.
    pub async fn resume(&self, job_id: JobId) -> Result<(), QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Resume { job_id, reply }, rx).await?
    }

    /// Removes a job from the table, optionally deleting its on-disk payload.
    pub async fn remove(&self, job_id: JobId, delete_payload: bool) -> Result<(), QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(
            Command::Remove {
                job_id,
                delete_payload,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Applies a file selection to a job awaiting one.
    pub async fn select_files(
        &self,
        job_id: JobId,
        indices: Vec<usize>,
    ) -> Result<(), QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(
            Command::SelectFiles {
                job_id,
                indices,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Merges additional files into a job's selection, restarting the job
    /// from scratch if it was already torn down.
    pub async fn add_more_files(
        &self,
        job_id: JobId,
        indices: Vec<usize>,
    ) -> Result<(), QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(
            Command::AddMoreFiles {
                job_id,
                indices,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Current job table, submission order.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ListJobs { reply }, rx).await
    }

    pub async fn get_settings(&self) -> Result<Settings, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::GetSettings { reply }, rx).await
    }

    /// Applies a partial settings update; live throttles are re-applied to
    /// the engine and freed capacity is filled immediately.
    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<Settings, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::UpdateSettings { update, reply }, rx).await
    }

    /// Subscribes to status/progress/selection notifications.
    pub async fn subscribe(
        &self,
    ) -> Result<broadcast::Receiver<Notification>, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { reply }, rx).await
    }

    /// Stops the orchestrator task. Engine handles are torn down; the table
    /// stays persisted for the next start.
    pub async fn shutdown(&self) -> Result<(), QueueError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply }, rx).await
    }
}
