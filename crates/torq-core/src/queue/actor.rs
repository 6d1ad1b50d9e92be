//! The orchestrator actor: owns the job table, consumes commands and engine
//! events, drives the progress tick.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::Settings;
use crate::engine::{EngineEvent, EngineHandle, TransferEngine};
use crate::error::QueueError;
use crate::job::{Job, JobId};
use crate::notify::{Notification, Notifier};
use crate::snapshot::{next_job_id, JobStore};

use super::handle::{Command, QueueHandle};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const ENGINE_CHANNEL_CAPACITY: usize = 64;
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

pub struct Orchestrator {
    pub(super) engine: Arc<dyn TransferEngine>,
    pub(super) store: JobStore,
    pub(super) settings: Settings,
    pub(super) settings_path: Option<PathBuf>,

    /// Single source of truth. BTreeMap keeps submission (id) order.
    pub(super) jobs: BTreeMap<JobId, Job>,
    pub(super) next_id: JobId,
    /// Live engine handles for jobs the engine currently knows about.
    pub(super) handles: HashMap<JobId, Box<dyn EngineHandle>>,

    pub(super) notifier: Notifier,
    command_rx: mpsc::Receiver<Command>,
    engine_rx: mpsc::Receiver<EngineEvent>,
    pub(super) engine_tx: mpsc::Sender<EngineEvent>,
}

impl Orchestrator {
    /// Loads the persisted table (active statuses already coerced back to
    /// queued by the store) and wires up the channels. The orchestrator does
    /// not run until [`run`](Self::run) is awaited, typically via
    /// `tokio::spawn`.
    pub async fn new(
        engine: Arc<dyn TransferEngine>,
        store: JobStore,
        settings: Settings,
    ) -> Result<(Self, QueueHandle), QueueError> {
        let loaded = store.load().await.map_err(QueueError::Persistence)?;
        let next_id = next_job_id(&loaded);
        let jobs: BTreeMap<JobId, Job> = loaded.into_iter().map(|j| (j.id, j)).collect();

        engine.set_rate_limits(settings.max_download_speed, settings.max_upload_speed);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (engine_tx, engine_rx) = mpsc::channel(ENGINE_CHANNEL_CAPACITY);

        let orchestrator = Orchestrator {
            engine,
            store,
            settings,
            settings_path: None,
            jobs,
            next_id,
            handles: HashMap::new(),
            notifier: Notifier::new(),
            command_rx,
            engine_rx,
            engine_tx,
        };
        let handle = QueueHandle { command_tx };
        Ok((orchestrator, handle))
    }

    /// Persist settings updates to this path (the config file). Without it,
    /// updates apply in memory only.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Main loop. Commands are preferred over engine events so caller
    /// operations stay responsive; the progress tick skips (never stacks)
    /// when a previous tick ran long, and is disabled entirely while nothing
    /// holds a slot.
    pub async fn run(mut self) {
        self.process_queue().await;
        self.persist().await;

        let mut tick = tokio::time::interval(PROGRESS_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let transferring = self.has_active_transfers();
            tokio::select! {
                biased;

                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Shutdown { reply }) => {
                            self.shutdown().await;
                            let _ = reply.send(());
                            break;
                        }
                        Some(command) => self.handle_command(command).await,
                        None => {
                            // Every QueueHandle is gone.
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                Some(event) = self.engine_rx.recv() => {
                    self.handle_engine_event(event).await;
                }

                _ = tick.tick(), if transferring => {
                    self.refresh_progress().await;
                }
            }
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { request, reply } => {
                let _ = reply.send(self.submit(request).await);
            }
            Command::Pause { job_id, reply } => {
                let _ = reply.send(self.pause(job_id).await);
            }
            Command::Resume { job_id, reply } => {
                let _ = reply.send(self.resume(job_id).await);
            }
            Command::Remove {
                job_id,
                delete_payload,
                reply,
            } => {
                let _ = reply.send(self.remove(job_id, delete_payload).await);
            }
            Command::SelectFiles {
                job_id,
                indices,
                reply,
            } => {
                let _ = reply.send(self.select_files(job_id, indices).await);
            }
            Command::AddMoreFiles {
                job_id,
                indices,
                reply,
            } => {
                let _ = reply.send(self.add_more_files(job_id, indices).await);
            }
            Command::ListJobs { reply } => {
                let _ = reply.send(self.jobs.values().cloned().collect());
            }
            Command::GetSettings { reply } => {
                let _ = reply.send(self.settings.clone());
            }
            Command::UpdateSettings { update, reply } => {
                let _ = reply.send(self.update_settings(update).await);
            }
            Command::Subscribe { reply } => {
                let _ = reply.send(self.notifier.subscribe());
            }
            Command::Shutdown { .. } => unreachable!("handled in run loop"),
        }
    }

    pub(super) fn has_active_transfers(&self) -> bool {
        self.jobs.values().any(|j| j.status.occupies_slot())
    }

    /// Write-through snapshot save. A failure here must not take the queue
    /// down; it is logged so an operator can see recoverability is at risk.
    pub(super) async fn persist(&self) {
        let jobs: Vec<Job> = self.jobs.values().cloned().collect();
        if let Err(e) = self.store.save(&jobs).await {
            tracing::error!("job snapshot save failed: {e:#}");
        }
    }

    pub(super) fn notify_status(&self, job: &Job) {
        self.notifier.emit(Notification::StatusChanged { job: job.clone() });
    }

    async fn shutdown(&mut self) {
        for (job_id, handle) in self.handles.drain() {
            tracing::debug!(job_id, "destroying engine handle on shutdown");
            handle.destroy();
        }
        self.persist().await;
        tracing::info!("orchestrator stopped");
    }
}
