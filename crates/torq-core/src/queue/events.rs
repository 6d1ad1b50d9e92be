//! Engine event handling: metadata/done/error, and job completion.

use crate::engine::{EngineEvent, EngineEventKind};
use crate::job::{unix_timestamp, JobId, JobStatus};

use super::actor::Orchestrator;

impl Orchestrator {
    /// Events carry a job id; anything referring to a job that no longer has
    /// a live handle (removed, paused, already torn down) is dropped here.
    pub(super) async fn handle_engine_event(&mut self, event: EngineEvent) {
        let job_id = event.job_id;
        if !self.handles.contains_key(&job_id) || !self.jobs.contains_key(&job_id) {
            tracing::debug!(job_id, kind = ?event.kind, "dropping event for untracked job");
            return;
        }
        match event.kind {
            EngineEventKind::Metadata => self.on_metadata(job_id).await,
            EngineEventKind::Done => self.on_done(job_id).await,
            EngineEventKind::Error(message) => self.on_error(job_id, message).await,
        }
    }

    /// Whole-content completion reported by the engine.
    async fn on_done(&mut self, job_id: JobId) {
        // Final counter pull before the handle may be destroyed.
        if let Some(handle) = self.handles.get(&job_id) {
            let stats = handle.stats();
            let engine_files = handle.files();
            if let Some(job) = self.jobs.get_mut(&job_id) {
                job.uploaded = stats.uploaded;
                for (i, ef) in engine_files.iter().enumerate() {
                    if let Some(f) = job.files.get_mut(i) {
                        f.downloaded = ef.downloaded.min(f.size);
                    }
                }
            }
        }
        tracing::info!(job_id, "engine reported content complete");
        self.complete_job(job_id, true).await;
    }

    async fn on_error(&mut self, job_id: JobId, message: String) {
        if let Some(handle) = self.handles.remove(&job_id) {
            handle.destroy();
        }
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };
        job.status = JobStatus::Error;
        job.error = Some(message.clone());
        job.clear_transfer_stats();
        tracing::warn!(job_id, "job failed: {message}");
        let job = job.clone();
        self.notify_status(&job);
        self.persist().await;
        self.process_queue().await;
    }

    /// Moves a job to `completed`, or to `seeding` when the whole content is
    /// done and seeding is enabled. Partial-selection completion never seeds
    /// (`allow_seed = false`): the engine only holds part of the content and
    /// the slot is wanted back.
    pub(super) async fn complete_job(&mut self, job_id: JobId, allow_seed: bool) {
        let seed = allow_seed && self.settings.seed_after_download;
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };

        job.completed_at = Some(unix_timestamp());
        if seed {
            job.status = JobStatus::Seeding;
            tracing::info!(job_id, "job complete, seeding");
        } else {
            job.status = JobStatus::Completed;
            job.clear_transfer_stats();
            tracing::info!(job_id, "job complete");
        }
        let job = job.clone();

        if !seed {
            if let Some(handle) = self.handles.remove(&job_id) {
                handle.destroy();
            }
        }
        self.notify_status(&job);
        self.persist().await;
        if !seed {
            self.process_queue().await;
        }
    }
}
