//! Command handlers: submit, pause, resume, remove, settings.

use crate::config::{Settings, SettingsUpdate};
use crate::error::QueueError;
use crate::job::{find_active_duplicate, Job, JobId, JobStatus};
use crate::source;

use super::actor::Orchestrator;
use super::handle::SubmitRequest;

impl Orchestrator {
    pub(super) async fn submit(&mut self, request: SubmitRequest) -> Result<Job, QueueError> {
        if let Some(existing) = find_active_duplicate(self.jobs.values(), &request.source) {
            tracing::debug!(
                job_id = existing.id,
                source = %request.source,
                "rejected duplicate submission"
            );
            return Err(QueueError::Duplicate(request.source));
        }

        let id = self.next_id;
        self.next_id += 1;

        let name = source::initial_name(&request.source, request.name.as_deref());
        let mut job = Job::new(id, request.source, name, request.download_path);
        job.owner_id = request.owner_id;
        if let Some(mut indices) = request.selected_indices {
            indices.sort_unstable();
            indices.dedup();
            job.selected_indices = Some(indices);
        }

        tracing::info!(job_id = id, name = %job.name, "submitted job");
        self.jobs.insert(id, job.clone());
        self.notify_status(&job);
        self.persist().await;
        self.process_queue().await;

        // The job may already have been admitted (or even failed to start).
        Ok(self.jobs.get(&id).cloned().unwrap_or(job))
    }

    /// Pause is only legal while the job holds a slot; the engine handle is
    /// torn down before the reply so no further events land for it.
    pub(super) async fn pause(&mut self, job_id: JobId) -> Result<(), QueueError> {
        let job = self.jobs.get_mut(&job_id).ok_or(QueueError::NotFound(job_id))?;
        if !job.status.occupies_slot() {
            return Err(QueueError::InvalidState {
                status: job.status,
                op: "pause",
            });
        }

        if let Some(handle) = self.handles.remove(&job_id) {
            handle.destroy();
        }
        job.status = JobStatus::Paused;
        job.clear_transfer_stats();
        tracing::info!(job_id, "paused job");
        let job = job.clone();
        self.notify_status(&job);
        self.persist().await;
        self.process_queue().await;
        Ok(())
    }

    pub(super) async fn resume(&mut self, job_id: JobId) -> Result<(), QueueError> {
        let job = self.jobs.get_mut(&job_id).ok_or(QueueError::NotFound(job_id))?;
        if !matches!(job.status, JobStatus::Paused | JobStatus::Error) {
            return Err(QueueError::InvalidState {
                status: job.status,
                op: "resume",
            });
        }

        job.status = JobStatus::Queued;
        job.error = None;
        tracing::info!(job_id, "resumed job");
        let job = job.clone();
        self.notify_status(&job);
        self.persist().await;
        self.process_queue().await;
        Ok(())
    }

    pub(super) async fn remove(
        &mut self,
        job_id: JobId,
        delete_payload: bool,
    ) -> Result<(), QueueError> {
        let Some(job) = self.jobs.remove(&job_id) else {
            return Err(QueueError::NotFound(job_id));
        };
        if let Some(handle) = self.handles.remove(&job_id) {
            handle.destroy();
        }
        if delete_payload {
            if let Err(e) = job.delete_payload().await {
                tracing::warn!(job_id, "payload deletion incomplete: {e}");
            }
        }
        tracing::info!(job_id, name = %job.name, "removed job");
        self.persist().await;
        self.process_queue().await;
        Ok(())
    }

    pub(super) async fn update_settings(&mut self, update: SettingsUpdate) -> Settings {
        if update.is_empty() {
            return self.settings.clone();
        }
        self.settings.apply(&update);
        self.engine.set_rate_limits(
            self.settings.max_download_speed,
            self.settings.max_upload_speed,
        );
        if let Some(path) = &self.settings_path {
            if let Err(e) = self.settings.save_to(path) {
                tracing::error!("settings save failed: {e:#}");
            }
        }
        tracing::info!(?update, "settings updated");
        // A raised concurrency limit may have opened slots.
        self.process_queue().await;
        self.settings.clone()
    }
}
