//! Admission control: fill free concurrency slots with queued jobs, oldest
//! first.

use crate::job::{unix_timestamp, JobId, JobStatus};
use crate::source;

use super::actor::Orchestrator;

impl Orchestrator {
    /// Recomputes free slots and admits queued jobs FIFO by `(added_at, id)`
    /// until the limit is reached. Called after every mutation that could
    /// free or consume a slot.
    pub(super) async fn process_queue(&mut self) {
        loop {
            let active = self
                .jobs
                .values()
                .filter(|j| j.status.occupies_slot())
                .count();
            if active >= self.settings.max_concurrent_downloads {
                return;
            }
            let Some(next) = self
                .jobs
                .values()
                .filter(|j| j.status == JobStatus::Queued)
                .min_by_key(|j| (j.added_at, j.id))
                .map(|j| j.id)
            else {
                return;
            };
            self.start_job(next).await;
        }
    }

    /// Starts one queued job at the engine. Idempotent: a job that already
    /// has a live handle is left alone.
    async fn start_job(&mut self, job_id: JobId) {
        if self.handles.contains_key(&job_id) {
            tracing::warn!(job_id, "duplicate admission attempt ignored");
            return;
        }
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };

        match self.engine.start(
            job_id,
            &job.source,
            &job.download_path,
            self.engine_tx.clone(),
        ) {
            Ok(handle) => {
                job.status = JobStatus::Downloading;
                job.started_at = Some(unix_timestamp());
                if job.info_hash.is_none() {
                    job.info_hash = handle
                        .info_hash()
                        .or_else(|| source::magnet_info_hash(&job.source));
                }
                tracing::info!(job_id, name = %job.name, "admitted job");
                let job = job.clone();
                self.handles.insert(job_id, handle);
                self.notify_status(&job);
            }
            Err(e) => {
                job.status = JobStatus::Error;
                job.error = Some(e.to_string());
                tracing::warn!(job_id, "engine refused to start job: {e:#}");
                let job = job.clone();
                self.notify_status(&job);
            }
        }
        self.persist().await;
    }
}
