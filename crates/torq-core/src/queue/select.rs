//! Selection coordination: reacting to resolved metadata, applying a file
//! selection, and merging additional files into an existing one.

use crate::error::QueueError;
use crate::job::{JobFile, JobId, JobStatus};
use crate::notify::Notification;
use crate::selection;

use super::actor::Orchestrator;

impl Orchestrator {
    /// Metadata resolved: fill in the file list and identity, then either
    /// reapply a pre-existing selection or park the job for a consumer to
    /// choose files.
    pub(super) async fn on_metadata(&mut self, job_id: JobId) {
        let Some(handle) = self.handles.get(&job_id) else {
            return;
        };
        let engine_files = handle.files();
        let stats = handle.stats();
        let engine_name = handle.name();
        let engine_hash = handle.info_hash();

        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };
        job.files = engine_files
            .iter()
            .map(|f| JobFile {
                path: f.path.to_string_lossy().into_owned(),
                name: f.name.clone(),
                size: f.length,
                downloaded: f.downloaded.min(f.length),
                selected: true,
            })
            .collect();
        if let Some(name) = engine_name {
            job.name = name;
        }
        if job.info_hash.is_none() {
            job.info_hash = engine_hash;
        }
        job.total_size = if stats.length > 0 {
            stats.length
        } else {
            job.files.iter().map(|f| f.size).sum()
        };
        tracing::info!(job_id, files = job.files.len(), "metadata resolved");

        match job.selected_indices.clone() {
            Some(indices) => {
                // A selection existed before metadata (preselected at submit
                // or restored from the snapshot): reapply it immediately.
                if let Err(e) = self.apply_selection(job_id, indices).await {
                    tracing::warn!(job_id, "stored selection unusable ({e}), asking again");
                    self.enter_awaiting_selection(job_id).await;
                }
            }
            None => self.enter_awaiting_selection(job_id).await,
        }
    }

    /// No selection exists: deselect everything at the engine so nothing is
    /// transferred while a consumer decides, free the slot, and announce the
    /// resolved file list.
    async fn enter_awaiting_selection(&mut self, job_id: JobId) {
        let Some(job) = self.jobs.get(&job_id) else {
            return;
        };
        let file_count = job.files.len();
        if let Some(handle) = self.handles.get(&job_id) {
            for index in 0..file_count {
                handle.set_file_selected(index, false);
            }
        }

        let job = self.jobs.get_mut(&job_id).expect("job present");
        job.selected_indices = None;
        for file in job.files.iter_mut() {
            file.selected = false;
        }
        job.status = JobStatus::AwaitingSelection;
        job.clear_transfer_stats();
        tracing::info!(job_id, "awaiting file selection");

        let job = job.clone();
        self.notifier.emit(Notification::SelectionNeeded {
            job_id,
            name: job.name.clone(),
            files: job.files.clone(),
        });
        self.notify_status(&job);
        self.persist().await;
        // Awaiting-selection holds no slot; let the next queued job in.
        self.process_queue().await;
    }

    /// Applies a selection to a job with resolved metadata and a live engine
    /// handle: files already complete on disk are reported selected but not
    /// re-fetched; if nothing needs transferring the job completes without
    /// transferring a byte.
    pub(super) async fn apply_selection(
        &mut self,
        job_id: JobId,
        indices: Vec<usize>,
    ) -> Result<(), QueueError> {
        if indices.is_empty() {
            return Err(QueueError::EmptySelection);
        }
        let Some(job) = self.jobs.get(&job_id) else {
            return Err(QueueError::NotFound(job_id));
        };
        let plan = selection::plan(&job.files, &indices, &job.download_path).await?;
        let file_count = job.files.len();

        if let Some(handle) = self.handles.get(&job_id) {
            for index in 0..file_count {
                handle.set_file_selected(index, plan.transfer.contains(&index));
            }
        }

        let job = self.jobs.get_mut(&job_id).expect("job present");
        let mut sorted = indices;
        sorted.sort_unstable();
        sorted.dedup();
        job.selected_indices = Some(sorted);
        job.apply_selected_flags();
        for &index in &plan.satisfied {
            job.files[index].downloaded = job.files[index].size;
        }
        let (downloaded, total) = job.selected_totals();
        job.downloaded = downloaded;
        job.total_size = total;

        if plan.transfer.is_empty() {
            // Everything requested is already on disk.
            tracing::info!(job_id, "selection already satisfied on disk");
            self.complete_job(job_id, false).await;
        } else {
            job.status = JobStatus::Downloading;
            tracing::info!(
                job_id,
                transfer = plan.transfer.len(),
                satisfied = plan.satisfied.len(),
                "selection applied"
            );
            let job = job.clone();
            self.notify_status(&job);
            self.persist().await;
        }
        Ok(())
    }

    /// Explicit selection from a consumer; only legal while the job is
    /// parked awaiting one.
    pub(super) async fn select_files(
        &mut self,
        job_id: JobId,
        indices: Vec<usize>,
    ) -> Result<(), QueueError> {
        let job = self.jobs.get(&job_id).ok_or(QueueError::NotFound(job_id))?;
        if job.status != JobStatus::AwaitingSelection {
            return Err(QueueError::InvalidState {
                status: job.status,
                op: "select files for",
            });
        }
        self.apply_selection(job_id, indices).await
    }

    /// Merges additional file indices into a job's selection. With a live
    /// engine handle the additions are simply selected in place; a job whose
    /// handle is gone is requeued from scratch with the enlarged selection.
    pub(super) async fn add_more_files(
        &mut self,
        job_id: JobId,
        indices: Vec<usize>,
    ) -> Result<(), QueueError> {
        let Some(job) = self.jobs.get(&job_id) else {
            return Err(QueueError::NotFound(job_id));
        };
        if !job.files.is_empty() {
            selection::validate_indices(&indices, job.files.len())?;
        }
        let merged = selection::merge_indices(job.selected_indices.as_deref(), &indices);

        match job.status {
            // No selection applied yet; this is just a selection.
            JobStatus::AwaitingSelection => self.apply_selection(job_id, merged).await,

            JobStatus::Downloading | JobStatus::Seeding => {
                if let Some(handle) = self.handles.get(&job_id) {
                    for &index in &indices {
                        handle.set_file_selected(index, true);
                    }
                }
                let job = self.jobs.get_mut(&job_id).expect("job present");
                job.selected_indices = Some(merged);
                job.apply_selected_flags();
                let went_back_to_downloading = job.status == JobStatus::Seeding;
                if went_back_to_downloading {
                    // New data to fetch; the engine resumes transferring.
                    job.status = JobStatus::Downloading;
                    job.completed_at = None;
                }
                tracing::info!(job_id, added = indices.len(), "files added to live job");
                let job = job.clone();
                if went_back_to_downloading {
                    self.notify_status(&job);
                }
                self.persist().await;
                Ok(())
            }

            // Not started yet (possibly metadata still unknown): remember
            // the enlarged selection for when metadata arrives.
            JobStatus::Queued => {
                let job = self.jobs.get_mut(&job_id).expect("job present");
                job.selected_indices = Some(merged);
                job.apply_selected_flags();
                self.persist().await;
                Ok(())
            }

            // Engine job already torn down: restart from scratch with the
            // enlarged selection.
            JobStatus::Paused | JobStatus::Completed | JobStatus::Error => {
                let job = self.jobs.get_mut(&job_id).expect("job present");
                job.selected_indices = Some(merged);
                job.apply_selected_flags();
                job.status = JobStatus::Queued;
                job.error = None;
                job.completed_at = None;
                job.clear_transfer_stats();
                tracing::info!(job_id, "requeued with enlarged selection");
                let job = job.clone();
                self.notify_status(&job);
                self.persist().await;
                self.process_queue().await;
                Ok(())
            }
        }
    }
}
