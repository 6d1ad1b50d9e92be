//! Periodic progress aggregation over every job holding a slot.

use crate::job::JobId;
use crate::notify::Notification;

use super::actor::Orchestrator;

fn share_ratio(uploaded: u64, downloaded: u64) -> f64 {
    if downloaded == 0 {
        0.0
    } else {
        uploaded as f64 / downloaded as f64
    }
}

impl Orchestrator {
    /// One tick: pull live counters from each active engine handle, compute
    /// selection-aware progress, detect partial-selection completion, and
    /// emit one bulk progress notification.
    ///
    /// The engine only signals `done` for the whole content, so a job whose
    /// selection covers less than that must be completed from here: the tick
    /// is the only place selection-scoped byte counts are observed.
    pub(super) async fn refresh_progress(&mut self) {
        let active: Vec<JobId> = self
            .jobs
            .values()
            .filter(|j| j.status.occupies_slot() && self.handles.contains_key(&j.id))
            .map(|j| j.id)
            .collect();
        if active.is_empty() {
            return;
        }

        let mut refreshed = Vec::with_capacity(active.len());
        let mut selection_complete = Vec::new();

        for job_id in active {
            let handle = self.handles.get(&job_id).expect("handle present");
            let stats = handle.stats();
            let engine_files = handle.files();

            let job = self.jobs.get_mut(&job_id).expect("job present");
            job.download_speed = stats.download_speed;
            job.upload_speed = stats.upload_speed;
            job.uploaded = stats.uploaded;
            job.seeder_count = stats.num_peers;
            for (index, engine_file) in engine_files.iter().enumerate() {
                if let Some(file) = job.files.get_mut(index) {
                    file.downloaded = engine_file.downloaded.min(file.size);
                }
            }

            if job.selection_is_partial() {
                let (downloaded, total) = job.selected_totals();
                job.downloaded = downloaded;
                job.total_size = total;
                if total > 0 && downloaded >= total {
                    selection_complete.push(job_id);
                }
            } else {
                job.downloaded = stats.downloaded;
                if stats.length > 0 {
                    job.total_size = stats.length;
                }
                if job.total_size > 0 && job.downloaded > job.total_size {
                    job.downloaded = job.total_size;
                }
            }
            job.ratio = share_ratio(job.uploaded, job.downloaded);
            refreshed.push(job.clone());
        }

        for job_id in selection_complete {
            tracing::info!(job_id, "selected files complete");
            self.complete_job(job_id, false).await;
        }

        self.notifier.emit(Notification::Progress { jobs: refreshed });
        self.persist().await;
    }
}

#[cfg(test)]
mod tests {
    use super::share_ratio;

    #[test]
    fn ratio_is_zero_before_any_download() {
        assert_eq!(share_ratio(500, 0), 0.0);
    }

    #[test]
    fn ratio_is_uploaded_over_downloaded() {
        assert!((share_ratio(50, 100) - 0.5).abs() < f64::EPSILON);
        assert!((share_ratio(300, 100) - 3.0).abs() < f64::EPSILON);
    }
}
