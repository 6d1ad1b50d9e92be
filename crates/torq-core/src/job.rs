//! Job data model: the central entity tracked by the orchestrator.
//!
//! A job is one queued/active transfer. The orchestrator owns the table of
//! jobs; everything here is plain data plus small invariant helpers.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Job identifier. Assigned at submission, immutable, monotonically
/// increasing within one snapshot lineage.
pub type JobId = u64;

/// High-level job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Queued,
    Downloading,
    AwaitingSelection,
    Paused,
    Seeding,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::AwaitingSelection => "awaiting-selection",
            JobStatus::Paused => "paused",
            JobStatus::Seeding => "seeding",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// True while the job holds one concurrency slot.
    pub fn occupies_slot(self) -> bool {
        matches!(self, JobStatus::Downloading | JobStatus::Seeding)
    }

    /// True for the statuses that allow resubmitting the same source.
    pub fn is_settled(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Statuses that cannot survive a process restart: no engine handle can
    /// exist after a cold start, so these are coerced back to queued on load.
    pub fn clears_on_restart(self) -> bool {
        matches!(
            self,
            JobStatus::Downloading | JobStatus::Seeding | JobStatus::AwaitingSelection
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file inside a job, as resolved by the engine's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    /// Path relative to the job's download directory.
    pub path: String,
    pub name: String,
    pub size: u64,
    pub downloaded: u64,
    pub selected: bool,
}

/// One queued/active transfer unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Magnet-style URI or path to a local descriptor file. Immutable.
    pub source: String,
    /// Opaque caller-supplied correlation key; never interpreted here.
    #[serde(default)]
    pub owner_id: Option<String>,
    pub name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub info_hash: Option<String>,

    // Live counters; zero until the engine reports them.
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub downloaded: u64,
    #[serde(default)]
    pub uploaded: u64,
    #[serde(default)]
    pub download_speed: u64,
    #[serde(default)]
    pub upload_speed: u64,
    #[serde(default)]
    pub seeder_count: u32,
    #[serde(default)]
    pub ratio: f64,

    /// Empty until the engine resolves metadata.
    #[serde(default)]
    pub files: Vec<JobFile>,
    /// Explicit subset of `files` to fetch; `None` means "everything".
    /// Kept sorted and deduplicated.
    #[serde(default)]
    pub selected_indices: Option<Vec<usize>>,

    pub download_path: PathBuf,
    #[serde(default)]
    pub error: Option<String>,

    /// Unix seconds; `added_at` is the FIFO ordering key.
    pub added_at: i64,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
}

impl Job {
    /// Creates a freshly submitted job in the queued state.
    pub fn new(
        id: JobId,
        source: impl Into<String>,
        name: impl Into<String>,
        download_path: impl Into<PathBuf>,
    ) -> Self {
        Job {
            id,
            source: source.into(),
            owner_id: None,
            name: name.into(),
            status: JobStatus::Queued,
            info_hash: None,
            total_size: 0,
            downloaded: 0,
            uploaded: 0,
            download_speed: 0,
            upload_speed: 0,
            seeder_count: 0,
            ratio: 0.0,
            files: Vec::new(),
            selected_indices: None,
            download_path: download_path.into(),
            error: None,
            added_at: unix_timestamp(),
            started_at: None,
            completed_at: None,
        }
    }

    /// True while a selection is active and covers fewer than all files.
    /// Only meaningful once metadata has resolved.
    pub fn selection_is_partial(&self) -> bool {
        match &self.selected_indices {
            Some(sel) => !self.files.is_empty() && sel.len() < self.files.len(),
            None => false,
        }
    }

    /// `(downloaded, total)` summed over selected files only. Falls back to
    /// all files when no selection is active.
    pub fn selected_totals(&self) -> (u64, u64) {
        match &self.selected_indices {
            Some(sel) => sel
                .iter()
                .filter_map(|&i| self.files.get(i))
                .fold((0, 0), |(d, t), f| (d + f.downloaded, t + f.size)),
            None => self
                .files
                .iter()
                .fold((0, 0), |(d, t), f| (d + f.downloaded, t + f.size)),
        }
    }

    /// Re-derives `files[i].selected` from `selected_indices` so the two
    /// never disagree ("all true" when no selection is active).
    pub fn apply_selected_flags(&mut self) {
        match &self.selected_indices {
            Some(sel) => {
                for (i, f) in self.files.iter_mut().enumerate() {
                    f.selected = sel.contains(&i);
                }
            }
            None => {
                for f in self.files.iter_mut() {
                    f.selected = true;
                }
            }
        }
    }

    /// Zeroes the transient transfer stats. Called whenever transferring
    /// stops (pause, error, completion, restart recovery).
    pub fn clear_transfer_stats(&mut self) {
        self.download_speed = 0;
        self.upload_speed = 0;
        self.seeder_count = 0;
    }

    /// Absolute destination path of one of the job's files.
    pub fn file_dest(&self, file: &JobFile) -> PathBuf {
        self.download_path.join(&file.path)
    }

    /// Best-effort deletion of the job's known on-disk payload. Files that
    /// are already gone are ignored; the first real I/O error is returned.
    pub async fn delete_payload(&self) -> std::io::Result<()> {
        for file in &self.files {
            let dest = self.file_dest(file);
            match tokio::fs::remove_file(&dest).await {
                Ok(()) => tracing::debug!(path = %dest.display(), "deleted payload file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Finds a non-settled job with the given source, if any. Used to reject
/// duplicate submissions while the first job is still live.
pub fn find_active_duplicate<'a>(
    jobs: impl IntoIterator<Item = &'a Job>,
    source: &str,
) -> Option<&'a Job> {
    jobs.into_iter()
        .find(|j| j.source == source && !j.status.is_settled())
}

/// Current unix time in seconds.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_files(sizes: &[u64]) -> Job {
        let mut job = Job::new(1, "magnet:?xt=urn:btih:aa", "test", "/tmp/d");
        job.files = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| JobFile {
                path: format!("f{i}"),
                name: format!("f{i}"),
                size,
                downloaded: 0,
                selected: true,
            })
            .collect();
        job
    }

    #[test]
    fn status_string_forms() {
        assert_eq!(JobStatus::AwaitingSelection.as_str(), "awaiting-selection");
        assert_eq!(JobStatus::Queued.to_string(), "queued");
    }

    #[test]
    fn slot_occupancy_is_downloading_or_seeding_only() {
        assert!(JobStatus::Downloading.occupies_slot());
        assert!(JobStatus::Seeding.occupies_slot());
        for s in [
            JobStatus::Queued,
            JobStatus::AwaitingSelection,
            JobStatus::Paused,
            JobStatus::Completed,
            JobStatus::Error,
        ] {
            assert!(!s.occupies_slot(), "{s} must not hold a slot");
        }
    }

    #[test]
    fn restart_coercion_covers_engine_backed_statuses() {
        assert!(JobStatus::Downloading.clears_on_restart());
        assert!(JobStatus::Seeding.clears_on_restart());
        assert!(JobStatus::AwaitingSelection.clears_on_restart());
        assert!(!JobStatus::Paused.clears_on_restart());
        assert!(!JobStatus::Completed.clears_on_restart());
    }

    #[test]
    fn selected_totals_scope_to_selection() {
        let mut job = job_with_files(&[100, 200, 300]);
        job.files[1].downloaded = 50;
        job.files[2].downloaded = 300;

        let (d, t) = job.selected_totals();
        assert_eq!((d, t), (350, 600));

        job.selected_indices = Some(vec![1, 2]);
        let (d, t) = job.selected_totals();
        assert_eq!((d, t), (350, 500));

        job.selected_indices = Some(vec![0]);
        let (d, t) = job.selected_totals();
        assert_eq!((d, t), (0, 100));
    }

    #[test]
    fn selected_flags_follow_indices() {
        let mut job = job_with_files(&[10, 20, 30]);
        job.selected_indices = Some(vec![0, 2]);
        job.apply_selected_flags();
        assert!(job.files[0].selected);
        assert!(!job.files[1].selected);
        assert!(job.files[2].selected);

        job.selected_indices = None;
        job.apply_selected_flags();
        assert!(job.files.iter().all(|f| f.selected));
    }

    #[test]
    fn partial_selection_requires_resolved_files() {
        let mut job = Job::new(1, "magnet:?xt=urn:btih:aa", "x", "/tmp");
        job.selected_indices = Some(vec![0]);
        assert!(!job.selection_is_partial());

        let mut job = job_with_files(&[10, 20]);
        job.selected_indices = Some(vec![0]);
        assert!(job.selection_is_partial());
        job.selected_indices = Some(vec![0, 1]);
        assert!(!job.selection_is_partial());
    }

    #[test]
    fn duplicate_guard_ignores_settled_jobs() {
        let mut a = Job::new(1, "magnet:?xt=urn:btih:aa", "a", "/tmp");
        let b = Job::new(2, "magnet:?xt=urn:btih:bb", "b", "/tmp");
        let jobs = vec![a.clone(), b];
        assert!(find_active_duplicate(&jobs, "magnet:?xt=urn:btih:aa").is_some());
        assert!(find_active_duplicate(&jobs, "magnet:?xt=urn:btih:cc").is_none());

        a.status = JobStatus::Error;
        let jobs = vec![a];
        assert!(find_active_duplicate(&jobs, "magnet:?xt=urn:btih:aa").is_none());
    }
}
