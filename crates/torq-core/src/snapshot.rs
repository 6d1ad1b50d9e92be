//! Persistent job-table snapshot.
//!
//! The whole table is written as one JSON document after every mutation
//! (write-through). Writes go to a temp file in the same directory and are
//! renamed into place so a hard kill leaves either the old or the new
//! snapshot, never a torn one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobId, JobStatus};

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    jobs: Vec<Job>,
}

/// Store for the job table: one snapshot file.
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    /// Store at the default XDG state location (`~/.local/state/torq/jobs.json`).
    pub fn open_default() -> Result<Self> {
        let state_dir = xdg::BaseDirectories::with_prefix("torq")?.get_state_home();
        std::fs::create_dir_all(&state_dir)?;
        Ok(JobStore {
            path: state_dir.join("jobs.json"),
        })
    }

    /// Store at an explicit path. Parent directories are created on save.
    pub fn open_at(path: impl Into<PathBuf>) -> Self {
        JobStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the job table. A missing file is an empty table. Jobs that were
    /// mid-transfer when the process died (`downloading`, `seeding`,
    /// `awaiting-selection`) are coerced back to `queued`: no engine handle
    /// can exist after a cold start.
    pub async fn load(&self) -> Result<Vec<Job>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("read snapshot {}", self.path.display()))
            }
        };
        let snapshot: Snapshot = serde_json::from_slice(&data)
            .with_context(|| format!("parse snapshot {}", self.path.display()))?;

        let mut jobs = snapshot.jobs;
        for job in jobs.iter_mut() {
            if job.status.clears_on_restart() {
                tracing::info!(job_id = job.id, from = %job.status, "recovered job to queued");
                job.status = JobStatus::Queued;
            }
            job.clear_transfer_stats();
            job.apply_selected_flags();
        }
        Ok(jobs)
    }

    /// Writes the full table. Transient speed fields are zeroed in the
    /// written copy; in-memory jobs are left untouched.
    pub async fn save(&self, jobs: &[Job]) -> Result<()> {
        let mut jobs = jobs.to_vec();
        for job in jobs.iter_mut() {
            job.clear_transfer_stats();
        }
        let data = serde_json::to_vec_pretty(&Snapshot { jobs })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data)
            .await
            .with_context(|| format!("write snapshot temp {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace snapshot {}", self.path.display()))?;
        Ok(())
    }
}

/// Next id to assign after loading a snapshot.
pub fn next_job_id(jobs: &[Job]) -> JobId {
    jobs.iter().map(|j| j.id).max().map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobFile;

    fn store_in(dir: &tempfile::TempDir) -> JobStore {
        JobStore::open_at(dir.path().join("jobs.json"))
    }

    #[tokio::test]
    async fn missing_snapshot_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = store_in(&dir).load().await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut job = Job::new(1, "magnet:?xt=urn:btih:aa", "one", "/downloads");
        job.info_hash = Some("aa".into());
        job.total_size = 300;
        job.files = vec![JobFile {
            path: "a.bin".into(),
            name: "a.bin".into(),
            size: 300,
            downloaded: 120,
            selected: true,
        }];
        store.save(&[job.clone()]).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 1);
        assert_eq!(loaded[0].source, job.source);
        assert_eq!(loaded[0].total_size, 300);
        assert_eq!(loaded[0].files.len(), 1);
        assert_eq!(loaded[0].files[0].downloaded, 120);
    }

    #[tokio::test]
    async fn active_statuses_are_coerced_to_queued_with_zero_speeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut downloading = Job::new(1, "magnet:?xt=urn:btih:aa", "a", "/d");
        downloading.status = JobStatus::Downloading;
        downloading.download_speed = 9999;
        let mut awaiting = Job::new(2, "magnet:?xt=urn:btih:bb", "b", "/d");
        awaiting.status = JobStatus::AwaitingSelection;
        let mut seeding = Job::new(3, "magnet:?xt=urn:btih:cc", "c", "/d");
        seeding.status = JobStatus::Seeding;
        let mut paused = Job::new(4, "magnet:?xt=urn:btih:dd", "d", "/d");
        paused.status = JobStatus::Paused;

        store
            .save(&[downloading, awaiting, seeding, paused])
            .await
            .unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded[0].status, JobStatus::Queued);
        assert_eq!(loaded[1].status, JobStatus::Queued);
        assert_eq!(loaded[2].status, JobStatus::Queued);
        assert_eq!(loaded[3].status, JobStatus::Paused);
        assert!(loaded.iter().all(|j| j.download_speed == 0));
        assert!(loaded.iter().all(|j| j.upload_speed == 0));
    }

    #[tokio::test]
    async fn speeds_are_zeroed_in_the_written_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut job = Job::new(1, "magnet:?xt=urn:btih:aa", "a", "/d");
        job.status = JobStatus::Paused;
        job.download_speed = 1234;
        job.seeder_count = 5;
        store.save(&[job]).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["jobs"][0]["download_speed"], 0);
        assert_eq!(value["jobs"][0]["seeder_count"], 0);
    }

    #[tokio::test]
    async fn next_id_resumes_after_the_highest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(next_job_id(&[]), 1);

        let jobs = vec![
            Job::new(3, "magnet:?xt=urn:btih:aa", "a", "/d"),
            Job::new(7, "magnet:?xt=urn:btih:bb", "b", "/d"),
        ];
        store.save(&jobs).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(next_job_id(&loaded), 8);
    }
}
