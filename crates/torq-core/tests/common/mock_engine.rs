//! Scripted in-memory transfer engine for orchestrator tests.
//!
//! Tests drive it directly: resolve metadata, move per-file byte counters,
//! report completion or failure. Every engine-side effect (start order,
//! per-file selection, handle teardown) is recorded for assertions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use torq_core::engine::{
    EngineEvent, EngineEventKind, EngineFile, EngineHandle, EngineStats, TransferEngine,
};
use torq_core::job::JobId;

/// Engine-side state of one started job.
#[derive(Default)]
pub struct MockJobState {
    pub source: String,
    pub dest: PathBuf,
    pub name: Option<String>,
    pub stats: EngineStats,
    pub files: Vec<EngineFile>,
    /// Per-file selection as last set by the orchestrator.
    pub selected: Vec<bool>,
    pub destroyed: bool,
    events: Option<mpsc::Sender<EngineEvent>>,
}

#[derive(Default)]
pub struct MockEngine {
    jobs: Mutex<HashMap<JobId, Arc<Mutex<MockJobState>>>>,
    start_order: Mutex<Vec<JobId>>,
    fail_next_start: Mutex<Option<String>>,
    rate_limits: Mutex<(u64, u64)>,
}

pub struct MockHandle {
    state: Arc<Mutex<MockJobState>>,
}

/// Shorthand for building an engine file entry.
pub fn file(name: &str, length: u64) -> EngineFile {
    EngineFile {
        name: name.to_string(),
        path: PathBuf::from(name),
        length,
        downloaded: 0,
    }
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self, job_id: JobId) -> Arc<Mutex<MockJobState>> {
        self.jobs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .unwrap_or_else(|| panic!("engine never started job {job_id}"))
    }

    /// Makes the next `start` call fail with the given message.
    pub fn fail_next_start(&self, message: &str) {
        *self.fail_next_start.lock().unwrap() = Some(message.to_string());
    }

    /// Order in which jobs were handed to the engine.
    pub fn start_order(&self) -> Vec<JobId> {
        self.start_order.lock().unwrap().clone()
    }

    /// Source string and destination directory a job was started with.
    pub fn started_with(&self, job_id: JobId) -> (String, PathBuf) {
        let state = self.state(job_id);
        let state = state.lock().unwrap();
        (state.source.clone(), state.dest.clone())
    }

    pub fn was_started(&self, job_id: JobId) -> bool {
        self.jobs.lock().unwrap().contains_key(&job_id)
    }

    pub fn destroyed(&self, job_id: JobId) -> bool {
        self.state(job_id).lock().unwrap().destroyed
    }

    pub fn selected_flags(&self, job_id: JobId) -> Vec<bool> {
        self.state(job_id).lock().unwrap().selected.clone()
    }

    pub fn rate_limits(&self) -> (u64, u64) {
        *self.rate_limits.lock().unwrap()
    }

    async fn emit(&self, job_id: JobId, kind: EngineEventKind) {
        let events = self
            .state(job_id)
            .lock()
            .unwrap()
            .events
            .clone()
            .expect("job has an event channel");
        events
            .send(EngineEvent { job_id, kind })
            .await
            .expect("orchestrator event channel open");
    }

    /// Resolves metadata: installs the file list and total length, then
    /// fires the metadata event.
    pub async fn resolve_metadata(&self, job_id: JobId, name: &str, files: Vec<EngineFile>) {
        {
            let state = self.state(job_id);
            let mut state = state.lock().unwrap();
            state.name = Some(name.to_string());
            state.selected = vec![true; files.len()];
            state.stats.length = files.iter().map(|f| f.length).sum();
            state.files = files;
        }
        self.emit(job_id, EngineEventKind::Metadata).await;
    }

    /// Marks every file fully downloaded and fires the done event.
    pub async fn finish(&self, job_id: JobId) {
        {
            let state = self.state(job_id);
            let mut state = state.lock().unwrap();
            for f in state.files.iter_mut() {
                f.downloaded = f.length;
            }
            state.stats.downloaded = state.stats.length;
            state.stats.download_speed = 0;
        }
        self.emit(job_id, EngineEventKind::Done).await;
    }

    pub async fn fail(&self, job_id: JobId, message: &str) {
        self.emit(job_id, EngineEventKind::Error(message.to_string()))
            .await;
    }

    /// Advances one file's byte counter (and the whole-job counter to the
    /// sum of files).
    pub fn advance_file(&self, job_id: JobId, index: usize, downloaded: u64) {
        let state = self.state(job_id);
        let mut state = state.lock().unwrap();
        state.files[index].downloaded = downloaded;
        state.stats.downloaded = state.files.iter().map(|f| f.downloaded).sum();
    }

    pub fn set_stats(&self, job_id: JobId, stats: EngineStats) {
        self.state(job_id).lock().unwrap().stats = stats;
    }
}

impl TransferEngine for MockEngine {
    fn start(
        &self,
        job_id: JobId,
        source: &str,
        dest: &Path,
        events: mpsc::Sender<EngineEvent>,
    ) -> anyhow::Result<Box<dyn EngineHandle>> {
        if let Some(message) = self.fail_next_start.lock().unwrap().take() {
            anyhow::bail!("{message}");
        }
        let state = Arc::new(Mutex::new(MockJobState {
            source: source.to_string(),
            dest: dest.to_path_buf(),
            events: Some(events),
            ..Default::default()
        }));
        self.jobs.lock().unwrap().insert(job_id, Arc::clone(&state));
        self.start_order.lock().unwrap().push(job_id);
        Ok(Box::new(MockHandle { state }))
    }

    fn set_rate_limits(&self, max_download: u64, max_upload: u64) {
        *self.rate_limits.lock().unwrap() = (max_download, max_upload);
    }
}

impl EngineHandle for MockHandle {
    fn name(&self) -> Option<String> {
        self.state.lock().unwrap().name.clone()
    }

    fn info_hash(&self) -> Option<String> {
        None
    }

    fn stats(&self) -> EngineStats {
        self.state.lock().unwrap().stats
    }

    fn files(&self) -> Vec<EngineFile> {
        self.state.lock().unwrap().files.clone()
    }

    fn set_file_selected(&self, index: usize, selected: bool) {
        let mut state = self.state.lock().unwrap();
        if index < state.selected.len() {
            state.selected[index] = selected;
        }
    }

    fn destroy(&self) {
        let mut state = self.state.lock().unwrap();
        state.destroyed = true;
        state.events = None;
    }
}
