//! `torq add <source>` – queue a new transfer.

use anyhow::Result;
use std::path::PathBuf;

use torq_core::job::{find_active_duplicate, Job};
use torq_core::snapshot::{next_job_id, JobStore};
use torq_core::source;

pub async fn run_add(
    store: &JobStore,
    src: &str,
    download_dir: Option<PathBuf>,
    name: Option<String>,
    owner: Option<String>,
    files: Option<Vec<usize>>,
) -> Result<()> {
    let mut jobs = store.load().await?;
    if let Some(existing) = find_active_duplicate(&jobs, src) {
        anyhow::bail!("job {} already tracks this source", existing.id);
    }

    let download_dir = match download_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let id = next_job_id(&jobs);
    let mut job = Job::new(id, src, source::initial_name(src, name.as_deref()), download_dir);
    job.owner_id = owner;
    if let Some(mut indices) = files {
        indices.sort_unstable();
        indices.dedup();
        job.selected_indices = Some(indices);
    }

    jobs.push(job);
    store.save(&jobs).await?;
    println!("Added job {id} for {src}");
    Ok(())
}
