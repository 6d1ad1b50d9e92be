//! `torq resume <id>` – requeue a paused or errored job.

use anyhow::Result;

use torq_core::job::{JobId, JobStatus};
use torq_core::snapshot::JobStore;

pub async fn run_resume(store: &JobStore, id: JobId) -> Result<()> {
    let mut jobs = store.load().await?;
    let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
        anyhow::bail!("no job with id {id}");
    };
    if !matches!(job.status, JobStatus::Paused | JobStatus::Error) {
        anyhow::bail!("cannot resume a job that is {}", job.status);
    }

    job.status = JobStatus::Queued;
    job.error = None;
    store.save(&jobs).await?;
    println!("Resumed job {id}");
    Ok(())
}
