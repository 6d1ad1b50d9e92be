//! `torq remove <id>` – drop a job, optionally deleting its data.

use anyhow::Result;

use torq_core::job::JobId;
use torq_core::snapshot::JobStore;

pub async fn run_remove(store: &JobStore, id: JobId, delete_data: bool) -> Result<()> {
    let mut jobs = store.load().await?;
    let Some(position) = jobs.iter().position(|j| j.id == id) else {
        anyhow::bail!("no job with id {id}");
    };

    let job = jobs.remove(position);
    if delete_data {
        if let Err(e) = job.delete_payload().await {
            tracing::warn!(job_id = id, "payload deletion incomplete: {e}");
            eprintln!("warning: some files could not be deleted: {e}");
        }
    }
    store.save(&jobs).await?;
    println!("Removed job {id}");
    Ok(())
}
