//! `torq status` – show all jobs in the queue.

use anyhow::Result;

use torq_core::job::Job;
use torq_core::snapshot::JobStore;

fn progress_column(job: &Job) -> String {
    if job.total_size == 0 {
        return "-".to_string();
    }
    let percent = (job.downloaded as f64 / job.total_size as f64 * 100.0).min(100.0);
    format!("{percent:.0}%")
}

pub async fn run_status(store: &JobStore) -> Result<()> {
    let jobs = store.load().await?;
    if jobs.is_empty() {
        println!("No jobs in queue.");
        return Ok(());
    }

    println!(
        "{:<6} {:<19} {:<6} {:<28} {}",
        "ID", "STATUS", "DONE", "NAME", "SOURCE"
    );
    for job in jobs {
        println!(
            "{:<6} {:<19} {:<6} {:<28} {}",
            job.id,
            job.status.as_str(),
            progress_column(&job),
            job.name,
            job.source
        );
    }
    Ok(())
}
