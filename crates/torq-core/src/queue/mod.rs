//! Download queue orchestrator.
//!
//! One actor task owns the job table; caller commands, engine events, and
//! the periodic progress tick are serialized through its select loop, so no
//! two mutations ever interleave. Callers hold a cloneable [`QueueHandle`].

mod actor;
mod admit;
mod commands;
mod events;
mod handle;
mod progress;
mod select;

use std::sync::Arc;

pub use actor::Orchestrator;
pub use handle::{QueueHandle, SubmitRequest};

use crate::config::Settings;
use crate::engine::TransferEngine;
use crate::error::QueueError;
use crate::snapshot::JobStore;

/// Loads the persisted table, spawns the orchestrator task, and returns the
/// handle an embedding application talks to.
pub async fn start(
    engine: Arc<dyn TransferEngine>,
    store: JobStore,
    settings: Settings,
) -> Result<QueueHandle, QueueError> {
    let (orchestrator, handle) = Orchestrator::new(engine, store, settings).await?;
    tokio::spawn(orchestrator.run());
    Ok(handle)
}
