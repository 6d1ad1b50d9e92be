//! Selection planning: which of a job's files actually need transferring.
//!
//! A requested file whose destination already has the exact expected byte
//! length is treated as complete and is not fetched again. Byte-length
//! equality is the only completeness check here; there is no checksum.

use std::path::Path;

use crate::error::QueueError;
use crate::job::JobFile;

/// Outcome of planning a selection against the on-disk state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionPlan {
    /// Requested indices that must be fetched (missing or wrong size).
    pub transfer: Vec<usize>,
    /// Requested indices already complete on disk.
    pub satisfied: Vec<usize>,
}

impl SelectionPlan {
    /// True when every requested file is already on disk and nothing needs
    /// transferring.
    pub fn all_satisfied(&self) -> bool {
        self.transfer.is_empty() && !self.satisfied.is_empty()
    }
}

/// Rejects indices outside the resolved file list.
pub fn validate_indices(indices: &[usize], file_count: usize) -> Result<(), QueueError> {
    for &index in indices {
        if index >= file_count {
            return Err(QueueError::InvalidSelection { index, file_count });
        }
    }
    Ok(())
}

/// Sorted, deduplicated union of an existing selection and new indices.
pub fn merge_indices(existing: Option<&[usize]>, additional: &[usize]) -> Vec<usize> {
    let mut merged: Vec<usize> = existing.unwrap_or_default().to_vec();
    merged.extend_from_slice(additional);
    merged.sort_unstable();
    merged.dedup();
    merged
}

/// Splits requested indices into transfer vs already-satisfied by statting
/// each destination path under `download_path`.
pub async fn plan(
    files: &[JobFile],
    indices: &[usize],
    download_path: &Path,
) -> Result<SelectionPlan, QueueError> {
    validate_indices(indices, files.len())?;

    let mut plan = SelectionPlan::default();
    for &index in indices {
        let file = &files[index];
        let dest = download_path.join(&file.path);
        let on_disk = match tokio::fs::metadata(&dest).await {
            Ok(meta) if meta.is_file() => Some(meta.len()),
            _ => None,
        };
        if on_disk == Some(file.size) {
            tracing::debug!(path = %dest.display(), size = file.size, "file already complete, skipping");
            plan.satisfied.push(index);
        } else {
            plan.transfer.push(index);
        }
    }
    Ok(plan)
}
