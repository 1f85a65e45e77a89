//! Snapshot and estimate file loading.
//!
//! The CLI exchanges data as JSON files: a [`MilestoneSnapshot`] for
//! `analyze` and a flat array of [`TaskEstimate`] records for `fuse`.

use crate::analysis::MilestoneSnapshot;
use crate::model::TaskEstimate;
use std::path::Path;
use tracing::debug;

/// Load a milestone snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<MilestoneSnapshot, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: MilestoneSnapshot = serde_json::from_str(&content)?;
    debug!(
        path = %path.display(),
        tasks = snapshot.tasks.len(),
        "loaded milestone snapshot"
    );
    Ok(snapshot)
}

/// Load a flat list of method estimates from a JSON file.
pub fn load_estimates(path: &Path) -> Result<Vec<TaskEstimate>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let estimates: Vec<TaskEstimate> = serde_json::from_str(&content)?;
    debug!(
        path = %path.display(),
        estimates = estimates.len(),
        "loaded task estimates"
    );
    Ok(estimates)
}
