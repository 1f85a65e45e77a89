//! Typed error conditions for the scheduling engine.
//!
//! Every variant is a local, recoverable condition returned to the caller as
//! a structured result; none should crash the process. A violated deadline is
//! deliberately *not* an error: it is a valid analysis outcome reported in
//! [`CriticalPathReport::violates_deadline`](crate::schedule::CriticalPathReport).

use crate::model::{EstimationMethod, TaskId};

/// Errors produced by graph construction, estimate fusion, and conflict
/// detection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The dependency relation contains a cycle. Carries the full cycle as an
    /// ordered list of task ids so callers can surface it instead of silently
    /// dropping edges.
    #[error("dependency cycle detected: {}", format_cycle(cycle))]
    CycleDetected { cycle: Vec<TaskId> },

    /// An edge or assignment names a task id that is not in the snapshot.
    #[error("unknown task reference {task_id} ({context})")]
    UnknownTaskReference {
        task_id: TaskId,
        context: &'static str,
    },

    /// Two dependency edges share the same ordered (predecessor, successor)
    /// pair.
    #[error("duplicate dependency {predecessor} -> {successor}")]
    DuplicateDependency {
        predecessor: TaskId,
        successor: TaskId,
    },

    /// The snapshot contains two tasks with the same id. Rejected before
    /// graph construction begins.
    #[error("duplicate task id {task_id} in snapshot")]
    DuplicateTask { task_id: TaskId },

    /// Fusion was requested for a task with zero method estimates.
    #[error("no estimates supplied; at least one method estimate is required")]
    InsufficientEstimates,

    /// An estimate carries a confidence score outside [0, 1].
    #[error("invalid confidence {confidence} for task {task_id} ({method:?})")]
    InvalidConfidence {
        task_id: TaskId,
        method: EstimationMethod,
        confidence: f64,
    },

    /// A scheduled task is assigned to a person with no capacity record.
    #[error("task {task_id} is assigned to '{person}' who has no capacity record")]
    UnknownAssignee { task_id: TaskId, person: String },
}

fn format_cycle(cycle: &[TaskId]) -> String {
    cycle
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
