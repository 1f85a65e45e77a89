use crate::model::TaskId;
use serde::{Deserialize, Serialize};

/// The four standard precedence relationships between two tasks.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DependencyType {
    /// Successor may start once the predecessor finishes (the common case).
    FinishToStart,
    /// Successor may start once the predecessor starts.
    StartToStart,
    /// Successor may finish once the predecessor finishes.
    FinishToFinish,
    /// Successor may finish once the predecessor starts.
    StartToFinish,
}

/// A typed, weighted edge in the dependency relation.
///
/// `lag_hours` is a signed offset on top of the base constraint: positive
/// values delay the successor, negative values are lead time. Whether a
/// negative lag is actually satisfiable is checked by the critical-path pass,
/// not at edge level.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaskDependency {
    pub predecessor: TaskId,
    pub successor: TaskId,
    pub dependency_type: DependencyType,
    pub lag_hours: f64,
}

impl TaskDependency {
    /// A finish-to-start edge with no lag.
    pub fn finish_to_start(predecessor: TaskId, successor: TaskId) -> Self {
        Self {
            predecessor,
            successor,
            dependency_type: DependencyType::FinishToStart,
            lag_hours: 0.0,
        }
    }

    /// Same edge with a lag (or lead, if negative) applied.
    pub fn with_lag(mut self, lag_hours: f64) -> Self {
        self.lag_hours = lag_hours;
        self
    }
}
