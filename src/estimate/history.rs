//! Estimation learning loop.
//!
//! Once a task completes with actual hours recorded, each estimate is scored
//! for accuracy and appended to the estimation history. These are pure
//! functions producing append-only audit records; earlier fused estimates are
//! never rewritten.

use crate::model::{EstimationHistoryEntry, EstimationMethod, FinalEstimate, TaskEstimate};
use chrono::Utc;
use std::collections::BTreeMap;

/// Accuracy score: `1 - |estimated - actual| / actual`, clamped to [0, 1].
/// Zero actual hours score 0 (nothing meaningful was predicted against).
pub fn accuracy_score(estimated_hours: f64, actual_hours: f64) -> f64 {
    if actual_hours == 0.0 {
        return 0.0;
    }
    (1.0 - (estimated_hours - actual_hours).abs() / actual_hours).clamp(0.0, 1.0)
}

/// Score a fused estimate against recorded actuals.
pub fn record_actual(estimate: &FinalEstimate, actual_hours: f64) -> EstimationHistoryEntry {
    EstimationHistoryEntry {
        task_id: estimate.task_id,
        method: None,
        estimated_hours: estimate.hours,
        actual_hours,
        accuracy_score: accuracy_score(estimate.hours, actual_hours),
        recorded_at: Utc::now(),
    }
}

/// Score each method's latest estimate against recorded actuals, one history
/// entry per method in canonical order.
pub fn record_method_actuals(
    estimates: &[TaskEstimate],
    actual_hours: f64,
) -> Vec<EstimationHistoryEntry> {
    let mut latest: BTreeMap<EstimationMethod, &TaskEstimate> = BTreeMap::new();
    for estimate in estimates {
        match latest.get(&estimate.method) {
            Some(current) if current.created_at > estimate.created_at => {}
            _ => {
                latest.insert(estimate.method, estimate);
            }
        }
    }

    EstimationMethod::ALL
        .iter()
        .filter_map(|method| latest.get(method))
        .map(|estimate| EstimationHistoryEntry {
            task_id: estimate.task_id,
            method: Some(estimate.method),
            estimated_hours: estimate.estimated_hours,
            actual_hours,
            accuracy_score: accuracy_score(estimate.estimated_hours, actual_hours),
            recorded_at: Utc::now(),
        })
        .collect()
}
