//! Weekly capacity allocation.
//!
//! Spreads a task's fused hours across the ISO weeks its scheduled window
//! spans, weighting days by the assignee's weekend preference, and reports
//! per-week utilization against the person's *total* committed hours that
//! week. The caller must pass the person's full existing allocation set;
//! allocating task-by-task in isolation would undercount utilization.

use crate::model::{
    CapacityAllocation, FinalEstimate, ScheduledWindow, TeamCapacity, WeekendPreference,
    iso_week_start,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Produce one [`CapacityAllocation`] row per ISO week of the window.
///
/// Day weighting: weekdays 1.0; Saturday/Sunday 0.0 under `none` (those hours
/// are redistributed to the window's weekdays), 0.5 under `light`, 1.0 under
/// `full`. A window consisting solely of skipped weekend days falls back to
/// uniform weighting, since the hours have nowhere else to go.
pub fn allocate_capacity(
    estimate: &FinalEstimate,
    window: &ScheduledWindow,
    capacity: &TeamCapacity,
    existing_allocations: &[CapacityAllocation],
) -> Vec<CapacityAllocation> {
    let days: Vec<NaiveDate> = window.days().collect();
    let mut weights: Vec<f64> = days
        .iter()
        .map(|&day| capacity.weekend_preference.day_weight(day))
        .collect();

    let total_weight: f64 = weights.iter().sum();
    if total_weight == 0.0 {
        warn!(
            task_id = %estimate.task_id,
            person = %capacity.person,
            "window is all skipped weekend days; falling back to uniform spread"
        );
        weights = vec![1.0; days.len()];
    }
    let total_weight: f64 = weights.iter().sum();

    // Hours committed by this person in each week before this task.
    let mut committed: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for allocation in existing_allocations {
        if allocation.person == capacity.person {
            *committed.entry(allocation.week_start).or_insert(0.0) += allocation.allocated_hours;
        }
    }

    let mut per_week: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (day, weight) in days.iter().zip(&weights) {
        if *weight == 0.0 {
            continue;
        }
        let share = estimate.hours * weight / total_weight;
        *per_week.entry(iso_week_start(*day)).or_insert(0.0) += share;
    }

    let allocations: Vec<CapacityAllocation> = per_week
        .into_iter()
        .map(|(week_start, allocated_hours)| {
            let already = committed.get(&week_start).copied().unwrap_or(0.0);
            let utilization_rate = if capacity.available_hours_per_week > 0.0 {
                (already + allocated_hours) / capacity.available_hours_per_week
            } else {
                0.0
            };
            CapacityAllocation {
                person: capacity.person.clone(),
                task_id: estimate.task_id,
                week_start,
                allocated_hours,
                utilization_rate,
            }
        })
        .collect();

    debug!(
        task_id = %estimate.task_id,
        person = %capacity.person,
        weeks = allocations.len(),
        "allocated capacity"
    );
    allocations
}
