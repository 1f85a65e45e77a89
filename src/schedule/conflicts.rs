//! Resource conflict detection over a proposed schedule.
//!
//! Cross-references time-boxed task windows against per-person weekly
//! capacity. Detection only: re-leveling an overallocated week is left to the
//! caller.

use crate::error::EngineError;
use crate::model::{
    PersonId, ScheduledWindow, TaskId, TeamCapacity, WeekendPreference, iso_week_start,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One task placed on the calendar for one person. `total_hours` is the
/// task's fused estimate; it is pro-rated across the ISO weeks the window
/// spans.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScheduleEntry {
    pub task_id: TaskId,
    pub assignee: PersonId,
    pub window: ScheduledWindow,
    pub total_hours: f64,
}

/// Why a (person, week) pair was flagged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ConflictKind {
    /// Committed hours exceed the person's weekly capacity.
    Overallocation { overallocated_hours: f64 },
    /// A task window touches a weekend against a `none` weekend preference.
    WeekendViolation { task_id: TaskId },
}

/// A detected conflict for one person in one ISO week.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResourceConflict {
    pub person: PersonId,
    /// Monday of the ISO week the conflict falls in.
    pub week_start: NaiveDate,
    pub kind: ConflictKind,
}

/// Flag overallocated weeks and weekend-preference violations.
///
/// For each person and ISO week, hours are summed across all tasks whose
/// window intersects that week, pro-rated by the fraction of the task's
/// calendar days falling in the week. Fails with
/// [`EngineError::UnknownAssignee`] when an entry names a person with no
/// capacity record.
pub fn detect_resource_conflicts(
    schedule: &[ScheduleEntry],
    capacities: &[TeamCapacity],
) -> Result<Vec<ResourceConflict>, EngineError> {
    let capacity_by_person: BTreeMap<&str, &TeamCapacity> = capacities
        .iter()
        .map(|c| (c.person.as_str(), c))
        .collect();

    let mut sorted: Vec<&ScheduleEntry> = schedule.iter().collect();
    sorted.sort_by(|a, b| a.assignee.cmp(&b.assignee).then(a.task_id.cmp(&b.task_id)));

    let mut weekly_hours: BTreeMap<(PersonId, NaiveDate), f64> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for entry in &sorted {
        let capacity = capacity_by_person
            .get(entry.assignee.as_str())
            .ok_or_else(|| EngineError::UnknownAssignee {
                task_id: entry.task_id,
                person: entry.assignee.clone(),
            })?;

        for (week, fraction) in week_fractions(&entry.window) {
            *weekly_hours
                .entry((entry.assignee.clone(), week))
                .or_insert(0.0) += entry.total_hours * fraction;
        }

        if capacity.weekend_preference == WeekendPreference::None
            && entry.window.touches_weekend()
        {
            conflicts.push(ResourceConflict {
                person: entry.assignee.clone(),
                week_start: iso_week_start(entry.window.start),
                kind: ConflictKind::WeekendViolation {
                    task_id: entry.task_id,
                },
            });
        }
    }

    for ((person, week_start), hours) in &weekly_hours {
        let available = capacity_by_person[person.as_str()].available_hours_per_week;
        if *hours > available {
            conflicts.push(ResourceConflict {
                person: person.clone(),
                week_start: *week_start,
                kind: ConflictKind::Overallocation {
                    overallocated_hours: hours - available,
                },
            });
        }
    }

    conflicts.sort_by(|a, b| a.person.cmp(&b.person).then(a.week_start.cmp(&b.week_start)));
    debug!(conflicts = conflicts.len(), "resource conflict scan complete");
    Ok(conflicts)
}

/// Fraction of a window's calendar days falling into each ISO week it spans.
fn week_fractions(window: &ScheduledWindow) -> Vec<(NaiveDate, f64)> {
    let total_days = window.num_days() as f64;
    let mut per_week: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for day in window.days() {
        *per_week.entry(iso_week_start(day)).or_insert(0) += 1;
    }
    per_week
        .into_iter()
        .map(|(week, days)| (week, days as f64 / total_days))
        .collect()
}
