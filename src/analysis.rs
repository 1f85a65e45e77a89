//! Milestone-level orchestration.
//!
//! Chains the individual passes (estimate fusion, graph construction,
//! critical path, parallel tracks, conflict detection, capacity allocation)
//! over one immutable milestone snapshot and returns a single report for the
//! caller to persist. The analyzer holds only configuration; every call is a
//! pure recomputation, so callers can safely re-run it on every edit and
//! across worker threads.

use crate::allocation::allocate_capacity;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::estimate::fuse_estimates;
use crate::graph::build_graph;
use crate::model::{
    CapacityAllocation, FinalEstimate, ScheduledWindow, Task, TaskDependency, TaskEstimate,
    TaskHierarchy, TaskId, TeamCapacity,
};
use crate::schedule::{
    CriticalPathReport, ResourceConflict, ScheduleEntry, Track, detect_parallel_tracks,
    detect_resource_conflicts,
};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Immutable input snapshot for one milestone: everything the engine needs,
/// as plain data. The caller assembles it from its own persistence layer.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MilestoneSnapshot {
    pub tasks: Vec<Task>,
    pub dependencies: Vec<TaskDependency>,
    pub estimates: Vec<TaskEstimate>,
    pub capacities: Vec<TeamCapacity>,
    /// Calendar date the project timeline's day 0 maps to.
    pub schedule_start: NaiveDate,
}

/// Everything the engine derives from one snapshot.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MilestoneAnalysis {
    pub final_estimates: BTreeMap<TaskId, FinalEstimate>,
    pub critical_path: CriticalPathReport,
    pub tracks: Vec<Track>,
    pub conflicts: Vec<ResourceConflict>,
    pub allocations: Vec<CapacityAllocation>,
    /// Total fused hours under each root of the task hierarchy.
    pub rollup_hours: BTreeMap<TaskId, f64>,
}

/// Stateless facade running the full pipeline for one milestone.
pub struct MilestoneAnalyzer {
    config: EngineConfig,
}

impl MilestoneAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run fusion, graph validation, critical path, track detection,
    /// conflict detection, and capacity allocation over one snapshot.
    pub fn analyze(&self, snapshot: &MilestoneSnapshot) -> Result<MilestoneAnalysis, EngineError> {
        info!(
            tasks = snapshot.tasks.len(),
            dependencies = snapshot.dependencies.len(),
            estimates = snapshot.estimates.len(),
            "analyzing milestone snapshot"
        );

        let hierarchy = TaskHierarchy::from_tasks(&snapshot.tasks)?;

        // Fuse per task. Tasks without estimates stay unestimated; the
        // critical-path pass flags them rather than failing.
        let mut estimates_by_task: BTreeMap<TaskId, Vec<TaskEstimate>> = BTreeMap::new();
        for estimate in &snapshot.estimates {
            estimates_by_task
                .entry(estimate.task_id)
                .or_default()
                .push(estimate.clone());
        }
        let mut final_estimates: BTreeMap<TaskId, FinalEstimate> = BTreeMap::new();
        for (task_id, estimates) in &estimates_by_task {
            let fused = fuse_estimates(estimates)?;
            final_estimates.insert(*task_id, fused);
        }

        let durations: BTreeMap<TaskId, f64> = final_estimates
            .iter()
            .map(|(&id, fused)| (id, fused.hours))
            .collect();

        let graph = build_graph(&snapshot.tasks, &snapshot.dependencies)?;
        let critical_path = crate::schedule::compute_critical_path(&graph, &durations, &self.config);
        let tracks = detect_parallel_tracks(&graph, &critical_path);

        // Place each assigned task on the calendar from its ES/EF and scan
        // for conflicts.
        let mut schedule: Vec<ScheduleEntry> = Vec::new();
        for task in sorted_by_id(&snapshot.tasks) {
            let Some(assignee) = task.assignee.clone() else {
                continue;
            };
            let timing = critical_path.timings[&task.id];
            let window = day_window(snapshot.schedule_start, timing.earliest_start, timing.earliest_finish);
            schedule.push(ScheduleEntry {
                task_id: task.id,
                assignee,
                window,
                total_hours: durations.get(&task.id).copied().unwrap_or(0.0),
            });
        }
        let conflicts = detect_resource_conflicts(&schedule, &snapshot.capacities)?;

        // Allocate in id order, feeding each task the allocations made so
        // far so utilization counts the person's full committed hours.
        let capacity_by_person: BTreeMap<&str, &TeamCapacity> = snapshot
            .capacities
            .iter()
            .map(|c| (c.person.as_str(), c))
            .collect();
        let mut allocations: Vec<CapacityAllocation> = Vec::new();
        for entry in &schedule {
            let Some(fused) = final_estimates.get(&entry.task_id) else {
                continue;
            };
            let capacity = capacity_by_person[entry.assignee.as_str()];
            let rows = allocate_capacity(fused, &entry.window, capacity, &allocations);
            allocations.extend(rows);
        }

        let mut rollup_hours = BTreeMap::new();
        for &root in hierarchy.roots() {
            rollup_hours.insert(root, hierarchy.rollup_hours(root, &durations));
        }

        debug!(
            critical_tasks = critical_path.critical_path.len(),
            tracks = tracks.len(),
            conflicts = conflicts.len(),
            "milestone analysis complete"
        );

        Ok(MilestoneAnalysis {
            final_estimates,
            critical_path,
            tracks,
            conflicts,
            allocations,
            rollup_hours,
        })
    }
}

impl Default for MilestoneAnalyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn sorted_by_id(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|t| t.id);
    sorted
}

/// Map a [start, finish) day span onto an inclusive calendar window.
fn day_window(origin: NaiveDate, earliest_start: f64, earliest_finish: f64) -> ScheduledWindow {
    let start_offset = earliest_start.max(0.0).floor() as u64;
    let end_offset = earliest_finish.max(0.0).ceil() as u64;
    let last_offset = end_offset.saturating_sub(1).max(start_offset);
    ScheduledWindow::new(
        origin + Days::new(start_offset),
        origin + Days::new(last_offset),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EstimationMethod;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_window_maps_spans() {
        let origin = date(2026, 8, 17);
        // Days 0..2 map to Mon-Tue.
        let window = day_window(origin, 0.0, 2.0);
        assert_eq!(window.start, date(2026, 8, 17));
        assert_eq!(window.end, date(2026, 8, 18));
        // Zero-duration task still gets one calendar day.
        let window = day_window(origin, 3.0, 3.0);
        assert_eq!(window.start, date(2026, 8, 20));
        assert_eq!(window.end, date(2026, 8, 20));
    }

    #[test]
    fn pipeline_runs_end_to_end() {
        let mut design = Task::new("Design");
        design.assignee = Some("dana".to_string());
        let mut build = Task::new("Build");
        build.assignee = Some("dana".to_string());

        let snapshot = MilestoneSnapshot {
            dependencies: vec![TaskDependency::finish_to_start(design.id, build.id)],
            estimates: vec![
                TaskEstimate::new(design.id, EstimationMethod::ExpertJudgment, 16.0)
                    .with_confidence(0.8),
                TaskEstimate::new(build.id, EstimationMethod::ThreePointPert, 24.0)
                    .with_pert(16.0, 24.0, 32.0),
            ],
            capacities: vec![TeamCapacity::new("dana", 40.0)],
            schedule_start: date(2026, 8, 17),
            tasks: vec![design.clone(), build.clone()],
        };

        let analysis = MilestoneAnalyzer::default().analyze(&snapshot).unwrap();

        assert_eq!(analysis.final_estimates.len(), 2);
        // Execution order, not id order.
        assert_eq!(
            analysis.critical_path.critical_path,
            vec![design.id, build.id]
        );
        assert!(analysis.tracks.is_empty());
        assert!(analysis.critical_path.unestimated.is_empty());
        assert!(!analysis.allocations.is_empty());
        assert_eq!(analysis.rollup_hours.len(), 2);
    }
}
