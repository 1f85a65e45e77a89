//! Critical path analysis over a validated task graph.
//!
//! Standard forward/backward CPM passes generalized to all four dependency
//! types. Durations arrive in estimated hours and are converted to elapsed
//! days with the configured `hours_per_day` constant; no further
//! working-calendar modeling happens here. The whole pass is a pure function
//! with fixed iteration order and specified tie-breaks, so identical inputs
//! yield byte-identical reports.

use crate::config::EngineConfig;
use crate::graph::TaskGraph;
use crate::model::{DependencyType, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-task timing computed by the forward and backward passes. All values
/// are in elapsed days from the project start.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct TaskTiming {
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    /// latest_start - earliest_start, in days.
    pub slack_days: f64,
    pub duration_days: f64,
}

/// Result of a critical-path analysis.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CriticalPathReport {
    /// The maximal-length chain of minimum-slack tasks, in execution order.
    /// Ties between equal-length candidates are broken by earliest task id.
    pub critical_path: Vec<TaskId>,
    /// Per-task slack in hours.
    pub slack: BTreeMap<TaskId, f64>,
    pub timings: BTreeMap<TaskId, TaskTiming>,
    /// Earliest possible project finish, in days from the project start.
    pub project_finish_day: f64,
    /// True when a caller-supplied deadline is earlier than the computed
    /// finish. Reported, never silently extended.
    pub violates_deadline: bool,
    /// Tasks with no duration supplied; treated as duration 0.
    pub unestimated: Vec<TaskId>,
}

impl CriticalPathReport {
    /// True if the task is on the reported critical path.
    pub fn is_critical(&self, task_id: TaskId) -> bool {
        self.critical_path.contains(&task_id)
    }
}

/// Compute earliest/latest start-finish times, slack, and the critical path.
///
/// `durations_hours` maps task id to fused estimated hours; tasks missing
/// from the map are treated as duration 0 and listed in
/// [`CriticalPathReport::unestimated`]. The deadline (if any) comes from
/// `config.deadline_day`.
pub fn compute_critical_path(
    graph: &TaskGraph,
    durations_hours: &BTreeMap<TaskId, f64>,
    config: &EngineConfig,
) -> CriticalPathReport {
    let order = graph.topological_order();
    let hours_per_day = config.hours_per_day;

    let mut unestimated = Vec::new();
    let mut duration_days: BTreeMap<TaskId, f64> = BTreeMap::new();
    for id in graph.task_ids() {
        match durations_hours.get(&id) {
            Some(hours) => {
                duration_days.insert(id, hours / hours_per_day);
            }
            None => {
                duration_days.insert(id, 0.0);
                unestimated.push(id);
            }
        }
    }
    if !unestimated.is_empty() {
        warn!(count = unestimated.len(), "unestimated tasks treated as zero-duration");
    }

    // Forward pass. Constraints from predecessors are lower bounds; each
    // task's ES is the maximum over all of them, never an average.
    let mut earliest_start: BTreeMap<TaskId, f64> = BTreeMap::new();
    let mut earliest_finish: BTreeMap<TaskId, f64> = BTreeMap::new();
    for &id in &order {
        let duration = duration_days[&id];
        let mut es_bound = config.project_start_day;
        let mut ef_bound = f64::NEG_INFINITY;

        for edge in graph.predecessors(id) {
            let lag = edge.lag_hours / hours_per_day;
            let pred_es = earliest_start[&edge.predecessor];
            let pred_ef = earliest_finish[&edge.predecessor];
            match edge.dependency_type {
                DependencyType::FinishToStart => es_bound = es_bound.max(pred_ef + lag),
                DependencyType::StartToStart => es_bound = es_bound.max(pred_es + lag),
                DependencyType::FinishToFinish => ef_bound = ef_bound.max(pred_ef + lag),
                DependencyType::StartToFinish => ef_bound = ef_bound.max(pred_es + lag),
            }
        }

        // Finish-bound constraints pin EF; ES is derived as EF - duration.
        let es = es_bound.max(ef_bound - duration);
        earliest_start.insert(id, es);
        earliest_finish.insert(id, es + duration);
    }

    let computed_finish = earliest_finish
        .values()
        .fold(config.project_start_day, |acc, &ef| acc.max(ef));
    let deadline = config.deadline_day;
    let violates_deadline = deadline.is_some_and(|d| d < computed_finish - config.slack_epsilon);
    if violates_deadline {
        warn!(
            deadline = deadline.unwrap_or_default(),
            computed_finish, "deadline earlier than computed project finish"
        );
    }
    let required_finish = deadline.unwrap_or(computed_finish);

    // Backward pass, seeded at the required finish for every task (a binding
    // deadline caps all latest finishes).
    let mut latest_start: BTreeMap<TaskId, f64> = BTreeMap::new();
    let mut latest_finish: BTreeMap<TaskId, f64> = BTreeMap::new();
    for &id in order.iter().rev() {
        let duration = duration_days[&id];
        let mut lf_bound = required_finish;
        let mut ls_bound = f64::INFINITY;

        for edge in graph.successors(id) {
            let lag = edge.lag_hours / hours_per_day;
            let succ_ls = latest_start[&edge.successor];
            let succ_lf = latest_finish[&edge.successor];
            match edge.dependency_type {
                DependencyType::FinishToStart => lf_bound = lf_bound.min(succ_ls - lag),
                DependencyType::StartToStart => ls_bound = ls_bound.min(succ_ls - lag),
                DependencyType::FinishToFinish => lf_bound = lf_bound.min(succ_lf - lag),
                DependencyType::StartToFinish => ls_bound = ls_bound.min(succ_lf - lag),
            }
        }

        let lf = lf_bound.min(ls_bound + duration);
        latest_finish.insert(id, lf);
        latest_start.insert(id, lf - duration);
    }

    let mut timings: BTreeMap<TaskId, TaskTiming> = BTreeMap::new();
    let mut slack: BTreeMap<TaskId, f64> = BTreeMap::new();
    for id in graph.task_ids() {
        let slack_days = latest_start[&id] - earliest_start[&id];
        timings.insert(
            id,
            TaskTiming {
                earliest_start: earliest_start[&id],
                earliest_finish: earliest_finish[&id],
                latest_start: latest_start[&id],
                latest_finish: latest_finish[&id],
                slack_days,
                duration_days: duration_days[&id],
            },
        );
        slack.insert(id, slack_days * hours_per_day);
    }

    let critical_path = extract_critical_chain(graph, &timings, &order, config.slack_epsilon);
    debug!(
        critical_tasks = critical_path.len(),
        project_finish_day = computed_finish,
        "critical path computed"
    );

    CriticalPathReport {
        critical_path,
        slack,
        timings,
        project_finish_day: computed_finish,
        violates_deadline,
        unestimated,
    }
}

/// Pick the maximal-length chain among minimum-slack tasks.
///
/// With no deadline (or a feasible one) the minimum slack is exactly 0; under
/// a violated deadline all slacks shift negative and the minimum still marks
/// the critical tasks. Chain span is measured from the earliest start
/// reachable along critical edges to each task's earliest finish; ties are
/// broken by earliest task id at both the predecessor choice and the final
/// endpoint.
fn extract_critical_chain(
    graph: &TaskGraph,
    timings: &BTreeMap<TaskId, TaskTiming>,
    order: &[TaskId],
    epsilon: f64,
) -> Vec<TaskId> {
    if order.is_empty() {
        return Vec::new();
    }

    let min_slack = timings
        .values()
        .map(|t| t.slack_days)
        .fold(f64::INFINITY, f64::min);
    let is_critical =
        |id: TaskId| (timings[&id].slack_days - min_slack).abs() <= epsilon;

    // chain_start[t]: earliest start reachable from t walking critical edges
    // backwards; chosen_pred[t]: the predecessor realizing it.
    let mut chain_start: BTreeMap<TaskId, f64> = BTreeMap::new();
    let mut chosen_pred: BTreeMap<TaskId, Option<TaskId>> = BTreeMap::new();

    for &id in order {
        if !is_critical(id) {
            continue;
        }
        let mut best_start = timings[&id].earliest_start;
        let mut best_pred: Option<TaskId> = None;
        for edge in graph.predecessors(id) {
            let pred = edge.predecessor;
            if !is_critical(pred) {
                continue;
            }
            let candidate = chain_start[&pred];
            let better = candidate < best_start - epsilon
                || ((candidate - best_start).abs() <= epsilon
                    && best_pred.is_none_or(|current| pred < current));
            if better {
                best_start = candidate.min(best_start);
                best_pred = Some(pred);
            }
        }
        chain_start.insert(id, best_start);
        chosen_pred.insert(id, best_pred);
    }

    // Chain endpoint: maximal span, earliest id on ties.
    let mut endpoint: Option<(f64, TaskId)> = None;
    for (&id, &start) in &chain_start {
        let span = timings[&id].earliest_finish - start;
        let better = match endpoint {
            None => true,
            Some((best_span, best_id)) => {
                span > best_span + epsilon
                    || ((span - best_span).abs() <= epsilon && id < best_id)
            }
        };
        if better {
            endpoint = Some((span, id));
        }
    }

    let Some((_, mut current)) = endpoint else {
        return Vec::new();
    };

    let mut chain = vec![current];
    while let Some(Some(pred)) = chosen_pred.get(&current) {
        chain.push(*pred);
        current = *pred;
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::model::{Task, TaskDependency};

    fn tasks(n: usize) -> Vec<Task> {
        let mut tasks: Vec<Task> = (0..n).map(|i| Task::new(format!("T{i}"))).collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    fn hours(pairs: &[(TaskId, f64)]) -> BTreeMap<TaskId, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn chain_timing_and_slack() {
        let ts = tasks(3);
        let deps = vec![
            TaskDependency::finish_to_start(ts[0].id, ts[1].id),
            TaskDependency::finish_to_start(ts[1].id, ts[2].id),
        ];
        let graph = build_graph(&ts, &deps).unwrap();
        let durations = hours(&[(ts[0].id, 16.0), (ts[1].id, 24.0), (ts[2].id, 8.0)]);

        let report = compute_critical_path(&graph, &durations, &EngineConfig::default());

        // 2 + 3 + 1 days.
        assert_eq!(report.project_finish_day, 6.0);
        assert_eq!(report.critical_path, vec![ts[0].id, ts[1].id, ts[2].id]);
        for task in &ts {
            assert_eq!(report.slack[&task.id], 0.0);
        }
        assert!(!report.violates_deadline);
        assert!(report.unestimated.is_empty());
    }

    #[test]
    fn diamond_critical_path_is_longest_branch() {
        // A -> B -> D and A -> C -> D, with B longer than C.
        let ts = tasks(4);
        let (a, b, c, d) = (ts[0].id, ts[1].id, ts[2].id, ts[3].id);
        let deps = vec![
            TaskDependency::finish_to_start(a, b),
            TaskDependency::finish_to_start(a, c),
            TaskDependency::finish_to_start(b, d),
            TaskDependency::finish_to_start(c, d),
        ];
        let graph = build_graph(&ts, &deps).unwrap();
        let durations = hours(&[(a, 8.0), (b, 32.0), (c, 8.0), (d, 8.0)]);

        let report = compute_critical_path(&graph, &durations, &EngineConfig::default());

        assert_eq!(report.critical_path, vec![a, b, d]);
        assert_eq!(report.slack[&c], 24.0); // 3 days of slack, in hours
        assert_eq!(report.project_finish_day, 6.0);
    }

    #[test]
    fn path_length_matches_durations_plus_lags() {
        let ts = tasks(2);
        let deps =
            vec![TaskDependency::finish_to_start(ts[0].id, ts[1].id).with_lag(8.0)];
        let graph = build_graph(&ts, &deps).unwrap();
        let durations = hours(&[(ts[0].id, 16.0), (ts[1].id, 8.0)]);

        let report = compute_critical_path(&graph, &durations, &EngineConfig::default());

        // 2 days + 1 day lag + 1 day.
        assert_eq!(report.project_finish_day, 4.0);
        assert_eq!(report.timings[&ts[1].id].earliest_start, 3.0);
    }

    #[test]
    fn start_to_start_constraint() {
        let ts = tasks(2);
        let deps = vec![TaskDependency {
            predecessor: ts[0].id,
            successor: ts[1].id,
            dependency_type: DependencyType::StartToStart,
            lag_hours: 8.0,
        }];
        let graph = build_graph(&ts, &deps).unwrap();
        let durations = hours(&[(ts[0].id, 40.0), (ts[1].id, 8.0)]);

        let report = compute_critical_path(&graph, &durations, &EngineConfig::default());

        // Successor starts one day after the predecessor starts, not finishes.
        assert_eq!(report.timings[&ts[1].id].earliest_start, 1.0);
        assert_eq!(report.project_finish_day, 5.0);
    }

    #[test]
    fn finish_to_finish_derives_start() {
        let ts = tasks(2);
        let deps = vec![TaskDependency {
            predecessor: ts[0].id,
            successor: ts[1].id,
            dependency_type: DependencyType::FinishToFinish,
            lag_hours: 16.0,
        }];
        let graph = build_graph(&ts, &deps).unwrap();
        let durations = hours(&[(ts[0].id, 32.0), (ts[1].id, 8.0)]);

        let report = compute_critical_path(&graph, &durations, &EngineConfig::default());

        // EF = 4 + 2 = 6 days, ES derived as EF - duration.
        assert_eq!(report.timings[&ts[1].id].earliest_finish, 6.0);
        assert_eq!(report.timings[&ts[1].id].earliest_start, 5.0);
    }

    #[test]
    fn start_to_finish_constraint() {
        let ts = tasks(2);
        let deps = vec![TaskDependency {
            predecessor: ts[0].id,
            successor: ts[1].id,
            dependency_type: DependencyType::StartToFinish,
            lag_hours: 24.0,
        }];
        let graph = build_graph(&ts, &deps).unwrap();
        let durations = hours(&[(ts[0].id, 16.0), (ts[1].id, 8.0)]);

        let report = compute_critical_path(&graph, &durations, &EngineConfig::default());

        // Successor must finish 3 days after the predecessor starts (day 0).
        assert_eq!(report.timings[&ts[1].id].earliest_finish, 3.0);
        assert_eq!(report.timings[&ts[1].id].earliest_start, 2.0);
    }

    #[test]
    fn unestimated_tasks_flagged_not_fatal() {
        let ts = tasks(2);
        let deps = vec![TaskDependency::finish_to_start(ts[0].id, ts[1].id)];
        let graph = build_graph(&ts, &deps).unwrap();
        let durations = hours(&[(ts[0].id, 8.0)]);

        let report = compute_critical_path(&graph, &durations, &EngineConfig::default());

        assert_eq!(report.unestimated, vec![ts[1].id]);
        assert_eq!(report.timings[&ts[1].id].duration_days, 0.0);
        assert_eq!(report.project_finish_day, 1.0);
    }

    #[test]
    fn deadline_violation_is_reported_not_extended() {
        let ts = tasks(1);
        let graph = build_graph(&ts, &[]).unwrap();
        let durations = hours(&[(ts[0].id, 80.0)]); // 10 days
        let config = EngineConfig {
            deadline_day: Some(5.0),
            ..Default::default()
        };

        let report = compute_critical_path(&graph, &durations, &config);

        assert!(report.violates_deadline);
        assert_eq!(report.project_finish_day, 10.0);
        // Slack is negative against the binding deadline.
        assert_eq!(report.slack[&ts[0].id], -40.0);
        assert_eq!(report.critical_path, vec![ts[0].id]);
    }

    #[test]
    fn feasible_deadline_creates_slack() {
        let ts = tasks(1);
        let graph = build_graph(&ts, &[]).unwrap();
        let durations = hours(&[(ts[0].id, 8.0)]);
        let config = EngineConfig {
            deadline_day: Some(3.0),
            ..Default::default()
        };

        let report = compute_critical_path(&graph, &durations, &config);

        assert!(!report.violates_deadline);
        assert_eq!(report.slack[&ts[0].id], 16.0);
    }

    #[test]
    fn repeat_runs_are_byte_identical() {
        let ts = tasks(4);
        let deps = vec![
            TaskDependency::finish_to_start(ts[0].id, ts[1].id),
            TaskDependency::finish_to_start(ts[0].id, ts[2].id),
            TaskDependency::finish_to_start(ts[1].id, ts[3].id),
            TaskDependency::finish_to_start(ts[2].id, ts[3].id),
        ];
        let graph = build_graph(&ts, &deps).unwrap();
        // Equal-length branches force the tie-break.
        let durations = hours(&[
            (ts[0].id, 8.0),
            (ts[1].id, 16.0),
            (ts[2].id, 16.0),
            (ts[3].id, 8.0),
        ]);
        let config = EngineConfig::default();

        let first = compute_critical_path(&graph, &durations, &config);
        let second = compute_critical_path(&graph, &durations, &config);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
        // The tie went to the earliest id.
        assert_eq!(first.critical_path, vec![ts[0].id, ts[1].id, ts[3].id]);
    }
}
