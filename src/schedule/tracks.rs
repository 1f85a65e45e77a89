//! Parallel track detection for non-critical work.
//!
//! Partitions the tasks left off the critical path into tracks that can
//! proceed independently: weakly-connected components of the dependency
//! subgraph restricted to non-critical tasks, merged whenever one component
//! has a transitive dependency (in either direction, through the full graph)
//! on another. Tracks come back sorted by finish time descending, longest
//! first, since the longest non-critical track is the next bottleneck risk.

use crate::graph::TaskGraph;
use crate::model::TaskId;
use crate::schedule::critical_path::CriticalPathReport;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A set of non-critical tasks that can be scheduled independently of the
/// other tracks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Track {
    /// Member task ids, in id order.
    pub tasks: Vec<TaskId>,
    /// Longest chain within the track, in execution order.
    pub internal_critical_path: Vec<TaskId>,
    /// Minimum slack across the track's members, in hours: the flexibility
    /// the track as a whole actually has.
    pub total_slack_hours: f64,
    /// Latest earliest-finish among members, in days from project start.
    pub finish_day: f64,
}

/// Partition non-critical tasks into independently schedulable tracks.
pub fn detect_parallel_tracks(graph: &TaskGraph, report: &CriticalPathReport) -> Vec<Track> {
    let critical: BTreeSet<TaskId> = report.critical_path.iter().copied().collect();
    let members: Vec<TaskId> = graph
        .task_ids()
        .filter(|id| !critical.contains(id))
        .collect();
    if members.is_empty() {
        return Vec::new();
    }

    let mut partition = Partition::new(&members);

    // Weak connectivity over edges joining two non-critical tasks.
    for &id in &members {
        for edge in graph.successors(id) {
            if !critical.contains(&edge.successor) {
                partition.union(id, edge.successor);
            }
        }
    }

    // Merge components linked by a transitive dependency that runs through
    // the rest of the graph. reach[t] holds the component roots reachable
    // downstream of t.
    let order = graph.topological_order();
    let mut reach: BTreeMap<TaskId, BTreeSet<TaskId>> = BTreeMap::new();
    for &id in order.iter().rev() {
        let mut reachable = BTreeSet::new();
        for edge in graph.successors(id) {
            if !critical.contains(&edge.successor) {
                reachable.insert(partition.find(edge.successor));
            }
            reachable.extend(reach[&edge.successor].iter().copied());
        }
        reach.insert(id, reachable);
    }
    for &id in &members {
        let downstream: Vec<TaskId> = reach[&id].iter().copied().collect();
        for root in downstream {
            partition.union(id, root);
        }
    }

    // Materialize tracks.
    let mut groups: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
    for &id in &members {
        groups.entry(partition.find(id)).or_default().push(id);
    }

    let mut tracks: Vec<Track> = groups
        .into_values()
        .map(|tasks| {
            let finish_day = tasks
                .iter()
                .map(|id| report.timings[id].earliest_finish)
                .fold(f64::NEG_INFINITY, f64::max);
            let total_slack_hours = tasks
                .iter()
                .map(|id| report.slack[id])
                .fold(f64::INFINITY, f64::min);
            let internal_critical_path = internal_chain(graph, report, &tasks);
            Track {
                tasks,
                internal_critical_path,
                total_slack_hours,
                finish_day,
            }
        })
        .collect();

    tracks.sort_by(|a, b| {
        b.finish_day
            .partial_cmp(&a.finish_day)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.tasks[0].cmp(&b.tasks[0]))
    });

    debug!(tracks = tracks.len(), "detected parallel tracks");
    tracks
}

/// Longest chain inside one track, measured by elapsed span, earliest-id
/// tie-break. Only edges with both endpoints in the track count.
fn internal_chain(
    graph: &TaskGraph,
    report: &CriticalPathReport,
    members: &[TaskId],
) -> Vec<TaskId> {
    let member_set: BTreeSet<TaskId> = members.iter().copied().collect();

    let mut chain_start: BTreeMap<TaskId, f64> = BTreeMap::new();
    let mut chosen_pred: BTreeMap<TaskId, Option<TaskId>> = BTreeMap::new();

    // members is already in id order; topological order within the track is
    // needed for the DP, so filter the global order.
    for id in graph
        .topological_order()
        .into_iter()
        .filter(|id| member_set.contains(id))
    {
        let mut best_start = report.timings[&id].earliest_start;
        let mut best_pred: Option<TaskId> = None;
        for edge in graph.predecessors(id) {
            let pred = edge.predecessor;
            if !member_set.contains(&pred) {
                continue;
            }
            let candidate = chain_start[&pred];
            let better = candidate < best_start
                || (candidate == best_start && best_pred.is_none_or(|current| pred < current));
            if better {
                best_start = candidate;
                best_pred = Some(pred);
            }
        }
        chain_start.insert(id, best_start);
        chosen_pred.insert(id, best_pred);
    }

    let mut endpoint: Option<(f64, TaskId)> = None;
    for (&id, &start) in &chain_start {
        let span = report.timings[&id].earliest_finish - start;
        let better = match endpoint {
            None => true,
            Some((best_span, best_id)) => span > best_span || (span == best_span && id < best_id),
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

/// Union-find over task ids with the smallest id as representative, keeping
/// the whole pass deterministic.
struct Partition {
    parent: BTreeMap<TaskId, TaskId>,
}

impl Partition {
    fn new(members: &[TaskId]) -> Self {
        Self {
            parent: members.iter().map(|&id| (id, id)).collect(),
        }
    }

    fn find(&mut self, id: TaskId) -> TaskId {
        let parent = self.parent[&id];
        if parent == id {
            return id;
        }
        let root = self.find(parent);
        self.parent.insert(id, root);
        root
    }

    fn union(&mut self, a: TaskId, b: TaskId) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        // Smaller id wins as representative.
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent.insert(hi, lo);
    }
}
