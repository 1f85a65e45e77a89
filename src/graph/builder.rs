//! Task graph construction and validation.
//!
//! Assembles a directed graph from a milestone's tasks and typed dependency
//! edges, rejecting malformed input (duplicate ids, duplicate edges, unknown
//! references) and cycles before any downstream pass runs. Adjacency is kept
//! in `BTreeMap`s so every iteration over the graph is in id order and the
//! downstream analyses are reproducible for identical inputs.

use crate::error::EngineError;
use crate::model::{Task, TaskDependency, TaskId};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::cmp::Reverse;
use tracing::debug;

/// Validated dependency graph for one milestone's tasks.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskId, Task>,
    successors: BTreeMap<TaskId, Vec<TaskDependency>>,
    predecessors: BTreeMap<TaskId, Vec<TaskDependency>>,
    edge_count: usize,
}

impl TaskGraph {
    /// All task ids, in order.
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    /// Look up a task by id.
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    /// Outgoing edges of a task, ordered by successor id.
    pub fn successors(&self, task_id: TaskId) -> &[TaskDependency] {
        self.successors
            .get(&task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Incoming edges of a task, ordered by predecessor id.
    pub fn predecessors(&self, task_id: TaskId) -> &[TaskDependency] {
        self.predecessors
            .get(&task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Tasks with no incoming edges, in id order.
    pub fn sources(&self) -> Vec<TaskId> {
        self.task_ids()
            .filter(|id| self.predecessors(*id).is_empty())
            .collect()
    }

    /// Tasks with no outgoing edges, in id order.
    pub fn sinks(&self) -> Vec<TaskId> {
        self.task_ids()
            .filter(|id| self.successors(*id).is_empty())
            .collect()
    }

    /// Topological order via Kahn's algorithm, smallest id first among ready
    /// tasks. The graph is acyclic by construction, so this always covers
    /// every task.
    pub fn topological_order(&self) -> Vec<TaskId> {
        let mut in_degree: BTreeMap<TaskId, usize> = self
            .task_ids()
            .map(|id| (id, self.predecessors(id).len()))
            .collect();

        let mut ready: BinaryHeap<Reverse<TaskId>> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| Reverse(id))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for edge in self.successors(id) {
                let degree = in_degree
                    .get_mut(&edge.successor)
                    .expect("successor present in validated graph");
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(edge.successor));
                }
            }
        }
        order
    }
}

/// Build and validate the dependency graph for one milestone scope.
///
/// Rejects, in this order: duplicate task ids, edges referencing unknown
/// tasks, duplicate ordered (predecessor, successor) pairs, and cycles. On a
/// cycle the full cycle is reported as an ordered list of task ids so callers
/// can surface it instead of silently dropping edges. Lags are retained as
/// edge weights; negative lag (lead time) is legal here and only checked for
/// satisfiability by the critical-path pass.
pub fn build_graph(tasks: &[Task], dependencies: &[TaskDependency]) -> Result<TaskGraph, EngineError> {
    let mut task_index: BTreeMap<TaskId, Task> = BTreeMap::new();
    for task in tasks {
        if task_index.insert(task.id, task.clone()).is_some() {
            return Err(EngineError::DuplicateTask { task_id: task.id });
        }
    }

    let mut successors: BTreeMap<TaskId, Vec<TaskDependency>> = BTreeMap::new();
    let mut predecessors: BTreeMap<TaskId, Vec<TaskDependency>> = BTreeMap::new();
    let mut seen_pairs: BTreeSet<(TaskId, TaskId)> = BTreeSet::new();

    for edge in dependencies {
        if !task_index.contains_key(&edge.predecessor) {
            return Err(EngineError::UnknownTaskReference {
                task_id: edge.predecessor,
                context: "dependency predecessor",
            });
        }
        if !task_index.contains_key(&edge.successor) {
            return Err(EngineError::UnknownTaskReference {
                task_id: edge.successor,
                context: "dependency successor",
            });
        }
        if !seen_pairs.insert((edge.predecessor, edge.successor)) {
            return Err(EngineError::DuplicateDependency {
                predecessor: edge.predecessor,
                successor: edge.successor,
            });
        }
        successors
            .entry(edge.predecessor)
            .or_default()
            .push(edge.clone());
        predecessors
            .entry(edge.successor)
            .or_default()
            .push(edge.clone());
    }

    for edges in successors.values_mut() {
        edges.sort_by_key(|e| e.successor);
    }
    for edges in predecessors.values_mut() {
        edges.sort_by_key(|e| e.predecessor);
    }

    let graph = TaskGraph {
        tasks: task_index,
        successors,
        predecessors,
        edge_count: dependencies.len(),
    };

    if let Some(cycle) = find_cycle(&graph) {
        return Err(EngineError::CycleDetected { cycle });
    }

    debug!(
        tasks = graph.len(),
        edges = graph.edge_count(),
        "built task graph"
    );
    Ok(graph)
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-color DFS over the whole graph. Returns the first cycle found as an
/// ordered list of task ids (each id once, starting at the task the back edge
/// closes on).
fn find_cycle(graph: &TaskGraph) -> Option<Vec<TaskId>> {
    let mut colors: BTreeMap<TaskId, Color> =
        graph.task_ids().map(|id| (id, Color::White)).collect();
    let mut path = Vec::new();

    for id in graph.task_ids() {
        if colors[&id] == Color::White {
            if let Some(cycle) = visit(graph, id, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    graph: &TaskGraph,
    task_id: TaskId,
    colors: &mut BTreeMap<TaskId, Color>,
    path: &mut Vec<TaskId>,
) -> Option<Vec<TaskId>> {
    colors.insert(task_id, Color::Gray);
    path.push(task_id);

    for edge in graph.successors(task_id) {
        match colors[&edge.successor] {
            Color::Gray => {
                // Back edge: the cycle is the path suffix starting at the
                // gray successor.
                let start = path
                    .iter()
                    .position(|&id| id == edge.successor)
                    .expect("gray task is on the current path");
                return Some(path[start..].to_vec());
            }
            Color::White => {
                if let Some(cycle) = visit(graph, edge.successor, colors, path) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }

    path.pop();
    colors.insert(task_id, Color::Black);
    None
}
