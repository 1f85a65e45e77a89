use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for tasks
pub type TaskId = Uuid;

/// Unique identifier for milestones
pub type MilestoneId = Uuid;

/// Identifier for a person owning capacity and assignments
pub type PersonId = String;

/// A single unit of work inside a milestone's decomposition.
///
/// The parent/child relation (hierarchical decomposition) and the dependency
/// relation are two independent relations over the same task set; neither is
/// embedded here as pointers. The hierarchy lives in [`TaskHierarchy`], the
/// dependency graph in [`TaskGraph`](crate::graph::TaskGraph).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub milestone_id: Option<MilestoneId>,
    pub parent_id: Option<TaskId>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub assignee: Option<PersonId>,
}

/// Task lifecycle state
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
}

/// Task priority levels with numeric values for scoring
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Low = 3,
    Medium = 5,
    High = 8,
    Critical = 10,
}

impl Task {
    /// Create a task in its initial state.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            milestone_id: None,
            parent_id: None,
            status: TaskStatus::NotStarted,
            priority: TaskPriority::Medium,
            estimated_hours: None,
            actual_hours: None,
            assignee: None,
        }
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Completed with actual hours recorded, so it can feed the estimation
    /// learning loop.
    pub fn is_learnable(&self) -> bool {
        self.status == TaskStatus::Completed && self.actual_hours.is_some()
    }
}

impl TaskPriority {
    /// Get numeric value for calculations
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

/// Index over the parent/child decomposition of a task set.
///
/// Kept separate from the dependency graph: parent/child is a tree, the
/// dependency relation is a DAG, and conflating them would reintroduce the
/// cyclic-ownership problems this layout avoids.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskHierarchy {
    children: BTreeMap<TaskId, Vec<TaskId>>,
    parents: BTreeMap<TaskId, TaskId>,
    roots: Vec<TaskId>,
}

impl TaskHierarchy {
    /// Build the index from a task snapshot.
    ///
    /// Fails with [`EngineError::UnknownTaskReference`] if any task names a
    /// parent that is not in the snapshot.
    pub fn from_tasks(tasks: &[Task]) -> Result<Self, EngineError> {
        let known: BTreeMap<TaskId, ()> = tasks.iter().map(|t| (t.id, ())).collect();

        let mut children: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
        let mut parents = BTreeMap::new();
        let mut roots = Vec::new();

        let mut sorted: Vec<&Task> = tasks.iter().collect();
        sorted.sort_by_key(|t| t.id);

        for task in sorted {
            match task.parent_id {
                Some(parent_id) => {
                    if !known.contains_key(&parent_id) {
                        return Err(EngineError::UnknownTaskReference {
                            task_id: parent_id,
                            context: "task parent",
                        });
                    }
                    children.entry(parent_id).or_default().push(task.id);
                    parents.insert(task.id, parent_id);
                }
                None => roots.push(task.id),
            }
        }

        Ok(Self {
            children,
            parents,
            roots,
        })
    }

    /// Direct children of a task, in id order.
    pub fn children_of(&self, task_id: TaskId) -> &[TaskId] {
        self.children.get(&task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of a task, if any.
    pub fn parent_of(&self, task_id: TaskId) -> Option<TaskId> {
        self.parents.get(&task_id).copied()
    }

    /// Tasks with no parent, in id order.
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    /// Sum a per-task hour figure over the subtree rooted at `task_id`.
    ///
    /// Used to roll decomposed work back up to milestone-level summaries.
    pub fn rollup_hours(&self, task_id: TaskId, hours: &BTreeMap<TaskId, f64>) -> f64 {
        let own = hours.get(&task_id).copied().unwrap_or(0.0);
        self.children_of(task_id)
            .iter()
            .fold(own, |acc, &child| acc + self.rollup_hours(child, hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_initial_state() {
        let task = Task::new("Write outline");
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(!task.is_terminal());
        assert!(!task.is_learnable());
    }

    #[test]
    fn learnable_requires_completion_and_actuals() {
        let mut task = Task::new("Draft chapter");
        task.status = TaskStatus::Completed;
        assert!(!task.is_learnable());
        task.actual_hours = Some(12.5);
        assert!(task.is_learnable());
    }

    #[test]
    fn priority_values() {
        assert_eq!(TaskPriority::Critical.value(), 10);
        assert_eq!(TaskPriority::High.value(), 8);
        assert_eq!(TaskPriority::Medium.value(), 5);
        assert_eq!(TaskPriority::Low.value(), 3);
        assert!(TaskPriority::Critical > TaskPriority::Low);
    }

    #[test]
    fn hierarchy_index() {
        let root = Task::new("Goal");
        let mut child_a = Task::new("Part A");
        child_a.parent_id = Some(root.id);
        let mut child_b = Task::new("Part B");
        child_b.parent_id = Some(root.id);

        let tasks = vec![root.clone(), child_a.clone(), child_b.clone()];
        let hierarchy = TaskHierarchy::from_tasks(&tasks).unwrap();

        assert_eq!(hierarchy.roots(), &[root.id]);
        assert_eq!(hierarchy.children_of(root.id).len(), 2);
        assert_eq!(hierarchy.parent_of(child_a.id), Some(root.id));
        assert_eq!(hierarchy.parent_of(root.id), None);
    }

    #[test]
    fn hierarchy_rejects_unknown_parent() {
        let mut orphan = Task::new("Orphan");
        orphan.parent_id = Some(Uuid::new_v4());
        let err = TaskHierarchy::from_tasks(&[orphan]).unwrap_err();
        assert!(matches!(err, EngineError::UnknownTaskReference { .. }));
    }

    #[test]
    fn rollup_sums_subtree() {
        let root = Task::new("Goal");
        let mut child = Task::new("Part");
        child.parent_id = Some(root.id);
        let mut grandchild = Task::new("Step");
        grandchild.parent_id = Some(child.id);

        let tasks = vec![root.clone(), child.clone(), grandchild.clone()];
        let hierarchy = TaskHierarchy::from_tasks(&tasks).unwrap();

        let mut hours = BTreeMap::new();
        hours.insert(child.id, 4.0);
        hours.insert(grandchild.id, 6.0);

        assert_eq!(hierarchy.rollup_hours(root.id, &hours), 10.0);
        assert_eq!(hierarchy.rollup_hours(child.id, &hours), 10.0);
        assert_eq!(hierarchy.rollup_hours(grandchild.id, &hours), 6.0);
    }
}
