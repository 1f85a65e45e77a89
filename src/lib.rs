//! # Milesched
//!
//! Goal decomposition and scheduling engine: the computational core of a
//! goal/strategy service. It turns a milestone's task list into a validated
//! dependency graph, computes critical-path, parallelism, and
//! resource-conflict analyses, fuses independent time estimates into one
//! defensible number with an uncertainty range, and allocates the work
//! against weekly person-capacity.
//!
//! ## Architecture Overview
//!
//! The engine is a set of pure functions over immutable snapshots, organized
//! into modules:
//!
//! - **[`model`]**: Plain-data domain types (tasks, dependencies, estimates,
//!   capacities) that cross the boundary in both directions
//! - **[`graph`]**: Task graph construction with duplicate/unknown-reference
//!   rejection and cycle detection
//! - **[`schedule`]**: Critical-path analysis, parallel track detection, and
//!   resource conflict detection
//! - **[`estimate`]**: Estimation fusion and the accuracy learning loop
//! - **[`allocation`]**: Weekly capacity allocation with weekend preferences
//! - **[`analysis`]**: Milestone-level orchestration of the full pipeline
//!
//! Persistence, HTTP routing, and LLM-backed goal translation are caller
//! concerns: records arrive as plain data and derived results are handed
//! back for the caller to persist. Nothing here performs I/O, so every
//! operation is safely callable in parallel for different milestones, and
//! within one invocation iteration order and tie-breaks are fixed so
//! identical inputs yield identical results.
//!
//! ## Quick Start
//!
//! ```rust
//! use milesched::{EngineConfig, MilestoneAnalyzer, MilestoneSnapshot, Task};
//! use chrono::NaiveDate;
//!
//! fn main() -> Result<(), milesched::EngineError> {
//!     let snapshot = MilestoneSnapshot {
//!         tasks: vec![Task::new("Draft outline")],
//!         dependencies: vec![],
//!         estimates: vec![],
//!         capacities: vec![],
//!         schedule_start: NaiveDate::from_ymd_opt(2026, 8, 17).unwrap(),
//!     };
//!
//!     let analyzer = MilestoneAnalyzer::new(EngineConfig::default());
//!     let analysis = analyzer.analyze(&snapshot)?;
//!     println!("critical path: {:?}", analysis.critical_path.critical_path);
//!     Ok(())
//! }
//! ```

/// Plain-data domain types.
///
/// Tasks, typed dependencies, method estimates, and capacity profiles as the
/// engine receives them, plus the hierarchy index kept separate from the
/// dependency graph.
pub mod model;

/// Task graph construction and validation.
pub mod graph;

/// Critical-path, parallel-track, and resource-conflict analyses.
pub mod schedule;

/// Estimation fusion and the accuracy learning loop.
pub mod estimate;

/// Weekly capacity allocation.
pub mod allocation;

/// Milestone-level pipeline orchestration.
pub mod analysis;

/// Typed engine errors.
pub mod error;

/// Engine configuration and TOML loading.
pub mod config;

// CLI module for command-line interface
pub mod cli;

pub use allocation::allocate_capacity;
pub use analysis::{MilestoneAnalysis, MilestoneAnalyzer, MilestoneSnapshot};
pub use config::EngineConfig;
pub use error::EngineError;
pub use estimate::{fuse_estimates, record_actual, record_method_actuals};
pub use graph::{TaskGraph, build_graph};
pub use model::{
    CapacityAllocation, DependencyType, EstimationHistoryEntry, EstimationMethod, FinalEstimate,
    PertTriad, ScheduledWindow, Task, TaskDependency, TaskEstimate, TaskHierarchy, TaskId,
    TaskPriority, TaskStatus, TeamCapacity, WeekendPreference,
};
pub use schedule::{
    ConflictKind, CriticalPathReport, ResourceConflict, ScheduleEntry, Track,
    compute_critical_path, detect_parallel_tracks, detect_resource_conflicts,
};
