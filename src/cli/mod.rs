//! CLI-specific functionality for the scheduling engine
//!
//! This module contains all CLI-related code including argument parsing and
//! snapshot/estimate file loading.

pub mod args;
pub mod snapshot;

pub use args::{Args, Commands};
pub use snapshot::{load_estimates, load_snapshot};
