//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `analyze`: Run the full pipeline over a milestone snapshot file
//! - `fuse`: Fuse a file of method estimates into final estimates
//! - `show-config`: Show the effective engine configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "milesched")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Goal decomposition and scheduling engine: critical paths, parallel tracks, estimate fusion, and capacity allocation over task dependency graphs"
)]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a milestone snapshot (JSON) and print the full report
    Analyze {
        /// Path to the milestone snapshot file
        snapshot: PathBuf,
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Deadline in days from project start, overriding the config file
        #[arg(short = 'd', long = "deadline", value_name = "DAYS")]
        deadline: Option<f64>,
        /// Enable verbose output
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    /// Fuse a file of method estimates (JSON array) into final estimates
    Fuse {
        /// Path to the estimates file
        estimates: PathBuf,
    },
    /// Show the effective engine configuration
    ShowConfig {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
}
