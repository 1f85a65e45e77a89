use anyhow::Context;
use clap::Parser;
use milesched::cli::{Args, Commands, load_estimates, load_snapshot};
use milesched::{EngineConfig, MilestoneAnalyzer, fuse_estimates};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "milesched=info".into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Analyze {
            snapshot,
            config,
            deadline,
            verbose,
        } => run_analyze(&snapshot, config.as_deref(), deadline, verbose),
        Commands::Fuse { estimates } => run_fuse(&estimates),
        Commands::ShowConfig { config } => run_show_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            EngineConfig::from_toml_file(path)
                .map_err(|e| anyhow::anyhow!("failed to load config from {path:?}: {e}"))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn run_analyze(
    snapshot_path: &Path,
    config_path: Option<&Path>,
    deadline: Option<f64>,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    config.deadline_day = config.effective_deadline(deadline);
    let snapshot = load_snapshot(snapshot_path)
        .map_err(|e| anyhow::anyhow!("failed to load snapshot from {snapshot_path:?}: {e}"))?;

    info!(
        tasks = snapshot.tasks.len(),
        dependencies = snapshot.dependencies.len(),
        "running milestone analysis"
    );

    let analyzer = MilestoneAnalyzer::new(config);
    let analysis = match analyzer.analyze(&snapshot) {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("analysis failed: {}", e);
            std::process::exit(1);
        }
    };

    if verbose {
        println!("Critical path ({} tasks):", analysis.critical_path.critical_path.len());
        for task_id in &analysis.critical_path.critical_path {
            let title = snapshot
                .tasks
                .iter()
                .find(|t| t.id == *task_id)
                .map(|t| t.title.as_str())
                .unwrap_or("<unknown>");
            println!("  {} {}", task_id, title);
        }
        println!(
            "Project finish: day {:.2}",
            analysis.critical_path.project_finish_day
        );
        println!("Parallel tracks: {}", analysis.tracks.len());
        println!("Resource conflicts: {}", analysis.conflicts.len());
    }

    let rendered =
        serde_json::to_string_pretty(&analysis).context("failed to serialize analysis")?;
    println!("{rendered}");
    Ok(())
}

fn run_fuse(estimates_path: &Path) -> anyhow::Result<()> {
    let estimates = load_estimates(estimates_path)
        .map_err(|e| anyhow::anyhow!("failed to load estimates from {estimates_path:?}: {e}"))?;

    // One fusion per task, in id order.
    let mut by_task: BTreeMap<milesched::TaskId, Vec<milesched::TaskEstimate>> = BTreeMap::new();
    for estimate in estimates {
        by_task.entry(estimate.task_id).or_default().push(estimate);
    }

    let mut fused = Vec::with_capacity(by_task.len());
    for (task_id, task_estimates) in &by_task {
        match fuse_estimates(task_estimates) {
            Ok(final_estimate) => fused.push(final_estimate),
            Err(e) => {
                error!(task_id = %task_id, "fusion failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let rendered = serde_json::to_string_pretty(&fused).context("failed to serialize estimates")?;
    println!("{rendered}");
    Ok(())
}

fn run_show_config(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    println!("hours_per_day = {}", config.hours_per_day);
    println!("project_start_day = {}", config.project_start_day);
    match config.deadline_day {
        Some(deadline) => println!("deadline_day = {deadline}"),
        None => println!("deadline_day = (none)"),
    }
    println!("slack_epsilon = {}", config.slack_epsilon);
    Ok(())
}
