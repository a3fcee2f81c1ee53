//! vulnfix - vulnerability-fix benchmark curation CLI
//!
//! ## Commands
//!
//! - `reconcile`: resolve buggy and latest-fix commits for every project and
//!   write the refined dataset
//! - `fetch`: clone one project's buggy (default) or fixed snapshot

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};

use vulnfix_core::{
    reconcile_local_clones, BenchConfig, ExclusionTables, FetchOutcome, PatchStatus,
    SnapshotMode, SourceFetcher,
};

#[derive(Parser)]
#[command(name = "vulnfix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vulnerability-fix benchmark curation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Benchmark root directory (data/, patches/, project-sources*/)
    #[arg(long, global = true, env = "VULNFIX_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile fix commits against local clones and write the refined dataset
    Reconcile {
        /// JSON exclusion tables to use instead of the curated ones
        #[arg(long)]
        exclusions: Option<PathBuf>,
    },

    /// Fetch one project's source snapshot
    Fetch {
        /// Project slug, e.g. apache__camel_CVE-2018-8041_2.20.3
        project_slug: String,

        /// Fetch the latest fix instead of the buggy commit
        #[arg(long)]
        fixed: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    vulnfix_core::init_tracing(cli.json, level);

    let config = cli
        .root
        .map(BenchConfig::new)
        .unwrap_or_else(BenchConfig::from_env);

    match cli.command {
        Commands::Reconcile { exclusions } => cmd_reconcile(&config, exclusions.as_deref()),
        Commands::Fetch {
            project_slug,
            fixed,
        } => cmd_fetch(&config, &project_slug, SnapshotMode::from_fixed_flag(fixed)),
    }
}

fn cmd_reconcile(config: &BenchConfig, exclusions: Option<&Path>) -> Result<()> {
    let tables = match exclusions {
        Some(path) => ExclusionTables::load(path)
            .with_context(|| format!("Failed to load exclusion tables from {:?}", path))?,
        None => ExclusionTables::curated(),
    };

    info!("Reconciling {:?}", config.dataset_path());
    let report = reconcile_local_clones(config, tables).with_context(|| {
        format!(
            "Failed to reconcile {:?} into {:?}",
            config.dataset_path(),
            config.refined_dataset_path()
        )
    })?;

    for (slug, warnings) in &report.warnings {
        for warning in warnings {
            println!("WARNING {}: {}", slug, warning);
        }
    }

    let summary = &report.summary;
    println!("Wrote {:?}", config.refined_dataset_path());
    println!(
        "Projects: {} reconciled, {} excluded, {} skipped; {} warnings",
        summary.processed, summary.excluded, summary.skipped, summary.warnings
    );
    Ok(())
}

fn cmd_fetch(config: &BenchConfig, slug: &str, mode: SnapshotMode) -> Result<()> {
    let fetcher = SourceFetcher::new(config.clone());

    match fetcher.fetch(slug, mode) {
        Ok(FetchOutcome::AlreadyPresent(dir)) => {
            println!("{} ({}) already present at {:?}", slug, mode, dir);
        }
        Ok(FetchOutcome::Fetched { dir, commit, patch }) => {
            println!("Checked out {} ({}) at {} in {:?}", slug, mode, commit, dir);
            match patch {
                PatchStatus::Applied(path) => println!("Applied patch {:?}", path),
                PatchStatus::Failed { path, error } => {
                    println!("Patch {:?} failed: {}", path, error)
                }
                PatchStatus::NotFound | PatchStatus::NotApplicable => {}
            }
        }
        // Per-project failures are reported, not signalled via exit status.
        Err(e) => error!("Failed to fetch {} ({}): {}", slug, mode, e),
    }
    Ok(())
}
