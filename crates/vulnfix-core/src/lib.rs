//! vulnfix-bench core library
//!
//! Reconciles curated vulnerability-fix commits against git history and
//! fetches the corresponding buggy/fixed source snapshots.

pub mod ancestry;
pub mod config;
pub mod dataset;
pub mod error;
pub mod exclusions;
pub mod fakes;
pub mod fetch;
pub mod git;
pub mod reconcile;
pub mod telemetry;

pub use ancestry::{
    find_earliest_fix_commit, find_immediate_predecessor, find_latest_fix_commit, is_ancestor,
    CommitGraph, Selection, UnrelatedCommits,
};
pub use config::BenchConfig;
pub use dataset::{DatasetRow, RefinedRecord};
pub use error::{ConfigError, DatasetError, FetchError, GitError};
pub use exclusions::ExclusionTables;
pub use fetch::{FetchOutcome, PatchStatus, SnapshotMode, SourceFetcher};
pub use git::GitRepo;
pub use reconcile::{
    reconcile, reconcile_local_clones, ReconcileReport, ReconcileSummary, ReconcileWarning,
    Reconciler, Reconciliation,
};
pub use telemetry::init_tracing;
