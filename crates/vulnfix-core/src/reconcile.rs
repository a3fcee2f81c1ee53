//! Reconciliation of curated fix-commit lists against git history.
//!
//! For each project the candidate list is filtered through the
//! [`ExclusionTables`], the latest fix is selected by descendant checks, and
//! the buggy commit is either the manual override or the first parent of
//! the earliest fix. Every anomaly is a [`ReconcileWarning`]; nothing here
//! aborts the batch.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ancestry::{
    find_earliest_fix_commit, find_immediate_predecessor, find_latest_fix_commit, CommitGraph,
    UnrelatedCommits,
};
use crate::config::BenchConfig;
use crate::dataset::{self, DatasetRow, RefinedRecord};
use crate::error::DatasetResult;
use crate::exclusions::ExclusionTables;
use crate::fetch::SnapshotMode;
use crate::git::GitRepo;

/// Non-fatal findings surfaced while reconciling one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileWarning {
    /// Two candidates sit on unrelated lines of history.
    Unrelated(UnrelatedCommits),
    /// The selected latest fix is not the last curated candidate.
    LatestNotLast { latest: String, last_listed: String },
    /// The earliest fix has no resolvable first parent.
    NoPredecessor { commit: String },
    /// Every candidate was excluded (or none was listed).
    NoCandidates,
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileWarning::Unrelated(pair) => write!(
                f,
                "fix commits {} and {} are not related",
                pair.candidate, pair.current
            ),
            ReconcileWarning::LatestNotLast {
                latest,
                last_listed,
            } => write!(
                f,
                "latest fix commit {latest} does not appear last (last listed: {last_listed})"
            ),
            ReconcileWarning::NoPredecessor { commit } => {
                write!(f, "no parent found for earliest fix commit {commit}")
            }
            ReconcileWarning::NoCandidates => write!(f, "no fix commits left after exclusions"),
        }
    }
}

/// Refined record for one project plus the warnings raised on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub record: RefinedRecord,
    pub warnings: Vec<ReconcileWarning>,
}

/// Reconcile one dataset row against `graph`.
///
/// With no candidates left after exclusions the record keeps the override
/// (or the curated buggy commit) and an empty latest fix.
pub fn reconcile<G: CommitGraph + ?Sized>(
    graph: &G,
    row: &DatasetRow,
    tables: &ExclusionTables,
) -> Reconciliation {
    let slug = row.project_slug.as_str();
    let listed = row.fix_commits();
    let candidates = tables.filter_commits(&listed);
    let mut warnings = Vec::new();

    if candidates.len() > 1 {
        info!("{} has multiple fix commits", slug);
        for commit in &candidates {
            info!("  {} {}", commit, describe_date(graph, commit));
        }
    }

    let override_commit = tables.buggy_override(slug).map(str::to_string);

    let Some(latest) = find_latest_fix_commit(graph, &candidates) else {
        warn!("{}: no fix commits left after exclusions", slug);
        warnings.push(ReconcileWarning::NoCandidates);
        let buggy = override_commit.unwrap_or_else(|| row.buggy_commit_id.clone());
        return Reconciliation {
            record: refined(row, buggy, String::new()),
            warnings,
        };
    };
    warnings.extend(latest.unrelated.into_iter().map(ReconcileWarning::Unrelated));
    if candidates.len() > 1 {
        info!(
            "Latest fix commit {} {}",
            latest.commit,
            describe_date(graph, &latest.commit)
        );
    }

    let buggy = match override_commit {
        Some(commit) => {
            info!("{}: using manual buggy commit {}", slug, commit);
            commit
        }
        None => {
            // Non-empty candidates always yield a selection.
            let earliest = find_earliest_fix_commit(graph, &candidates);
            match earliest {
                Some(earliest) => {
                    warnings.extend(
                        earliest
                            .unrelated
                            .into_iter()
                            .map(ReconcileWarning::Unrelated),
                    );
                    if candidates.len() > 1 {
                        info!(
                            "Earliest fix commit {} {}",
                            earliest.commit,
                            describe_date(graph, &earliest.commit)
                        );
                    }
                    match find_immediate_predecessor(graph, &earliest.commit) {
                        Some(parent) => parent,
                        None => {
                            warn!(
                                "{}: no parent found for earliest fix commit {}",
                                slug, earliest.commit
                            );
                            warnings.push(ReconcileWarning::NoPredecessor {
                                commit: earliest.commit,
                            });
                            String::new()
                        }
                    }
                }
                None => String::new(),
            }
        }
    };

    if let Some(last_listed) = listed.last() {
        if *last_listed != latest.commit {
            warn!("Latest fix commit does not appear last in {}", slug);
            warnings.push(ReconcileWarning::LatestNotLast {
                latest: latest.commit.clone(),
                last_listed: last_listed.clone(),
            });
        }
    }

    Reconciliation {
        record: refined(row, buggy, latest.commit),
        warnings,
    }
}

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub processed: usize,
    pub excluded: usize,
    pub skipped: usize,
    pub warnings: usize,
}

/// Result of reconciling a whole dataset.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Sorted refined records, one per processed project.
    pub records: Vec<RefinedRecord>,
    /// Warnings per project slug (projects without warnings are absent).
    pub warnings: BTreeMap<String, Vec<ReconcileWarning>>,
    pub summary: ReconcileSummary,
}

/// Drives [`reconcile`] over a dataset with a fixed set of tables.
#[derive(Debug, Clone)]
pub struct Reconciler {
    tables: ExclusionTables,
}

impl Reconciler {
    pub fn new(tables: ExclusionTables) -> Self {
        Self { tables }
    }

    pub fn reconcile_row<G: CommitGraph + ?Sized>(
        &self,
        graph: &G,
        row: &DatasetRow,
    ) -> Reconciliation {
        reconcile(graph, row, &self.tables)
    }

    /// Reconcile every non-excluded row. `open_graph` supplies the commit
    /// graph for a row, or `None` to skip the project.
    pub fn run<G, F>(&self, rows: &[DatasetRow], mut open_graph: F) -> ReconcileReport
    where
        G: CommitGraph,
        F: FnMut(&DatasetRow) -> Option<G>,
    {
        let mut report = ReconcileReport::default();

        for row in rows {
            let slug = &row.project_slug;
            if self.tables.is_project_excluded(slug) {
                report.summary.excluded += 1;
                continue;
            }

            info!("Checking project: {}", slug);
            let Some(graph) = open_graph(row) else {
                report.summary.skipped += 1;
                continue;
            };

            let outcome = self.reconcile_row(&graph, row);
            report.summary.processed += 1;
            report.summary.warnings += outcome.warnings.len();
            if !outcome.warnings.is_empty() {
                report
                    .warnings
                    .entry(slug.clone())
                    .or_default()
                    .extend(outcome.warnings);
            }
            report.records.push(outcome.record);
        }

        report.records.sort();
        report
    }
}

/// Reconcile the dataset at `config.dataset_path()` against the buggy-tree
/// clones and write the refined dataset once every project is done.
pub fn reconcile_local_clones(
    config: &BenchConfig,
    tables: ExclusionTables,
) -> DatasetResult<ReconcileReport> {
    let rows = dataset::read_dataset(&config.dataset_path())?;
    let reconciler = Reconciler::new(tables);

    let report = reconciler.run(&rows, |row| {
        let repo_path = config.project_dir(&row.project_slug, SnapshotMode::Buggy);
        if !repo_path.exists() {
            warn!("Project directory {:?} does not exist. Skipping.", repo_path);
            return None;
        }
        let repo = GitRepo::open(repo_path);
        repo.prepare_history();
        Some(repo)
    });

    dataset::write_refined(&config.refined_dataset_path(), &report.records)?;
    Ok(report)
}

fn refined(row: &DatasetRow, buggy_commit_id: String, last_fix_commit_id: String) -> RefinedRecord {
    RefinedRecord {
        project_slug: row.project_slug.clone(),
        cwe_id: row.cwe_id.clone(),
        github_url: row.github_url.clone(),
        buggy_commit_id,
        last_fix_commit_id,
    }
}

fn describe_date<G: CommitGraph + ?Sized>(graph: &G, commit: &str) -> String {
    graph
        .commit_date(commit)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "(date unknown)".to_string())
}
