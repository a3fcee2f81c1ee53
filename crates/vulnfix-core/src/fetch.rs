//! Source snapshot fetching.
//!
//! [`SourceFetcher`] materializes a project's working copy at the buggy or
//! the fixed commit recorded in the refined dataset. An existing target
//! directory counts as already fetched, so batches can be re-run safely.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BenchConfig;
use crate::dataset::{self, RefinedRecord};
use crate::error::{FetchError, FetchResult, GitResult};
use crate::git::GitRepo;

/// Which snapshot of a project to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotMode {
    /// Last commit before the earliest fix; shallow, patched.
    Buggy,
    /// Latest fix commit; full history, never patched.
    Fixed,
}

impl SnapshotMode {
    pub fn from_fixed_flag(fixed: bool) -> Self {
        if fixed {
            SnapshotMode::Fixed
        } else {
            SnapshotMode::Buggy
        }
    }

    pub fn commit<'a>(&self, record: &'a RefinedRecord) -> &'a str {
        match self {
            SnapshotMode::Buggy => &record.buggy_commit_id,
            SnapshotMode::Fixed => &record.last_fix_commit_id,
        }
    }

    /// History depth for clone and fetch; `None` is unbounded.
    pub fn depth(&self) -> Option<u32> {
        match self {
            SnapshotMode::Buggy => Some(1),
            SnapshotMode::Fixed => None,
        }
    }

    pub fn sources_dir_name(&self) -> &'static str {
        match self {
            SnapshotMode::Buggy => "project-sources",
            SnapshotMode::Fixed => "project-sources-fixed",
        }
    }
}

impl fmt::Display for SnapshotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotMode::Buggy => write!(f, "buggy"),
            SnapshotMode::Fixed => write!(f, "fixed"),
        }
    }
}

/// What happened with the project's source patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
    Applied(PathBuf),
    /// `git apply` failed; the checkout is kept as is.
    Failed { path: PathBuf, error: String },
    /// No `<slug>.patch` in the patch directory.
    NotFound,
    /// Fixed snapshots are never patched.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Target directory already existed; nothing was run.
    AlreadyPresent(PathBuf),
    Fetched {
        dir: PathBuf,
        commit: String,
        patch: PatchStatus,
    },
}

/// Clones project snapshots into the layout described by [`BenchConfig`].
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    config: BenchConfig,
}

impl SourceFetcher {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    /// Fetch `slug` as recorded in the refined dataset.
    pub fn fetch(&self, slug: &str, mode: SnapshotMode) -> FetchResult<FetchOutcome> {
        let record = dataset::find_refined(&self.config.refined_dataset_path(), slug)?
            .ok_or_else(|| FetchError::RecordNotFound {
                slug: slug.to_string(),
            })?;
        self.fetch_record(&record, mode)
    }

    /// Fetch a record without consulting the refined dataset.
    pub fn fetch_record(
        &self,
        record: &RefinedRecord,
        mode: SnapshotMode,
    ) -> FetchResult<FetchOutcome> {
        let slug = record.project_slug.as_str();
        let target = self.config.project_dir(slug, mode);

        if target.exists() {
            info!(">> [vulnfix/fetch] {:?} already exists; skipping", target);
            return Ok(FetchOutcome::AlreadyPresent(target));
        }

        let commit = mode.commit(record).trim();
        if commit.is_empty() {
            return Err(FetchError::MissingCommit {
                slug: slug.to_string(),
                mode: mode.to_string(),
            });
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let repo = match checkout_snapshot(&record.github_url, &target, commit, mode) {
            Ok(repo) => repo,
            Err(e) => {
                // A leftover directory would turn every retry into a no-op.
                discard_partial(&target);
                return Err(e.into());
            }
        };

        let patch = match mode {
            SnapshotMode::Buggy => self.apply_patch(&repo, slug),
            SnapshotMode::Fixed => PatchStatus::NotApplicable,
        };

        Ok(FetchOutcome::Fetched {
            dir: target,
            commit: commit.to_string(),
            patch,
        })
    }

    fn apply_patch(&self, repo: &GitRepo, slug: &str) -> PatchStatus {
        let patch = self.config.patch_path(slug);
        if !patch.exists() {
            info!(">> [vulnfix/fetch] There is no patch; skipping patching the repository");
            return PatchStatus::NotFound;
        }

        info!(">> [vulnfix/fetch] Applying patch {:?}...", patch);
        match repo.apply_patch(&patch) {
            Ok(()) => PatchStatus::Applied(patch),
            Err(e) => {
                warn!(">> [vulnfix/fetch] patch {:?} failed: {}", patch, e);
                PatchStatus::Failed {
                    path: patch,
                    error: e.to_string(),
                }
            }
        }
    }
}

fn checkout_snapshot(
    url: &str,
    target: &Path,
    commit: &str,
    mode: SnapshotMode,
) -> GitResult<GitRepo> {
    info!(">> [vulnfix/fetch] Cloning repository from `{}`...", url);
    let repo = GitRepo::clone_remote(url, target, mode.depth())?;

    info!(
        ">> [vulnfix/fetch] Fetching and checking out commit `{}`...",
        commit
    );
    match mode {
        SnapshotMode::Buggy => repo.fetch_commit(commit, mode.depth())?,
        // A full clone already holds the history, and `git fetch` cannot
        // resolve abbreviated ids; the checkout below is the real check.
        SnapshotMode::Fixed => {
            if let Err(e) = repo.fetch_commit(commit, mode.depth()) {
                debug!("fetch of {} skipped: {}", commit, e);
            }
        }
    }
    repo.checkout(commit)?;
    Ok(repo)
}

fn discard_partial(target: &Path) {
    if target.exists() {
        if let Err(e) = std::fs::remove_dir_all(target) {
            warn!("failed to remove partial checkout {:?}: {}", target, e);
        }
    }
}
