//! Filesystem layout of a benchmark checkout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fetch::SnapshotMode;

/// Environment variable naming the benchmark root directory.
pub const ROOT_ENV: &str = "VULNFIX_ROOT";

/// Paths consumed and produced by the reconciler and the fetcher, all
/// relative to one root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub root: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            root: std::env::var(ROOT_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl BenchConfig {
    /// Root from `VULNFIX_ROOT`, else the current directory.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        BenchConfig { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Curated input dataset.
    pub fn dataset_path(&self) -> PathBuf {
        self.root.join("data").join("project_info.csv")
    }

    /// Refined output dataset.
    pub fn refined_dataset_path(&self) -> PathBuf {
        self.root.join("data").join("project_info_fixed.csv")
    }

    pub fn sources_dir(&self, mode: SnapshotMode) -> PathBuf {
        self.root.join(mode.sources_dir_name())
    }

    pub fn project_dir(&self, slug: &str, mode: SnapshotMode) -> PathBuf {
        self.sources_dir(mode).join(slug)
    }

    pub fn patches_dir(&self) -> PathBuf {
        self.root.join("patches")
    }

    pub fn patch_path(&self, slug: &str) -> PathBuf {
        self.patches_dir().join(format!("{slug}.patch"))
    }
}
