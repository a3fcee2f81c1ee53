//! Manual curation tables: skipped projects, discarded fix commits and
//! explicit buggy-commit overrides.
//!
//! The tables are plain configuration handed to the reconciler; nothing in
//! this crate mutates them after construction.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Projects dropped from the refined dataset altogether.
const CURATED_EXCLUDED_PROJECTS: &[&str] = &[
    // candidate commits are unrelated to the advisory
    "alibaba__one-java-agent_CVE-2022-25842_0.0.1",
];

/// Fix candidates discarded before ancestry selection: cherry-picks of the
/// same fix onto other release lines, commits that are not fixes, and
/// commits missing from the upstream history.
const CURATED_EXCLUDED_COMMITS: &[&str] = &[
    // perwendel__spark_CVE-2018-9159_2.7.1
    "a221a864db28eb736d36041df2fa6eb8839fc5cd",
    "ce9e11517eca69e58ed4378d1e47a02bd06863cc",
    // apache__camel_CVE-2018-8041_2.20.3
    "4f401c09d22c45c94fa97746dc31905e06b19e3",
    "63c7c080de4d18f9ceb25843508710df2c2c6d4",
    "a0d25d9582c6ee85e9567fa39413df0b4f02ef7",
    // DSpace__DSpace_CVE-2022-31195_5.10
    "7af52a0883a9dbc475cf3001f04ed11b24c8a4c0",
    // DSpace__DSpace_CVE-2022-31194_5.10
    "7569c6374aefeafb996e202cf8d631020eda5f24",
    // apache__mina-sshd_CVE-2023-35887_2.9.2
    "10de190e7d3f9189deb76b8d08c72334a1fe2df0",
    "a61e93035f06bff8fc622ad94870fb773d48b9f0",
    // apache__activemq_CVE-2014-3576_5.10.2
    "00921f22ff9a8792d7663ef8fadd4823402a6324",
    // hibernate__hibernate-validator_CVE-2019-10219_6.0.17.Final
    "124b7dd6d9a4ad24d4d49f74701f05a13e56ceee",
    // asf__cxf_CVE-2016-6812_3.0.11
    "32e89366e2daa5670ac7a5c5c19f0bf9329a4c1e",
    "1f824d8039c7a42a4aa46f844e6c800e1143c7e7",
    // DSpace__DSpace_CVE-2022-31192_5.10
    "f7758457b7ec3489d525e39aa753cc70809d9ad9",
    // apache__activemq_CVE-2019-0222_5.15.8
    "98b9f2e",
    // apache__activemq_CVE-2020-11998_5.15.12
    "88b78d0",
    "aa8900c",
    "c3ada731405c5990c36bf58d50b3e61965300703",
    // wildfly__wildfly_CVE-2018-1047_11.0.0.Final: test-only commits
    "21c358acf0b06f38ec46034404c7a3d0bbbc132d",
    "9ff55ed2da845a6f604b2edd1bc3bd311f1b776c",
];

/// Buggy commits pinned by hand where the first parent of the earliest fix
/// cannot be computed locally.
const CURATED_BUGGY_OVERRIDES: &[(&str, &str)] = &[(
    "perwendel__spark_CVE-2018-9159_2.7.1",
    "99d7ddc4636b47892e0190ca170b6ecec70dec2f",
)];

/// Exclusion and override tables consulted during reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionTables {
    #[serde(default)]
    pub excluded_projects: BTreeSet<String>,
    #[serde(default)]
    pub excluded_commits: BTreeSet<String>,
    /// `project_slug -> buggy commit`
    #[serde(default)]
    pub buggy_overrides: BTreeMap<String, String>,
}

impl ExclusionTables {
    /// Empty tables: nothing excluded, nothing overridden.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tables curated for the published dataset.
    pub fn curated() -> Self {
        Self {
            excluded_projects: CURATED_EXCLUDED_PROJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_commits: CURATED_EXCLUDED_COMMITS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            buggy_overrides: CURATED_BUGGY_OVERRIDES
                .iter()
                .map(|(slug, commit)| (slug.to_string(), commit.to_string()))
                .collect(),
        }
    }

    /// Load tables from a JSON document. Missing sections default to empty.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_excluded_project(mut self, slug: &str) -> Self {
        self.excluded_projects.insert(slug.to_string());
        self
    }

    pub fn with_excluded_commit(mut self, commit: &str) -> Self {
        self.excluded_commits.insert(commit.to_string());
        self
    }

    pub fn with_buggy_override(mut self, slug: &str, commit: &str) -> Self {
        self.buggy_overrides.insert(slug.to_string(), commit.to_string());
        self
    }

    pub fn is_project_excluded(&self, slug: &str) -> bool {
        self.excluded_projects.contains(slug)
    }

    /// Exact identifier match; abbreviated ids only exclude the same
    /// abbreviation.
    pub fn is_commit_excluded(&self, commit: &str) -> bool {
        self.excluded_commits.contains(commit)
    }

    pub fn buggy_override(&self, slug: &str) -> Option<&str> {
        self.buggy_overrides.get(slug).map(String::as_str)
    }

    /// Drop excluded commits, keeping the curated order of the rest.
    pub fn filter_commits(&self, commits: &[String]) -> Vec<String> {
        commits
            .iter()
            .filter(|c| !self.is_commit_excluded(c))
            .cloned()
            .collect()
    }
}
