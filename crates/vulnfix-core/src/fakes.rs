//! In-memory commit graph (testing only)
//!
//! `MemoryGraph` satisfies the [`CommitGraph`] contract without invoking
//! git, so ancestry selection and reconciliation can run against synthetic
//! histories.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDate;

use crate::ancestry::CommitGraph;

/// Commit DAG held as `commit -> ordered parents`.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    parents: HashMap<String, Vec<String>>,
    dates: HashMap<String, NaiveDate>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` with its parents, first parent first. Parents need not
    /// be registered; unregistered ids are unknown to every query.
    pub fn add_commit(&mut self, id: &str, parents: &[&str]) {
        self.parents.insert(
            id.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn set_date(&mut self, id: &str, date: NaiveDate) {
        self.dates.insert(id.to_string(), date);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }
}

impl CommitGraph for MemoryGraph {
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Option<bool> {
        if !self.contains(ancestor) || !self.contains(descendant) {
            return None;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([descendant]);
        while let Some(current) = queue.pop_front() {
            if current == ancestor {
                return Some(true);
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(parents) = self.parents.get(current) {
                queue.extend(parents.iter().map(String::as_str));
            }
        }
        Some(false)
    }

    fn first_parent(&self, commit: &str) -> Option<String> {
        self.parents.get(commit)?.first().cloned()
    }

    fn commit_date(&self, commit: &str) -> Option<NaiveDate> {
        self.dates.get(commit).copied()
    }
}
