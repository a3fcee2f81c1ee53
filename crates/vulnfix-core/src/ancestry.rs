//! Ancestry queries and fix-commit selection over a commit graph.
//!
//! Candidate fix commits form a partial order under the ancestor relation.
//! The finders here pick an earliest/latest element with a single linear
//! scan: the first candidate seeds the result and is replaced only by a
//! strictly better related candidate. Incomparable pairs keep the current
//! result and are reported as [`UnrelatedCommits`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Read-only view of a version-control history graph.
///
/// Every query answers `None` when the graph cannot tell (unknown commit,
/// truncated history, tool failure). Callers treat that as "incomparable".
pub trait CommitGraph {
    /// `Some(true)` iff `ancestor` is reachable from `descendant` along
    /// parent links. A commit is its own ancestor.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Option<bool>;

    /// First parent of `commit`, or `None` for a root or unknown commit.
    fn first_parent(&self, commit: &str) -> Option<String>;

    /// Committer date of `commit`.
    fn commit_date(&self, commit: &str) -> Option<NaiveDate>;
}

/// Two fix candidates with no ancestry relation in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrelatedCommits {
    /// Candidate being examined.
    pub candidate: String,
    /// Result held at the time of the comparison (kept).
    pub current: String,
}

/// Outcome of an earliest/latest scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub commit: String,
    pub unrelated: Vec<UnrelatedCommits>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Earliest,
    Latest,
}

/// Ancestry check that never fails: blank identifiers and unanswerable
/// queries yield `None`.
pub fn is_ancestor<G: CommitGraph + ?Sized>(
    graph: &G,
    ancestor: &str,
    descendant: &str,
) -> Option<bool> {
    let (ancestor, descendant) = (ancestor.trim(), descendant.trim());
    if ancestor.is_empty() || descendant.is_empty() {
        return None;
    }
    graph.is_ancestor(ancestor, descendant)
}

/// Earliest candidate by ancestry. `None` only for an empty input.
pub fn find_earliest_fix_commit<G: CommitGraph + ?Sized>(
    graph: &G,
    commits: &[String],
) -> Option<Selection> {
    scan(graph, commits, Direction::Earliest)
}

/// Latest candidate by ancestry. `None` only for an empty input.
pub fn find_latest_fix_commit<G: CommitGraph + ?Sized>(
    graph: &G,
    commits: &[String],
) -> Option<Selection> {
    scan(graph, commits, Direction::Latest)
}

/// First parent of `commit`; `None` for a root or unknown commit.
pub fn find_immediate_predecessor<G: CommitGraph + ?Sized>(
    graph: &G,
    commit: &str,
) -> Option<String> {
    let commit = commit.trim();
    if commit.is_empty() {
        return None;
    }
    graph
        .first_parent(commit)
        .map(|parent| parent.trim().to_string())
        .filter(|parent| !parent.is_empty())
}

fn scan<G: CommitGraph + ?Sized>(
    graph: &G,
    commits: &[String],
    direction: Direction,
) -> Option<Selection> {
    let mut current = commits.first()?.clone();
    let mut unrelated = Vec::new();

    for candidate in commits {
        if *candidate == current {
            continue;
        }
        let (older, newer) = match direction {
            Direction::Earliest => (candidate.as_str(), current.as_str()),
            Direction::Latest => (current.as_str(), candidate.as_str()),
        };
        if is_ancestor(graph, older, newer) == Some(true) {
            current = candidate.clone();
        } else if is_ancestor(graph, newer, older) != Some(true) {
            warn!("fix commits {} and {} are not related", candidate, current);
            unrelated.push(UnrelatedCommits {
                candidate: candidate.clone(),
                current: current.clone(),
            });
        }
    }

    Some(Selection {
        commit: current,
        unrelated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryGraph;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn chain() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph.add_commit("root", &[]);
        graph.add_commit("a", &["root"]);
        graph.add_commit("b", &["a"]);
        graph.add_commit("c", &["b"]);
        graph
    }

    fn forked() -> MemoryGraph {
        // root -> x (branch one), root -> y (branch two)
        let mut graph = MemoryGraph::new();
        graph.add_commit("root", &[]);
        graph.add_commit("x", &["root"]);
        graph.add_commit("y", &["root"]);
        graph
    }

    #[test]
    fn chain_earliest_and_latest_for_every_order() {
        let graph = chain();
        let orders = [
            ["a", "b", "c"],
            ["a", "c", "b"],
            ["b", "a", "c"],
            ["b", "c", "a"],
            ["c", "a", "b"],
            ["c", "b", "a"],
        ];
        for order in orders {
            let commits = ids(&order);
            let earliest = find_earliest_fix_commit(&graph, &commits).unwrap();
            let latest = find_latest_fix_commit(&graph, &commits).unwrap();
            assert_eq!(earliest.commit, "a", "order {order:?}");
            assert_eq!(latest.commit, "c", "order {order:?}");
            assert!(earliest.unrelated.is_empty());
            assert!(latest.unrelated.is_empty());
        }
    }

    #[test]
    fn incomparable_pair_keeps_first_and_warns_once() {
        let graph = forked();
        let commits = ids(&["y", "x"]);

        let earliest = find_earliest_fix_commit(&graph, &commits).unwrap();
        assert_eq!(earliest.commit, "y");
        assert_eq!(
            earliest.unrelated,
            vec![UnrelatedCommits {
                candidate: "x".to_string(),
                current: "y".to_string(),
            }]
        );

        let latest = find_latest_fix_commit(&graph, &commits).unwrap();
        assert_eq!(latest.commit, "y");
        assert_eq!(latest.unrelated.len(), 1);
    }

    #[test]
    fn unknown_commit_is_treated_as_incomparable() {
        let graph = chain();
        let commits = ids(&["b", "deadbeef"]);

        let earliest = find_earliest_fix_commit(&graph, &commits).unwrap();
        assert_eq!(earliest.commit, "b");
        assert_eq!(earliest.unrelated.len(), 1);
        assert_eq!(is_ancestor(&graph, "deadbeef", "b"), None);
    }

    #[test]
    fn duplicates_are_skipped_without_warnings() {
        let graph = chain();
        let commits = ids(&["b", "b", "a", "a"]);
        let earliest = find_earliest_fix_commit(&graph, &commits).unwrap();
        assert_eq!(earliest.commit, "a");
        assert!(earliest.unrelated.is_empty());
    }

    #[test]
    fn single_candidate_is_returned_as_is() {
        let graph = MemoryGraph::new();
        let commits = ids(&["lonely"]);
        assert_eq!(
            find_latest_fix_commit(&graph, &commits).unwrap().commit,
            "lonely"
        );
    }

    #[test]
    fn empty_candidates_yield_none() {
        let graph = chain();
        assert!(find_earliest_fix_commit(&graph, &[]).is_none());
        assert!(find_latest_fix_commit(&graph, &[]).is_none());
    }

    #[test]
    fn first_element_wins_among_many_incomparables() {
        let mut graph = forked();
        graph.add_commit("z", &["root"]);
        let commits = ids(&["z", "x", "y"]);
        let latest = find_latest_fix_commit(&graph, &commits).unwrap();
        assert_eq!(latest.commit, "z");
        assert_eq!(latest.unrelated.len(), 2);
    }

    #[test]
    fn is_ancestor_is_reflexive_and_transitive() {
        let graph = chain();
        assert_eq!(is_ancestor(&graph, "b", "b"), Some(true));
        assert_eq!(is_ancestor(&graph, "root", "c"), Some(true));
        assert_eq!(is_ancestor(&graph, "c", "root"), Some(false));
        assert_eq!(is_ancestor(&graph, "", "c"), None);
    }

    #[test]
    fn predecessor_of_single_parent_commit() {
        let graph = chain();
        assert_eq!(find_immediate_predecessor(&graph, "b").as_deref(), Some("a"));
    }

    #[test]
    fn predecessor_of_root_or_unknown_is_empty() {
        let graph = chain();
        assert_eq!(find_immediate_predecessor(&graph, "root"), None);
        assert_eq!(find_immediate_predecessor(&graph, "missing"), None);
        assert_eq!(find_immediate_predecessor(&graph, ""), None);
    }

    #[test]
    fn predecessor_of_merge_is_first_parent() {
        let mut graph = forked();
        graph.add_commit("merge", &["x", "y"]);
        assert_eq!(
            find_immediate_predecessor(&graph, "merge").as_deref(),
            Some("x")
        );
    }
}
