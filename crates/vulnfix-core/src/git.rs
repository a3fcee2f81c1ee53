//! Git integration: the commit graph of a local clone and the clone/fetch
//! primitives used to materialize snapshots.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::NaiveDate;
use tracing::debug;

use crate::ancestry::CommitGraph;
use crate::error::{GitError, GitResult};

/// A local git working copy, queried and driven through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone `url` into `dest`. `depth` limits the fetched history.
    pub fn clone_remote(url: &str, dest: &Path, depth: Option<u32>) -> GitResult<Self> {
        reject_option_like(url)?;
        let dest_arg = dest.to_string_lossy();
        let depth_arg = depth.map(|d| d.to_string());
        let mut args = vec!["clone"];
        if let Some(depth) = depth_arg.as_deref() {
            args.extend(["--depth", depth]);
        }
        args.extend(["--", url, &*dest_arg]);

        run_git(None, &args)?;
        Ok(Self::open(dest))
    }

    /// Fetch a single commit from `origin` by identifier.
    pub fn fetch_commit(&self, commit: &str, depth: Option<u32>) -> GitResult<()> {
        reject_option_like(commit)?;
        let depth_arg = depth.map(|d| d.to_string());
        let mut args = vec!["fetch"];
        if let Some(depth) = depth_arg.as_deref() {
            args.extend(["--depth", depth]);
        }
        args.extend(["origin", commit]);

        run_git(Some(&self.path), &args).map(|_| ())
    }

    pub fn checkout(&self, commit: &str) -> GitResult<()> {
        reject_option_like(commit)?;
        run_git(Some(&self.path), &["checkout", commit]).map(|_| ())
    }

    /// Apply a unified diff to the working tree.
    pub fn apply_patch(&self, patch: &Path) -> GitResult<()> {
        let patch_arg = patch.to_string_lossy();
        run_git(Some(&self.path), &["apply", &*patch_arg]).map(|_| ())
    }

    /// Deepen a shallow clone and pull tags so fix commits reachable only
    /// from older history or tags become visible to ancestry queries.
    ///
    /// Both steps fail routinely (complete clones, no remote) and are only
    /// logged.
    pub fn prepare_history(&self) {
        for args in [["fetch", "--unshallow"], ["fetch", "--tags"]] {
            if let Err(e) = run_git(Some(&self.path), &args) {
                debug!("{:?}: {}", self.path, e);
            }
        }
    }

    /// HEAD commit SHA of the working copy.
    pub fn head_sha(&self) -> GitResult<String> {
        let sha = run_git(Some(&self.path), &["rev-parse", "HEAD"])?;
        if sha.is_empty() {
            return Err(GitError::CommandFailed {
                command: "rev-parse HEAD".to_string(),
                status: "exit status: 0".to_string(),
                stderr: "empty output".to_string(),
            });
        }
        Ok(sha)
    }

    fn output(&self, args: &[&str]) -> Option<Output> {
        match Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
        {
            Ok(output) => Some(output),
            Err(e) => {
                debug!("failed to run git {}: {}", args.join(" "), e);
                None
            }
        }
    }
}

impl CommitGraph for GitRepo {
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Option<bool> {
        if is_option_like(ancestor) || is_option_like(descendant) {
            return None;
        }
        let output = self.output(&["merge-base", "--is-ancestor", ancestor, descendant])?;
        // 0: ancestor, 1: not an ancestor, anything else: unknown object etc.
        match output.status.code() {
            Some(0) => Some(true),
            Some(1) => Some(false),
            _ => {
                debug!(
                    "merge-base --is-ancestor {} {} failed: {}",
                    ancestor,
                    descendant,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
        }
    }

    fn first_parent(&self, commit: &str) -> Option<String> {
        if is_option_like(commit) {
            return None;
        }
        let rev = format!("{commit}^");
        let output = self.output(&["rev-parse", "--verify", "--quiet", &rev])?;
        if !output.status.success() {
            return None;
        }
        let parent = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!parent.is_empty()).then_some(parent)
    }

    fn commit_date(&self, commit: &str) -> Option<NaiveDate> {
        if is_option_like(commit) {
            return None;
        }
        let output = self.output(&["show", "-s", "--format=%cd", "--date=short", commit])?;
        if !output.status.success() {
            return None;
        }
        let date = String::from_utf8_lossy(&output.stdout);
        NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
    }
}

/// Dataset values are passed positionally; one starting with `-` would be
/// parsed by git as a flag.
fn is_option_like(value: &str) -> bool {
    value.trim_start().starts_with('-')
}

fn reject_option_like(value: &str) -> GitResult<()> {
    if is_option_like(value) {
        return Err(GitError::OptionLikeArgument {
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Run `git <args>` and return trimmed stdout, failing on a non-zero exit.
pub fn run_git(dir: Option<&Path>, args: &[&str]) -> GitResult<String> {
    let command = args.join(" ");
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|source| GitError::Spawn {
        command: command.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn run(repo_dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .env("GIT_COMMITTER_DATE", "2023-06-15T12:00:00")
            .env("GIT_AUTHOR_DATE", "2023-06-15T12:00:00")
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn commit(repo_dir: &Path, message: &str) -> String {
        run(repo_dir, &["commit", "--allow-empty", "-m", message]);
        run(repo_dir, &["rev-parse", "HEAD"])
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["init"]);
        run(dir.path(), &["config", "user.name", "test-user"]);
        run(dir.path(), &["config", "user.email", "test@example.com"]);
        dir
    }

    #[test]
    fn is_ancestor_follows_history() {
        let dir = make_git_repo();
        let first = commit(dir.path(), "first");
        let second = commit(dir.path(), "second");
        let repo = GitRepo::open(dir.path());

        assert_eq!(repo.is_ancestor(&first, &second), Some(true));
        assert_eq!(repo.is_ancestor(&second, &first), Some(false));
        assert_eq!(repo.is_ancestor(&first, &first), Some(true));
    }

    #[test]
    fn is_ancestor_unknown_commit_is_none() {
        let dir = make_git_repo();
        let first = commit(dir.path(), "first");
        let repo = GitRepo::open(dir.path());

        let missing = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(repo.is_ancestor(missing, &first), None);
    }

    #[test]
    fn first_parent_of_root_is_none() {
        let dir = make_git_repo();
        let root = commit(dir.path(), "root");
        let child = commit(dir.path(), "child");
        let repo = GitRepo::open(dir.path());

        assert_eq!(repo.first_parent(&child).as_deref(), Some(root.as_str()));
        assert_eq!(repo.first_parent(&root), None);
    }

    #[test]
    fn commit_date_is_parsed() {
        let dir = make_git_repo();
        let sha = commit(dir.path(), "dated");
        let repo = GitRepo::open(dir.path());

        assert_eq!(
            repo.commit_date(&sha),
            NaiveDate::from_ymd_opt(2023, 6, 15)
        );
    }

    #[test]
    fn head_sha_returns_40_hex_chars() {
        let dir = make_git_repo();
        commit(dir.path(), "initial");
        let sha = GitRepo::open(dir.path()).head_sha().unwrap();
        assert_eq!(sha.len(), 40, "SHA should be 40 hex chars, got: {sha}");
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn run_git_reports_failure_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_git(Some(dir.path()), &["rev-parse", "HEAD"]).unwrap_err();
        match err {
            GitError::CommandFailed { command, stderr, .. } => {
                assert_eq!(command, "rev-parse HEAD");
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn option_like_values_never_reach_git() {
        let dir = make_git_repo();
        let sha = commit(dir.path(), "only");
        let repo = GitRepo::open(dir.path());

        let err = repo.checkout("--orphan=evil").unwrap_err();
        assert!(
            matches!(err, GitError::OptionLikeArgument { ref value } if value == "--orphan=evil")
        );
        assert!(repo.fetch_commit("--upload-pack=touch pwned", None).is_err());
        assert_eq!(repo.is_ancestor("--all", &sha), None);
        assert_eq!(repo.first_parent("-h"), None);
        assert_eq!(repo.head_sha().unwrap(), sha);

        let dest = dir.path().join("clone");
        let err = GitRepo::clone_remote("--upload-pack=touch pwned", &dest, Some(1)).unwrap_err();
        assert!(matches!(err, GitError::OptionLikeArgument { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn prepare_history_tolerates_complete_clone() {
        let dir = make_git_repo();
        let sha = commit(dir.path(), "only");
        let repo = GitRepo::open(dir.path());
        repo.prepare_history();
        assert_eq!(repo.head_sha().unwrap(), sha);
    }
}
