//! Shared helpers: throwaway git repositories with deterministic dates.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

pub fn run_git(repo_dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .env("GIT_COMMITTER_DATE", "2022-03-01T10:00:00")
        .env("GIT_AUTHOR_DATE", "2022-03-01T10:00:00")
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

pub fn make_git_repo(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    run_git(dir, &["init"]);
    run_git(dir, &["config", "user.name", "test-user"]);
    run_git(dir, &["config", "user.email", "test@example.com"]);
}

/// Write `content` to `file`, commit it and return the new HEAD.
pub fn commit_file(repo_dir: &Path, file: &str, content: &str, message: &str) -> String {
    std::fs::write(repo_dir.join(file), content).unwrap();
    run_git(repo_dir, &["add", file]);
    run_git(repo_dir, &["commit", "-m", message]);
    run_git(repo_dir, &["rev-parse", "HEAD"])
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
