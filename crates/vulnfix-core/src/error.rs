//! Error taxonomy for vulnfix-bench.

use std::path::PathBuf;

/// Errors produced while invoking the `git` binary.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("refusing to pass {value:?} to git: it would be read as an option")]
    OptionLikeArgument { value: String },
}

/// Errors produced while reading or writing dataset CSV files.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to open dataset {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to persist dataset to {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while loading exclusion tables.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read exclusion tables {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid exclusion tables: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced by the source fetcher.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("record not found in refined dataset: {slug}")]
    RecordNotFound { slug: String },

    #[error("project {slug} has no {mode} commit recorded")]
    MissingCommit { slug: String, mode: String },

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("external command failed: {0}")]
    Git(#[from] GitError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GitResult<T> = std::result::Result<T, GitError>;
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type FetchResult<T> = std::result::Result<T, FetchError>;
