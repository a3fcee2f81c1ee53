//! CSV dataset records: the curated input table and the refined output.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{DatasetError, DatasetResult};

/// Header of the refined dataset, in column order.
pub const REFINED_HEADER: [&str; 5] = [
    "project_slug",
    "cwe_id",
    "github_url",
    "buggy_commit_id",
    "last_fix_commit_id",
];

/// One row of the curated input dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub project_slug: String,
    pub cwe_id: String,
    pub github_url: String,
    #[serde(default)]
    pub buggy_commit_id: String,
    /// `;`-delimited candidate fix commits, in curated order.
    pub fix_commit_ids: String,
}

impl DatasetRow {
    /// Candidate fix commits in curated order, blanks dropped.
    pub fn fix_commits(&self) -> Vec<String> {
        self.fix_commit_ids
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One row of the refined dataset.
///
/// Field order matters: the derived `Ord` sorts by slug first, then by the
/// remaining columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefinedRecord {
    pub project_slug: String,
    pub cwe_id: String,
    pub github_url: String,
    pub buggy_commit_id: String,
    pub last_fix_commit_id: String,
}

pub fn read_dataset(path: &Path) -> DatasetResult<Vec<DatasetRow>> {
    read_dataset_from(open(path)?)
}

pub fn read_dataset_from<R: Read>(reader: R) -> DatasetResult<Vec<DatasetRow>> {
    deserialize_all(reader)
}

pub fn read_refined(path: &Path) -> DatasetResult<Vec<RefinedRecord>> {
    deserialize_all(open(path)?)
}

/// Look up a refined record by slug. The last matching row wins.
pub fn find_refined(path: &Path, slug: &str) -> DatasetResult<Option<RefinedRecord>> {
    Ok(read_refined(path)?
        .into_iter()
        .filter(|r| r.project_slug == slug)
        .last())
}

/// Serialize `records` sorted, header first (also for an empty set).
pub fn write_refined_to<W: Write>(writer: W, records: &[RefinedRecord]) -> DatasetResult<()> {
    let mut sorted = records.to_vec();
    sorted.sort();

    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    w.write_record(REFINED_HEADER)?;
    for record in &sorted {
        w.serialize(record)?;
    }
    w.flush()?;
    Ok(())
}

/// Write the refined dataset through a temporary file in the target
/// directory, then rename it into place.
pub fn write_refined(path: &Path, records: &[RefinedRecord]) -> DatasetResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_refined_to(tmp.as_file_mut(), records)?;
    tmp.persist(path).map_err(|e| DatasetError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

fn open(path: &Path) -> DatasetResult<std::fs::File> {
    std::fs::File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn deserialize_all<R: Read, T: serde::de::DeserializeOwned>(reader: R) -> DatasetResult<Vec<T>> {
    let mut r = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in r.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
