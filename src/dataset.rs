// src/dataset.rs
//! Dated CSV files: `<prefix>_<YYYY-MM-DD>.csv`, one per run, never rewritten in place.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DatasetError;

/// `headlines` + 2025-06-10 -> `headlines_2025-06-10.csv`
pub fn dated_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.csv", date.format("%Y-%m-%d"))
}

/// Trailing `YYYY-MM-DD` of a dated file name, if any.
pub fn date_from_filename(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let tail = stem.get(stem.len().checked_sub(10)?..)?;
    NaiveDate::parse_from_str(tail, "%Y-%m-%d").ok()
}

/// Write `records` to `dir/filename` with a header row.
///
/// Empty input is not an error: nothing is written and `None` is returned.
pub fn persist<T: Serialize>(records: &[T], dir: &Path, filename: &str) -> Result<Option<PathBuf>> {
    if records.is_empty() {
        tracing::info!(dir = %dir.display(), filename, "no records to save");
        return Ok(None);
    }

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(filename);
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
    for rec in records {
        writer
            .serialize(rec)
            .with_context(|| format!("writing row to {}", path.display()))?;
    }
    writer.flush().with_context(|| format!("flushing {}", path.display()))?;

    tracing::info!(rows = records.len(), path = %path.display(), "saved");
    Ok(Some(path))
}

/// Read every row of a CSV written by [`persist`].
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for (i, row) in reader.deserialize().enumerate() {
        let rec: T = row.with_context(|| format!("parsing row {} of {}", i + 1, path.display()))?;
        out.push(rec);
    }
    Ok(out)
}

/// All `<prefix>_*.csv` files in `dir`, oldest first (ISO dates sort lexically).
pub fn list_dated(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let head = format!("{prefix}_");
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension().and_then(|s| s.to_str()) == Some("csv")
                && p.file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|n| n.starts_with(&head))
        })
        .collect();
    files.sort();
    files
}

/// Most recently dated file, or `None` if the directory has none.
pub fn latest(dir: &Path, prefix: &str) -> Option<PathBuf> {
    list_dated(dir, prefix).pop()
}

/// Like [`latest`], but a missing file is a [`DatasetError::NoInput`].
pub fn require_latest(dir: &Path, prefix: &str) -> Result<PathBuf> {
    latest(dir, prefix).ok_or_else(|| {
        DatasetError::NoInput {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }
        .into()
    })
}
