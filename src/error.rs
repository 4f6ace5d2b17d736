// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Dataset conditions callers branch on; everything else travels as `anyhow`.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no {prefix}_*.csv file in {}", dir.display())]
    NoInput { dir: PathBuf, prefix: String },

    #[error("Failed to create initial dataset.")]
    Bootstrap,
}

impl DatasetError {
    /// True when `err` (or anything in its chain) is a missing-input error.
    pub fn is_no_input(err: &anyhow::Error) -> bool {
        err.chain().any(|e| {
            matches!(
                e.downcast_ref::<DatasetError>(),
                Some(DatasetError::NoInput { .. })
            )
        })
    }
}
