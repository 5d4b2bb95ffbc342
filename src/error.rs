//! Error types shared by the loader, resolver and server

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The dataset could not be read or does not match the fixed schema.
    #[error("dataset unavailable ({path}): {reason}")]
    DataUnavailable { path: PathBuf, reason: String },

    /// No row carries the sample id configured as the starting image.
    #[error("starting sample {sample} not found in dataset")]
    StartingSampleMissing { sample: i64 },

    /// A point index past the end of the point table.
    #[error("point index {index} out of range (table has {len} points)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn data(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::DataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
