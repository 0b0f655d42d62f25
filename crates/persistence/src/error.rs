// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Record not found: {0}")]
    NotFound(PathBuf),
    #[error("Corrupt record {path}: {reason}")]
    CorruptRecord { path: PathBuf, reason: String },
    #[error("Record for batch {batch} already exists at {path}")]
    RecordExists { batch: u64, path: PathBuf },
    #[error("Batch {batch} is stored twice ({first} and {second})")]
    DuplicateBatch {
        batch: u64,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Batch sequence has a gap: expected batch {expected}, found {found}")]
    MissingBatch { expected: u64, found: u64 },
    #[error("Refusing to write invalid record for batch {batch}: {reason}")]
    InvalidRecord { batch: u64, reason: String },
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
