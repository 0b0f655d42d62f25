// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::PathBuf;

use batchproof_kernel::{Hash32, KernelError};
use batchproof_persistence::StoreError;
use thiserror::Error;

use crate::ledger::LedgerError;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tree file not found: {0:?}")]
    TreeFileMissing(PathBuf),

    #[error("Proof verification failed for batches {batches:?}")]
    IntegrityFailures { batches: Vec<u64> },

    #[error("No proof records found in {0:?}")]
    NoRecords(PathBuf),

    #[error("Merkle root mismatch: records commit to {expected}, remote reports {remote}")]
    RootMismatch { expected: Hash32, remote: Hash32 },

    #[error("Batch {batch} commits to root {found}, expected {expected}")]
    RecordRootMismatch { batch: u64, expected: Hash32, found: Hash32 },

    #[error("Batch {batch} failed after {succeeded} of {attempted} attempted batches succeeded: {reason}")]
    SubmissionFailed {
        batch: u64,
        attempted: usize,
        succeeded: usize,
        reason: String,
    },

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, RelayError>;
