// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Invalid batch size {size}: must be between 1 and {max}")]
    InvalidBatchSize { size: usize, max: usize },

    #[error("Invalid max batches: must be positive")]
    InvalidMaxBatches,

    #[error("Leaf index {index} out of range for tree with {len} leaves")]
    LeafOutOfRange { index: usize, len: usize },

    #[error("Leaf index {0} requested more than once")]
    DuplicateLeaf(usize),

    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("Invalid multiproof: {0}")]
    InvalidMultiProof(String),

    #[error("Proof verification failed for batch {batch}")]
    ProofIntegrity { batch: u64 },

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Tree JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

impl KernelError {
    /// True for errors caused by invalid run parameters rather than data.
    pub fn is_config(&self) -> bool {
        matches!(self, KernelError::InvalidBatchSize { .. } | KernelError::InvalidMaxBatches)
    }
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
