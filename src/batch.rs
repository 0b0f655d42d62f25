// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Batch assembly.
//!
//! A batch is only handed out after its proof has been re-verified against
//! the tree root. There is no way to build a [`Batch`] that skips the check.

use crate::error::{KernelError, Result};
use crate::multiproof::MultiProof;
use crate::planner::BatchRange;
use crate::tree::MerkleTree;
use crate::types::{Entry, Hash32};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub range: BatchRange,
    /// Entries in proof (tree) order, as the verifier consumes them.
    pub entries: Vec<Entry>,
    pub multi_proof: MultiProof,
    pub root: Hash32,
}

impl Batch {
    pub fn number(&self) -> u64 {
        self.range.number
    }

    pub fn pair_count(&self) -> usize {
        self.entries.len()
    }
}

/// Generates the multi-proof for `range` and verifies it locally.
pub fn prove_batch<T: MerkleTree + ?Sized>(tree: &T, range: &BatchRange) -> Result<Batch> {
    let indices: Vec<usize> = range.indices().collect();
    let multi_proof = tree.multi_proof(&indices)?;

    // Always re-derived, never trusted.
    let valid = match tree.verify_multi_proof(&multi_proof) {
        Ok(valid) => valid,
        Err(KernelError::InvalidMultiProof(_)) => false,
        Err(e) => return Err(e),
    };
    if !valid || multi_proof.leaves.len() != indices.len() {
        return Err(KernelError::ProofIntegrity { batch: range.number });
    }

    Ok(Batch {
        range: *range,
        entries: multi_proof.leaves.clone(),
        multi_proof,
        root: tree.root(),
    })
}
