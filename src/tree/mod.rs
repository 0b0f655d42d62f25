// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Merkle tree abstraction.
//!
//! The batching core only needs four things from a tree: its root, its
//! leaves, a multi-proof for an index set, and a way to check one. Anything
//! implementing [`MerkleTree`] can be batched and proved.

pub mod standard;

use core::ops::Range;

use crate::error::Result;
use crate::hash::leaf_hash;
use crate::multiproof::{process_multi_proof, MultiProof};
use crate::types::{Entry, Hash32};

pub use standard::StandardTree;

pub trait MerkleTree {
    /// Root committing to every entry.
    fn root(&self) -> Hash32;

    /// Number of entries (leaves).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry at a value index, in canonical value order.
    fn entry(&self, index: usize) -> Option<&Entry>;

    /// Enumerates every valid leaf index.
    fn leaf_indices(&self) -> Range<usize> {
        0..self.len()
    }

    /// Multi-proof covering exactly the given value indices.
    fn multi_proof(&self, indices: &[usize]) -> Result<MultiProof>;

    /// Re-derives the root from the proof and compares it with [`MerkleTree::root`].
    fn verify_multi_proof(&self, proof: &MultiProof) -> Result<bool> {
        Ok(derive_root(proof)? == self.root())
    }
}

/// Root implied by a multi-proof under standard leaf hashing.
pub fn derive_root(proof: &MultiProof) -> Result<Hash32> {
    let leaves: Vec<Hash32> = proof.leaves.iter().map(leaf_hash).collect();
    process_multi_proof(&leaves, &proof.proof, &proof.proof_flags)
}
