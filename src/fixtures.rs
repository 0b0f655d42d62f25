// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Synthetic trees for exercising the batching core without tree files.

use crate::error::Result;
use crate::hash::keccak256;
use crate::multiproof::MultiProof;
use crate::tree::MerkleTree;
use crate::types::{Address, Entry, Hash32};

/// Deterministic, distinct entries derived from their index.
pub fn sample_entries(count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| {
            let seed = keccak256(&(i as u64).to_le_bytes());
            let mut token0 = [0u8; 20];
            let mut token1 = [0u8; 20];
            token0.copy_from_slice(&seed[..20]);
            token1.copy_from_slice(&seed[12..]);
            Entry::new(Address(token0), Address(token1))
        })
        .collect()
}

/// Tree with no leaves, independent of any dump format.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTree;

impl MerkleTree for EmptyTree {
    fn root(&self) -> Hash32 {
        Hash32::ZERO
    }

    fn len(&self) -> usize {
        0
    }

    fn entry(&self, _index: usize) -> Option<&Entry> {
        None
    }

    fn multi_proof(&self, indices: &[usize]) -> Result<MultiProof> {
        match indices.first() {
            Some(&index) => Err(crate::error::KernelError::LeafOutOfRange { index, len: 0 }),
            None => Ok(MultiProof {
                leaves: Vec::new(),
                proof: vec![Hash32::ZERO],
                proof_flags: Vec::new(),
            }),
        }
    }
}

/// Wraps a tree and corrupts the proofs of selected batches, identified by
/// the first leaf index they ask for.
#[derive(Debug, Clone)]
pub struct TamperedTree<T> {
    pub inner: T,
    pub corrupt_starts: Vec<usize>,
}

impl<T: MerkleTree> TamperedTree<T> {
    pub fn new(inner: T, corrupt_starts: Vec<usize>) -> Self {
        Self { inner, corrupt_starts }
    }
}

impl<T: MerkleTree> MerkleTree for TamperedTree<T> {
    fn root(&self) -> Hash32 {
        self.inner.root()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn entry(&self, index: usize) -> Option<&Entry> {
        self.inner.entry(index)
    }

    fn multi_proof(&self, indices: &[usize]) -> Result<MultiProof> {
        let mut proof = self.inner.multi_proof(indices)?;
        if indices.first().is_some_and(|i| self.corrupt_starts.contains(i)) {
            match proof.proof.first_mut() {
                Some(h) => h.0[0] ^= 0xFF,
                None => proof.proof_flags.push(false),
            }
        }
        Ok(proof)
    }

    fn verify_multi_proof(&self, proof: &MultiProof) -> Result<bool> {
        self.inner.verify_multi_proof(proof)
    }
}
