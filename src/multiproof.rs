// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Multi-proof generation and verification over the array tree layout.
//!
//! # Layout
//! ```text
//! tree[0]           root
//! tree[2i+1]        left child of i
//! tree[2i+2]        right child of i
//! tree[len-1-k]     sorted leaf k
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::hash::hash_pair;
use crate::types::{Entry, Hash32};

/// Proof that a set of leaves belongs to a tree.
///
/// `leaves` are in tree order (descending tree position), which is the order
/// the verifier consumes them in. This is generally not the order the caller
/// asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiProof {
    pub leaves: Vec<Entry>,
    pub proof: Vec<Hash32>,
    pub proof_flags: Vec<bool>,
}

/// Positions and sibling data of a multi-proof, before leaves are resolved
/// back to entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMultiProof {
    pub leaf_positions: Vec<usize>,
    pub proof: Vec<Hash32>,
    pub proof_flags: Vec<bool>,
}

fn parent(i: usize) -> usize {
    (i - 1) / 2
}

fn sibling(i: usize) -> usize {
    if i % 2 == 1 {
        i + 1
    } else {
        i - 1
    }
}

fn is_leaf_position(tree_len: usize, i: usize) -> bool {
    i < tree_len && 2 * i + 1 >= tree_len
}

/// Builds the multi-proof for the given tree positions.
pub fn multi_proof_for_positions(tree: &[Hash32], positions: &[usize]) -> Result<RawMultiProof> {
    for &p in positions {
        if !is_leaf_position(tree.len(), p) {
            return Err(KernelError::InvalidMultiProof(format!("tree position {} is not a leaf", p)));
        }
    }

    let mut sorted = positions.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(KernelError::DuplicateLeaf(w[0]));
    }

    let mut queue: VecDeque<usize> = sorted.iter().copied().collect();
    let mut proof = Vec::new();
    let mut proof_flags = Vec::new();

    while let Some(&j) = queue.front() {
        if j == 0 {
            break;
        }
        queue.pop_front();

        let s = sibling(j);
        if queue.front() == Some(&s) {
            proof_flags.push(true);
            queue.pop_front();
        } else {
            proof_flags.push(false);
            proof.push(tree[s]);
        }
        queue.push_back(parent(j));
    }

    if positions.is_empty() {
        // Degenerate proof: the root itself.
        if let Some(root) = tree.first() {
            proof.push(*root);
        }
    }

    Ok(RawMultiProof {
        leaf_positions: sorted,
        proof,
        proof_flags,
    })
}

/// Reconstructs the root from leaf hashes (tree order), sibling hashes and flags.
pub fn process_multi_proof(leaves: &[Hash32], proof: &[Hash32], proof_flags: &[bool]) -> Result<Hash32> {
    let sibling_steps = proof_flags.iter().filter(|f| !**f).count();
    if proof.len() < sibling_steps {
        return Err(KernelError::InvalidMultiProof(format!(
            "{} proof hashes for {} sibling steps",
            proof.len(),
            sibling_steps
        )));
    }
    if leaves.len() + proof.len() != proof_flags.len() + 1 {
        return Err(KernelError::InvalidMultiProof(format!(
            "{} leaves and {} proof hashes are not compatible with {} flags",
            leaves.len(),
            proof.len(),
            proof_flags.len()
        )));
    }

    let mut queue: VecDeque<Hash32> = leaves.iter().copied().collect();
    let mut siblings = proof.iter().copied();
    let exhausted = || KernelError::InvalidMultiProof("proof exhausted during reconstruction".to_string());

    for &flag in proof_flags {
        let a = queue.pop_front().ok_or_else(exhausted)?;
        let b = if flag {
            queue.pop_front().ok_or_else(exhausted)?
        } else {
            siblings.next().ok_or_else(exhausted)?
        };
        queue.push_back(hash_pair(&a, &b));
    }

    queue
        .pop_back()
        .or_else(|| siblings.next())
        .ok_or_else(|| KernelError::InvalidMultiProof("empty proof".to_string()))
}
