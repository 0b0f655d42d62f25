// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof record - the persisted form of one batch.
//!
//! # File Format
//! Pretty-printed JSON, one record per file:
//! ```text
//! {
//!   "batchNumber": 2,
//!   "startIndex": 50,
//!   "endIndex": 99,
//!   "pairCount": 50,
//!   "pairs": [{ "token0": "0x..", "token1": "0x.." }, ...],
//!   "multiProof": { "leaves": [["0x..", "0x.."], ...], "proof": ["0x.."], "proofFlags": [true, ...] },
//!   "treeRoot": "0x..",
//!   "timestamp": "2025-01-01T00:00:00Z",
//!   "metadata": { "treeFile": "..", "batchSize": 50, "totalPairs": 130, "totalBatches": 3 }
//! }
//! ```
//! A record is self-contained: submitting it needs nothing but the record.

use batchproof_kernel::tree::derive_root;
use batchproof_kernel::{Address, Batch, Entry, Hash32, KernelResult, MultiProof};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    pub batch_number: u64,
    pub start_index: usize,
    pub end_index: usize,
    pub pair_count: usize,
    /// Pairs in proof order (same order as `multi_proof.leaves`).
    pub pairs: Vec<Entry>,
    pub multi_proof: RecordMultiProof,
    pub tree_root: Hash32,
    pub timestamp: DateTime<Utc>,
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMultiProof {
    pub leaves: Vec<(Address, Address)>,
    pub proof: Vec<Hash32>,
    pub proof_flags: Vec<bool>,
}

/// Provenance of the generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub tree_file: String,
    pub batch_size: usize,
    pub total_pairs: usize,
    pub total_batches: usize,
}

/// Run-wide values shared by every record of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    pub tree_file: String,
    pub batch_size: usize,
    pub total_pairs: usize,
    pub total_batches: usize,
    pub timestamp: DateTime<Utc>,
}

impl ProofRecord {
    pub fn from_batch(batch: &Batch, ctx: &RecordContext) -> Self {
        Self {
            batch_number: batch.range.number,
            start_index: batch.range.start,
            end_index: batch.range.end,
            pair_count: batch.entries.len(),
            pairs: batch.entries.clone(),
            multi_proof: RecordMultiProof {
                leaves: batch.multi_proof.leaves.iter().map(Entry::as_tuple).collect(),
                proof: batch.multi_proof.proof.clone(),
                proof_flags: batch.multi_proof.proof_flags.clone(),
            },
            tree_root: batch.root,
            timestamp: ctx.timestamp,
            metadata: RecordMetadata {
                tree_file: ctx.tree_file.clone(),
                batch_size: ctx.batch_size,
                total_pairs: ctx.total_pairs,
                total_batches: ctx.total_batches,
            },
        }
    }

    /// Structural consistency. Does not hash anything.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_number == 0 {
            return Err("batch numbers start at 1".to_string());
        }
        if self.end_index < self.start_index {
            return Err(format!(
                "end index {} precedes start index {}",
                self.end_index, self.start_index
            ));
        }
        let span = (self.end_index - self.start_index)
            .checked_add(1)
            .ok_or_else(|| "index bounds overflow".to_string())?;
        if span != self.pair_count {
            return Err(format!("index bounds cover {} pairs, pairCount is {}", span, self.pair_count));
        }
        if self.pairs.len() != self.pair_count {
            return Err(format!("{} pairs listed, pairCount is {}", self.pairs.len(), self.pair_count));
        }

        let mp = &self.multi_proof;
        if mp.leaves.len() != self.pairs.len() {
            return Err(format!("{} proof leaves for {} pairs", mp.leaves.len(), self.pairs.len()));
        }
        if let Some(i) = mp
            .leaves
            .iter()
            .zip(&self.pairs)
            .position(|(leaf, pair)| *leaf != pair.as_tuple())
        {
            return Err(format!("proof leaf {} differs from pair {}", i, i));
        }
        if mp.leaves.len() + mp.proof.len() != mp.proof_flags.len() + 1 {
            return Err(format!(
                "{} leaves and {} proof hashes do not match {} flags",
                mp.leaves.len(),
                mp.proof.len(),
                mp.proof_flags.len()
            ));
        }
        Ok(())
    }

    pub fn multi_proof(&self) -> MultiProof {
        MultiProof {
            leaves: self.multi_proof.leaves.iter().copied().map(Entry::from).collect(),
            proof: self.multi_proof.proof.clone(),
            proof_flags: self.multi_proof.proof_flags.clone(),
        }
    }

    /// Root implied by the stored proof.
    pub fn derive_root(&self) -> KernelResult<Hash32> {
        derive_root(&self.multi_proof())
    }

    /// True when the stored proof reconstructs the stored root.
    pub fn verify(&self) -> KernelResult<bool> {
        Ok(self.derive_root()? == self.tree_root)
    }
}
