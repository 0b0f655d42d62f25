// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! batchproof-kernel: deterministic batching and multi-proof generation over
//! a standard keccak Merkle tree.

pub mod batch;
pub mod error;
pub mod fixtures;
pub mod hash;
pub mod multiproof;
pub mod planner;
pub mod tree;
pub mod types;

pub use batch::{prove_batch, Batch};
pub use error::{KernelError, KernelResult};
pub use multiproof::MultiProof;
pub use planner::{plan_batches, BatchPlan, BatchPlanner, BatchRange};
pub use tree::{MerkleTree, StandardTree};
pub use types::{Address, Entry, Hash32};
