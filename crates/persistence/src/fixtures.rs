// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::fs;
use std::path::{Path, PathBuf};

use batchproof_kernel::fixtures::sample_entries;
use batchproof_kernel::{plan_batches, prove_batch, MerkleTree, StandardTree};
use chrono::{TimeZone, Utc};

use crate::error::{Result, StoreError};
use crate::record::{ProofRecord, RecordContext};
use crate::store::{ProofStore, RecordId};

pub struct TestPaths {
    pub tree: PathBuf,
    pub proofs: PathBuf,
}

/// Fixed generation timestamp so fixture bytes are reproducible.
pub fn fixture_context(total_pairs: usize, batch_size: usize, total_batches: usize) -> RecordContext {
    RecordContext {
        tree_file: "./data/merkle-tree.json".to_string(),
        batch_size,
        total_pairs,
        total_batches,
        timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// Valid records for a synthetic tree of `total_pairs` entries.
pub fn sample_records(total_pairs: usize, batch_size: usize) -> Vec<ProofRecord> {
    let tree = StandardTree::of(&sample_entries(total_pairs)).expect("fixture tree");
    let plan = plan_batches(tree.len(), batch_size, None).expect("fixture plan");
    let ctx = fixture_context(total_pairs, batch_size, plan.batch_count());

    plan.batches
        .iter()
        .map(|range| {
            let batch = prove_batch(&tree, range).expect("fixture proof");
            ProofRecord::from_batch(&batch, &ctx)
        })
        .collect()
}

/// Writes a `standard-v1` dump of `count` synthetic entries.
pub fn write_tree_file(path: &Path, count: usize) -> Result<StandardTree> {
    let tree = StandardTree::of(&sample_entries(count)).expect("fixture tree");
    let json = tree.to_json().expect("fixture tree json");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    fs::write(path, json).map_err(|e| StoreError::io(path, e))?;
    Ok(tree)
}

/// Tree file plus a fully populated proof directory.
pub fn generate_test_scenario(dir: &Path, total_pairs: usize, batch_size: usize) -> Result<TestPaths> {
    let tree = dir.join("merkle-tree.json");
    let proofs = dir.join("proofs");
    write_tree_file(&tree, total_pairs)?;

    let store = ProofStore::create(&proofs)?;
    for record in sample_records(total_pairs, batch_size) {
        store.write(&record)?;
    }

    Ok(TestPaths { tree, proofs })
}

/// Writes the given records into a fresh store.
pub fn populate_store(dir: &Path, records: &[ProofRecord]) -> Result<(ProofStore, Vec<RecordId>)> {
    let store = ProofStore::create(dir)?;
    let ids = records
        .iter()
        .map(|r| store.write(r))
        .collect::<Result<Vec<_>>>()?;
    Ok((store, ids))
}
