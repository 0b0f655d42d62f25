// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof generation: tree file in, one record per batch out.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::thread;

use batchproof_kernel::{prove_batch, Batch, BatchRange, Hash32, KernelError, KernelResult, MerkleTree, StandardTree};
use batchproof_persistence::{ProofRecord, ProofStore, RecordContext, RecordId};
use chrono::Utc;

use crate::config::{GenerationConfig, IntegrityPolicy};
use crate::errors::{RelayError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub tree_root: Hash32,
    pub total_pairs: usize,
    pub covered_pairs: usize,
    pub batch_size: usize,
    pub records: Vec<RecordId>,
    pub output_dir: PathBuf,
}

impl GenerationReport {
    pub fn batch_count(&self) -> usize {
        self.records.len()
    }
}

pub fn load_tree(path: &Path) -> Result<StandardTree> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RelayError::TreeFileMissing(path.to_path_buf()))
        }
        Err(e) => return Err(KernelError::Io(e).into()),
    };
    let tree = StandardTree::load(BufReader::new(file))?;
    tracing::info!("Loaded tree with {} pairs, root {}", tree.len(), tree.root());
    Ok(tree)
}

/// Loads the configured tree and writes its records into the configured
/// output directory.
pub fn run_generation(config: &GenerationConfig) -> Result<GenerationReport> {
    config.validate()?;
    let tree = load_tree(&config.tree_file)?;
    let store = ProofStore::create(&config.output_dir)?;
    generate_proofs(&tree, config, &store)
}

/// Proves `window` in order. With more than one job, each batch gets its own
/// scoped thread.
fn prove_window<T>(tree: &T, window: &[BatchRange], jobs: usize) -> Vec<KernelResult<Batch>>
where
    T: MerkleTree + Sync + ?Sized,
{
    if jobs <= 1 || window.len() <= 1 {
        return window.iter().map(|range| prove_batch(tree, range)).collect();
    }

    thread::scope(|scope| {
        let handles: Vec<_> = window
            .iter()
            .map(|range| scope.spawn(move || prove_batch(tree, range)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}

fn write_batch(store: &ProofStore, batch: &Batch, ctx: &RecordContext) -> Result<RecordId> {
    let record = ProofRecord::from_batch(batch, ctx);
    let id = store.write(&record)?;
    tracing::info!(
        "Batch {}/{}: pairs {} to {} ({} pairs) -> {}",
        batch.number(),
        ctx.total_batches,
        batch.range.start + 1,
        batch.range.end + 1,
        batch.pair_count(),
        id.file_name()
    );
    Ok(id)
}

pub fn generate_proofs<T>(tree: &T, config: &GenerationConfig, store: &ProofStore) -> Result<GenerationReport>
where
    T: MerkleTree + Sync + ?Sized,
{
    config.validate()?;
    let plan = config.planner().plan(tree.len(), config.batch_size, config.max_batches)?;

    let ctx = RecordContext {
        tree_file: config.tree_file.display().to_string(),
        batch_size: config.batch_size,
        total_pairs: tree.len(),
        total_batches: plan.batch_count(),
        timestamp: config.timestamp.unwrap_or_else(Utc::now),
    };

    let mut report = GenerationReport {
        tree_root: tree.root(),
        total_pairs: tree.len(),
        covered_pairs: plan.covered_leaves,
        batch_size: config.batch_size,
        records: Vec::with_capacity(plan.batch_count()),
        output_dir: store.dir().to_path_buf(),
    };

    if plan.is_empty() {
        tracing::warn!("Tree has no pairs to prove; nothing written");
        return Ok(report);
    }

    tracing::info!(
        "Generating {} batches of up to {} pairs ({} of {} pairs) with {} job(s)",
        plan.batch_count(),
        config.batch_size,
        plan.covered_leaves,
        plan.total_leaves,
        config.jobs
    );

    match config.integrity_policy {
        IntegrityPolicy::FailFast => {
            for window in plan.batches.chunks(config.jobs) {
                for result in prove_window(tree, window, config.jobs) {
                    let batch = result.map_err(|e| {
                        tracing::error!("{}", e);
                        e
                    })?;
                    report.records.push(write_batch(store, &batch, &ctx)?);
                }
            }
        }
        IntegrityPolicy::CollectAll => {
            let mut proven = Vec::with_capacity(plan.batch_count());
            let mut failed = Vec::new();
            for window in plan.batches.chunks(config.jobs) {
                for result in prove_window(tree, window, config.jobs) {
                    match result {
                        Ok(batch) => proven.push(batch),
                        Err(KernelError::ProofIntegrity { batch }) => {
                            tracing::error!("Proof verification failed for batch {}", batch);
                            failed.push(batch);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            if !failed.is_empty() {
                return Err(RelayError::IntegrityFailures { batches: failed });
            }
            for batch in &proven {
                report.records.push(write_batch(store, batch, &ctx)?);
            }
        }
    }

    tracing::info!(
        "Generated {} proof records in {:?}",
        report.batch_count(),
        report.output_dir
    );
    Ok(report)
}
