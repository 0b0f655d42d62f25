// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use batchproof_kernel::{Hash32, MerkleTree};
use batchproof_persistence::ProofStore;
use batchproof_relay::load_tree;

/// Re-derives the root of every stored proof offline. With a tree file the
/// records must also commit to that tree's root.
pub fn run(proofs_dir: &Path, tree_file: Option<&Path>) -> anyhow::Result<()> {
    let store = ProofStore::open(proofs_dir)?;
    let ids = store.list_ordered()?;
    if ids.is_empty() {
        anyhow::bail!("no proof records in {}", proofs_dir.display());
    }

    let expected_root: Option<Hash32> = match tree_file {
        Some(path) => Some(load_tree(path)?.root()),
        None => None,
    };

    let mut reference = expected_root;
    let mut failures = Vec::new();
    for id in &ids {
        let record = match store.read(id) {
            Ok(record) => record,
            Err(e) => {
                println!("❌ {}: {}", id.file_name(), e);
                failures.push(id.batch_number);
                continue;
            }
        };
        let root = *reference.get_or_insert(record.tree_root);

        let derived = match record.derive_root() {
            Ok(derived) => derived,
            Err(e) => {
                println!("❌ batch {}: {}", record.batch_number, e);
                failures.push(record.batch_number);
                continue;
            }
        };
        if derived != record.tree_root {
            println!(
                "❌ batch {}: proof derives {} but record claims {}",
                record.batch_number, derived, record.tree_root
            );
            failures.push(record.batch_number);
        } else if record.tree_root != root {
            println!(
                "❌ batch {}: root {} differs from expected {}",
                record.batch_number, record.tree_root, root
            );
            failures.push(record.batch_number);
        }
    }

    if failures.is_empty() {
        println!("\n✅ VERIFIED\n");
        println!("Records: {}", ids.len());
        if let Some(root) = reference {
            println!("Root:    {}\n", root);
        }
        Ok(())
    } else {
        println!("\n❌ FAILED\n");
        anyhow::bail!(
            "{} of {} records failed verification: batches {:?}",
            failures.len(),
            ids.len(),
            failures
        )
    }
}
