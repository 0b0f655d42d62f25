// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use std::path::Path;

use batchproof_persistence::ProofStore;

use super::short_hex;

pub fn run(proofs_dir: &Path) -> anyhow::Result<()> {
    let store = ProofStore::open(proofs_dir)?;
    let ids = store.list_ordered()?;

    println!("\nProof Store Report: {}", proofs_dir.display());
    println!("------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Batch", "File", "Pairs", "Range", "Root", "Generated", "Digest"]);

    let mut total_pairs = 0usize;
    for id in &ids {
        let digest = short_hex(&store.digest(id)?);
        match store.read(id) {
            Ok(record) => {
                total_pairs += record.pair_count;
                table.add_row(vec![
                    record.batch_number.to_string(),
                    id.file_name(),
                    record.pair_count.to_string(),
                    format!("{}..={}", record.start_index, record.end_index),
                    short_hex(record.tree_root.as_bytes()),
                    record.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                    digest,
                ]);
            }
            Err(e) => {
                table.add_row(vec![
                    id.batch_number.to_string(),
                    id.file_name(),
                    "CORRUPT".to_string(),
                    String::new(),
                    String::new(),
                    e.to_string(),
                    digest,
                ]);
            }
        }
    }

    println!("{table}");
    println!("{} records, {} pairs\n", ids.len(), total_pairs);

    Ok(())
}
