// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use batchproof_relay::{run_generation, GenerationConfig};

pub fn run(config: &GenerationConfig) -> anyhow::Result<()> {
    println!("\nProof Generation");
    println!("----------------");
    println!("Tree:       {}", config.tree_file.display());
    println!("Output:     {}", config.output_dir.display());
    println!("Batch size: {}\n", config.batch_size);

    let report = run_generation(config)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Item", "Value"]);
    table.add_row(vec!["Tree root".to_string(), report.tree_root.to_hex()]);
    table.add_row(vec!["Total pairs".to_string(), report.total_pairs.to_string()]);
    table.add_row(vec!["Pairs covered".to_string(), report.covered_pairs.to_string()]);
    table.add_row(vec!["Batches written".to_string(), report.batch_count().to_string()]);
    if let (Some(first), Some(last)) = (report.records.first(), report.records.last()) {
        table.add_row(vec!["Files".to_string(), format!("{} .. {}", first.file_name(), last.file_name())]);
    }
    println!("{table}\n");

    Ok(())
}
