// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use batchproof_relay::{LedgerClient, RpcLedgerClient, SubmissionConfig, SubmissionDriver, SubmissionReport};

pub async fn run(config: SubmissionConfig) -> anyhow::Result<()> {
    config.validate()?;

    println!("\nProof Submission");
    println!("----------------");
    println!("Network:  {}", config.network);
    println!("Contract: {}", config.contract.to_checksum());
    println!("Proofs:   {}", config.proofs_dir.display());
    println!("Mode:     {}\n", if config.dry_run { "DRY RUN" } else { "LIVE" });

    let ledger = RpcLedgerClient::connect(&config).await?;
    run_with_ledger(config, ledger).await.map(|_| ())
}

/// Drives the submission against any ledger and prints the summary.
pub async fn run_with_ledger<L: LedgerClient>(config: SubmissionConfig, ledger: L) -> anyhow::Result<SubmissionReport> {
    let mut driver = SubmissionDriver::new(config, ledger)?;
    let result = driver.run().await;
    print_summary(driver.report());
    Ok(result?)
}

fn print_summary(report: &SubmissionReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Item", "Value"]);

    table.add_row(vec!["State".to_string(), report.state.to_string()]);
    if let Some(root) = report.tree_root {
        table.add_row(vec!["Tree root".to_string(), root.to_hex()]);
    }
    table.add_row(vec!["Batches on disk".to_string(), report.total_batches.to_string()]);
    table.add_row(vec!["Selected".to_string(), report.selected_batches.to_string()]);
    table.add_row(vec!["Attempted".to_string(), report.attempted.to_string()]);
    table.add_row(vec!["Succeeded".to_string(), report.succeeded.to_string()]);
    if let Some(batch) = report.failed_batch {
        table.add_row(vec!["Failed batch".to_string(), batch.to_string()]);
    }
    let gas_label = if report.dry_run { "Estimated gas" } else { "Gas used" };
    table.add_row(vec![gas_label.to_string(), report.total_gas.to_string()]);

    println!("\n{table}\n");
}
