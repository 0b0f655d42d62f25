// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Submission driver.
//!
//! # States
//! ```text
//! Initializing -> RootCheck -> Submitting -> Completed
//!       \______________\____________\_______> Aborted
//! ```
//! - Initializing: validate config, list records (none is an error)
//! - RootCheck: first record's root must equal the remote root
//! - Submitting: every selected record is read and checked up front, then
//!   batches go out one at a time in ascending order
//!
//! Nothing state-changing happens before the root check passes. The first
//! failed batch halts the run; later batches are left untouched and the run
//! can be resumed with `start_batch`.

use std::fmt;

use batchproof_kernel::Hash32;
use batchproof_persistence::{ProofRecord, ProofStore, StoreError};

use crate::config::SubmissionConfig;
use crate::errors::{RelayError, Result};
use crate::ledger::{ApplyCall, LedgerClient};

const SAMPLE_PAIRS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Initializing,
    RootCheck,
    Submitting,
    Completed,
    Aborted,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Initializing => "initializing",
            DriverState::RootCheck => "root-check",
            DriverState::Submitting => "submitting",
            DriverState::Completed => "completed",
            DriverState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub state: DriverState,
    pub dry_run: bool,
    pub tree_root: Option<Hash32>,
    pub total_batches: usize,
    pub selected_batches: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed_batch: Option<u64>,
    /// Estimated gas in a dry run, gas used otherwise.
    pub total_gas: u64,
}

impl SubmissionReport {
    fn new(dry_run: bool) -> Self {
        Self {
            state: DriverState::Initializing,
            dry_run,
            tree_root: None,
            total_batches: 0,
            selected_batches: 0,
            attempted: 0,
            succeeded: 0,
            failed_batch: None,
            total_gas: 0,
        }
    }
}

pub struct SubmissionDriver<L: LedgerClient> {
    config: SubmissionConfig,
    ledger: L,
    report: SubmissionReport,
}

impl<L: LedgerClient> SubmissionDriver<L> {
    pub fn new(config: SubmissionConfig, ledger: L) -> Result<Self> {
        config.validate()?;
        let report = SubmissionReport::new(config.dry_run);
        Ok(Self { config, ledger, report })
    }

    pub fn state(&self) -> DriverState {
        self.report.state
    }

    pub fn report(&self) -> &SubmissionReport {
        &self.report
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub async fn run(&mut self) -> Result<SubmissionReport> {
        match self.execute().await {
            Ok(()) => {
                self.transition(DriverState::Completed);
                tracing::info!(
                    "Batches processed: {} of {} selected",
                    self.report.succeeded,
                    self.report.selected_batches
                );
                if self.report.total_gas > 0 {
                    let label = if self.config.dry_run { "Total estimated gas" } else { "Total gas used" };
                    tracing::info!("{}: {}", label, self.report.total_gas);
                }
                Ok(self.report.clone())
            }
            Err(e) => {
                self.transition(DriverState::Aborted);
                tracing::error!("Submission aborted: {}", e);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: DriverState) {
        tracing::info!(from = %self.report.state, to = %next, "Driver state change");
        self.report.state = next;
    }

    fn failure(&mut self, batch: u64, reason: String) -> RelayError {
        self.report.failed_batch = Some(batch);
        RelayError::SubmissionFailed {
            batch,
            attempted: self.report.attempted,
            succeeded: self.report.succeeded,
            reason,
        }
    }

    async fn execute(&mut self) -> Result<()> {
        let dir = self.config.proofs_dir.clone();
        let store = match ProofStore::open(&dir) {
            Ok(store) => store,
            Err(StoreError::NotFound(_)) => return Err(RelayError::NoRecords(dir)),
            Err(e) => return Err(e.into()),
        };
        let ids = store.list_ordered()?;
        let first_id = ids.first().ok_or_else(|| RelayError::NoRecords(dir.clone()))?;
        self.report.total_batches = ids.len();
        tracing::info!("Found {} proof records in {:?}", ids.len(), dir);

        self.transition(DriverState::RootCheck);
        let expected = store.read(first_id)?.tree_root;
        self.report.tree_root = Some(expected);
        let remote = self.ledger.merkle_root().await?;
        tracing::info!("On-chain root: {}", remote);
        tracing::info!("Proof root:    {}", expected);
        if remote != expected {
            return Err(RelayError::RootMismatch { expected, remote });
        }
        tracing::info!("Merkle roots match");

        self.transition(DriverState::Submitting);
        let records = ids
            .iter()
            .filter(|id| id.batch_number >= self.config.start_batch)
            .map(|id| store.read(id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for record in &records {
            self.check_record(record, expected)?;
        }
        self.report.selected_batches = records.len();

        if records.is_empty() {
            tracing::info!(
                "No batches to submit: start batch {} is beyond the last batch {}",
                self.config.start_batch,
                ids.len()
            );
            return Ok(());
        }
        tracing::info!("Submitting {} of {} total batches", records.len(), ids.len());

        for record in &records {
            self.submit(record).await?;
        }
        Ok(())
    }

    fn check_record(&self, record: &ProofRecord, expected: Hash32) -> Result<()> {
        if record.tree_root != expected {
            return Err(RelayError::RecordRootMismatch {
                batch: record.batch_number,
                expected,
                found: record.tree_root,
            });
        }
        if let Some(size) = self.config.batch_size {
            if record.metadata.batch_size != size {
                return Err(RelayError::Config(format!(
                    "batch {} was generated with batch size {}, expected {}",
                    record.batch_number, record.metadata.batch_size, size
                )));
            }
        }
        Ok(())
    }

    async fn submit(&mut self, record: &ProofRecord) -> Result<()> {
        let batch = record.batch_number;
        let call = ApplyCall::from_record(record);
        tracing::info!(
            "Batch {}/{}: pairs {} to {} ({} pairs)",
            batch,
            self.report.total_batches,
            record.start_index + 1,
            record.end_index + 1,
            record.pair_count
        );
        self.report.attempted += 1;

        if self.config.dry_run {
            let gas = match self.ledger.estimate_apply(&call).await {
                Ok(gas) => gas,
                Err(e) => return Err(self.failure(batch, e.to_string())),
            };
            tracing::info!("Estimated gas: {}", gas);
            self.report.total_gas += gas;
        } else {
            let tx_hash = match self.ledger.send_apply(&call).await {
                Ok(hash) => hash,
                Err(e) => return Err(self.failure(batch, e.to_string())),
            };
            tracing::info!("Transaction hash: {}", tx_hash);

            let receipt = match self
                .ledger
                .wait_for_receipt(tx_hash, self.config.poll_interval, self.config.confirmation_timeout)
                .await
            {
                Ok(receipt) => receipt,
                Err(e) => return Err(self.failure(batch, e.to_string())),
            };
            if !receipt.success {
                let reason = format!("transaction {} reverted in block {}", tx_hash, receipt.block_number);
                return Err(self.failure(batch, reason));
            }
            tracing::info!(
                "Confirmed in block {}, gas used {}",
                receipt.block_number,
                receipt.gas_used
            );
            self.report.total_gas += receipt.gas_used;
        }
        self.report.succeeded += 1;

        for pair in record.pairs.iter().take(SAMPLE_PAIRS) {
            tracing::info!("  {} <-> {}", pair.token0, pair.token1);
        }
        if record.pairs.len() > SAMPLE_PAIRS {
            tracing::info!("  ... and {} more", record.pairs.len() - SAMPLE_PAIRS);
        }
        Ok(())
    }
}
