// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use batchproof_kernel::{Address, Hash32};
use batchproof_persistence::fixtures::{generate_test_scenario, populate_store, sample_records};
use batchproof_persistence::{ProofStore, StoreError};
use batchproof_relay::ledger::fake::{LedgerCall, BASE_GAS, GAS_PER_PAIR};
use batchproof_relay::{Credential, DriverState, FakeLedger, RelayError, SubmissionConfig, SubmissionDriver};
use tempfile::{tempdir, TempDir};

struct Scenario {
    _dir: TempDir,
    proofs: PathBuf,
    root: Hash32,
}

fn scenario(total_pairs: usize, batch_size: usize) -> Scenario {
    let dir = tempdir().unwrap();
    let paths = generate_test_scenario(dir.path(), total_pairs, batch_size).unwrap();
    let root = ProofStore::open(&paths.proofs).unwrap().read_batch(1).unwrap().tree_root;
    Scenario {
        _dir: dir,
        proofs: paths.proofs,
        root,
    }
}

fn config(proofs: &Path, dry_run: bool) -> SubmissionConfig {
    let mut cfg = SubmissionConfig::new("http://127.0.0.1:8545", Address([0x42; 20]));
    cfg.proofs_dir = proofs.to_path_buf();
    cfg.dry_run = dry_run;
    if !dry_run {
        cfg.credential = Some(Credential::new(format!("0x{}", "01".repeat(32))));
    }
    cfg.poll_interval = Duration::from_millis(1);
    cfg
}

fn expected_gas(pair_counts: &[u64]) -> u64 {
    pair_counts.iter().map(|n| BASE_GAS + GAS_PER_PAIR * n).sum()
}

#[tokio::test]
async fn test_submits_every_batch_in_order() {
    let s = scenario(130, 50);
    let mut driver = SubmissionDriver::new(config(&s.proofs, false), FakeLedger::new(s.root)).unwrap();

    let report = driver.run().await.unwrap();
    assert_eq!(report.state, DriverState::Completed);
    assert_eq!(report.total_batches, 3);
    assert_eq!(report.selected_batches, 3);
    assert_eq!((report.attempted, report.succeeded), (3, 3));
    assert_eq!(report.failed_batch, None);
    assert_eq!(report.total_gas, expected_gas(&[50, 50, 30]));
    assert_eq!(report.tree_root, Some(s.root));
    assert_eq!(driver.ledger().sent_batches(), vec![1, 2, 3]);
    assert!(driver.ledger().estimated_batches().is_empty());
}

#[tokio::test]
async fn test_root_mismatch_submits_nothing() {
    let s = scenario(30, 10);
    let remote = Hash32([0xEE; 32]);
    let mut driver = SubmissionDriver::new(config(&s.proofs, false), FakeLedger::new(remote)).unwrap();

    let err = driver.run().await.unwrap_err();
    match err {
        RelayError::RootMismatch { expected, remote: got } => {
            assert_eq!(expected, s.root);
            assert_eq!(got, remote);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(driver.state(), DriverState::Aborted);
    assert_eq!(driver.ledger().calls(), vec![LedgerCall::MerkleRoot]);
}

#[tokio::test]
async fn test_start_batch_skips_earlier_batches() {
    let s = scenario(130, 50);
    let mut cfg = config(&s.proofs, false);
    cfg.start_batch = 2;
    let mut driver = SubmissionDriver::new(cfg, FakeLedger::new(s.root)).unwrap();

    let report = driver.run().await.unwrap();
    assert_eq!(report.total_batches, 3);
    assert_eq!(report.selected_batches, 2);
    assert_eq!(driver.ledger().sent_batches(), vec![2, 3]);
}

#[tokio::test]
async fn test_start_batch_beyond_last_completes_empty() {
    let s = scenario(130, 50);
    let mut cfg = config(&s.proofs, false);
    cfg.start_batch = 4;
    let mut driver = SubmissionDriver::new(cfg, FakeLedger::new(s.root)).unwrap();

    let report = driver.run().await.unwrap();
    assert_eq!(report.state, DriverState::Completed);
    assert_eq!((report.selected_batches, report.attempted), (0, 0));
    assert_eq!(driver.ledger().calls(), vec![LedgerCall::MerkleRoot]);
}

#[tokio::test]
async fn test_dry_run_only_estimates() {
    let s = scenario(130, 50);
    let mut driver = SubmissionDriver::new(config(&s.proofs, true), FakeLedger::new(s.root)).unwrap();

    let report = driver.run().await.unwrap();
    assert!(report.dry_run);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.total_gas, expected_gas(&[50, 50, 30]));
    assert!(driver.ledger().sent_batches().is_empty());
    assert_eq!(driver.ledger().estimated_batches(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_revert_halts_and_leaves_later_batches() {
    let s = scenario(130, 50);
    let ledger = FakeLedger::new(s.root).with_reverting([2]);
    let mut driver = SubmissionDriver::new(config(&s.proofs, false), ledger).unwrap();

    let err = driver.run().await.unwrap_err();
    match &err {
        RelayError::SubmissionFailed {
            batch,
            attempted,
            succeeded,
            reason,
        } => {
            assert_eq!((*batch, *attempted, *succeeded), (2, 2, 1));
            assert!(reason.contains("reverted"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Batch 2 failed after 1 of 2"));

    assert_eq!(driver.state(), DriverState::Aborted);
    assert_eq!(driver.report().failed_batch, Some(2));
    assert_eq!(driver.report().succeeded, 1);
    assert_eq!(driver.ledger().sent_batches(), vec![1, 2]);
}

#[tokio::test]
async fn test_send_error_is_a_submission_failure() {
    let s = scenario(30, 10);
    let ledger = FakeLedger::new(s.root).with_send_errors([1]);
    let mut driver = SubmissionDriver::new(config(&s.proofs, false), ledger).unwrap();

    let err = driver.run().await.unwrap_err();
    assert!(matches!(
        err,
        RelayError::SubmissionFailed {
            batch: 1,
            attempted: 1,
            succeeded: 0,
            ..
        }
    ));
    assert_eq!(driver.ledger().sent_batches(), vec![1]);
}

#[tokio::test]
async fn test_confirmation_timeout_is_a_submission_failure() {
    let s = scenario(30, 10);
    let ledger = FakeLedger::new(s.root).with_unconfirmed([3]);
    let mut driver = SubmissionDriver::new(config(&s.proofs, false), ledger).unwrap();

    let err = driver.run().await.unwrap_err();
    match err {
        RelayError::SubmissionFailed { batch, reason, .. } => {
            assert_eq!(batch, 3);
            assert!(reason.contains("not confirmed"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_no_records() {
    let dir = tempdir().unwrap();
    let empty = dir.path().join("proofs");
    fs::create_dir_all(&empty).unwrap();

    let mut driver = SubmissionDriver::new(config(&empty, true), FakeLedger::new(Hash32::ZERO)).unwrap();
    assert!(matches!(driver.run().await, Err(RelayError::NoRecords(_))));
    assert!(driver.ledger().calls().is_empty());

    let missing = dir.path().join("absent");
    let mut driver = SubmissionDriver::new(config(&missing, true), FakeLedger::new(Hash32::ZERO)).unwrap();
    assert!(matches!(driver.run().await, Err(RelayError::NoRecords(_))));
}

#[tokio::test]
async fn test_mixed_roots_fail_before_side_effects() {
    let dir = tempdir().unwrap();
    let first = sample_records(20, 10).remove(0);
    let second = sample_records(30, 10).remove(1);
    let root = first.tree_root;
    assert_ne!(root, second.tree_root);
    populate_store(dir.path(), &[first, second]).unwrap();

    let mut driver = SubmissionDriver::new(config(dir.path(), false), FakeLedger::new(root)).unwrap();
    let err = driver.run().await.unwrap_err();
    assert!(matches!(err, RelayError::RecordRootMismatch { batch: 2, .. }));
    assert!(driver.ledger().sent_batches().is_empty());
}

#[tokio::test]
async fn test_corrupt_record_fails_before_side_effects() {
    let s = scenario(30, 10);
    let store = ProofStore::open(&s.proofs).unwrap();
    fs::write(store.id_for(3).path, b"{ not json").unwrap();

    let mut driver = SubmissionDriver::new(config(&s.proofs, false), FakeLedger::new(s.root)).unwrap();
    let err = driver.run().await.unwrap_err();
    assert!(matches!(err, RelayError::Store(StoreError::CorruptRecord { .. })));
    assert!(driver.ledger().sent_batches().is_empty());
}

#[tokio::test]
async fn test_pinned_batch_size_must_match_records() {
    let s = scenario(30, 10);
    let mut cfg = config(&s.proofs, true);
    cfg.batch_size = Some(25);
    let mut driver = SubmissionDriver::new(cfg, FakeLedger::new(s.root)).unwrap();

    assert!(matches!(driver.run().await, Err(RelayError::Config(_))));
    assert!(driver.ledger().estimated_batches().is_empty());
}

#[test]
fn test_live_run_requires_credential() {
    let s = scenario(10, 5);
    let mut cfg = config(&s.proofs, false);
    cfg.credential = None;
    assert!(matches!(
        SubmissionDriver::new(cfg, FakeLedger::new(s.root)),
        Err(RelayError::Config(_))
    ));
}
