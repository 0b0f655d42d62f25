// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::fs;
use std::time::Duration;

use batchproof_cli::commands::{generate, inspect, submit, verify};
use batchproof_kernel::{Address, Hash32, MerkleTree};
use batchproof_persistence::fixtures;
use batchproof_persistence::ProofStore;
use batchproof_relay::{DriverState, FakeLedger, GenerationConfig, RelayError, SubmissionConfig};
use tempfile::tempdir;

#[test]
fn test_integration_workflow() {
    let dir = tempdir().unwrap();
    let tree_file = dir.path().join("merkle-tree.json");
    let tree = fixtures::write_tree_file(&tree_file, 130).unwrap();

    let config = GenerationConfig {
        tree_file: tree_file.clone(),
        output_dir: dir.path().join("proofs"),
        batch_size: 50,
        jobs: 2,
        ..GenerationConfig::default()
    };
    assert!(generate::run(&config).is_ok());

    let store = ProofStore::open(&config.output_dir).unwrap();
    assert_eq!(store.list_ordered().unwrap().len(), 3);
    assert_eq!(store.read_batch(3).unwrap().tree_root, tree.root());

    assert!(inspect::run(&config.output_dir).is_ok());
    assert!(verify::run(&config.output_dir, None).is_ok());
    assert!(verify::run(&config.output_dir, Some(tree_file.as_path())).is_ok());
}

#[test]
fn test_verify_rejects_foreign_tree_and_tampered_record() {
    let dir = tempdir().unwrap();
    let paths = fixtures::generate_test_scenario(dir.path(), 40, 10).unwrap();

    let other_tree = dir.path().join("other-tree.json");
    fixtures::write_tree_file(&other_tree, 41).unwrap();
    assert!(verify::run(&paths.proofs, Some(other_tree.as_path())).is_err());

    let store = ProofStore::open(&paths.proofs).unwrap();
    let id = store.id_for(2);
    let mut record = store.read(&id).unwrap();
    record.multi_proof.proof[0] = Hash32([0x55; 32]);
    fs::write(&id.path, serde_json::to_vec_pretty(&record).unwrap()).unwrap();

    assert!(verify::run(&paths.proofs, None).is_err());
    // Inspect still reports a store with bad proofs.
    assert!(inspect::run(&paths.proofs).is_ok());
}

#[test]
fn test_inspect_missing_dir_fails() {
    let dir = tempdir().unwrap();
    assert!(inspect::run(&dir.path().join("absent")).is_err());
}

#[tokio::test]
async fn test_submit_with_fake_ledger() {
    let dir = tempdir().unwrap();
    let paths = fixtures::generate_test_scenario(dir.path(), 25, 10).unwrap();
    let root = ProofStore::open(&paths.proofs).unwrap().read_batch(1).unwrap().tree_root;

    let mut config = SubmissionConfig::new("http://127.0.0.1:8545", Address([0x42; 20]));
    config.proofs_dir = paths.proofs.clone();
    config.dry_run = true;
    config.poll_interval = Duration::from_millis(1);

    let report = submit::run_with_ledger(config.clone(), FakeLedger::new(root)).await.unwrap();
    assert_eq!(report.state, DriverState::Completed);
    assert_eq!(report.succeeded, 3);

    let wrong_root = FakeLedger::new(Hash32([0x01; 32]));
    assert!(submit::run_with_ledger(config, wrong_root).await.is_err());
}

#[tokio::test]
async fn test_submit_rejects_missing_key_before_connecting() {
    let dir = tempdir().unwrap();
    let paths = fixtures::generate_test_scenario(dir.path(), 25, 10).unwrap();

    // Nothing listens here; reaching the network would surface a transport error.
    let mut config = SubmissionConfig::new("http://127.0.0.1:1", Address([0x42; 20]));
    config.proofs_dir = paths.proofs;
    config.credential = None;

    let err = submit::run(config).await.unwrap_err();
    let relay_err = err.downcast_ref::<RelayError>().expect("relay error");
    assert!(matches!(relay_err, RelayError::Config(msg) if msg.contains("PRIVATE_KEY")));
}
