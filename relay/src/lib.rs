// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod driver;
pub mod errors;
pub mod generation;
pub mod ledger;
pub mod telemetry;

pub use config::{Credential, GenerationConfig, IntegrityPolicy, Network, SubmissionConfig};
pub use driver::{DriverState, SubmissionDriver, SubmissionReport};
pub use errors::RelayError;
pub use generation::{generate_proofs, load_tree, run_generation, GenerationReport};
pub use ledger::fake::FakeLedger;
pub use ledger::rpc::RpcLedgerClient;
pub use ledger::{ApplyCall, LedgerClient, LedgerError, Receipt};
