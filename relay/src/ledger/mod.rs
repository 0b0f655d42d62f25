// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Remote ledger access.
//!
//! The driver only sees [`LedgerClient`]. [`rpc::RpcLedgerClient`] talks
//! EVM JSON-RPC over HTTP; [`fake::FakeLedger`] is an in-memory stand-in
//! for tests and local runs.

pub mod abi;
pub mod fake;
pub mod rpc;
pub mod signer;

use std::time::Duration;

use async_trait::async_trait;
use batchproof_kernel::{Entry, Hash32};
use batchproof_persistence::ProofRecord;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Chain id mismatch: expected {expected}, endpoint reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Transaction {tx_hash} not confirmed within {waited_secs}s")]
    ConfirmationTimeout { tx_hash: Hash32, waited_secs: u64 },

    #[error("Signer error: {0}")]
    Signer(String),
}

/// Arguments of one `batchTriggerFeeUpdate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyCall {
    pub batch_number: u64,
    pub pairs: Vec<Entry>,
    pub proof: Vec<Hash32>,
    pub proof_flags: Vec<bool>,
}

impl ApplyCall {
    pub fn from_record(record: &ProofRecord) -> Self {
        Self {
            batch_number: record.batch_number,
            pairs: record.pairs.clone(),
            proof: record.multi_proof.proof.clone(),
            proof_flags: record.multi_proof.proof_flags.clone(),
        }
    }

    /// ABI-encoded calldata, selector included.
    pub fn calldata(&self) -> Vec<u8> {
        abi::encode_apply(&self.pairs, &self.proof, &self.proof_flags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: Hash32,
    pub success: bool,
    pub block_number: u64,
    pub gas_used: u64,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Root the remote contract currently holds.
    async fn merkle_root(&self) -> Result<Hash32, LedgerError>;

    /// Gas estimate for the call. Never changes remote state.
    async fn estimate_apply(&self, call: &ApplyCall) -> Result<u64, LedgerError>;

    /// Sends the state-changing call. Returns the transaction hash.
    async fn send_apply(&self, call: &ApplyCall) -> Result<Hash32, LedgerError>;

    async fn wait_for_receipt(
        &self,
        tx_hash: Hash32,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Receipt, LedgerError>;
}
