// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory ledger. Records every call so tests can assert on side effects.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use batchproof_kernel::hash::keccak256;
use batchproof_kernel::Hash32;

use super::{ApplyCall, LedgerClient, LedgerError, Receipt};

pub const BASE_GAS: u64 = 21_000;
pub const GAS_PER_PAIR: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    MerkleRoot,
    Estimate { batch: u64 },
    Send { batch: u64 },
    Receipt { tx_hash: Hash32 },
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<LedgerCall>,
    pending: HashMap<Hash32, (u64, u64)>,
    block: u64,
}

#[derive(Debug)]
pub struct FakeLedger {
    root: Hash32,
    reverting: BTreeSet<u64>,
    send_errors: BTreeSet<u64>,
    unconfirmed: BTreeSet<u64>,
    state: Mutex<FakeState>,
}

impl FakeLedger {
    pub fn new(root: Hash32) -> Self {
        Self {
            root,
            reverting: BTreeSet::new(),
            send_errors: BTreeSet::new(),
            unconfirmed: BTreeSet::new(),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Receipts for these batches report failure.
    pub fn with_reverting(mut self, batches: impl IntoIterator<Item = u64>) -> Self {
        self.reverting.extend(batches);
        self
    }

    /// Sending these batches fails at the transport.
    pub fn with_send_errors(mut self, batches: impl IntoIterator<Item = u64>) -> Self {
        self.send_errors.extend(batches);
        self
    }

    /// These batches never confirm.
    pub fn with_unconfirmed(mut self, batches: impl IntoIterator<Item = u64>) -> Self {
        self.unconfirmed.extend(batches);
        self
    }

    pub fn gas_for(call: &ApplyCall) -> u64 {
        BASE_GAS + GAS_PER_PAIR * call.pairs.len() as u64
    }

    fn record(&self, call: LedgerCall) -> Result<std::sync::MutexGuard<'_, FakeState>, LedgerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| LedgerError::Transport("fake ledger state poisoned".to_string()))?;
        state.calls.push(call);
        Ok(state)
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Batch numbers passed to `send_apply`, in call order.
    pub fn sent_batches(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Send { batch } => Some(batch),
                _ => None,
            })
            .collect()
    }

    pub fn estimated_batches(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Estimate { batch } => Some(batch),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn merkle_root(&self) -> Result<Hash32, LedgerError> {
        self.record(LedgerCall::MerkleRoot)?;
        Ok(self.root)
    }

    async fn estimate_apply(&self, call: &ApplyCall) -> Result<u64, LedgerError> {
        self.record(LedgerCall::Estimate {
            batch: call.batch_number,
        })?;
        Ok(Self::gas_for(call))
    }

    async fn send_apply(&self, call: &ApplyCall) -> Result<Hash32, LedgerError> {
        let mut state = self.record(LedgerCall::Send {
            batch: call.batch_number,
        })?;
        if self.send_errors.contains(&call.batch_number) {
            return Err(LedgerError::Transport("connection reset".to_string()));
        }

        let mut seed = call.batch_number.to_be_bytes().to_vec();
        seed.extend_from_slice(&(state.calls.len() as u64).to_be_bytes());
        let tx_hash = Hash32(keccak256(&seed));
        state.pending.insert(tx_hash, (call.batch_number, Self::gas_for(call)));
        Ok(tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: Hash32,
        _poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Receipt, LedgerError> {
        let mut state = self.record(LedgerCall::Receipt { tx_hash })?;
        let (batch, gas_used) = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| LedgerError::Rpc {
                code: -32000,
                message: format!("unknown transaction {}", tx_hash),
            })?;

        if self.unconfirmed.contains(&batch) {
            return Err(LedgerError::ConfirmationTimeout {
                tx_hash,
                waited_secs: timeout.as_secs(),
            });
        }

        state.block += 1;
        Ok(Receipt {
            tx_hash,
            success: !self.reverting.contains(&batch),
            block_number: state.block,
            gas_used,
        })
    }
}
