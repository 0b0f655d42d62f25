// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! EVM JSON-RPC client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use batchproof_kernel::{Address, Hash32};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;

use super::abi;
use super::signer::{LegacyTransaction, LocalSigner};
use super::{ApplyCall, LedgerClient, LedgerError, Receipt};
use crate::config::SubmissionConfig;

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: Hash32,
    #[serde(default)]
    status: Option<String>,
    block_number: Option<String>,
    gas_used: String,
}

pub fn parse_quantity(s: &str) -> Result<u128, LedgerError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Decode(format!("quantity without 0x prefix: {:?}", s)))?;
    if digits.is_empty() {
        return Err(LedgerError::Decode("empty quantity".to_string()));
    }
    u128::from_str_radix(digits, 16).map_err(|e| LedgerError::Decode(format!("{}: {:?}", e, s)))
}

pub fn parse_u64_quantity(s: &str) -> Result<u64, LedgerError> {
    let value = parse_quantity(s)?;
    u64::try_from(value).map_err(|_| LedgerError::Decode(format!("quantity {} does not fit u64", s)))
}

pub fn parse_data(s: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Decode(format!("data without 0x prefix: {:?}", s)))?;
    hex::decode(digits).map_err(|e| LedgerError::Decode(e.to_string()))
}

/// `None` while the transaction is pending.
pub fn parse_receipt(value: Value) -> Result<Option<Receipt>, LedgerError> {
    if value.is_null() {
        return Ok(None);
    }
    let raw: RawReceipt = serde_json::from_value(value).map_err(|e| LedgerError::Decode(e.to_string()))?;

    // Pre-Byzantium receipts carry no status.
    let success = match raw.status.as_deref() {
        Some(status) => parse_quantity(status)? == 1,
        None => true,
    };
    let block_number = match raw.block_number.as_deref() {
        Some(n) => parse_u64_quantity(n)?,
        None => return Ok(None),
    };

    Ok(Some(Receipt {
        tx_hash: raw.transaction_hash,
        success,
        block_number,
        gas_used: parse_u64_quantity(&raw.gas_used)?,
    }))
}

/// Live runs need a usable key. A dry run only borrows the key's address for
/// estimates, so a bad key there is dropped with a warning.
pub fn signer_for(config: &SubmissionConfig) -> Result<Option<LocalSigner>, LedgerError> {
    let Some(credential) = config.credential.as_ref() else {
        return Ok(None);
    };
    match LocalSigner::from_credential(credential) {
        Ok(signer) => Ok(Some(signer)),
        Err(e) if config.dry_run => {
            tracing::warn!("Ignoring unusable signing key in dry run: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug)]
pub struct RpcLedgerClient {
    url: String,
    client: Client,
    contract: Address,
    chain_id: u64,
    signer: Option<LocalSigner>,
    next_id: AtomicU64,
}

impl RpcLedgerClient {
    pub fn new(url: impl Into<String>, contract: Address, chain_id: u64, signer: Option<LocalSigner>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
            contract,
            chain_id,
            signer,
            next_id: AtomicU64::new(1),
        }
    }

    /// Builds the client from the run configuration and checks the endpoint
    /// serves the configured chain.
    pub async fn connect(config: &SubmissionConfig) -> Result<Self, LedgerError> {
        let signer = signer_for(config)?;
        if let Some(signer) = &signer {
            tracing::info!("Wallet address: {}", signer.address());
        }

        let client = Self::new(config.rpc_url.clone(), config.contract, config.network.chain_id(), signer);
        let actual = client.chain_id().await?;
        if actual != client.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: client.chain_id,
                actual,
            });
        }
        Ok(client)
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(LocalSigner::address)
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LedgerError::Transport(format!("{} request failed: {}", method, resp.status())));
        }

        let parsed: RpcResponse = resp.json().await.map_err(|e| LedgerError::Decode(e.to_string()))?;
        if let Some(err) = parsed.error {
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        serde_json::from_value(parsed.result.unwrap_or(Value::Null)).map_err(|e| LedgerError::Decode(e.to_string()))
    }

    pub async fn chain_id(&self) -> Result<u64, LedgerError> {
        let id: String = self.request("eth_chainId", json!([])).await?;
        parse_u64_quantity(&id)
    }

    fn call_object(&self, from: Option<Address>, data: &[u8]) -> Value {
        let mut obj = json!({
            "to": self.contract.to_checksum(),
            "data": format!("0x{}", hex::encode(data)),
        });
        if let Some(from) = from {
            obj["from"] = Value::String(from.to_checksum());
        }
        obj
    }

    async fn estimate_gas(&self, data: &[u8]) -> Result<u64, LedgerError> {
        let from = self.signer_address().unwrap_or(Address::ZERO);
        let gas: String = self
            .request("eth_estimateGas", json!([self.call_object(Some(from), data)]))
            .await?;
        parse_u64_quantity(&gas)
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn merkle_root(&self) -> Result<Hash32, LedgerError> {
        let ret: String = self
            .request(
                "eth_call",
                json!([self.call_object(None, &abi::encode_merkle_root()), "latest"]),
            )
            .await?;
        abi::decode_bytes32(&parse_data(&ret)?)
    }

    async fn estimate_apply(&self, call: &ApplyCall) -> Result<u64, LedgerError> {
        self.estimate_gas(&call.calldata()).await
    }

    async fn send_apply(&self, call: &ApplyCall) -> Result<Hash32, LedgerError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| LedgerError::Signer("no signing key configured".to_string()))?;
        let data = call.calldata();

        let nonce: String = self
            .request(
                "eth_getTransactionCount",
                json!([signer.address().to_checksum(), "pending"]),
            )
            .await?;
        let gas_price: String = self.request("eth_gasPrice", json!([])).await?;
        let gas_limit = self.estimate_gas(&data).await?;

        let tx = LegacyTransaction {
            nonce: parse_u64_quantity(&nonce)?,
            gas_price: parse_quantity(&gas_price)?,
            gas_limit,
            to: self.contract,
            value: 0,
            data,
            chain_id: self.chain_id,
        };
        let signed = signer.sign(&tx)?;
        tracing::debug!(nonce = tx.nonce, gas_limit, "Sending raw transaction");

        let returned: Hash32 = self
            .request("eth_sendRawTransaction", json!([signed.raw_hex()]))
            .await?;
        if returned != signed.hash {
            tracing::warn!("Node returned hash {} for transaction {}", returned, signed.hash);
        }
        Ok(returned)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: Hash32,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Receipt, LedgerError> {
        let started = Instant::now();
        loop {
            let value: Value = self
                .request("eth_getTransactionReceipt", json!([tx_hash.to_hex()]))
                .await?;
            if let Some(receipt) = parse_receipt(value)? {
                return Ok(receipt);
            }
            if started.elapsed() >= timeout {
                return Err(LedgerError::ConfirmationTimeout {
                    tx_hash,
                    waited_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credential;

    fn config_with_key(key: &str, dry_run: bool) -> SubmissionConfig {
        let mut config = SubmissionConfig::new("http://127.0.0.1:8545", Address([0x42; 20]));
        config.credential = Some(Credential::new(key));
        config.dry_run = dry_run;
        config
    }

    #[test]
    fn test_signer_for_dry_run_tolerates_bad_key() {
        assert!(signer_for(&config_with_key("0xnothex", true)).unwrap().is_none());
        assert!(matches!(
            signer_for(&config_with_key("0xnothex", false)),
            Err(LedgerError::Signer(_))
        ));

        let key = format!("0x{}", "00".repeat(31) + "01");
        assert!(signer_for(&config_with_key(&key, false)).unwrap().is_some());
        assert!(signer_for(&config_with_key(&key, true)).unwrap().is_some());
    }

    #[test]
    fn test_quantities() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x4a817c800").unwrap(), 20_000_000_000);
        assert_eq!(parse_u64_quantity("0xaa36a7").unwrap(), 11_155_111);
        assert!(parse_quantity("12").is_err());
        assert!(parse_quantity("0x").is_err());
        assert!(parse_u64_quantity("0x10000000000000000").is_err());
    }

    #[test]
    fn test_parse_receipt() {
        let hash = format!("0x{}", "ab".repeat(32));
        let ok = json!({
            "transactionHash": hash,
            "status": "0x1",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
        });
        let receipt = parse_receipt(ok).unwrap().unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.gas_used, 21_000);

        let reverted = json!({
            "transactionHash": hash,
            "status": "0x0",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
        });
        assert!(!parse_receipt(reverted).unwrap().unwrap().success);

        assert_eq!(parse_receipt(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_parse_data() {
        assert_eq!(parse_data("0x0102").unwrap(), vec![1, 2]);
        assert!(parse_data("0102").is_err());
    }

    #[test]
    fn test_call_object_from() {
        let client = RpcLedgerClient::new("http://localhost:8545", Address([0x11; 20]), 1, None);
        let obj = client.call_object(None, &[0xab]);
        assert_eq!(obj["data"], "0xab");
        assert!(obj.get("from").is_none());

        let obj = client.call_object(Some(Address::ZERO), &[]);
        assert_eq!(obj["from"], Address::ZERO.to_checksum());
    }
}
