// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use batchproof_kernel::planner::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use batchproof_kernel::{Address, BatchPlanner};
use chrono::{DateTime, Utc};

use crate::errors::RelayError;

pub const DEFAULT_TREE_FILE: &str = "./data/merkle-tree.json";
pub const DEFAULT_PROOFS_DIR: &str = "./data/proofs";
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// What generation does when a batch proof fails local verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityPolicy {
    /// Stop at the first bad batch. Records of earlier batches stay on disk.
    #[default]
    FailFast,
    /// Prove every batch, report every bad one, write nothing if any failed.
    CollectAll,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub tree_file: PathBuf,
    pub output_dir: PathBuf,
    pub batch_size: usize,
    pub max_batches: Option<usize>,
    pub max_batch_size: usize,
    /// Worker threads used for proving. 1 means sequential.
    pub jobs: usize,
    pub integrity_policy: IntegrityPolicy,
    /// Stamped on every record. `None` uses the time the run starts.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            tree_file: PathBuf::from(DEFAULT_TREE_FILE),
            output_dir: PathBuf::from(DEFAULT_PROOFS_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            max_batches: None,
            max_batch_size: MAX_BATCH_SIZE,
            jobs: 1,
            integrity_policy: IntegrityPolicy::FailFast,
            timestamp: None,
        }
    }
}

impl GenerationConfig {
    pub fn planner(&self) -> BatchPlanner {
        BatchPlanner::new(self.max_batch_size)
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.max_batch_size == 0 {
            return Err(RelayError::Config("max batch size must be positive".to_string()));
        }
        self.planner().check_batch_size(self.batch_size)?;
        if self.max_batches == Some(0) {
            return Err(RelayError::Config("max batches must be positive".to_string()));
        }
        if self.jobs == 0 {
            return Err(RelayError::Config("jobs must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Target chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Sepolia,
    Optimism,
    Arbitrum,
    Base,
    /// Any other EVM chain, by id.
    Custom(u64),
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Sepolia => 11_155_111,
            Network::Optimism => 10,
            Network::Arbitrum => 42_161,
            Network::Base => 8_453,
            Network::Custom(id) => *id,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mainnet" | "ethereum" => Some(Network::Mainnet),
            "sepolia" => Some(Network::Sepolia),
            "optimism" => Some(Network::Optimism),
            "arbitrum" => Some(Network::Arbitrum),
            "base" => Some(Network::Base),
            other => other.parse().ok().map(Network::Custom),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet (1)"),
            Network::Sepolia => write!(f, "sepolia (11155111)"),
            Network::Optimism => write!(f, "optimism (10)"),
            Network::Arbitrum => write!(f, "arbitrum (42161)"),
            Network::Base => write!(f, "base (8453)"),
            Network::Custom(id) => write!(f, "chain {}", id),
        }
    }
}

/// Signing key handle. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Reads `PRIVATE_KEY` from the environment, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(PRIVATE_KEY_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
    }

    pub fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub proofs_dir: PathBuf,
    pub rpc_url: String,
    pub contract: Address,
    pub network: Network,
    pub dry_run: bool,
    /// Batches numbered below this are skipped.
    pub start_batch: u64,
    /// Expected `metadata.batchSize` of the records, if the operator pins it.
    pub batch_size: Option<usize>,
    pub credential: Option<Credential>,
    pub poll_interval: Duration,
    pub confirmation_timeout: Duration,
}

impl SubmissionConfig {
    pub fn new(rpc_url: impl Into<String>, contract: Address) -> Self {
        Self {
            proofs_dir: PathBuf::from(DEFAULT_PROOFS_DIR),
            rpc_url: rpc_url.into(),
            contract,
            network: Network::Mainnet,
            dry_run: false,
            start_batch: 1,
            batch_size: None,
            credential: None,
            poll_interval: Duration::from_secs(2),
            confirmation_timeout: Duration::from_secs(300),
        }
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.rpc_url.trim().is_empty() {
            return Err(RelayError::Config(
                "RPC URL must be provided via --rpc-url or RPC_URL".to_string(),
            ));
        }
        if self.contract == Address::ZERO {
            return Err(RelayError::Config("contract address must be set".to_string()));
        }
        if self.start_batch == 0 {
            return Err(RelayError::Config("start batch must be at least 1".to_string()));
        }
        if let Some(size) = self.batch_size {
            BatchPlanner::default().check_batch_size(size)?;
        }
        if !self.dry_run && self.credential.is_none() {
            return Err(RelayError::Config(format!(
                "{} must be provided (unless using --dry-run)",
                PRIVATE_KEY_ENV
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(RelayError::Config("poll interval must be positive".to_string()));
        }
        Ok(())
    }
}
