// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use batchproof_cli::commands::{generate, inspect, submit, verify};
use batchproof_kernel::planner::DEFAULT_BATCH_SIZE;
use batchproof_kernel::Address;
use batchproof_relay::config::{DEFAULT_PROOFS_DIR, DEFAULT_TREE_FILE};
use batchproof_relay::{telemetry, Credential, GenerationConfig, IntegrityPolicy, Network, SubmissionConfig};

#[derive(Parser)]
#[command(name = "batchproof")]
#[command(about = "Batched Merkle multi-proof generation and submission", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    FailFast,
    CollectAll,
}

impl From<PolicyArg> for IntegrityPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FailFast => IntegrityPolicy::FailFast,
            PolicyArg::CollectAll => IntegrityPolicy::CollectAll,
        }
    }
}

fn parse_network(s: &str) -> Result<Network, String> {
    Network::from_name(s).ok_or_else(|| format!("unknown chain {:?}", s))
}

#[derive(Subcommand)]
enum Commands {
    /// Split the tree into batches and write one verified proof record per batch
    Generate {
        /// Tree dump in standard-v1 format
        #[arg(long, default_value = DEFAULT_TREE_FILE)]
        tree: PathBuf,

        #[arg(long, default_value = DEFAULT_PROOFS_DIR)]
        output_dir: PathBuf,

        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Stop after this many batches
        #[arg(long)]
        max_batches: Option<usize>,

        /// Worker threads for proving
        #[arg(long, default_value_t = 1)]
        jobs: usize,

        #[arg(long, value_enum, default_value_t = PolicyArg::FailFast)]
        integrity_policy: PolicyArg,
    },
    /// Check the remote root, then submit stored batches in order
    Submit {
        #[arg(long, default_value = DEFAULT_PROOFS_DIR)]
        proofs_dir: PathBuf,

        #[arg(long, env = "RPC_URL")]
        rpc_url: String,

        /// Fee adapter contract address
        #[arg(long, env = "FEE_ADAPTER_ADDRESS")]
        contract: Address,

        #[arg(long, default_value = "mainnet", value_parser = parse_network)]
        chain: Network,

        /// Estimate gas only; nothing is sent
        #[arg(long)]
        dry_run: bool,

        /// Skip batches numbered below this
        #[arg(long, default_value_t = 1)]
        start_batch: u64,

        /// Refuse records generated with a different batch size
        #[arg(long)]
        batch_size: Option<usize>,

        #[arg(long, default_value_t = 2000)]
        poll_interval_ms: u64,

        #[arg(long, default_value_t = 300)]
        confirmation_timeout_secs: u64,
    },
    /// Show the stored proof records
    Inspect {
        #[arg(long, default_value = DEFAULT_PROOFS_DIR)]
        proofs_dir: PathBuf,
    },
    /// Re-verify every stored proof offline
    Verify {
        #[arg(long, default_value = DEFAULT_PROOFS_DIR)]
        proofs_dir: PathBuf,

        /// Also require the records to match this tree's root
        #[arg(long)]
        tree: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            tree,
            output_dir,
            batch_size,
            max_batches,
            jobs,
            integrity_policy,
        } => {
            let config = GenerationConfig {
                tree_file: tree,
                output_dir,
                batch_size,
                max_batches,
                jobs,
                integrity_policy: integrity_policy.into(),
                ..GenerationConfig::default()
            };
            generate::run(&config)
        }
        Commands::Submit {
            proofs_dir,
            rpc_url,
            contract,
            chain,
            dry_run,
            start_batch,
            batch_size,
            poll_interval_ms,
            confirmation_timeout_secs,
        } => {
            let mut config = SubmissionConfig::new(rpc_url, contract);
            config.proofs_dir = proofs_dir;
            config.network = chain;
            config.dry_run = dry_run;
            config.start_batch = start_batch;
            config.batch_size = batch_size;
            config.credential = Credential::from_env();
            config.poll_interval = Duration::from_millis(poll_interval_ms);
            config.confirmation_timeout = Duration::from_secs(confirmation_timeout_secs);
            submit::run(config).await
        }
        Commands::Inspect { proofs_dir } => inspect::run(&proofs_dir),
        Commands::Verify { proofs_dir, tree } => verify::run(&proofs_dir, tree.as_deref()),
    }
}
