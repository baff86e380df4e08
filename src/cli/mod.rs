// CLI - Interface en ligne de commande du ledger
// Principe: commandes simples, sorties reproductibles

pub mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stake Ledger - replay and inspect stake accounting scenarios
#[derive(Parser, Debug)]
#[command(name = "stake-ledger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stake accounting and delegation ledger")]
#[command(long_about = r#"
Deterministic stake ledger: direct stake, share-based delegate pools,
time-locked unbonding, deferred swaps and overwatch commit-reveal weights.

Write a default configuration and development genesis:
  stake-ledger init-config --output ./ledger

Replay a scenario and print the resulting state root:
  stake-ledger replay --scenario steps.json --config ./ledger/ledger.json --genesis ./ledger/genesis.json

Compute the commit hash of a weight before submitting it:
  stake-ledger commit-hash --weight 500000000000000000 --salt 0xdeadbeef
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "STAKE_LEDGER_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a JSON scenario against a genesis state
    Replay(ReplayCmd),

    /// Print hash256(encode(weight, salt)) for an overwatch commit
    CommitHash(CommitHashCmd),

    /// Write default ledger.json and genesis.json files
    InitConfig(InitConfigCmd),

    /// Print the state root and totals of a snapshot
    Inspect(InspectCmd),
}

#[derive(Parser, Debug)]
pub struct ReplayCmd {
    /// Scenario file
    #[arg(long, env = "STAKE_LEDGER_SCENARIO")]
    pub scenario: PathBuf,

    /// Ledger configuration (defaults apply when omitted)
    #[arg(long, env = "STAKE_LEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Genesis specification (development genesis when omitted)
    #[arg(long, env = "STAKE_LEDGER_GENESIS")]
    pub genesis: Option<PathBuf>,

    /// Write a bincode snapshot of the final state
    #[arg(long)]
    pub snapshot_out: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with an error when a step does not match its `expect`
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug)]
pub struct CommitHashCmd {
    /// Weight, 1e18 = 100%
    #[arg(long)]
    pub weight: u128,

    /// Salt as hex, with or without 0x
    #[arg(long)]
    pub salt: String,
}

#[derive(Parser, Debug)]
pub struct InitConfigCmd {
    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct InspectCmd {
    /// Snapshot file written by `replay --snapshot-out`
    #[arg(long)]
    pub snapshot: PathBuf,
}

impl CommitHashCmd {
    pub fn salt_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(self.salt.strip_prefix("0x").unwrap_or(&self.salt))
    }
}
