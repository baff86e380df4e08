// Stake Ledger - Entry point

use clap::Parser;
use stake_ledger::cli::runner::{replay, Scenario};
use stake_ledger::cli::{Cli, Commands, CommitHashCmd, InitConfigCmd, InspectCmd, ReplayCmd};
use stake_ledger::contracts::commit_hash;
use stake_ledger::genesis::{GenesisBuilder, GenesisSpec, LedgerConfig};
use stake_ledger::runtime::MemoryRuntime;
use stake_ledger::storage::LedgerState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "ledger.json";
const GENESIS_FILE: &str = "genesis.json";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_filter = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .init();

    match cli.command {
        Commands::Replay(cmd) => run_replay(cmd),
        Commands::CommitHash(cmd) => print_commit_hash(cmd),
        Commands::InitConfig(cmd) => init_config(cmd),
        Commands::Inspect(cmd) => inspect(cmd),
    }
}

fn run_replay(cmd: ReplayCmd) -> anyhow::Result<()> {
    let config = match &cmd.config {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };
    let genesis = match &cmd.genesis {
        Some(path) => GenesisSpec::from_file(path)?,
        None => GenesisSpec::dev(),
    };
    let scenario = Scenario::from_file(&cmd.scenario)?;
    info!("📜 Replaying {} steps from {}", scenario.steps.len(), cmd.scenario.display());

    let mut state = GenesisBuilder::new(config, genesis).build()?;
    let report = replay(&mut state, &scenario)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("steps:      {}", report.results.len());
        println!("applied:    {}", report.applied());
        println!("rejected:   {}", report.rejected());
        println!("block:      {}", report.state_root.block_number);
        println!("state root: {}", report.state_root.root.to_hex());
        for mismatch in &report.mismatches {
            println!("mismatch:   {}", mismatch);
        }
    }

    if let Some(path) = &cmd.snapshot_out {
        state.save_snapshot(path, report.state_root.block_number)?;
    }

    if cmd.strict && !report.mismatches.is_empty() {
        error!("{} steps did not match their expectation", report.mismatches.len());
        anyhow::bail!("{} expectation mismatches", report.mismatches.len());
    }

    Ok(())
}

fn print_commit_hash(cmd: CommitHashCmd) -> anyhow::Result<()> {
    let salt = cmd
        .salt_bytes()
        .map_err(|e| anyhow::anyhow!("Invalid salt: {}", e))?;
    println!("{}", commit_hash(cmd.weight, &salt).to_hex());
    Ok(())
}

fn init_config(cmd: InitConfigCmd) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cmd.output)?;
    let config_path = cmd.output.join(CONFIG_FILE);
    let genesis_path = cmd.output.join(GENESIS_FILE);

    for path in [&config_path, &genesis_path] {
        if path.exists() && !cmd.force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
    }

    LedgerConfig::default().to_file(&config_path)?;
    GenesisSpec::dev().to_file(&genesis_path)?;

    info!("Wrote {} and {}", config_path.display(), genesis_path.display());
    Ok(())
}

fn inspect(cmd: InspectCmd) -> anyhow::Result<()> {
    let (state, block) = LedgerState::<MemoryRuntime>::load_snapshot(&cmd.snapshot)?;
    let root = state.state_root(block)?;

    println!("block:                {}", block);
    println!("state root:           {}", root.root.to_hex());
    println!("total stake:          {}", state.total_stake());
    println!("total delegate stake: {}", state.total_delegate_stake());
    println!("total node stake:     {}", state.total_node_delegate_stake());
    println!("queued swaps:         {}", state.store().swaps.len());
    println!("free balances:        {}", state.runtime().total_issuance());
    Ok(())
}
