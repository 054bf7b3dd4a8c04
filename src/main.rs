//! DRAWBOOK — draw-betting ledger with loss-recovery staking
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the ledger from its data directory and runs one command.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::io;
use tracing::{debug, info};

use drawbook::cli::{self, Cli};
use drawbook::config::AppConfig;
use drawbook::ledger::Ledger;
use drawbook::storage::JsonDirStore;
use drawbook::strategy::recovery::StakingEngine;

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let args = Cli::parse();
    init_logging();

    let mut cfg = AppConfig::load_or_default(&args.config)?;
    if let Some(dir) = args.data_dir {
        cfg.storage.data_dir = dir;
    }
    debug!(
        data_dir = %cfg.storage.data_dir.display(),
        base_stake = %cfg.staking.base_stake,
        recovery_margin = %cfg.staking.recovery_margin,
        "Configuration loaded"
    );

    let blobs = JsonDirStore::open(&cfg.storage.data_dir)?;
    let mut ledger = Ledger::open(blobs)?;
    info!(
        competitions = ledger.entities().competitions().len(),
        bets = ledger.entities().bets().len(),
        "Ledger opened"
    );

    let engine = StakingEngine::new(cfg.staking);
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::execute(&mut ledger, &engine, args.command, today, &mut out)
}

/// Initialise the tracing subscriber.
///
/// Uses `RUST_LOG` env var for filtering (default: `drawbook=info`).
/// Set `DRAWBOOK_LOG_JSON=1` for JSON output. Logs go to stderr so
/// command output on stdout stays clean.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("drawbook=info"));

    let json_logging = std::env::var("DRAWBOOK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(io::stderr)
            .init();
    }
}
