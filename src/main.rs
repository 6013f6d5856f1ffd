use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use coinscan::{
    alerts::{DiscoveryFeed, ProtocolFeed},
    apis::{CoinGeckoClient, PriceSource},
    config::{self, Config},
    defi::{self, ProtocolUniverse},
    discovery::{self, DiscoveryInput, QueueAction},
    facts::ScanInput,
    logger::{self, LogTag},
    paths,
    pipeline::{self, RunInputs},
    store::{self, ArtifactStore, ListStore},
};

/// Watchlist hygiene scanner
///
/// Logger flags (`--debug-<tag>`, `--verbose`, `--quiet`, `--no-log-file`)
/// are accepted anywhere on the command line.
#[derive(Debug, Parser)]
#[command(name = "coinscan", version, about)]
struct Cli {
    /// Base directory for data, reports and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <data-dir>/data/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate one scan and write every report
    Run {
        /// Instrument facts for this scan (JSON)
        #[arg(long)]
        facts: PathBuf,

        /// Scored DeFi protocol feed (defaults to the last `defi` output)
        #[arg(long)]
        protocols: Option<PathBuf>,

        /// Discovery queue (defaults to <data-dir>/data/discovery_queue.json)
        #[arg(long)]
        discovery: Option<PathBuf>,

        /// Skip the price lookup; matured predictions stay open
        #[arg(long)]
        offline: bool,
    },
    /// Recompute the backtest report from stored predictions
    Stats,
    /// Score market data and update the discovery queue
    Discover {
        /// Trending coins and market listings (JSON)
        #[arg(long)]
        input: PathBuf,
    },
    /// Score a protocol universe into the protocol feed
    Defi {
        /// Raw protocol metrics (JSON)
        #[arg(long)]
        input: PathBuf,

        /// Feed destination (defaults to the reports directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Stage, promote or ignore discovery queue entries
    Queue {
        #[command(subcommand)]
        action: QueueCommand,
    },
}

#[derive(Debug, Subcommand)]
enum QueueCommand {
    /// Copy entries to the staging watchlist
    Stage { ids: Vec<String> },
    /// Move entries to the main watchlist
    Promote { ids: Vec<String> },
    /// Never suggest these coins again
    Ignore { ids: Vec<String> },
    /// Remove entries from the staging watchlist
    Unstage { ids: Vec<String> },
    /// Reopen ignored entries
    Unignore { ids: Vec<String> },
}

impl QueueCommand {
    fn into_parts(self) -> (QueueAction, Vec<String>) {
        match self {
            QueueCommand::Stage { ids } => (QueueAction::Stage, ids),
            QueueCommand::Promote { ids } => (QueueAction::Promote, ids),
            QueueCommand::Ignore { ids } => (QueueAction::Ignore, ids),
            QueueCommand::Unstage { ids } => (QueueAction::Unstage, ids),
            QueueCommand::Unignore { ids } => (QueueAction::Unignore, ids),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(std::env::args().filter(|arg| !logger::is_logger_flag(arg)));

    if let Some(dir) = &cli.data_dir {
        if let Err(e) = paths::set_base_directory(dir.clone()) {
            eprintln!("Failed to set data directory: {}", e);
            std::process::exit(1);
        }
    }

    // Logger needs the logs directory before it opens its file
    if let Err(e) = paths::ensure_all_directories() {
        eprintln!("Failed to create required directories: {}", e);
        std::process::exit(1);
    }
    logger::init();

    let code = match execute(cli).await {
        Ok(()) => 0,
        Err(e) => {
            logger::error(LogTag::System, &format!("{:#}", e));
            1
        }
    };

    logger::flush();
    std::process::exit(code);
}

async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(paths::get_config_path);
    config::load_config_from_path(&config_path)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("loading {}", config_path.display()))?;
    let cfg = config::get_config_clone();

    let store = ArtifactStore::default();
    match cli.command {
        Command::Run {
            facts,
            protocols,
            discovery,
            offline,
        } => {
            let protocols = protocols.unwrap_or_else(paths::get_protocol_feed_path);
            let discovery = discovery.unwrap_or_else(paths::get_discovery_queue_path);
            let inputs = load_inputs(&facts, &protocols, &discovery)?;
            run(inputs, &store, &cfg, offline).await
        }
        Command::Stats => {
            let report = pipeline::recompute_backtest_report(&store, &cfg, Utc::now())
                .context("recomputing backtest report")?;
            logger::info(
                LogTag::Backtest,
                &format!(
                    "Backtest report: {} predictions tracked, written to {}",
                    report.stats.predictions_tracked,
                    store.backtest_report_path().display()
                ),
            );
            Ok(())
        }
        Command::Discover { input } => discover(&input, &cfg),
        Command::Defi { input, output } => {
            let output = output.unwrap_or_else(paths::get_protocol_feed_path);
            score_protocols(&input, &output, &cfg)
        }
        Command::Queue { action } => {
            let (action, ids) = action.into_parts();
            manage_queue(action, &ids)
        }
    }
}

fn read_required<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    store::read_json(path)
        .with_context(|| format!("reading {} from {}", what, path.display()))?
        .ok_or_else(|| anyhow!("{} file {} not found", what, path.display()))
}

fn discover(input: &Path, cfg: &Config) -> Result<()> {
    let input: DiscoveryInput = read_required(input, "market data")?;
    let lists = ListStore::default();
    let mut state = lists.load().context("loading watchlists and discovery queue")?;

    let candidates = discovery::run(&input, &mut state, &cfg.discovery, Utc::now());
    store::write_json_atomic(&lists.queue_path, &state.queue).context("writing discovery queue")?;

    logger::info(
        LogTag::Discovery,
        &format!(
            "{} potential watchlist additions, queue written to {}",
            candidates.len(),
            lists.queue_path.display()
        ),
    );
    Ok(())
}

fn score_protocols(input: &Path, output: &Path, cfg: &Config) -> Result<()> {
    let universe: ProtocolUniverse = read_required(input, "protocol metrics")?;
    let feed = defi::build_feed(&universe.protocols, &cfg.defi, Utc::now());
    store::write_json_atomic(output, &feed).context("writing protocol feed")?;
    logger::info(
        LogTag::Defi,
        &format!("Protocol feed written to {}", output.display()),
    );
    Ok(())
}

fn manage_queue(action: QueueAction, ids: &[String]) -> Result<()> {
    if ids.iter().all(|id| id.trim().is_empty()) {
        return Err(anyhow!("{} needs at least one coin id", action.as_str()));
    }
    let lists = ListStore::default();
    let mut state = lists.load().context("loading watchlists and discovery queue")?;

    let (outcomes, changed) = discovery::apply(&mut state, action, ids, Utc::now());
    for (id, outcome) in &outcomes {
        logger::info(LogTag::Discovery, &format!("- {}: {}", id, outcome.describe()));
    }
    if changed {
        lists.save(&state).context("saving watchlists and discovery queue")?;
    }
    Ok(())
}

fn load_inputs(facts: &Path, protocols: &Path, discovery: &Path) -> Result<RunInputs> {
    let scan: ScanInput = read_required(facts, "facts")?;
    let protocols: ProtocolFeed = store::read_feed(Some(protocols)).context("reading protocol feed")?;
    let discovery: DiscoveryFeed = store::read_feed(Some(discovery)).context("reading discovery feed")?;

    logger::debug(
        LogTag::Pipeline,
        &format!(
            "Inputs: instruments={} protocols={} discovery={}",
            scan.instruments.len(),
            protocols.protocols.len(),
            discovery.candidates.len()
        ),
    );

    Ok(RunInputs {
        scan,
        protocols,
        discovery,
    })
}

async fn run(inputs: RunInputs, store: &ArtifactStore, cfg: &Config, offline: bool) -> Result<()> {
    let previous = store.load_previous_snapshot();
    let predictions = if cfg.backtest.enabled {
        store.load_predictions().context("loading predictions store")?
    } else {
        Vec::new()
    };
    let alert_state = store.load_alert_state();

    let client = if offline || !cfg.prices.enabled {
        None
    } else {
        Some(CoinGeckoClient::new(&cfg.prices).context("creating price client")?)
    };
    let prices = client.as_ref().map(|c| c as &dyn PriceSource);

    let output = pipeline::run_cycle(
        inputs,
        previous.as_ref(),
        predictions,
        alert_state,
        prices,
        cfg,
        Utc::now(),
    )
    .await
    .context("evaluating scan")?;

    pipeline::persist_run(store, &output, cfg).context("writing reports")?;

    logger::info(
        LogTag::System,
        &format!(
            "Scan complete: {} instruments, {} alerts ({} new), actionable_today={}",
            output.snapshot.instruments.len(),
            output.alerts.alerts.len(),
            output.new_alerts.len(),
            output.snapshot.actionable_today
        ),
    );
    Ok(())
}
