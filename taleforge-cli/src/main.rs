use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use taleforge_cli::{replay_file, run_simulation, CliError, LogConfig, Result, SimulationConfig};
use taleforge_core::{ActionResponse, EventEnvelope, EventQueue, FingerprintStrategy};
use taleforge_p2p::{FaultPlan, SessionConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "taleforge")]
#[command(
    version,
    about = "Taleforge - ordered game-event replay across peers"
)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless session with scripted players
    Simulate {
        /// Number of guests besides the host
        #[arg(short = 'g', long, default_value_t = 2)]
        guests: usize,

        /// Rounds; every peer acts once per round
        #[arg(short = 'r', long, default_value_t = 3)]
        rounds: usize,

        /// Seed for the scripted dice
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Deliver every state change twice
        #[arg(long)]
        duplicate: bool,

        /// Re-deliver the previous value after each state change
        #[arg(long)]
        stale: bool,

        #[arg(long, value_enum, default_value_t = Strategy::Sequence)]
        strategy: Strategy,

        /// Milliseconds between session ticks
        #[arg(long, default_value_t = 100)]
        poll_interval_ms: u64,

        /// Seconds a missing host keeps the lease before a guest claims it
        #[arg(long, default_value_t = 30)]
        host_grace_secs: u64,

        /// Pace ticks in wall-clock time
        #[arg(long)]
        realtime: bool,
    },

    /// Apply a recorded action response and print the resulting view
    Replay {
        /// JSON file holding `{"events": [...]}`
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Guests that replay alongside the host
        #[arg(short = 'g', long, default_value_t = 1)]
        guests: usize,

        #[arg(long, default_value_t = 20_000)]
        max_ticks: usize,
    },

    /// Print the JSON schema of a wire type
    Schema {
        #[arg(value_enum)]
        target: SchemaTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Sequence,
    Content,
}

impl From<Strategy> for FingerprintStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Sequence => FingerprintStrategy::Sequence,
            Strategy::Content => FingerprintStrategy::Content,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaTarget {
    Envelope,
    ActionResponse,
    Queue,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = if cli.verbose {
        LogConfig::dev()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::default()
    };
    if cli.json_logs {
        logging = logging.with_json();
    }
    logging.init()?;

    match cli.command {
        Commands::Simulate {
            guests,
            rounds,
            seed,
            duplicate,
            stale,
            strategy,
            poll_interval_ms,
            host_grace_secs,
            realtime,
        } => {
            if poll_interval_ms == 0 {
                return Err(CliError::InvalidConfig(
                    "poll interval must be positive".to_string(),
                ));
            }
            let session = SessionConfig::default()
                .with_poll_interval(poll_interval_ms)
                .with_fingerprint_strategy(strategy.into())
                .with_host_grace_period(Duration::from_secs(host_grace_secs));

            let config = SimulationConfig {
                guests,
                rounds,
                seed,
                faults: FaultPlan {
                    duplicate_state_changes: duplicate,
                    replay_stale_state: stale,
                },
                session,
                realtime,
                ..Default::default()
            };
            let report = run_simulation(config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Replay {
            file,
            guests,
            max_ticks,
        } => {
            let view = replay_file(&file, guests, max_ticks)?;
            info!("Replay of {} settled", file.display());
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Schema { target } => {
            let schema = match target {
                SchemaTarget::Envelope => schemars::schema_for!(EventEnvelope),
                SchemaTarget::ActionResponse => schemars::schema_for!(ActionResponse),
                SchemaTarget::Queue => schemars::schema_for!(EventQueue),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}
