//! Pricewatch CLI - interactive price-comparison console.
//!
//! # Usage
//!
//! ```bash
//! # Start against the built-in mock catalogue
//! pw
//!
//! # Start against a remote data service
//! PRICEWATCH_API_BASE_URL=https://prices.example.com/api/ pw
//!
//! # Reprint the whole screen after every command
//! pw --full
//! ```
//!
//! Inside the console type `help` for the list of commands. Logs go to stderr;
//! set `RUST_LOG` to change the level.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::Parser;
use pricewatch_console::{Console, ConsoleConfig, HttpDataService, MockDataService};
use pricewatch_core::ServiceError;
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod repl;

#[derive(Parser)]
#[command(name = "pw")]
#[command(author, version, about = "Pricewatch price-comparison console")]
struct Cli {
    /// Use the mock catalogue even when a data service URL is configured
    #[arg(long)]
    mock: bool,

    /// Print every region after each command, not only the changed ones
    #[arg(long)]
    full: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to create data service client: {0}")]
    Service(#[from] ServiceError),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ConsoleConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pricewatch_console=info,pricewatch_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Console failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ConsoleConfig) -> Result<(), CliError> {
    match config.api.clone() {
        Some(api) if !cli.mock => {
            let service = HttpDataService::new(&api)?;
            tracing::info!(base_url = %api.base_url, "Using remote data service");
            repl::run(&Console::new(config, service), cli.full).await
        }
        _ => {
            tracing::info!("Using built-in mock catalogue");
            let service = MockDataService::with_latency(config.mock_latency);
            repl::run(&Console::new(config, service), cli.full).await
        }
    }
}
