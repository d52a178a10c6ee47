//! Endpoint dispatch service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ trace → request id → timeout
//!                                            │
//!                                            ▼
//!                              ┌──────────────────────────┐
//!                              │      dispatch stage      │
//!                              │  attach EndpointFeature  │
//!                              │  await shared matcher ◀──┼── built once from
//!                              │  match → observe         │   CompositeSource
//!                              └────────────┬─────────────┘
//!                                           ▼
//!     Client Response           endpoint handler (200 / 404)
//!     ◀─────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use endpoint_dispatch::config::{load_config, validation::validate_config, ConfigError};
use endpoint_dispatch::lifecycle::startup;
use endpoint_dispatch::observability::logging;
use endpoint_dispatch::DispatchConfig;

#[derive(Parser, Debug)]
#[command(name = "endpoint-dispatch")]
#[command(about = "Selects the endpoint for each HTTP request", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "ENDPOINT_DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

fn load(cli: &Cli) -> Result<DispatchConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("endpoint-dispatch: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        sources = config.sources.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Fatal error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
