use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rider_client::cli::{self, Cli};
use rider_client::config::{Config, LogFormat};
use rider_client::error::AppError;
use rider_client::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("{}", err.alert());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let state = AppState::init(config).await?;
    let dump_metrics = cli.metrics;

    let result = cli::run(cli, &state).await;

    if dump_metrics {
        match state.metrics.encode() {
            Ok(text) => print!("{text}"),
            Err(err) => tracing::warn!(error = %err, "failed to encode metrics"),
        }
    }

    result
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::new(config.log_level.clone());

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init(),
    }
}
