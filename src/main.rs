//! storage-sweep - Azure Storage container and queue cleanup
//!
//! Command-line entry point.

use clap::Parser;
use storage_sweep::cli::Cli;
use storage_sweep::config::{self, Config};
use storage_sweep::Result;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Validation happens where a storage client is built, so config
    // commands work before an account is configured
    let mut config: Config = config::load_config_no_validation().await?;
    cli.apply_overrides(&mut config)?;

    // Logging settles only once file, environment and flags are merged
    init_logging(&config);
    debug!("Starting storage-sweep");

    cli.execute(config).await
}

fn init_logging(config: &Config) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
