//! Seismic Fetcher CLI application
//!
//! Command-line interface for building a resumable day-by-day archive of
//! continuous seismic waveforms from FDSN web services.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use seismic_fetcher::cli::{
    handle_catalog, handle_config, handle_download, handle_events, handle_status, Cli, Commands,
};
use seismic_fetcher::config::AppConfig;
use seismic_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Config management must work even when the current file is broken
    if matches!(cli.command, Commands::Config(_)) {
        init_logging(&cli_level(&cli));
        if let Commands::Config(args) = cli.command {
            return handle_config(args.action, cli.global.config, None).await;
        }
    }

    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    if let Some(root) = &cli.global.root {
        config.archive.root = root.clone();
    }

    let level = if cli.verbosity_overridden() {
        cli_level(&cli)
    } else {
        config.logging.level.clone()
    };
    init_logging(&level);

    info!("Seismic Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(args, config).await
        }
        Commands::Events(args) => {
            info!("Executing events command");
            handle_events(args, config).await
        }
        Commands::Status(args) => {
            info!("Executing status command");
            handle_status(args, config).await
        }
        Commands::Catalog => handle_catalog(config).await,
        Commands::Config(args) => handle_config(args.action, cli.global.config, Some(config)).await,
    }
}

fn cli_level(cli: &Cli) -> String {
    cli.log_level().to_string().to_lowercase()
}

/// Initialize logging at `level` unless `RUST_LOG` says otherwise
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("seismic_fetcher={}", level)));

    fmt().with_env_filter(filter).with_target(false).init();
}
