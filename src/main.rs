//! Speed Test Monitor - Main CLI Application
//!
//! Periodically measures network throughput and latency and publishes the
//! results to a time-series store and a notification webhook.

use clap::Parser;
use speedtest_monitor::{
    app::{App, TokioSleeper},
    cli::Cli,
    config::{display_config_summary, load_config},
    error::{AppError, Result},
    logging::{LogFormat, LogLevel, Logger},
    probe::{Measurer, ServerSelector, SpeedtestProvider},
    publish::{InfluxWriter, Notifier, ResultPublisher, WebhookNotifier},
    PKG_NAME, VERSION,
};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    // Parse and validate command line arguments
    let cli = Cli::parse();
    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    let min_level = if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Console
    };
    let logger = Logger::new(min_level, cli.use_colors(), format);

    if let Err(e) = run_application(cli, &logger).await {
        // CRITICAL precedes every process exit caused by a fatal error
        logger.critical(&e.to_string());
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli, logger: &Logger) -> Result<()> {
    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("Debug mode enabled");
        println!();
    }

    // Load and validate configuration
    let config = load_config(cli)?;

    if config.debug {
        println!("Configuration loaded successfully:");
        println!("{}", display_config_summary(&config));
        println!();
    }

    // Verify store reachability and credentials before any probe runs
    let writer = Arc::new(InfluxWriter::new(&config, logger)?);
    writer.connect().await?;

    let notifier: Option<Arc<dyn Notifier>> = match config.webhook_key.as_deref() {
        Some(key) if !key.is_empty() => Some(Arc::new(WebhookNotifier::new(
            &config.webhook_host,
            key,
            logger,
        )?)),
        _ => {
            logger.debug("Webhook publishing disabled, no key configured");
            None
        }
    };

    let publisher = ResultPublisher::new(writer, notifier, logger);

    let provider = Arc::new(SpeedtestProvider::new(logger)?);
    let selector: Arc<dyn ServerSelector> = provider.clone();
    let measurer: Arc<dyn Measurer> = provider;

    let app = App::new(
        config,
        selector,
        measurer,
        publisher,
        Box::new(TokioSleeper),
        logger,
    );

    // Runs forever; only a fatal error falls through
    app.run().await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config { .. } => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Verify the store address and port");
            eprintln!("  - Ensure the delay is greater than 0");
        }
        AppError::StoreUnreachable { .. } | AppError::StoreConnect { .. } => {
            eprintln!();
            eprintln!("Store troubleshooting:");
            eprintln!("  - Check that the store is running and reachable");
            eprintln!("  - Verify the address and port");
            eprintln!("  - Check the --ssl flag matches the store's protocol");
        }
        AppError::StoreAuthRejected { .. } => {
            eprintln!();
            eprintln!("Authentication troubleshooting:");
            eprintln!("  - Verify the store user name and password");
            eprintln!("  - Check that the user has write permission");
        }
        AppError::ProviderConfig { .. } => {
            eprintln!();
            eprintln!("Provider troubleshooting:");
            eprintln!("  - Check your internet connection");
            eprintln!("  - The speed test provider may be temporarily down");
        }
        _ => {}
    }
}
