//! Restock notifier Telegram binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p restock-telegram -- --config ~/restock.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use restock_core::{config, ConfigError, Settings};
use restock_runtime::{AvailabilityMonitor, Bot, ChannelSource, ConsoleNotifier, MonitorConfig, Runner};
use restock_telegram::{TelegramBot, TelegramError};
use tracing_subscriber::EnvFilter;

/// Inbound message buffer between the dispatcher and the runner.
const INBOUND_CAPACITY: usize = 64;

/// Restock notifier - announces restocks to Telegram chats
#[derive(Parser, Debug)]
#[command(name = "restock-telegram")]
#[command(about = "Poll store inventory and notify Telegram chats when items are back in stock")]
struct Args {
    /// Config file (default: ~/.restock-notifier/config/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the poll interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Poll once, print the results to stdout and exit
    #[arg(long)]
    once: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_settings(args: &Args) -> Result<Settings, ConfigError> {
    let explicit: Option<PathBuf> = args.config.as_deref().map(config::expand_path);
    let mut settings = Settings::load(explicit.as_deref())?;
    if let Some(interval) = args.interval {
        settings.poll_interval_seconds = interval;
    }
    settings.validate(!args.once)?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load environment variables from config directory first
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let filter = match args.verbose {
        0 => "restock_telegram=info,restock_runtime=info,restock_inventory=warn,teloxide=warn",
        1 => "restock_telegram=debug,restock_runtime=debug,restock_inventory=debug,teloxide=info",
        2 => "restock_telegram=trace,restock_runtime=trace,restock_inventory=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let lookup = restock_inventory::from_settings(&settings.lookup)?;
    let monitor_config = MonitorConfig::from_settings(&settings);

    if args.once {
        let monitor = AvailabilityMonitor::new(
            settings.bot_name.clone(),
            monitor_config,
            settings.tracked_items(),
            settings.recipient_addresses(),
            lookup,
            Arc::new(ConsoleNotifier::new()),
        );
        let report = monitor.poll_once().await;
        tracing::info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            notified = report.notified.len(),
            "single poll complete"
        );
        println!("{}", monitor.status_text().await);
        return Ok(());
    }

    let token = settings
        .credentials
        .telegram_bot_token
        .clone()
        .ok_or(TelegramError::NoToken)?;
    let telegram = TelegramBot::new(token)?;

    match telegram.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Restock notifier");
            println!("   Bot: @{}", username);
            println!("   Store: {}", settings.store_id);
            println!("   Items: {}", settings.item_ids.join(", "));
            println!("   Recipients: {}", settings.recipients.len());
            println!("   Interval: {}s", settings.poll_interval_seconds);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n[phone] Send \"status\" to the bot for the latest stock");
    println!("   Press Ctrl+C to stop\n");

    let (inbound_tx, source) = ChannelSource::new(INBOUND_CAPACITY);
    let dispatcher = telegram.spawn_dispatcher(inbound_tx);

    let monitor = Arc::new(AvailabilityMonitor::new(
        settings.bot_name.clone(),
        monitor_config,
        settings.tracked_items(),
        settings.recipient_addresses(),
        lookup,
        Arc::new(telegram.notifier()),
    ));

    let mut runner = Runner::new(source);
    runner.add_bot(monitor as Arc<dyn Bot>).map_err(TelegramError::from)?;
    runner.start().map_err(TelegramError::from)?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl+C received, shutting down");

    dispatcher.stop().await;
    runner.shutdown().await.map_err(TelegramError::from)?;

    Ok(())
}
