// src/main.rs

//! sitewatch CLI: watch sitemap feeds and push newly published URLs to
//! notification channels.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use sitewatch::commands::CommandContext;
use sitewatch::error::Result;
use sitewatch::fetch::HttpFetcher;
use sitewatch::models::Config;
use sitewatch::monitor::SitemapMonitor;
use sitewatch::notify::{NotifierRegistry, TelegramNotifier, WebhookNotifier};
use sitewatch::registry::FeedRegistry;
use sitewatch::scheduler::Scheduler;
use sitewatch::store::{LocalSnapshotStore, SnapshotStore};

/// sitewatch - sitemap update monitor
#[derive(Parser, Debug)]
#[command(name = "sitewatch", version, about = "Sitemap update monitor")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sitewatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the periodic monitoring loop
    Run,

    /// Show the watched sitemap list
    List,

    /// Add a sitemap URL to the watch list and check it immediately
    Add {
        /// Sitemap URL (must contain "sitemap")
        url: String,
    },

    /// Remove a sitemap URL from the watch list
    Del {
        url: String,
    },

    /// Force a keyword summary from the stored snapshots
    Summary,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the notification channels configured in the config file.
fn build_notifiers(config: &Config) -> Result<NotifierRegistry> {
    let mut notifiers = NotifierRegistry::new();
    let pacing = config.scheduler.message_pacing_ms;

    if let Some(telegram) = &config.channels.telegram {
        notifiers.register("telegram", Box::new(TelegramNotifier::new(telegram, pacing)?));
    }
    if let Some(webhook) = &config.channels.webhook {
        notifiers.register("webhook", Box::new(WebhookNotifier::new(webhook, pacing)?));
    }

    if notifiers.is_empty() {
        log::warn!("No notification channels configured; updates will only be logged");
    }

    Ok(notifiers)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let registry = Arc::new(FeedRegistry::load(&config.storage.feeds_file)?);
    let store: Arc<dyn SnapshotStore> =
        Arc::new(LocalSnapshotStore::new(&config.storage.sitemap_dir));
    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let notifiers = Arc::new(build_notifiers(&config)?);
    let monitor = SitemapMonitor::new(fetcher, Arc::clone(&store));

    match cli.command {
        Command::Run => {
            let scheduler = Scheduler::new(
                Arc::clone(&registry),
                monitor,
                Arc::clone(&notifiers),
                Arc::clone(&store),
                config.scheduler.clone(),
            );

            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("Shutdown signal received");
                    let _ = shutdown_tx.send(true);
                }
            });

            log::info!(
                "Watching {} feeds with channels: {:?}",
                registry.list().len(),
                notifiers.channel_names()
            );
            scheduler.run(shutdown_rx).await;
        }

        Command::List => {
            let context = command_context(registry, monitor, notifiers, store);
            println!("{}", context.handle_list());
        }

        Command::Add { url } => {
            let context = command_context(registry, monitor, notifiers, store);
            let reply = context.handle_add(&url).await;
            context.notifiers.broadcast_message(&reply, None).await;
            println!("{reply}");
        }

        Command::Del { url } => {
            let context = command_context(registry, monitor, notifiers, store);
            let reply = context.handle_remove(&url);
            context.notifiers.broadcast_message(&reply, None).await;
            println!("{reply}");
        }

        Command::Summary => {
            let context = command_context(registry, monitor, notifiers, store);
            println!("{}", context.handle_summary().await);
        }

        Command::Validate => {
            println!("Configuration OK: {}", cli.config.display());
        }
    }

    Ok(())
}

fn command_context(
    registry: Arc<FeedRegistry>,
    monitor: SitemapMonitor,
    notifiers: Arc<NotifierRegistry>,
    store: Arc<dyn SnapshotStore>,
) -> CommandContext {
    CommandContext {
        registry,
        monitor,
        notifiers,
        store,
    }
}
