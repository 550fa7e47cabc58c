//! Price Tracker command line
//!
//! Calls the tracker's operations and prints their results:
//! - `add` / `refresh` fetch a price through the remote browser
//! - `list` / `history` read the stored data
//! - `watch` refreshes every product on an interval

use clap::{Parser, Subcommand};
use price_tracker::config::AppConfig;
use price_tracker::database::{create_pool, run_migrations};
use price_tracker::models::{Observation, PriceCheck, TrackedProduct};
use price_tracker::scraper::BrowserFetcher;
use price_tracker::services::RefreshPoller;
use price_tracker::{AppError, AppResult, AppState};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "price-tracker",
    about = "Track product prices against target prices",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a product page
    Add {
        /// Product page URL
        url: String,
        /// Alert when the price is at or below this value
        #[arg(short, long)]
        target: Decimal,
    },
    /// Fetch the current price of a tracked product
    Refresh {
        url: String,
    },
    /// List tracked products
    List,
    /// Show the price history of a product, oldest first
    History {
        url: String,
    },
    /// Refresh all products periodically until interrupted
    Watch {
        /// Override POLL_INTERVAL_SECS
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("price_tracker={},sqlx=warn", config.log_level).into()
    });

    if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_observation(observation: &Observation) {
    println!(
        "{}  {}",
        observation.observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        observation.price
    );
}

fn print_tracked(tracked: &TrackedProduct) {
    println!("Tracking: {}", tracked.product.name);
    println!("  URL:           {}", tracked.product.url);
    println!("  Current price: {:.2}", tracked.observation.price);
    println!("  Target price:  {:.2}", tracked.product.target_price);
}

fn print_check(check: &PriceCheck) {
    println!("{}", check.product.name);
    println!("  Current price: {:.2}", check.observation.price);
    println!("  Target price:  {:.2}", check.product.target_price);
    if check.target_reached {
        println!("  Target reached!");
    }
}

async fn run(cli: Cli, config: AppConfig) -> AppResult<()> {
    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to open database: {}", e);
        AppError::Storage(e)
    })?;
    run_migrations(&pool, None).await?;
    info!("Database ready at {}", config.database.url);

    let fetcher = Arc::new(BrowserFetcher::new(config.scraper.clone()));
    let state = AppState::new(pool, fetcher);

    match cli.command {
        Commands::Add { url, target } => {
            let tracked = state.monitor.add_product(&url, target).await?;
            print_tracked(&tracked);
        }
        Commands::Refresh { url } => {
            let check = state.monitor.refresh_product(&url).await?;
            print_check(&check);
        }
        Commands::List => {
            let products = state.monitor.list_products().await?;
            if products.is_empty() {
                println!("No products are being tracked. Add one with `price-tracker add`.");
            }
            for product in products {
                println!("{}", product.name);
                println!("  URL:          {}", product.url);
                println!("  Target price: {:.2}", product.target_price);
            }
        }
        Commands::History { url } => {
            let history = state.monitor.history(&url).await?;
            if history.is_empty() {
                println!("No price history for {}", url);
            }
            history.iter().for_each(print_observation);
        }
        Commands::Watch { interval_secs } => {
            let mut poller = RefreshPoller::new(state.monitor.clone(), &config.poller);
            if let Some(secs) = interval_secs.filter(|s| *s > 0) {
                poller = poller.with_poll_interval(Duration::from_secs(secs));
            }

            info!("Press Ctrl+C to stop watching");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping");
                }
                _ = poller.start() => {
                    error!("Refresh poller exited unexpectedly");
                }
            }
        }
    }

    state.database.close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables first
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let err = AppError::Config(e);
            eprintln!("{}", err.user_message());
            std::process::exit(err.exit_code());
        }
    };

    init_tracing(&config);
    info!("Price tracker v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli, config).await {
        error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(e.exit_code());
    }
}
