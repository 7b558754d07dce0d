use anyhow::Result;
use std::io;
use tracing::{error, info};

use portfolio_tools::api::YahooClient;
use portfolio_tools::cli::StockManagerCli;
use portfolio_tools::market::MarketResolver;
use portfolio_tools::models::Config;
use portfolio_tools::store::StockStore;
use portfolio_tools::utils::init_tracing;
use portfolio_tools::PortfolioError;

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the prompt readable: only warnings by default
    init_tracing("portfolio_tools=warn")?;

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    let markets = MarketResolver::new(&config.markets_file);
    match markets.markets() {
        Ok(map) => info!("📋 {} markets loaded from {}", map.len(), config.markets_file.display()),
        Err(e @ PortfolioError::ConfigMissing { .. }) => {
            eprintln!("❌ {}", e);
            eprintln!("Create it as a JSON object mapping country names to ticker suffixes.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ Could not read markets: {}", e);
            std::process::exit(1);
        }
    }

    let store = StockStore::new(&config.stocks_file)?;
    let client = YahooClient::new(&config)?;

    let stdin = io::stdin();
    let mut cli = StockManagerCli::new(&store, &markets, &client, stdin.lock(), io::stdout());
    let added = cli.run().await?;

    println!("📁 {} stock(s) added to {}", added, store.path().display());
    Ok(())
}
