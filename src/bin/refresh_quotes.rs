use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use portfolio_tools::api::YahooClient;
use portfolio_tools::models::{Config, MetricTable};
use portfolio_tools::refresh::refresh_quotes;
use portfolio_tools::report::JSON_FILE;
use portfolio_tools::utils::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "refresh-quotes")]
#[command(about = "Refresh current price, market cap and shares outstanding in metrics.json")]
struct Args {
    /// Metrics file to update (defaults to <output dir>/metrics.json)
    #[arg(short, long)]
    metrics: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("portfolio_tools=info")?;

    let args = Args::parse();
    let config = Config::from_env()?;
    let metrics_file = args.metrics.unwrap_or_else(|| config.output_dir.join(JSON_FILE));

    println!("🔄 Refreshing quotes in {}", metrics_file.display());

    let mut table = MetricTable::load(&metrics_file)?;
    let client = YahooClient::new(&config)?;

    let summary = refresh_quotes(&mut table, &client).await;
    table.save(&metrics_file)?;

    println!("\n✅ Successes: {}", summary.succeeded);
    println!("❌ Errors:    {}", summary.failed);
    println!("📁 Saved: {}", metrics_file.display());

    Ok(())
}
