use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use portfolio_tools::fair_value::{value_table, FairValueEstimate};
use portfolio_tools::models::{Config, MetricTable};
use portfolio_tools::report::JSON_FILE;
use portfolio_tools::utils::init_tracing;

const FAIR_VALUE_FILE: &str = "fair_value.json";

#[derive(Parser, Debug)]
#[command(name = "fair-value")]
#[command(about = "Compute EPS and FCF based fair prices from metrics.json")]
struct Args {
    /// Metrics file (defaults to <output dir>/metrics.json)
    #[arg(short, long)]
    metrics: Option<PathBuf>,

    /// Required return in percent, applied as a margin on the fair price
    #[arg(short, long)]
    target_return: Option<f64>,

    /// Where to write the results (defaults to <output dir>/fair_value.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn print_estimate(estimate: &FairValueEstimate) {
    println!("  📊 {}", estimate.method.label());
    println!("     Last value ({}):   {}", estimate.last_year, estimate.last_value);
    println!("     Median growth:      {}%", estimate.median_growth_pct);
    println!("     Projected value:    {}", estimate.projected_value);
    println!("     Median multiple:    {}", estimate.median_multiple);
    println!("     Fair price:         {}", estimate.fair_price);
    println!("     Buy price:          {}", estimate.buy_price);
    if let Some(price) = estimate.current_price {
        println!("     Current price:      {}", price);
    }
    if let Some(upside) = estimate.upside_to_buy_pct() {
        println!("     Buy vs current:     {:+}%", upside);
    }
}

fn main() -> Result<()> {
    init_tracing("portfolio_tools=info")?;

    let args = Args::parse();
    let config = Config::from_env()?;

    let metrics_file = args.metrics.unwrap_or_else(|| config.output_dir.join(JSON_FILE));
    let output_file = args.output.unwrap_or_else(|| config.output_dir.join(FAIR_VALUE_FILE));
    let target_return = args.target_return.unwrap_or(config.target_return_pct);
    if target_return <= -100.0 {
        anyhow::bail!("target return must be greater than -100, got {}", target_return);
    }

    let table = MetricTable::load(&metrics_file)?;
    let valuations = value_table(&table, target_return);

    for valuation in &valuations {
        println!("\n{}", "=".repeat(70));
        println!("{} ({})", valuation.name, valuation.ticker);
        println!("{}", "=".repeat(70));
        match (&valuation.eps, &valuation.fcf) {
            (None, None) => println!("  ⚠️  Not enough history for either method"),
            (eps, fcf) => {
                if let Some(estimate) = eps {
                    print_estimate(estimate);
                }
                if let Some(estimate) = fcf {
                    print_estimate(estimate);
                }
            }
        }
    }

    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output_file, serde_json::to_string_pretty(&valuations)?)?;
    println!("\n📁 Saved: {}", output_file.display());

    Ok(())
}
