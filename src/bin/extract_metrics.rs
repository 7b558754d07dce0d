use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use portfolio_tools::extractor::{load_company_refs, MetricExtractor};
use portfolio_tools::models::{Config, MetricTable};
use portfolio_tools::report::{ReportWriter, JSON_FILE};
use portfolio_tools::utils::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "extract-metrics")]
#[command(about = "Extract financial metrics from company workbooks into JSON, CSV and Excel")]
struct Args {
    /// Directory containing the company workbooks
    #[arg(short, long)]
    workbooks: Option<PathBuf>,

    /// Company reference file (name, ticker, industry)
    #[arg(short, long)]
    companies: Option<PathBuf>,

    /// Output directory for the exports
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Merge into the existing metrics.json instead of starting from scratch
    #[arg(long)]
    merge_existing: bool,
}

fn main() -> Result<()> {
    init_tracing("portfolio_tools=info")?;

    let args = Args::parse();
    let config = Config::from_env()?;

    let workbook_dir = args.workbooks.unwrap_or(config.workbook_dir);
    let companies_file = args.companies.unwrap_or(config.companies_file);
    let output_dir = args.output.unwrap_or(config.output_dir);

    println!("📊 Financial metric extraction");
    println!("📂 Workbooks: {}", workbook_dir.display());
    println!("🏢 Companies: {}", companies_file.display());

    let companies = load_company_refs(&companies_file)?;
    info!("🏢 {} company reference(s) loaded", companies.len());

    let mut table = MetricTable::new();
    if args.merge_existing {
        let existing = output_dir.join(JSON_FILE);
        if existing.exists() {
            table = MetricTable::load(&existing)?;
        } else {
            warn!("⚠️  {} does not exist yet, starting empty", existing.display());
        }
    }

    let extractor = MetricExtractor::new(companies);
    let summary = extractor.extract_directory(&workbook_dir, &mut table)?;

    let writer = ReportWriter::new(&output_dir)?;
    let paths = writer.write_all(&table, &summary)?;

    println!("\n✅ Extraction complete");
    println!("   Files processed: {}/{}", summary.processed.len(), summary.files_found);
    if !summary.skipped.is_empty() {
        println!("   Files skipped:   {}", summary.skipped.len());
    }
    println!("   Companies:       {}", table.len());
    println!("📁 JSON:   {}", paths.json.display());
    println!("📁 CSV:    {}", paths.csv.display());
    println!("📁 Excel:  {}", paths.excel.display());
    println!("📁 Report: {}", paths.report.display());

    Ok(())
}
