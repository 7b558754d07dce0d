use tracing::{error, info};

use crate::api::{lookup_quote, StockInfoProvider};
use crate::models::MetricTable;

/// Outcome of a quote refresh run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Fetches the current quote of every company in the table, one request at a time.
///
/// Companies without a usable ticker and failed lookups are counted as
/// failures; their previous snapshot, if any, is left untouched.
pub async fn refresh_quotes(table: &mut MetricTable, provider: &dyn StockInfoProvider) -> RefreshSummary {
    let mut summary = RefreshSummary::default();
    let total = table.len();

    for (idx, company) in table.companies_mut().enumerate() {
        if !company.has_ticker() {
            error!("❌ {}: no ticker", company.name);
            summary.failed += 1;
            continue;
        }

        info!("🔄 [{}/{}] {} ({})", idx + 1, total, company.name, company.ticker);
        match lookup_quote(provider, &company.ticker).await {
            Some(quote) => {
                info!(
                    "✅ {}: {} {}",
                    company.ticker,
                    quote.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "N/A".to_string()),
                    quote.currency
                );
                company.current = Some(quote);
                summary.succeeded += 1;
            }
            None => summary.failed += 1,
        }
    }

    info!(
        "📊 Quote refresh done: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    summary
}
