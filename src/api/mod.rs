use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::errors::Result;
use crate::models::{QuoteSnapshot, StockRecord};

pub mod yahoo_client;
pub use yahoo_client::YahooClient;

/// Simple rate limiter for API requests: enforces a minimum gap between calls
pub struct ApiRateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl ApiRateLimiter {
    /// `0` disables the limiter
    pub fn new(requests_per_minute: u32) -> Self {
        let delay_ms = if requests_per_minute > 0 {
            60_000 / requests_per_minute as u64
        } else {
            0
        };

        Self {
            delay: Duration::from_millis(delay_ms),
            last_request: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Market-data lookups used by the bookkeeping CLI and the quote refresher.
///
/// `Ok(None)` means the ticker is unknown to the provider; `Err` is a
/// transport or decoding failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StockInfoProvider: Send + Sync {
    async fn fetch_stock_info(&self, ticker: &str) -> Result<Option<StockRecord>>;
    async fn fetch_quote(&self, ticker: &str) -> Result<Option<QuoteSnapshot>>;
}

/// Looks up a ticker, logging failures and turning them into "no result"
pub async fn lookup_stock(provider: &dyn StockInfoProvider, ticker: &str) -> Option<StockRecord> {
    match provider.fetch_stock_info(ticker).await {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            warn!("No information found for {}", ticker);
            None
        }
        Err(e) => {
            error!("Lookup of {} failed: {}", ticker, e);
            None
        }
    }
}

/// Same policy as [`lookup_stock`] for current quotes
pub async fn lookup_quote(provider: &dyn StockInfoProvider, ticker: &str) -> Option<QuoteSnapshot> {
    match provider.fetch_quote(ticker).await {
        Ok(Some(quote)) => Some(quote),
        Ok(None) => {
            warn!("No quote found for {}", ticker);
            None
        }
        Err(e) => {
            error!("Quote lookup of {} failed: {}", ticker, e);
            None
        }
    }
}
