use chrono::Utc;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::{ApiRateLimiter, StockInfoProvider};
use crate::errors::{PortfolioError, Result};
use crate::models::{Config, QuoteSnapshot, StockRecord, NOT_AVAILABLE};

const SUMMARY_MODULES: &str = "price,assetProfile,defaultKeyStatistics,financialData";

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
    #[serde(default)]
    financial_data: Option<FinancialData>,
}

/// Yahoo wraps numbers as `{"raw": 123.4, "fmt": "123.40"}`, or `{}` when unknown
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    currency: Option<String>,
    #[serde(default)]
    market_cap: Option<RawValue>,
    #[serde(default)]
    regular_market_price: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    shares_outstanding: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    current_price: Option<RawValue>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

fn text_or_na(value: Option<String>) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Session cookie and the crumb Yahoo issued for it
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

/// Yahoo Finance quote-summary client
pub struct YahooClient {
    client: Client,
    base_url: Url,
    cookie_url: Url,
    rate_limiter: ApiRateLimiter,
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_urls(
            &config.market_data_base_url,
            &config.market_data_cookie_url,
            config.request_timeout_secs,
            config.rate_limit_per_minute,
        )
    }

    /// Client whose session cookie also comes from `base_url`
    pub fn with_base_url(base_url: &str, timeout_secs: u64, rate_limit_per_minute: u32) -> Result<Self> {
        Self::with_urls(base_url, base_url, timeout_secs, rate_limit_per_minute)
    }

    pub fn with_urls(
        base_url: &str,
        cookie_url: &str,
        timeout_secs: u64,
        rate_limit_per_minute: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; portfolio-tools/0.1)")
            .build()
            .map_err(|e| PortfolioError::lookup("<client>", e))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| PortfolioError::malformed("MARKET_DATA_BASE_URL", e))?;
        let cookie_url = Url::parse(cookie_url)
            .map_err(|e| PortfolioError::malformed("MARKET_DATA_COOKIE_URL", e))?;

        Ok(Self {
            client,
            base_url,
            cookie_url,
            rate_limiter: ApiRateLimiter::new(rate_limit_per_minute),
            crumb: RwLock::new(None),
        })
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PortfolioError::malformed("MARKET_DATA_BASE_URL", "URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn summary_url(&self, ticker: &str, crumb: &str) -> Result<Url> {
        let mut url = self.api_url(&["v10", "finance", "quoteSummary", ticker])?;
        url.query_pairs_mut()
            .append_pair("modules", SUMMARY_MODULES)
            .append_pair("crumb", crumb);
        Ok(url)
    }

    /// Returns the cached crumb, fetching one on first use
    async fn ensure_crumb(&self, ticker: &str) -> Result<CrumbData> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }
        self.fetch_crumb(ticker).await
    }

    /// Gets a session cookie, then trades it for a crumb
    async fn fetch_crumb(&self, ticker: &str) -> Result<CrumbData> {
        debug!("Fetching Yahoo session cookie from {}", self.cookie_url);
        let response = self
            .client
            .get(self.cookie_url.clone())
            .send()
            .await
            .map_err(|e| PortfolioError::lookup(ticker, format!("failed to get cookie: {}", e)))?;

        // The cookie page itself usually answers 404; only its Set-Cookie matters
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .map(|s| s.split_once(';').map_or(s, |(value, _)| value).trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        if cookie.is_empty() {
            return Err(PortfolioError::lookup(ticker, "no Yahoo session cookie was set"));
        }

        let response = self
            .client
            .get(self.api_url(&["v1", "test", "getcrumb"])?)
            .header(COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| PortfolioError::lookup(ticker, format!("failed to get crumb: {}", e)))?;
        let status = response.status();
        let crumb = response
            .text()
            .await
            .map_err(|e| PortfolioError::lookup(ticker, format!("failed to read crumb: {}", e)))?
            .trim()
            .to_string();
        if !status.is_success() || crumb.is_empty() {
            return Err(PortfolioError::lookup(ticker, format!("crumb request failed with HTTP {}", status)));
        }

        let crumb_data = CrumbData { cookie, crumb };
        *self.crumb.write().await = Some(crumb_data.clone());
        Ok(crumb_data)
    }

    async fn clear_crumb(&self) {
        *self.crumb.write().await = None;
    }

    async fn send_summary_request(&self, ticker: &str) -> Result<Response> {
        let crumb = self.ensure_crumb(ticker).await?;
        let url = self.summary_url(ticker, &crumb.crumb)?;
        debug!("GET {}", url);

        self.rate_limiter.wait().await;
        self.client
            .get(url)
            .header(COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| PortfolioError::lookup(ticker, e))
    }

    /// Fetches the quote summary; `None` when Yahoo does not know the ticker
    async fn fetch_summary(&self, ticker: &str) -> Result<Option<QuoteSummaryResult>> {
        let mut response = self.send_summary_request(ticker).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Yahoo rejected the crumb for {}, fetching a new one", ticker);
            self.clear_crumb().await;
            response = self.send_summary_request(ticker).await?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortfolioError::lookup(ticker, format!("HTTP {}: {}", status, body)));
        }

        let envelope: QuoteSummaryEnvelope = response
            .json()
            .await
            .map_err(|e| PortfolioError::lookup(ticker, e))?;

        if let Some(err) = envelope.quote_summary.error {
            warn!(
                "Yahoo returned an error for {}: {} {}",
                ticker,
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            );
            return Ok(None);
        }

        Ok(envelope
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next()))
    }
}

#[async_trait::async_trait]
impl StockInfoProvider for YahooClient {
    async fn fetch_stock_info(&self, ticker: &str) -> Result<Option<StockRecord>> {
        info!("Looking up {}...", ticker);
        let Some(summary) = self.fetch_summary(ticker).await? else {
            return Ok(None);
        };

        let price = summary.price.unwrap_or_default();
        let Some(name) = price.long_name.filter(|n| !n.trim().is_empty()) else {
            return Ok(None);
        };
        let profile = summary.asset_profile.unwrap_or_default();

        Ok(Some(StockRecord {
            ticker: ticker.to_uppercase(),
            name,
            sector: text_or_na(profile.sector),
            industry: text_or_na(profile.industry),
            country: text_or_na(profile.country),
            market_cap: raw(&price.market_cap).map(|cap| cap as i64),
            currency: text_or_na(price.currency),
        }))
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<Option<QuoteSnapshot>> {
        let Some(summary) = self.fetch_summary(ticker).await? else {
            return Ok(None);
        };

        let price_module = summary.price.unwrap_or_default();
        let financial = summary.financial_data.unwrap_or_default();
        let Some(price) = raw(&financial.current_price).or_else(|| raw(&price_module.regular_market_price)) else {
            return Ok(None);
        };
        let statistics = summary.default_key_statistics.unwrap_or_default();

        Ok(Some(QuoteSnapshot {
            price: Some(price),
            currency: text_or_na(price_module.currency),
            market_cap: raw(&price_module.market_cap).map(|cap| cap as i64),
            shares_outstanding: raw(&statistics.shares_outstanding).map(|shares| shares as i64),
            fetched_at: Utc::now(),
        }))
    }
}
