use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

pub mod metric_table;
pub use metric_table::{CompanyMetrics, MetricTable};

/// Placeholder written for any field the data source did not provide
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Accepts an integer, a float, `null` or a placeholder string such as "N/A".
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

/// One stock in the bookkeeping store, keyed by its full ticker (suffix included)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub ticker: String,
    #[serde(default = "not_available")]
    pub name: String,
    #[serde(default = "not_available")]
    pub sector: String,
    #[serde(default = "not_available")]
    pub industry: String,
    #[serde(default = "not_available")]
    pub country: String,
    #[serde(rename = "marketCap", default, deserialize_with = "lenient_integer")]
    pub market_cap: Option<i64>,
    #[serde(default = "not_available")]
    pub currency: String,
}

/// Company reference used to attach a ticker and industry to a workbook.
///
/// Accepts both the bookkeeping store layout (`name`, `industry`) and the
/// older hand-written lists (`nom`, `industrie`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRef {
    #[serde(alias = "nom")]
    pub name: String,
    #[serde(default = "not_available")]
    pub ticker: String,
    #[serde(default = "not_available", alias = "industrie")]
    pub industry: String,
    #[serde(default, alias = "secteur", skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, alias = "pays", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl CompanyRef {
    pub fn new(name: &str, ticker: &str, industry: &str) -> Self {
        Self {
            name: name.to_string(),
            ticker: ticker.to_string(),
            industry: industry.to_string(),
            sector: None,
            country: None,
        }
    }
}

impl From<&StockRecord> for CompanyRef {
    fn from(record: &StockRecord) -> Self {
        Self {
            name: record.name.clone(),
            ticker: record.ticker.clone(),
            industry: record.industry.clone(),
            sector: Some(record.sector.clone()),
            country: Some(record.country.clone()),
        }
    }
}

/// A single spreadsheet cell after coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Year header -> value, in spreadsheet column order
pub type YearValues = IndexMap<String, MetricValue>;

/// Current market data for a ticker, filled by the quote refresher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub price: Option<f64>,
    pub currency: String,
    pub market_cap: Option<i64>,
    pub shares_outstanding: Option<i64>,
    pub fetched_at: DateTime<Utc>,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub markets_file: PathBuf,
    pub stocks_file: PathBuf,
    pub companies_file: PathBuf,
    pub workbook_dir: PathBuf,
    pub output_dir: PathBuf,
    pub market_data_base_url: String,
    pub market_data_cookie_url: String,
    pub request_timeout_secs: u64,
    pub rate_limit_per_minute: u32,
    pub target_return_pct: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let data_dir = PathBuf::from(
            std::env::var("PORTFOLIO_DATA_DIR").unwrap_or_else(|_| "json_finance".to_string()),
        );
        let markets_file = std::env::var("PORTFOLIO_MARKETS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("suffixe.json"));
        let stocks_file = std::env::var("PORTFOLIO_STOCKS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("name_action.json"));
        let companies_file = std::env::var("PORTFOLIO_COMPANIES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| stocks_file.clone());

        let target_return_pct: f64 = std::env::var("TARGET_RETURN_PCT")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15.0);
        if target_return_pct <= -100.0 {
            return Err(anyhow::anyhow!(
                "TARGET_RETURN_PCT must be greater than -100, got {}",
                target_return_pct
            ));
        }

        Ok(Config {
            data_dir,
            markets_file,
            stocks_file,
            companies_file,
            workbook_dir: PathBuf::from(
                std::env::var("PORTFOLIO_WORKBOOK_DIR")
                    .unwrap_or_else(|_| "base_de_donnee".to_string()),
            ),
            output_dir: PathBuf::from(
                std::env::var("PORTFOLIO_OUTPUT_DIR").unwrap_or_else(|_| "output".to_string()),
            ),
            market_data_base_url: std::env::var("MARKET_DATA_BASE_URL")
                .unwrap_or_else(|_| "https://query2.finance.yahoo.com".to_string()),
            market_data_cookie_url: std::env::var("MARKET_DATA_COOKIE_URL")
                .unwrap_or_else(|_| "https://fc.yahoo.com".to_string()),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            target_return_pct,
        })
    }
}
