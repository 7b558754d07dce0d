//! Yahoo client against a local mock server

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::logging;
use portfolio_tools::api::{lookup_stock, StockInfoProvider, YahooClient};
use portfolio_tools::PortfolioError;

const MODULES: &str = "price,assetProfile,defaultKeyStatistics,financialData";
const COOKIE: &str = "A3=d=abc";
const CRUMB: &str = "Xy7.crumb";

/// Cookie page plus crumb endpoint, the way Yahoo hands out a session
async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404).insert_header("set-cookie", "A3=d=abc; Domain=.yahoo.com; Path=/"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/test/getcrumb"))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_string(CRUMB))
        .mount(server)
        .await;
}

fn lvmh_summary() -> serde_json::Value {
    json!({
        "quoteSummary": {
            "result": [{
                "price": {
                    "longName": "LVMH Moët Hennessy - Louis Vuitton, Société Européenne",
                    "currency": "EUR",
                    "marketCap": {"raw": 350123456789.0, "fmt": "350.12B"},
                    "regularMarketPrice": {"raw": 701.2, "fmt": "701.20"}
                },
                "assetProfile": {
                    "sector": "Consumer Cyclical",
                    "industry": "Luxury Goods",
                    "country": "France"
                },
                "defaultKeyStatistics": {
                    "sharesOutstanding": {"raw": 499000000.0}
                },
                "financialData": {
                    "currentPrice": {"raw": 700.5}
                }
            }],
            "error": null
        }
    })
}

async fn client_for(server: &MockServer) -> YahooClient {
    YahooClient::with_base_url(&server.uri(), 5, 0).unwrap()
}

#[tokio::test]
async fn test_stock_info_is_mapped_from_quote_summary() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .and(query_param("modules", MODULES))
        .and(query_param("crumb", CRUMB))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(lvmh_summary()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let record = client.fetch_stock_info("MC.PA").await.unwrap().unwrap();
    assert_eq!(record.ticker, "MC.PA");
    assert_eq!(record.name, "LVMH Moët Hennessy - Louis Vuitton, Société Européenne");
    assert_eq!(record.industry, "Luxury Goods");
    assert_eq!(record.country, "France");
    assert_eq!(record.market_cap, Some(350_123_456_789));
    assert_eq!(record.currency, "EUR");
}

#[tokio::test]
async fn test_quote_prefers_financial_data_price() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lvmh_summary()))
        .mount(&server)
        .await;

    let quote = client_for(&server).await.fetch_quote("MC.PA").await.unwrap().unwrap();
    assert_eq!(quote.price, Some(700.5));
    assert_eq!(quote.shares_outstanding, Some(499_000_000));
    assert_eq!(quote.market_cap, Some(350_123_456_789));
}

#[tokio::test]
async fn test_unknown_ticker_is_none() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/NOPE.PA"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for ticker symbol: NOPE.PA"}
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.fetch_stock_info("NOPE.PA").await.unwrap(), None);
    assert!(lookup_stock(&client, "NOPE.PA").await.is_none());
}

#[tokio::test]
async fn test_error_object_with_ok_status_is_none() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quoteSummary": {"result": null, "error": {"code": "Not Found", "description": "no data"}}
        })))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).await.fetch_quote("XYZ").await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_is_lookup_error() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let result = client_for(&server).await.fetch_stock_info("MC.PA").await;
    assert_matches!(result, Err(PortfolioError::Lookup { ref ticker, .. }) if ticker == "MC.PA");
}

#[tokio::test]
async fn test_summary_requires_crumb_and_cookie() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    // First mounted mock wins, so the authorised route goes before the 401 fallback
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .and(query_param("crumb", CRUMB))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(lvmh_summary()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "finance": {"result": null, "error": {"code": "Unauthorized", "description": "Invalid Crumb"}}
        })))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let record = client.fetch_stock_info("MC.PA").await.unwrap().unwrap();
    assert_eq!(record.currency, "EUR");
    // The second lookup reuses the cached crumb
    let quote = client.fetch_quote("MC.PA").await.unwrap().unwrap();
    assert_eq!(quote.price, Some(700.5));
}

#[tokio::test]
async fn test_rejected_crumb_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404).insert_header("set-cookie", "A3=d=abc; Domain=.yahoo.com"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/test/getcrumb"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stale"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/test/getcrumb"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .and(query_param("crumb", "fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lvmh_summary()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let quote = client_for(&server).await.fetch_quote("MC.PA").await.unwrap().unwrap();
    assert_eq!(quote.price, Some(700.5));
}

#[tokio::test]
async fn test_repeated_unauthorized_is_lookup_error() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Crumb"))
        .expect(2)
        .mount(&server)
        .await;

    let result = client_for(&server).await.fetch_stock_info("MC.PA").await;
    assert_matches!(result, Err(PortfolioError::Lookup { ref reason, .. }) if reason.contains("401"));
}

#[tokio::test]
async fn test_missing_session_cookie_is_lookup_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/MC.PA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lvmh_summary()))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server).await.fetch_stock_info("MC.PA").await;
    assert_matches!(result, Err(PortfolioError::Lookup { ref ticker, .. }) if ticker == "MC.PA");
}
