//! metrics.json -> quote refresh -> fair value

use chrono::Utc;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::common::{logging, StubProvider};
use portfolio_tools::extractor::categories::{METRIC_EPS, METRIC_FCFE, METRIC_FCF_YIELD, METRIC_PER};
use portfolio_tools::fair_value::value_table;
use portfolio_tools::models::{CompanyRef, MetricTable, MetricValue, QuoteSnapshot, YearValues, NOT_AVAILABLE};
use portfolio_tools::refresh::{refresh_quotes, RefreshSummary};

fn years(pairs: &[(i32, f64)]) -> YearValues {
    pairs
        .iter()
        .map(|(y, v)| (y.to_string(), MetricValue::Number(*v)))
        .collect()
}

fn seeded_table() -> MetricTable {
    let mut table = MetricTable::new();
    let danone = CompanyRef::new("Danone", "BN.PA", "Packaged Foods");
    table.merge_metric(
        &danone,
        METRIC_EPS,
        years(&[(2020, 2.0), (2021, 2.2), (2022, 2.42), (2023, 2.5), (2024, 2.75)]),
        "danone.xlsx",
    );
    table.merge_metric(
        &danone,
        METRIC_PER,
        years(&[(2020, 18.0), (2021, 20.0), (2022, 22.0), (2023, 19.0)]),
        "danone.xlsx",
    );
    table.merge_metric(
        &danone,
        METRIC_FCFE,
        years(&[(2021, 1.0e9), (2022, 1.1e9), (2023, 1.21e9), (2024, 1.331e9)]),
        "danone.xlsx",
    );
    table.merge_metric(
        &danone,
        METRIC_FCF_YIELD,
        years(&[(2022, 5.0), (2023, 6.0), (2024, 7.0)]),
        "danone.xlsx",
    );

    table.company_entry(&CompanyRef::new("Unlisted", NOT_AVAILABLE, NOT_AVAILABLE));
    table
}

#[tokio::test]
async fn test_refresh_then_value() {
    logging::init_test_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("metrics.json");
    seeded_table().save(&path).unwrap();

    let provider = StubProvider::new().with_quote(
        "BN.PA",
        QuoteSnapshot {
            price: Some(60.0),
            currency: "EUR".to_string(),
            market_cap: Some(40_000_000_000),
            shares_outstanding: Some(100_000_000),
            fetched_at: Utc::now(),
        },
    );

    let mut table = MetricTable::load(&path).unwrap();
    let summary = refresh_quotes(&mut table, &provider).await;
    assert_eq!(summary, RefreshSummary { succeeded: 1, failed: 1 });
    // The unlisted company never reaches the provider
    assert_eq!(provider.calls(), 1);
    table.save(&path).unwrap();

    let reloaded = MetricTable::load(&path).unwrap();
    let valuations = value_table(&reloaded, 15.0);
    assert_eq!(valuations.len(), 2);

    let danone = &valuations[0];
    let eps = danone.eps.as_ref().unwrap();
    assert_eq!(eps.last_year, 2024);
    assert_eq!(eps.median_multiple, 19.5);
    assert_eq!(eps.current_price, Some(60.0));

    let fcf = danone.fcf.as_ref().unwrap();
    assert_eq!(fcf.last_value, 13.31);
    assert_eq!(fcf.median_growth_pct, 10.0);
    assert_eq!(fcf.median_multiple, 6.0);

    let unlisted = &valuations[1];
    assert!(unlisted.eps.is_none() && unlisted.fcf.is_none());
}
