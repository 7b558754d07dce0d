//! Fair-value estimates from the exported metric history.
//!
//! Two methods are computed per company:
//!
//! * EPS: median yearly EPS growth projects next year's EPS, which is then
//!   priced at the median historical PER.
//! * FCF: free cash flow to equity per share, projected the same way and
//!   priced at the median historical FCF yield.
//!
//! The buy price applies the target return as a margin on the fair price.

use serde::Serialize;
use tracing::{debug, info};

use crate::extractor::categories::{METRIC_EPS, METRIC_FCFE, METRIC_FCF_YIELD, METRIC_PER};
use crate::models::{CompanyMetrics, MetricTable};

pub const DEFAULT_TARGET_RETURN_PCT: f64 = 15.0;
pub const MIN_GROWTH_POINTS: usize = 3;
pub const MIN_MULTIPLE_POINTS: usize = 3;
const MAX_SANE_PER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    Eps,
    FreeCashFlow,
}

impl ValuationMethod {
    pub fn label(self) -> &'static str {
        match self {
            ValuationMethod::Eps => "EPS method",
            ValuationMethod::FreeCashFlow => "FCF method",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairValueEstimate {
    pub method: ValuationMethod,
    pub last_year: i32,
    pub last_value: f64,
    pub median_growth_pct: f64,
    pub projected_value: f64,
    /// Median PER for the EPS method, median FCF yield (%) for the FCF method
    pub median_multiple: f64,
    pub fair_price: f64,
    pub buy_price: f64,
    pub current_price: Option<f64>,
    pub target_return_pct: f64,
}

impl FairValueEstimate {
    /// Discount of the current price against the buy price, in percent
    pub fn upside_to_buy_pct(&self) -> Option<f64> {
        let current = self.current_price.filter(|p| *p > 0.0)?;
        Some(round_to((self.buy_price / current - 1.0) * 100.0, 2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyValuation {
    pub name: String,
    pub ticker: String,
    pub eps: Option<FairValueEstimate>,
    pub fcf: Option<FairValueEstimate>,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Median of the values; `None` when empty
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Year-over-year growth rates of an ascending series.
///
/// Only adjacent calendar years count, the previous value must be positive
/// and the current one non-zero.
pub fn growth_rates(series: &[(i32, f64)]) -> Vec<f64> {
    series
        .windows(2)
        .filter_map(|pair| {
            let (prev_year, prev) = pair[0];
            let (year, current) = pair[1];
            (year == prev_year + 1 && prev > 0.0 && current != 0.0).then(|| current / prev - 1.0)
        })
        .collect()
}

fn buy_price(fair_price: f64, target_return_pct: f64) -> f64 {
    fair_price / (1.0 + target_return_pct / 100.0)
}

fn current_price(company: &CompanyMetrics) -> Option<f64> {
    company.current.as_ref().and_then(|quote| quote.price)
}

/// Projects the last value of a series with its median growth
fn project(series: &[(i32, f64)]) -> Option<(i32, f64, f64, f64)> {
    let growth = growth_rates(series);
    if growth.len() < MIN_GROWTH_POINTS {
        return None;
    }
    let median_growth = median(&growth)?;
    let &(last_year, last_value) = series.last()?;
    if last_value == 0.0 {
        return None;
    }
    Some((last_year, last_value, median_growth, last_value * (1.0 + median_growth)))
}

pub fn eps_fair_value(company: &CompanyMetrics, target_return_pct: f64) -> Option<FairValueEstimate> {
    let eps = company.yearly_series(METRIC_EPS);
    let Some((last_year, last_value, median_growth, projected)) = project(&eps) else {
        debug!("{}: not enough EPS history", company.name);
        return None;
    };

    let per_values: Vec<f64> = company
        .yearly_series(METRIC_PER)
        .into_iter()
        .map(|(_, per)| per)
        .filter(|per| *per > 0.0 && *per < MAX_SANE_PER)
        .collect();
    if per_values.len() < MIN_MULTIPLE_POINTS {
        debug!("{}: not enough PER history", company.name);
        return None;
    }
    let median_per = median(&per_values)?;

    let fair_price = projected * median_per;
    Some(FairValueEstimate {
        method: ValuationMethod::Eps,
        last_year,
        last_value: round_to(last_value, 2),
        median_growth_pct: round_to(median_growth * 100.0, 2),
        projected_value: round_to(projected, 2),
        median_multiple: round_to(median_per, 1),
        fair_price: round_to(fair_price, 2),
        buy_price: round_to(buy_price(fair_price, target_return_pct), 2),
        current_price: current_price(company),
        target_return_pct,
    })
}

pub fn fcf_fair_value(company: &CompanyMetrics, target_return_pct: f64) -> Option<FairValueEstimate> {
    let shares = company
        .current
        .as_ref()
        .and_then(|quote| quote.shares_outstanding)
        .filter(|shares| *shares > 0)?;

    let per_share: Vec<(i32, f64)> = company
        .yearly_series(METRIC_FCFE)
        .into_iter()
        .filter(|(_, fcfe)| *fcfe != 0.0)
        .map(|(year, fcfe)| (year, fcfe / shares as f64))
        .collect();
    if per_share.len() < 2 {
        debug!("{}: not enough FCFE history", company.name);
        return None;
    }
    let (last_year, last_value, median_growth, projected) = project(&per_share)?;

    let yields: Vec<f64> = company
        .yearly_series(METRIC_FCF_YIELD)
        .into_iter()
        .map(|(_, y)| y)
        .filter(|y| *y > 0.0)
        .collect();
    if yields.len() < MIN_MULTIPLE_POINTS {
        debug!("{}: not enough FCF yield history", company.name);
        return None;
    }
    let median_yield = median(&yields)?;

    let fair_price = projected / (median_yield / 100.0);
    Some(FairValueEstimate {
        method: ValuationMethod::FreeCashFlow,
        last_year,
        last_value: round_to(last_value, 2),
        median_growth_pct: round_to(median_growth * 100.0, 2),
        projected_value: round_to(projected, 2),
        median_multiple: round_to(median_yield, 2),
        fair_price: round_to(fair_price, 2),
        buy_price: round_to(buy_price(fair_price, target_return_pct), 2),
        current_price: current_price(company),
        target_return_pct,
    })
}

pub fn value_company(company: &CompanyMetrics, target_return_pct: f64) -> CompanyValuation {
    CompanyValuation {
        name: company.name.clone(),
        ticker: company.ticker.clone(),
        eps: eps_fair_value(company, target_return_pct),
        fcf: fcf_fair_value(company, target_return_pct),
    }
}

/// Values every company of the table
pub fn value_table(table: &MetricTable, target_return_pct: f64) -> Vec<CompanyValuation> {
    let valuations: Vec<CompanyValuation> = table
        .companies()
        .map(|company| value_company(company, target_return_pct))
        .collect();
    let priced = valuations
        .iter()
        .filter(|v| v.eps.is_some() || v.fcf.is_some())
        .count();
    info!("💰 Fair value computed for {}/{} companies", priced, valuations.len());
    valuations
}
