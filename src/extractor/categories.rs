use serde::{Deserialize, Serialize};

pub const METRIC_EPS: &str = "BPA de base normalisé";
pub const METRIC_PER: &str = "PER";
pub const METRIC_FCFE: &str = "Flux de trésorerie libre pour les actionnaires FCFE";
pub const METRIC_FCF_YIELD: &str = "FCF Yield";

const INCOME_STATEMENT_METRICS: &[&str] = &[
    "Total Chiffre d'affaires",
    "coût des marchandises vendues, total",
    "Résultat Brut",
    "Résultat d'Exploitation",
    "Intérêts payés, total",
    "Charges d'intérêt nettes",
    "Résultat net",
    METRIC_EPS,
    "Dividende par action",
    "EBITDA",
    "Taux d'imposition effectif (%)",
];

const BALANCE_SHEET_METRICS: &[&str] = &[
    "Total des capitaux propres",
    "Total de la dette",
    "Dette nette",
];

const CASH_FLOW_METRICS: &[&str] = &[
    "Flux de trésorerie d'exploitation",
    "Dépenses d'investissement du capital (CAPEX)",
    "Flux de trésorerie d'investissement",
    "Flux de trésorerie de financement",
    METRIC_FCFE,
];

const VALUATION_METRICS: &[&str] = &[METRIC_PER, "Valeur entreprise / EBITDA", METRIC_FCF_YIELD];

/// The four financial statement groupings a workbook is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetCategory {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    Valuation,
}

impl SheetCategory {
    pub const ALL: [SheetCategory; 4] = [
        SheetCategory::IncomeStatement,
        SheetCategory::BalanceSheet,
        SheetCategory::CashFlow,
        SheetCategory::Valuation,
    ];

    /// Accepted sheet names, highest priority first
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            SheetCategory::IncomeStatement => {
                &["Compte de résultat", "Compte de resultat", "Income Statement", "P&L"]
            }
            SheetCategory::BalanceSheet => &["Bilan", "Balance Sheet"],
            SheetCategory::CashFlow => &["Flux de trésorerie", "Flux de tresorerie", "Cash Flow"],
            SheetCategory::Valuation => &["Valorisation", "Valuation", "Valorisations"],
        }
    }

    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            SheetCategory::IncomeStatement => INCOME_STATEMENT_METRICS,
            SheetCategory::BalanceSheet => BALANCE_SHEET_METRICS,
            SheetCategory::CashFlow => CASH_FLOW_METRICS,
            SheetCategory::Valuation => VALUATION_METRICS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SheetCategory::IncomeStatement => "income statement",
            SheetCategory::BalanceSheet => "balance sheet",
            SheetCategory::CashFlow => "cash flow",
            SheetCategory::Valuation => "valuation",
        }
    }
}

/// Every target metric, in category order
pub fn all_metric_labels() -> Vec<&'static str> {
    SheetCategory::ALL
        .iter()
        .flat_map(|category| category.metrics().iter().copied())
        .collect()
}
