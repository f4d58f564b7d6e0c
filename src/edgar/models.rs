// src/edgar/models.rs
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A normalized inline-fact value. Absence is expressed as `Option::None`
/// by the functions that produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Number(Decimal),
    Text(String),
}

impl FactValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FactValue::Number(value) => Some(*value),
            FactValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Text(text) => Some(text),
            FactValue::Number(_) => None,
        }
    }
}

// --- Financial Highlights ---

/// Per-share operating data, most recent reporting column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingData {
    pub nav_beginning: Option<Decimal>,
    pub net_investment_income: Option<Decimal>,
    pub net_realized_unrealized_gain: Option<Decimal>,
    pub total_from_operations: Option<Decimal>,
    /// Stored as reported; `None` when the issuer has no equalization row.
    pub equalization: Option<Decimal>,
    pub nav_end: Option<Decimal>,
    pub total_return: Option<Decimal>,
}

/// Per-share distributions (reported as negative amounts).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionData {
    pub dist_net_investment_income: Option<Decimal>,
    pub dist_realized_gains: Option<Decimal>,
    pub dist_return_of_capital: Option<Decimal>,
    pub dist_total: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioData {
    pub expense_ratio: Option<Decimal>,
    pub portfolio_turnover: Option<Decimal>,
    /// Net assets at period end in dollars (tables report millions).
    pub net_assets_end: Option<Decimal>,
}

/// One parsed Financial Highlights table: one fund class, one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialHighlightsRecord {
    pub operating: OperatingData,
    pub distribution: DistributionData,
    pub ratios: RatioData,
    pub fiscal_year_end: Option<NaiveDate>,
    pub math_validated: bool,
}

// --- Reconciliation ---

/// Which rule of the ordered matching strategy produced a class id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Substring,
    Ticker,
}

/// A successful reconciliation. No match is `None` at the call site and the
/// record is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub class_id: String,
    pub strategy: MatchStrategy,
}

/// A Financial Highlights record bound to a canonical class id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledHighlights {
    pub class_id: String,
    pub strategy: MatchStrategy,
    pub fund_name: Option<String>,
    pub class_label: Option<String>,
    pub record: FinancialHighlightsRecord,
}

// --- Prospectus fee schedule ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub class_id: String,
    pub series_id: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub management_fee: Option<Decimal>,
    pub distribution_12b1: Option<Decimal>,
    pub other_expenses: Option<Decimal>,
    pub acquired_fund_fees: Option<Decimal>,
    pub total_expense_gross: Option<Decimal>,
    pub fee_waiver: Option<Decimal>,
    pub total_expense_net: Option<Decimal>,
    pub max_sales_charge: Option<Decimal>,
    pub max_deferred_sales_charge: Option<Decimal>,
    pub redemption_fee: Option<Decimal>,
    pub objective_text: Option<String>,
    pub strategy_text: Option<String>,
}

impl FeeSchedule {
    /// True when at least one fee or expense figure was found.
    pub fn has_fees(&self) -> bool {
        [
            self.management_fee,
            self.distribution_12b1,
            self.other_expenses,
            self.acquired_fund_fees,
            self.total_expense_gross,
            self.fee_waiver,
            self.total_expense_net,
            self.max_sales_charge,
            self.max_deferred_sales_charge,
            self.redemption_fee,
        ]
        .iter()
        .any(Option::is_some)
    }
}

// --- Shareholder report performance ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub class_id: String,
    pub fiscal_year_end: NaiveDate,
    pub return_1yr: Option<Decimal>,
    pub return_5yr: Option<Decimal>,
    pub return_10yr: Option<Decimal>,
    pub return_since_inception: Option<Decimal>,
    pub expense_ratio: Option<Decimal>,
    pub portfolio_turnover: Option<Decimal>,
    pub benchmark_name: Option<String>,
    pub benchmark_return_1yr: Option<Decimal>,
    pub benchmark_return_5yr: Option<Decimal>,
    pub benchmark_return_10yr: Option<Decimal>,
}
