// src/extractors/performance.rs
use crate::edgar::models::PerformanceRecord;
use crate::xbrl::context::{Context, ContextPeriod};
use crate::xbrl::document::InlineDocument;
use crate::xbrl::index::RawFact;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Slack allowed when matching a return period to 1, 5 or 10 years.
pub const RETURN_PERIOD_TOLERANCE_DAYS: i64 = 30;

const AVG_ANNUAL_RETURN_TAG: &str = "oef:AvgAnnlRtrPct";
const EXPENSE_RATIO_TAG: &str = "oef:ExpenseRatioPct";
const PORTFOLIO_TURNOVER_TAG: &str = "us-gaap:InvestmentCompanyPortfolioTurnover";

const PERFORMANCE_TAGS: &[&str] = &[AVG_ANNUAL_RETURN_TAG, EXPENSE_RATIO_TAG, PORTFOLIO_TURNOVER_TAG];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnPeriod {
    OneYear,
    FiveYear,
    TenYear,
    SinceInception,
}

impl ReturnPeriod {
    /// Buckets a return by its period length. Years are 365.25 days.
    pub fn classify(start: NaiveDate, end: NaiveDate) -> Self {
        let days = (end - start).num_days();
        let near = |years: i64| (days * 4 - 1461 * years).abs() <= RETURN_PERIOD_TOLERANCE_DAYS * 4;

        if near(1) {
            ReturnPeriod::OneYear
        } else if near(5) {
            ReturnPeriod::FiveYear
        } else if near(10) {
            ReturnPeriod::TenYear
        } else {
            ReturnPeriod::SinceInception
        }
    }
}

/// Facts of one share class, split by whether they describe a benchmark.
struct ClassFacts<'a> {
    class_id: &'a str,
    fund: Vec<(&'a RawFact, &'a Context)>,
    benchmark: Vec<(&'a RawFact, &'a Context)>,
}

/// Builds one performance record per share class found in a shareholder
/// report's inline facts.
pub fn extract_performance(document: &InlineDocument) -> Vec<PerformanceRecord> {
    group_by_class(document)
        .into_iter()
        .filter_map(|class| build_record(&class))
        .collect()
}

fn group_by_class(document: &InlineDocument) -> Vec<ClassFacts<'_>> {
    let mut classes: Vec<ClassFacts<'_>> = Vec::new();

    // Return facts first, so a class's period end comes from its returns
    let facts = PERFORMANCE_TAGS.iter().flat_map(|tag| document.facts_with_context(tag));

    for (fact, ctx) in facts {
        let Some(class_id) = ctx.class_id.as_deref() else { continue };

        let idx = match classes.iter().position(|c| c.class_id == class_id) {
            Some(idx) => idx,
            None => {
                classes.push(ClassFacts { class_id, fund: Vec::new(), benchmark: Vec::new() });
                classes.len() - 1
            }
        };

        if ctx.benchmark.is_some() {
            classes[idx].benchmark.push((fact, ctx));
        } else {
            classes[idx].fund.push((fact, ctx));
        }
    }

    classes
}

fn build_record(class: &ClassFacts<'_>) -> Option<PerformanceRecord> {
    let Some(fiscal_year_end) = class
        .fund
        .iter()
        .find_map(|(_, ctx)| ctx.period.map(|period| period.end()))
    else {
        tracing::warn!("No fiscal year end found for class_id {}, skipping", class.class_id);
        return None;
    };

    let mut record = PerformanceRecord {
        class_id: class.class_id.to_string(),
        fiscal_year_end,
        return_1yr: None,
        return_5yr: None,
        return_10yr: None,
        return_since_inception: None,
        expense_ratio: None,
        portfolio_turnover: None,
        benchmark_name: None,
        benchmark_return_1yr: None,
        benchmark_return_5yr: None,
        benchmark_return_10yr: None,
    };

    for (fact, ctx) in &class.fund {
        let value = numeric(fact);
        match fact.name.as_str() {
            AVG_ANNUAL_RETURN_TAG => {
                let Some(period) = return_period(ctx) else { continue };
                let slot = match period {
                    ReturnPeriod::OneYear => &mut record.return_1yr,
                    ReturnPeriod::FiveYear => &mut record.return_5yr,
                    ReturnPeriod::TenYear => &mut record.return_10yr,
                    ReturnPeriod::SinceInception => &mut record.return_since_inception,
                };
                *slot = value;
            }
            EXPENSE_RATIO_TAG => record.expense_ratio = value,
            PORTFOLIO_TURNOVER_TAG => record.portfolio_turnover = value,
            _ => {}
        }
    }

    record.benchmark_name = class.benchmark.iter().find_map(|(_, ctx)| ctx.benchmark.clone());

    for (fact, ctx) in &class.benchmark {
        if fact.name != AVG_ANNUAL_RETURN_TAG {
            continue;
        }
        let slot = match return_period(ctx) {
            Some(ReturnPeriod::OneYear) => &mut record.benchmark_return_1yr,
            Some(ReturnPeriod::FiveYear) => &mut record.benchmark_return_5yr,
            Some(ReturnPeriod::TenYear) => &mut record.benchmark_return_10yr,
            Some(ReturnPeriod::SinceInception) | None => continue,
        };
        *slot = numeric(fact);
    }

    tracing::debug!("Built performance record for class {} ({})", record.class_id, fiscal_year_end);
    Some(record)
}

fn return_period(ctx: &Context) -> Option<ReturnPeriod> {
    match ctx.period? {
        ContextPeriod::Duration { start, end } => Some(ReturnPeriod::classify(start, end)),
        ContextPeriod::Instant(_) => None,
    }
}

fn numeric(fact: &RawFact) -> Option<Decimal> {
    fact.value(false)?.as_number()
}
