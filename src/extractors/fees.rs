// src/extractors/fees.rs
use crate::edgar::models::FeeSchedule;
use crate::xbrl::context::Context;
use crate::xbrl::convert::parse_date;
use crate::xbrl::document::InlineDocument;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;

// Risk/return summary taxonomies, tried in this order
const TAXONOMY_PREFIXES: &[&str] = &["rr", "oef"];

const PERIOD_END_TAG: &str = "dei:DocumentPeriodEndDate";
const OBJECTIVE_TAG: &str = "ObjectivePrimaryTextBlock";
const STRATEGY_TAG: &str = "StrategyNarrativeTextBlock";

/// Extracts one fee schedule per share class from a prospectus.
///
/// Class contexts are visited in document order; the first context of a
/// class that carries any fee figure wins.
pub fn extract_fee_schedules(document: &InlineDocument) -> Vec<FeeSchedule> {
    let effective_date = document_period_end(document);
    let mut seen_classes = HashSet::new();
    let mut schedules = Vec::new();

    for context in document.contexts().iter() {
        let Some(class_id) = context.class_id.as_deref() else { continue };
        if seen_classes.contains(class_id) {
            continue;
        }

        let schedule = fee_schedule_for(document, context, class_id, effective_date);
        if !schedule.has_fees() {
            continue;
        }

        tracing::debug!("Extracted fee schedule for class {} from context {}", class_id, context.context_id);
        seen_classes.insert(class_id.to_string());
        schedules.push(schedule);
    }

    tracing::info!("Extracted {} fee schedule(s)", schedules.len());
    schedules
}

fn fee_schedule_for(
    document: &InlineDocument,
    context: &Context,
    class_id: &str,
    effective_date: Option<NaiveDate>,
) -> FeeSchedule {
    let ctx = context.context_id.as_str();
    let fee = |local_name: &str, negate: bool| lookup_number(document, local_name, ctx, negate);

    // Narrative blocks are usually tagged once per series
    let text_context = context
        .series_id
        .as_deref()
        .and_then(|series_id| document.contexts().series_context(series_id));
    let text = |local_name: &str| {
        text_context
            .and_then(|series_ctx| lookup_text(document, local_name, &series_ctx.context_id))
            .or_else(|| lookup_text(document, local_name, ctx))
    };

    FeeSchedule {
        class_id: class_id.to_string(),
        series_id: context.series_id.clone(),
        effective_date,
        management_fee: fee("ManagementFeesOverAssets", false),
        distribution_12b1: fee("DistributionAndService12b1FeesOverAssets", false),
        other_expenses: fee("OtherExpensesOverAssets", false),
        acquired_fund_fees: fee("AcquiredFundFeesAndExpensesOverAssets", false),
        total_expense_gross: fee("ExpensesOverAssets", false),
        fee_waiver: fee("FeeWaiverOrReimbursementOverAssets", true),
        total_expense_net: fee("NetExpensesOverAssets", false),
        max_sales_charge: fee("MaximumSalesChargeImposedOnPurchasesOverOfferingPrice", false),
        max_deferred_sales_charge: fee("MaximumDeferredSalesChargeOverOfferingPrice", false),
        redemption_fee: fee("RedemptionFeeOverRedemption", true),
        objective_text: text(OBJECTIVE_TAG),
        strategy_text: text(STRATEGY_TAG),
    }
}

fn lookup_number(document: &InlineDocument, local_name: &str, context_id: &str, negate: bool) -> Option<Decimal> {
    TAXONOMY_PREFIXES
        .iter()
        .find_map(|prefix| document.extract_number(&format!("{}:{}", prefix, local_name), context_id, negate))
}

fn lookup_text(document: &InlineDocument, local_name: &str, context_id: &str) -> Option<String> {
    TAXONOMY_PREFIXES
        .iter()
        .find_map(|prefix| document.extract_text(&format!("{}:{}", prefix, local_name), context_id))
}

/// `dei:DocumentPeriodEndDate` from a base context, else from any context.
fn document_period_end(document: &InlineDocument) -> Option<NaiveDate> {
    document
        .base_contexts()
        .find_map(|ctx| document.extract_date(PERIOD_END_TAG, &ctx.context_id))
        .or_else(|| document.facts_named(PERIOD_END_TAG).find_map(|fact| parse_date(&fact.text)))
}
