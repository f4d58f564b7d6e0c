use chrono::NaiveDate;
use fund_facts::extractors::{extract_fee_schedules, extract_performance};
use fund_facts::xbrl::{ContextMap, ContextPeriod};
use fund_facts::{ExtractError, FactValue, InlineDocument};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PROSPECTUS: &str = include_str!("fixtures/prospectus_485bpos.html");
const SHAREHOLDER_REPORT: &str = include_str!("fixtures/shareholder_report.html");
const INSTANCE: &str = include_str!("fixtures/prospectus_instance.xml");

#[test]
fn test_prospectus_contexts() {
    let doc = InlineDocument::parse(PROSPECTUS);
    let contexts = doc.contexts();

    assert_eq!(contexts.len(), 4);
    let base = contexts.get("AsOf2025").unwrap();
    assert!(base.is_base());
    assert_eq!(base.entity_id.as_deref(), Some("0001100663"));

    let class_a = contexts.get("AsOf2025_GrowthSeries_ClassA").unwrap();
    assert_eq!(class_a.series_id.as_deref(), Some("S000004310"));
    assert_eq!(class_a.class_id.as_deref(), Some("C000012001"));
}

#[test]
fn test_extract_arbitrary_fact() {
    let doc = InlineDocument::parse(PROSPECTUS);

    assert_eq!(
        doc.extract("rr:ManagementFeesOverAssets", "AsOf2025_GrowthSeries_ClassA", false),
        Some(FactValue::Number(dec!(0.0070)))
    );
    assert_eq!(
        doc.extract("rr:FeeWaiverOrReimbursementOverAssets", "AsOf2025_GrowthSeries_ClassA", false),
        Some(FactValue::Number(dec!(-0.0010)))
    );
    assert_eq!(
        doc.extract("rr:MaximumSalesChargeImposedOnPurchasesOverOfferingPrice", "AsOf2025_GrowthSeries_ClassI", false),
        None
    );
    assert_eq!(
        doc.extract("dei:DocumentType", "AsOf2025", false),
        Some(FactValue::Text("485BPOS".to_string()))
    );
}

#[test]
fn test_prospectus_fee_schedules() {
    let doc = InlineDocument::parse(PROSPECTUS);
    let schedules = extract_fee_schedules(&doc);
    assert_eq!(schedules.len(), 2);

    let class_a = &schedules[0];
    assert_eq!(class_a.class_id, "C000012001");
    assert_eq!(class_a.effective_date, NaiveDate::from_ymd_opt(2025, 4, 29));
    assert_eq!(class_a.max_sales_charge, Some(dec!(0.0575)));
    assert_eq!(class_a.redemption_fee, Some(dec!(0.0200)));
    assert_eq!(class_a.management_fee, Some(dec!(0.0070)));
    assert_eq!(class_a.distribution_12b1, Some(dec!(0.0025)));
    assert_eq!(class_a.total_expense_gross, Some(dec!(0.0110)));
    assert_eq!(class_a.fee_waiver, Some(dec!(0.0010)));
    assert_eq!(class_a.total_expense_net, Some(dec!(0.0100)));
    assert_eq!(class_a.objective_text.as_deref(), Some("The Fund seeks long-term growth of capital."));
    assert_eq!(
        class_a.strategy_text.as_deref(),
        Some("The Fund invests primarily in common stocks of large U.S. companies. The Fund may invest up to 20% in foreign issuers.")
    );

    let class_i = &schedules[1];
    assert_eq!(class_i.class_id, "C000012002");
    assert_eq!(class_i.max_sales_charge, None);
    assert_eq!(class_i.distribution_12b1, Some(Decimal::ZERO));
    assert_eq!(class_i.total_expense_net, Some(dec!(0.0070)));
}

#[test]
fn test_shareholder_report_performance() {
    let doc = InlineDocument::parse(SHAREHOLDER_REPORT);
    let records = extract_performance(&doc);
    assert_eq!(records.len(), 1);

    let spy = &records[0];
    assert_eq!(spy.class_id, "C000012345");
    assert_eq!(spy.fiscal_year_end, NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    assert_eq!(spy.expense_ratio, Some(dec!(0.000945)));
    assert_eq!(spy.return_1yr, Some(dec!(0.3618)));
    assert_eq!(spy.return_5yr, Some(dec!(0.1586)));
    assert_eq!(spy.return_10yr, Some(dec!(0.1328)));
    assert_eq!(spy.return_since_inception, None);
    assert_eq!(spy.portfolio_turnover, Some(dec!(0.02)));
    assert_eq!(spy.benchmark_name.as_deref(), Some("SP500IndexMember"));
    assert_eq!(spy.benchmark_return_1yr, Some(dec!(0.3635)));
    assert_eq!(spy.benchmark_return_10yr, Some(dec!(0.1338)));
}

#[test]
fn test_xbrl_instance_contexts() {
    let contexts = ContextMap::from_xbrl_instance(INSTANCE).unwrap();
    let ids: Vec<&str> = contexts.iter().map(|c| c.context_id.as_str()).collect();
    assert_eq!(ids, vec!["AsOf2025", "AsOf2025_ClassA", "AsOf2025_ClassA_Index"]);

    let base = contexts.get("AsOf2025").unwrap();
    assert_eq!(base.entity_id.as_deref(), Some("0001100663"));
    assert_eq!(base.period, NaiveDate::from_ymd_opt(2025, 4, 29).map(ContextPeriod::Instant));

    let index = contexts.get("AsOf2025_ClassA_Index").unwrap();
    assert_eq!(index.class_id.as_deref(), Some("C000012001"));
    assert_eq!(index.benchmark.as_deref(), Some("RussellOneThousandGrowthIndexMember"));
    assert_eq!(index.series_id, None);
}

#[test]
fn test_malformed_instance_is_an_error() {
    let err = ContextMap::from_xbrl_instance("<xbrli:xbrl><unclosed>").unwrap_err();
    assert!(matches!(err, ExtractError::InvalidXml(_)));
}
