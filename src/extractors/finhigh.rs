// src/extractors/finhigh.rs

// --- Imports ---
use crate::edgar::models::{DistributionData, FinancialHighlightsRecord, OperatingData, RatioData};
use crate::utils::error::ExtractError;
use crate::xbrl::convert::{collapse_whitespace, parse_date, parse_decimal};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

// --- Constants ---
/// Tables with fewer rows are not Financial Highlights disclosures.
pub const MIN_HIGHLIGHTS_ROWS: usize = 10;

/// Allowed NAV roll-forward discrepancy, in dollars per share.
pub const NAV_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Most recent fiscal period is the column right after the label.
const VALUE_COLUMN: usize = 1;

/// Header rows searched for the fiscal period end date.
const DATE_SEARCH_ROWS: usize = 5;

/// Longer text blocks are body copy, not headings.
const MAX_HEADING_LEN: usize = 150;

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to compile TABLE_SELECTOR"));

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));

static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR"));

// Elements that can carry a fund or share class heading
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "b", "strong", "font", "span", "div"];
const TITLE_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const EMPHASIS_TAGS: &[&str] = &["b", "strong", "font"];
const BLOCK_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "div", "table"];

// --- Regex Patterns (Lazy Static) ---
static SLASH_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{4})\b").expect("Failed to compile SLASH_DATE_RE")
});

// "Year Ended December 31," optionally followed by the year in the same cell
static PERIOD_ENDED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:year|period)s?\s+ended\s+([a-z]{3,9})\.?\s+(\d{1,2}),?(?:\s+(\d{4}))?")
        .expect("Failed to compile PERIOD_ENDED_RE")
});

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("Failed to compile YEAR_RE"));

// "end", "ending" but not "dividend"
static END_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bend").expect("Failed to compile END_WORD_RE"));

// --- Row Classification ---

/// Semantic role of one Financial Highlights row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    NavEnd,
    NavBeginning,
    NetInvestmentIncome,
    RealizedUnrealizedGain,
    TotalFromOperations,
    Equalization,
    DistNetInvestmentIncome,
    DistRealizedGains,
    DistReturnOfCapital,
    DistTotal,
    TotalReturn,
    ExpenseRatio,
    PortfolioTurnover,
    NetAssetsEnd,
}

type LabelRule = fn(&str) -> bool;

/// Ordered label rules; the first matching rule decides the role.
/// Ratio rows mention "net investment income" too, so the operating rules
/// exclude them before the generic patterns get a chance.
static ROW_RULES: &[(RowRole, LabelRule)] = &[
    (RowRole::NavEnd, |l| l.contains("net asset value") && END_WORD_RE.is_match(l)),
    (RowRole::NavBeginning, |l| l.contains("net asset value") && l.contains("beginning")),
    (RowRole::NetInvestmentIncome, |l| {
        l.contains("net investment income")
            && !has_any(l, &["ratio", "average", "dividend", "distribution"])
    }),
    (RowRole::RealizedUnrealizedGain, |l| {
        l.contains("realized")
            && has_any(l, &["gain", "loss"])
            && !has_any(l, &["distribution", "dividend", "ratio"])
    }),
    (RowRole::TotalFromOperations, |l| {
        l.contains("total") && l.contains("operations") && !l.contains("ratio")
    }),
    (RowRole::Equalization, |l| l.contains("equalization")),
    (RowRole::DistNetInvestmentIncome, |l| {
        has_any(l, &["dividend", "distribution"]) && l.contains("net investment income")
    }),
    (RowRole::DistRealizedGains, |l| {
        has_any(l, &["distribution", "dividend"]) && has_any(l, &["capital gain", "realized"])
    }),
    (RowRole::DistReturnOfCapital, |l| l.contains("return of capital")),
    (RowRole::DistTotal, |l| l.contains("total") && has_any(l, &["distribution", "dividends"])),
    (RowRole::TotalReturn, |l| l.contains("total return") && !l.contains("ratio")),
    (RowRole::ExpenseRatio, |l| {
        l.contains("expense") && has_any(l, &["ratio", "average net assets"])
    }),
    (RowRole::PortfolioTurnover, |l| l.contains("turnover")),
    (RowRole::NetAssetsEnd, |l| {
        l.contains("net assets") && END_WORD_RE.is_match(l) && l.contains("million")
    }),
];

fn has_any(label: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| label.contains(needle))
}

/// Classifies a row label. `label` is matched case-insensitively.
pub fn classify_label(label: &str) -> Option<RowRole> {
    let label = collapse_whitespace(label).to_lowercase();
    if label.is_empty() {
        return None;
    }
    ROW_RULES
        .iter()
        .find(|(_, matches)| matches(&label))
        .map(|(role, _)| *role)
}

// --- Table Parsing ---

/// Parses the first table found in `html`.
///
/// # Errors
/// `NoTable` if the fragment has no `<table>`, `TooFewRows` if it has fewer
/// than [`MIN_HIGHLIGHTS_ROWS`] rows.
pub fn parse_financial_highlights_table(html: &str) -> Result<FinancialHighlightsRecord, ExtractError> {
    let fragment = Html::parse_fragment(html);
    let table = fragment.select(&TABLE_SELECTOR).next().ok_or(ExtractError::NoTable)?;
    parse_table_element(table)
}

/// Parses one already-located table element.
pub fn parse_table_element(table: ElementRef<'_>) -> Result<FinancialHighlightsRecord, ExtractError> {
    let rows: Vec<Vec<String>> = table
        .select(&ROW_SELECTOR)
        .map(|row| row.select(&CELL_SELECTOR).map(cell_text).collect())
        .collect();

    if rows.len() < MIN_HIGHLIGHTS_ROWS {
        return Err(ExtractError::TooFewRows { found: rows.len(), required: MIN_HIGHLIGHTS_ROWS });
    }

    let mut record = FinancialHighlightsRecord {
        fiscal_year_end: find_fiscal_year_end(&rows),
        ..FinancialHighlightsRecord::default()
    };

    for cells in &rows {
        let Some(label) = cells.first() else { continue };
        let Some(role) = classify_label(label) else { continue };
        let Some(value) = cells.get(VALUE_COLUMN).and_then(|cell| parse_decimal(cell)) else {
            continue;
        };
        assign(&mut record, role, value);
    }

    record.math_validated = validate_nav_rollforward(&record.operating, &record.distribution);
    Ok(record)
}

/// Stores `value` under `role`. The first row carrying a value wins.
fn assign(record: &mut FinancialHighlightsRecord, role: RowRole, value: Decimal) {
    let slot = match role {
        RowRole::NavBeginning => &mut record.operating.nav_beginning,
        RowRole::NetInvestmentIncome => &mut record.operating.net_investment_income,
        RowRole::RealizedUnrealizedGain => &mut record.operating.net_realized_unrealized_gain,
        RowRole::TotalFromOperations => &mut record.operating.total_from_operations,
        RowRole::Equalization => &mut record.operating.equalization,
        RowRole::NavEnd => &mut record.operating.nav_end,
        RowRole::TotalReturn => &mut record.operating.total_return,
        RowRole::DistNetInvestmentIncome => &mut record.distribution.dist_net_investment_income,
        RowRole::DistRealizedGains => &mut record.distribution.dist_realized_gains,
        RowRole::DistReturnOfCapital => &mut record.distribution.dist_return_of_capital,
        RowRole::DistTotal => &mut record.distribution.dist_total,
        RowRole::ExpenseRatio => &mut record.ratios.expense_ratio,
        RowRole::PortfolioTurnover => &mut record.ratios.portfolio_turnover,
        RowRole::NetAssetsEnd => &mut record.ratios.net_assets_end,
    };
    if slot.is_some() {
        return;
    }

    *slot = match role {
        RowRole::NetAssetsEnd => value.checked_mul(Decimal::from(1_000_000)),
        _ => Some(value),
    };
}

/// `nav_beginning + total_from_operations + dist_total + equalization`
/// must land within [`NAV_TOLERANCE`] of `nav_end`. Missing equalization
/// counts as zero; any other missing operand fails the check.
pub fn validate_nav_rollforward(operating: &OperatingData, distribution: &DistributionData) -> bool {
    let (Some(nav_beginning), Some(total_ops), Some(dist_total), Some(nav_end)) = (
        operating.nav_beginning,
        operating.total_from_operations,
        distribution.dist_total,
        operating.nav_end,
    ) else {
        tracing::debug!("NAV roll-forward not checked: missing operands");
        return false;
    };

    let equalization = operating.equalization.unwrap_or(Decimal::ZERO);
    let discrepancy = (nav_beginning + total_ops + dist_total + equalization - nav_end).abs();

    if discrepancy > NAV_TOLERANCE {
        tracing::warn!(
            "Math validation failed: {} + {} + {} + {} vs NAV end {} (off by {})",
            nav_beginning,
            total_ops,
            dist_total,
            equalization,
            nav_end,
            discrepancy
        );
        return false;
    }
    true
}

/// Recovers the period end from the header rows: a slash date, or a
/// "Year Ended <Month> <Day>," label completed by a year from the next row.
fn find_fiscal_year_end(rows: &[Vec<String>]) -> Option<NaiveDate> {
    let header_rows: Vec<String> = rows.iter().take(DATE_SEARCH_ROWS).map(|cells| cells.join(" ")).collect();

    for (idx, text) in header_rows.iter().enumerate() {
        if let Some(date) = SLASH_DATE_RE.captures(text).and_then(|caps| parse_date(&caps[1])) {
            return Some(date);
        }

        let Some(caps) = PERIOD_ENDED_RE.captures(text) else { continue };
        let (month, day) = (&caps[1], &caps[2]);
        let year = caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .or_else(|| {
                let next = rows.get(idx + 1)?.join(" ");
                YEAR_RE.captures(&next).map(|y| y[1].to_string())
            });

        if let Some(date) = year.and_then(|year| parse_date(&format!("{} {}, {}", month, day, year))) {
            return Some(date);
        }
    }

    tracing::debug!("No fiscal period end date found in table header");
    None
}

/// Visible text of a cell or heading, without `<sup>` footnote markers.
fn cell_text(cell: ElementRef<'_>) -> String {
    let text: String = cell
        .descendants()
        .filter(|node| {
            !node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != cell.id())
                .filter_map(ElementRef::wrap)
                .any(|ancestor| ancestor.value().name() == "sup")
        })
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect();
    collapse_whitespace(&text)
}

// --- Document Scan ---

/// A candidate table together with the headings that identify it.
#[derive(Debug, Clone)]
pub struct LocatedTable<'a> {
    pub fund_name: Option<String>,
    pub class_label: Option<String>,
    pub table: ElementRef<'a>,
}

/// Walks `document` in order and returns every innermost table mentioning
/// "net asset value", labelled with the nearest fund and share class headings.
pub fn locate_highlight_tables(document: &Html) -> Vec<LocatedTable<'_>> {
    let mut located = Vec::new();
    let mut fund_heading: Option<String> = None;
    let mut class_heading: Option<String> = None;

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        let name = element.value().name();

        if name == "table" {
            if !is_candidate_table(element) {
                continue;
            }
            let class_label = first_cell_class_label(element).or_else(|| class_heading.clone());
            tracing::debug!(
                "Located highlights table (fund: {:?}, class: {:?})",
                fund_heading,
                class_label
            );
            located.push(LocatedTable { fund_name: fund_heading.clone(), class_label, table: element });
            continue;
        }

        if !HEADING_TAGS.contains(&name)
            || has_block_child(element)
            || inside_table(element)
            || !looks_like_heading(element)
        {
            continue;
        }

        let text = cell_text(element);
        if text.is_empty() || text.len() > MAX_HEADING_LEN {
            continue;
        }
        let lower = text.to_lowercase();

        // A new fund starts a new share class scope
        if has_any(&lower, &["fund", "trust", "portfolio", "index"]) {
            fund_heading = Some(text.clone());
            class_heading = None;
        }
        if lower.contains("shares") {
            class_heading = Some(text);
        }
    }

    located
}

fn mentions_nav(element: ElementRef<'_>) -> bool {
    element.text().collect::<String>().to_lowercase().contains("net asset value")
}

// Layout tables wrapping a highlights table defer to the nested one
fn is_candidate_table(table: ElementRef<'_>) -> bool {
    mentions_nav(table) && !table.select(&TABLE_SELECTOR).any(mentions_nav)
}

fn first_cell_class_label(table: ElementRef<'_>) -> Option<String> {
    let first_row = table.select(&ROW_SELECTOR).next()?;
    let first_cell = first_row.select(&CELL_SELECTOR).next()?;
    let text = cell_text(first_cell);
    text.to_lowercase().contains("shares").then_some(text)
}

// Title tags, bare emphasis, or a paragraph whose text is all emphasized
fn looks_like_heading(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    if TITLE_TAGS.contains(&name) || EMPHASIS_TAGS.contains(&name) {
        return true;
    }
    element
        .descendants()
        .filter(|node| node.value().as_text().is_some_and(|text| !text.trim().is_empty()))
        .all(|node| {
            node.ancestors()
                .take_while(|ancestor| ancestor.id() != element.id())
                .filter_map(ElementRef::wrap)
                .any(|ancestor| EMPHASIS_TAGS.contains(&ancestor.value().name()))
        })
}

fn has_block_child(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|child| BLOCK_TAGS.contains(&child.value().name()))
}

fn inside_table(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "table")
}
