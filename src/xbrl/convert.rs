// src/xbrl/convert.rs

// --- Imports ---
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::Html;
use std::str::FromStr;

// --- Constants ---
/// Largest power of ten a `Decimal` can represent or resolve.
const MAX_SCALE_EXPONENT: u32 = 28;

/// Glyphs issuers use for "nothing to report" in a numeric cell.
const DASH_GLYPHS: &[&str] = &["-", "\u{2014}", "\u{2013}", "\u{2012}", "\u{2212}"];

/// Literal tokens that mean "no value" in tables and word-formatted facts.
const NULL_WORDS: &[&str] = &["none", "n/a", "na"];

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

// --- Data Structures ---

/// The inline-fact attributes that steer numeric conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumericAttrs<'a> {
    /// Power-of-ten multiplier (`value * 10^scale`).
    pub scale: Option<&'a str>,
    /// Transformation class, e.g. `ixt:num-dot-decimal`, `ixt-sec:numwordsen`, `ixt:zerodash`.
    pub format: Option<&'a str>,
    /// `"-"` negates the displayed value.
    pub sign: Option<&'a str>,
}

impl<'a> NumericAttrs<'a> {
    pub fn new(scale: Option<&'a str>, format: Option<&'a str>, sign: Option<&'a str>) -> Self {
        Self { scale, format, sign }
    }
}

/// Transformation classes the converter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatClass {
    Words,
    ZeroDash,
    Plain,
}

impl FormatClass {
    fn of(format: Option<&str>) -> Self {
        let Some(format) = format.map(str::to_lowercase) else {
            return FormatClass::Plain;
        };
        if format.contains("numwordsen") || format.contains("num-words") {
            FormatClass::Words
        } else if format.contains("zerodash") || format.contains("fixed-zero") {
            FormatClass::ZeroDash
        } else {
            FormatClass::Plain
        }
    }
}

// --- Numeric conversion ---

/// Converts one inline numeric fact to a decimal.
///
/// Order: format substitutions, decoration stripping, parse, `sign`, `scale`,
/// then `negate_to_positive`. Returns `None` for word-format nulls and for
/// text that is not a number.
pub fn convert_numeric(raw: &str, attrs: &NumericAttrs<'_>, negate_to_positive: bool) -> Option<Decimal> {
    let text = clean_cell_text(raw);

    match FormatClass::of(attrs.format) {
        FormatClass::Words if is_null_word(&text) => return None,
        FormatClass::ZeroDash if text.is_empty() || is_dash(&text) => return Some(Decimal::ZERO),
        _ => {}
    }

    let Some(mut value) = parse_number_literal(&text) else {
        if !text.is_empty() && !is_dash(&text) {
            tracing::warn!("Failed to parse numeric value: '{}'", text);
        }
        return None;
    };

    if attrs.sign.map(str::trim) == Some("-") {
        value = -value;
    }

    if let Some(scale) = attrs.scale {
        match scale.trim().parse::<i32>() {
            Ok(exponent) => value = apply_scale(value, exponent)?,
            Err(_) => tracing::warn!("Invalid scale value: {}", scale),
        }
    }

    if negate_to_positive && value.is_sign_negative() {
        value = -value;
    }

    Some(value)
}

/// Multiplies by `10^exponent`, or `None` if the result leaves the decimal range.
pub fn apply_scale(value: Decimal, exponent: i32) -> Option<Decimal> {
    if exponent.unsigned_abs() > MAX_SCALE_EXPONENT {
        tracing::warn!("Scale {} is out of range for value {}", exponent, value);
        return None;
    }

    let mut steps = 0..exponent.unsigned_abs();
    let scaled = if exponent >= 0 {
        steps.try_fold(value, |acc, _| acc.checked_mul(Decimal::TEN))
    } else {
        steps.try_fold(value, |acc, _| acc.checked_div(Decimal::TEN))
    };
    if scaled.is_none() {
        tracing::warn!("Scale {} overflows value {}", exponent, value);
    }
    scaled
}

/// Parses a displayed table value: `"$1,234.56"`, `"(1.23)"`, `"14.10%"`.
///
/// Parentheses negate, a percent sign divides by 100, and dashes or
/// "N/A" mean no value.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let text = clean_cell_text(raw);
    if text.is_empty() || is_dash(&text) || is_null_word(&text) {
        return None;
    }

    let is_percentage = text.contains('%');
    let value = parse_number_literal(&text)?;

    if is_percentage {
        value.checked_div(Decimal::ONE_HUNDRED)
    } else {
        Some(value)
    }
}

/// Strips currency, grouping and a trailing percent sign and parses what is
/// left. A value wrapped in parentheses is negative. Anything trailing the
/// number, such as a footnote digit after `%`, makes it unparseable.
fn parse_number_literal(text: &str) -> Option<Decimal> {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();
    let stripped = stripped.strip_suffix('%').unwrap_or(&stripped);

    let (negative, body) = match stripped.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner.strip_suffix('%').unwrap_or(inner)),
        None => (false, stripped),
    };

    if body.is_empty() {
        return None;
    }

    let value = Decimal::from_str(body).ok()?;
    Some(if negative { -value } else { value })
}

fn clean_cell_text(raw: &str) -> String {
    raw.replace('\u{a0}', " ").trim().to_string()
}

fn is_dash(text: &str) -> bool {
    DASH_GLYPHS.contains(&text)
}

fn is_null_word(text: &str) -> bool {
    NULL_WORDS.contains(&text.to_lowercase().as_str())
}

// --- Text conversion ---

/// Removes markup from an HTML fragment and collapses whitespace.
pub fn strip_html_to_text(fragment: &str) -> String {
    if fragment.trim().is_empty() {
        return String::new();
    }
    let parsed = Html::parse_fragment(fragment);
    let text: String = parsed.root_element().text().collect();
    collapse_whitespace(&text)
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.replace('\u{a0}', " ").trim(), " ").into_owned()
}

// --- Dates ---

/// Parses `12/31/2024`, `12/31/24`, `2024-12-31`, `December 31, 2024` and
/// `Dec 31, 2024`. Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return None;
    }

    // A two-digit trailing year would otherwise be read as year 24 by %Y
    if let Some(year) = text.rsplit('/').next() {
        if text.contains('/') && year.len() == 2 {
            return NaiveDate::parse_from_str(&text, "%m/%d/%y").ok();
        }
    }

    let text = text.replace('.', "");
    ["%m/%d/%Y", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%B %d %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
}
