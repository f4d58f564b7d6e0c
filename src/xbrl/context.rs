// src/xbrl/context.rs

// --- Imports ---
use crate::utils::error::ExtractError;
use crate::xbrl::convert::parse_date;
use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- Data Structures ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextPeriod {
    Instant(NaiveDate),
    Duration { start: NaiveDate, end: NaiveDate },
}

impl ContextPeriod {
    /// The instant, or the last day of a duration.
    pub fn end(&self) -> NaiveDate {
        match self {
            ContextPeriod::Instant(date) => *date,
            ContextPeriod::Duration { end, .. } => *end,
        }
    }
}

/// One declared dimensional context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub context_id: String,
    /// Issuer CIK, zero-padded to 10 digits.
    pub entity_id: Option<String>,
    pub series_id: Option<String>,
    pub class_id: Option<String>,
    /// Benchmark index member, namespace prefix removed.
    pub benchmark: Option<String>,
    pub period: Option<ContextPeriod>,
    /// Number of explicit dimension members in the segment.
    pub dimension_count: usize,
}

impl Context {
    /// A context without dimensions scopes facts about the filing itself.
    pub fn is_base(&self) -> bool {
        self.dimension_count == 0
    }
}

/// Context declarations in document order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    contexts: Vec<Context>,
    by_id: HashMap<String, usize>,
}

/// Which of the known axes a dimension belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Series,
    Class,
    Benchmark,
    Other,
}

impl Axis {
    fn classify(dimension: &str) -> Self {
        let dimension = dimension.to_lowercase();
        if dimension.contains("legalentityaxis") || dimension.contains("seriesaxis") {
            Axis::Series
        } else if dimension.contains("classaxis") {
            Axis::Class
        } else if dimension.contains("broadbasedindexaxis") {
            Axis::Benchmark
        } else {
            Axis::Other
        }
    }
}

/// Source-independent view of a context declaration, filled either from an
/// inline HTML document or from an XBRL instance.
#[derive(Debug, Default)]
struct RawContext {
    id: String,
    identifier: Option<String>,
    members: Vec<(String, String)>,
    instant: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl RawContext {
    fn resolve(self) -> Context {
        let entity_id = self.identifier.as_deref().and_then(normalize_cik);

        let mut series_id = None;
        let mut class_id = None;
        let mut benchmark = None;
        for (dimension, member) in &self.members {
            match Axis::classify(dimension) {
                Axis::Series => series_id = series_id.or_else(|| member_identifier(member)),
                Axis::Class => class_id = class_id.or_else(|| member_identifier(member)),
                Axis::Benchmark => benchmark = benchmark.or_else(|| strip_namespace(member)),
                Axis::Other => {}
            }
        }

        let period = match (
            self.instant.as_deref().and_then(parse_date),
            self.start_date.as_deref().and_then(parse_date),
            self.end_date.as_deref().and_then(parse_date),
        ) {
            (Some(instant), _, _) => Some(ContextPeriod::Instant(instant)),
            (None, Some(start), Some(end)) => Some(ContextPeriod::Duration { start, end }),
            (None, None, Some(end)) => Some(ContextPeriod::Instant(end)),
            _ => None,
        };

        Context {
            context_id: self.id,
            entity_id,
            series_id,
            class_id,
            benchmark,
            period,
            dimension_count: self.members.len(),
        }
    }
}

// --- Helpers ---

/// Zero-pads a numeric issuer identifier to 10 digits.
pub fn normalize_cik(identifier: &str) -> Option<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }
    match identifier.parse::<u64>() {
        Ok(cik) => Some(format!("{:010}", cik)),
        Err(_) => {
            tracing::warn!("Invalid CIK format: {}", identifier);
            None
        }
    }
}

/// `"ist:C000131291Member"` -> `"C000131291"`.
pub fn member_identifier(member: &str) -> Option<String> {
    let local = strip_namespace(member)?;
    let id = local.strip_suffix("Member").unwrap_or(local.as_str()).trim();
    (!id.is_empty()).then(|| id.to_string())
}

fn strip_namespace(member: &str) -> Option<String> {
    let member = member.trim();
    let local = member.split_once(':').map_or(member, |(_, local)| local).trim();
    (!local.is_empty()).then(|| local.to_string())
}

/// Element names in HTML mode keep their prefix (`xbrli:context`); XML
/// parsers report the local part only. Compare on the local part.
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

// --- ContextMap ---

impl ContextMap {
    /// Resolves every `xbrli:context` in an inline XBRL (HTML) document.
    pub fn from_html(document: &Html) -> Self {
        let raw_contexts = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| local_name(el.value().name()).eq_ignore_ascii_case("context"))
            .filter_map(raw_context_from_html);

        Self::from_raw(raw_contexts)
    }

    /// Resolves the contexts of a standalone XBRL instance document.
    pub fn from_xbrl_instance(xml: &str) -> Result<Self, ExtractError> {
        let document = roxmltree::Document::parse(xml)?;

        let raw_contexts = document
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "context")
            .filter_map(|context| {
                let id = context.attribute("id")?.to_string();
                let mut raw = RawContext { id, ..RawContext::default() };

                for node in context.descendants().filter(|n| n.is_element()) {
                    let text = node.text().map(|t| t.trim().to_string());
                    match node.tag_name().name() {
                        "identifier" => raw.identifier = text,
                        "instant" => raw.instant = text,
                        "startDate" => raw.start_date = text,
                        "endDate" => raw.end_date = text,
                        "explicitMember" => {
                            if let (Some(dimension), Some(member)) = (node.attribute("dimension"), text) {
                                raw.members.push((dimension.to_string(), member));
                            }
                        }
                        _ => {}
                    }
                }
                Some(raw)
            });

        Ok(Self::from_raw(raw_contexts))
    }

    fn from_raw(raw_contexts: impl Iterator<Item = RawContext>) -> Self {
        let mut map = ContextMap::default();
        for raw in raw_contexts {
            let context = raw.resolve();
            if map.by_id.contains_key(&context.context_id) {
                tracing::debug!("Duplicate context id {}, keeping the first", context.context_id);
                continue;
            }
            map.by_id.insert(context.context_id.clone(), map.contexts.len());
            map.contexts.push(context);
        }
        tracing::debug!("Resolved {} contexts", map.contexts.len());
        map
    }

    pub fn get(&self, context_id: &str) -> Option<&Context> {
        self.by_id.get(context_id).map(|&idx| &self.contexts[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Contexts with no dimensions, in document order.
    pub fn base_contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter().filter(|c| c.is_base())
    }

    /// First series-level context (series set, no class) for `series_id`.
    pub fn series_context(&self, series_id: &str) -> Option<&Context> {
        self.contexts
            .iter()
            .find(|c| c.class_id.is_none() && c.series_id.as_deref() == Some(series_id))
    }
}

fn raw_context_from_html(context: ElementRef<'_>) -> Option<RawContext> {
    let id = context.value().attr("id")?.to_string();
    let mut raw = RawContext { id, ..RawContext::default() };

    // descendants() includes the context element itself; skip it
    for el in context.descendants().skip(1).filter_map(ElementRef::wrap) {
        let name = el.value().name();
        match local_name(name) {
            "identifier" => raw.identifier = Some(element_text(el)),
            "instant" => raw.instant = Some(element_text(el)),
            "startdate" => raw.start_date = Some(element_text(el)),
            "enddate" => raw.end_date = Some(element_text(el)),
            "explicitmember" => {
                if let Some(dimension) = el.value().attr("dimension") {
                    raw.members.push((dimension.to_string(), element_text(el)));
                }
            }
            _ => {}
        }
    }
    Some(raw)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXTS_HTML: &str = r#"
<html><body>
<div style="display:none"><ix:header><ix:resources>
<xbrli:context id="AsOf2022-11-03">
  <xbrli:entity><xbrli:identifier scheme="http://www.sec.gov/CIK">1314612</xbrli:identifier></xbrli:entity>
  <xbrli:period><xbrli:instant>2022-11-03</xbrli:instant></xbrli:period>
</xbrli:context>
<xbrli:context id="AsOf2022-11-03_custom_S000014796Member">
  <xbrli:entity>
    <xbrli:identifier scheme="http://www.sec.gov/CIK">0001314612</xbrli:identifier>
    <xbrli:segment><xbrldi:explicitMember dimension="dei:LegalEntityAxis">custom:S000014796Member</xbrldi:explicitMember></xbrli:segment>
  </xbrli:entity>
  <xbrli:period><xbrli:instant>2022-11-03</xbrli:instant></xbrli:period>
</xbrli:context>
<xbrli:context id="AsOf2022-11-03_custom_S000014796Member_custom_C000014542Member">
  <xbrli:entity>
    <xbrli:identifier scheme="http://www.sec.gov/CIK">0001314612</xbrli:identifier>
    <xbrli:segment>
      <xbrldi:explicitMember dimension="dei:LegalEntityAxis">custom:S000014796Member</xbrldi:explicitMember>
      <xbrldi:explicitMember dimension="rr:ProspectusShareClassAxis">custom:C000014542Member</xbrldi:explicitMember>
    </xbrli:segment>
  </xbrli:entity>
  <xbrli:period><xbrli:instant>2022-11-03</xbrli:instant></xbrli:period>
</xbrli:context>
<xbrli:context id="NoIdentifier">
  <xbrli:entity></xbrli:entity>
</xbrli:context>
</ix:resources></ix:header></div>
</body></html>
"#;

    #[test]
    fn test_base_series_and_class_contexts() {
        let map = ContextMap::from_html(&Html::parse_document(CONTEXTS_HTML));
        assert_eq!(map.len(), 4);

        let base = map.get("AsOf2022-11-03").expect("base context");
        assert!(base.is_base());
        assert_eq!(base.entity_id.as_deref(), Some("0001314612"));
        assert_eq!(base.series_id, None);
        assert_eq!(base.class_id, None);
        assert_eq!(base.period, NaiveDate::from_ymd_opt(2022, 11, 3).map(ContextPeriod::Instant));

        let series = map.get("AsOf2022-11-03_custom_S000014796Member").expect("series context");
        assert_eq!(series.series_id.as_deref(), Some("S000014796"));
        assert_eq!(series.class_id, None);

        let class = map
            .get("AsOf2022-11-03_custom_S000014796Member_custom_C000014542Member")
            .expect("class context");
        assert_eq!(class.entity_id.as_deref(), Some("0001314612"));
        assert_eq!(class.series_id.as_deref(), Some("S000014796"));
        assert_eq!(class.class_id.as_deref(), Some("C000014542"));
        assert_eq!(class.dimension_count, 2);

        assert_eq!(map.series_context("S000014796").map(|c| c.context_id.as_str()), Some("AsOf2022-11-03_custom_S000014796Member"));
    }

    #[test]
    fn test_context_without_identifier_is_kept() {
        let map = ContextMap::from_html(&Html::parse_document(CONTEXTS_HTML));
        let context = map.get("NoIdentifier").expect("context without identifier");
        assert_eq!(context.entity_id, None);
        assert_eq!(context.period, None);
    }

    #[test]
    fn test_member_identifier() {
        assert_eq!(member_identifier("ist:C000131291Member").as_deref(), Some("C000131291"));
        assert_eq!(member_identifier("C000131291Member").as_deref(), Some("C000131291"));
        assert_eq!(member_identifier("S000014796").as_deref(), Some("S000014796"));
        assert_eq!(member_identifier("ist:Member"), None);
        assert_eq!(member_identifier(""), None);
    }

    #[test]
    fn test_normalize_cik() {
        assert_eq!(normalize_cik("36405").as_deref(), Some("0000036405"));
        assert_eq!(normalize_cik(" 0000036405 ").as_deref(), Some("0000036405"));
        assert_eq!(normalize_cik("not-a-cik"), None);
        assert_eq!(normalize_cik(""), None);
    }

    #[test]
    fn test_xbrl_instance_contexts() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:xbrldi="http://xbrl.org/2006/xbrldi"
            xmlns:oef="http://xbrl.sec.gov/oef/2023"
            xmlns:ist="http://example.com/ist">
  <xbrli:context id="c-1">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000036405</xbrli:identifier>
      <xbrli:segment>
        <xbrldi:explicitMember dimension="oef:ClassAxis">ist:C000131291Member</xbrldi:explicitMember>
        <xbrldi:explicitMember dimension="oef:BroadBasedIndexAxis">ist:BloombergUSUniversalIndexMember</xbrldi:explicitMember>
      </xbrli:segment>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2023-09-01</xbrli:startDate>
      <xbrli:endDate>2024-08-31</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
</xbrli:xbrl>"#;

        let map = ContextMap::from_xbrl_instance(xml).expect("valid instance");
        let context = map.get("c-1").expect("context c-1");
        assert_eq!(context.entity_id.as_deref(), Some("0000036405"));
        assert_eq!(context.class_id.as_deref(), Some("C000131291"));
        assert_eq!(context.benchmark.as_deref(), Some("BloombergUSUniversalIndexMember"));
        assert_eq!(
            context.period,
            Some(ContextPeriod::Duration {
                start: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 8, 31).unwrap(),
            })
        );
    }

    #[test]
    fn test_malformed_instance_is_an_error() {
        let result = ContextMap::from_xbrl_instance("<xbrli:xbrl><unclosed></xbrli:xbrl>");
        assert!(matches!(result, Err(ExtractError::InvalidXml(_))));
    }
}
