// src/edgar/header.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// --- Regex Patterns (Lazy Static) ---
static SERIES_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<SERIES>(.*?)</SERIES>").expect("Failed to compile SERIES_BLOCK_RE")
});

static CLASS_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<CLASS-CONTRACT>(.*?)</CLASS-CONTRACT>")
        .expect("Failed to compile CLASS_BLOCK_RE")
});

// Field values run to the end of the line or the next tag.
static SERIES_NAME_RE: Lazy<Regex> = Lazy::new(|| field_regex("SERIES-NAME"));
static SERIES_ID_RE: Lazy<Regex> = Lazy::new(|| field_regex("SERIES-ID"));
static CLASS_ID_RE: Lazy<Regex> = Lazy::new(|| field_regex("CLASS-CONTRACT-ID"));
static CLASS_NAME_RE: Lazy<Regex> = Lazy::new(|| field_regex("CLASS-CONTRACT-NAME"));
static CLASS_TICKER_RE: Lazy<Regex> = Lazy::new(|| field_regex("CLASS-CONTRACT-TICKER-SYMBOL"));

fn field_regex(tag: &str) -> Regex {
    Regex::new(&format!(r"<{}>([^<\n]*)", regex::escape(tag)))
        .unwrap_or_else(|e| panic!("Failed to compile field regex for {}: {}", tag, e))
}

/// Lower-cases a fund or class name and collapses whitespace, so header
/// names and names scraped from HTML compare on equal footing.
pub fn normalize_name(name: &str) -> String {
    name.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// --- Data Structures ---

/// Series/class/ticker identity map built from a filing's SGML header.
///
/// `classes_by_name` is ordered so substring reconciliation visits candidates
/// deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityMap {
    /// series_id -> series name (as written in the header)
    pub series: HashMap<String, String>,
    /// (normalized series name, normalized class name) -> class_id
    #[serde(with = "name_pairs")]
    pub classes_by_name: BTreeMap<(String, String), String>,
    /// ticker -> class_id
    pub classes_by_ticker: HashMap<String, String>,
}

impl IdentityMap {
    /// Parses the `<SERIES>` / `<CLASS-CONTRACT>` blocks of a header.
    ///
    /// Missing fields are skipped: a series without a name contributes no
    /// name-keyed classes, a class without an id is ignored entirely.
    pub fn from_header(header_text: &str) -> Self {
        let mut map = IdentityMap::default();

        for series_caps in SERIES_BLOCK_RE.captures_iter(header_text) {
            let block = &series_caps[1];

            let series_name = capture_field(&SERIES_NAME_RE, block);
            let series_id = capture_field(&SERIES_ID_RE, block);

            if let (Some(id), Some(name)) = (&series_id, &series_name) {
                map.series.entry(id.clone()).or_insert_with(|| name.clone());
            }

            let normalized_series = series_name.as_deref().map(normalize_name);
            if normalized_series.is_none() {
                tracing::debug!("SERIES block without SERIES-NAME (id {:?}); only tickers will be mapped", series_id);
            }

            for class_caps in CLASS_BLOCK_RE.captures_iter(block) {
                let class_block = &class_caps[1];

                let Some(class_id) = capture_field(&CLASS_ID_RE, class_block) else {
                    tracing::debug!("CLASS-CONTRACT block without CLASS-CONTRACT-ID, skipping");
                    continue;
                };

                if let (Some(series), Some(class_name)) =
                    (&normalized_series, capture_field(&CLASS_NAME_RE, class_block))
                {
                    map.classes_by_name
                        .entry((series.clone(), normalize_name(&class_name)))
                        .or_insert_with(|| class_id.clone());
                }

                if let Some(ticker) = capture_field(&CLASS_TICKER_RE, class_block) {
                    map.classes_by_ticker.entry(ticker).or_insert(class_id);
                }
            }
        }

        tracing::debug!(
            "Parsed header identity map: {} series, {} classes by name, {} tickers",
            map.series.len(),
            map.classes_by_name.len(),
            map.classes_by_ticker.len()
        );
        map
    }

    /// Folds `other` into `self`. Existing entries always win, so callers
    /// merge headers in order of decreasing authority.
    pub fn merge(&mut self, other: IdentityMap) {
        for (id, name) in other.series {
            self.series.entry(id).or_insert(name);
        }
        for (key, class_id) in other.classes_by_name {
            self.classes_by_name.entry(key).or_insert(class_id);
        }
        for (ticker, class_id) in other.classes_by_ticker {
            self.classes_by_ticker.entry(ticker).or_insert(class_id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.classes_by_name.is_empty() && self.classes_by_ticker.is_empty()
    }

    /// Looks up a class id by the exact normalized (series, class) pair.
    pub fn class_by_name(&self, series_name: &str, class_name: &str) -> Option<&str> {
        self.classes_by_name
            .get(&(normalize_name(series_name), normalize_name(class_name)))
            .map(String::as_str)
    }
}

// JSON objects need string keys; the pair-keyed map travels as a list of
// [series, class, class_id] triples instead.
mod name_pairs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<(String, String), String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let triples: Vec<(&str, &str, &str)> = map
            .iter()
            .map(|((series, class), id)| (series.as_str(), class.as_str(), id.as_str()))
            .collect();
        triples.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(String, String), String>, D::Error> {
        let triples = Vec::<(String, String, String)>::deserialize(deserializer)?;
        Ok(triples.into_iter().map(|(series, class, id)| ((series, class), id)).collect())
    }
}

fn capture_field(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"
<SEC-HEADER>
<SERIES-AND-CLASSES-CONTRACTS-DATA>
<EXISTING-SERIES-AND-CLASSES-CONTRACTS>
<SERIES>
<OWNER-CIK>0000036405
<SERIES-ID>S000002839
<SERIES-NAME>Vanguard 500 Index Fund
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000007772
<CLASS-CONTRACT-NAME>Investor Shares
<CLASS-CONTRACT-TICKER-SYMBOL>VFINX
</CLASS-CONTRACT>
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000007773
<CLASS-CONTRACT-NAME>Admiral Shares
<CLASS-CONTRACT-TICKER-SYMBOL>VFIAX
</CLASS-CONTRACT>
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000092055
<CLASS-CONTRACT-NAME>ETF Shares
<CLASS-CONTRACT-TICKER-SYMBOL>VOO
</CLASS-CONTRACT>
</SERIES>
<SERIES>
<OWNER-CIK>0000036405
<SERIES-ID>S000002840
<SERIES-NAME>Vanguard Value Index Fund
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000007780
<CLASS-CONTRACT-NAME>Investor Shares
</CLASS-CONTRACT>
</SERIES>
</EXISTING-SERIES-AND-CLASSES-CONTRACTS>
</SERIES-AND-CLASSES-CONTRACTS-DATA>
</SEC-HEADER>
"#;

    #[test]
    fn test_parse_series_and_classes() {
        let map = IdentityMap::from_header(HEADER);

        assert_eq!(map.series.len(), 2);
        assert_eq!(map.series.get("S000002839").map(String::as_str), Some("Vanguard 500 Index Fund"));
        assert_eq!(map.classes_by_name.len(), 4);
        assert_eq!(map.class_by_name("Vanguard 500 Index Fund", "Admiral Shares"), Some("C000007773"));
        assert_eq!(map.class_by_name("vanguard value index fund", "INVESTOR SHARES"), Some("C000007780"));
        assert_eq!(map.classes_by_ticker.get("VOO").map(String::as_str), Some("C000092055"));
        // The value fund class has no ticker line
        assert_eq!(map.classes_by_ticker.len(), 3);
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let header = r#"
<SERIES>
<SERIES-ID>S000000001
<CLASS-CONTRACT>
<CLASS-CONTRACT-NAME>No Id Shares
<CLASS-CONTRACT-TICKER-SYMBOL>NOID
</CLASS-CONTRACT>
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000000002
<CLASS-CONTRACT-NAME>Nameless Series Shares
<CLASS-CONTRACT-TICKER-SYMBOL>NSS
</CLASS-CONTRACT>
</SERIES>
"#;
        let map = IdentityMap::from_header(header);

        assert!(map.series.is_empty(), "series without a name is not recorded");
        assert!(map.classes_by_name.is_empty());
        assert_eq!(map.classes_by_ticker.len(), 1);
        assert_eq!(map.classes_by_ticker.get("NSS").map(String::as_str), Some("C000000002"));
    }

    #[test]
    fn test_empty_header() {
        assert!(IdentityMap::from_header("").is_empty());
        assert!(IdentityMap::from_header("<SEC-HEADER>no series here</SEC-HEADER>").is_empty());
    }

    #[test]
    fn test_merge_is_first_wins() {
        let mut primary = IdentityMap::from_header(HEADER);
        let later = IdentityMap::from_header(
            r#"
<SERIES>
<SERIES-ID>S000002839
<SERIES-NAME>Renamed 500 Fund
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C999999999
<CLASS-CONTRACT-NAME>Investor Shares
<CLASS-CONTRACT-TICKER-SYMBOL>VFINX
</CLASS-CONTRACT>
</SERIES>
<SERIES>
<SERIES-ID>S000009999
<SERIES-NAME>Brand New Fund
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000010000
<CLASS-CONTRACT-NAME>Institutional Shares
<CLASS-CONTRACT-TICKER-SYMBOL>BNFIX
</CLASS-CONTRACT>
</SERIES>
"#,
        );

        primary.merge(later);

        assert_eq!(primary.series.get("S000002839").map(String::as_str), Some("Vanguard 500 Index Fund"));
        assert_eq!(primary.classes_by_ticker.get("VFINX").map(String::as_str), Some("C000007772"));
        assert_eq!(primary.series.get("S000009999").map(String::as_str), Some("Brand New Fund"));
        assert_eq!(primary.class_by_name("Brand New Fund", "Institutional Shares"), Some("C000010000"));
    }

    #[test]
    fn test_json_round_trip() {
        let map = IdentityMap::from_header(HEADER);
        let json = serde_json::to_string(&map).expect("serializable");
        assert!(json.contains(r#"["vanguard 500 index fund","etf shares","C000092055"]"#));

        let back: IdentityMap = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, map);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Vanguard\u{a0}500   Index\nFund "), "vanguard 500 index fund");
    }
}
