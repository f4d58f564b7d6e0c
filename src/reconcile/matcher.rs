// src/reconcile/matcher.rs
use crate::edgar::header::{normalize_name, IdentityMap};
use crate::edgar::models::{MatchStrategy, ReconciliationResult};

/// Names at or below this length substring-match too easily; such matches
/// are kept but logged.
const SHORT_NAME_LEN: usize = 3;

/// Binds document-local fund/class text to canonical class ids.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    identities: &'a IdentityMap,
}

impl<'a> Reconciler<'a> {
    pub fn new(identities: &'a IdentityMap) -> Self {
        Self { identities }
    }

    /// Tries exact name pair, then bidirectional substring, then ticker
    /// containment. `None` means the record belongs to no known class.
    ///
    /// Name-based rules need both a fund name and a class label; with either
    /// missing only the ticker rule can match.
    pub fn reconcile(&self, fund_name: Option<&str>, class_label: Option<&str>) -> Option<ReconciliationResult> {
        let fund = fund_name.map(normalize_name).filter(|s| !s.is_empty());
        let class = class_label.map(normalize_name).filter(|s| !s.is_empty());

        if let (Some(fund), Some(class)) = (&fund, &class) {
            if let Some(result) = self.exact(fund, class).or_else(|| self.substring(fund, class)) {
                return Some(result);
            }
        }

        let result = self.ticker(fund_name, class_label);
        if result.is_none() {
            tracing::debug!("No class match for fund {:?} / class {:?}", fund_name, class_label);
        }
        result
    }

    fn exact(&self, fund: &str, class: &str) -> Option<ReconciliationResult> {
        self.identities
            .classes_by_name
            .get(&(fund.to_string(), class.to_string()))
            .map(|class_id| matched(class_id, MatchStrategy::Exact))
    }

    fn substring(&self, fund: &str, class: &str) -> Option<ReconciliationResult> {
        let ((series_name, class_name), class_id) = self
            .identities
            .classes_by_name
            .iter()
            .find(|((series_name, class_name), _)| {
                overlaps(fund, series_name) && overlaps(class, class_name)
            })?;

        if [fund, class, series_name.as_str(), class_name.as_str()]
            .iter()
            .any(|name| name.len() <= SHORT_NAME_LEN)
        {
            tracing::warn!(
                "Substring match on a short name: '{}' / '{}' matched '{}' / '{}' ({})",
                fund,
                class,
                series_name,
                class_name,
                class_id
            );
        }
        Some(matched(class_id, MatchStrategy::Substring))
    }

    /// Longer tickers are tried first so `VOO` wins over `VO`.
    fn ticker(&self, fund_name: Option<&str>, class_label: Option<&str>) -> Option<ReconciliationResult> {
        let mut tickers: Vec<(&String, &String)> = self.identities.classes_by_ticker.iter().collect();
        tickers.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        tickers
            .into_iter()
            .find(|(ticker, _)| {
                [fund_name, class_label]
                    .iter()
                    .flatten()
                    .any(|text| text.contains(ticker.as_str()))
            })
            .map(|(_, class_id)| matched(class_id, MatchStrategy::Ticker))
    }
}

fn overlaps(candidate: &str, stored: &str) -> bool {
    candidate.contains(stored) || stored.contains(candidate)
}

fn matched(class_id: &str, strategy: MatchStrategy) -> ReconciliationResult {
    ReconciliationResult { class_id: class_id.to_string(), strategy }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"
<SERIES>
<SERIES-ID>S000002839
<SERIES-NAME>Vanguard 500 Index Fund
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000123456
<CLASS-CONTRACT-NAME>Investor Shares
<CLASS-CONTRACT-TICKER-SYMBOL>VFINX
</CLASS-CONTRACT>
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000123457
<CLASS-CONTRACT-NAME>ETF Shares
<CLASS-CONTRACT-TICKER-SYMBOL>VOO
</CLASS-CONTRACT>
</SERIES>
<SERIES>
<SERIES-ID>S000002900
<SERIES-NAME>Vanguard Mid-Cap Index Fund
<CLASS-CONTRACT>
<CLASS-CONTRACT-ID>C000200000
<CLASS-CONTRACT-NAME>ETF Shares
<CLASS-CONTRACT-TICKER-SYMBOL>VO
</CLASS-CONTRACT>
</SERIES>
"#;

    fn identities() -> IdentityMap {
        IdentityMap::from_header(HEADER)
    }

    #[test]
    fn test_exact_match() {
        let map = identities();
        let result = Reconciler::new(&map)
            .reconcile(Some("Vanguard 500 Index Fund"), Some("Investor Shares"))
            .expect("match");
        assert_eq!(result.class_id, "C000123456");
        assert_eq!(result.strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_substring_match_both_directions() {
        let map = identities();
        let reconciler = Reconciler::new(&map);

        // Candidate is a superstring of the stored series name
        let result = reconciler
            .reconcile(Some("VANGUARD 500 INDEX FUND Annual Report"), Some("Investor Shares"))
            .expect("match");
        assert_eq!(result.class_id, "C000123456");
        assert_eq!(result.strategy, MatchStrategy::Substring);

        // Candidate is a substring of the stored names
        let result = reconciler.reconcile(Some("500 Index"), Some("Investor")).expect("match");
        assert_eq!(result.class_id, "C000123456");
        assert_eq!(result.strategy, MatchStrategy::Substring);
    }

    #[test]
    fn test_ticker_fallback_prefers_longest_ticker() {
        let map = identities();
        let reconciler = Reconciler::new(&map);

        let result = reconciler
            .reconcile(Some("S&P 500 ETF (VOO)"), Some("Unknown Class"))
            .expect("match");
        assert_eq!(result.class_id, "C000123457");
        assert_eq!(result.strategy, MatchStrategy::Ticker);

        let result = reconciler.reconcile(None, Some("Ticker: VO")).expect("match");
        assert_eq!(result.class_id, "C000200000");
    }

    #[test]
    fn test_missing_class_label_skips_name_rules() {
        let map = identities();
        let reconciler = Reconciler::new(&map);

        assert_eq!(reconciler.reconcile(Some("Vanguard 500 Index Fund"), None), None);
        assert_eq!(reconciler.reconcile(Some("Vanguard 500 Index Fund"), Some("  ")), None);
    }

    #[test]
    fn test_no_match() {
        let map = identities();
        let reconciler = Reconciler::new(&map);
        assert_eq!(reconciler.reconcile(Some("Other Trust"), Some("Class Z Shares")), None);
        assert_eq!(reconciler.reconcile(None, None), None);
    }
}
