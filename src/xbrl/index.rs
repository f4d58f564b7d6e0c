// src/xbrl/index.rs
use crate::edgar::models::FactValue;
use crate::xbrl::convert::{collapse_whitespace, convert_numeric, strip_html_to_text, NumericAttrs};
use scraper::{ElementRef, Html};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    /// `ix:nonFraction`
    Numeric,
    /// `ix:nonNumeric`
    Text,
}

/// An inline fact element captured with the attributes conversion needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFact {
    pub kind: FactKind,
    pub name: String,
    pub context_ref: String,
    pub text: String,
    pub scale: Option<String>,
    pub format: Option<String>,
    pub sign: Option<String>,
    pub escape: bool,
}

impl RawFact {
    fn from_element(element: ElementRef<'_>) -> Option<Self> {
        let kind = match element.value().name() {
            "ix:nonfraction" => FactKind::Numeric,
            "ix:nonnumeric" => FactKind::Text,
            _ => return None,
        };
        let attr = |name: &str| element.value().attr(name).map(str::to_string);

        Some(RawFact {
            kind,
            name: attr("name")?,
            context_ref: attr("contextref")?,
            text: element.text().collect(),
            scale: attr("scale"),
            format: attr("format"),
            sign: attr("sign"),
            escape: element
                .value()
                .attr("escape")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        })
    }

    pub fn numeric_attrs(&self) -> NumericAttrs<'_> {
        NumericAttrs::new(self.scale.as_deref(), self.format.as_deref(), self.sign.as_deref())
    }

    /// Normalizes this fact. Numeric facts go through the value converter;
    /// text facts are whitespace-collapsed, with any escaped markup removed.
    pub fn value(&self, negate_to_positive: bool) -> Option<FactValue> {
        match self.kind {
            FactKind::Numeric => {
                convert_numeric(&self.text, &self.numeric_attrs(), negate_to_positive).map(FactValue::Number)
            }
            FactKind::Text => {
                let text = if self.escape && self.text.contains('<') {
                    strip_html_to_text(&self.text)
                } else {
                    collapse_whitespace(&self.text)
                };
                Some(FactValue::Text(text))
            }
        }
    }
}

/// All inline facts of a document keyed by (tag name, context id).
/// The first element for a key wins; document order is kept for scans.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    facts: Vec<RawFact>,
    by_key: HashMap<(String, String), usize>,
}

impl TagIndex {
    /// One linear pass over the document's `ix:nonFraction`/`ix:nonNumeric` elements.
    pub fn build(document: &Html) -> Self {
        let mut index = TagIndex::default();
        for fact in document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(RawFact::from_element)
        {
            let key = (fact.name.clone(), fact.context_ref.clone());
            if index.by_key.contains_key(&key) {
                continue;
            }
            index.by_key.insert(key, index.facts.len());
            index.facts.push(fact);
        }
        tracing::debug!("Indexed {} inline facts", index.facts.len());
        index
    }

    pub fn get(&self, tag_name: &str, context_id: &str) -> Option<&RawFact> {
        self.by_key
            .get(&(tag_name.to_string(), context_id.to_string()))
            .map(|&idx| &self.facts[idx])
    }

    /// Facts carrying `tag_name`, one per context, in document order.
    pub fn facts_named<'a>(&'a self, tag_name: &'a str) -> impl Iterator<Item = &'a RawFact> + 'a {
        self.facts.iter().filter(move |fact| fact.name == tag_name)
    }

    /// Every indexed fact in document order.
    pub fn iter(&self) -> impl Iterator<Item = &RawFact> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
