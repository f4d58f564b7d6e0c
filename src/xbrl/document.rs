// src/xbrl/document.rs
use crate::edgar::models::FactValue;
use crate::xbrl::context::{Context, ContextMap};
use crate::xbrl::convert::parse_date;
use crate::xbrl::index::{RawFact, TagIndex};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::Html;

/// A parsed inline XBRL document: its contexts plus an index of its facts.
#[derive(Debug, Clone)]
pub struct InlineDocument {
    contexts: ContextMap,
    index: TagIndex,
}

impl InlineDocument {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self::from_html(&document)
    }

    pub fn from_html(document: &Html) -> Self {
        InlineDocument {
            contexts: ContextMap::from_html(document),
            index: TagIndex::build(document),
        }
    }

    pub fn contexts(&self) -> &ContextMap {
        &self.contexts
    }

    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    /// Normalized value of `tag_name` in `context_id`, if the document has one.
    pub fn extract(&self, tag_name: &str, context_id: &str, negate_to_positive: bool) -> Option<FactValue> {
        self.index.get(tag_name, context_id)?.value(negate_to_positive)
    }

    pub fn extract_number(&self, tag_name: &str, context_id: &str, negate_to_positive: bool) -> Option<Decimal> {
        self.extract(tag_name, context_id, negate_to_positive)?.as_number()
    }

    /// Text facts only; empty text counts as absent.
    pub fn extract_text(&self, tag_name: &str, context_id: &str) -> Option<String> {
        let value = self.extract(tag_name, context_id, false)?;
        value.as_text().filter(|text| !text.is_empty()).map(str::to_string)
    }

    pub fn extract_date(&self, tag_name: &str, context_id: &str) -> Option<NaiveDate> {
        let fact = self.index.get(tag_name, context_id)?;
        parse_date(&fact.text)
    }

    pub fn facts_named<'a>(&'a self, tag_name: &'a str) -> impl Iterator<Item = &'a RawFact> + 'a {
        self.index.facts_named(tag_name)
    }

    /// Facts named `tag_name` paired with their resolved context.
    /// Facts pointing at an undeclared context are left out.
    pub fn facts_with_context<'a>(
        &'a self,
        tag_name: &'a str,
    ) -> impl Iterator<Item = (&'a RawFact, &'a Context)> + 'a {
        self.index
            .facts_named(tag_name)
            .filter_map(move |fact| self.contexts.get(&fact.context_ref).map(|ctx| (fact, ctx)))
    }

    pub fn base_contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.base_contexts()
    }
}
