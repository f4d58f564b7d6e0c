// src/reconcile/batch.rs
use crate::edgar::header::IdentityMap;
use crate::edgar::models::ReconciledHighlights;
use crate::extractors::finhigh::{locate_highlight_tables, parse_table_element};
use crate::reconcile::matcher::Reconciler;
use crate::reconcile::satisfied::SatisfiedSet;
use scraper::Html;
use std::collections::HashSet;

/// One pass of Financial Highlights reconciliation over a caller-ordered
/// sequence of documents. Earlier documents win for a given class and period.
pub struct HighlightsBatch<'a> {
    reconciler: Reconciler<'a>,
    satisfied: &'a mut SatisfiedSet,
    needed: Option<HashSet<String>>,
    documents_processed: usize,
}

impl<'a> HighlightsBatch<'a> {
    pub fn new(identities: &'a IdentityMap, satisfied: &'a mut SatisfiedSet) -> Self {
        Self {
            reconciler: Reconciler::new(identities),
            satisfied,
            needed: None,
            documents_processed: 0,
        }
    }

    /// Restricts output to the given class ids.
    pub fn with_needed<I, S>(mut self, class_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needed = Some(class_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Parses every highlights table in `html` and returns the records this
    /// document is the first to supply.
    pub fn process_document(&mut self, html: &str) -> Vec<ReconciledHighlights> {
        self.documents_processed += 1;
        let document = Html::parse_document(html);
        let mut emitted = Vec::new();

        for located in locate_highlight_tables(&document) {
            let record = match parse_table_element(located.table) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!("Skipping table under {:?}: {}", located.fund_name, e);
                    continue;
                }
            };

            let Some(matched) = self
                .reconciler
                .reconcile(located.fund_name.as_deref(), located.class_label.as_deref())
            else {
                continue;
            };

            if let Some(needed) = &self.needed {
                if !needed.contains(&matched.class_id) {
                    tracing::debug!("Class {} not requested, skipping", matched.class_id);
                    continue;
                }
            }

            if !self.satisfied.try_claim(&matched.class_id, record.fiscal_year_end) {
                tracing::debug!(
                    "Class {} period {:?} already satisfied, skipping",
                    matched.class_id,
                    record.fiscal_year_end
                );
                continue;
            }

            tracing::info!(
                "Matched highlights for class {} ({:?}, period {:?})",
                matched.class_id,
                matched.strategy,
                record.fiscal_year_end
            );
            emitted.push(ReconciledHighlights {
                class_id: matched.class_id,
                strategy: matched.strategy,
                fund_name: located.fund_name,
                class_label: located.class_label,
                record,
            });
        }

        emitted
    }

    /// True once every needed class id is bound for at least one period.
    /// Without a needed set there is no stopping point.
    pub fn is_complete(&self) -> bool {
        self.needed
            .as_ref()
            .is_some_and(|needed| self.satisfied.remaining(needed).is_empty())
    }

    pub fn documents_processed(&self) -> usize {
        self.documents_processed
    }
}
