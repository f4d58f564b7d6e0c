// src/lib.rs
//! Fund filing fact extraction: SGML header identities, inline XBRL facts,
//! Financial Highlights tables and class-id reconciliation.

pub mod edgar;
pub mod extractors;
pub mod reconcile;
pub mod storage;
pub mod utils;
pub mod xbrl;

pub use edgar::header::IdentityMap;
pub use edgar::models::{
    FactValue, FeeSchedule, FinancialHighlightsRecord, MatchStrategy, PerformanceRecord, ReconciledHighlights,
    ReconciliationResult,
};
pub use reconcile::{HighlightsBatch, Reconciler, SatisfiedSet};
pub use utils::error::{AppError, ExtractError, StorageError};
pub use xbrl::InlineDocument;
