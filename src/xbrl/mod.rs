// src/xbrl/mod.rs
pub mod context;
pub mod convert;
pub mod document;
pub mod index;

pub use context::{Context, ContextMap, ContextPeriod};
pub use document::InlineDocument;
pub use index::{FactKind, RawFact, TagIndex};
