// src/reconcile/mod.rs
pub mod batch;
pub mod matcher;
pub mod satisfied;

pub use batch::HighlightsBatch;
pub use matcher::Reconciler;
pub use satisfied::SatisfiedSet;
