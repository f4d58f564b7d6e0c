// src/edgar/mod.rs
pub mod header;
pub mod models;

pub use header::{normalize_name, IdentityMap};
