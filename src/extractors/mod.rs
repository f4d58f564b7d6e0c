// src/extractors/mod.rs
pub mod fees;
pub mod finhigh;
pub mod performance;

// Re-export key extraction entry points for convenience
pub use fees::extract_fee_schedules;
pub use finhigh::{
    classify_label,
    locate_highlight_tables,
    parse_financial_highlights_table,
    parse_table_element,
    validate_nav_rollforward,
    LocatedTable,
    RowRole,
};
pub use performance::{extract_performance, ReturnPeriod};
