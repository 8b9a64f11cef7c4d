//! Assertion search.
//!
//! This module provides:
//! - The main SearchManager API (worker thread, time limit, cancellation)
//! - The skip-sequential driver and extended search
//! - Result storage, sorting and display lines

mod engine;
mod extended;
mod format;
mod manager;
mod output;
mod progress;
mod store;


// Re-export main types
pub use engine::{bucket_start, execute, execute_with, scan, ScanBounds, ScanOutcome};
pub use format::LineFormatter;
pub use manager::SearchManager;
pub use output::{log_stats, SearchHit, SearchOutput, SearchStats};
pub use progress::ScanProgress;
pub use store::{
    FinalResults, ResultStore, SelectionItem, SortOrder, END_OF_RESULTS_LINE, MORE_RESULTS_LINE,
    SCORE_COMPLETED, SCORE_PARTIAL, SCORE_TRAILER,
};
