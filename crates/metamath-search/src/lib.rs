//! Assertion search over a Metamath database.
//!
//! This crate provides the search core:
//! - Query fields, term parsing and compilation
//! - Text, regex, wildcard and parse-tree matchers with relational operators
//! - A skip-sequential driver with extended search, time limit and cancellation
//! - Sorted result lists with display lines and statistics
//!
//! The database, grammar and proof-step unifier are supplied by the host
//! through the traits in [`host`].

pub mod cancel;
pub mod config;
pub mod error;
pub mod host;
pub mod query;
pub mod search;
pub mod tree;
pub mod types;
pub mod unify;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use cancel::{CancellationToken, SearchVersionTracker};
pub use config::{FieldRegistry, SearchDefaults};
pub use error::{FieldError, Result, ReturnCode, SearchError};
pub use host::{
    BookIndex, Grammar, LabelResolver, SearchContext, SearchHost, StepMatch, StepUnifier,
};
pub use query::{CompiledQuery, RawQuery, SearchField};
pub use search::{SearchHit, SearchManager, SearchOutput, SearchStats, SortOrder};
pub use tree::{ParseTree, TreeBuilder};
pub use types::{Assertion, AssertionKind, ProofStep, ReferenceStatement};
pub use unify::RelOp;
