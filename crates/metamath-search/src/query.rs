//! Query fields, term parsing, compilation and row matching.
//!
//! This module turns a [`RawQuery`] into a [`CompiledQuery`]:
//! - Field types and choice values (`fields`)
//! - Search term parsing (`parser`)
//! - Text, regex and wildcard term patterns (`text_match`)
//! - Grammar-parsed tree terms (`parsed_term`)
//! - Row matchers and evaluation against an assertion

mod compile;
mod context;
mod evaluate;
mod excl_labels;
mod fields;
mod matcher;
mod parsed_term;
mod parser;
mod text_match;

pub use compile::CompiledQuery;
pub use context::AssertionContext;
pub use evaluate::{evaluate_row, evaluate_rows, evaluate_terms};
pub use excl_labels::{ExclLabels, ExclLabelsError};
pub use fields::{
    BoolOp, Format, InWhat, Operator, Part, RawQuery, RawRow, SearchField, ROW_COUNT,
};
pub use matcher::{RowMatcher, SearchRow, TermCompileError, TextTerm, TreeTerm};
pub use parsed_term::{parse_expression, parse_statement, ParsedTermError};
pub use parser::{parse_terms, render_terms, QuotedTerm, TermParseError, TermSyntax};
pub use text_match::{metamath_to_regex, TextPattern};
