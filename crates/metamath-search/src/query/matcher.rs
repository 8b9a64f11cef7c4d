//! Compiled search rows.
//!
//! Each populated row compiles into a [`SearchRow`] holding a format-specific
//! [`RowMatcher`]. Compilation runs once per search; rows are read-only while
//! the driver evaluates them.

use crate::host::Grammar;
use crate::tree::ParseTree;
use crate::unify::RelOp;

use super::fields::{BoolOp, Format, InWhat, Operator, Part};
use super::parsed_term::{parse_expression, parse_statement, ParsedTermError};
use super::parser::QuotedTerm;
use super::text_match::TextPattern;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermCompileError {
    #[error("Failed compilation as a Regular Expression. Text = {text}. System message = {message}")]
    Regex { text: String, message: String },
    #[error("Failed expression parse. Text = {text}. Detailed message = {reason}")]
    Expression {
        text: String,
        reason: ParsedTermError,
    },
    #[error("Failed statement parse. Text = {text}. Detailed message = {reason}")]
    Statement {
        text: String,
        reason: ParsedTermError,
    },
}

#[derive(Debug, Clone)]
pub struct TextTerm {
    pub term: QuotedTerm,
    pub pattern: TextPattern,
}

#[derive(Debug, Clone)]
pub struct TreeTerm {
    pub term: QuotedTerm,
    pub tree: ParseTree,
}

/// Format-specific compiled terms of a row.
#[derive(Debug, Clone)]
pub enum RowMatcher {
    CharStr(Vec<TextTerm>),
    RegExpr(Vec<TextTerm>),
    Metamath(Vec<TextTerm>),
    ParseExpr { op: RelOp, terms: Vec<TreeTerm> },
    ParseStmt { op: RelOp, terms: Vec<TreeTerm> },
}

impl RowMatcher {
    /// Compiles every term of a row. Stops at the first term that fails.
    ///
    /// `op` must already be validated against the format: relational for
    /// tree formats.
    pub fn compile(
        format: Format,
        part: Part,
        op: Option<RelOp>,
        terms: Vec<QuotedTerm>,
        grammar: &dyn Grammar,
        max_seq: u32,
    ) -> Result<Self, TermCompileError> {
        match format {
            Format::CharStr | Format::RegExpr | Format::Metamath => {
                let compiled = compile_text_terms(format, part, terms)?;
                Ok(match format {
                    Format::CharStr => Self::CharStr(compiled),
                    Format::RegExpr => Self::RegExpr(compiled),
                    _ => Self::Metamath(compiled),
                })
            }
            Format::ParseExpr => {
                let mut compiled = Vec::with_capacity(terms.len());
                for term in terms {
                    let tree = parse_expression(grammar, &term.text, max_seq).map_err(|reason| {
                        TermCompileError::Expression {
                            text: term.text.clone(),
                            reason,
                        }
                    })?;
                    compiled.push(TreeTerm { term, tree });
                }
                Ok(Self::ParseExpr {
                    op: op.unwrap_or(RelOp::Le),
                    terms: compiled,
                })
            }
            Format::ParseStmt => {
                let mut compiled = Vec::with_capacity(terms.len());
                for term in terms {
                    let tree = parse_statement(grammar, &term.text, max_seq).map_err(|reason| {
                        TermCompileError::Statement {
                            text: term.text.clone(),
                            reason,
                        }
                    })?;
                    compiled.push(TreeTerm { term, tree });
                }
                Ok(Self::ParseStmt {
                    op: op.unwrap_or(RelOp::Le),
                    terms: compiled,
                })
            }
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::CharStr(_) => Format::CharStr,
            Self::RegExpr(_) => Format::RegExpr,
            Self::Metamath(_) => Format::Metamath,
            Self::ParseExpr { .. } => Format::ParseExpr,
            Self::ParseStmt { .. } => Format::ParseStmt,
        }
    }

    pub fn terms(&self) -> Vec<&QuotedTerm> {
        match self {
            Self::CharStr(terms) | Self::RegExpr(terms) | Self::Metamath(terms) => {
                terms.iter().map(|t| &t.term).collect()
            }
            Self::ParseExpr { terms, .. } | Self::ParseStmt { terms, .. } => {
                terms.iter().map(|t| &t.term).collect()
            }
        }
    }
}

fn compile_text_terms(
    format: Format,
    part: Part,
    terms: Vec<QuotedTerm>,
) -> Result<Vec<TextTerm>, TermCompileError> {
    terms
        .into_iter()
        .map(|term| -> Result<TextTerm, TermCompileError> {
            let pattern = TextPattern::compile(format, part, &term.text).map_err(|error| {
                TermCompileError::Regex {
                    text: term.text.clone(),
                    message: error.to_string(),
                }
            })?;
            Ok(TextTerm { term, pattern })
        })
        .collect()
}

/// One compiled, non-empty search row.
#[derive(Debug, Clone)]
pub struct SearchRow {
    pub index: usize,
    pub in_what: InWhat,
    pub part: Part,
    pub operator: Operator,
    pub bool_op: BoolOp,
    pub matcher: RowMatcher,
}

impl SearchRow {
    pub fn negated(&self) -> bool {
        self.operator == Operator::Not
    }
}
