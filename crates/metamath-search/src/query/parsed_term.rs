//! Grammar-parsed search terms for the ParseExpr and ParseStmt formats.

use crate::error::GrammarError;
use crate::host::Grammar;
use crate::tree::ParseTree;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParsedTermError {
    #[error("Work variables not allowed in search terms.")]
    WorkVariable,
    #[error("Error parsing expression. Could not find matching syntax type code.")]
    NoSyntaxType,
    #[error("{0}")]
    Grammar(#[from] GrammarError),
}

/// Parses a statement term. The text omits the provable type code.
pub fn parse_statement(
    grammar: &dyn Grammar,
    text: &str,
    max_seq: u32,
) -> Result<ParseTree, ParsedTermError> {
    reject_work_variables(grammar, text)?;
    Ok(grammar.parse_formula(grammar.provable_type(), text, max_seq)?)
}

/// Parses an expression term, trying the provable type and then every
/// syntax type until one parses.
pub fn parse_expression(
    grammar: &dyn Grammar,
    text: &str,
    max_seq: u32,
) -> Result<ParseTree, ParsedTermError> {
    reject_work_variables(grammar, text)?;
    let provable = grammar.provable_type();
    if let Ok(tree) = grammar.parse_formula(provable, text, max_seq) {
        return Ok(tree);
    }
    for typ in grammar.syntax_types() {
        if typ == provable {
            continue;
        }
        match grammar.parse_formula(&typ, text, max_seq) {
            Ok(tree) => return Ok(tree),
            // symbol scope violations hold for every type
            Err(error @ GrammarError::OutOfScope(_)) => return Err(error.into()),
            Err(GrammarError::Parse(_)) => {}
        }
    }
    Err(ParsedTermError::NoSyntaxType)
}

fn reject_work_variables(grammar: &dyn Grammar, text: &str) -> Result<(), ParsedTermError> {
    if text
        .split_whitespace()
        .any(|token| grammar.is_work_variable(token))
    {
        return Err(ParsedTermError::WorkVariable);
    }
    Ok(())
}
