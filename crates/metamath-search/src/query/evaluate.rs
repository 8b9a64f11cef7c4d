//! Row and term evaluation against one assertion.

use crate::unify::{matches_expression, matches_statement};

use super::context::AssertionContext;
use super::fields::BoolOp;
use super::matcher::{RowMatcher, SearchRow};

/// Evaluates terms left to right.
///
/// A term followed by OR ends the chain when it is true; any other term ends
/// it when it is false. The value of the last evaluated term is the result.
pub fn evaluate_terms<T>(
    terms: &[T],
    or_follows: impl Fn(&T) -> bool,
    mut matches: impl FnMut(&T) -> bool,
) -> bool {
    let mut result = false;
    for term in terms {
        result = matches(term);
        if result == or_follows(term) {
            break;
        }
    }
    result
}

/// Evaluates one row. Returns `None` when the row has nothing to look at in
/// this assertion, so it takes no part in the row combination.
pub fn evaluate_row(row: &SearchRow, context: &AssertionContext<'_>) -> Option<bool> {
    if !row.in_what.wants(context.assertion()) {
        return None;
    }
    let matched = match &row.matcher {
        RowMatcher::CharStr(terms) | RowMatcher::RegExpr(terms) | RowMatcher::Metamath(terms) => {
            let data = context.strings(row.in_what, row.part);
            evaluate_terms(terms, |t| t.term.or_follows, |t| t.pattern.matches_any(&data))
        }
        RowMatcher::ParseStmt { op, terms } => {
            let trees = context.trees(row.in_what);
            evaluate_terms(
                terms,
                |t| t.term.or_follows,
                |t| trees.iter().any(|tree| matches_statement(*op, tree, &t.tree)),
            )
        }
        RowMatcher::ParseExpr { op, terms } => {
            let trees = context.trees(row.in_what);
            evaluate_terms(
                terms,
                |t| t.term.or_follows,
                |t| trees.iter().any(|tree| matches_expression(*op, tree, &t.tree)),
            )
        }
    };
    Some(matched != row.negated())
}

/// Combines the populated rows with each row's AND/OR link.
///
/// With no populated rows every assertion passes. Otherwise an assertion no
/// row wants fails.
pub fn evaluate_rows(rows: &[SearchRow], context: &AssertionContext<'_>) -> bool {
    if rows.is_empty() {
        return true;
    }
    let mut result = false;
    for row in rows {
        let Some(matched) = evaluate_row(row, context) else {
            continue;
        };
        result = matched;
        let and = row.bool_op == BoolOp::And;
        if matched != and {
            break;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fields::{Format, InWhat, Operator, Part};
    use crate::query::parser::QuotedTerm;
    use crate::test_support::{assertion, ToyGrammar};
    use crate::types::AssertionKind;
    use crate::unify::RelOp;

    fn terms(texts: &[(&str, bool)]) -> Vec<QuotedTerm> {
        texts
            .iter()
            .map(|(text, or)| QuotedTerm {
                text: text.to_string(),
                quote: "'".to_string(),
                or_follows: *or,
            })
            .collect()
    }

    fn row(
        format: Format,
        part: Part,
        operator: Operator,
        bool_op: BoolOp,
        texts: &[(&str, bool)],
    ) -> SearchRow {
        let op = match operator {
            Operator::Rel(op) => Some(op),
            _ => None,
        };
        SearchRow {
            index: 0,
            in_what: InWhat::parse("$ap").unwrap(),
            part,
            operator,
            bool_op,
            matcher: RowMatcher::compile(format, part, op, terms(texts), &ToyGrammar, u32::MAX)
                .unwrap(),
        }
    }

    #[test]
    fn term_chain_short_circuits() {
        let values = [(false, true), (true, false), (false, false)];
        // false OR true AND false
        assert!(!evaluate_terms(&values, |v| v.1, |v| v.0));
        let values = [(true, true), (false, false)];
        assert!(evaluate_terms(&values, |v| v.1, |v| v.0));
        let mut seen = 0;
        let values = [(false, false), (true, false)];
        assert!(!evaluate_terms(&values, |v| v.1, |v| {
            seen += 1;
            v.0
        }));
        assert_eq!(seen, 1);
    }

    #[test]
    fn not_inverts_row() {
        let id = assertion("id", 3, AssertionKind::Theorem, "( ph -> ph )", &[]);
        let context = AssertionContext::new(&id);
        let plain = row(Format::CharStr, Part::Labels, Operator::Blank, BoolOp::And, &[("id", false)]);
        let negated = row(Format::CharStr, Part::Labels, Operator::Not, BoolOp::And, &[("id", false)]);
        assert_eq!(evaluate_row(&plain, &context), Some(true));
        assert_eq!(evaluate_row(&negated, &context), Some(false));
    }

    #[test]
    fn rows_combine_with_and_or() {
        let id = assertion("id", 3, AssertionKind::Theorem, "( ph -> ph )", &[]);
        let context = AssertionContext::new(&id);
        let hit_or = row(Format::CharStr, Part::Labels, Operator::Blank, BoolOp::Or, &[("id", false)]);
        let miss_and = row(Format::CharStr, Part::Labels, Operator::Blank, BoolOp::And, &[("x", false)]);
        let hit_and = row(Format::CharStr, Part::Labels, Operator::Blank, BoolOp::And, &[("id", false)]);

        assert!(evaluate_rows(&[hit_or.clone(), miss_and.clone()], &context));
        assert!(!evaluate_rows(&[miss_and.clone(), hit_and.clone()], &context));
        assert!(!evaluate_rows(&[hit_and.clone(), miss_and], &context));
        assert!(evaluate_rows(&[], &context));
    }

    #[test]
    fn tree_rows_use_unifier() {
        let id = assertion("id", 3, AssertionKind::Theorem, "( ph -> ph )", &[]);
        let context = AssertionContext::new(&id);
        let stmt = row(
            Format::ParseStmt,
            Part::Formulas,
            Operator::Rel(RelOp::Le),
            BoolOp::And,
            &[("( ps -> ps )", false)],
        );
        assert_eq!(evaluate_row(&stmt, &context), Some(true));
        let expr = row(
            Format::ParseExpr,
            Part::Formulas,
            Operator::Rel(RelOp::Ge),
            BoolOp::And,
            &[("( ch -> th )", false)],
        );
        assert_eq!(evaluate_row(&expr, &context), Some(true));
    }

    #[test]
    fn unwanted_rows_are_skipped() {
        let axiom = assertion("ax-1", 1, AssertionKind::Axiom, "( ph -> ( ps -> ph ) )", &[]);
        let context = AssertionContext::new(&axiom);
        let mut theorems_only = row(Format::CharStr, Part::Labels, Operator::Blank, BoolOp::And, &[("ax-1", false)]);
        theorems_only.in_what = InWhat::parse("$p").unwrap();
        assert_eq!(evaluate_row(&theorems_only, &context), None);
        assert!(!evaluate_rows(&[theorems_only], &context));
    }
}
