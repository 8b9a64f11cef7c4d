//! Display lines for selected assertions.
//!
//! ```text
//! (*) mpd Modus ponens deduction.
//!     ::= |- ( ph -> ps )
//!     &&  |- ( ph -> ( ps -> ch ) )
//!     ==> |- ( ph -> ch )
//! ```

use crate::host::{Grammar, StepMatch};
use crate::tree::ParseTree;
use crate::types::Assertion;

use super::store::SCORE_COMPLETED;

pub const INDENT: &str = "    ";
pub const DEFINES: &str = " ::= ";
pub const AND_HYP: &str = " &&  ";
pub const IMPLIES: &str = " ==> ";
pub const FILLED_BY: &str = " <= ";
pub const COMPLETED_MARKER: &str = "(*) ";

/// Formats assertions into display lines according to the Comments and
/// Substitutions options.
#[derive(Clone, Copy)]
pub struct LineFormatter<'a> {
    grammar: &'a dyn Grammar,
    comments: bool,
    substitutions: bool,
}

impl<'a> LineFormatter<'a> {
    pub fn new(grammar: &'a dyn Grammar, comments: bool, substitutions: bool) -> Self {
        Self {
            grammar,
            comments,
            substitutions,
        }
    }

    pub fn lines(
        &self,
        assertion: &Assertion,
        score: i32,
        step_match: Option<&StepMatch>,
    ) -> Vec<String> {
        let marker = if score == SCORE_COMPLETED {
            COMPLETED_MARKER
        } else {
            ""
        };
        let step_match = step_match.filter(|_| self.substitutions);
        let conclusion = self.formula(&assertion.formula, &assertion.tree, step_match);

        let mut lines = Vec::with_capacity(assertion.hyp_count() + 2);
        let description = self.description(assertion);
        let first_prefix = match description {
            Some(description) => {
                lines.push(format!("{marker}{} {description}", assertion.label));
                INDENT.to_string()
            }
            None => format!("{marker}{}", assertion.label),
        };

        let Some((first, rest)) = assertion.hyps.split_first() else {
            lines.push(format!("{first_prefix}{DEFINES}{conclusion}"));
            return lines;
        };
        lines.push(format!(
            "{first_prefix}{DEFINES}{}",
            self.formula(&first.formula, &first.tree, step_match)
        ));
        for hyp in rest {
            lines.push(format!(
                "{INDENT}{AND_HYP}{}",
                self.formula(&hyp.formula, &hyp.tree, step_match)
            ));
        }
        lines.push(format!("{INDENT}{IMPLIES}{conclusion}"));
        lines
    }

    /// The line recording which step or assertion discharged a hypothesis.
    pub fn filler_line(label: &str) -> String {
        format!("{INDENT}{FILLED_BY}{label}")
    }

    fn description(&self, assertion: &Assertion) -> Option<String> {
        if !self.comments {
            return None;
        }
        let words: Vec<&str> = assertion.description.split_whitespace().collect();
        (!words.is_empty()).then(|| words.join(" "))
    }

    fn formula(&self, text: &str, tree: &ParseTree, step_match: Option<&StepMatch>) -> String {
        match step_match {
            Some(matched) if !matched.substitution.is_empty() => {
                let applied = matched.substitution.apply(tree);
                format!(
                    "{} {}",
                    self.grammar.provable_type(),
                    self.grammar.render(&applied)
                )
            }
            _ => text.to_string(),
        }
    }
}
