//! Per-assertion search data, extracted lazily and shared by all rows.

use std::cell::OnceCell;

use crate::tree::ParseTree;
use crate::types::Assertion;

use super::fields::{InWhat, Part};

/// Search data for one assertion.
///
/// Strings are computed on first use so rows that never look at a part
/// (comments, RPN proofs) do not pay for it.
pub struct AssertionContext<'a> {
    assertion: &'a Assertion,
    conclusion: OnceCell<String>,
    comment: OnceCell<String>,
    proof_rpn: OnceCell<String>,
}

impl<'a> AssertionContext<'a> {
    pub fn new(assertion: &'a Assertion) -> Self {
        Self {
            assertion,
            conclusion: OnceCell::new(),
            comment: OnceCell::new(),
            proof_rpn: OnceCell::new(),
        }
    }

    pub fn assertion(&self) -> &'a Assertion {
        self.assertion
    }

    /// Conclusion formula text with one trailing space.
    pub fn conclusion(&self) -> &str {
        self.conclusion
            .get_or_init(|| format!("{} ", self.assertion.formula))
    }

    /// Lower-cased description.
    pub fn comment(&self) -> &str {
        self.comment
            .get_or_init(|| self.assertion.description.to_lowercase())
    }

    /// Proof labels joined by single spaces.
    pub fn proof_rpn(&self) -> &str {
        self.proof_rpn.get_or_init(|| self.assertion.proof.join(" "))
    }

    /// Strings a text row inspects: hypotheses first, then the conclusion.
    pub fn strings(&self, in_what: InWhat, part: Part) -> Vec<&str> {
        let assertion = self.assertion;
        match part {
            Part::Comments => vec![self.comment()],
            Part::LabelsRpn => {
                if in_what.contains(InWhat::THEOREMS) && !assertion.is_axiom() {
                    vec![self.proof_rpn()]
                } else {
                    Vec::new()
                }
            }
            Part::Formulas => self.collect(
                in_what,
                |hyp| hyp.formula.as_str(),
                || self.conclusion(),
            ),
            Part::Labels => self.collect(
                in_what,
                |hyp| hyp.label.as_str(),
                || assertion.label.as_str(),
            ),
        }
    }

    /// Parse trees a tree row inspects, in the same order as [`Self::strings`].
    pub fn trees(&self, in_what: InWhat) -> Vec<&'a ParseTree> {
        let assertion = self.assertion;
        let mut trees = Vec::with_capacity(assertion.hyp_count() + 1);
        if in_what.wants_hyps() {
            trees.extend(assertion.hyps.iter().map(|hyp| &hyp.tree));
        }
        if in_what.wants_statement() {
            trees.push(&assertion.tree);
        }
        trees
    }

    fn collect<'s>(
        &'s self,
        in_what: InWhat,
        hyp_value: impl Fn(&'a crate::types::LogHyp) -> &'a str,
        conclusion: impl FnOnce() -> &'s str,
    ) -> Vec<&'s str> {
        let mut values: Vec<&'s str> = Vec::with_capacity(self.assertion.hyp_count() + 1);
        if in_what.wants_hyps() {
            for hyp in &self.assertion.hyps {
                values.push(hyp_value(hyp));
            }
        }
        if in_what.wants_statement() {
            values.push(conclusion());
        }
        values
    }
}
