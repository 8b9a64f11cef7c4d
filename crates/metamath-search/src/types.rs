//! Read-only views of the logic system handed to the search core.
//!
//! The host owns the assertion database; the search only borrows these values
//! for the duration of one run.

use serde::{Deserialize, Serialize};

use crate::tree::ParseTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionKind {
    Axiom,
    Theorem,
}

impl AssertionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Axiom => "axiom",
            Self::Theorem => "theorem",
        }
    }
}

/// A logical hypothesis (`$e`) of an assertion.
#[derive(Debug, Clone)]
pub struct LogHyp {
    pub label: String,
    pub formula: String,
    pub tree: ParseTree,
}

/// An axiom or theorem.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub label: String,
    /// Position in the database; strictly increasing in declaration order.
    pub seq: u32,
    pub kind: AssertionKind,
    pub chapter: u32,
    pub section: u32,
    /// Comment text preceding the statement.
    pub description: String,
    /// Conclusion formula text, e.g. `|- ( ph -> ph )`.
    pub formula: String,
    pub tree: ParseTree,
    pub hyps: Vec<LogHyp>,
    /// Number of proofs referencing this assertion.
    pub proof_refs: u32,
    /// Proof labels in RPN order; empty for axioms.
    pub proof: Vec<String>,
}

impl Assertion {
    pub fn hyp_count(&self) -> usize {
        self.hyps.len()
    }

    pub fn is_axiom(&self) -> bool {
        self.kind == AssertionKind::Axiom
    }

    /// Number of symbols in the conclusion formula.
    pub fn formula_len(&self) -> usize {
        self.formula.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub number: u32,
    pub title: String,
    pub min_seq: u32,
    pub max_seq: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section number as stored on statements; may encode the statement kind.
    pub number: u32,
    pub chapter: u32,
    pub title: String,
    pub min_seq: u32,
    pub max_seq: u32,
}

/// The statement a search is performed "for": only assertions declared
/// before it are eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceStatement {
    pub label: String,
    pub seq: u32,
    pub chapter: u32,
    pub section: u32,
}

/// A proof step usable as a hypothesis.
#[derive(Debug, Clone)]
pub struct StepHyp {
    pub step: String,
    pub formula: String,
    pub tree: ParseTree,
}

/// The in-progress derivation step a step search is constrained by.
#[derive(Debug, Clone)]
pub struct ProofStep {
    pub step: String,
    pub formula: String,
    /// Absent when the step formula is still entirely unknown.
    pub tree: Option<ParseTree>,
    /// Declared hypothesis slots; `None` marks a `?` wildcard slot.
    pub hyps: Vec<Option<StepHyp>>,
    /// Earlier steps of the proof, oldest first.
    pub prior_steps: Vec<StepHyp>,
}

impl ProofStep {
    pub fn concrete_hyps(&self) -> impl Iterator<Item = &StepHyp> {
        self.hyps.iter().flatten()
    }

    pub fn concrete_hyp_count(&self) -> usize {
        self.concrete_hyps().count()
    }

    /// True when the step declares fewer concrete hypotheses than slots.
    pub fn has_hyp_wildcards(&self) -> bool {
        self.concrete_hyp_count() < self.hyps.len()
    }
}
