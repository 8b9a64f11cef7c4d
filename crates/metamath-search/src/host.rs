//! Collaborator contracts implemented by the hosting proof assistant.
//!
//! The search core never owns the logic system. Everything it needs is reached
//! through the traits below and bundled per run in a [`SearchContext`].
//! [`SearchHost`] is the owned form handed to the search manager, whose worker
//! thread may outlive the call that started it.

use std::sync::Arc;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::error::{GrammarError, StepUnifyError};
use crate::tree::ParseTree;
use crate::types::{Assertion, Chapter, ProofStep, ReferenceStatement, Section, StepHyp};

/// Formula grammar and parser of the logic system.
pub trait Grammar: Send + Sync {
    /// Type code of provable statements (`|-` in set.mm).
    fn provable_type(&self) -> &str;

    /// Type codes that head syntax axioms, in the order they should be tried.
    fn syntax_types(&self) -> Vec<String>;

    fn is_work_variable(&self, symbol: &str) -> bool;

    /// Parses `text` as a formula of type `typ`, using only symbols declared
    /// before sequence number `max_seq`.
    fn parse_formula(&self, typ: &str, text: &str, max_seq: u32)
        -> Result<ParseTree, GrammarError>;

    /// Renders a tree back to formula text.
    fn render(&self, tree: &ParseTree) -> String;
}

/// Which reachability table to filter with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyKind {
    #[serde(rename = "Chap/Direct")]
    ChapterDirect,
    #[serde(rename = "Chap/Indir.")]
    ChapterIndirect,
    #[serde(rename = "Sec/Direct")]
    SectionDirect,
    #[serde(rename = "Sec/Indir.")]
    SectionIndirect,
}

impl HierarchyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChapterDirect => "Chap/Direct",
            Self::ChapterIndirect => "Chap/Indir.",
            Self::SectionDirect => "Sec/Direct",
            Self::SectionIndirect => "Sec/Indir.",
        }
    }

    pub fn by_chapter(self) -> bool {
        matches!(self, Self::ChapterDirect | Self::ChapterIndirect)
    }
}

/// Chapter/section metadata and precomputed proof-dependency reachability.
pub trait BookIndex: Send + Sync {
    fn resolve_chapter(&self, text: &str) -> Option<Chapter>;

    fn resolve_section(&self, text: &str) -> Option<Section>;

    /// Maps a statement's section number to the section it was declared in.
    fn canonical_section(&self, section: u32) -> u32;

    /// Reachability sets indexed by chapter number (chapter kinds) or
    /// canonical section number (section kinds).
    fn dependencies(&self, kind: HierarchyKind) -> &[RoaringBitmap];
}

/// Label lookup for statements outside the sorted assertion list.
pub trait LabelResolver: Send + Sync {
    fn resolve(&self, label: &str) -> Option<ReferenceStatement>;
}

/// Variable substitution produced by the step unifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    entries: Vec<(String, ParseTree)>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: impl Into<String>, tree: ParseTree) {
        let var = var.into();
        match self.entries.iter_mut().find(|(name, _)| *name == var) {
            Some(entry) => entry.1 = tree,
            None => self.entries.push((var, tree)),
        }
    }

    pub fn get(&self, var: &str) -> Option<&ParseTree> {
        self.entries
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, tree)| tree)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParseTree)> {
        self.entries.iter().map(|(name, tree)| (name.as_str(), tree))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the substitution to `tree`; unbound variables are kept.
    pub fn apply(&self, tree: &ParseTree) -> ParseTree {
        tree.substitute(&|var| self.get(var))
    }
}

/// Outcome of unifying an assertion with the designated proof step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatch {
    pub substitution: Substitution,
    /// Indexes into `Assertion::hyps` not matched by any concrete step hypothesis.
    pub unmatched_hyps: Vec<usize>,
}

impl StepMatch {
    pub fn is_complete(&self) -> bool {
        self.unmatched_hyps.is_empty()
    }
}

/// Candidate used by extended search to discharge an unmatched hypothesis.
#[derive(Debug, Clone, Copy)]
pub enum Filler<'a> {
    PriorStep(&'a StepHyp),
    Assertion(&'a Assertion),
}

impl Filler<'_> {
    pub fn label(&self) -> &str {
        match self {
            Self::PriorStep(step) => &step.step,
            Self::Assertion(assertion) => &assertion.label,
        }
    }
}

/// The host's proof-step unifier, with work variable support.
pub trait StepUnifier: Send + Sync {
    /// Unifies `assertion` with the step formula and its concrete hypotheses.
    ///
    /// Returns `Ok(None)` when they do not unify. Assertion hypotheses left
    /// over for wildcard slots are reported in `StepMatch::unmatched_hyps`.
    fn unify_step(
        &self,
        assertion: &Assertion,
        step: &ProofStep,
    ) -> Result<Option<StepMatch>, StepUnifyError>;

    /// Tries to discharge hypothesis `hyp_index` of `assertion` with `filler`,
    /// consistently with the bindings already in `current`.
    fn fill_hypothesis(
        &self,
        assertion: &Assertion,
        current: &StepMatch,
        hyp_index: usize,
        filler: Filler<'_>,
    ) -> Result<Option<StepMatch>, StepUnifyError>;
}

/// Step-search mode: the designated step plus the unifier to test it with.
#[derive(Clone, Copy)]
pub struct StepSearch<'a> {
    pub step: &'a ProofStep,
    pub unifier: &'a dyn StepUnifier,
}

impl std::fmt::Debug for StepSearch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSearch")
            .field("step", &self.step.step)
            .field("unifier", &"<unifier>")
            .finish()
    }
}

/// Everything one search run reads from the host.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    /// Assertions sorted ascending by (hypothesis count, sequence number).
    pub assertions: &'a [Assertion],
    pub grammar: &'a dyn Grammar,
    pub book: Option<&'a dyn BookIndex>,
    pub labels: Option<&'a dyn LabelResolver>,
    /// Statement whose position bounds the search from above.
    pub reference: Option<&'a ReferenceStatement>,
    pub step: Option<StepSearch<'a>>,
}

impl<'a> SearchContext<'a> {
    pub fn new(assertions: &'a [Assertion], grammar: &'a dyn Grammar) -> Self {
        Self {
            assertions,
            grammar,
            book: None,
            labels: None,
            reference: None,
            step: None,
        }
    }

    pub fn with_book(mut self, book: &'a dyn BookIndex) -> Self {
        self.book = Some(book);
        self
    }

    pub fn with_labels(mut self, labels: &'a dyn LabelResolver) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_reference(mut self, reference: &'a ReferenceStatement) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_step(mut self, step: &'a ProofStep, unifier: &'a dyn StepUnifier) -> Self {
        self.step = Some(StepSearch { step, unifier });
        self
    }
}

impl std::fmt::Debug for SearchContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("assertions", &self.assertions.len())
            .field("reference", &self.reference)
            .field("step", &self.step)
            .finish()
    }
}

/// Shared ownership of everything a search reads from the host.
///
/// Cloning is cheap. The manager moves a clone onto the worker thread, so a
/// search abandoned at its deadline never borrows from the caller.
#[derive(Clone)]
pub struct SearchHost {
    /// Assertions sorted ascending by (hypothesis count, sequence number).
    pub assertions: Arc<[Assertion]>,
    pub grammar: Arc<dyn Grammar>,
    pub book: Option<Arc<dyn BookIndex>>,
    pub labels: Option<Arc<dyn LabelResolver>>,
    pub reference: Option<ReferenceStatement>,
    pub step: Option<(Arc<ProofStep>, Arc<dyn StepUnifier>)>,
}

impl SearchHost {
    pub fn new(assertions: impl Into<Arc<[Assertion]>>, grammar: Arc<dyn Grammar>) -> Self {
        Self {
            assertions: assertions.into(),
            grammar,
            book: None,
            labels: None,
            reference: None,
            step: None,
        }
    }

    pub fn with_book(mut self, book: Arc<dyn BookIndex>) -> Self {
        self.book = Some(book);
        self
    }

    pub fn with_labels(mut self, labels: Arc<dyn LabelResolver>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_reference(mut self, reference: ReferenceStatement) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_step(mut self, step: ProofStep, unifier: Arc<dyn StepUnifier>) -> Self {
        self.step = Some((Arc::new(step), unifier));
        self
    }

    /// Borrowed view for one run.
    pub fn context(&self) -> SearchContext<'_> {
        let mut context = SearchContext::new(&self.assertions, self.grammar.as_ref());
        if let Some(book) = &self.book {
            context = context.with_book(book.as_ref());
        }
        if let Some(labels) = &self.labels {
            context = context.with_labels(labels.as_ref());
        }
        if let Some(reference) = &self.reference {
            context = context.with_reference(reference);
        }
        if let Some((step, unifier)) = &self.step {
            context = context.with_step(step, unifier.as_ref());
        }
        context
    }
}

impl std::fmt::Debug for SearchHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHost")
            .field("assertions", &self.assertions.len())
            .field("reference", &self.reference)
            .field("step", &self.step.as_ref().map(|(step, _)| &step.step))
            .finish()
    }
}
