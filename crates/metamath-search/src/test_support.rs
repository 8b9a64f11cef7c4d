//! A toy propositional logic implementing every host trait.
//!
//! Types `wff` and `|-`, variables `ph ps ch th`, work variable `&W1`, and the
//! syntax axioms `wn` (`-. A`), `wi` (`( A -> B )`) and `wa` (`( A /\ B )`).
//! `/\` is declared at sequence number 100, everything else at 0.

use std::thread;
use std::time::Duration;

use roaring::RoaringBitmap;

use crate::error::{GrammarError, StepUnifyError};
use crate::host::{
    BookIndex, Filler, Grammar, HierarchyKind, LabelResolver, StepMatch, StepUnifier,
    Substitution,
};
use crate::tree::{NodeId, ParseTree, SubtreeRef, TreeBuilder};
use crate::types::{
    Assertion, AssertionKind, Chapter, LogHyp, ProofStep, ReferenceStatement, Section, StepHyp,
};
use crate::unify::{unify_subtree, Bindings};

const VARIABLES: [&str; 4] = ["ph", "ps", "ch", "th"];
const WORK_VARIABLE: &str = "&W1";
const CONJUNCTION_SEQ: u32 = 100;

pub struct ToyGrammar;

impl Grammar for ToyGrammar {
    fn provable_type(&self) -> &str {
        "|-"
    }

    fn syntax_types(&self) -> Vec<String> {
        vec!["wff".to_string()]
    }

    fn is_work_variable(&self, symbol: &str) -> bool {
        symbol == WORK_VARIABLE
    }

    fn parse_formula(
        &self,
        typ: &str,
        text: &str,
        max_seq: u32,
    ) -> Result<ParseTree, GrammarError> {
        if typ != "|-" && typ != "wff" {
            return Err(GrammarError::Parse(format!("unknown type {typ}")));
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut parser = ToyParser {
            tokens: &tokens,
            pos: 0,
            max_seq,
            builder: TreeBuilder::new(),
        };
        let root = parser.wff()?;
        if parser.pos != tokens.len() {
            return Err(GrammarError::Parse(format!(
                "unexpected token {}",
                tokens[parser.pos]
            )));
        }
        Ok(parser.builder.finish(root))
    }

    fn render(&self, tree: &ParseTree) -> String {
        fn render_node(tree: &ParseTree, id: NodeId, out: &mut Vec<String>) {
            let node = tree.node(id);
            let children = node.children();
            match node.label.as_str() {
                "wn" => {
                    out.push("-.".to_string());
                    render_node(tree, children[0], out);
                }
                "wi" | "wa" => {
                    out.push("(".to_string());
                    render_node(tree, children[0], out);
                    out.push(if node.label == "wi" { "->" } else { "/\\" }.to_string());
                    render_node(tree, children[1], out);
                    out.push(")".to_string());
                }
                _ => out.push(node.label.clone()),
            }
        }
        let mut out = Vec::new();
        render_node(tree, tree.root(), &mut out);
        out.join(" ")
    }
}

struct ToyParser<'t> {
    tokens: &'t [&'t str],
    pos: usize,
    max_seq: u32,
    builder: TreeBuilder,
}

impl ToyParser<'_> {
    fn next(&mut self) -> Result<&str, GrammarError> {
        let tokens = self.tokens;
        let token = *tokens
            .get(self.pos)
            .ok_or_else(|| GrammarError::Parse("unexpected end of formula".to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    fn wff(&mut self) -> Result<NodeId, GrammarError> {
        let token = self.next()?.to_string();
        match token.as_str() {
            "-." => {
                let inner = self.wff()?;
                Ok(self.builder.syntax("wn", "wff", vec![inner]))
            }
            "(" => {
                let left = self.wff()?;
                let op = self.next()?.to_string();
                let label = match op.as_str() {
                    "->" => "wi",
                    "/\\" if self.max_seq > CONJUNCTION_SEQ => "wa",
                    "/\\" => return Err(GrammarError::OutOfScope(op.clone())),
                    other => return Err(GrammarError::Parse(format!("unexpected token {other}"))),
                };
                let right = self.wff()?;
                if self.next()? != ")" {
                    return Err(GrammarError::Parse("missing )".to_string()));
                }
                Ok(self.builder.syntax(label, "wff", vec![left, right]))
            }
            WORK_VARIABLE => Ok(self.builder.work_var("wff", WORK_VARIABLE)),
            var if VARIABLES.contains(&var) => Ok(self.builder.var("wff", var)),
            other => Err(GrammarError::Parse(format!("unexpected token {other}"))),
        }
    }
}

/// Parses a wff of the toy logic.
pub fn wff(text: &str) -> ParseTree {
    ToyGrammar
        .parse_formula("wff", text, u32::MAX)
        .unwrap_or_else(|error| panic!("bad toy formula {text:?}: {error}"))
}

/// Builds an assertion `|- body` with logical hyps `|- hyp`.
///
/// Chapter is `seq / 100 + 1`, section `seq / 50 + 1`. Hyp labels are
/// `{label}.1`, `{label}.2`, ...
pub fn assertion(label: &str, seq: u32, kind: AssertionKind, body: &str, hyps: &[&str]) -> Assertion {
    Assertion {
        label: label.to_string(),
        seq,
        kind,
        chapter: seq / 100 + 1,
        section: seq / 50 + 1,
        description: String::new(),
        formula: format!("|- {body}"),
        tree: wff(body),
        hyps: hyps
            .iter()
            .enumerate()
            .map(|(i, hyp)| LogHyp {
                label: format!("{label}.{}", i + 1),
                formula: format!("|- {hyp}"),
                tree: wff(hyp),
            })
            .collect(),
        proof_refs: 0,
        proof: Vec::new(),
    }
}

/// Sorts assertions into the order the search expects.
pub fn sorted(mut assertions: Vec<Assertion>) -> Vec<Assertion> {
    assertions.sort_by_key(|a| (a.hyp_count(), a.seq));
    assertions
}

fn step_hyp(name: String, body: &str) -> StepHyp {
    StepHyp {
        step: name,
        formula: format!("|- {body}"),
        tree: wff(body),
    }
}

/// Builds proof step `qed` proving `|- formula`. `None` hyps are wildcards.
pub fn step(formula: &str, hyps: &[Option<&str>]) -> ProofStep {
    ProofStep {
        step: "qed".to_string(),
        formula: format!("|- {formula}"),
        tree: Some(wff(formula)),
        hyps: hyps
            .iter()
            .enumerate()
            .map(|(i, hyp)| hyp.map(|body| step_hyp(format!("h{}", i + 1), body)))
            .collect(),
        prior_steps: Vec::new(),
    }
}

/// Adds prior steps `p1`, `p2`, ... proving the given formulas.
pub fn with_prior_steps(mut proof_step: ProofStep, formulas: &[&str]) -> ProofStep {
    proof_step.prior_steps = formulas
        .iter()
        .enumerate()
        .map(|(i, body)| step_hyp(format!("p{}", i + 1), body))
        .collect();
    proof_step
}

/// Three chapters of two sections each. Chapter `n` spans sequence numbers
/// `(n-1)*100 ..= n*100-1`; every chapter or section depends on all earlier
/// ones.
pub struct ToyBook {
    chapters: Vec<RoaringBitmap>,
    sections: Vec<RoaringBitmap>,
}

const CHAPTER_TITLES: [&str; 3] = ["one", "two", "three"];

impl ToyBook {
    pub fn new() -> Self {
        let prefix_sets = |count: u32| {
            (0..=count)
                .map(|n| (1..=n).collect::<RoaringBitmap>())
                .collect::<Vec<_>>()
        };
        Self {
            chapters: prefix_sets(3),
            sections: prefix_sets(6),
        }
    }
}

impl BookIndex for ToyBook {
    fn resolve_chapter(&self, text: &str) -> Option<Chapter> {
        let number = text.parse::<u32>().ok().or_else(|| {
            CHAPTER_TITLES
                .iter()
                .position(|title| *title == text)
                .map(|i| i as u32 + 1)
        })?;
        (1..=3).contains(&number).then(|| Chapter {
            number,
            title: CHAPTER_TITLES[number as usize - 1].to_string(),
            min_seq: (number - 1) * 100,
            max_seq: number * 100 - 1,
        })
    }

    fn resolve_section(&self, text: &str) -> Option<Section> {
        let number = text.parse::<u32>().ok()?;
        (1..=6).contains(&number).then(|| Section {
            number,
            chapter: (number + 1) / 2,
            title: format!("section {number}"),
            min_seq: (number - 1) * 50,
            max_seq: number * 50 - 1,
        })
    }

    fn canonical_section(&self, section: u32) -> u32 {
        section
    }

    fn dependencies(&self, kind: HierarchyKind) -> &[RoaringBitmap] {
        if kind.by_chapter() {
            &self.chapters
        } else {
            &self.sections
        }
    }
}

pub struct ToyLabels(pub Vec<ReferenceStatement>);

impl LabelResolver for ToyLabels {
    fn resolve(&self, label: &str) -> Option<ReferenceStatement> {
        self.0.iter().find(|r| r.label == label).cloned()
    }
}

/// Unifies assertions with a step by plain tree unification. Concrete step
/// hypotheses are assigned to distinct assertion hypotheses, deepest first,
/// with backtracking.
pub struct ToyStepUnifier;

fn to_substitution(bindings: &Bindings<'_>) -> Substitution {
    let mut substitution = Substitution::new();
    for (var, bound) in bindings {
        substitution.insert(*var, bound.tree.subtree(bound.node));
    }
    substitution
}

fn assign_hyps<'a>(
    assertion: &'a Assertion,
    order: &[usize],
    step_hyps: &[&'a StepHyp],
    used: &mut Vec<usize>,
    bindings: Bindings<'a>,
) -> Option<Bindings<'a>> {
    let Some((&first, rest)) = step_hyps.split_first() else {
        return Some(bindings);
    };
    for &index in order {
        if used.contains(&index) {
            continue;
        }
        let hyp = &assertion.hyps[index];
        let mut attempt = bindings.clone();
        if !unify_subtree(
            SubtreeRef::root_of(&hyp.tree),
            SubtreeRef::root_of(&first.tree),
            &mut attempt,
        ) {
            continue;
        }
        used.push(index);
        if let Some(done) = assign_hyps(assertion, order, rest, used, attempt) {
            return Some(done);
        }
        used.pop();
    }
    None
}

impl StepUnifier for ToyStepUnifier {
    fn unify_step(
        &self,
        assertion: &Assertion,
        step: &ProofStep,
    ) -> Result<Option<StepMatch>, StepUnifyError> {
        let mut bindings = Bindings::default();
        if let Some(tree) = &step.tree {
            if !unify_subtree(
                SubtreeRef::root_of(&assertion.tree),
                SubtreeRef::root_of(tree),
                &mut bindings,
            ) {
                return Ok(None);
            }
        }
        let step_hyps: Vec<&StepHyp> = step.concrete_hyps().collect();
        if step_hyps.len() > assertion.hyp_count() {
            return Ok(None);
        }
        // deepest hypotheses first
        let mut order: Vec<usize> = (0..assertion.hyp_count()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(assertion.hyps[i].tree.max_depth()));
        let mut used = Vec::new();
        let Some(bindings) = assign_hyps(assertion, &order, &step_hyps, &mut used, bindings) else {
            return Ok(None);
        };
        Ok(Some(StepMatch {
            substitution: to_substitution(&bindings),
            unmatched_hyps: (0..assertion.hyp_count())
                .filter(|i| !used.contains(i))
                .collect(),
        }))
    }

    fn fill_hypothesis(
        &self,
        assertion: &Assertion,
        current: &StepMatch,
        hyp_index: usize,
        filler: Filler<'_>,
    ) -> Result<Option<StepMatch>, StepUnifyError> {
        let Some(hyp) = assertion.hyps.get(hyp_index) else {
            return Ok(None);
        };
        let filler_tree = match filler {
            Filler::PriorStep(step) => &step.tree,
            Filler::Assertion(source) => &source.tree,
        };
        let mut bindings: Bindings<'_> = current
            .substitution
            .iter()
            .map(|(var, tree)| (var, SubtreeRef::root_of(tree)))
            .collect();
        if !unify_subtree(
            SubtreeRef::root_of(&hyp.tree),
            SubtreeRef::root_of(filler_tree),
            &mut bindings,
        ) {
            return Ok(None);
        }
        Ok(Some(StepMatch {
            substitution: to_substitution(&bindings),
            unmatched_hyps: current
                .unmatched_hyps
                .iter()
                .copied()
                .filter(|i| *i != hyp_index)
                .collect(),
        }))
    }
}

/// Sleeps before every step unification.
pub struct SlowStepUnifier(pub Duration);

impl StepUnifier for SlowStepUnifier {
    fn unify_step(
        &self,
        assertion: &Assertion,
        step: &ProofStep,
    ) -> Result<Option<StepMatch>, StepUnifyError> {
        thread::sleep(self.0);
        ToyStepUnifier.unify_step(assertion, step)
    }

    fn fill_hypothesis(
        &self,
        assertion: &Assertion,
        current: &StepMatch,
        hyp_index: usize,
        filler: Filler<'_>,
    ) -> Result<Option<StepMatch>, StepUnifyError> {
        ToyStepUnifier.fill_hypothesis(assertion, current, hyp_index, filler)
    }
}

/// Fails every unification, as if its work variable pool were exhausted.
pub struct FailingStepUnifier;

impl StepUnifier for FailingStepUnifier {
    fn unify_step(&self, _: &Assertion, _: &ProofStep) -> Result<Option<StepMatch>, StepUnifyError> {
        Err(StepUnifyError::WorkVariables("no &W variables left".to_string()))
    }

    fn fill_hypothesis(
        &self,
        _: &Assertion,
        _: &StepMatch,
        _: usize,
        _: Filler<'_>,
    ) -> Result<Option<StepMatch>, StepUnifyError> {
        Err(StepUnifyError::WorkVariables("no &W variables left".to_string()))
    }
}

/// Panics on the first unification.
pub struct PanickingStepUnifier;

impl StepUnifier for PanickingStepUnifier {
    fn unify_step(&self, assertion: &Assertion, _: &ProofStep) -> Result<Option<StepMatch>, StepUnifyError> {
        panic!("malformed parse tree in {}", assertion.label)
    }

    fn fill_hypothesis(
        &self,
        assertion: &Assertion,
        _: &StepMatch,
        _: usize,
        _: Filler<'_>,
    ) -> Result<Option<StepMatch>, StepUnifyError> {
        panic!("malformed parse tree in {}", assertion.label)
    }
}

#[test]
fn toy_grammar_round_trips() {
    for text in ["ph", "-. ( ph -> ps )", "( ( ph /\\ ps ) -> ch )"] {
        assert_eq!(ToyGrammar.render(&wff(text)), text);
    }
    assert!(matches!(
        ToyGrammar.parse_formula("wff", "( ph ->", u32::MAX),
        Err(GrammarError::Parse(_))
    ));
}
