//! Query compilation: validates a [`RawQuery`] against its search context and
//! produces the immutable [`CompiledQuery`] the driver runs.
//!
//! Every field error is collected. A field that fails validation is left out of
//! the checks that depend on it, so independent errors are all reported.

use roaring::RoaringBitmap;

use crate::config::{arg_error, FieldRegistry};
use crate::error::FieldError;
use crate::host::{HierarchyKind, SearchContext};
use crate::search::SortOrder;
use crate::types::{Chapter, ReferenceStatement, Section};
use crate::unify::RelOp;

use super::excl_labels::ExclLabels;
use super::fields::{BoolOp, Format, InWhat, Operator, Part, RawQuery, SearchField, ROW_COUNT};
use super::matcher::{RowMatcher, SearchRow};
use super::parser::{parse_terms, TermSyntax};

const OR_SEPARATOR_COLLISION: &str =
    " Must not equal or match the leading portion of SingleQuote or DoubleQuote, or vice-versa.";
const QUOTE_COLLISION: &str =
    " Must not equal or match the leading portion of  DoubleQuote, or vice-versa.";
const MIN_HYPS_GT_MAX_HYPS: &str = " Is greater than number of MaxHyps = ";
const MAX_HYPS_LT_STEP_HYPS: &str = " Is less than number of Proof Step Hyps = ";
const MIN_HYPS_GT_STEP_HYPS: &str = " Is greater than number of Proof Step Hyps = ";
const NOT_A_CHOICE: &str = " Not a valid choice.";
const NO_BOOK_DATA: &str = " Chapter and section data is not available.";
const UNKNOWN_LABEL: &str = " Label not found.";

/// A validated query, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub or_separator: String,
    pub single_quote: String,
    pub double_quote: String,
    /// Populated rows in row order.
    pub rows: Vec<SearchRow>,
    pub excl_labels: ExclLabels,
    pub min_proof_refs: u32,
    pub results_checked: u32,
    /// Seconds.
    pub max_time: u32,
    pub min_hyps: u32,
    pub max_hyps: u32,
    pub max_ext_results: u32,
    pub substitutions: bool,
    pub max_incomp_hyps: u32,
    pub comments: bool,
    pub max_results: u32,
    pub prev_steps_checked: u32,
    pub stats: u32,
    pub hierarchy: Option<HierarchyKind>,
    pub from_chap: Option<Chapter>,
    pub from_sec: Option<Section>,
    pub thru_chap: Option<Chapter>,
    pub thru_sec: Option<Section>,
    pub output_sort: SortOrder,
    pub reference: Option<ReferenceStatement>,
    /// Assertions with `seq >= max_seq` are out of range.
    pub max_seq: u32,
    /// Assertions with `seq <= min_seq` are out of range.
    pub min_seq: u32,
    /// Combined reachability set; `None` disables the hierarchy filter.
    pub dependencies: Option<RoaringBitmap>,
    pub step_hyp_count: usize,
    pub step_hyp_wildcards: bool,
}

impl CompiledQuery {
    /// Compiles `raw`. On failure every collected error is returned.
    pub fn compile(raw: &RawQuery, context: &SearchContext<'_>) -> Result<Self, Vec<FieldError>> {
        let mut compiler = Compiler {
            raw,
            context,
            registry: FieldRegistry::global(),
            errors: Vec::new(),
        };
        let compiled = compiler.run();
        if compiler.errors.is_empty() {
            Ok(compiled)
        } else {
            Err(compiler.errors)
        }
    }

    /// Whether an assertion in `chapter` and `canonical_section` passes the
    /// hierarchy filter.
    pub fn in_hierarchy(&self, chapter: u32, canonical_section: u32) -> bool {
        let (Some(set), Some(kind)) = (&self.dependencies, self.hierarchy) else {
            return true;
        };
        if kind.by_chapter() {
            set.contains(chapter)
        } else {
            set.contains(canonical_section)
        }
    }
}

struct Compiler<'q, 'c> {
    raw: &'q RawQuery,
    context: &'q SearchContext<'c>,
    registry: &'static FieldRegistry,
    errors: Vec<FieldError>,
}

impl<'q, 'c> Compiler<'q, 'c> {
    fn run(&mut self) -> CompiledQuery {
        let raw = self.raw;
        let or_separator = self.required_text(SearchField::OrSeparator);
        let single_quote = self.required_text(SearchField::SingleQuote);
        let double_quote = self.required_text(SearchField::DoubleQuote);
        let quotes_valid = self.check_quotes(&or_separator, &single_quote, &double_quote);

        let min_proof_refs = self.integer(SearchField::MinProofRefs);
        let results_checked = self.integer(SearchField::ResultsChecked);
        let max_time = self.integer(SearchField::MaxTime);
        let min_hyps = self.integer(SearchField::MinHyps);
        let max_ext_results = self.integer(SearchField::MaxExtResults);
        let substitutions = self.boolean(SearchField::Substitutions);
        let max_hyps = self.integer(SearchField::MaxHyps);
        let max_incomp_hyps = self.integer(SearchField::MaxIncompHyps);
        let comments = self.boolean(SearchField::Comments);
        let max_results = self.integer(SearchField::MaxResults);
        let prev_steps_checked = self.integer(SearchField::PrevStepsChecked);
        let stats = self.integer(SearchField::Stats);
        let output_sort = self.output_sort();
        let hierarchy = self.hierarchy();

        let excl_labels = match ExclLabels::compile(raw.excl_labels.trim()) {
            Ok(excl) => excl,
            Err(error) => {
                let message = format!("value = {}.{}", error.fragment(), error);
                self.errors.push(FieldError::arg(SearchField::ExclLabels, message));
                ExclLabels::default()
            }
        };

        // hypothesis bounds
        let (mut min_hyps, mut max_hyps) = (min_hyps, max_hyps);
        if let (Some(min), Some(max)) = (min_hyps, max_hyps) {
            if min > max {
                self.errors.push(arg_error(
                    SearchField::MinHyps,
                    &min.to_string(),
                    &format!("{MIN_HYPS_GT_MAX_HYPS}{max}"),
                ));
            }
        }
        let (step_hyp_count, step_hyp_wildcards) = match self.context.step {
            Some(step) => {
                let concrete = step.step.concrete_hyp_count();
                let wildcards = step.step.has_hyp_wildcards();
                self.adjust_for_step(concrete, wildcards, &mut min_hyps, &mut max_hyps);
                (concrete, wildcards)
            }
            None => (0, false),
        };

        // sequence bounds
        let reference = self.reference();
        let mut max_seq = reference.as_ref().map_or(u32::MAX, |r| r.seq);
        let mut min_seq = 0;
        let from_chap = self.chapter(SearchField::FromChap);
        let from_sec = self.section(SearchField::FromSec, from_chap.as_ref());
        let thru_chap = self.chapter(SearchField::ThruChap);
        let thru_sec = self.section(SearchField::ThruSec, thru_chap.as_ref());
        if let Some(chapter) = &thru_chap {
            let thru_max = thru_sec.as_ref().map_or(chapter.max_seq, |s| s.max_seq);
            max_seq = max_seq.min(thru_max.saturating_add(1));
        }
        if let Some(chapter) = &from_chap {
            let from_min = from_sec.as_ref().map_or(chapter.min_seq, |s| s.min_seq);
            min_seq = min_seq.max(from_min.saturating_sub(1));
        }

        let dependencies = hierarchy
            .flatten()
            .and_then(|kind| self.dependencies(kind, reference.as_ref(), &thru_chap, &thru_sec));

        let rows = if quotes_valid {
            let syntax = TermSyntax {
                single_quote: &single_quote,
                double_quote: &double_quote,
                or_separator: &or_separator,
            };
            self.rows(syntax, max_seq)
        } else {
            Vec::new()
        };

        CompiledQuery {
            or_separator,
            single_quote,
            double_quote,
            rows,
            excl_labels,
            min_proof_refs: min_proof_refs.unwrap_or(0),
            results_checked: results_checked.unwrap_or(0),
            max_time: max_time.unwrap_or(0),
            min_hyps: min_hyps.unwrap_or(0),
            max_hyps: max_hyps.unwrap_or(0),
            max_ext_results: max_ext_results.unwrap_or(0),
            substitutions: substitutions.unwrap_or(false),
            max_incomp_hyps: max_incomp_hyps.unwrap_or(0),
            comments: comments.unwrap_or(false),
            max_results: max_results.unwrap_or(0),
            prev_steps_checked: prev_steps_checked.unwrap_or(0),
            stats: stats.unwrap_or(0),
            hierarchy: hierarchy.flatten(),
            from_chap,
            from_sec,
            thru_chap,
            thru_sec,
            output_sort: output_sort.unwrap_or(SortOrder::Unsorted),
            reference,
            max_seq,
            min_seq,
            dependencies,
            step_hyp_count,
            step_hyp_wildcards,
        }
    }

    // ------------------------------------------------------------------
    // Scalar fields
    // ------------------------------------------------------------------

    fn record<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    fn required_text(&mut self, field: SearchField) -> String {
        let raw = self.raw;
        let text = raw.value(field).trim();
        let checked = self.registry.check(field, text);
        self.record(checked);
        text.to_string()
    }

    fn integer(&mut self, field: SearchField) -> Option<u32> {
        let raw = self.raw;
        let parsed = self.registry.integer(field, raw.value(field));
        self.record(parsed)
    }

    fn boolean(&mut self, field: SearchField) -> Option<bool> {
        let raw = self.raw;
        let parsed = self.registry.boolean(field, raw.value(field));
        self.record(parsed)
    }

    fn choice(&mut self, field: SearchField) -> Option<&'q str> {
        let raw: &'q RawQuery = self.raw;
        let text = raw.value(field).trim();
        let checked = self.registry.check(field, text);
        self.record(checked).map(|_| text)
    }

    fn output_sort(&mut self) -> Option<SortOrder> {
        let raw = self.raw;
        let text = raw.output_sort.trim();
        match SortOrder::parse(text) {
            Some(order) => Some(order),
            None => {
                self.errors
                    .push(arg_error(SearchField::OutputSort, text, NOT_A_CHOICE));
                None
            }
        }
    }

    /// `Some(None)` when hierarchy filtering is off, `None` on error.
    fn hierarchy(&mut self) -> Option<Option<HierarchyKind>> {
        let kind = match self.choice(SearchField::ChapSecHierarchy)? {
            "Chap/Direct" => Some(HierarchyKind::ChapterDirect),
            "Chap/Indir." => Some(HierarchyKind::ChapterIndirect),
            "Sec/Direct" => Some(HierarchyKind::SectionDirect),
            "Sec/Indir." => Some(HierarchyKind::SectionIndirect),
            _ => None,
        };
        if kind.is_some() && self.context.book.is_none() {
            let raw = self.raw;
            let text = raw.chap_sec_hierarchy.trim();
            self.errors
                .push(arg_error(SearchField::ChapSecHierarchy, text, NO_BOOK_DATA));
            return None;
        }
        Some(kind)
    }

    fn check_quotes(&mut self, or_separator: &str, single: &str, double: &str) -> bool {
        if or_separator.is_empty() || single.is_empty() || double.is_empty() {
            return false;
        }
        let mut valid = true;
        let collides = |a: &str, b: &str| a.starts_with(b) || b.starts_with(a);
        if collides(or_separator, single) || collides(or_separator, double) {
            self.errors.push(arg_error(
                SearchField::OrSeparator,
                or_separator,
                OR_SEPARATOR_COLLISION,
            ));
            valid = false;
        }
        if collides(single, double) {
            self.errors
                .push(arg_error(SearchField::SingleQuote, single, QUOTE_COLLISION));
            valid = false;
        }
        valid
    }

    /// Fits the hypothesis bounds to the designated proof step.
    ///
    /// Without wildcard slots an assertion must have exactly the step's
    /// hypothesis count. With wildcards it needs at least that many.
    fn adjust_for_step(
        &mut self,
        concrete: usize,
        wildcards: bool,
        min_hyps: &mut Option<u32>,
        max_hyps: &mut Option<u32>,
    ) {
        let concrete = u32::try_from(concrete).unwrap_or(u32::MAX);
        if let Some(max) = max_hyps.as_mut() {
            if !wildcards {
                *max = concrete;
            } else if concrete > *max {
                self.errors.push(arg_error(
                    SearchField::MaxHyps,
                    &max.to_string(),
                    &format!("{MAX_HYPS_LT_STEP_HYPS}{concrete}"),
                ));
            }
        }
        if let Some(min) = min_hyps.as_mut() {
            if concrete < *min && !wildcards {
                self.errors.push(arg_error(
                    SearchField::MinHyps,
                    &min.to_string(),
                    &format!("{MIN_HYPS_GT_STEP_HYPS}{concrete}"),
                ));
            } else {
                *min = concrete;
            }
        }
    }

    // ------------------------------------------------------------------
    // Reference statement, chapters and sections
    // ------------------------------------------------------------------

    fn reference(&mut self) -> Option<ReferenceStatement> {
        let raw = self.raw;
        let context = self.context;
        let label = raw.reference_label.trim();
        if label.is_empty() {
            return context.reference.cloned();
        }
        let resolved = context
            .labels
            .and_then(|labels| labels.resolve(label))
            .or_else(|| {
                context
                    .assertions
                    .iter()
                    .find(|assertion| assertion.label == label)
                    .map(|assertion| ReferenceStatement {
                        label: assertion.label.clone(),
                        seq: assertion.seq,
                        chapter: assertion.chapter,
                        section: assertion.section,
                    })
            });
        if resolved.is_none() {
            self.errors
                .push(arg_error(SearchField::ReferenceLabel, label, UNKNOWN_LABEL));
        }
        resolved
    }

    fn chapter(&mut self, field: SearchField) -> Option<Chapter> {
        let raw = self.raw;
        let text = raw.value(field).trim();
        if text.is_empty() {
            return None;
        }
        let Some(book) = self.context.book else {
            self.errors.push(arg_error(field, text, NO_BOOK_DATA));
            return None;
        };
        let chapter = book.resolve_chapter(text);
        if chapter.is_none() {
            self.errors.push(arg_error(field, text, NOT_A_CHOICE));
        }
        chapter
    }

    /// Resolves a section within `chapter`. A section given without its
    /// chapter is ignored.
    fn section(&mut self, field: SearchField, chapter: Option<&Chapter>) -> Option<Section> {
        let raw = self.raw;
        let text = raw.value(field).trim();
        if text.is_empty() {
            return None;
        }
        let (Some(chapter), Some(book)) = (chapter, self.context.book) else {
            return None;
        };
        let section = book
            .resolve_section(text)
            .filter(|section| section.chapter == chapter.number);
        if section.is_none() {
            self.errors.push(arg_error(field, text, NOT_A_CHOICE));
        }
        section
    }

    /// Unions the reachability sets rooted at the reference statement and at
    /// the Thru bound.
    fn dependencies(
        &self,
        kind: HierarchyKind,
        reference: Option<&ReferenceStatement>,
        thru_chap: &Option<Chapter>,
        thru_sec: &Option<Section>,
    ) -> Option<RoaringBitmap> {
        let book = self.context.book?;
        let table = book.dependencies(kind);
        let lookup = |index: u32| table.get(index as usize);
        let (reference_root, thru_root) = if kind.by_chapter() {
            (
                reference.map(|r| r.chapter),
                thru_chap.as_ref().map(|c| c.number),
            )
        } else {
            (
                reference.map(|r| book.canonical_section(r.section)),
                thru_sec.as_ref().map(|s| book.canonical_section(s.number)),
            )
        };
        let mut combined: Option<RoaringBitmap> = None;
        for set in [reference_root, thru_root].into_iter().flatten().filter_map(lookup) {
            match combined.as_mut() {
                Some(existing) => *existing |= set,
                None => combined = Some(set.clone()),
            }
        }
        combined
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    fn rows(&mut self, syntax: TermSyntax<'_>, max_seq: u32) -> Vec<SearchRow> {
        let mut rows = Vec::new();
        for index in 0..ROW_COUNT {
            if let Some(row) = self.row(index, syntax, max_seq) {
                rows.push(row);
            }
        }
        rows
    }

    fn row(&mut self, index: usize, syntax: TermSyntax<'_>, max_seq: u32) -> Option<SearchRow> {
        let raw = self.raw;
        let for_what = raw.rows[index].for_what.trim();
        if for_what.is_empty() {
            return None;
        }
        let in_what = self
            .choice(SearchField::InWhat(index))
            .and_then(InWhat::parse);
        let part = self.choice(SearchField::Part(index)).and_then(Part::parse);
        let format = self
            .choice(SearchField::Format(index))
            .and_then(Format::parse);
        let operator = self
            .choice(SearchField::Operator(index))
            .and_then(Operator::parse);
        let bool_op = self.choice(SearchField::Bool(index)).and_then(BoolOp::parse);

        let (Some(in_what), Some(part), Some(format), Some(operator), Some(bool_op)) =
            (in_what, part, format, operator, bool_op)
        else {
            return None;
        };

        let mut valid = true;
        if format.is_tree() && part != Part::Formulas {
            self.errors.push(arg_error(
                SearchField::Part(index),
                part.as_str(),
                NOT_A_CHOICE,
            ));
            valid = false;
        }
        let rel_op: Option<RelOp> = match operator {
            Operator::Rel(op) => Some(op),
            _ => None,
        };
        if format.is_tree() != rel_op.is_some() {
            self.errors.push(arg_error(
                SearchField::Operator(index),
                operator.as_str(),
                NOT_A_CHOICE,
            ));
            valid = false;
        }

        let terms = match parse_terms(for_what, syntax) {
            Ok(terms) => terms,
            Err(error) => {
                self.errors
                    .push(FieldError::arg(SearchField::ForWhat(index), error.to_string()));
                return None;
            }
        };
        if !valid {
            return None;
        }

        let grammar = self.context.grammar;
        match RowMatcher::compile(format, part, rel_op, terms, grammar, max_seq) {
            Ok(matcher) => Some(SearchRow {
                index,
                in_what,
                part,
                operator,
                bool_op,
                matcher,
            }),
            Err(error) => {
                self.errors
                    .push(FieldError::arg(SearchField::ForWhat(index), error.to_string()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assertion, step, ToyBook, ToyGrammar};
    use crate::types::AssertionKind;

    fn fields(errors: &[FieldError]) -> Vec<SearchField> {
        errors.iter().filter_map(|e| e.field).collect()
    }

    #[test]
    fn default_query_compiles() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let context = SearchContext::new(&assertions, &grammar);
        let compiled = CompiledQuery::compile(&RawQuery::default(), &context).unwrap();
        assert!(compiled.rows.is_empty());
        assert_eq!(compiled.max_seq, u32::MAX);
        assert_eq!(compiled.min_seq, 0);
        assert_eq!(compiled.max_hyps, 99);
        assert_eq!(compiled.output_sort, SortOrder::Unsorted);
    }

    #[test]
    fn collects_independent_errors() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let context = SearchContext::new(&assertions, &grammar);
        let mut raw = RawQuery::default();
        raw.max_time = "-3".to_string();
        raw.excl_labels = "a$$b".to_string();
        raw.min_hyps = "5".to_string();
        raw.max_hyps = "2".to_string();
        raw.set_row(1, Format::RegExpr, Part::Formulas, "'(ph'");
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![
                SearchField::MaxTime,
                SearchField::ExclLabels,
                SearchField::MinHyps,
                SearchField::ForWhat(1),
            ]
        );
        assert_eq!(
            errors[2].message,
            "value = 5. Is greater than number of MaxHyps = 2"
        );
        assert!(errors[1].message.starts_with("value = a$$b. Is invalid."));
    }

    #[test]
    fn quote_collisions() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let context = SearchContext::new(&assertions, &grammar);
        let mut raw = RawQuery::default();
        raw.or_separator = "''".to_string();
        raw.double_quote = "'".to_string();
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![SearchField::OrSeparator, SearchField::SingleQuote]
        );
        assert!(errors[0].message.ends_with(OR_SEPARATOR_COLLISION));
    }

    #[test]
    fn tree_format_requires_formulas_and_relational_operator() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let context = SearchContext::new(&assertions, &grammar);
        let mut raw = RawQuery::default();
        raw.rows[3].for_what = "ph".to_string();
        raw.rows[3].part = "Labels".to_string();
        raw.rows[0].for_what = "ph".to_string();
        raw.rows[0].operator = "<=".to_string();
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![SearchField::Operator(0), SearchField::Part(3)]
        );
    }

    #[test]
    fn step_without_wildcards_pins_hyp_bounds() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let unifier = crate::test_support::ToyStepUnifier;
        let proof_step = step("( ph -> ps )", &[Some("ph"), Some("ps")]);
        let context = SearchContext::new(&assertions, &grammar).with_step(&proof_step, &unifier);
        let compiled = CompiledQuery::compile(&RawQuery::default(), &context).unwrap();
        assert_eq!((compiled.min_hyps, compiled.max_hyps), (2, 2));
        assert!(!compiled.step_hyp_wildcards);

        let mut raw = RawQuery::default();
        raw.min_hyps = "3".to_string();
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(
            errors[0].message,
            "value = 3. Is greater than number of Proof Step Hyps = 2"
        );
    }

    #[test]
    fn step_with_wildcards_keeps_max() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let unifier = crate::test_support::ToyStepUnifier;
        let proof_step = step("ps", &[Some("ph"), None]);
        let context = SearchContext::new(&assertions, &grammar).with_step(&proof_step, &unifier);
        let mut raw = RawQuery::default();
        raw.max_hyps = "4".to_string();
        let compiled = CompiledQuery::compile(&raw, &context).unwrap();
        assert_eq!((compiled.min_hyps, compiled.max_hyps), (1, 4));
        assert!(compiled.step_hyp_wildcards);

        raw.max_hyps = "0".to_string();
        raw.min_hyps = "0".to_string();
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(fields(&errors), vec![SearchField::MaxHyps]);
    }

    #[test]
    fn chapter_bounds_and_hierarchy() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let book = ToyBook::new();
        let reference = ReferenceStatement {
            label: "ref".to_string(),
            seq: 500,
            chapter: 2,
            section: 3,
        };
        let context = SearchContext::new(&assertions, &grammar)
            .with_book(&book)
            .with_reference(&reference);
        let mut raw = RawQuery::default();
        raw.from_chap = "2".to_string();
        raw.thru_chap = "2".to_string();
        raw.chap_sec_hierarchy = "Chap/Direct".to_string();
        let compiled = CompiledQuery::compile(&raw, &context).unwrap();
        // chapter 2 spans sequence numbers 100..=199
        assert_eq!(compiled.min_seq, 99);
        assert_eq!(compiled.max_seq, 200);
        assert!(compiled.in_hierarchy(1, 0));
        assert!(compiled.in_hierarchy(2, 0));
        assert!(!compiled.in_hierarchy(3, 0));

        raw.thru_chap = "nine".to_string();
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(fields(&errors), vec![SearchField::ThruChap]);
    }

    #[test]
    fn sections_only_narrow_within_their_chapter() {
        let assertions = vec![assertion("id", 1, AssertionKind::Theorem, "( ph -> ph )", &[])];
        let grammar = ToyGrammar;
        let book = ToyBook::new();
        let context = SearchContext::new(&assertions, &grammar).with_book(&book);

        // no chapter: the section is ignored
        let mut raw = RawQuery::default();
        raw.thru_sec = "3".to_string();
        raw.from_sec = "4".to_string();
        let compiled = CompiledQuery::compile(&raw, &context).unwrap();
        assert!(compiled.thru_sec.is_none());
        assert!(compiled.from_sec.is_none());
        assert_eq!(compiled.max_seq, u32::MAX);
        assert_eq!(compiled.min_seq, 0);

        // sections 3 and 4 split chapter 2 at 150
        raw.thru_chap = "2".to_string();
        raw.from_chap = "2".to_string();
        let compiled = CompiledQuery::compile(&raw, &context).unwrap();
        assert_eq!(compiled.max_seq, 150);
        assert_eq!(compiled.min_seq, 149);

        raw.thru_chap = "1".to_string();
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(fields(&errors), vec![SearchField::ThruSec]);
    }

    #[test]
    fn reference_label_sets_max_seq() {
        let assertions = vec![
            assertion("a1", 10, AssertionKind::Axiom, "( ph -> ph )", &[]),
            assertion("t2", 20, AssertionKind::Theorem, "( ph -> ph )", &[]),
        ];
        let grammar = ToyGrammar;
        let context = SearchContext::new(&assertions, &grammar);
        let mut raw = RawQuery::default();
        raw.reference_label = "t2".to_string();
        let compiled = CompiledQuery::compile(&raw, &context).unwrap();
        assert_eq!(compiled.max_seq, 20);
        raw.reference_label = "nope".to_string();
        let errors = CompiledQuery::compile(&raw, &context).unwrap_err();
        assert_eq!(fields(&errors), vec![SearchField::ReferenceLabel]);
    }
}
