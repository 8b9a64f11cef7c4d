//! Bounded result accumulator and the output sort orders.

use std::cmp::Ordering;

use serde::Serialize;

use crate::host::StepMatch;
use crate::types::Assertion;

pub const SCORE_COMPLETED: i32 = 100;
pub const SCORE_PARTIAL: i32 = 50;
pub const SCORE_TRAILER: i32 = -1;

pub const MORE_RESULTS_LINE: &str = "***MORE***";
pub const END_OF_RESULTS_LINE: &str = "***END***";

/// The eleven output orders. Every order except [`SortOrder::Unsorted`]
/// sorts by descending score first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SortOrder {
    #[default]
    Unsorted,
    ComplexityPopularity,
    PopularityComplexity,
    HypsComplexityPopularity,
    HypsPopularityComplexity,
    Complexity,
    Popularity,
    HypsSeqDescending,
    HypsSeqAscending,
    Seq,
    Label,
}

impl SortOrder {
    pub const ALL: [SortOrder; 11] = [
        Self::Unsorted,
        Self::ComplexityPopularity,
        Self::PopularityComplexity,
        Self::HypsComplexityPopularity,
        Self::HypsPopularityComplexity,
        Self::Complexity,
        Self::Popularity,
        Self::HypsSeqDescending,
        Self::HypsSeqAscending,
        Self::Seq,
        Self::Label,
    ];

    pub fn number(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unsorted => "#0: Don't Re-sort",
            Self::ComplexityPopularity => {
                "#1: Score(D)/Complexity(D)/Popularity(D)/Nbr Hyps/MObjSeq(D)"
            }
            Self::PopularityComplexity => {
                "#2: Score(D)/Popularity(D)/Complexity(D)/Nbr Hyps/MObjSeq(D)"
            }
            Self::HypsComplexityPopularity => {
                "#3: Score(D)/Nbr Hyps/Complexity(D)/Popularity(D)/MObjSeq(D)"
            }
            Self::HypsPopularityComplexity => {
                "#4: Score(D)/Nbr Hyps/Popularity(D)/Complexity(D)/MObjSeq(D)"
            }
            Self::Complexity => "#5: Score(D)/Complexity(D)/MObjSeq(D)",
            Self::Popularity => "#6: Score(D)/Popularity(D)/MObjSeq(D)",
            Self::HypsSeqDescending => "#7: Score(D)/Nbr Hyps/MObjSeq(D)",
            Self::HypsSeqAscending => "#8: Score(D)/Nbr Hyps/MObjSeq",
            Self::Seq => "#9: Score(D)/MObjSeq(D)",
            Self::Label => "#10: Score(D)/Label",
        }
    }

    /// Accepts `#n` or a full order label.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(order) = Self::ALL.into_iter().find(|order| order.label() == text) {
            return Some(order);
        }
        let number: usize = text.strip_prefix('#')?.parse().ok()?;
        Self::ALL.get(number).copied()
    }

    /// Total order over items; ties that survive every key keep scan order
    /// because the sort is stable.
    pub fn compare(self, a: &SelectionItem, b: &SelectionItem) -> Ordering {
        if self == Self::Unsorted {
            return Ordering::Equal;
        }
        let score = b.score.cmp(&a.score);
        let complexity = || b.depth.cmp(&a.depth).then(b.formula_len.cmp(&a.formula_len));
        let popularity = || b.popularity.cmp(&a.popularity);
        let hyps = || a.hyps.cmp(&b.hyps);
        let seq_desc = || b.seq.cmp(&a.seq);
        let rest = match self {
            Self::Unsorted => Ordering::Equal,
            Self::ComplexityPopularity => complexity()
                .then_with(popularity)
                .then_with(hyps)
                .then_with(seq_desc),
            Self::PopularityComplexity => popularity()
                .then_with(complexity)
                .then_with(hyps)
                .then_with(seq_desc),
            Self::HypsComplexityPopularity => hyps()
                .then_with(complexity)
                .then_with(popularity)
                .then_with(seq_desc),
            Self::HypsPopularityComplexity => hyps()
                .then_with(popularity)
                .then_with(complexity)
                .then_with(seq_desc),
            Self::Complexity => complexity().then_with(seq_desc),
            Self::Popularity => popularity().then_with(seq_desc),
            Self::HypsSeqDescending => hyps().then_with(seq_desc),
            Self::HypsSeqAscending => hyps().then(a.seq.cmp(&b.seq)),
            Self::Seq => seq_desc(),
            Self::Label => a.label.cmp(&b.label),
        };
        score.then(rest)
    }
}

/// One scored result with its display lines and cached sort keys.
#[derive(Debug, Clone)]
pub struct SelectionItem {
    /// Index into the searched assertion list; `None` for the trailer.
    pub assertion: Option<usize>,
    pub label: String,
    pub lines: Vec<String>,
    pub score: i32,
    pub step_match: Option<StepMatch>,
    depth: usize,
    formula_len: usize,
    popularity: u32,
    hyps: usize,
    seq: u32,
}

impl SelectionItem {
    pub fn new(
        index: usize,
        assertion: &Assertion,
        lines: Vec<String>,
        score: i32,
        step_match: Option<StepMatch>,
    ) -> Self {
        Self {
            assertion: Some(index),
            label: assertion.label.clone(),
            lines,
            score,
            step_match,
            depth: assertion.tree.max_depth(),
            formula_len: assertion.formula_len(),
            popularity: assertion.proof_refs,
            hyps: assertion.hyp_count(),
            seq: assertion.seq,
        }
    }

    fn trailer(more: bool) -> Self {
        let line = if more {
            MORE_RESULTS_LINE
        } else {
            END_OF_RESULTS_LINE
        };
        Self {
            assertion: None,
            label: String::new(),
            lines: vec![line.to_string()],
            score: SCORE_TRAILER,
            step_match: None,
            depth: 0,
            formula_len: 0,
            popularity: 0,
            hyps: 0,
            seq: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.score == SCORE_COMPLETED
    }
}

/// Accepted results in scan order, capped at `max_results`.
#[derive(Debug, Clone)]
pub struct ResultStore {
    items: Vec<SelectionItem>,
    max_results: usize,
}

impl ResultStore {
    pub fn new(max_results: usize) -> Self {
        Self {
            items: Vec::new(),
            max_results,
        }
    }

    /// Stores `item` and reports whether the store is now full.
    pub fn add(&mut self, item: SelectionItem) -> bool {
        if !self.is_full() {
            self.items.push(item);
        }
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_results
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [SelectionItem] {
        &mut self.items
    }

    /// Appends the trailer, sorts, and flattens the display lines.
    pub fn finalize(self, order: SortOrder, more: bool) -> FinalResults {
        let mut items = self.items;
        items.push(SelectionItem::trailer(more));
        if order != SortOrder::Unsorted {
            items.sort_by(|a, b| order.compare(a, b));
        }
        let mut lines = Vec::new();
        let mut line_owner = Vec::new();
        for (position, item) in items.iter_mut().enumerate() {
            line_owner.extend(std::iter::repeat(position).take(item.lines.len()));
            lines.append(&mut item.lines);
        }
        FinalResults {
            items,
            lines,
            line_owner,
        }
    }
}

/// Sorted items plus their flattened display lines.
///
/// `line_owner[i]` is the position in `items` of the item that produced
/// `lines[i]`. Item `lines` are moved into the flat array.
#[derive(Debug, Clone)]
pub struct FinalResults {
    pub items: Vec<SelectionItem>,
    pub lines: Vec<String>,
    pub line_owner: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::assertion;
    use crate::types::AssertionKind;

    fn item(label: &str, seq: u32, hyps: &[&str], refs: u32, score: i32) -> SelectionItem {
        let mut source = assertion(label, seq, AssertionKind::Theorem, "( ph -> ph )", hyps);
        source.proof_refs = refs;
        SelectionItem::new(seq as usize, &source, vec![label.to_string()], score, None)
    }

    #[test]
    fn parses_numbers_and_labels() {
        assert_eq!(SortOrder::parse("#9"), Some(SortOrder::Seq));
        assert_eq!(
            SortOrder::parse("#2: Score(D)/Popularity(D)/Complexity(D)/Nbr Hyps/MObjSeq(D)"),
            Some(SortOrder::PopularityComplexity)
        );
        assert_eq!(SortOrder::parse("#11"), None);
        assert_eq!(SortOrder::parse("9"), None);
        for order in SortOrder::ALL {
            assert_eq!(SortOrder::parse(order.label()), Some(order));
            assert_eq!(SortOrder::parse(&format!("#{}", order.number())), Some(order));
        }
    }

    #[test]
    fn store_is_bounded() {
        let mut store = ResultStore::new(2);
        assert!(!store.add(item("a", 1, &[], 0, 50)));
        assert!(store.add(item("b", 2, &[], 0, 50)));
        assert!(store.add(item("c", 3, &[], 0, 50)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn seq_order_puts_score_first() {
        let mut store = ResultStore::new(10);
        store.add(item("low", 5, &[], 0, 50));
        store.add(item("high", 9, &[], 0, 50));
        store.add(item("done", 1, &[], 0, 100));
        let results = store.finalize(SortOrder::Seq, false);
        assert_eq!(results.lines, vec!["done", "high", "low", END_OF_RESULTS_LINE]);
        assert_eq!(results.line_owner, vec![0, 1, 2, 3]);
        assert_eq!(results.items[3].assertion, None);
    }

    #[test]
    fn unsorted_keeps_scan_order() {
        let mut store = ResultStore::new(1);
        store.add(item("b", 2, &[], 0, 50));
        let results = store.finalize(SortOrder::Unsorted, true);
        assert_eq!(results.lines, vec!["b", MORE_RESULTS_LINE]);
    }

    #[test]
    fn hyps_then_popularity() {
        let mut store = ResultStore::new(10);
        store.add(item("two", 1, &["ph", "ps"], 50, 50));
        store.add(item("one_rare", 2, &["ph"], 1, 50));
        store.add(item("one_popular", 3, &["ph"], 9, 50));
        let results = store.finalize(SortOrder::HypsPopularityComplexity, false);
        let labels: Vec<&str> = results.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["one_popular", "one_rare", "two", ""]);
    }

    #[test]
    fn multi_line_items_share_owner() {
        let mut store = ResultStore::new(10);
        let mut first = item("a", 1, &[], 0, 50);
        first.lines.push("second line".to_string());
        store.add(first);
        store.add(item("b", 2, &[], 0, 50));
        let results = store.finalize(SortOrder::Label, false);
        assert_eq!(results.line_owner, vec![0, 0, 1, 2]);
    }
}
