//! Search driver: skip-sequential scan, filters, scoring and storage.
//!
//! The assertion list is sorted ascending by (hypothesis count, sequence
//! number), so every hypothesis count forms one contiguous bucket ordered by
//! sequence. The scan visits the buckets from `min_hyps` to `max_hyps` and
//! leaves a bucket as soon as its sequence numbers pass `max_seq`, jumping to
//! the next bucket by binary search.

use std::ops::ControlFlow;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::host::{SearchContext, StepMatch};
use crate::query::{evaluate_rows, AssertionContext, CompiledQuery};
use crate::types::Assertion;

use super::extended::extend;
use super::format::LineFormatter;
use super::output::SearchStats;
use super::progress::ScanProgress;
use super::store::{ResultStore, SelectionItem, SCORE_COMPLETED, SCORE_PARTIAL};

/// Hypothesis count and sequence window of a scan. Sequence bounds are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBounds {
    pub min_hyps: usize,
    pub max_hyps: usize,
    pub min_seq: u32,
    pub max_seq: u32,
}

impl ScanBounds {
    pub fn of(query: &CompiledQuery) -> Self {
        Self {
            min_hyps: query.min_hyps as usize,
            max_hyps: query.max_hyps as usize,
            min_seq: query.min_seq,
            max_seq: query.max_seq,
        }
    }

    pub fn admits(&self, assertion: &Assertion) -> bool {
        (self.min_hyps..=self.max_hyps).contains(&assertion.hyp_count())
            && assertion.seq > self.min_seq
            && assertion.seq < self.max_seq
    }
}

/// Position of the first assertion with at least `hyps` hypotheses.
pub fn bucket_start(assertions: &[Assertion], hyps: usize) -> usize {
    assertions.partition_point(|assertion| assertion.hyp_count() < hyps)
}

/// Visits every assertion admitted by `bounds`, in list order.
///
/// The visitor receives the assertion's list index and may stop the scan by
/// returning `Break`. Returns `Ok(true)` when the scan was cancelled.
pub fn scan<F>(
    assertions: &[Assertion],
    bounds: ScanBounds,
    stats: &mut SearchStats,
    token: &CancellationToken,
    mut visit: F,
) -> Result<bool>
where
    F: FnMut(usize, &Assertion, &mut SearchStats) -> Result<ControlFlow<()>>,
{
    let mut bucket = bounds.min_hyps;
    let mut cursor = bucket_start(assertions, bucket);
    while bucket <= bounds.max_hyps {
        if token.is_cancelled().is_none() {
            return Ok(true);
        }
        let Some(assertion) = assertions.get(cursor) else {
            break;
        };
        stats.gets += 1;

        let hyps = assertion.hyp_count();
        if hyps != bucket {
            // current bucket is exhausted
            stats.reject_hyp_bucket += 1;
            bucket = hyps;
            if bucket > bounds.max_hyps {
                break;
            }
        }
        if assertion.seq >= bounds.max_seq {
            stats.reject_ge_max_seq += 1;
            bucket += 1;
            cursor += bucket_start(&assertions[cursor..], bucket);
            continue;
        }
        if assertion.seq <= bounds.min_seq {
            stats.reject_le_min_seq += 1;
            cursor += 1;
            continue;
        }

        let flow = visit(cursor, assertion, stats)?;
        cursor += 1;
        if flow.is_break() {
            break;
        }
    }
    Ok(false)
}

/// Result of one driver run, before sorting.
#[derive(Debug)]
pub struct ScanOutcome {
    pub store: ResultStore,
    pub stats: SearchStats,
    pub full: bool,
    pub cancelled: bool,
}

/// Label exclusion and chapter/section reachability.
pub(super) fn passes_filters(
    query: &CompiledQuery,
    context: &SearchContext<'_>,
    assertion: &Assertion,
    stats: &mut SearchStats,
) -> bool {
    if query.excl_labels.excludes(&assertion.label) {
        stats.reject_excl_labels += 1;
        return false;
    }
    let section = context
        .book
        .map_or(assertion.section, |book| book.canonical_section(assertion.section));
    if !query.in_hierarchy(assertion.chapter, section) {
        stats.reject_hierarchy += 1;
        return false;
    }
    true
}

/// Runs the scan and the optional extended search.
///
/// Step unifier failures abort the run with an error; cancellation does not,
/// and the results gathered so far are kept.
pub fn execute(
    query: &CompiledQuery,
    context: &SearchContext<'_>,
    token: &CancellationToken,
) -> Result<ScanOutcome> {
    let progress = ScanProgress::new(query.max_results as usize, context.assertions.len());
    execute_with(query, context, token, &progress)
}

/// Like [`execute`], publishing results and counters to `progress` as they
/// are found so another thread can snapshot them mid-run.
pub fn execute_with(
    query: &CompiledQuery,
    context: &SearchContext<'_>,
    token: &CancellationToken,
    progress: &ScanProgress,
) -> Result<ScanOutcome> {
    let formatter = LineFormatter::new(context.grammar, query.comments, query.substitutions);
    let mut stats = SearchStats {
        input_size: context.assertions.len(),
        ..SearchStats::default()
    };
    let bounds = ScanBounds::of(query);
    log::debug!(
        "search scan start assertions={} min_hyps={} max_hyps={} min_seq={} max_seq={} rows={}",
        context.assertions.len(),
        bounds.min_hyps,
        bounds.max_hyps,
        bounds.min_seq,
        bounds.max_seq,
        query.rows.len(),
    );

    let mut cancelled = scan(
        context.assertions,
        bounds,
        &mut stats,
        token,
        |index, assertion, stats| {
            let flow = consider(query, context, &formatter, progress, index, assertion, stats);
            progress.publish(stats);
            flow
        },
    )?;
    progress.publish(&stats);

    if !cancelled {
        cancelled = extend(query, context, &formatter, progress, &mut stats, token)?;
        progress.publish(&stats);
    }

    let (store, _) = progress.snapshot();
    let full = store.is_full();
    log::debug!(
        "search scan done gets={} selected={} completed={} full={} cancelled={}",
        stats.gets,
        stats.selected,
        stats.completed,
        full,
        cancelled,
    );
    Ok(ScanOutcome {
        store,
        stats,
        full,
        cancelled,
    })
}

/// Filters, unifies, scores and stores one admitted assertion.
fn consider(
    query: &CompiledQuery,
    context: &SearchContext<'_>,
    formatter: &LineFormatter<'_>,
    progress: &ScanProgress,
    index: usize,
    assertion: &Assertion,
    stats: &mut SearchStats,
) -> Result<ControlFlow<()>> {
    if assertion.proof_refs < query.min_proof_refs {
        stats.reject_min_proof_refs += 1;
        return Ok(ControlFlow::Continue(()));
    }
    if !passes_filters(query, context, assertion, stats) {
        return Ok(ControlFlow::Continue(()));
    }
    let step_match = match context.step {
        Some(step) => match step.unifier.unify_step(assertion, step.step)? {
            Some(matched) => Some(matched),
            None => {
                stats.reject_fail_unify += 1;
                return Ok(ControlFlow::Continue(()));
            }
        },
        None => None,
    };
    if !evaluate_rows(&query.rows, &AssertionContext::new(assertion)) {
        stats.reject_fail_search_data += 1;
        return Ok(ControlFlow::Continue(()));
    }

    let score = if step_match.as_ref().is_some_and(StepMatch::is_complete) {
        stats.completed += 1;
        SCORE_COMPLETED
    } else {
        SCORE_PARTIAL
    };
    stats.selected += 1;
    let lines = formatter.lines(assertion, score, step_match.as_ref());
    let item = SelectionItem::new(index, assertion, lines, score, step_match);
    if progress.add(item) {
        Ok(ControlFlow::Break(()))
    } else {
        Ok(ControlFlow::Continue(()))
    }
}
