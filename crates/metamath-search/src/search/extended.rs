//! Extended search: promotes partial step matches to completed ones.
//!
//! A partial result unified with the designated step but left some of its
//! logical hypotheses unmatched (the step declared `?` slots for them). Each
//! unmatched hypothesis is offered to the step unifier together with a
//! candidate filler: one of the most recent prior proof steps, or an
//! assertion without hypotheses. When every hypothesis is discharged the
//! result becomes completed.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::host::{Filler, SearchContext, StepMatch, StepUnifier};
use crate::query::CompiledQuery;
use crate::types::{Assertion, ProofStep};

use super::engine::{bucket_start, passes_filters};
use super::format::LineFormatter;
use super::output::SearchStats;
use super::progress::ScanProgress;
use super::store::{SCORE_COMPLETED, SCORE_PARTIAL};

/// Runs extended search over the stored results. Returns `Ok(true)` when it
/// was cancelled.
pub fn extend(
    query: &CompiledQuery,
    context: &SearchContext<'_>,
    formatter: &LineFormatter<'_>,
    progress: &ScanProgress,
    stats: &mut SearchStats,
    token: &CancellationToken,
) -> Result<bool> {
    let Some(step) = context.step else {
        return Ok(false);
    };
    if query.results_checked == 0 {
        return Ok(false);
    }
    let Some(fillers) = collect_fillers(query, context, step.step, token) else {
        return Ok(true);
    };

    let candidates: Vec<(usize, usize, StepMatch)> = progress.with_items(|items| {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.score == SCORE_PARTIAL)
            .filter_map(|(position, item)| {
                Some((position, item.assertion?, item.step_match.clone()?))
            })
            .take(query.results_checked as usize)
            .collect()
    });
    log::debug!(
        "extended search start candidates={} fillers={}",
        candidates.len(),
        fillers.len(),
    );

    let max_promoted = query.max_ext_results as usize;
    let max_unmatched = query.max_incomp_hyps as usize;
    let mut promoted = 0;
    for (position, index, current) in candidates {
        if token.is_cancelled().is_none() {
            return Ok(true);
        }
        if max_promoted > 0 && promoted >= max_promoted {
            break;
        }
        let Some(assertion) = context.assertions.get(index) else {
            continue;
        };
        if max_unmatched > 0 && current.unmatched_hyps.len() > max_unmatched {
            continue;
        }
        stats.extended_checked += 1;

        let Some((completed, used)) = discharge_hyps(step.unifier, assertion, current, &fillers)?
        else {
            progress.publish(stats);
            continue;
        };
        let mut lines = formatter.lines(assertion, SCORE_COMPLETED, Some(&completed));
        lines.extend(used.iter().map(|label| LineFormatter::filler_line(label)));

        progress.promote(position, lines, completed);
        stats.extended_promoted += 1;
        stats.completed += 1;
        progress.publish(stats);
        promoted += 1;
    }
    Ok(false)
}

/// Prior steps first, most recent first, then hypothesis-free assertions in
/// list order. `None` when cancelled.
fn collect_fillers<'a>(
    query: &CompiledQuery,
    context: &SearchContext<'a>,
    step: &'a ProofStep,
    token: &CancellationToken,
) -> Option<Vec<Filler<'a>>> {
    let mut fillers: Vec<Filler<'a>> = step
        .prior_steps
        .iter()
        .rev()
        .take(query.prev_steps_checked as usize)
        .map(Filler::PriorStep)
        .collect();

    let assertions: &'a [Assertion] = context.assertions;
    let end = bucket_start(assertions, 1);
    let mut ignored = SearchStats::default();
    for (i, assertion) in assertions[..end].iter().enumerate() {
        token.is_cancelled_sparse(i)?;
        if assertion.seq <= query.min_seq || assertion.seq >= query.max_seq {
            continue;
        }
        if passes_filters(query, context, assertion, &mut ignored) {
            fillers.push(Filler::Assertion(assertion));
        }
    }
    Some(fillers)
}

/// Discharges every unmatched hypothesis with the first filler the unifier
/// accepts. Returns the completed match and the filler labels used, in
/// hypothesis order.
fn discharge_hyps(
    unifier: &dyn StepUnifier,
    assertion: &Assertion,
    mut current: StepMatch,
    fillers: &[Filler<'_>],
) -> Result<Option<(StepMatch, Vec<String>)>> {
    let mut used = Vec::with_capacity(current.unmatched_hyps.len());
    for hyp_index in current.unmatched_hyps.clone() {
        let mut discharged = false;
        for filler in fillers {
            if let Some(next) = unifier.fill_hypothesis(assertion, &current, hyp_index, *filler)? {
                current = next;
                used.push(filler.label().to_string());
                discharged = true;
                break;
            }
        }
        if !discharged {
            return Ok(None);
        }
    }
    Ok(current.is_complete().then_some((current, used)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RawQuery;
    use crate::search::engine::execute;
    use crate::test_support::{
        assertion, sorted, step, with_prior_steps, ToyGrammar, ToyStepUnifier,
    };
    use crate::types::AssertionKind;

    type Run = (Vec<(String, i32)>, SearchStats, Vec<Vec<String>>);

    fn run(raw: &RawQuery, assertions: &[Assertion], proof_step: &ProofStep) -> Run {
        let grammar = ToyGrammar;
        let unifier = ToyStepUnifier;
        let context = SearchContext::new(assertions, &grammar).with_step(proof_step, &unifier);
        let query = CompiledQuery::compile(raw, &context).unwrap();
        let outcome = execute(&query, &context, &CancellationToken::noop()).unwrap();
        let items = outcome.store.items();
        (
            items.iter().map(|i| (i.label.clone(), i.score)).collect(),
            outcome.stats,
            items.iter().map(|i| i.lines.clone()).collect(),
        )
    }

    fn mp_database() -> Vec<Assertion> {
        sorted(vec![
            assertion("ax-1", 1, AssertionKind::Axiom, "( ph -> ( ps -> ph ) )", &[]),
            assertion("ax-mp", 2, AssertionKind::Axiom, "ps", &["ph", "( ph -> ps )"]),
        ])
    }

    #[test]
    fn prior_step_completes_partial_match() {
        let assertions = mp_database();
        // qed: |- ch, with one known hyp ( th -> ch ) and one unknown
        let proof_step = with_prior_steps(
            step("ch", &[Some("( th -> ch )"), None]),
            &["( ph -> ps )", "th"],
        );
        let mut raw = RawQuery::default();
        raw.results_checked = "5".to_string();
        raw.prev_steps_checked = "2".to_string();
        raw.comments = "false".to_string();
        let (items, stats, lines) = run(&raw, &assertions, &proof_step);
        assert_eq!(items, vec![("ax-mp".to_string(), SCORE_COMPLETED)]);
        assert_eq!(stats.extended_checked, 1);
        assert_eq!(stats.extended_promoted, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(
            lines[0],
            vec![
                "(*) ax-mp ::= |- th",
                "     &&  |- ( th -> ch )",
                "     ==> |- ch",
                "     <= p2",
            ]
        );
    }

    #[test]
    fn no_prior_steps_leaves_result_partial() {
        let assertions = mp_database();
        let proof_step = with_prior_steps(step("ch", &[Some("( th -> ch )"), None]), &["th"]);
        let mut raw = RawQuery::default();
        raw.results_checked = "5".to_string();
        raw.prev_steps_checked = "0".to_string();
        let (items, stats, _) = run(&raw, &assertions, &proof_step);
        assert_eq!(items, vec![("ax-mp".to_string(), SCORE_PARTIAL)]);
        assert_eq!(stats.extended_checked, 1);
        assert_eq!(stats.extended_promoted, 0);
    }

    #[test]
    fn disabled_without_results_checked() {
        let assertions = mp_database();
        let proof_step = with_prior_steps(step("ch", &[Some("( th -> ch )"), None]), &["th"]);
        let mut raw = RawQuery::default();
        raw.prev_steps_checked = "1".to_string();
        let (items, stats, _) = run(&raw, &assertions, &proof_step);
        assert_eq!(items, vec![("ax-mp".to_string(), SCORE_PARTIAL)]);
        assert_eq!(stats.extended_checked, 0);
    }

    #[test]
    fn hypothesis_free_assertion_fills_slot() {
        let assertions = sorted(vec![
            assertion("ax-1", 1, AssertionKind::Axiom, "( ph -> ( ps -> ph ) )", &[]),
            assertion("ax-mp", 2, AssertionKind::Axiom, "ps", &["ph", "( ph -> ps )"]),
        ]);
        // the minor premise ( ph -> ( ps -> ph ) ) is supplied by ax-1
        let proof_step = step("ch", &[Some("( ( ph -> ( ps -> ph ) ) -> ch )"), None]);
        let mut raw = RawQuery::default();
        raw.results_checked = "1".to_string();
        raw.comments = "false".to_string();
        raw.substitutions = "false".to_string();
        let (items, stats, lines) = run(&raw, &assertions, &proof_step);
        assert_eq!(items, vec![("ax-mp".to_string(), SCORE_COMPLETED)]);
        assert_eq!(stats.extended_promoted, 1);
        assert_eq!(lines[0].last().map(String::as_str), Some("     <= ax-1"));
    }

    #[test]
    fn max_incomp_hyps_skips_wide_gaps() {
        let assertions = mp_database();
        let proof_step = with_prior_steps(step("ch", &[None, None]), &["( th -> ch )", "th"]);
        let mut raw = RawQuery::default();
        raw.results_checked = "5".to_string();
        raw.prev_steps_checked = "2".to_string();
        raw.max_incomp_hyps = "1".to_string();
        let (items, stats, _) = run(&raw, &assertions, &proof_step);
        assert!(items.contains(&("ax-mp".to_string(), SCORE_PARTIAL)));
        assert_eq!(stats.extended_checked, 0);

        raw.max_incomp_hyps = "0".to_string();
        let (items, stats, _) = run(&raw, &assertions, &proof_step);
        assert!(items.contains(&("ax-mp".to_string(), SCORE_COMPLETED)));
        assert_eq!(stats.extended_promoted, 1);
    }
}
