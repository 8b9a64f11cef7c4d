//! Search results handed back to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{FieldError, ReturnCode};
use crate::query::CompiledQuery;

use super::store::FinalResults;

/// Counters collected while a search runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub input_size: usize,
    pub gets: usize,
    pub selected: usize,
    pub completed: usize,
    pub reject_ge_max_seq: usize,
    pub reject_le_min_seq: usize,
    pub reject_hyp_bucket: usize,
    pub reject_min_proof_refs: usize,
    pub reject_excl_labels: usize,
    pub reject_hierarchy: usize,
    pub reject_fail_unify: usize,
    pub reject_fail_search_data: usize,
    pub extended_checked: usize,
    pub extended_promoted: usize,
}

/// A selected assertion, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Index into the searched assertion list; `None` for the trailer.
    pub assertion: Option<usize>,
    pub label: String,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutput {
    pub status: ReturnCode,
    pub errors: Vec<FieldError>,
    /// Designated proof step, in step-search mode.
    pub step: Option<String>,
    pub hits: Vec<SearchHit>,
    pub lines: Vec<String>,
    /// `line_owner[i]` is the position in `hits` of the hit owning `lines[i]`.
    pub line_owner: Vec<usize>,
    pub more_results: bool,
    pub stats: SearchStats,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl SearchOutput {
    pub fn new(step: Option<String>, input_size: usize) -> Self {
        Self {
            status: ReturnCode::Ok,
            errors: Vec::new(),
            step,
            hits: Vec::new(),
            lines: Vec::new(),
            line_owner: Vec::new(),
            more_results: false,
            stats: SearchStats {
                input_size,
                ..SearchStats::default()
            },
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }

    /// Records an error; the status becomes the most severe code seen.
    pub fn store_error(&mut self, error: FieldError) {
        self.status = self.status.max(error.code);
        self.errors.push(error);
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReturnCode::Ok
    }

    pub(crate) fn set_results(&mut self, results: FinalResults) {
        self.hits = results
            .items
            .into_iter()
            .map(|item| SearchHit {
                assertion: item.assertion,
                label: item.label,
                score: item.score,
            })
            .collect();
        self.lines = results.lines;
        self.line_owner = results.line_owner;
    }

    /// Labels of the selected assertions in output order, trailer excluded.
    pub fn labels(&self) -> Vec<&str> {
        self.hits
            .iter()
            .filter(|hit| hit.assertion.is_some())
            .map(|hit| hit.label.as_str())
            .collect()
    }
}

/// Dumps statistics at the detail `level` (0 disables).
pub fn log_stats(output: &SearchOutput, query: Option<&CompiledQuery>, level: u32) {
    if level == 0 {
        return;
    }
    let stats = &output.stats;
    log::info!(
        "search stats status={} code={} input_size={} gets={} selected={} completed={} elapsed_ms={}",
        output.status.as_str(),
        output.status.code(),
        stats.input_size,
        stats.gets,
        stats.selected,
        stats.completed,
        output.elapsed_ms,
    );
    if level >= 2 {
        log::info!(
            "search rejections ge_max_seq={} le_min_seq={} hyp_bucket={} min_proof_refs={} excl_labels={} hierarchy={} fail_unify={} fail_search_data={} extended_checked={} extended_promoted={}",
            stats.reject_ge_max_seq,
            stats.reject_le_min_seq,
            stats.reject_hyp_bucket,
            stats.reject_min_proof_refs,
            stats.reject_excl_labels,
            stats.reject_hierarchy,
            stats.reject_fail_unify,
            stats.reject_fail_search_data,
            stats.extended_checked,
            stats.extended_promoted,
        );
    }
    if level >= 3 {
        if let Some(query) = query {
            log::info!(
                "search args rows={} min_hyps={} max_hyps={} min_seq={} max_seq={} min_proof_refs={} max_results={} output_sort={} excl_labels={} reference={}",
                query.rows.len(),
                query.min_hyps,
                query.max_hyps,
                query.min_seq,
                query.max_seq,
                query.min_proof_refs,
                query.max_results,
                query.output_sort.label(),
                query.excl_labels.len(),
                query.reference.as_ref().map_or("", |r| r.label.as_str()),
            );
            if !query.excl_labels.is_empty() {
                let patterns: Vec<&str> = query.excl_labels.patterns().collect();
                log::info!("search excl_labels patterns={:?}", patterns);
            }
            for row in &query.rows {
                let terms: Vec<&str> = row
                    .matcher
                    .terms()
                    .into_iter()
                    .map(|term| term.text.as_str())
                    .collect();
                log::info!(
                    "search row index={} in_what={:?} part={} format={} operator={} bool={} terms={:?}",
                    row.index,
                    row.in_what,
                    row.part.as_str(),
                    row.matcher.format().as_str(),
                    row.operator.as_str(),
                    row.bool_op.as_str(),
                    terms,
                );
            }
        }
    }
    if level >= 4 {
        for (index, line) in output.lines.iter().enumerate() {
            log::info!("search line index={} owner={} {}", index, output.line_owner[index], line);
        }
    }
    if level >= 5 {
        if let Some(query) = query {
            let set: Vec<u32> = query
                .dependencies
                .as_ref()
                .map(|set| set.iter().collect())
                .unwrap_or_default();
            log::info!(
                "search hierarchy kind={} set={:?}",
                query.hierarchy.map_or("", |kind| kind.as_str()),
                set,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SearchField;

    #[test]
    fn status_is_most_severe_error() {
        let mut output = SearchOutput::new(None, 3);
        assert!(output.is_ok());
        output.store_error(FieldError::status(ReturnCode::Interrupted, "stop"));
        output.store_error(FieldError::arg(SearchField::MaxTime, "bad"));
        assert_eq!(output.status, ReturnCode::Interrupted);
        assert_eq!(output.status.code(), 3);
        assert_eq!(output.errors.len(), 2);
        assert_eq!(output.stats.input_size, 3);
    }

    #[test]
    fn serializes_to_json() {
        let output = SearchOutput::new(Some("qed".to_string()), 0);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["step"], "qed");
        assert_eq!(json["stats"]["gets"], 0);
    }
}
