//! SearchManager - main API for running assertion searches.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::engine::{execute_with, ScanOutcome};
use super::output::{log_stats, SearchOutput};
use super::progress::ScanProgress;
use crate::cancel::{CancellationToken, SearchVersionTracker};
use crate::error::{FieldError, Result, ReturnCode, SearchError};
use crate::host::SearchHost;
use crate::query::{CompiledQuery, RawQuery, SearchField};

const TIMEOUT_MESSAGE: &str =
    "Search task timed out. Increase MaxTime option, or modify other SearchOptions?";
const INTERRUPTED_MESSAGE: &str = "Search task interrupted...";
const EXECUTION_MESSAGE: &str = "Search task execution exception! System Message = ";

/// Longest wait between checks for an outside cancellation.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// What the worker thread sends back: the run result, or a panic message.
type WorkerMessage = std::result::Result<Result<ScanOutcome>, String>;

/// How the worker run ended.
enum RunEnd {
    Finished(ScanOutcome),
    TimedOut(ScanOutcome),
    Interrupted(ScanOutcome),
    Failed(String),
}

/// Runs searches one at a time, each on a worker thread with a deadline.
#[derive(Debug, Default)]
pub struct SearchManager {
    search_version_tracker: SearchVersionTracker,
    search_lane: Mutex<()>,
}

impl SearchManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next search version, cancelling any in-flight searches.
    ///
    /// Call this before starting a new search to get a version number.
    /// Pass this version to `search()` to enable cancellation.
    pub fn next_search_version(&self) -> u64 {
        self.search_version_tracker.next_version()
    }

    /// Returns the current search version without incrementing.
    pub fn current_search_version(&self) -> u64 {
        self.search_version_tracker.current_version()
    }

    /// Interrupts the running search, if any.
    pub fn cancel_active(&self) {
        let version = self.search_version_tracker.next_version();
        log::debug!("search cancel requested version={}", version);
    }

    /// Compiles and runs `raw` against `host`.
    ///
    /// If `search_version` is omitted, a fresh version is allocated
    /// automatically, which supersedes any search still running. A supplied
    /// version newer than the active one becomes active.
    ///
    /// The call returns by the `MaxTime` deadline, or shortly after the
    /// search is cancelled, with whatever was found so far. A worker still
    /// inside a host call at that point is left to finish on its own; it
    /// stops at its next cancellation check.
    ///
    /// Argument errors, timeouts and interruptions come back as an output
    /// carrying the matching status. A failing step unifier or a panicking
    /// worker is recorded in the output and returned as
    /// [`SearchError::Execution`].
    pub fn search(
        &self,
        raw: &RawQuery,
        host: &SearchHost,
        search_version: Option<u64>,
    ) -> Result<SearchOutput> {
        if host.assertions.is_empty() {
            return Err(SearchError::EmptyAssertionList);
        }
        let started = Instant::now();
        let mut output = SearchOutput::new(
            host.step.as_ref().map(|(step, _)| step.step.clone()),
            host.assertions.len(),
        );

        let version = match search_version {
            Some(version) => {
                self.search_version_tracker.activate_version(version);
                version
            }
            None => self.next_search_version(),
        };
        let cancel_token = self.search_version_tracker.token_for_version(version);

        // Check if already cancelled before doing any work
        if cancel_token.is_cancelled().is_none() {
            return Ok(self.interrupted(output, started));
        }

        // Searches run on a single lane; a newer search waits here while the
        // version bump above interrupts the older one.
        let _search_lane_guard = self.search_lane.lock();

        if cancel_token.is_cancelled().is_none() {
            return Ok(self.interrupted(output, started));
        }

        let query = match CompiledQuery::compile(raw, &host.context()) {
            Ok(query) => Arc::new(query),
            Err(errors) => {
                for error in errors {
                    output.store_error(error);
                }
                output.elapsed_ms = elapsed_ms(started);
                log::info!(
                    "search finished status={} errors={} elapsed_ms={}",
                    output.status.as_str(),
                    output.errors.len(),
                    output.elapsed_ms,
                );
                return Ok(output);
            }
        };
        log::debug!(
            "search compiled version={} rows={} max_time={}",
            version,
            query.rows.len(),
            query.max_time,
        );

        let progress = Arc::new(ScanProgress::new(
            query.max_results as usize,
            host.assertions.len(),
        ));
        let receiver = spawn_worker(host, &query, &cancel_token, &progress)?;
        let deadline = (query.max_time > 0)
            .then(|| Instant::now() + Duration::from_secs(query.max_time.into()));
        let end = self.wait(&receiver, deadline, &cancel_token, &progress);

        let outcome = match end {
            RunEnd::Finished(outcome) => {
                if outcome.cancelled {
                    output.store_error(FieldError::status(
                        ReturnCode::Interrupted,
                        INTERRUPTED_MESSAGE,
                    ));
                }
                outcome
            }
            RunEnd::Interrupted(outcome) => {
                output.store_error(FieldError::status(
                    ReturnCode::Interrupted,
                    INTERRUPTED_MESSAGE,
                ));
                outcome
            }
            RunEnd::TimedOut(outcome) => {
                output.store_error(FieldError {
                    code: ReturnCode::Timeout,
                    field: Some(SearchField::MaxTime),
                    message: TIMEOUT_MESSAGE.to_string(),
                });
                outcome
            }
            RunEnd::Failed(reason) => {
                let message = format!("{EXECUTION_MESSAGE}{reason}");
                output.store_error(FieldError::status(ReturnCode::Execution, message.clone()));
                output.elapsed_ms = elapsed_ms(started);
                log::warn!(
                    "search failed version={} elapsed_ms={} error={}",
                    version,
                    output.elapsed_ms,
                    reason,
                );
                log_stats(&output, Some(&query), query.stats);
                return Err(SearchError::Execution {
                    message,
                    output: Box::new(output),
                });
            }
        };

        let more_results = outcome.full || outcome.cancelled;
        output.stats = outcome.stats;
        output.more_results = more_results;
        output.set_results(outcome.store.finalize(query.output_sort, more_results));
        output.elapsed_ms = elapsed_ms(started);

        match output.status {
            ReturnCode::Timeout | ReturnCode::Interrupted => log::warn!(
                "search stopped early status={} version={} selected={} elapsed_ms={}",
                output.status.as_str(),
                version,
                output.stats.selected,
                output.elapsed_ms,
            ),
            _ => {}
        }
        log::info!(
            "search finished status={} selected={} completed={} more={} elapsed_ms={}",
            output.status.as_str(),
            output.stats.selected,
            output.stats.completed,
            output.more_results,
            output.elapsed_ms,
        );
        log_stats(&output, Some(&query), query.stats);
        Ok(output)
    }

    /// Waits for the worker in short slices so the deadline and outside
    /// cancellation take effect even while the worker is stuck in a host call.
    fn wait(
        &self,
        receiver: &mpsc::Receiver<WorkerMessage>,
        deadline: Option<Instant>,
        cancel_token: &CancellationToken,
        progress: &ScanProgress,
    ) -> RunEnd {
        loop {
            let slice = deadline.map_or(WAIT_SLICE, |deadline| {
                deadline.saturating_duration_since(Instant::now()).min(WAIT_SLICE)
            });
            match receiver.recv_timeout(slice) {
                Ok(Ok(Ok(outcome))) => return RunEnd::Finished(outcome),
                Ok(Ok(Err(error))) => return RunEnd::Failed(error.to_string()),
                Ok(Err(panic_message)) => return RunEnd::Failed(panic_message),
                Err(RecvTimeoutError::Disconnected) => {
                    return RunEnd::Failed("search worker exited without a result".to_string())
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
            if cancel_token.is_cancelled().is_none() {
                return RunEnd::Interrupted(partial_outcome(progress));
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                // stop the worker at its next check; keep what it found
                self.search_version_tracker.next_version();
                return RunEnd::TimedOut(partial_outcome(progress));
            }
        }
    }

    fn interrupted(&self, mut output: SearchOutput, started: Instant) -> SearchOutput {
        output.store_error(FieldError::status(ReturnCode::Interrupted, INTERRUPTED_MESSAGE));
        output.more_results = true;
        output.elapsed_ms = elapsed_ms(started);
        log::warn!(
            "search superseded before start current_version={}",
            self.current_search_version(),
        );
        output
    }
}

/// Starts the detached worker thread. It owns clones of everything it reads.
fn spawn_worker(
    host: &SearchHost,
    query: &Arc<CompiledQuery>,
    cancel_token: &CancellationToken,
    progress: &Arc<ScanProgress>,
) -> Result<mpsc::Receiver<WorkerMessage>> {
    let (sender, receiver) = mpsc::channel();
    let host = host.clone();
    let query = Arc::clone(query);
    let token = cancel_token.clone();
    let progress = Arc::clone(progress);
    thread::Builder::new()
        .name("metamath-search".to_string())
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                execute_with(&query, &host.context(), &token, &progress)
            }))
            .map_err(|payload| panic_message(payload.as_ref()));
            // the manager may have stopped listening at its deadline
            let _ = sender.send(result);
        })
        .map_err(|error| SearchError::Internal(format!("failed to spawn search worker: {error}")))?;
    Ok(receiver)
}

fn partial_outcome(progress: &ScanProgress) -> ScanOutcome {
    let (store, stats) = progress.snapshot();
    ScanOutcome {
        full: store.is_full(),
        store,
        stats,
        cancelled: true,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "search worker panicked".to_string()
    }
}
