//! Results and counters shared between a search worker and its manager.
//!
//! The worker holds the lock only to store or promote an item and to publish
//! counters, never across a collaborator call, so the manager can take a
//! snapshot at its deadline without waiting on a slow unifier.

use parking_lot::Mutex;

use crate::host::StepMatch;

use super::output::SearchStats;
use super::store::{ResultStore, SelectionItem, SCORE_COMPLETED};

#[derive(Debug)]
struct ProgressState {
    store: ResultStore,
    stats: SearchStats,
}

#[derive(Debug)]
pub struct ScanProgress {
    state: Mutex<ProgressState>,
}

impl ScanProgress {
    pub fn new(max_results: usize, input_size: usize) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                store: ResultStore::new(max_results),
                stats: SearchStats {
                    input_size,
                    ..SearchStats::default()
                },
            }),
        }
    }

    /// Stores `item` and reports whether the store is now full.
    pub fn add(&self, item: SelectionItem) -> bool {
        self.state.lock().store.add(item)
    }

    pub fn publish(&self, stats: &SearchStats) {
        self.state.lock().stats = *stats;
    }

    /// Runs `f` over the stored items in scan order.
    pub fn with_items<R>(&self, f: impl FnOnce(&[SelectionItem]) -> R) -> R {
        f(self.state.lock().store.items())
    }

    /// Marks the item at `position` completed with its new lines and match.
    pub fn promote(&self, position: usize, lines: Vec<String>, step_match: StepMatch) {
        let mut state = self.state.lock();
        if let Some(item) = state.store.items_mut().get_mut(position) {
            item.score = SCORE_COMPLETED;
            item.lines = lines;
            item.step_match = Some(step_match);
        }
    }

    /// Copy of everything gathered so far.
    pub fn snapshot(&self) -> (ResultStore, SearchStats) {
        let state = self.state.lock();
        (state.store.clone(), state.stats)
    }
}
