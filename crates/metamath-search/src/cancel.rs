//! Cancellation tokens for search operations.
//!
//! A search is interrupted when the active version moves past the version its
//! token was issued for. The search manager bumps the version when a newer
//! search starts, when the caller cancels, and when the time limit expires.
//!
//! ## Sparse Checking
//!
//! For tight loops over large assertion lists, `is_cancelled_sparse()`
//! only checks every 1,024 iterations to keep atomic reads off the hot path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How often long-running loops should check whether execution was cancelled.
/// Using a power of 2 allows efficient modulo via bitwise AND.
pub const CANCEL_CHECK_INTERVAL: usize = 0x400; // 1,024

/// Tracks the active search version for cancellation.
///
/// When a new search starts, call `next_version()` to get a new version number.
/// Previous searches with older versions will be cancelled when they check
/// their `CancellationToken`.
#[derive(Debug, Default)]
pub struct SearchVersionTracker {
    active_version: Arc<AtomicU64>,
}

impl SearchVersionTracker {
    /// Creates a new search version tracker.
    pub fn new() -> Self {
        Self {
            active_version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Increments the active version and returns the new version number.
    ///
    /// This effectively cancels any in-flight searches using older versions.
    pub fn next_version(&self) -> u64 {
        self.active_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Marks a caller-provided version as active if it is newer than the
    /// currently active version.
    ///
    /// Returns the resulting active version after the update attempt.
    pub fn activate_version(&self, version: u64) -> u64 {
        let mut current = self.active_version.load(Ordering::SeqCst);
        loop {
            if version <= current {
                return current;
            }
            match self.active_version.compare_exchange(
                current,
                version,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return version,
                Err(observed) => current = observed,
            }
        }
    }

    /// Returns the current active version without incrementing.
    pub fn current_version(&self) -> u64 {
        self.active_version.load(Ordering::SeqCst)
    }

    /// Creates a cancellation token for the given version.
    ///
    /// The token will report as cancelled once the active version has moved
    /// past the given version.
    pub fn token_for_version(&self, version: u64) -> CancellationToken {
        CancellationToken {
            active_version: Arc::clone(&self.active_version),
            version,
        }
    }
}

/// A cancellation token for terminating long-running operations.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    /// Shared atomic holding the active version.
    active_version: Arc<AtomicU64>,
    /// The version this token was created with.
    version: u64,
}

impl CancellationToken {
    /// Creates a cancellation token that is never cancelled.
    ///
    /// Useful for tests or operations that should not be interruptible.
    #[inline]
    pub fn noop() -> Self {
        Self {
            active_version: Arc::new(AtomicU64::new(0)),
            version: 0,
        }
    }

    /// Checks if this token is still active.
    ///
    /// Returns `Some(())` if still active, `None` if cancelled.
    /// This enables use with the `?` operator for early returns.
    #[inline]
    pub fn is_cancelled(&self) -> Option<()> {
        if self.version != self.active_version.load(Ordering::Relaxed) {
            None
        } else {
            Some(())
        }
    }

    /// Sparse cancellation check - only checks every `CANCEL_CHECK_INTERVAL` iterations.
    #[inline]
    pub fn is_cancelled_sparse(&self, counter: usize) -> Option<()> {
        if counter & (CANCEL_CHECK_INTERVAL - 1) == 0 {
            self.is_cancelled()
        } else {
            Some(())
        }
    }
}

impl Default for CancellationToken {
    /// Default creates a noop token that is never cancelled.
    fn default() -> Self {
        Self::noop()
    }
}
