//! Commit/rollback bookkeeping for catalog transactions.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts transactions completed through [`super::Database::in_transaction`]
/// and [`super::Database::in_write_transaction`].
///
/// Shared by every clone of a `Database`, so a test can observe how many
/// units of work a finder call or a lazy relation triggered.
#[derive(Debug, Default)]
pub struct TxCounters {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl TxCounters {
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    /// Resets both counters. Meant for tests.
    pub fn reset(&self) {
        self.commits.store(0, Ordering::SeqCst);
        self.rollbacks.store(0, Ordering::SeqCst);
    }

    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_rollback(&self) {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::TxCounters;

    #[test]
    fn counters_accumulate_and_reset() {
        let counters = TxCounters::default();
        counters.record_commit();
        counters.record_commit();
        counters.record_rollback();
        assert_eq!(counters.commit_count(), 2);
        assert_eq!(counters.rollback_count(), 1);

        counters.reset();
        assert_eq!(counters.commit_count(), 0);
        assert_eq!(counters.rollback_count(), 0);
    }
}
