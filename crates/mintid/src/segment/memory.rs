use std::collections::HashMap;

use parking_lot::Mutex;

use crate::{
    IdError, Result,
    segment::{IdScope, SegmentRange, SegmentRepository},
};

/// An in-process [`SegmentRepository`] for tests and single-node setups.
///
/// The mutex stands in for the row lock a database-backed implementation
/// would take: every `next_range` call is a serialized read-increment-write
/// over the per-scope high-watermark, so ranges are exclusive even across
/// generator instances sharing this repository.
#[derive(Default)]
pub struct InMemorySegmentRepository {
    counters: Mutex<HashMap<IdScope, i64>>,
}

impl InMemorySegmentRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current high-watermark for a scope, if initialized.
    #[must_use]
    pub fn max_id(&self, scope: IdScope) -> Option<i64> {
        self.counters.lock().get(&scope).copied()
    }
}

impl SegmentRepository for InMemorySegmentRepository {
    fn next_range(&self, scope: IdScope, step: u32) -> Result<SegmentRange> {
        let mut counters = self.counters.lock();
        let max = counters
            .get_mut(&scope)
            .ok_or(IdError::ScopeNotInitialized { scope })?;
        let start = *max + 1;
        *max += i64::from(step);
        Ok(SegmentRange::new(start, *max))
    }

    fn init_scope_if_absent(&self, scope: IdScope, initial_max: i64, _step: u32) -> Result<()> {
        self.counters.lock().entry(scope).or_insert(initial_max);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_scope_is_an_error() {
        let repo = InMemorySegmentRepository::new();
        let result = repo.next_range(IdScope::Order, 100);
        assert!(matches!(
            result,
            Err(IdError::ScopeNotInitialized { scope: IdScope::Order })
        ));
    }

    #[test]
    fn ranges_are_contiguous_and_exclusive() {
        let repo = InMemorySegmentRepository::new();
        repo.init_scope_if_absent(IdScope::Order, 0, 100).unwrap();

        let a = repo.next_range(IdScope::Order, 100).unwrap();
        let b = repo.next_range(IdScope::Order, 100).unwrap();
        assert_eq!((a.start(), a.end()), (1, 100));
        assert_eq!((b.start(), b.end()), (101, 200));
    }

    #[test]
    fn init_is_idempotent() {
        let repo = InMemorySegmentRepository::new();
        repo.init_scope_if_absent(IdScope::Wallet, 0, 100).unwrap();
        repo.next_range(IdScope::Wallet, 100).unwrap();
        // A second init must not reset the watermark.
        repo.init_scope_if_absent(IdScope::Wallet, 0, 100).unwrap();
        assert_eq!(repo.max_id(IdScope::Wallet), Some(100));
    }
}
