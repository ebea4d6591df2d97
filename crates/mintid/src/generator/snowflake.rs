use crossbeam_utils::CachePadded;
use portable_atomic::{AtomicU64, Ordering};

use crate::{IdError, Result, SnowflakeId, TimeSource};

/// A lock-free Snowflake-style long id generator.
///
/// Produces positive 63-bit ids that are unique given a fleet-unique
/// `node_id` and monotonically non-decreasing per instance. The whole state
/// is the last issued id, held in one [`AtomicU64`] and advanced by
/// compare-and-swap.
///
/// The generator is total: a backward clock jump pins the timestamp to the
/// last issued one, and a full sequence borrows the next millisecond instead
/// of sleeping. Neither case is reported as an error.
///
/// # Example
/// ```
/// use mintid::{DEFAULT_EPOCH_MILLIS, SnowflakeLongIdGenerator, WallClock};
///
/// let generator = SnowflakeLongIdGenerator::new(7, DEFAULT_EPOCH_MILLIS, WallClock).unwrap();
/// let id = generator.next();
/// assert!(id.as_i64() > 0);
/// assert_eq!(id.node_id(), 7);
/// ```
pub struct SnowflakeLongIdGenerator<C> {
    state: CachePadded<AtomicU64>,
    node_id: u64,
    epoch_millis: u64,
    clock: C,
}

impl<C> SnowflakeLongIdGenerator<C>
where
    C: TimeSource,
{
    /// Creates a generator for the given node.
    ///
    /// # Errors
    /// Returns [`IdError::InvalidNodeId`] when `node_id` exceeds the 10-bit
    /// range. Checked once here, never per call.
    pub fn new(node_id: u64, epoch_millis: u64, clock: C) -> Result<Self> {
        if node_id > SnowflakeId::MAX_NODE_ID {
            return Err(IdError::InvalidNodeId {
                node_id,
                max: SnowflakeId::MAX_NODE_ID,
            });
        }
        Ok(Self {
            state: CachePadded::new(AtomicU64::new(0)),
            node_id,
            epoch_millis,
            clock,
        })
    }

    /// The configured node id.
    #[must_use]
    pub const fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Returns the next id. Total function; see the type-level docs for how
    /// rollback and sequence exhaustion are compensated.
    pub fn next(&self) -> SnowflakeId {
        loop {
            // Epoch-relative; wraps modulo 41 bits once the range is
            // exceeded, which a recent epoch defers for ~69 years.
            let now = self
                .clock
                .current_millis()
                .saturating_sub(self.epoch_millis)
                & SnowflakeId::TIMESTAMP_MASK;

            let current_raw = self.state.load(Ordering::Relaxed);
            let current = SnowflakeId::from_raw(current_raw);
            let last_ts = current.timestamp();

            let (timestamp, sequence) = if now > last_ts {
                (now, 0)
            } else if current.sequence() < SnowflakeId::MAX_SEQUENCE {
                // Same tick, or the clock moved backward: the timestamp never
                // steps back.
                (last_ts, current.sequence() + 1)
            } else {
                // Sequence exhausted: borrow the next millisecond.
                (last_ts + 1, 0)
            };

            let candidate = SnowflakeId::from_parts(timestamp, self.node_id, sequence);

            if self
                .state
                .compare_exchange(
                    current_raw,
                    candidate.to_raw(),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return candidate;
            }
            // Another thread won the race; retry with a fresh snapshot.
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU64 as StdAtomicU64;
    use std::thread::scope;

    use super::*;
    use crate::{DEFAULT_EPOCH_MILLIS, WallClock};

    #[derive(Clone, Default)]
    struct MockClock {
        millis: Arc<StdAtomicU64>,
    }

    impl MockClock {
        fn at(millis: u64) -> Self {
            let clock = Self::default();
            clock.set(millis);
            clock
        }

        fn set(&self, millis: u64) {
            self.millis.store(millis, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl TimeSource for MockClock {
        fn current_millis(&self) -> u64 {
            self.millis.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[test]
    fn node_id_out_of_range_fails_construction() {
        let result = SnowflakeLongIdGenerator::new(1024, DEFAULT_EPOCH_MILLIS, WallClock);
        assert!(matches!(
            result,
            Err(IdError::InvalidNodeId { node_id: 1024, max: 1023 })
        ));
    }

    #[test]
    fn layout_holds_across_many_ids() {
        let generator =
            SnowflakeLongIdGenerator::new(7, DEFAULT_EPOCH_MILLIS, WallClock).unwrap();

        let mut last: Option<SnowflakeId> = None;
        for _ in 0..10_000 {
            let id = generator.next();
            assert!(id.as_i64() > 0, "top bit must stay clear");
            assert_eq!(id.node_id(), 7);
            if let Some(prev) = last {
                assert!(id > prev);
                // The sequence resets exactly when the timestamp advances.
                if id.timestamp() > prev.timestamp() {
                    assert_eq!(id.sequence(), 0);
                } else {
                    assert_eq!(id.timestamp(), prev.timestamp());
                    assert_eq!(id.sequence(), prev.sequence() + 1);
                }
            }
            last = Some(id);
        }
    }

    #[test]
    fn sequence_overflow_borrows_next_millisecond() {
        let clock = MockClock::at(DEFAULT_EPOCH_MILLIS + 5);
        let generator = SnowflakeLongIdGenerator::new(1, DEFAULT_EPOCH_MILLIS, clock).unwrap();

        for expected_seq in 0..=SnowflakeId::MAX_SEQUENCE {
            let id = generator.next();
            assert_eq!(id.timestamp(), 5);
            assert_eq!(id.sequence(), expected_seq);
        }

        // Call 4097 within the frozen millisecond.
        let id = generator.next();
        assert_eq!(id.timestamp(), 6);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn rollback_pins_timestamp() {
        let clock = MockClock::at(DEFAULT_EPOCH_MILLIS + 10_000);
        let generator =
            SnowflakeLongIdGenerator::new(3, DEFAULT_EPOCH_MILLIS, clock.clone()).unwrap();
        let before = generator.next();

        clock.set(DEFAULT_EPOCH_MILLIS + 5_000);
        let after = generator.next();

        assert!(after > before);
        assert_eq!(after.timestamp(), before.timestamp());
        assert_eq!(after.sequence(), before.sequence() + 1);
    }

    #[test]
    fn concurrent_generation_is_unique() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50_000;

        let generator =
            SnowflakeLongIdGenerator::new(42, DEFAULT_EPOCH_MILLIS, WallClock).unwrap();
        let mut all = HashSet::with_capacity(THREADS * PER_THREAD);

        scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        let mut ids = Vec::with_capacity(PER_THREAD);
                        for _ in 0..PER_THREAD {
                            ids.push(generator.next().to_raw());
                        }
                        ids
                    })
                })
                .collect();
            for handle in handles {
                all.extend(handle.join().unwrap());
            }
        });

        assert_eq!(all.len(), THREADS * PER_THREAD);
    }
}
