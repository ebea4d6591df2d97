use core::cmp;
use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use crossbeam_utils::CachePadded;
use portable_atomic::{AtomicU128, Ordering};
use tracing::warn;

use crate::{IdError, RandSource, Result, TimeSource, Ulid128};

/// What to do when the clock reports a time earlier than the last embedded
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Absorb the rollback by incrementing the previous value; generation
    /// stays total and monotonic. The default.
    Tolerate,
    /// Refuse generation with [`IdError::ClockRollback`] once the rollback
    /// exceeds `threshold_ms`; smaller rollbacks are still absorbed.
    FailFast { threshold_ms: u64 },
}

impl Default for RollbackPolicy {
    fn default() -> Self {
        Self::Tolerate
    }
}

/// A lock-free monotonic ULID generator.
///
/// Every returned value is strictly greater, as an unsigned 128-bit integer,
/// than every value previously returned by the same instance. Uniqueness
/// across uncoordinated processes rests on the 80-bit random payload drawn on
/// each new millisecond tick.
///
/// State is one shared [`AtomicU128`] updated by compare-and-swap: snapshot,
/// compute a candidate, commit, retry on contention. The hot path performs no
/// I/O and never blocks, so the operation is linearizable and cannot
/// deadlock.
///
/// # Example
/// ```
/// use mintid::{MonotonicUlidGenerator, ThreadRandom, WallClock};
///
/// let generator = MonotonicUlidGenerator::new(WallClock, ThreadRandom);
/// let a = generator.next().unwrap();
/// let b = generator.next().unwrap();
/// assert!(b > a);
/// ```
pub struct MonotonicUlidGenerator<C, R> {
    state: CachePadded<AtomicU128>,
    clock: C,
    rng: R,
    rollback: RollbackPolicy,
}

impl<C, R> MonotonicUlidGenerator<C, R>
where
    C: TimeSource,
    R: RandSource,
{
    /// Creates a generator with the default tolerant rollback policy.
    pub fn new(clock: C, rng: R) -> Self {
        Self::with_rollback(clock, rng, RollbackPolicy::Tolerate)
    }

    /// Creates a generator with an explicit rollback policy.
    pub fn with_rollback(clock: C, rng: R, rollback: RollbackPolicy) -> Self {
        Self {
            state: CachePadded::new(AtomicU128::new(0)),
            clock,
            rng,
            rollback,
        }
    }

    /// Returns the next ULID.
    ///
    /// Total under [`RollbackPolicy::Tolerate`]. Under `FailFast`, a clock
    /// rollback beyond the threshold is refused with
    /// [`IdError::ClockRollback`] carrying the measured magnitude; calls
    /// succeed again once the clock catches back up.
    pub fn next(&self) -> Result<Ulid128> {
        loop {
            let now = self.clock.current_millis() & Ulid128::max_timestamp();

            let current_raw = self.state.load(Ordering::Relaxed);
            let current = Ulid128::from_raw(current_raw);
            let last_ts = current.timestamp();

            let candidate = match now.cmp(&last_ts) {
                // New tick: fresh random payload.
                cmp::Ordering::Greater => Ulid128::from_parts(now, self.rng.rand()),
                // Same tick: bump the payload, carry into the timestamp on a
                // full 80-bit wrap.
                cmp::Ordering::Equal => current.increment(),
                // The clock moved backward: keep counting from the previous
                // value so the embedded timestamp runs ahead of the wall
                // clock until it recovers.
                cmp::Ordering::Less => {
                    self.check_rollback(last_ts - now)?;
                    current.increment()
                }
            };

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
                return Ok(candidate);
            }
            // Another thread won the race; retry with a fresh snapshot.
        }
    }

    #[cold]
    #[inline(never)]
    fn check_rollback(&self, rollback_ms: u64) -> Result<()> {
        if let RollbackPolicy::FailFast { threshold_ms } = self.rollback {
            if rollback_ms > threshold_ms {
                warn!(rollback_ms, threshold_ms, "refusing ulid generation");
                return Err(IdError::ClockRollback {
                    rollback_ms,
                    threshold_ms,
                });
            }
        }
        Ok(())
    }
}

/// Shards ULID generation across independent CAS cells to reduce contention.
///
/// Each calling thread maps to one stripe by a stable thread-id hash, so the
/// values observed by a single thread are strictly increasing. Time-ordering
/// and uniqueness hold across stripes; the global strict order of the
/// single-cell generator is given up, which is the point of striping.
pub struct StripedUlidGenerator<C, R> {
    stripes: Vec<MonotonicUlidGenerator<C, R>>,
}

impl<C, R> StripedUlidGenerator<C, R>
where
    C: TimeSource + Clone,
    R: RandSource + Clone,
{
    pub const MAX_STRIPES: usize = 1024;

    /// Creates `stripes` independent generators sharing one clock and RNG.
    pub fn new(stripes: usize, clock: C, rng: R, rollback: RollbackPolicy) -> Result<Self> {
        if stripes == 0 || stripes > Self::MAX_STRIPES {
            return Err(IdError::InvalidStripeCount {
                stripes,
                max: Self::MAX_STRIPES,
            });
        }
        let stripes = (0..stripes)
            .map(|_| MonotonicUlidGenerator::with_rollback(clock.clone(), rng.clone(), rollback))
            .collect();
        Ok(Self { stripes })
    }

    /// Returns the next ULID from the calling thread's stripe.
    pub fn next(&self) -> Result<Ulid128> {
        self.stripes[self.stripe_index()].next()
    }

    /// Number of stripes.
    #[must_use]
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    fn stripe_index(&self) -> usize {
        let mut hasher = DefaultHasher::new();
        std::thread::current().id().hash(&mut hasher);
        (hasher.finish() as usize) % self.stripes.len()
    }
}
