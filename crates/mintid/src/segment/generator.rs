use core::array;
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use portable_atomic::{AtomicU128, Ordering};
use tracing::{debug, instrument};

use crate::{
    IdError, Result,
    segment::{IdScope, SegmentRepository},
};

/// Packs `(last_issued, end_inclusive)` into one CAS-able word, cursor in the
/// low half. Zero means "no range installed yet".
const fn pack(last: u64, end: u64) -> u128 {
    ((end as u128) << 64) | last as u128
}

const fn unpack(packed: u128) -> (u64, u64) {
    (packed as u64, (packed >> 64) as u64)
}

/// A segment-buffered long id generator.
///
/// Hands out dense, fleet-unique ids per [`IdScope`] by consuming ranges
/// reserved in batches from a shared [`SegmentRepository`]. The common case
/// is a single compare-and-swap on in-process state; a repository round-trip
/// happens once per `step` calls.
///
/// Guarantees: ids are unique across every process sharing the repository
/// (exclusivity comes from the repository's locked increment) and strictly
/// increasing within one process. They are **not** ordered across processes,
/// and **not** gapless across restarts: whatever remains of a range when the
/// process exits is forfeited.
///
/// Repository failures during a refill propagate to the caller unmodified;
/// there is no internal retry and no fallback counter. The slot is left
/// exhausted, so the next call simply tries the repository again.
pub struct SegmentLongIdGenerator {
    repository: Arc<dyn SegmentRepository>,
    step: u32,
    slots: [ScopeSlot; IdScope::COUNT],
}

struct ScopeSlot {
    state: CachePadded<AtomicU128>,
    /// Guards refill so concurrent exhaustion triggers one repository call.
    /// The flag records whether the scope row has been initialized.
    refill: Mutex<bool>,
}

impl ScopeSlot {
    fn new() -> Self {
        Self {
            state: CachePadded::new(AtomicU128::new(0)),
            refill: Mutex::new(false),
        }
    }
}

impl SegmentLongIdGenerator {
    /// Creates a generator allocating `step` ids per repository round-trip.
    ///
    /// # Errors
    /// Returns [`IdError::InvalidStep`] when `step` is zero. No I/O happens
    /// here; the first range for a scope is fetched on first use.
    pub fn new(repository: Arc<dyn SegmentRepository>, step: u32) -> Result<Self> {
        if step == 0 {
            return Err(IdError::InvalidStep);
        }
        Ok(Self {
            repository,
            step,
            slots: array::from_fn(|_| ScopeSlot::new()),
        })
    }

    /// The configured range size.
    #[must_use]
    pub const fn step(&self) -> u32 {
        self.step
    }

    /// Returns the next id for `scope`.
    ///
    /// # Errors
    /// Propagates repository errors from a refill; the steady state never
    /// fails.
    pub fn next(&self, scope: IdScope) -> Result<i64> {
        let slot = &self.slots[scope.index()];
        loop {
            let packed = slot.state.load(Ordering::Relaxed);
            let (last, end) = unpack(packed);
            if last < end {
                let next = last + 1;
                if slot
                    .state
                    .compare_exchange(packed, pack(next, end), Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    return Ok(next as i64);
                }
                // Another thread won the race; retry against the same range.
                continue;
            }
            self.refill(scope, slot)?;
        }
    }

    #[instrument(level = "debug", skip(self, slot))]
    fn refill(&self, scope: IdScope, slot: &ScopeSlot) -> Result<()> {
        let mut initialized = slot.refill.lock();

        // Another thread may have installed a range while we waited.
        let (last, end) = unpack(slot.state.load(Ordering::Relaxed));
        if last < end {
            return Ok(());
        }

        if !*initialized {
            self.repository.init_scope_if_absent(scope, 0, self.step)?;
            *initialized = true;
        }

        let range = self.repository.next_range(scope, self.step)?;
        debug!(
            %scope,
            start = range.start(),
            end = range.end(),
            "installed segment range"
        );
        // Racing allocators only see the old, exhausted word, so a plain
        // store cannot clobber an in-flight increment.
        slot.state
            .store(pack((range.start() - 1) as u64, range.end() as u64), Ordering::Relaxed);
        Ok(())
    }
}
