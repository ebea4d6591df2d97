use std::time::{SystemTime, UNIX_EPOCH};

/// Default Snowflake epoch: Monday, January 1, 2024 00:00:00 UTC.
///
/// A recent epoch keeps the 41-bit timestamp field usable for roughly 69
/// years from that date.
pub const DEFAULT_EPOCH_MILLIS: u64 = 1_704_067_200_000;

/// A source of "now" in milliseconds since the Unix epoch.
///
/// The generators never read the system clock directly; they go through this
/// trait so that rollback and overflow scenarios can be reproduced
/// deterministically in tests.
///
/// # Example
///
/// ```
/// use mintid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

/// The system wall clock.
///
/// Subject to NTP adjustment and VM-migration jumps; the generators
/// compensate for backward movement, so no smoothing is done here.
#[derive(Default, Clone, Debug)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
