use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::generator::RollbackPolicy;
use crate::publicid::ResourceType;
use crate::time::DEFAULT_EPOCH_MILLIS;

/// Configuration for the whole id subsystem.
///
/// Everything here is loaded once at startup and validated at construction;
/// nothing is re-read per call. All fields have working defaults except
/// `long_id.node_id`, which must be set when the Snowflake strategy is
/// selected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    pub ulid: UlidConfig,
    pub long_id: LongIdConfig,
    pub segment: SegmentConfig,
    pub public_id: PublicIdConfig,
}

/// Which long-id strategy the service uses. Fixed at startup, never chosen
/// per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LongIdStrategy {
    /// Clock-based ids; needs a fleet-unique `node_id`, no shared storage.
    #[default]
    Snowflake,
    /// Batch-allocated dense ids; needs a [`crate::SegmentRepository`].
    Segment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LongIdConfig {
    pub strategy: LongIdStrategy,
    /// Node id in `0..=1023`, required for the Snowflake strategy. Fleet
    /// uniqueness is the deployment's responsibility.
    pub node_id: Option<u64>,
    /// Epoch the 41-bit timestamp counts from.
    pub epoch_millis: u64,
}

impl Default for LongIdConfig {
    fn default() -> Self {
        Self {
            strategy: LongIdStrategy::default(),
            node_id: None,
            epoch_millis: DEFAULT_EPOCH_MILLIS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Ids reserved per repository round-trip. Larger steps mean fewer
    /// round-trips and bigger gaps on restart.
    pub step: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { step: 1000 }
    }
}

/// How the ULID generator shares its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UlidMode {
    /// One shared state cell; strictly monotonic across all threads.
    #[default]
    SingleLock,
    /// Independent cells selected by thread; monotonic per thread, less
    /// contention under heavy parallel load.
    Striped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UlidConfig {
    pub mode: UlidMode,
    /// Number of stripes in [`UlidMode::Striped`]; ignored otherwise.
    pub stripe_count: usize,
    pub rollback: RollbackConfig,
}

impl Default for UlidConfig {
    fn default() -> Self {
        Self {
            mode: UlidMode::default(),
            stripe_count: default_stripe_count(),
            rollback: RollbackConfig::default(),
        }
    }
}

fn default_stripe_count() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackPolicyKind {
    /// Keep generating through a rollback of any magnitude.
    #[default]
    Tolerate,
    /// Refuse generation once the rollback exceeds the threshold.
    FailFast,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    pub policy: RollbackPolicyKind,
    /// Only read under [`RollbackPolicyKind::FailFast`].
    pub fail_fast_threshold_ms: u64,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            policy: RollbackPolicyKind::default(),
            fail_fast_threshold_ms: 5000,
        }
    }
}

impl RollbackConfig {
    /// The runtime policy this configuration selects.
    #[must_use]
    pub fn policy(&self) -> RollbackPolicy {
        match self.policy {
            RollbackPolicyKind::Tolerate => RollbackPolicy::Tolerate,
            RollbackPolicyKind::FailFast => RollbackPolicy::FailFast {
                threshold_ms: self.fail_fast_threshold_ms,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicIdConfig {
    /// Separator between prefix, payload, and checksum sections.
    pub separator: char,
    /// Lowercase the payload; decoding accepts either case.
    pub lower_case: bool,
    /// Append a CRC-8 checksum section.
    pub checksum_enabled: bool,
    /// Per-type prefix overrides; unlisted types use their defaults.
    pub prefixes: HashMap<ResourceType, String>,
}

impl Default for PublicIdConfig {
    fn default() -> Self {
        Self {
            separator: '_',
            lower_case: true,
            checksum_enabled: false,
            prefixes: HashMap::new(),
        }
    }
}
