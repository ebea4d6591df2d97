use thiserror::Error;

use crate::publicid::PublicIdError;
use crate::segment::IdScope;

/// A result type defaulting to the crate-wide error.
pub type Result<T, E = IdError> = core::result::Result<T, E>;

/// All errors the id subsystem can produce.
///
/// Construction-time variants (`InvalidNodeId`, `InvalidStep`,
/// `InvalidStripeCount`, `MissingNodeId`, `MissingSegmentRepository`,
/// `InvalidSeparator`, `InvalidPrefix`, `DuplicatePrefix`) surface before the
/// first id is generated. At runtime the generators are total except for two
/// cases: a fail-fast clock rollback, and a segment repository failure, which
/// is propagated to the caller unmodified.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdError {
    /// The clock rolled back further than the configured fail-fast threshold.
    ///
    /// Generation is refused until the clock catches back up to the last
    /// embedded timestamp.
    #[error("clock rolled back {rollback_ms}ms, beyond the {threshold_ms}ms threshold")]
    ClockRollback { rollback_ms: u64, threshold_ms: u64 },

    #[error("node id {node_id} out of range 0..={max}")]
    InvalidNodeId { node_id: u64, max: u64 },

    #[error("segment step must be greater than 0")]
    InvalidStep,

    #[error("ulid stripe count {stripes} out of range 1..={max}")]
    InvalidStripeCount { stripes: usize, max: usize },

    #[error("long id strategy SNOWFLAKE requires long_id.node_id to be configured")]
    MissingNodeId,

    #[error("long id strategy SEGMENT requires a segment repository")]
    MissingSegmentRepository,

    /// The backing store has no counter row for the scope.
    #[error("segment scope `{scope}` has no counter row")]
    ScopeNotInitialized { scope: IdScope },

    /// A repository round-trip failed during a segment refill.
    #[error("segment allocation failed for scope `{scope}`")]
    SegmentUnavailable {
        scope: IdScope,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("public id separator `{separator}` collides with the payload alphabet")]
    InvalidSeparator { separator: char },

    #[error("public id prefix `{prefix}` must match [a-z0-9]{{2,10}}")]
    InvalidPrefix { prefix: String },

    #[error("public id prefix `{prefix}` is mapped to more than one resource type")]
    DuplicatePrefix { prefix: String },

    #[error(transparent)]
    PublicId(#[from] PublicIdError),
}
