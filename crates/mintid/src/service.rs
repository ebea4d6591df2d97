use std::sync::Arc;

use tracing::info;

use crate::config::{IdConfig, LongIdStrategy, UlidMode};
use crate::generator::{MonotonicUlidGenerator, SnowflakeLongIdGenerator, StripedUlidGenerator};
use crate::publicid::{DecodedPublicId, PublicId, PublicIdCodec, ResourceType};
use crate::rand::{RandSource, ThreadRandom};
use crate::segment::{IdScope, SegmentLongIdGenerator, SegmentRepository};
use crate::time::{TimeSource, WallClock};
use crate::{IdError, Result, Ulid128};

/// The composition point for the id subsystem.
///
/// Owns one ULID provider, one long-id provider, and the public id codec;
/// every operation delegates. The long-id strategy is selected once at
/// construction and never per call.
///
/// Construct one instance at process startup and share it; generators keep
/// private monotonic state that must not be duplicated per call site.
///
/// # Example
/// ```
/// use mintid::{IdConfig, IdScope, IdService, ResourceType};
///
/// let mut config = IdConfig::default();
/// config.long_id.node_id = Some(7);
///
/// let ids = IdService::from_config(&config, None).unwrap();
/// let order_id = ids.next_long(IdScope::Order).unwrap();
/// assert!(order_id > 0);
///
/// let public = ids.next_public_id(ResourceType::Order).unwrap();
/// ids.validate_public_id(ResourceType::Order, public.as_str()).unwrap();
/// ```
pub struct IdService<C = WallClock, R = ThreadRandom>
where
    C: TimeSource + Clone,
    R: RandSource + Clone,
{
    ulid: UlidProvider<C, R>,
    long_id: LongIdProvider<C>,
    codec: PublicIdCodec,
}

enum UlidProvider<C, R> {
    Single(MonotonicUlidGenerator<C, R>),
    Striped(StripedUlidGenerator<C, R>),
}

enum LongIdProvider<C> {
    Snowflake(SnowflakeLongIdGenerator<C>),
    Segment(SegmentLongIdGenerator),
}

impl IdService {
    /// Builds the service from configuration with the system clock and RNG.
    ///
    /// `repository` is required when `long_id.strategy` is `SEGMENT` and
    /// ignored otherwise.
    ///
    /// # Errors
    /// Any construction-time validation failure: missing or out-of-range
    /// node id, zero step, missing repository, bad stripe count, or an
    /// invalid prefix table.
    pub fn from_config(
        config: &IdConfig,
        repository: Option<Arc<dyn SegmentRepository>>,
    ) -> Result<Self> {
        Self::with_parts(config, repository, WallClock, ThreadRandom)
    }
}

impl<C, R> IdService<C, R>
where
    C: TimeSource + Clone,
    R: RandSource + Clone,
{
    /// Builds the service with an injected clock and random source, so tests
    /// can drive rollback and burst scenarios deterministically.
    pub fn with_parts(
        config: &IdConfig,
        repository: Option<Arc<dyn SegmentRepository>>,
        clock: C,
        rng: R,
    ) -> Result<Self> {
        let rollback = config.ulid.rollback.policy();
        let ulid = match config.ulid.mode {
            UlidMode::SingleLock => UlidProvider::Single(MonotonicUlidGenerator::with_rollback(
                clock.clone(),
                rng,
                rollback,
            )),
            UlidMode::Striped => UlidProvider::Striped(StripedUlidGenerator::new(
                config.ulid.stripe_count,
                clock.clone(),
                rng,
                rollback,
            )?),
        };

        let long_id = match config.long_id.strategy {
            LongIdStrategy::Snowflake => {
                let node_id = config.long_id.node_id.ok_or(IdError::MissingNodeId)?;
                LongIdProvider::Snowflake(SnowflakeLongIdGenerator::new(
                    node_id,
                    config.long_id.epoch_millis,
                    clock,
                )?)
            }
            LongIdStrategy::Segment => {
                let repository = repository.ok_or(IdError::MissingSegmentRepository)?;
                LongIdProvider::Segment(SegmentLongIdGenerator::new(
                    repository,
                    config.segment.step,
                )?)
            }
        };

        let codec = PublicIdCodec::new(&config.public_id)?;

        info!(
            strategy = ?config.long_id.strategy,
            ulid_mode = ?config.ulid.mode,
            "id service ready"
        );

        Ok(Self {
            ulid,
            long_id,
            codec,
        })
    }

    /// Returns the next ULID, monotonic per instance.
    pub fn next_ulid(&self) -> Result<Ulid128> {
        match &self.ulid {
            UlidProvider::Single(generator) => generator.next(),
            UlidProvider::Striped(generator) => generator.next(),
        }
    }

    /// Returns the next ULID in its canonical 26-character form.
    pub fn next_ulid_string(&self) -> Result<String> {
        Ok(self.next_ulid()?.encode())
    }

    /// Returns the next ULID as 16 big-endian bytes.
    pub fn next_ulid_bytes(&self) -> Result<[u8; 16]> {
        Ok(self.next_ulid()?.to_bytes())
    }

    /// Returns the next long id, always positive.
    ///
    /// Under the Snowflake strategy the scope is ignored — every scope draws
    /// from the same clock-ordered sequence. Under the Segment strategy each
    /// scope has its own dense counter.
    pub fn next_long(&self, scope: IdScope) -> Result<i64> {
        match &self.long_id {
            LongIdProvider::Snowflake(generator) => Ok(generator.next().as_i64()),
            LongIdProvider::Segment(generator) => generator.next(scope),
        }
    }

    /// Mints a public id for a resource type: a fresh ULID in its typed
    /// external encoding.
    pub fn next_public_id(&self, resource: ResourceType) -> Result<PublicId> {
        Ok(self.codec.encode(resource, self.next_ulid()?))
    }

    /// Decodes an external id string back into `(resource, id)`.
    pub fn decode_public_id(&self, public_id: &str) -> Result<DecodedPublicId> {
        Ok(self.codec.decode(public_id)?)
    }

    /// Decodes and asserts the resource type; the type-confusion guard.
    pub fn validate_public_id(
        &self,
        expected: ResourceType,
        public_id: &str,
    ) -> Result<DecodedPublicId> {
        Ok(self.codec.validate(expected, public_id)?)
    }

    /// The codec, for callers that encode ids they already hold.
    #[must_use]
    pub fn public_id_codec(&self) -> &PublicIdCodec {
        &self.codec
    }
}
