use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 63-bit time-ordered identifier.
///
/// - 1 sign bit, always zero, so the value is a positive `i64`
/// - 41 bits of epoch-relative millisecond timestamp
/// - 10 bits of node id
/// - 12 bits of per-millisecond sequence
///
/// ```text
///  Bit Index:  63 62          22 21      12 11         0
///              +--+--------------+----------+-----------+
///  Field:      | 0| timestamp(41)| node (10)| seq (12)  |
///              +--+--------------+----------+-----------+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    pub const TIMESTAMP_BITS: u32 = 41;
    pub const NODE_BITS: u32 = 10;
    pub const SEQUENCE_BITS: u32 = 12;

    pub const NODE_SHIFT: u32 = Self::SEQUENCE_BITS;
    pub const TIMESTAMP_SHIFT: u32 = Self::SEQUENCE_BITS + Self::NODE_BITS;

    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;
    pub const NODE_MASK: u64 = (1 << Self::NODE_BITS) - 1;
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    pub const MAX_NODE_ID: u64 = Self::NODE_MASK;
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    /// Composes an id from its fields. Each field is masked to its width, so
    /// a timestamp past the 41-bit range wraps rather than touching the sign
    /// bit.
    #[must_use]
    pub const fn from_parts(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let t = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let n = (node_id & Self::NODE_MASK) << Self::NODE_SHIFT;
        let s = sequence & Self::SEQUENCE_MASK;
        Self { id: t | n | s }
    }

    /// Extracts the epoch-relative millisecond timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node id.
    #[must_use]
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_SHIFT) & Self::NODE_MASK
    }

    /// Extracts the per-millisecond sequence.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.id & Self::SEQUENCE_MASK
    }

    /// Converts this type into its raw representation.
    #[must_use]
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Converts a raw representation into this type.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// The id as a positive signed 64-bit integer, the form handed to
    /// callers and persisted in numeric columns.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.id as i64
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.as_i64()
    }
}

impl Serialize for SnowflakeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        if raw < 0 {
            return Err(serde::de::Error::custom("snowflake id must be positive"));
        }
        Ok(Self::from_raw(raw as u64))
    }
}
