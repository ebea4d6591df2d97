use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::base32::{self, Base32Error};

/// A 128-bit time-ordered identifier.
///
/// - 48 bits of millisecond timestamp
/// - 80 bits of random/incrementing payload
///
/// ```text
///  Bit Index:  127            80 79           0
///              +----------------+-------------+
///  Field:      | timestamp (48) | random (80) |
///              +----------------+-------------+
///              |<-- MSB -- 128 bits -- LSB -->|
/// ```
///
/// Ordering is the unsigned 128-bit order, so values sort by timestamp first
/// and payload second, both numerically and in the canonical string encoding.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Ulid128 {
    id: u128,
}

impl Ulid128 {
    pub const TIMESTAMP_BITS: u32 = 48;
    pub const RANDOM_BITS: u32 = 80;

    pub const TIMESTAMP_MASK: u128 = (1 << Self::TIMESTAMP_BITS) - 1;
    pub const RANDOM_MASK: u128 = (1 << Self::RANDOM_BITS) - 1;

    /// Length of the canonical Crockford base32 encoding.
    pub const ENCODED_LEN: usize = base32::ENCODED_U128_LEN;

    /// Composes an id from a millisecond timestamp and an 80-bit payload.
    ///
    /// Both components are masked to their field width; payload overflow is
    /// expected during carry propagation and is handled by the caller.
    #[must_use]
    pub const fn from_parts(timestamp: u64, random: u128) -> Self {
        let t = (timestamp as u128 & Self::TIMESTAMP_MASK) << Self::RANDOM_BITS;
        let r = random & Self::RANDOM_MASK;
        Self { id: t | r }
    }

    /// Extracts the millisecond timestamp from the top 48 bits.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::RANDOM_BITS) as u64
    }

    /// Extracts the 80-bit payload.
    #[must_use]
    pub const fn random(&self) -> u128 {
        self.id & Self::RANDOM_MASK
    }

    /// Maximum representable timestamp value.
    #[must_use]
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK as u64
    }

    /// Maximum representable payload value.
    #[must_use]
    pub const fn max_random() -> u128 {
        Self::RANDOM_MASK
    }

    /// Returns the next value in unsigned 128-bit order: payload + 1, with a
    /// full 80-bit wrap carrying into the timestamp.
    ///
    /// The carry is what keeps generation monotonic through bursts and clock
    /// rollback; the embedded timestamp may then run ahead of the wall clock.
    #[must_use]
    pub const fn increment(&self) -> Self {
        if self.random() == Self::RANDOM_MASK {
            Self::from_parts(self.timestamp() + 1, 0)
        } else {
            Self { id: self.id + 1 }
        }
    }

    /// High 64-bit word: the 48 timestamp bits plus the top 16 payload bits.
    #[must_use]
    pub const fn high(&self) -> u64 {
        (self.id >> 64) as u64
    }

    /// Low 64-bit word of the payload.
    #[must_use]
    pub const fn low(&self) -> u64 {
        self.id as u64
    }

    /// Recomposes an id from its two 64-bit words.
    #[must_use]
    pub const fn from_words(high: u64, low: u64) -> Self {
        Self {
            id: ((high as u128) << 64) | low as u128,
        }
    }

    /// 16-byte big-endian form; byte order sorts the same as the value.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 16] {
        self.id.to_be_bytes()
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self {
            id: u128::from_be_bytes(bytes),
        }
    }

    /// Converts this type into its raw representation.
    #[must_use]
    pub const fn to_raw(&self) -> u128 {
        self.id
    }

    /// Converts a raw representation into this type.
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self { id: raw }
    }

    /// Writes the canonical 26-character encoding into `buf` and returns it
    /// as a string slice. No heap allocation.
    pub fn encode_into<'buf>(&self, buf: &'buf mut [u8; Self::ENCODED_LEN]) -> &'buf str {
        base32::encode_u128(self.id, buf);
        // SAFETY: `buf` holds only Crockford base32 ASCII characters.
        unsafe { core::str::from_utf8_unchecked(buf) }
    }

    /// Returns the canonical 26-character encoding as an owned string.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut buf = [0_u8; Self::ENCODED_LEN];
        self.encode_into(&mut buf).to_owned()
    }

    /// Decodes a 26-character Crockford base32 string.
    ///
    /// Lower-case input and the Crockford aliases are accepted.
    pub fn decode(s: &str) -> Result<Self, Base32Error> {
        base32::decode_u128(s).map(Self::from_raw)
    }
}

impl fmt::Display for Ulid128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0_u8; Self::ENCODED_LEN];
        f.write_str(self.encode_into(&mut buf))
    }
}

impl fmt::Debug for Ulid128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ulid128")
            .field("id", &format_args!("{} (0x{:x})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("random", &format_args!("0x{:x}", self.random()))
            .finish()
    }
}

impl FromStr for Ulid128 {
    type Err = Base32Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<&str> for Ulid128 {
    type Error = Base32Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::decode(s)
    }
}

impl From<Ulid128> for u128 {
    fn from(id: Ulid128) -> Self {
        id.to_raw()
    }
}

impl Serialize for Ulid128 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0_u8; Self::ENCODED_LEN];
        serializer.serialize_str(self.encode_into(&mut buf))
    }
}

impl<'de> Deserialize<'de> for Ulid128 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}
