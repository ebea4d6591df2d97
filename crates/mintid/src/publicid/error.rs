use thiserror::Error;

use crate::base32::Base32Error;
use crate::publicid::ResourceType;

/// Why a public id string was rejected.
///
/// Every variant except `TypeMismatch` means "not parseable"; `TypeMismatch`
/// means the string is a valid id for a *different* resource type. Callers
/// typically map the two categories to different externally visible outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PublicIdError {
    /// Wrong number of separator-delimited sections, or an empty section.
    #[error("malformed public id")]
    Malformed,

    #[error("unknown public id prefix `{prefix}`")]
    UnknownPrefix { prefix: String },

    /// The payload section is not a well-formed 26-character encoding.
    #[error("invalid public id payload")]
    Payload(#[from] Base32Error),

    #[error("public id checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The id parsed, but belongs to another resource type. This is the
    /// type-confusion guard.
    #[error("public id type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ResourceType,
        actual: ResourceType,
    },
}
