use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Ulid128;

/// Kinds of business entities that receive externally visible ids.
///
/// Each variant is bound to a short prefix so that an id string names its own
/// type; the codec rejects an id presented under the wrong type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Tenant,
    Store,
    Member,
    Order,
    Payment,
    Wallet,
    Coupon,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Tenant,
        ResourceType::Store,
        ResourceType::Member,
        ResourceType::Order,
        ResourceType::Payment,
        ResourceType::Wallet,
        ResourceType::Coupon,
    ];

    /// Prefix used when the configuration does not override it.
    #[must_use]
    pub const fn default_prefix(&self) -> &'static str {
        match self {
            ResourceType::Tenant => "tnt",
            ResourceType::Store => "sto",
            ResourceType::Member => "mbr",
            ResourceType::Order => "ord",
            ResourceType::Payment => "pay",
            ResourceType::Wallet => "wlt",
            ResourceType::Coupon => "cpn",
        }
    }

    pub(crate) const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Tenant => "tenant",
            ResourceType::Store => "store",
            ResourceType::Member => "member",
            ResourceType::Order => "order",
            ResourceType::Payment => "payment",
            ResourceType::Wallet => "wallet",
            ResourceType::Coupon => "coupon",
        };
        f.write_str(name)
    }
}

/// An externally visible, typed id string.
///
/// Produced by [`crate::PublicIdCodec::encode`]; the inner string is opaque
/// to callers and safe to expose across API boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PublicId {
    #[serde(skip)]
    resource: ResourceType,
    value: String,
}

impl PublicId {
    pub(crate) fn new(resource: ResourceType, value: String) -> Self {
        Self { resource, value }
    }

    /// The resource type the id was minted for.
    #[must_use]
    pub const fn resource(&self) -> ResourceType {
        self.resource
    }

    /// The encoded string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for PublicId {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// A public id decoded back into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPublicId {
    pub resource: ResourceType,
    pub id: Ulid128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefixes_are_distinct_and_well_formed() {
        let mut seen = std::collections::HashSet::new();
        for resource in ResourceType::ALL {
            let prefix = resource.default_prefix();
            assert!(seen.insert(prefix));
            assert!(prefix.len() >= 2 && prefix.len() <= 10);
            assert!(prefix.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn indexes_cover_the_prefix_table() {
        for (i, resource) in ResourceType::ALL.iter().enumerate() {
            assert_eq!(resource.index(), i);
        }
    }
}
