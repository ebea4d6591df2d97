use core::fmt;

use serde::{Deserialize, Serialize};

/// One logical counter family for segment-allocated long ids.
///
/// Each scope maps to one row in the backing store; ids are dense within a
/// scope and unrelated across scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScope {
    Tenant,
    Store,
    Member,
    Order,
    Payment,
    Wallet,
    Coupon,
}

impl IdScope {
    pub const ALL: [IdScope; 7] = [
        IdScope::Tenant,
        IdScope::Store,
        IdScope::Member,
        IdScope::Order,
        IdScope::Payment,
        IdScope::Wallet,
        IdScope::Coupon,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Stable name used as the persisted row key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IdScope::Tenant => "tenant",
            IdScope::Store => "store",
            IdScope::Member => "member",
            IdScope::Order => "order",
            IdScope::Payment => "payment",
            IdScope::Wallet => "wallet",
            IdScope::Coupon => "coupon",
        }
    }

    pub(crate) const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for IdScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
