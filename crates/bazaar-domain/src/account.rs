//! Account domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

/// The two principal kinds that authenticate against the platform.
///
/// Wire format: lowercase string (`"seller"` / `"customer"`), used in URL
/// paths, token claims and the `account_kind` storage columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Seller,
    Customer,
}

impl AccountKind {
    /// Order in which the gate searches the token stores.
    pub const RESOLUTION_ORDER: [AccountKind; 2] = [AccountKind::Customer, AccountKind::Seller];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seller" => Ok(Self::Seller),
            "customer" => Ok(Self::Customer),
            other => Err(UnknownVariant {
                kind: "account kind",
                value: other.to_owned(),
            }),
        }
    }
}

/// Verification state of an account.
///
/// Only ever moves `Pending -> Enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Enabled,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Enabled => "enabled",
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl FromStr for AccountStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "enabled" => Ok(Self::Enabled),
            other => Err(UnknownVariant {
                kind: "account status",
                value: other.to_owned(),
            }),
        }
    }
}
