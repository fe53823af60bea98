//! Core value types shared across the Guildhall crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A number of membership shares. Shares are indivisible.
pub type ShareAmount = u64;

/// An amount of the approved token.
pub type TokenAmount = u64;

/// Upper bound on shares that can ever exist, counting outstanding
/// requests. Keeps the vote and payout arithmetic clear of overflow.
pub const MAX_SHARES: ShareAmount = 1_000_000_000_000_000_000;

/// An account address on the ledger.
///
/// Addresses identify members, applicants, delegate keys, and the escrow
/// accounts of the engine and the guild bank. The reserved zero address is
/// never a valid member, applicant, or delegate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from its string form.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// The reserved zero address.
    pub fn zero() -> Self {
        Self("0x0".to_string())
    }

    /// Whether this is the reserved zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == "0x0"
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

impl From<String> for Address {
    fn from(addr: String) -> Self {
        Self(addr)
    }
}
