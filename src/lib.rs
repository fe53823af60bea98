//! Guildhall
//!
//! A membership-governed treasury. A fixed set of members hold
//! non-transferable shares that carry both voting weight and a proportional
//! claim on a pooled fund. Shares are granted only through a
//! proposal-and-vote process, voting weight may be delegated one level deep,
//! and any member may exit at any time by burning shares for a proportional
//! payout.
//!
//! The workspace is split into three crates, re-exported here:
//! - [`common`]: shared value types, configuration, and logging setup
//! - [`ledger`]: the fungible-token collaborator and the guild bank custodian
//! - [`governance`]: the governance state machine itself

pub use guildhall_common as common;
pub use guildhall_governance as governance;
pub use guildhall_ledger as ledger;
