//! Fungible-token ledger collaborator for Guildhall
//!
//! The governance engine never keeps balances in its own data structures;
//! every escrow, refund, tribute, and payout is an instruction to a
//! [`TokenLedger`]. The engine treats any non-success from the ledger as a
//! hard failure of the enclosing operation and commits none of its own
//! state in that case.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use guildhall_common::{Address, TokenAmount};

pub mod bank;
pub mod token;

pub use bank::GuildBank;
pub use token::InMemoryToken;

/// Error types for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Account holds less than the requested movement
    #[error("insufficient balance: {account} holds {held}, needs {needed}")]
    InsufficientBalance {
        account: Address,
        held: TokenAmount,
        needed: TokenAmount,
    },

    /// Spender is not approved for the requested amount
    #[error("insufficient allowance: {spender} approved for {approved}, needs {needed}")]
    InsufficientAllowance {
        spender: Address,
        approved: TokenAmount,
        needed: TokenAmount,
    },

    /// The reserved zero address cannot hold or move balance
    #[error("the zero address cannot hold balance")]
    ZeroAddress,

    /// Caller is not permitted to move these funds
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A single balance movement inside a settlement batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
}

impl Transfer {
    pub fn new(from: Address, to: Address, amount: TokenAmount) -> Self {
        Self { from, to, amount }
    }
}

/// The fungible balance ledger the governance engine settles against.
///
/// `transfer_from` and batch entries whose source is not the spender are
/// allowance-gated, ERC-20 style. [`apply`](TokenLedger::apply) is the
/// atomicity boundary for multi-step settlements: an implementation must
/// apply every transfer in the batch or none of them.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `from` to `to`.
    async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`,
    /// consuming `spender`'s allowance on `from`.
    async fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()>;

    /// Set `spender`'s allowance on `owner`'s balance.
    async fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()>;

    /// Remaining allowance of `spender` on `owner`'s balance.
    async fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount;

    /// Current balance of `account`.
    async fn balance_of(&self, account: &Address) -> TokenAmount;

    /// Apply a batch of transfers on behalf of `spender`, all-or-nothing.
    ///
    /// Entries whose `from` equals `spender` move the spender's own funds;
    /// all other entries consume the spender's allowance on the source
    /// account, as `transfer_from` does.
    async fn apply(&self, spender: &Address, batch: &[Transfer]) -> LedgerResult<()>;
}
