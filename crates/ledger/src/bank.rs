//! Guild bank
//!
//! The custodian of the pooled fund. The bank's balance lives at its own
//! ledger address; it never initiates movements on its own and only the
//! owning governance engine may instruct a withdrawal.

use std::sync::Arc;

use tracing::info;

use guildhall_common::{Address, TokenAmount};

use crate::{LedgerError, LedgerResult, TokenLedger};

/// Treasury custodian for the pooled fund.
pub struct GuildBank {
    address: Address,
    owner: Address,
    ledger: Arc<dyn TokenLedger>,
}

impl GuildBank {
    /// Create a bank holding funds at `address`, controlled by `owner`.
    pub fn new(address: Address, owner: Address, ledger: Arc<dyn TokenLedger>) -> Self {
        Self {
            address,
            owner,
            ledger,
        }
    }

    /// The ledger address holding the pooled fund.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Current balance of the pooled fund.
    pub async fn balance(&self) -> TokenAmount {
        self.ledger.balance_of(&self.address).await
    }

    /// Pay `amount` from the pooled fund to `to`.
    ///
    /// Only the owner recorded at construction may withdraw.
    pub async fn withdraw(
        &self,
        caller: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()> {
        if caller != &self.owner {
            return Err(LedgerError::Unauthorized(format!(
                "{} is not the bank owner",
                caller
            )));
        }
        self.ledger.transfer(&self.address, to, amount).await?;
        info!(%to, amount, "guild bank withdrawal");
        Ok(())
    }
}
