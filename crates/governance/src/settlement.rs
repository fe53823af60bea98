//! Two-phase settlement
//!
//! Every operation that moves funds first builds a [`SettlementPlan`] from
//! the current state (a pure computation), then executes the whole plan
//! through the ledger as one all-or-nothing batch. Engine state commits
//! only after the batch succeeds, so a ledger failure leaves no observable
//! mutation in either system.

use guildhall_common::{Address, TokenAmount};
use guildhall_ledger::{LedgerResult, TokenLedger, Transfer};

/// An ordered set of balance movements settled as one batch.
#[derive(Debug, Default, Clone)]
pub struct SettlementPlan {
    transfers: Vec<Transfer>,
}

impl SettlementPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a movement to the plan. Zero-amount movements are elided.
    pub fn push(&mut self, from: &Address, to: &Address, amount: TokenAmount) {
        if amount == 0 {
            return;
        }
        self.transfers
            .push(Transfer::new(from.clone(), to.clone(), amount));
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Execute the plan through the ledger on behalf of `spender`.
    pub async fn execute(
        &self,
        spender: &Address,
        ledger: &dyn TokenLedger,
    ) -> LedgerResult<()> {
        if self.transfers.is_empty() {
            return Ok(());
        }
        ledger.apply(spender, &self.transfers).await
    }
}
