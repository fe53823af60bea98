//! In-memory token ledger
//!
//! A self-contained [`TokenLedger`] implementation holding balances and
//! allowances behind a single lock, so a settlement batch can be validated
//! against a staged copy and committed atomically.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use guildhall_common::{Address, TokenAmount};

use crate::{LedgerError, LedgerResult, TokenLedger, Transfer};

#[derive(Debug, Default, Clone)]
struct TokenState {
    balances: HashMap<Address, TokenAmount>,
    allowances: HashMap<Address, HashMap<Address, TokenAmount>>,
}

impl TokenState {
    fn balance_of(&self, account: &Address) -> TokenAmount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn debit(&mut self, account: &Address, amount: TokenAmount) -> LedgerResult<()> {
        let held = self.balance_of(account);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.clone(),
                held,
                needed: amount,
            });
        }
        self.balances.insert(account.clone(), held - amount);
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: TokenAmount) {
        let held = self.balance_of(account);
        self.balances.insert(account.clone(), held + amount);
    }

    fn consume_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()> {
        let approved = self.allowance(owner, spender);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                spender: spender.clone(),
                approved,
                needed: amount,
            });
        }
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), approved - amount);
        Ok(())
    }

    fn execute(
        &mut self,
        spender: Option<&Address>,
        transfer: &Transfer,
    ) -> LedgerResult<()> {
        if transfer.from.is_zero() || transfer.to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if let Some(spender) = spender {
            if *spender != transfer.from {
                self.consume_allowance(&transfer.from, spender, transfer.amount)?;
            }
        }
        self.debit(&transfer.from, transfer.amount)?;
        self.credit(&transfer.to, transfer.amount);
        Ok(())
    }
}

/// An in-memory fungible token with a fixed initial supply.
pub struct InMemoryToken {
    supply: TokenAmount,
    state: RwLock<TokenState>,
}

impl InMemoryToken {
    /// Create a token minting the whole `supply` to `initial_holder`.
    pub fn new(initial_holder: &Address, supply: TokenAmount) -> Self {
        let mut state = TokenState::default();
        state.credit(initial_holder, supply);
        Self {
            supply,
            state: RwLock::new(state),
        }
    }

    /// Total supply, fixed at construction.
    pub fn total_supply(&self) -> TokenAmount {
        self.supply
    }
}

#[async_trait]
impl TokenLedger for InMemoryToken {
    async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()> {
        let mut state = self.state.write().await;
        state.execute(None, &Transfer::new(from.clone(), to.clone(), amount))?;
        debug!(%from, %to, amount, "transfer");
        Ok(())
    }

    async fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()> {
        let mut state = self.state.write().await;
        state.execute(
            Some(spender),
            &Transfer::new(from.clone(), to.clone(), amount),
        )?;
        debug!(%spender, %from, %to, amount, "transfer_from");
        Ok(())
    }

    async fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> LedgerResult<()> {
        if owner.is_zero() || spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let mut state = self.state.write().await;
        state
            .allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
        Ok(())
    }

    async fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.state.read().await.allowance(owner, spender)
    }

    async fn balance_of(&self, account: &Address) -> TokenAmount {
        self.state.read().await.balance_of(account)
    }

    async fn apply(&self, spender: &Address, batch: &[Transfer]) -> LedgerResult<()> {
        let mut state = self.state.write().await;
        // Validate and apply against a staged copy, then commit, so a
        // failing entry leaves the ledger untouched.
        let mut staged = state.clone();
        for transfer in batch {
            staged.execute(Some(spender), transfer)?;
        }
        *state = staged;
        debug!(%spender, steps = batch.len(), "applied settlement batch");
        Ok(())
    }
}
