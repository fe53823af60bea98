//! Delegation index
//!
//! Live delegation edges, one outgoing edge per delegator at most. Each
//! delegate maps to a growable array of its delegators plus a side table
//! from delegator to array position, so removal swaps the target with the
//! last element and repoints the moved entry in O(1). The delegated-share
//! aggregate per delegate is maintained incrementally, never recomputed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use guildhall_common::{Address, ShareAmount};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DelegationIndex {
    /// Delegate -> ordered delegator array
    delegators: HashMap<Address, Vec<Address>>,
    /// Delegate -> delegator -> position in the array
    positions: HashMap<Address, HashMap<Address, usize>>,
    /// Delegator -> delegate; the one-live-edge partial function
    delegate_of: HashMap<Address, Address>,
    /// Delegate -> sum of delegator shares
    shares_delegated: HashMap<Address, ShareAmount>,
}

impl DelegationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the edge `delegator -> delegate` carrying `shares`.
    ///
    /// The caller must have checked that `delegator` has no live edge.
    pub fn add_edge(&mut self, delegator: Address, delegate: Address, shares: ShareAmount) {
        let array = self.delegators.entry(delegate.clone()).or_default();
        let position = array.len();
        array.push(delegator.clone());
        self.positions
            .entry(delegate.clone())
            .or_default()
            .insert(delegator.clone(), position);
        *self.shares_delegated.entry(delegate.clone()).or_insert(0) += shares;
        self.delegate_of.insert(delegator, delegate);
    }

    /// Remove the edge `delegator -> delegate` carrying `shares`.
    ///
    /// Returns false if no such edge exists.
    pub fn remove_edge(
        &mut self,
        delegator: &Address,
        delegate: &Address,
        shares: ShareAmount,
    ) -> bool {
        let position = match self
            .positions
            .get_mut(delegate)
            .and_then(|table| table.remove(delegator))
        {
            Some(position) => position,
            None => return false,
        };

        let array = self
            .delegators
            .get_mut(delegate)
            .expect("position table entry implies a delegator array");
        array.swap_remove(position);
        if let Some(moved) = array.get(position) {
            self.positions
                .get_mut(delegate)
                .expect("checked above")
                .insert(moved.clone(), position);
        }

        if let Some(aggregate) = self.shares_delegated.get_mut(delegate) {
            *aggregate -= shares;
        }
        self.delegate_of.remove(delegator);
        true
    }

    /// Whether the edge `delegator -> delegate` is live.
    pub fn has_edge(&self, delegator: &Address, delegate: &Address) -> bool {
        self.delegate_of.get(delegator) == Some(delegate)
    }

    /// The delegate `delegator` currently routes shares through, if any.
    pub fn delegate_of(&self, delegator: &Address) -> Option<&Address> {
        self.delegate_of.get(delegator)
    }

    /// Current delegators of `delegate`, in insertion-swap order.
    pub fn delegators_of(&self, delegate: &Address) -> &[Address] {
        self.delegators
            .get(delegate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether anyone currently delegates to `delegate`.
    pub fn has_delegators(&self, delegate: &Address) -> bool {
        !self.delegators_of(delegate).is_empty()
    }

    /// Aggregate shares delegated to `delegate`.
    pub fn shares_delegated(&self, delegate: &Address) -> ShareAmount {
        self.shares_delegated.get(delegate).copied().unwrap_or(0)
    }

    /// Grow a live delegation's weight in place, keeping the aggregate
    /// consistent when a delegator is granted new shares mid-delegation.
    pub fn add_delegated_shares(&mut self, delegate: &Address, shares: ShareAmount) {
        *self.shares_delegated.entry(delegate.clone()).or_insert(0) += shares;
    }
}
