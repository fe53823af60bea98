//! Membership registry
//!
//! One record per member address, plus the delegate-key lookup table that
//! lets a member vote and submit through a rotated key. Records are created
//! when a proposal admitting the applicant passes (or for the summoner at
//! construction) and are never deleted; a departed member keeps a
//! zero-share record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use guildhall_common::{Address, ShareAmount};

/// A membership record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Key this member currently votes and submits with
    pub delegate_key: Address,
    /// Voting weight and treasury claim
    pub shares: ShareAmount,
    /// Set once at admission, never cleared
    pub exists: bool,
    /// Largest proposal index this member voted yes on, if any;
    /// the ragequit lockup bound
    pub highest_index_yes_vote: Option<u64>,
    /// True exactly while this member's shares are routed through a delegate
    pub delegated: bool,
}

impl Member {
    /// A fresh record keyed by the member's own address.
    pub fn new(address: Address, shares: ShareAmount) -> Self {
        Self {
            delegate_key: address,
            shares,
            exists: true,
            highest_index_yes_vote: None,
            delegated: false,
        }
    }

    /// Record a yes vote on `index`, keeping the lockup bound monotone.
    pub fn record_yes_vote(&mut self, index: u64) {
        match self.highest_index_yes_vote {
            Some(highest) if highest >= index => {}
            _ => self.highest_index_yes_vote = Some(index),
        }
    }
}

/// Source of truth for membership records and the delegate-key table.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MembershipRegistry {
    members: HashMap<Address, Member>,
    member_by_delegate_key: HashMap<Address, Address>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new member with the given share grant, claiming their own
    /// address as their delegate key.
    pub fn admit(&mut self, address: &Address, shares: ShareAmount) {
        self.members
            .insert(address.clone(), Member::new(address.clone(), shares));
        self.member_by_delegate_key
            .insert(address.clone(), address.clone());
    }

    pub fn get(&self, address: &Address) -> Option<&Member> {
        self.members.get(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Member> {
        self.members.get_mut(address)
    }

    /// Whether `address` has a member record (shares may be zero).
    pub fn is_member(&self, address: &Address) -> bool {
        self.members.contains_key(address)
    }

    /// The member address behind `key`, if the key is claimed.
    pub fn resolve_delegate_key(&self, key: &Address) -> Option<&Address> {
        self.member_by_delegate_key.get(key)
    }

    /// The member behind `key`, if they currently hold voting shares.
    pub fn active_by_delegate_key(&self, key: &Address) -> Option<(&Address, &Member)> {
        let address = self.member_by_delegate_key.get(key)?;
        let member = self.members.get(address)?;
        if member.shares == 0 {
            return None;
        }
        Some((address, member))
    }

    /// Reassign `member`'s delegate key to `new_key`, releasing the old one.
    ///
    /// The caller is responsible for checking that `new_key` is free.
    pub fn claim_delegate_key(&mut self, member: &Address, new_key: Address) {
        if let Some(record) = self.members.get_mut(member) {
            self.member_by_delegate_key.remove(&record.delegate_key);
            self.member_by_delegate_key
                .insert(new_key.clone(), member.clone());
            record.delegate_key = new_key;
        }
    }

    /// Free `key` for use as a new member's address.
    ///
    /// If another member was voting through `key`, their delegate key is
    /// reset to their own address.
    pub fn release_delegate_key(&mut self, key: &Address) {
        if let Some(owner) = self.member_by_delegate_key.get(key).cloned() {
            self.claim_delegate_key(&owner, owner.clone());
        }
    }
}
