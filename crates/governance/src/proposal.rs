//! Proposal queue
//!
//! An append-only ordered sequence of proposals. Starting periods are
//! strictly increasing in queue order, so voting windows never regress and
//! processing can require strict sequentiality.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use guildhall_common::{Address, ShareAmount, TokenAmount};

/// A recorded ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    No,
}

/// A request to admit or reward a member, carrying escrowed tribute and a
/// refundable deposit. Terminal once `processed` is set; every other field
/// is immutable from that point on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Account that submitted the proposal (a member's delegate key);
    /// receives the deposit refund at processing
    pub proposer: Address,
    /// Account to receive the requested shares if the proposal passes
    pub applicant: Address,
    /// Shares minted to the applicant on success
    pub shares_requested: ShareAmount,
    /// Tribute escrowed from the applicant; moves to the guild bank on
    /// success, refunds on failure, zeroes on abort
    pub token_tribute: TokenAmount,
    /// Deposit escrowed from the proposer
    pub proposal_deposit: TokenAmount,
    /// Free-form description
    pub details: String,
    /// First period in which votes are accepted
    pub starting_period: u64,
    pub yes_votes: ShareAmount,
    pub no_votes: ShareAmount,
    /// Largest total share count observed at any yes vote; input to the
    /// dilution check at processing
    pub max_total_shares_at_yes_vote: ShareAmount,
    pub processed: bool,
    pub did_pass: bool,
    pub aborted: bool,
    /// Ballot per resolved voting identity
    pub ballots: HashMap<Address, VoteChoice>,
}

impl Proposal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        proposer: Address,
        applicant: Address,
        shares_requested: ShareAmount,
        token_tribute: TokenAmount,
        proposal_deposit: TokenAmount,
        details: String,
        starting_period: u64,
    ) -> Self {
        Self {
            proposer,
            applicant,
            shares_requested,
            token_tribute,
            proposal_deposit,
            details,
            starting_period,
            yes_votes: 0,
            no_votes: 0,
            max_total_shares_at_yes_vote: 0,
            processed: false,
            did_pass: false,
            aborted: false,
            ballots: HashMap::new(),
        }
    }

    /// The ballot `member` holds on this proposal, if any.
    pub fn ballot_of(&self, member: &Address) -> Option<VoteChoice> {
        self.ballots.get(member).copied()
    }

    pub fn has_voted(&self, member: &Address) -> bool {
        self.ballots.contains_key(member)
    }

    /// Whether votes are accepted at `period`.
    pub fn voting_open_at(&self, period: u64, voting_period_length: u64) -> bool {
        period >= self.starting_period
            && period < self.starting_period + voting_period_length
    }

    /// Whether the voting window has closed at `period`.
    pub fn voting_expired_at(&self, period: u64, voting_period_length: u64) -> bool {
        period >= self.starting_period + voting_period_length
    }

    /// Whether voting plus grace have elapsed at `period`.
    pub fn ready_for_processing_at(
        &self,
        period: u64,
        voting_period_length: u64,
        grace_period_length: u64,
    ) -> bool {
        period >= self.starting_period + voting_period_length + grace_period_length
    }

    /// Whether the applicant may still abort at `period`.
    pub fn in_abort_window(&self, period: u64, abort_window: u64) -> bool {
        period < self.starting_period + abort_window
    }
}

/// Append-only ordered queue of proposals.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProposalQueue {
    proposals: Vec<Proposal>,
}

impl ProposalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a proposal, returning its index.
    pub fn push(&mut self, proposal: Proposal) -> u64 {
        self.proposals.push(proposal);
        (self.proposals.len() - 1) as u64
    }

    pub fn get(&self, index: u64) -> Option<&Proposal> {
        self.proposals.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u64) -> Option<&mut Proposal> {
        self.proposals.get_mut(index as usize)
    }

    pub fn len(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Starting period of the newest proposal, or zero for an empty queue.
    pub fn last_starting_period(&self) -> u64 {
        self.proposals
            .last()
            .map(|p| p.starting_period)
            .unwrap_or(0)
    }

    /// Whether every proposal before `index` has been processed.
    pub fn prior_processed(&self, index: u64) -> bool {
        index == 0
            || self
                .proposals
                .get(index as usize - 1)
                .map(|p| p.processed)
                .unwrap_or(false)
    }
}
