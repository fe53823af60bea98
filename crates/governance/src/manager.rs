//! Governance manager
//!
//! The single owner of all governance state. Every public operation runs
//! to completion under one write lock, so calls are serialized and each
//! either fully commits or has no observable effect: balance movements are
//! planned first, executed through the ledger as one all-or-nothing batch,
//! and engine state is mutated only after the batch succeeds.

use std::cmp;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use guildhall_common::{Address, GovernanceConfig, ShareAmount, TokenAmount, MAX_SHARES};
use guildhall_ledger::{GuildBank, TokenLedger};

use crate::clock::PeriodClock;
use crate::delegation::DelegationIndex;
use crate::member::{Member, MembershipRegistry};
use crate::proposal::{Proposal, ProposalQueue, VoteChoice};
use crate::settlement::SettlementPlan;
use crate::{GovernanceError, GovernanceResult};

/// Mutable governance state, owned exclusively by the manager.
struct EngineState {
    registry: MembershipRegistry,
    delegation: DelegationIndex,
    queue: ProposalQueue,
    total_shares: ShareAmount,
    total_shares_requested: ShareAmount,
}

/// The governance engine.
///
/// Holds the membership registry, delegation index, and proposal queue;
/// settles every escrow, refund, and payout through the injected
/// [`TokenLedger`] and [`GuildBank`], and reads time only from the injected
/// [`PeriodClock`].
pub struct GovernanceManager {
    config: GovernanceConfig,
    /// The engine's own escrow account on the ledger
    address: Address,
    ledger: Arc<dyn TokenLedger>,
    bank: Arc<GuildBank>,
    clock: Arc<dyn PeriodClock>,
    state: RwLock<EngineState>,
}

impl GovernanceManager {
    /// Summon a new governance engine, seeding the founding member.
    pub fn new(
        config: GovernanceConfig,
        address: Address,
        ledger: Arc<dyn TokenLedger>,
        bank: Arc<GuildBank>,
        clock: Arc<dyn PeriodClock>,
    ) -> GovernanceResult<Self> {
        config.validate()?;

        let mut registry = MembershipRegistry::new();
        registry.admit(&config.summoner, config.summoner_shares);
        let total_shares = config.summoner_shares;

        info!(summoner = %config.summoner, shares = total_shares, "guildhall summoned");

        Ok(Self {
            config,
            address,
            ledger,
            bank,
            clock,
            state: RwLock::new(EngineState {
                registry,
                delegation: DelegationIndex::new(),
                queue: ProposalQueue::new(),
                total_shares,
                total_shares_requested: 0,
            }),
        })
    }

    /// Submit a proposal to grant `shares_requested` to `applicant`.
    ///
    /// Escrows `token_tribute` from the applicant and the configured
    /// deposit from the proposer in one atomic batch; a failed escrow
    /// leaves nothing behind. Returns the new proposal index.
    pub async fn submit_proposal(
        &self,
        proposer_key: &Address,
        applicant: &Address,
        token_tribute: TokenAmount,
        shares_requested: ShareAmount,
        details: impl Into<String>,
    ) -> GovernanceResult<u64> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        state
            .registry
            .active_by_delegate_key(proposer_key)
            .ok_or_else(|| GovernanceError::NotAMember(proposer_key.clone()))?;
        if applicant.is_zero() {
            return Err(GovernanceError::ZeroApplicant);
        }

        let projected = state
            .total_shares
            .checked_add(state.total_shares_requested)
            .and_then(|total| total.checked_add(shares_requested))
            .ok_or(GovernanceError::ShareOverflow)?;
        if projected > MAX_SHARES {
            return Err(GovernanceError::ShareOverflow);
        }

        let mut plan = SettlementPlan::new();
        plan.push(applicant, &self.address, token_tribute);
        plan.push(proposer_key, &self.address, self.config.proposal_deposit);
        plan.execute(&self.address, self.ledger.as_ref()).await?;

        let starting_period = cmp::max(
            self.clock.current_period(),
            state.queue.last_starting_period(),
        ) + 1;

        let index = state.queue.push(Proposal::new(
            proposer_key.clone(),
            applicant.clone(),
            shares_requested,
            token_tribute,
            self.config.proposal_deposit,
            details.into(),
            starting_period,
        ));
        state.total_shares_requested += shares_requested;

        info!(
            index,
            proposer = %proposer_key,
            applicant = %applicant,
            shares_requested,
            token_tribute,
            starting_period,
            "proposal submitted"
        );
        Ok(index)
    }

    /// Cast a vote on `index` for the member behind `voter_key`.
    ///
    /// The vote carries the member's own shares plus the shares of every
    /// current delegator who has not already voted on this proposal; all of
    /// them are recorded as having voted, so none can vote again later.
    /// Delegators who voted before the delegation existed keep their own
    /// ballot and are excluded from the delegate's weight here.
    pub async fn submit_vote(
        &self,
        voter_key: &Address,
        index: u64,
        choice: VoteChoice,
    ) -> GovernanceResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let current_period = self.clock.current_period();

        let (voter, member) = state
            .registry
            .active_by_delegate_key(voter_key)
            .ok_or_else(|| GovernanceError::NotAMember(voter_key.clone()))?;
        let voter = voter.clone();
        let own_shares = member.shares;
        if member.delegated {
            return Err(GovernanceError::SharesDelegatedAway);
        }

        let mut weight = own_shares;
        let mut voting_block = vec![voter.clone()];
        {
            let proposal = state
                .queue
                .get(index)
                .ok_or(GovernanceError::NoSuchProposal(index))?;
            if !proposal.voting_open_at(current_period, self.config.voting_period_length) {
                return Err(GovernanceError::VotingNotOpen(index));
            }
            if proposal.aborted {
                return Err(GovernanceError::ProposalAborted(index));
            }
            if proposal.has_voted(&voter) {
                return Err(GovernanceError::AlreadyVoted(index));
            }

            // Point-in-time aggregation: only delegators without a ballot
            // on this proposal contribute to the delegate's weight.
            for delegator in state.delegation.delegators_of(&voter) {
                if proposal.has_voted(delegator) {
                    continue;
                }
                weight += state
                    .registry
                    .get(delegator)
                    .map(|m| m.shares)
                    .unwrap_or(0);
                voting_block.push(delegator.clone());
            }
        }

        let total_shares = state.total_shares;
        let proposal = state.queue.get_mut(index).expect("existence checked above");
        for address in &voting_block {
            proposal.ballots.insert(address.clone(), choice);
        }
        match choice {
            VoteChoice::Yes => {
                proposal.yes_votes += weight;
                if total_shares > proposal.max_total_shares_at_yes_vote {
                    proposal.max_total_shares_at_yes_vote = total_shares;
                }
                for address in &voting_block {
                    if let Some(member) = state.registry.get_mut(address) {
                        member.record_yes_vote(index);
                    }
                }
            }
            VoteChoice::No => {
                proposal.no_votes += weight;
            }
        }

        debug!(index, voter = %voter, ?choice, weight, "vote recorded");
        Ok(())
    }

    /// Finalize `index` once its grace period has elapsed.
    ///
    /// Computes pass/fail, mints shares and moves the tribute into the
    /// guild bank on success (or refunds it on failure), refunds the
    /// deposit minus the processing reward to the proposer, and pays the
    /// reward to `processor`. All movements settle as one atomic batch.
    pub async fn process_proposal(
        &self,
        index: u64,
        processor: &Address,
    ) -> GovernanceResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let current_period = self.clock.current_period();

        let proposal = state
            .queue
            .get(index)
            .ok_or(GovernanceError::NoSuchProposal(index))?;
        if proposal.processed {
            return Err(GovernanceError::AlreadyProcessed(index));
        }
        if !state.queue.prior_processed(index) {
            return Err(GovernanceError::PriorProposalPending(index - 1));
        }
        if !proposal.ready_for_processing_at(
            current_period,
            self.config.voting_period_length,
            self.config.grace_period_length,
        ) {
            return Err(GovernanceError::GracePeriodNotElapsed(index));
        }

        let did_pass = proposal.yes_votes > proposal.no_votes
            && !proposal.aborted
            && within_dilution_bound(
                state.total_shares,
                proposal.max_total_shares_at_yes_vote,
                self.config.dilution_bound,
            );

        let applicant = proposal.applicant.clone();
        let proposer = proposal.proposer.clone();
        let shares_requested = proposal.shares_requested;
        let token_tribute = proposal.token_tribute;
        let deposit = proposal.proposal_deposit;

        let mut plan = SettlementPlan::new();
        if did_pass {
            plan.push(&self.address, self.bank.address(), token_tribute);
        } else {
            plan.push(&self.address, &applicant, token_tribute);
        }
        plan.push(
            &self.address,
            &proposer,
            deposit - self.config.processing_reward,
        );
        plan.push(&self.address, processor, self.config.processing_reward);
        plan.execute(&self.address, self.ledger.as_ref()).await?;

        if did_pass {
            if state.registry.is_member(&applicant) {
                let delegated = {
                    let member = state
                        .registry
                        .get_mut(&applicant)
                        .expect("membership checked above");
                    member.shares += shares_requested;
                    member.delegated
                };
                // Shares minted to a delegated member flow into the
                // delegate's live aggregate.
                if delegated {
                    if let Some(delegate) = state.delegation.delegate_of(&applicant).cloned() {
                        state
                            .delegation
                            .add_delegated_shares(&delegate, shares_requested);
                    }
                }
            } else {
                state.registry.release_delegate_key(&applicant);
                state.registry.admit(&applicant, shares_requested);
            }
            state.total_shares += shares_requested;
        }

        let proposal = state.queue.get_mut(index).expect("existence checked above");
        proposal.did_pass = did_pass;
        proposal.processed = true;
        state.total_shares_requested -= shares_requested;

        info!(index, did_pass, applicant = %applicant, shares_requested, "proposal processed");
        Ok(())
    }

    /// Abort `index`, refunding its tribute to the applicant.
    ///
    /// Only the applicant may abort, only inside the abort window, only
    /// once. The proposal can still be voted down or processed afterward,
    /// but it can no longer pass and its tribute is already returned.
    pub async fn abort(&self, caller: &Address, index: u64) -> GovernanceResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let current_period = self.clock.current_period();

        let proposal = state
            .queue
            .get(index)
            .ok_or(GovernanceError::NoSuchProposal(index))?;
        if caller != &proposal.applicant {
            return Err(GovernanceError::NotApplicant(index));
        }
        if proposal.aborted {
            return Err(GovernanceError::AlreadyAborted(index));
        }
        if !proposal.in_abort_window(current_period, self.config.abort_window) {
            return Err(GovernanceError::AbortWindowExpired(index));
        }

        let applicant = proposal.applicant.clone();
        let token_tribute = proposal.token_tribute;

        let mut plan = SettlementPlan::new();
        plan.push(&self.address, &applicant, token_tribute);
        plan.execute(&self.address, self.ledger.as_ref()).await?;

        let proposal = state.queue.get_mut(index).expect("existence checked above");
        proposal.token_tribute = 0;
        proposal.aborted = true;

        info!(index, applicant = %applicant, refunded = token_tribute, "proposal aborted");
        Ok(())
    }

    /// Route the voting weight of the member behind `delegator_key` to
    /// `delegate`.
    ///
    /// One level deep only: a member who currently holds anyone's incoming
    /// delegation may not delegate out, which also rules out 2-cycles.
    pub async fn delegate_shares(
        &self,
        delegator_key: &Address,
        delegate: &Address,
    ) -> GovernanceResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let (delegator, member) = state
            .registry
            .active_by_delegate_key(delegator_key)
            .ok_or_else(|| GovernanceError::NotAMember(delegator_key.clone()))?;
        let delegator = delegator.clone();
        let shares = member.shares;
        if delegate.is_zero() {
            return Err(GovernanceError::ZeroDelegate);
        }
        if member.delegated {
            return Err(GovernanceError::AlreadyDelegating);
        }
        if !state.registry.is_member(delegate) {
            return Err(GovernanceError::DelegateNotAMember(delegate.clone()));
        }
        if delegator == *delegate || state.delegation.has_delegators(&delegator) {
            return Err(GovernanceError::CyclicDelegation);
        }

        state
            .delegation
            .add_edge(delegator.clone(), delegate.clone(), shares);
        state
            .registry
            .get_mut(&delegator)
            .expect("resolved above")
            .delegated = true;

        debug!(delegator = %delegator, delegate = %delegate, shares, "shares delegated");
        Ok(())
    }

    /// Take back the voting weight `delegator` routed to `delegate`.
    pub async fn retrieve_shares(
        &self,
        delegator: &Address,
        delegate: &Address,
    ) -> GovernanceResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if delegate.is_zero() {
            return Err(GovernanceError::ZeroDelegate);
        }
        if !state.delegation.has_edge(delegator, delegate) {
            return Err(GovernanceError::NotCurrentlyDelegatedThere(delegate.clone()));
        }

        let shares = state
            .registry
            .get(delegator)
            .map(|m| m.shares)
            .unwrap_or(0);
        state.delegation.remove_edge(delegator, delegate, shares);
        if let Some(member) = state.registry.get_mut(delegator) {
            member.delegated = false;
        }

        debug!(delegator = %delegator, delegate = %delegate, shares, "shares retrieved");
        Ok(())
    }

    /// Burn `shares_to_burn` of `member`'s own shares for a proportional
    /// payout from the guild bank.
    ///
    /// Blocked while the member's shares are delegated away and while any
    /// proposal they voted yes on is still unprocessed. The payout is
    /// computed against pre-burn totals.
    pub async fn ragequit(
        &self,
        member: &Address,
        shares_to_burn: ShareAmount,
    ) -> GovernanceResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let record = state
            .registry
            .get(member)
            .filter(|m| m.shares > 0)
            .ok_or_else(|| GovernanceError::NotAMember(member.clone()))?;
        if record.delegated {
            return Err(GovernanceError::SharesDelegatedAway);
        }
        if shares_to_burn > record.shares {
            return Err(GovernanceError::InsufficientShares {
                requested: shares_to_burn,
                held: record.shares,
            });
        }
        if let Some(highest) = record.highest_index_yes_vote {
            let highest_processed = state
                .queue
                .get(highest)
                .map(|p| p.processed)
                .unwrap_or(true);
            if !highest_processed {
                return Err(GovernanceError::OutstandingFavorableVote);
            }
        }

        let treasury = self.bank.balance().await;
        let payout = ((treasury as u128 * shares_to_burn as u128)
            / state.total_shares as u128) as TokenAmount;
        if payout > 0 {
            self.bank.withdraw(&self.address, member, payout).await?;
        }

        let record = state.registry.get_mut(member).expect("resolved above");
        record.shares -= shares_to_burn;
        state.total_shares -= shares_to_burn;

        info!(member = %member, shares_to_burn, payout, "ragequit");
        Ok(())
    }

    /// Rotate `member`'s delegate key to `new_key`.
    pub async fn update_delegate_key(
        &self,
        member: &Address,
        new_key: &Address,
    ) -> GovernanceResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        state
            .registry
            .get(member)
            .filter(|m| m.shares > 0)
            .ok_or_else(|| GovernanceError::NotAMember(member.clone()))?;
        if new_key.is_zero() {
            return Err(GovernanceError::ZeroDelegate);
        }
        if new_key != member {
            if state.registry.is_member(new_key) {
                return Err(GovernanceError::DelegateKeyInUse(new_key.clone()));
            }
            if let Some(owner) = state.registry.resolve_delegate_key(new_key) {
                if owner != member {
                    return Err(GovernanceError::DelegateKeyInUse(new_key.clone()));
                }
            }
        }

        state.registry.claim_delegate_key(member, new_key.clone());
        debug!(member = %member, new_key = %new_key, "delegate key updated");
        Ok(())
    }

    // --- Read side ---

    /// The engine's own escrow address on the ledger.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The governance configuration, fixed at construction.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// The guild bank holding the pooled fund.
    pub fn bank(&self) -> &Arc<GuildBank> {
        &self.bank
    }

    /// Current governance period per the injected clock.
    pub fn current_period(&self) -> u64 {
        self.clock.current_period()
    }

    pub async fn member(&self, address: &Address) -> Option<Member> {
        self.state.read().await.registry.get(address).cloned()
    }

    pub async fn proposal(&self, index: u64) -> Option<Proposal> {
        self.state.read().await.queue.get(index).cloned()
    }

    pub async fn proposal_queue_length(&self) -> u64 {
        self.state.read().await.queue.len()
    }

    pub async fn total_shares(&self) -> ShareAmount {
        self.state.read().await.total_shares
    }

    pub async fn total_shares_requested(&self) -> ShareAmount {
        self.state.read().await.total_shares_requested
    }

    /// The ballot recorded for `member` on proposal `index`.
    pub async fn ballot(
        &self,
        member: &Address,
        index: u64,
    ) -> GovernanceResult<Option<VoteChoice>> {
        let state = self.state.read().await;
        let proposal = state
            .queue
            .get(index)
            .ok_or(GovernanceError::NoSuchProposal(index))?;
        Ok(proposal.ballot_of(member))
    }

    /// Whether the voting window of `index` has closed.
    pub async fn has_voting_period_expired(&self, index: u64) -> GovernanceResult<bool> {
        let state = self.state.read().await;
        let proposal = state
            .queue
            .get(index)
            .ok_or(GovernanceError::NoSuchProposal(index))?;
        Ok(proposal.voting_expired_at(
            self.clock.current_period(),
            self.config.voting_period_length,
        ))
    }

    /// Whether the ragequit lockup is currently clear for `member`: every
    /// proposal they voted yes on has been processed.
    pub async fn can_ragequit(&self, member: &Address) -> bool {
        let state = self.state.read().await;
        match state.registry.get(member) {
            Some(record) => match record.highest_index_yes_vote {
                Some(highest) => state
                    .queue
                    .get(highest)
                    .map(|p| p.processed)
                    .unwrap_or(true),
                None => true,
            },
            None => false,
        }
    }

    pub async fn delegate_of(&self, member: &Address) -> Option<Address> {
        self.state.read().await.delegation.delegate_of(member).cloned()
    }

    pub async fn delegators_of(&self, delegate: &Address) -> Vec<Address> {
        self.state
            .read()
            .await
            .delegation
            .delegators_of(delegate)
            .to_vec()
    }

    pub async fn shares_delegated(&self, delegate: &Address) -> ShareAmount {
        self.state.read().await.delegation.shares_delegated(delegate)
    }
}

/// Dilution guard: a proposal may only pass while total shares have not
/// grown past `max_at_yes * bound` since its decisive yes vote.
fn within_dilution_bound(
    total_shares: ShareAmount,
    max_at_yes: ShareAmount,
    bound: u64,
) -> bool {
    match (max_at_yes as u128).checked_mul(bound as u128) {
        Some(cap) => (total_shares as u128) <= cap,
        None => true,
    }
}
