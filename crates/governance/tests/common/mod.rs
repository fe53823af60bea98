//! Shared harness for governance integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use guildhall_common::{Address, GovernanceConfig, ShareAmount, TokenAmount};
use guildhall_governance::{GovernanceManager, ManualClock};
use guildhall_ledger::{GuildBank, InMemoryToken, TokenLedger};

pub const TOKEN_SUPPLY: TokenAmount = 1_000_000;
pub const PROPOSAL_DEPOSIT: TokenAmount = 10;
pub const PROCESSING_REWARD: TokenAmount = 1;
pub const VOTING_PERIOD_LENGTH: u64 = 35;
pub const GRACE_PERIOD_LENGTH: u64 = 35;
pub const ABORT_WINDOW: u64 = 5;
pub const DILUTION_BOUND: u64 = 3;

pub fn addr(s: &str) -> Address {
    Address::from(s)
}

pub struct Harness {
    pub token: Arc<InMemoryToken>,
    pub clock: Arc<ManualClock>,
    pub engine: GovernanceManager,
}

/// Deploy a token, bank, and engine with the summoner holding the whole
/// token supply and one founding share.
pub async fn summon() -> Harness {
    // First caller installs the subscriber; later calls are no-ops.
    let _ = guildhall_common::logging::init_logging("warn");

    let summoner = addr("summoner");
    let engine_address = addr("guildhall");

    let token = Arc::new(InMemoryToken::new(&summoner, TOKEN_SUPPLY));
    let clock = Arc::new(ManualClock::new());
    let bank = Arc::new(GuildBank::new(
        addr("guildbank"),
        engine_address.clone(),
        token.clone(),
    ));

    let config = GovernanceConfig {
        summoner: summoner.clone(),
        summoner_shares: 1,
        period_duration_secs: 17280,
        voting_period_length: VOTING_PERIOD_LENGTH,
        grace_period_length: GRACE_PERIOD_LENGTH,
        abort_window: ABORT_WINDOW,
        proposal_deposit: PROPOSAL_DEPOSIT,
        dilution_bound: DILUTION_BOUND,
        processing_reward: PROCESSING_REWARD,
    };

    let engine = GovernanceManager::new(
        config,
        engine_address,
        token.clone(),
        bank,
        clock.clone(),
    )
    .unwrap();

    Harness {
        token,
        clock,
        engine,
    }
}

impl Harness {
    /// Fund the applicant's tribute out of the summoner's balance, set the
    /// escrow allowances, and submit a proposal from the summoner.
    pub async fn submit_with_escrow(
        &self,
        applicant: &Address,
        tribute: TokenAmount,
        shares: ShareAmount,
        details: &str,
    ) -> u64 {
        let summoner = addr("summoner");
        let engine = self.engine.address().clone();

        if tribute > 0 {
            self.token
                .transfer(&summoner, applicant, tribute)
                .await
                .unwrap();
            self.token.approve(applicant, &engine, tribute).await.unwrap();
        }
        self.token
            .approve(&summoner, &engine, PROPOSAL_DEPOSIT)
            .await
            .unwrap();

        self.engine
            .submit_proposal(&summoner, applicant, tribute, shares, details)
            .await
            .unwrap()
    }

    /// Advance the clock to exactly `period`.
    pub fn advance_to(&self, period: u64) {
        let current = self.engine.current_period();
        if period > current {
            self.clock.advance(period - current);
        }
    }

    /// Advance to the first period at which `index` may be processed.
    pub async fn advance_past_grace(&self, index: u64) {
        let proposal = self.engine.proposal(index).await.unwrap();
        self.advance_to(proposal.starting_period + VOTING_PERIOD_LENGTH + GRACE_PERIOD_LENGTH);
    }

    /// Run an applicant all the way to membership: submit, yes-vote from
    /// the summoner, and process. Returns the proposal index.
    pub async fn admit_member(
        &self,
        applicant: &Address,
        tribute: TokenAmount,
        shares: ShareAmount,
    ) -> u64 {
        use guildhall_governance::VoteChoice;

        let index = self
            .submit_with_escrow(applicant, tribute, shares, "admission")
            .await;
        let starting = self.engine.proposal(index).await.unwrap().starting_period;
        self.advance_to(starting);
        self.engine
            .submit_vote(&addr("summoner"), index, VoteChoice::Yes)
            .await
            .unwrap();
        self.advance_past_grace(index).await;
        self.engine
            .process_proposal(index, &addr("processor"))
            .await
            .unwrap();
        index
    }
}
