//! Governance state machine for Guildhall
//!
//! This crate implements the proposal lifecycle (submission, voting, grace,
//! processing), the share and treasury accounting that processing performs
//! atomically, and the one-level vote-delegation subsystem. State is owned
//! exclusively by the [`GovernanceManager`]; the token ledger, guild bank,
//! and period clock are injected collaborators.

use thiserror::Error;

use guildhall_common::{Address, ShareAmount};
use guildhall_ledger::LedgerError;

pub mod clock;
pub mod delegation;
pub mod manager;
pub mod member;
pub mod proposal;
pub mod settlement;

pub use clock::{ManualClock, PeriodClock, SystemPeriodClock};
pub use delegation::DelegationIndex;
pub use manager::GovernanceManager;
pub use member::{Member, MembershipRegistry};
pub use proposal::{Proposal, ProposalQueue, VoteChoice};

/// Error types for governance operations
///
/// Every failure is a synchronous, non-retryable rejection of the enclosing
/// operation; the caller resubmits with corrected arguments or waits for a
/// time condition. No operation has a partial effect.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Proposal index out of range
    #[error("proposal does not exist: {0}")]
    NoSuchProposal(u64),

    /// Caller does not resolve to a member with voting shares
    #[error("not a member: {0}")]
    NotAMember(Address),

    /// Prospective delegate has no member record
    #[error("delegate is not a member: {0}")]
    DelegateNotAMember(Address),

    /// Voting window has not opened or has already closed
    #[error("voting is not open on proposal {0}")]
    VotingNotOpen(u64),

    /// Voting plus grace periods have not yet elapsed
    #[error("grace period has not elapsed for proposal {0}")]
    GracePeriodNotElapsed(u64),

    /// The previous proposal in the queue is still unprocessed
    #[error("prior proposal {0} is still pending processing")]
    PriorProposalPending(u64),

    /// Proposal has already been finalized
    #[error("proposal has already been processed: {0}")]
    AlreadyProcessed(u64),

    /// Resolved voting identity already has a ballot on this proposal
    #[error("member has already voted on proposal {0}")]
    AlreadyVoted(u64),

    /// Member already routes their shares through a delegate
    #[error("shares are already delegated")]
    AlreadyDelegating,

    /// No live delegation edge to the named delegate
    #[error("no shares currently delegated to {0}")]
    NotCurrentlyDelegatedThere(Address),

    /// Operation requires the member's own voting weight, which is
    /// currently routed through a delegate
    #[error("member has shares delegated")]
    SharesDelegatedAway,

    /// Edge would route shares back toward an existing delegation
    #[error("delegation would cycle through shares already delegated to the sender")]
    CyclicDelegation,

    /// A proposal the member voted yes on is still unprocessed
    #[error("a favorable vote is still pending processing")]
    OutstandingFavorableVote,

    /// Member holds fewer shares than the operation needs
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares {
        requested: ShareAmount,
        held: ShareAmount,
    },

    /// Delegate or delegate key cannot be the zero address
    #[error("delegate cannot be the zero address")]
    ZeroDelegate,

    /// Applicant cannot be the zero address
    #[error("applicant cannot be the zero address")]
    ZeroApplicant,

    /// Request would push total shares past the supported width
    #[error("share request would exceed the maximum share supply")]
    ShareOverflow,

    /// Proposal was aborted by its applicant
    #[error("proposal has been aborted: {0}")]
    ProposalAborted(u64),

    /// Only the proposal's applicant may abort it
    #[error("only the applicant may abort proposal {0}")]
    NotApplicant(u64),

    /// Proposal was already aborted
    #[error("proposal has already been aborted: {0}")]
    AlreadyAborted(u64),

    /// The abort window has closed
    #[error("abort window has expired for proposal {0}")]
    AbortWindowExpired(u64),

    /// Requested delegate key is claimed by another member
    #[error("delegate key is already in use: {0}")]
    DelegateKeyInUse(Address),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] guildhall_common::Error),

    /// Ledger collaborator failure, aborting the whole operation
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
