//! Governance configuration
//!
//! All timing windows, escrow amounts, and the founding-member grant are
//! fixed at construction time and never change for the lifetime of an
//! engine instance.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Address, ShareAmount, TokenAmount, MAX_SHARES};

fn default_summoner_shares() -> ShareAmount {
    1
}

/// Constructor-time constants for the governance engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Founding member, seeded with [`summoner_shares`](Self::summoner_shares)
    pub summoner: Address,
    /// Initial share grant for the summoner
    #[serde(default = "default_summoner_shares")]
    pub summoner_shares: ShareAmount,
    /// Wall-clock length of one governance period, in seconds
    pub period_duration_secs: u64,
    /// Length of the voting window, in periods
    pub voting_period_length: u64,
    /// Delay between voting close and processing eligibility, in periods
    pub grace_period_length: u64,
    /// Window after a proposal's starting period in which the applicant
    /// may abort it, in periods
    pub abort_window: u64,
    /// Deposit escrowed from the proposer, refunded at processing
    pub proposal_deposit: TokenAmount,
    /// Maximum factor by which total shares may grow between a proposal's
    /// decisive yes vote and its processing before it is auto-failed
    pub dilution_bound: u64,
    /// Portion of the deposit paid to whoever processes a proposal
    pub processing_reward: TokenAmount,
}

impl GovernanceConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.summoner.is_zero() {
            return Err(Error::validation("summoner cannot be the zero address"));
        }
        if self.summoner_shares == 0 || self.summoner_shares > MAX_SHARES {
            return Err(Error::validation("summoner share grant out of range"));
        }
        if self.period_duration_secs == 0 {
            return Err(Error::validation("period duration cannot be zero"));
        }
        if self.voting_period_length == 0 {
            return Err(Error::validation("voting period length cannot be zero"));
        }
        if self.abort_window == 0 || self.abort_window > self.voting_period_length {
            return Err(Error::validation(
                "abort window must be nonzero and no longer than the voting period",
            ));
        }
        if self.dilution_bound == 0 {
            return Err(Error::validation("dilution bound cannot be zero"));
        }
        if self.proposal_deposit < self.processing_reward {
            return Err(Error::validation(
                "proposal deposit must cover the processing reward",
            ));
        }
        Ok(())
    }
}
