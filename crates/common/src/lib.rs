//! Common utilities and types for Guildhall

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::GovernanceConfig;
pub use error::{Error, Result};
pub use types::{Address, ShareAmount, TokenAmount, MAX_SHARES};
