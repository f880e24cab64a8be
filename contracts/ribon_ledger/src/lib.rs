//! # Ribon Ledger
//!
//! Donation-accounting core: per-cause pools, council-gated authority,
//! integration-controller credit and referral fees.
//!
//! | Phase        | Entry Point(s)                                                        |
//! |--------------|-----------------------------------------------------------------------|
//! | Bootstrap    | [`Ledger::new`], [`Ledger::from_config`], [`Ledger::register_token`]  |
//! | Role admin   | `set_governance_council`, `set_non_profit_council`, `set_integration_council` |
//! | Fees         | `set_pool_increase_fee`, `set_directly_contribution_fee`              |
//! | Pools        | `create_pool`, `add/remove_non_profit_to/from_whitelist`              |
//! | Funding      | `add_balance`, `add_pool_balance`, `contribute_to_non_profit`         |
//! | Credit       | `add/remove_integration_controller_balance`                           |
//! | Payouts      | `donate_through_integration`, `transfer_pool_balance`                 |
//! | Queries      | `get_pools`, `fetch_pools`, `pool_balance`, `events`                  |
//!
//! ## Architecture
//!
//! [`Pool`] owns its whitelist and is the custody point for one cause.
//! [`PoolFactory`] mints pools bound to a manager and keeps the append-only
//! registry. [`Manager`] holds the council seats ([`rbac`]), the fee
//! settings ([`fees`]) and the credit book, and calls into pools through
//! their manager-gated entry points. Money only moves through a [`Token`].
//!
//! [`Ledger`] is the world state: it owns the manager, every pool and every
//! token, routes calls by address, and makes each call all-or-nothing.

pub mod config;
pub mod events;
pub mod factory;
pub mod fees;
pub mod ledger;
pub mod manager;
pub mod pool;
pub mod rbac;
pub mod token;
pub mod types;

#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_fees;
#[cfg(test)]
mod test_factory;

use thiserror::Error;

pub use config::ManagerConfig;
pub use events::{EmittedEvent, EventLog, LedgerEvent};
pub use factory::PoolFactory;
pub use fees::FeePercentage;
pub use ledger::Ledger;
pub use manager::Manager;
pub use pool::Pool;
pub use rbac::{Councils, Role};
pub use token::{InMemoryToken, Token, TokenError};
pub use types::{Address, Amount, BatchId};

/// Every failure aborts the whole operation; messages are stable so callers
/// can tell a role problem from an amount, credit or whitelist problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("You are not the {role}")]
    Unauthorized { role: Role },

    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Not a whitelisted nonprofit")]
    NotWhitelisted,

    #[error("Balance must greater than amount")]
    InsufficientCredit,

    #[error("Fee must be less than 50%")]
    FeeTooHigh,

    #[error(transparent)]
    ValueTransfer(#[from] TokenError),

    #[error("Pool not found: {0}")]
    PoolNotFound(Address),

    #[error("Token not found: {0}")]
    TokenNotFound(Address),

    #[error("Pool holds token {expected}, got {found}")]
    TokenMismatch { expected: Address, found: Address },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Pool already deployed: {0}")]
    PoolExists(Address),

    #[error("Token already registered: {0}")]
    TokenExists(Address),
}

impl Error {
    /// Stable numeric code for the failure class.
    pub fn code(&self) -> u32 {
        match self {
            Error::Unauthorized { .. } => 1,
            Error::InvalidAmount => 2,
            Error::NotWhitelisted => 3,
            Error::InsufficientCredit => 4,
            Error::FeeTooHigh => 5,
            Error::ValueTransfer(_) => 6,
            Error::PoolNotFound(_) => 7,
            Error::TokenNotFound(_) => 8,
            Error::TokenMismatch { .. } => 9,
            Error::Overflow => 10,
            Error::PoolExists(_) => 11,
            Error::TokenExists(_) => 12,
        }
    }
}
