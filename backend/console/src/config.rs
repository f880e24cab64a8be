//! Configuration management for the console.
//!
//! Loads the manager's deployment parameters from environment variables.

use ribon_ledger::{Address, FeePercentage, ManagerConfig};

use crate::accounts::AccountRef;
use crate::errors::{ConsoleError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Identity of the manager (and of its pool factory).
    pub manager_address: Address,

    pub governance_council: Address,
    pub non_profit_council: Address,
    pub integration_council: Address,

    /// Percentage skimmed on fee-bearing pool deposits.
    pub pool_increase_fee: u8,

    /// Percentage skimmed from the pool on direct contributions.
    pub directly_contribution_fee: u8,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `GOVERNANCE_COUNCIL`, `NON_PROFIT_COUNCIL`, `INTEGRATION_COUNCIL`:
    ///   a `0x` address or an account name
    ///
    /// Optional variables (with defaults):
    /// - `MANAGER_ADDRESS`: manager identity (defaults to the `manager` name)
    /// - `POOL_INCREASE_FEE`: defaults to 0
    /// - `DIRECTLY_CONTRIBUTION_FEE`: defaults to 0
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key).ok_or_else(|| {
                ConsoleError::Config(format!("Missing required environment variable: {key}"))
            })
        };

        Ok(Config {
            manager_address: account(
                &lookup("MANAGER_ADDRESS").unwrap_or_else(|| "manager".to_string()),
            )?,

            governance_council: account(&var("GOVERNANCE_COUNCIL")?)?,
            non_profit_council: account(&var("NON_PROFIT_COUNCIL")?)?,
            integration_council: account(&var("INTEGRATION_COUNCIL")?)?,

            pool_increase_fee: percentage("POOL_INCREASE_FEE", lookup("POOL_INCREASE_FEE"))?,
            directly_contribution_fee: percentage(
                "DIRECTLY_CONTRIBUTION_FEE",
                lookup("DIRECTLY_CONTRIBUTION_FEE"),
            )?,
        })
    }

    /// Check the fee bound before anything is deployed.
    pub fn validate(&self) -> Result<()> {
        for (key, pct) in [
            ("POOL_INCREASE_FEE", self.pool_increase_fee),
            ("DIRECTLY_CONTRIBUTION_FEE", self.directly_contribution_fee),
        ] {
            FeePercentage::new(pct).map_err(|e| ConsoleError::Config(format!("{key}: {e}")))?;
        }
        Ok(())
    }

    pub fn manager_config(&self) -> Result<ManagerConfig> {
        Ok(ManagerConfig {
            governance_council: self.governance_council,
            non_profit_council: self.non_profit_council,
            integration_council: self.integration_council,
            pool_increase_fee: FeePercentage::new(self.pool_increase_fee)?,
            directly_contribution_fee: FeePercentage::new(self.directly_contribution_fee)?,
        })
    }
}

fn account(value: &str) -> Result<Address> {
    let account: AccountRef = value
        .parse()
        .map_err(|e| ConsoleError::Config(format!("Invalid account {value:?}: {e}")))?;
    Ok(account.standalone())
}

fn percentage(key: &str, value: Option<String>) -> Result<u8> {
    match value {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConsoleError::Config(format!("Invalid {key}"))),
    }
}
