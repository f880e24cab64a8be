//! Deployment parameters for a [`Manager`](crate::Manager).

use serde::{Deserialize, Serialize};

use crate::fees::FeePercentage;
use crate::rbac::Councils;
use crate::types::Address;

/// Initial role holders and fee settings.
///
/// Fee fields deserialize through [`FeePercentage`], so an out-of-range fee
/// is rejected while parsing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub governance_council: Address,
    pub non_profit_council: Address,
    pub integration_council: Address,

    #[serde(default)]
    pub pool_increase_fee: FeePercentage,

    #[serde(default)]
    pub directly_contribution_fee: FeePercentage,
}

impl ManagerConfig {
    pub fn councils(&self) -> Councils {
        Councils::new(
            self.governance_council,
            self.non_profit_council,
            self.integration_council,
        )
    }
}
