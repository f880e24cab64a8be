//! Role-based access control.
//!
//! The three council seats are held in a [`Councils`] value owned by the
//! manager and consulted explicitly on every guarded call; there is no
//! ambient authority. Each seat has exactly one holder, and only the current
//! governance council may reassign a seat. Reassignment is immediate.
//!
//! | Role                 | May call                                                        |
//! |----------------------|-----------------------------------------------------------------|
//! | GovernanceCouncil    | council setters, fee setters, `transfer_pool_balance`          |
//! | NonProfitCouncil     | `create_pool`, whitelist add/remove through the manager         |
//! | IntegrationCouncil   | integration-controller credit add/remove                        |
//! | PoolManager          | every mutating pool entry point except deposits                 |
//! | IntegrationController| `donate_through_integration` spending its own credit            |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Address;
use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    GovernanceCouncil,
    NonProfitCouncil,
    IntegrationCouncil,
    /// The manager configured on a pool at creation.
    PoolManager,
    /// The account whose integration credit is being spent.
    IntegrationController,
}

impl Role {
    /// Whether this role is one of the three manager-held council seats.
    pub fn is_council(self) -> bool {
        matches!(
            self,
            Role::GovernanceCouncil | Role::NonProfitCouncil | Role::IntegrationCouncil
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::GovernanceCouncil => "governance council",
            Role::NonProfitCouncil => "non profit council",
            Role::IntegrationCouncil => "integration council",
            Role::PoolManager => "manager",
            Role::IntegrationController => "integration controller",
        };
        f.write_str(name)
    }
}

/// The three council seats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Councils {
    pub governance: Address,
    pub non_profit: Address,
    pub integration: Address,
}

impl Councils {
    pub fn new(governance: Address, non_profit: Address, integration: Address) -> Self {
        Self {
            governance,
            non_profit,
            integration,
        }
    }

    /// Current holder of a council seat, `None` for non-council roles.
    pub fn holder(&self, role: Role) -> Option<Address> {
        match role {
            Role::GovernanceCouncil => Some(self.governance),
            Role::NonProfitCouncil => Some(self.non_profit),
            Role::IntegrationCouncil => Some(self.integration),
            Role::PoolManager | Role::IntegrationController => None,
        }
    }

    /// Return `true` if `address` currently holds `role`.
    pub fn has_role(&self, address: &Address, role: Role) -> bool {
        self.holder(role).as_ref() == Some(address)
    }

    /// Capability check: `caller` must hold the council seat `role`.
    pub fn require(&self, caller: &Address, role: Role) -> Result<(), Error> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            Err(Error::Unauthorized { role })
        }
    }

    /// Reassign a seat. `caller` must be the current governance council.
    ///
    /// Non-council roles cannot be assigned here and are rejected as
    /// unauthorized.
    pub fn assign(&mut self, caller: &Address, role: Role, holder: Address) -> Result<(), Error> {
        self.require(caller, Role::GovernanceCouncil)?;
        match role {
            Role::GovernanceCouncil => self.governance = holder,
            Role::NonProfitCouncil => self.non_profit = holder,
            Role::IntegrationCouncil => self.integration = holder,
            Role::PoolManager | Role::IntegrationController => {
                return Err(Error::Unauthorized { role })
            }
        }
        Ok(())
    }
}

/// Capability check for a single designated account, such as a pool's
/// manager or an integration controller spending its own credit.
pub fn require_account(caller: &Address, expected: &Address, role: Role) -> Result<(), Error> {
    if caller == expected {
        Ok(())
    } else {
        Err(Error::Unauthorized { role })
    }
}
