//! Scenario replay.
//!
//! A scenario is a JSON document holding an ordered list of steps. Each step
//! names one ledger operation (tagged by `op`) and its arguments; account
//! arguments are [`AccountRef`]s. Token setup (`deploy_token`, `mint`,
//! `approve`) sits alongside the ledger operations so a scenario is
//! self-contained.
//!
//! ```json
//! { "steps": [
//!   { "op": "deploy_token", "token": "usdc" },
//!   { "op": "mint", "token": "usdc", "to": "donor", "amount": 1000 },
//!   { "op": "create_pool", "caller": "non_profit_council", "token": "usdc", "alias": "pool" }
//! ] }
//! ```

use std::path::Path;

use ribon_ledger::{Address, Amount, BatchId, InMemoryToken, Ledger, Token};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accounts::{AccountRef, Accounts};
use crate::config::Config;
use crate::errors::{ConsoleError, Result};

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

fn feeable_default() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    DeployToken {
        token: AccountRef,
    },
    Mint {
        token: AccountRef,
        to: AccountRef,
        amount: Amount,
    },
    Approve {
        token: AccountRef,
        owner: AccountRef,
        spender: AccountRef,
        amount: Amount,
    },
    /// Standalone pool bound to an arbitrary manager account.
    DeployPool {
        pool: AccountRef,
        token: AccountRef,
        manager: AccountRef,
    },
    CreatePool {
        caller: AccountRef,
        token: AccountRef,
        #[serde(default)]
        alias: Option<String>,
    },
    AddNonProfitToWhitelist {
        caller: AccountRef,
        pool: AccountRef,
        non_profit: AccountRef,
    },
    RemoveNonProfitFromWhitelist {
        caller: AccountRef,
        pool: AccountRef,
        non_profit: AccountRef,
    },
    AddBalance {
        caller: AccountRef,
        pool: AccountRef,
        amount: Amount,
        #[serde(default)]
        depositor: Option<AccountRef>,
    },
    AddPoolBalance {
        caller: AccountRef,
        pool: AccountRef,
        amount: Amount,
        referrer: AccountRef,
        #[serde(default = "feeable_default")]
        feeable: bool,
    },
    ContributeToNonProfit {
        caller: AccountRef,
        pool: AccountRef,
        non_profit: AccountRef,
        amount: Amount,
        referrer: AccountRef,
    },
    AddIntegrationControllerBalance {
        caller: AccountRef,
        controller: AccountRef,
        amount: Amount,
    },
    RemoveIntegrationControllerBalance {
        caller: AccountRef,
        controller: AccountRef,
        amount: Amount,
    },
    DonateThroughIntegration {
        caller: AccountRef,
        pool: AccountRef,
        non_profit: AccountRef,
        integration_controller: AccountRef,
        batch_id: BatchId,
        amount: Amount,
    },
    TransferPoolBalance {
        caller: AccountRef,
        pool: AccountRef,
        destination: AccountRef,
    },
    SetGovernanceCouncil {
        caller: AccountRef,
        holder: AccountRef,
    },
    SetNonProfitCouncil {
        caller: AccountRef,
        holder: AccountRef,
    },
    SetIntegrationCouncil {
        caller: AccountRef,
        holder: AccountRef,
    },
    SetPoolIncreaseFee {
        caller: AccountRef,
        fee: u8,
    },
    SetDirectlyContributionFee {
        caller: AccountRef,
        fee: u8,
    },
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::DeployToken { .. } => "deploy_token",
            Step::Mint { .. } => "mint",
            Step::Approve { .. } => "approve",
            Step::DeployPool { .. } => "deploy_pool",
            Step::CreatePool { .. } => "create_pool",
            Step::AddNonProfitToWhitelist { .. } => "add_non_profit_to_whitelist",
            Step::RemoveNonProfitFromWhitelist { .. } => "remove_non_profit_from_whitelist",
            Step::AddBalance { .. } => "add_balance",
            Step::AddPoolBalance { .. } => "add_pool_balance",
            Step::ContributeToNonProfit { .. } => "contribute_to_non_profit",
            Step::AddIntegrationControllerBalance { .. } => "add_integration_controller_balance",
            Step::RemoveIntegrationControllerBalance { .. } => {
                "remove_integration_controller_balance"
            }
            Step::DonateThroughIntegration { .. } => "donate_through_integration",
            Step::TransferPoolBalance { .. } => "transfer_pool_balance",
            Step::SetGovernanceCouncil { .. } => "set_governance_council",
            Step::SetNonProfitCouncil { .. } => "set_non_profit_council",
            Step::SetIntegrationCouncil { .. } => "set_integration_council",
            Step::SetPoolIncreaseFee { .. } => "set_pool_increase_fee",
            Step::SetDirectlyContributionFee { .. } => "set_directly_contribution_fee",
        }
    }
}

impl Scenario {
    pub fn parse(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json)?;
        if scenario.steps.is_empty() {
            return Err(ConsoleError::Scenario("scenario has no steps".to_string()));
        }
        Ok(scenario)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        debug!("Read {} bytes from {}", json.len(), path.display());
        Self::parse(&json)
    }
}

#[derive(Debug, Serialize)]
pub struct StepFailure {
    pub index: usize,
    pub op: &'static str,
    pub code: u32,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceLine {
    pub token: String,
    pub account: String,
    pub address: Address,
    pub balance: Amount,
}

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub executed: usize,
    pub failures: Vec<StepFailure>,
    pub balances: Vec<BalanceLine>,
}

/// Ledger plus the name table a scenario runs against.
pub struct Runner {
    ledger: Ledger<InMemoryToken>,
    accounts: Accounts,
    tokens: Vec<Address>,
}

impl Runner {
    /// Deploy a manager from `config` and bind the role holders to their
    /// well-known names (`manager`, `governance`, `non_profit_council`,
    /// `integration_council`).
    pub fn new(config: &Config) -> Result<Self> {
        let manager_config = config.manager_config()?;
        let ledger = Ledger::from_config(config.manager_address, &manager_config);

        let mut accounts = Accounts::new();
        accounts.bind("manager", config.manager_address);
        accounts.bind("governance", config.governance_council);
        accounts.bind("non_profit_council", config.non_profit_council);
        accounts.bind("integration_council", config.integration_council);

        Ok(Self {
            ledger,
            accounts,
            tokens: Vec::new(),
        })
    }

    pub fn ledger(&self) -> &Ledger<InMemoryToken> {
        &self.ledger
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Run every step in order.
    ///
    /// A rejected step is recorded in the report and the run continues,
    /// unless `fail_fast` is set, in which case the first rejection ends the
    /// run with [`ConsoleError::StepFailed`].
    pub fn run(&mut self, scenario: &Scenario, fail_fast: bool) -> Result<Report> {
        let mut report = Report::default();
        for (index, step) in scenario.steps.iter().enumerate() {
            let op = step.op();
            match self.apply(step) {
                Ok(()) => {
                    debug!(index, op, "step applied");
                }
                Err(source) if fail_fast => {
                    return Err(ConsoleError::StepFailed { index, op, source });
                }
                Err(err) => {
                    warn!(index, op, code = err.code(), "step rejected: {}", err);
                    report.failures.push(StepFailure {
                        index,
                        op,
                        code: err.code(),
                        error: err.to_string(),
                    });
                }
            }
            report.executed += 1;
        }
        report.balances = self.balances()?;
        info!(
            "Replayed {} steps, {} rejected",
            report.executed,
            report.failures.len()
        );
        Ok(report)
    }

    fn apply(&mut self, step: &Step) -> std::result::Result<(), ribon_ledger::Error> {
        let acc = &mut self.accounts;
        let ledger = &mut self.ledger;
        match step {
            Step::DeployToken { token } => {
                let address = acc.resolve(token);
                ledger.register_token(InMemoryToken::new(address))?;
                self.tokens.push(address);
            }
            Step::Mint { token, to, amount } => {
                let (token, to) = (acc.resolve(token), acc.resolve(to));
                ledger.token_mut(&token)?.mint(&to, *amount)?;
            }
            Step::Approve {
                token,
                owner,
                spender,
                amount,
            } => {
                let (token, owner, spender) =
                    (acc.resolve(token), acc.resolve(owner), acc.resolve(spender));
                ledger.token_mut(&token)?.approve(&owner, &spender, *amount);
            }
            Step::DeployPool {
                pool,
                token,
                manager,
            } => {
                let (pool, token, manager) =
                    (acc.resolve(pool), acc.resolve(token), acc.resolve(manager));
                ledger.deploy_pool(pool, token, manager)?;
            }
            Step::CreatePool {
                caller,
                token,
                alias,
            } => {
                let (caller, token) = (acc.resolve(caller), acc.resolve(token));
                let pool = ledger.create_pool(&caller, token)?;
                let name = alias
                    .clone()
                    .unwrap_or_else(|| format!("pool{}", ledger.get_pools().len() - 1));
                acc.bind(name, pool);
            }
            Step::AddNonProfitToWhitelist {
                caller,
                pool,
                non_profit,
            } => {
                let (caller, pool, np) =
                    (acc.resolve(caller), acc.resolve(pool), acc.resolve(non_profit));
                ledger.add_non_profit_to_whitelist(&caller, &pool, np)?;
            }
            Step::RemoveNonProfitFromWhitelist {
                caller,
                pool,
                non_profit,
            } => {
                let (caller, pool, np) =
                    (acc.resolve(caller), acc.resolve(pool), acc.resolve(non_profit));
                ledger.remove_non_profit_from_whitelist(&caller, &pool, np)?;
            }
            Step::AddBalance {
                caller,
                pool,
                amount,
                depositor,
            } => {
                let (caller, pool) = (acc.resolve(caller), acc.resolve(pool));
                let depositor = depositor.as_ref().map(|d| acc.resolve(d));
                ledger.add_balance(&caller, &pool, *amount, depositor)?;
            }
            Step::AddPoolBalance {
                caller,
                pool,
                amount,
                referrer,
                feeable,
            } => {
                let (caller, pool, referrer) =
                    (acc.resolve(caller), acc.resolve(pool), acc.resolve(referrer));
                let fee = ledger.add_pool_balance(&caller, &pool, *amount, referrer, *feeable)?;
                debug!(fee, "pool increase fee taken");
            }
            Step::ContributeToNonProfit {
                caller,
                pool,
                non_profit,
                amount,
                referrer,
            } => {
                let (caller, pool, np, referrer) = (
                    acc.resolve(caller),
                    acc.resolve(pool),
                    acc.resolve(non_profit),
                    acc.resolve(referrer),
                );
                let fee = ledger.contribute_to_non_profit(&caller, &pool, np, *amount, referrer)?;
                debug!(fee, "direct contribution fee taken");
            }
            Step::AddIntegrationControllerBalance {
                caller,
                controller,
                amount,
            } => {
                let (caller, controller) = (acc.resolve(caller), acc.resolve(controller));
                ledger.add_integration_controller_balance(&caller, controller, *amount)?;
            }
            Step::RemoveIntegrationControllerBalance {
                caller,
                controller,
                amount,
            } => {
                let (caller, controller) = (acc.resolve(caller), acc.resolve(controller));
                ledger.remove_integration_controller_balance(&caller, controller, *amount)?;
            }
            Step::DonateThroughIntegration {
                caller,
                pool,
                non_profit,
                integration_controller,
                batch_id,
                amount,
            } => {
                let (caller, pool, np, controller) = (
                    acc.resolve(caller),
                    acc.resolve(pool),
                    acc.resolve(non_profit),
                    acc.resolve(integration_controller),
                );
                ledger.donate_through_integration(
                    &caller,
                    &pool,
                    np,
                    controller,
                    batch_id.clone(),
                    *amount,
                )?;
            }
            Step::TransferPoolBalance {
                caller,
                pool,
                destination,
            } => {
                let (caller, pool, destination) =
                    (acc.resolve(caller), acc.resolve(pool), acc.resolve(destination));
                let moved = ledger.transfer_pool_balance(&caller, &pool, destination)?;
                debug!(moved, "pool balance swept");
            }
            Step::SetGovernanceCouncil { caller, holder } => {
                let (caller, holder) = (acc.resolve(caller), acc.resolve(holder));
                ledger.set_governance_council(&caller, holder)?;
                acc.bind("governance", holder);
            }
            Step::SetNonProfitCouncil { caller, holder } => {
                let (caller, holder) = (acc.resolve(caller), acc.resolve(holder));
                ledger.set_non_profit_council(&caller, holder)?;
                acc.bind("non_profit_council", holder);
            }
            Step::SetIntegrationCouncil { caller, holder } => {
                let (caller, holder) = (acc.resolve(caller), acc.resolve(holder));
                ledger.set_integration_council(&caller, holder)?;
                acc.bind("integration_council", holder);
            }
            Step::SetPoolIncreaseFee { caller, fee } => {
                let caller = acc.resolve(caller);
                ledger.set_pool_increase_fee(&caller, *fee)?;
            }
            Step::SetDirectlyContributionFee { caller, fee } => {
                let caller = acc.resolve(caller);
                ledger.set_directly_contribution_fee(&caller, *fee)?;
            }
        }
        Ok(())
    }

    /// Non-zero holdings of every named account, per deployed token.
    fn balances(&self) -> Result<Vec<BalanceLine>> {
        let mut lines = Vec::new();
        for token in &self.tokens {
            let token_name = self
                .accounts
                .name_of(token)
                .map_or_else(|| token.to_string(), str::to_string);
            for (name, address) in self.accounts.iter() {
                let balance = self.ledger.balance_of(token, &address)?;
                if balance > 0 {
                    lines.push(BalanceLine {
                        token: token_name.clone(),
                        account: name.to_string(),
                        address,
                        balance,
                    });
                }
            }
        }
        Ok(lines)
    }
}
