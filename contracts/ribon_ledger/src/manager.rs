//! The manager: role authority, fee engine and donation router.
//!
//! The manager owns the council seats, the integration-controller credit
//! book, the two fee settings and a [`PoolFactory`] whose pools it manages.
//! Pools keep their own whitelists; the manager only holds the capability
//! to call their manager-gated entry points.
//!
//! Every entry point either commits all of its effects or returns an error
//! having changed nothing it owns.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::ManagerConfig;
use crate::events::{self, EventLog};
use crate::factory::PoolFactory;
use crate::fees::{capped_fee, FeePercentage};
use crate::pool::Pool;
use crate::rbac::{self, Councils, Role};
use crate::token::Token;
use crate::types::{Address, Amount, BatchId};
use crate::Error;

#[derive(Clone, Debug)]
pub struct Manager {
    address: Address,
    councils: Councils,
    factory: PoolFactory,
    integration_controllers: HashMap<Address, Amount>,
    pool_increase_fee: FeePercentage,
    directly_contribution_fee: FeePercentage,
}

impl Manager {
    /// A manager at `address` with the given seats and no fees.
    pub fn new(address: Address, councils: Councils) -> Self {
        Self {
            address,
            councils,
            factory: PoolFactory::new(address, address),
            integration_controllers: HashMap::new(),
            pool_increase_fee: FeePercentage::ZERO,
            directly_contribution_fee: FeePercentage::ZERO,
        }
    }

    pub fn from_config(address: Address, config: &ManagerConfig) -> Self {
        let mut manager = Self::new(address, config.councils());
        manager.pool_increase_fee = config.pool_increase_fee;
        manager.directly_contribution_fee = config.directly_contribution_fee;
        manager
    }

    // ─────────────────────────────────────────────────────────
    // Views
    // ─────────────────────────────────────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn councils(&self) -> &Councils {
        &self.councils
    }

    pub fn governance_council(&self) -> Address {
        self.councils.governance
    }

    pub fn non_profit_council(&self) -> Address {
        self.councils.non_profit
    }

    pub fn integration_council(&self) -> Address {
        self.councils.integration
    }

    pub fn pool_increase_fee(&self) -> FeePercentage {
        self.pool_increase_fee
    }

    pub fn directly_contribution_fee(&self) -> FeePercentage {
        self.directly_contribution_fee
    }

    /// Remaining spend credit of an integration controller.
    pub fn integration_controller_balance(&self, controller: &Address) -> Amount {
        self.integration_controllers
            .get(controller)
            .copied()
            .unwrap_or(0)
    }

    pub fn factory(&self) -> &PoolFactory {
        &self.factory
    }

    pub fn get_pools(&self) -> &[Address] {
        self.factory.get_pools()
    }

    pub fn fetch_pools(&self, start: usize, count: usize) -> &[Address] {
        self.factory.fetch_pools(start, count)
    }

    // ─────────────────────────────────────────────────────────
    // Pool lifecycle and whitelists (non profit council)
    // ─────────────────────────────────────────────────────────

    pub fn create_pool(
        &mut self,
        caller: &Address,
        token: Address,
        events: &mut EventLog,
    ) -> Result<Pool, Error> {
        self.councils.require(caller, Role::NonProfitCouncil)?;
        Ok(self.factory.create_pool(token, events))
    }

    pub fn add_non_profit_to_whitelist(
        &self,
        caller: &Address,
        pool: &mut Pool,
        non_profit: Address,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        self.councils.require(caller, Role::NonProfitCouncil)?;
        pool.add_non_profit_to_whitelist(&self.address, non_profit, events)
    }

    pub fn remove_non_profit_from_whitelist(
        &self,
        caller: &Address,
        pool: &mut Pool,
        non_profit: Address,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        self.councils.require(caller, Role::NonProfitCouncil)?;
        pool.remove_non_profit_from_whitelist(&self.address, non_profit, events)
    }

    // ─────────────────────────────────────────────────────────
    // Integration credit (integration council)
    // ─────────────────────────────────────────────────────────

    pub fn add_integration_controller_balance(
        &mut self,
        caller: &Address,
        controller: Address,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        self.councils.require(caller, Role::IntegrationCouncil)?;
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let credit = self
            .integration_controller_balance(&controller)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        self.integration_controllers.insert(controller, credit);

        events::emit_integration_controller_balance_added(events, self.address, controller, amount);
        info!(%controller, amount, credit, "integration credit added");
        Ok(())
    }

    pub fn remove_integration_controller_balance(
        &mut self,
        caller: &Address,
        controller: Address,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        self.councils.require(caller, Role::IntegrationCouncil)?;
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let credit = self.integration_controller_balance(&controller);
        if credit < amount {
            return Err(Error::InsufficientCredit);
        }
        self.integration_controllers
            .insert(controller, credit - amount);

        events::emit_integration_controller_balance_removed(
            events,
            self.address,
            controller,
            amount,
        );
        info!(%controller, amount, credit = credit - amount, "integration credit removed");
        Ok(())
    }

    /// Spend `amount` of `integration_controller`'s credit on a payout from
    /// `pool` to `non_profit`.
    ///
    /// Only the controller itself may spend its credit. The credit is debited
    /// before the pool transfers, and restored if the transfer fails.
    #[allow(clippy::too_many_arguments)]
    pub fn donate_through_integration<T: Token>(
        &mut self,
        token: &mut T,
        caller: &Address,
        pool: &Pool,
        non_profit: Address,
        integration_controller: Address,
        batch_id: BatchId,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        rbac::require_account(caller, &integration_controller, Role::IntegrationController)?;
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let credit = self.integration_controller_balance(&integration_controller);
        if credit < amount {
            return Err(Error::InsufficientCredit);
        }
        if !pool.is_non_profit(&non_profit) {
            return Err(Error::NotWhitelisted);
        }

        self.integration_controllers
            .insert(integration_controller, credit - amount);

        let mut staged = EventLog::new();
        if let Err(err) = pool.donate_through_integration(
            token,
            &self.address,
            non_profit,
            integration_controller,
            batch_id.clone(),
            amount,
            &mut staged,
        ) {
            self.integration_controllers
                .insert(integration_controller, credit);
            return Err(err);
        }
        events.commit(staged);

        events::emit_donation_added(
            events,
            self.address,
            pool.address(),
            non_profit,
            integration_controller,
            batch_id,
            amount,
        );
        info!(
            pool = %pool.address(),
            %non_profit,
            controller = %integration_controller,
            amount,
            "donation routed through integration"
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Fee-bearing public entry points (any caller)
    // ─────────────────────────────────────────────────────────

    /// Deposit `amount` from `caller` into `pool`, optionally skimming the
    /// pool-increase fee from the pool to `referrer`.
    ///
    /// The caller must have approved the manager for `amount`. Returns the fee
    /// actually taken.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pool_balance<T: Token>(
        &self,
        token: &mut T,
        caller: &Address,
        pool: &Pool,
        amount: Amount,
        referrer: Address,
        feeable: bool,
        events: &mut EventLog,
    ) -> Result<Amount, Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let balance_before = pool.balance(&*token)?;
        let nominal = if feeable {
            self.pool_increase_fee.of(amount)
        } else {
            0
        };
        let available = balance_before
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let fee = capped_fee(nominal, available);
        if fee > 0 {
            self.require_manages(pool)?;
        }

        token.transfer_from(&self.address, caller, &pool.address(), amount)?;
        if fee > 0 {
            pool.transfer_balance(token, &self.address, &referrer, fee)?;
        }

        events::emit_pool_balance_increased(events, self.address, *caller, pool.address(), amount);
        debug!(pool = %pool.address(), nominal, fee, %referrer, "pool increase fee");
        info!(pool = %pool.address(), sender = %caller, amount, "pool balance increased");
        Ok(fee)
    }

    /// Contribute `amount` from `caller` straight to a whitelisted
    /// `non_profit`, paying the referral fee out of the pool's existing
    /// holding.
    ///
    /// The non profit always receives the full `amount`. The fee is
    /// `min(amount * directly_contribution_fee / 100, pool balance)`, so an
    /// empty pool pays no fee. Returns the fee actually taken.
    pub fn contribute_to_non_profit<T: Token>(
        &self,
        token: &mut T,
        caller: &Address,
        pool: &Pool,
        non_profit: Address,
        amount: Amount,
        referrer: Address,
    ) -> Result<Amount, Error> {
        if !pool.is_non_profit(&non_profit) {
            return Err(Error::NotWhitelisted);
        }
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let available = pool.balance(&*token)?;
        let nominal = self.directly_contribution_fee.of(amount);
        let fee = capped_fee(nominal, available);
        if fee > 0 {
            self.require_manages(pool)?;
        }

        token.transfer_from(&self.address, caller, &non_profit, amount)?;
        if fee > 0 {
            pool.transfer_balance(token, &self.address, &referrer, fee)?;
        }

        debug!(pool = %pool.address(), nominal, fee, available, %referrer, "direct contribution fee");
        info!(pool = %pool.address(), %non_profit, sender = %caller, amount, "direct contribution");
        Ok(fee)
    }

    // ─────────────────────────────────────────────────────────
    // Governance
    // ─────────────────────────────────────────────────────────

    /// Sweep the pool's entire holding to `destination`. Returns the amount moved.
    pub fn transfer_pool_balance<T: Token>(
        &self,
        token: &mut T,
        caller: &Address,
        pool: &Pool,
        destination: Address,
    ) -> Result<Amount, Error> {
        self.councils.require(caller, Role::GovernanceCouncil)?;
        let balance = pool.balance(&*token)?;
        pool.transfer_balance(token, &self.address, &destination, balance)?;
        info!(pool = %pool.address(), %destination, balance, "pool balance swept");
        Ok(balance)
    }

    pub fn set_governance_council(&mut self, caller: &Address, holder: Address) -> Result<(), Error> {
        self.set_council(caller, Role::GovernanceCouncil, holder)
    }

    pub fn set_non_profit_council(&mut self, caller: &Address, holder: Address) -> Result<(), Error> {
        self.set_council(caller, Role::NonProfitCouncil, holder)
    }

    pub fn set_integration_council(&mut self, caller: &Address, holder: Address) -> Result<(), Error> {
        self.set_council(caller, Role::IntegrationCouncil, holder)
    }

    pub fn set_pool_increase_fee(&mut self, caller: &Address, pct: u8) -> Result<(), Error> {
        self.councils.require(caller, Role::GovernanceCouncil)?;
        self.pool_increase_fee = FeePercentage::new(pct)?;
        info!(fee = %self.pool_increase_fee, "pool increase fee updated");
        Ok(())
    }

    pub fn set_directly_contribution_fee(&mut self, caller: &Address, pct: u8) -> Result<(), Error> {
        self.councils.require(caller, Role::GovernanceCouncil)?;
        self.directly_contribution_fee = FeePercentage::new(pct)?;
        info!(fee = %self.directly_contribution_fee, "directly contribution fee updated");
        Ok(())
    }

    fn require_manages(&self, pool: &Pool) -> Result<(), Error> {
        rbac::require_account(&self.address, &pool.manager(), Role::PoolManager)
    }

    fn set_council(&mut self, caller: &Address, role: Role, holder: Address) -> Result<(), Error> {
        self.councils.assign(caller, role, holder)?;
        info!(%role, %holder, "council seat reassigned");
        Ok(())
    }
}
