//! World state and call routing.
//!
//! [`Ledger`] owns the manager, every pool and every token, and exposes the
//! whole public surface by address. Calls are serialized by `&mut self`: no
//! two operations interleave, so the balance-read / fee-compute / transfer
//! sequences inside the manager never observe a concurrent change.
//!
//! Each call runs against the current state with its events staged. On
//! success the events are committed; on failure they are dropped. Entry
//! points check before they mutate, so a rejected call leaves nothing to undo
//! except where two token transfers run back to back: `add_pool_balance` and
//! `contribute_to_non_profit` save the pool's token first and put it back if
//! the fee transfer fails after the pull.

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::ManagerConfig;
use crate::events::EventLog;
use crate::manager::Manager;
use crate::pool::Pool;
use crate::token::{InMemoryToken, Token};
use crate::types::{Address, Amount, BatchId};
use crate::Error;

#[derive(Clone, Debug)]
struct State<T> {
    manager: Manager,
    pools: BTreeMap<Address, Pool>,
    tokens: BTreeMap<Address, T>,
}

impl<T: Token> State<T> {
    fn pool(&self, address: &Address) -> Result<&Pool, Error> {
        self.pools.get(address).ok_or(Error::PoolNotFound(*address))
    }

    fn token(&self, address: &Address) -> Result<&T, Error> {
        self.tokens.get(address).ok_or(Error::TokenNotFound(*address))
    }
}

/// Split borrow of a pool and the token it holds.
fn pool_and_token<'a, T>(
    pools: &'a BTreeMap<Address, Pool>,
    tokens: &'a mut BTreeMap<Address, T>,
    pool: &Address,
) -> Result<(&'a Pool, &'a mut T), Error> {
    let pool = pools.get(pool).ok_or(Error::PoolNotFound(*pool))?;
    let token_address = pool.token();
    let token = tokens
        .get_mut(&token_address)
        .ok_or(Error::TokenNotFound(token_address))?;
    Ok((pool, token))
}

#[derive(Clone, Debug)]
pub struct Ledger<T: Token + Clone = InMemoryToken> {
    state: State<T>,
    events: EventLog,
}

impl<T: Token + Clone> Ledger<T> {
    pub fn new(manager: Manager) -> Self {
        Self {
            state: State {
                manager,
                pools: BTreeMap::new(),
                tokens: BTreeMap::new(),
            },
            events: EventLog::new(),
        }
    }

    pub fn from_config(manager_address: Address, config: &ManagerConfig) -> Self {
        Self::new(Manager::from_config(manager_address, config))
    }

    // ─────────────────────────────────────────────────────────
    // Deployment
    // ─────────────────────────────────────────────────────────

    /// Make a token reachable by its address.
    pub fn register_token(&mut self, token: T) -> Result<Address, Error> {
        let address = token.address();
        if self.state.tokens.contains_key(&address) {
            return Err(Error::TokenExists(address));
        }
        self.state.tokens.insert(address, token);
        Ok(address)
    }

    /// Deploy a pool outside the manager's registry, bound to an arbitrary
    /// `manager` account.
    pub fn deploy_pool(
        &mut self,
        address: Address,
        token: Address,
        manager: Address,
    ) -> Result<Address, Error> {
        if self.state.pools.contains_key(&address) {
            return Err(Error::PoolExists(address));
        }
        self.state.token(&token)?;
        self.state
            .pools
            .insert(address, Pool::new(address, token, manager));
        Ok(address)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn manager(&self) -> &Manager {
        &self.state.manager
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn pool(&self, address: &Address) -> Result<&Pool, Error> {
        self.state.pool(address)
    }

    pub fn token(&self, address: &Address) -> Result<&T, Error> {
        self.state.token(address)
    }

    /// Direct access to a token for operations outside the ledger's
    /// surface (minting, approvals, plain transfers).
    pub fn token_mut(&mut self, address: &Address) -> Result<&mut T, Error> {
        self.state
            .tokens
            .get_mut(address)
            .ok_or(Error::TokenNotFound(*address))
    }

    pub fn pool_balance(&self, pool: &Address) -> Result<Amount, Error> {
        let pool = self.state.pool(pool)?;
        pool.balance(self.state.token(&pool.token())?)
    }

    pub fn balance_of(&self, token: &Address, account: &Address) -> Result<Amount, Error> {
        Ok(self.state.token(token)?.balance_of(account))
    }

    pub fn is_non_profit(&self, pool: &Address, non_profit: &Address) -> Result<bool, Error> {
        Ok(self.state.pool(pool)?.is_non_profit(non_profit))
    }

    pub fn get_pools(&self) -> &[Address] {
        self.state.manager.get_pools()
    }

    pub fn fetch_pools(&self, start: usize, count: usize) -> &[Address] {
        self.state.manager.fetch_pools(start, count)
    }

    // ─────────────────────────────────────────────────────────
    // Pool lifecycle and whitelists
    // ─────────────────────────────────────────────────────────

    pub fn create_pool(&mut self, caller: &Address, token: Address) -> Result<Address, Error> {
        self.execute("create_pool", |state, events| {
            state.token(&token)?;
            let next = state.manager.factory().next_pool_address();
            if state.pools.contains_key(&next) {
                return Err(Error::PoolExists(next));
            }
            let pool = state.manager.create_pool(caller, token, events)?;
            let address = pool.address();
            state.pools.insert(address, pool);
            Ok(address)
        })
    }

    pub fn add_non_profit_to_whitelist(
        &mut self,
        caller: &Address,
        pool: &Address,
        non_profit: Address,
    ) -> Result<(), Error> {
        self.execute("add_non_profit_to_whitelist", |state, events| {
            let State { manager, pools, .. } = state;
            let pool = pools.get_mut(pool).ok_or(Error::PoolNotFound(*pool))?;
            manager.add_non_profit_to_whitelist(caller, pool, non_profit, events)
        })
    }

    pub fn remove_non_profit_from_whitelist(
        &mut self,
        caller: &Address,
        pool: &Address,
        non_profit: Address,
    ) -> Result<(), Error> {
        self.execute("remove_non_profit_from_whitelist", |state, events| {
            let State { manager, pools, .. } = state;
            let pool = pools.get_mut(pool).ok_or(Error::PoolNotFound(*pool))?;
            manager.remove_non_profit_from_whitelist(caller, pool, non_profit, events)
        })
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Deposit straight into a pool; `caller` must have approved the pool.
    pub fn add_balance(
        &mut self,
        caller: &Address,
        pool: &Address,
        amount: Amount,
        depositor: Option<Address>,
    ) -> Result<(), Error> {
        self.execute("add_balance", |state, events| {
            let (pool, token) = pool_and_token(&state.pools, &mut state.tokens, pool)?;
            pool.add_balance(token, caller, amount, depositor, events)
        })
    }

    /// Deposit through the manager; `caller` must have approved the manager.
    /// Returns the referral fee taken.
    pub fn add_pool_balance(
        &mut self,
        caller: &Address,
        pool: &Address,
        amount: Amount,
        referrer: Address,
        feeable: bool,
    ) -> Result<Amount, Error> {
        self.execute_restoring("add_pool_balance", pool, |state, events| {
            let State {
                manager,
                pools,
                tokens,
            } = state;
            let (pool, token) = pool_and_token(pools, tokens, pool)?;
            manager.add_pool_balance(token, caller, pool, amount, referrer, feeable, events)
        })
    }

    /// Contribute straight to a whitelisted non profit; `caller` must have
    /// approved the manager. Returns the referral fee taken from the pool.
    pub fn contribute_to_non_profit(
        &mut self,
        caller: &Address,
        pool: &Address,
        non_profit: Address,
        amount: Amount,
        referrer: Address,
    ) -> Result<Amount, Error> {
        self.execute_restoring("contribute_to_non_profit", pool, |state, _events| {
            let State {
                manager,
                pools,
                tokens,
            } = state;
            let (pool, token) = pool_and_token(pools, tokens, pool)?;
            manager.contribute_to_non_profit(token, caller, pool, non_profit, amount, referrer)
        })
    }

    // ─────────────────────────────────────────────────────────
    // Integration credit
    // ─────────────────────────────────────────────────────────

    pub fn add_integration_controller_balance(
        &mut self,
        caller: &Address,
        controller: Address,
        amount: Amount,
    ) -> Result<(), Error> {
        self.execute("add_integration_controller_balance", |state, events| {
            state
                .manager
                .add_integration_controller_balance(caller, controller, amount, events)
        })
    }

    pub fn remove_integration_controller_balance(
        &mut self,
        caller: &Address,
        controller: Address,
        amount: Amount,
    ) -> Result<(), Error> {
        self.execute("remove_integration_controller_balance", |state, events| {
            state
                .manager
                .remove_integration_controller_balance(caller, controller, amount, events)
        })
    }

    pub fn donate_through_integration(
        &mut self,
        caller: &Address,
        pool: &Address,
        non_profit: Address,
        integration_controller: Address,
        batch_id: BatchId,
        amount: Amount,
    ) -> Result<(), Error> {
        self.execute("donate_through_integration", |state, events| {
            let State {
                manager,
                pools,
                tokens,
            } = state;
            let (pool, token) = pool_and_token(pools, tokens, pool)?;
            manager.donate_through_integration(
                token,
                caller,
                pool,
                non_profit,
                integration_controller,
                batch_id,
                amount,
                events,
            )
        })
    }

    // ─────────────────────────────────────────────────────────
    // Governance
    // ─────────────────────────────────────────────────────────

    pub fn transfer_pool_balance(
        &mut self,
        caller: &Address,
        pool: &Address,
        destination: Address,
    ) -> Result<Amount, Error> {
        self.execute("transfer_pool_balance", |state, _events| {
            let State {
                manager,
                pools,
                tokens,
            } = state;
            let (pool, token) = pool_and_token(pools, tokens, pool)?;
            manager.transfer_pool_balance(token, caller, pool, destination)
        })
    }

    pub fn set_governance_council(&mut self, caller: &Address, holder: Address) -> Result<(), Error> {
        self.execute("set_governance_council", |state, _| {
            state.manager.set_governance_council(caller, holder)
        })
    }

    pub fn set_non_profit_council(&mut self, caller: &Address, holder: Address) -> Result<(), Error> {
        self.execute("set_non_profit_council", |state, _| {
            state.manager.set_non_profit_council(caller, holder)
        })
    }

    pub fn set_integration_council(&mut self, caller: &Address, holder: Address) -> Result<(), Error> {
        self.execute("set_integration_council", |state, _| {
            state.manager.set_integration_council(caller, holder)
        })
    }

    pub fn set_pool_increase_fee(&mut self, caller: &Address, pct: u8) -> Result<(), Error> {
        self.execute("set_pool_increase_fee", |state, _| {
            state.manager.set_pool_increase_fee(caller, pct)
        })
    }

    pub fn set_directly_contribution_fee(&mut self, caller: &Address, pct: u8) -> Result<(), Error> {
        self.execute("set_directly_contribution_fee", |state, _| {
            state.manager.set_directly_contribution_fee(caller, pct)
        })
    }

    fn execute<R>(
        &mut self,
        operation: &'static str,
        call: impl FnOnce(&mut State<T>, &mut EventLog) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.run(operation, None, call)
    }

    /// Like [`Self::execute`], but puts `pool`'s token back as it was if the
    /// call fails.
    fn execute_restoring<R>(
        &mut self,
        operation: &'static str,
        pool: &Address,
        call: impl FnOnce(&mut State<T>, &mut EventLog) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let saved = self
            .state
            .pools
            .get(pool)
            .and_then(|pool| self.state.tokens.get(&pool.token()))
            .cloned();
        self.run(operation, saved, call)
    }

    fn run<R>(
        &mut self,
        operation: &'static str,
        saved: Option<T>,
        call: impl FnOnce(&mut State<T>, &mut EventLog) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut staged = EventLog::new();
        match call(&mut self.state, &mut staged) {
            Ok(out) => {
                self.events.commit(staged);
                Ok(out)
            }
            Err(err) => {
                if let Some(token) = saved {
                    self.state.tokens.insert(token.address(), token);
                }
                warn!(operation, code = err.code(), error = %err, "operation reverted");
                Err(err)
            }
        }
    }
}
