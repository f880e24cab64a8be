//! Per-cause custody and whitelist.
//!
//! A pool is bound to one token and one manager at creation. Its balance is
//! whatever the token reports for the pool's address: deposits pull into it
//! with `transfer_from`, payouts push out of it with `transfer`, and no
//! separate counter exists that could drift from the token.
//!
//! Every mutating entry point except deposits requires the caller to be the
//! pool's manager.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::events::{self, EventLog};
use crate::rbac::{self, Role};
use crate::token::Token;
use crate::types::{Address, Amount, BatchId};
use crate::Error;

#[derive(Clone, Debug)]
pub struct Pool {
    address: Address,
    token: Address,
    manager: Address,
    non_profits: HashMap<Address, bool>,
}

impl Pool {
    pub fn new(address: Address, token: Address, manager: Address) -> Self {
        Self {
            address,
            token,
            manager,
            non_profits: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    /// Whether `non_profit` is an eligible payout recipient.
    ///
    /// Absence and an explicit `false` entry are equivalent.
    pub fn is_non_profit(&self, non_profit: &Address) -> bool {
        self.non_profits.get(non_profit).copied().unwrap_or(false)
    }

    /// The pool's current holding in its token.
    pub fn balance<T: Token>(&self, token: &T) -> Result<Amount, Error> {
        self.require_token(token)?;
        Ok(token.balance_of(&self.address))
    }

    /// Whitelist `non_profit`. Idempotent: re-adding succeeds and re-emits.
    pub fn add_non_profit_to_whitelist(
        &mut self,
        caller: &Address,
        non_profit: Address,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        self.require_manager(caller)?;
        self.non_profits.insert(non_profit, true);
        events::emit_non_profit_added(events, self.address, non_profit);
        info!(pool = %self.address, %non_profit, "non profit whitelisted");
        Ok(())
    }

    pub fn remove_non_profit_from_whitelist(
        &mut self,
        caller: &Address,
        non_profit: Address,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        self.require_manager(caller)?;
        self.non_profits.insert(non_profit, false);
        events::emit_non_profit_removed(events, self.address, non_profit);
        info!(pool = %self.address, %non_profit, "non profit removed from whitelist");
        Ok(())
    }

    /// Pull `amount` from `caller` into the pool using the caller's allowance
    /// to the pool.
    ///
    /// `depositor` is attribution metadata for the event only; funds always
    /// come from `caller`. Token failures propagate unchanged.
    pub fn add_balance<T: Token>(
        &self,
        token: &mut T,
        caller: &Address,
        amount: Amount,
        depositor: Option<Address>,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        self.require_token(token)?;

        token.transfer_from(&self.address, caller, &self.address, amount)?;

        events::emit_balance_increased(events, self.address, *caller, amount, depositor);
        debug!(pool = %self.address, payer = %caller, amount, "pool balance increased");
        Ok(())
    }

    /// Pay `amount` from the pool to a whitelisted `non_profit`.
    ///
    /// `integration` is the router recorded in the event and `batch_id` the
    /// recipient tag echoed alongside it.
    #[allow(clippy::too_many_arguments)]
    pub fn donate_through_integration<T: Token>(
        &self,
        token: &mut T,
        caller: &Address,
        non_profit: Address,
        integration: Address,
        batch_id: BatchId,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), Error> {
        self.require_manager(caller)?;
        if !self.is_non_profit(&non_profit) {
            return Err(Error::NotWhitelisted);
        }
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        self.require_token(token)?;

        token.transfer(&self.address, &non_profit, amount)?;

        events::emit_pool_donation_added(
            events,
            self.address,
            batch_id,
            integration,
            non_profit,
            amount,
        );
        info!(pool = %self.address, %non_profit, %integration, amount, "donation paid out");
        Ok(())
    }

    /// Push `amount` of the pool's holding to `recipient`.
    ///
    /// Used by the manager for referral-fee skims and balance sweeps; emits
    /// nothing, the balance change is the record.
    pub fn transfer_balance<T: Token>(
        &self,
        token: &mut T,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<(), Error> {
        self.require_manager(caller)?;
        self.require_token(token)?;
        if amount == 0 {
            return Ok(());
        }
        token.transfer(&self.address, recipient, amount)?;
        Ok(())
    }

    fn require_manager(&self, caller: &Address) -> Result<(), Error> {
        rbac::require_account(caller, &self.manager, Role::PoolManager)
    }

    fn require_token<T: Token>(&self, token: &T) -> Result<(), Error> {
        let found = token.address();
        if found != self.token {
            return Err(Error::TokenMismatch {
                expected: self.token,
                found,
            });
        }
        Ok(())
    }
}
