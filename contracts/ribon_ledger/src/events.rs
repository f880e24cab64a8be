//! Ledger events.
//!
//! Events are the durable audit trail consumed by off-ledger indexers, so
//! every payload keeps a fixed field order. Each entry records the address of
//! the component that emitted it.

use serde::Serialize;

use crate::types::{Address, Amount, BatchId};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NonProfitAdded {
    pub non_profit: Address,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NonProfitRemoved {
    pub non_profit: Address,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BalanceIncreased {
    pub payer: Address,
    pub amount: Amount,
    /// Attribution tag for the depositor when it differs from the payer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depositor: Option<Address>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PoolBalanceIncreased {
    pub sender: Address,
    pub pool: Address,
    pub amount: Amount,
}

/// Payout from a pool, emitted by the pool itself.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PoolDonationAdded {
    pub batch_id: BatchId,
    pub integration: Address,
    pub non_profit: Address,
    pub amount: Amount,
}

/// Credit-backed donation routed by the manager.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DonationAdded {
    pub pool: Address,
    pub non_profit: Address,
    pub integration_controller: Address,
    pub batch_id: BatchId,
    pub amount: Amount,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IntegrationControllerBalanceAdded {
    pub controller: Address,
    pub amount: Amount,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IntegrationControllerBalanceRemoved {
    pub controller: Address,
    pub amount: Amount,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PoolCreated {
    pub pool: Address,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    NonProfitAdded(NonProfitAdded),
    NonProfitRemoved(NonProfitRemoved),
    BalanceIncreased(BalanceIncreased),
    PoolBalanceIncreased(PoolBalanceIncreased),
    #[serde(rename = "DonationAdded")]
    PoolDonationAdded(PoolDonationAdded),
    DonationAdded(DonationAdded),
    IntegrationControllerBalanceAdded(IntegrationControllerBalanceAdded),
    IntegrationControllerBalanceRemoved(IntegrationControllerBalanceRemoved),
    PoolCreated(PoolCreated),
}

impl LedgerEvent {
    /// Topic name as seen by indexers.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::NonProfitAdded(_) => "NonProfitAdded",
            LedgerEvent::NonProfitRemoved(_) => "NonProfitRemoved",
            LedgerEvent::BalanceIncreased(_) => "BalanceIncreased",
            LedgerEvent::PoolBalanceIncreased(_) => "PoolBalanceIncreased",
            LedgerEvent::PoolDonationAdded(_) | LedgerEvent::DonationAdded(_) => "DonationAdded",
            LedgerEvent::IntegrationControllerBalanceAdded(_) => "IntegrationControllerBalanceAdded",
            LedgerEvent::IntegrationControllerBalanceRemoved(_) => {
                "IntegrationControllerBalanceRemoved"
            }
            LedgerEvent::PoolCreated(_) => "PoolCreated",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EmittedEvent {
    pub emitter: Address,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

/// Ordered, append-only event stream.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: Vec<EmittedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, emitter: Address, event: LedgerEvent) {
        self.entries.push(EmittedEvent { emitter, event });
    }

    /// Move every entry of `staged` to the end of this log.
    pub fn commit(&mut self, staged: EventLog) {
        self.entries.extend(staged.entries);
    }

    pub fn all(&self) -> &[EmittedEvent] {
        &self.entries
    }

    pub fn last(&self) -> Option<&EmittedEvent> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries emitted by `emitter`, in order.
    pub fn emitted_by<'a>(&'a self, emitter: &'a Address) -> impl Iterator<Item = &'a EmittedEvent> {
        self.entries.iter().filter(move |e| &e.emitter == emitter)
    }

    /// One JSON object per line, in emission order.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}

pub fn emit_non_profit_added(events: &mut EventLog, pool: Address, non_profit: Address) {
    events.publish(pool, LedgerEvent::NonProfitAdded(NonProfitAdded { non_profit }));
}

pub fn emit_non_profit_removed(events: &mut EventLog, pool: Address, non_profit: Address) {
    events.publish(
        pool,
        LedgerEvent::NonProfitRemoved(NonProfitRemoved { non_profit }),
    );
}

pub fn emit_balance_increased(
    events: &mut EventLog,
    pool: Address,
    payer: Address,
    amount: Amount,
    depositor: Option<Address>,
) {
    let data = BalanceIncreased {
        payer,
        amount,
        depositor,
    };
    events.publish(pool, LedgerEvent::BalanceIncreased(data));
}

pub fn emit_pool_balance_increased(
    events: &mut EventLog,
    manager: Address,
    sender: Address,
    pool: Address,
    amount: Amount,
) {
    let data = PoolBalanceIncreased {
        sender,
        pool,
        amount,
    };
    events.publish(manager, LedgerEvent::PoolBalanceIncreased(data));
}

pub fn emit_pool_donation_added(
    events: &mut EventLog,
    pool: Address,
    batch_id: BatchId,
    integration: Address,
    non_profit: Address,
    amount: Amount,
) {
    let data = PoolDonationAdded {
        batch_id,
        integration,
        non_profit,
        amount,
    };
    events.publish(pool, LedgerEvent::PoolDonationAdded(data));
}

pub fn emit_donation_added(
    events: &mut EventLog,
    manager: Address,
    pool: Address,
    non_profit: Address,
    integration_controller: Address,
    batch_id: BatchId,
    amount: Amount,
) {
    let data = DonationAdded {
        pool,
        non_profit,
        integration_controller,
        batch_id,
        amount,
    };
    events.publish(manager, LedgerEvent::DonationAdded(data));
}

pub fn emit_integration_controller_balance_added(
    events: &mut EventLog,
    manager: Address,
    controller: Address,
    amount: Amount,
) {
    let data = IntegrationControllerBalanceAdded { controller, amount };
    events.publish(manager, LedgerEvent::IntegrationControllerBalanceAdded(data));
}

pub fn emit_integration_controller_balance_removed(
    events: &mut EventLog,
    manager: Address,
    controller: Address,
    amount: Amount,
) {
    let data = IntegrationControllerBalanceRemoved { controller, amount };
    events.publish(manager, LedgerEvent::IntegrationControllerBalanceRemoved(data));
}

pub fn emit_pool_created(events: &mut EventLog, factory: Address, pool: Address) {
    events.publish(factory, LedgerEvent::PoolCreated(PoolCreated { pool }));
}
