use crate::events::{
    BalanceIncreased, DonationAdded, IntegrationControllerBalanceAdded,
    IntegrationControllerBalanceRemoved, NonProfitAdded, NonProfitRemoved, PoolBalanceIncreased,
    PoolCreated, PoolDonationAdded,
};
use crate::test_utils::{batch, TestContext};
use crate::{EmittedEvent, Error, EventLog, LedgerEvent};

#[test]
fn test_pool_created_emitted_by_manager() {
    let ctx = TestContext::new();
    let first = &ctx.ledger.events().all()[0];
    assert_eq!(
        first,
        &EmittedEvent {
            emitter: ctx.manager,
            event: LedgerEvent::PoolCreated(PoolCreated { pool: ctx.pool }),
        }
    );
}

#[test]
fn test_whitelist_events_emitted_by_pool() {
    let mut ctx = TestContext::new();
    let (council, pool, np) = (ctx.non_profit_council, ctx.pool, ctx.non_profit);

    ctx.whitelist(np);
    assert_eq!(
        ctx.ledger.events().last(),
        Some(&EmittedEvent {
            emitter: pool,
            event: LedgerEvent::NonProfitAdded(NonProfitAdded { non_profit: np }),
        })
    );

    ctx.ledger
        .remove_non_profit_from_whitelist(&council, &pool, np)
        .unwrap();
    assert_eq!(
        ctx.ledger.events().last(),
        Some(&EmittedEvent {
            emitter: pool,
            event: LedgerEvent::NonProfitRemoved(NonProfitRemoved { non_profit: np }),
        })
    );
}

#[test]
fn test_add_balance_event_carries_depositor() {
    let mut ctx = TestContext::new();
    let (donor, pool) = (ctx.donor, ctx.pool);
    let attributed = ctx.generate_address();
    ctx.approve(&donor, &pool, 500);

    ctx.ledger
        .add_balance(&donor, &pool, 500, Some(attributed))
        .unwrap();

    assert_eq!(
        ctx.ledger.events().last(),
        Some(&EmittedEvent {
            emitter: pool,
            event: LedgerEvent::BalanceIncreased(BalanceIncreased {
                payer: donor,
                amount: 500,
                depositor: Some(attributed),
            }),
        })
    );
}

#[test]
fn test_add_pool_balance_emits_pool_balance_increased() {
    let mut ctx = TestContext::new();
    let (donor, pool, manager, referrer) = (ctx.donor, ctx.pool, ctx.manager, ctx.referrer);
    ctx.approve(&donor, &manager, 250);

    ctx.ledger
        .add_pool_balance(&donor, &pool, 250, referrer, false)
        .unwrap();

    assert_eq!(
        ctx.ledger.events().last(),
        Some(&EmittedEvent {
            emitter: manager,
            event: LedgerEvent::PoolBalanceIncreased(PoolBalanceIncreased {
                sender: donor,
                pool,
                amount: 250,
            }),
        })
    );
}

#[test]
fn test_credit_events() {
    let mut ctx = TestContext::new();
    let (council, manager, integration) =
        (ctx.integration_council, ctx.manager, ctx.integration);

    ctx.grant_credit(integration, 300);
    assert_eq!(
        ctx.ledger.events().last(),
        Some(&EmittedEvent {
            emitter: manager,
            event: LedgerEvent::IntegrationControllerBalanceAdded(
                IntegrationControllerBalanceAdded {
                    controller: integration,
                    amount: 300,
                }
            ),
        })
    );

    ctx.ledger
        .remove_integration_controller_balance(&council, integration, 120)
        .unwrap();
    assert_eq!(
        ctx.ledger.events().last(),
        Some(&EmittedEvent {
            emitter: manager,
            event: LedgerEvent::IntegrationControllerBalanceRemoved(
                IntegrationControllerBalanceRemoved {
                    controller: integration,
                    amount: 120,
                }
            ),
        })
    );
}

#[test]
fn test_donation_emits_pool_then_manager_event() {
    let mut ctx = TestContext::new();
    let (pool, manager, np, integration) = (ctx.pool, ctx.manager, ctx.non_profit, ctx.integration);
    ctx.whitelist(np);
    ctx.fund_pool(1_000);
    ctx.grant_credit(integration, 100);
    let before = ctx.ledger.events().len();

    ctx.ledger
        .donate_through_integration(&integration, &pool, np, integration, batch(), 100)
        .unwrap();

    let emitted = &ctx.ledger.events().all()[before..];
    assert_eq!(
        emitted,
        &[
            EmittedEvent {
                emitter: pool,
                event: LedgerEvent::PoolDonationAdded(PoolDonationAdded {
                    batch_id: batch(),
                    integration,
                    non_profit: np,
                    amount: 100,
                }),
            },
            EmittedEvent {
                emitter: manager,
                event: LedgerEvent::DonationAdded(DonationAdded {
                    pool,
                    non_profit: np,
                    integration_controller: integration,
                    batch_id: batch(),
                    amount: 100,
                }),
            },
        ]
    );
    assert_eq!(emitted[0].event.name(), emitted[1].event.name());
}

#[test]
fn test_failed_operations_emit_nothing() {
    let mut ctx = TestContext::new();
    let (donor, pool, np, integration, referrer) =
        (ctx.donor, ctx.pool, ctx.non_profit, ctx.integration, ctx.referrer);
    let before = ctx.ledger.events().len();

    // No allowance to the pool.
    assert!(ctx.ledger.add_balance(&donor, &pool, 10, None).is_err());
    // Not whitelisted.
    ctx.grant_credit(integration, 10);
    let after_grant = ctx.ledger.events().len();
    assert_eq!(
        ctx.ledger
            .donate_through_integration(&integration, &pool, np, integration, batch(), 10),
        Err(Error::NotWhitelisted)
    );
    // No allowance to the manager.
    assert!(ctx
        .ledger
        .add_pool_balance(&donor, &pool, 10, referrer, true)
        .is_err());

    assert_eq!(after_grant, before + 1);
    assert_eq!(ctx.ledger.events().len(), after_grant);
}

#[test]
fn test_donation_rolled_back_when_pool_transfer_fails() {
    let mut ctx = TestContext::new();
    let (pool, np, integration) = (ctx.pool, ctx.non_profit, ctx.integration);
    ctx.whitelist(np);
    ctx.grant_credit(integration, 100);
    let before = ctx.ledger.events().len();

    // Pool is empty: the payout fails after the credit check passes.
    assert!(matches!(
        ctx.ledger
            .donate_through_integration(&integration, &pool, np, integration, batch(), 100),
        Err(Error::ValueTransfer(_))
    ));
    assert_eq!(ctx.ledger.events().len(), before);
    assert_eq!(ctx.credit(&integration), 100);
}

#[test]
fn test_json_lines_shape() {
    let mut ctx = TestContext::new();
    let (pool, np) = (ctx.pool, ctx.non_profit);
    ctx.whitelist(np);

    let lines = ctx.ledger.events().to_json_lines().unwrap();
    let parsed: Vec<serde_json::Value> = lines
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0]["event"], "PoolCreated");
    assert_eq!(parsed[0]["pool"], pool.to_string());
    assert_eq!(parsed[1]["event"], "NonProfitAdded");
    assert_eq!(parsed[1]["emitter"], pool.to_string());
    assert_eq!(parsed[1]["non_profit"], np.to_string());
}

#[test]
fn test_pool_donation_serializes_as_donation_added() {
    let entry = EmittedEvent {
        emitter: crate::Address::derive(b"pool"),
        event: LedgerEvent::PoolDonationAdded(PoolDonationAdded {
            batch_id: batch(),
            integration: crate::Address::derive(b"integration"),
            non_profit: crate::Address::derive(b"np"),
            amount: 7,
        }),
    };
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["event"], "DonationAdded");
    assert_eq!(json["batch_id"], "batch-0001");
    assert_eq!(json["amount"], 7);
}

#[test]
fn test_absent_depositor_is_omitted() {
    let mut log = EventLog::new();
    crate::events::emit_balance_increased(
        &mut log,
        crate::Address::derive(b"pool"),
        crate::Address::derive(b"payer"),
        3,
        None,
    );
    let json = serde_json::to_value(log.last().unwrap()).unwrap();
    assert!(json.get("depositor").is_none());
    assert_eq!(log.emitted_by(&crate::Address::derive(b"pool")).count(), 1);
    assert_eq!(log.emitted_by(&crate::Address::derive(b"payer")).count(), 0);
}
