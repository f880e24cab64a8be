use crate::test_utils::TestContext;
use crate::{Error, FeePercentage, Role};

#[test]
fn test_fee_cap_rejects_fifty() {
    let mut ctx = TestContext::new();
    let governance = ctx.governance;

    assert_eq!(
        ctx.ledger.set_pool_increase_fee(&governance, 50),
        Err(Error::FeeTooHigh)
    );
    assert_eq!(
        ctx.ledger.set_directly_contribution_fee(&governance, 50),
        Err(Error::FeeTooHigh)
    );
    assert_eq!(
        Error::FeeTooHigh.to_string(),
        "Fee must be less than 50%"
    );

    let manager = ctx.ledger.manager();
    assert_eq!(manager.pool_increase_fee(), FeePercentage::ZERO);
    assert_eq!(manager.directly_contribution_fee(), FeePercentage::ZERO);
}

#[test]
fn test_fee_cap_accepts_forty_nine() {
    let mut ctx = TestContext::new();
    let governance = ctx.governance;

    ctx.ledger.set_pool_increase_fee(&governance, 49).unwrap();
    ctx.ledger
        .set_directly_contribution_fee(&governance, 49)
        .unwrap();

    let manager = ctx.ledger.manager();
    assert_eq!(manager.pool_increase_fee().get(), 49);
    assert_eq!(manager.directly_contribution_fee().get(), 49);
}

#[test]
fn test_non_governance_cannot_set_fees() {
    let mut ctx = TestContext::new();
    let governance = ctx.governance;
    ctx.ledger.set_pool_increase_fee(&governance, 7).unwrap();
    let stranger = ctx.generate_address();

    assert_eq!(
        ctx.ledger.set_pool_increase_fee(&stranger, 10),
        Err(Error::Unauthorized {
            role: Role::GovernanceCouncil
        })
    );
    assert_eq!(
        ctx.ledger.set_directly_contribution_fee(&stranger, 10),
        Err(Error::Unauthorized {
            role: Role::GovernanceCouncil
        })
    );
    assert_eq!(ctx.ledger.manager().pool_increase_fee().get(), 7);
    assert_eq!(ctx.ledger.manager().directly_contribution_fee().get(), 0);
}

#[test]
fn test_unauthorized_is_reported_before_fee_bound() {
    let mut ctx = TestContext::new();
    let stranger = ctx.generate_address();
    assert_eq!(
        ctx.ledger.set_pool_increase_fee(&stranger, 50),
        Err(Error::Unauthorized {
            role: Role::GovernanceCouncil
        })
    );
}

#[test]
fn test_contribution_fee_capped_at_partial_pool_balance() {
    let mut ctx = TestContext::new();
    let (donor, pool, manager, np, referrer, governance) = (
        ctx.donor,
        ctx.pool,
        ctx.manager,
        ctx.non_profit,
        ctx.referrer,
        ctx.governance,
    );
    ctx.ledger
        .set_directly_contribution_fee(&governance, 40)
        .unwrap();
    ctx.whitelist(np);
    ctx.fund_pool(15);
    ctx.approve(&donor, &manager, 100);

    // Nominal fee is 40; the pool only holds 15.
    let fee = ctx
        .ledger
        .contribute_to_non_profit(&donor, &pool, np, 100, referrer)
        .unwrap();

    assert_eq!(fee, 15);
    assert_eq!(ctx.balance(&referrer), 15);
    assert_eq!(ctx.pool_balance(), 0);
    assert_eq!(ctx.balance(&np), 100);
}

#[test]
fn test_pool_increase_fee_floors() {
    let mut ctx = TestContext::new();
    let (donor, pool, manager, referrer, governance) =
        (ctx.donor, ctx.pool, ctx.manager, ctx.referrer, ctx.governance);
    ctx.ledger.set_pool_increase_fee(&governance, 3).unwrap();
    ctx.approve(&donor, &manager, 1_000);

    // 3% of 33 is 0.99, floored to 0.
    assert_eq!(
        ctx.ledger
            .add_pool_balance(&donor, &pool, 33, referrer, true),
        Ok(0)
    );
    // 3% of 34 is 1.02, floored to 1.
    assert_eq!(
        ctx.ledger
            .add_pool_balance(&donor, &pool, 34, referrer, true),
        Ok(1)
    );
    assert_eq!(ctx.pool_balance(), 66);
    assert_eq!(ctx.balance(&referrer), 1);
}

#[test]
fn test_fee_change_applies_to_next_call_only() {
    let mut ctx = TestContext::new();
    let (donor, pool, manager, referrer, governance) =
        (ctx.donor, ctx.pool, ctx.manager, ctx.referrer, ctx.governance);
    ctx.approve(&donor, &manager, 2_000);

    ctx.ledger
        .add_pool_balance(&donor, &pool, 1_000, referrer, true)
        .unwrap();
    assert_eq!(ctx.balance(&referrer), 0);

    ctx.ledger.set_pool_increase_fee(&governance, 20).unwrap();
    ctx.ledger
        .add_pool_balance(&donor, &pool, 1_000, referrer, true)
        .unwrap();
    assert_eq!(ctx.balance(&referrer), 200);
    assert_eq!(ctx.pool_balance(), 1_800);
}
