use std::collections::HashSet;

use crate::events::PoolCreated;
use crate::{Address, EventLog, LedgerEvent, PoolFactory};

fn factory() -> PoolFactory {
    PoolFactory::new(Address::derive(b"factory"), Address::derive(b"manager"))
}

#[test]
fn test_create_pool_binds_manager_and_token() {
    let mut factory = factory();
    let mut events = EventLog::new();
    let token = Address::derive(b"token");

    let pool = factory.create_pool(token, &mut events);

    assert_eq!(pool.token(), token);
    assert_eq!(pool.manager(), factory.manager());
    assert_eq!(factory.get_pools(), &[pool.address()]);
    assert!(factory.contains(&pool.address()));
    assert_eq!(events.len(), 1);
    let entry = &events.all()[0];
    assert_eq!(entry.emitter, factory.address());
    assert_eq!(
        entry.event,
        LedgerEvent::PoolCreated(PoolCreated {
            pool: pool.address()
        })
    );
}

#[test]
fn test_pool_addresses_are_distinct() {
    let mut factory = factory();
    let mut events = EventLog::new();
    let token = Address::derive(b"token");

    let addresses: HashSet<Address> = (0..25)
        .map(|_| factory.create_pool(token, &mut events).address())
        .collect();

    assert_eq!(addresses.len(), 25);
    assert_eq!(factory.pool_count(), 25);
    assert!(!addresses.contains(&factory.address()));
}

#[test]
fn test_pool_addresses_depend_on_factory() {
    let mut events = EventLog::new();
    let token = Address::derive(b"token");
    let manager = Address::derive(b"manager");

    let mut a = PoolFactory::new(Address::derive(b"factory-a"), manager);
    let mut b = PoolFactory::new(Address::derive(b"factory-b"), manager);
    let mut a_again = PoolFactory::new(Address::derive(b"factory-a"), manager);

    let pa = a.create_pool(token, &mut events).address();
    let pb = b.create_pool(token, &mut events).address();
    let pa_again = a_again.create_pool(token, &mut events).address();

    assert_ne!(pa, pb);
    assert_eq!(pa, pa_again);
}

#[test]
fn test_fetch_pools_windows() {
    let mut factory = factory();
    let mut events = EventLog::new();
    let token = Address::derive(b"token");
    for _ in 0..5 {
        factory.create_pool(token, &mut events);
    }
    let all = factory.get_pools().to_vec();

    assert_eq!(factory.fetch_pools(0, 2), &all[0..2]);
    assert_eq!(factory.fetch_pools(3, 2), &all[3..5]);
    assert_eq!(factory.fetch_pools(0, 5), &all[..]);
}

#[test]
fn test_fetch_pools_clips_out_of_range() {
    let mut factory = factory();
    let mut events = EventLog::new();
    let token = Address::derive(b"token");
    for _ in 0..3 {
        factory.create_pool(token, &mut events);
    }

    assert_eq!(factory.fetch_pools(2, 10).len(), 1);
    assert!(factory.fetch_pools(3, 1).is_empty());
    assert!(factory.fetch_pools(100, 5).is_empty());
    assert!(factory.fetch_pools(1, 0).is_empty());
    assert_eq!(factory.fetch_pools(0, usize::MAX).len(), 3);
    assert!(factory.fetch_pools(usize::MAX, usize::MAX).is_empty());
}

#[test]
fn test_empty_registry() {
    let factory = factory();
    assert!(factory.get_pools().is_empty());
    assert!(factory.fetch_pools(0, 10).is_empty());
    assert_eq!(factory.pool_count(), 0);
}

#[test]
fn test_pools_may_share_a_token() {
    let mut factory = factory();
    let mut events = EventLog::new();
    let token = Address::derive(b"token");

    let first = factory.create_pool(token, &mut events);
    let second = factory.create_pool(token, &mut events);

    assert_eq!(first.token(), second.token());
    assert_ne!(first.address(), second.address());
}
