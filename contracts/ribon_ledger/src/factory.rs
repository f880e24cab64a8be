//! Pool lifecycle registry.
//!
//! The factory mints [`Pool`]s bound to its configured manager and records
//! their addresses in an append-only registry. Pools are never removed.
//! Reads are paginated so their cost stays bounded as the registry grows.

use sha2::{Digest, Sha256};
use tracing::info;

use crate::events::{self, EventLog};
use crate::pool::Pool;
use crate::types::{Address, ADDRESS_LEN};

#[derive(Clone, Debug)]
pub struct PoolFactory {
    address: Address,
    manager: Address,
    pools: Vec<Address>,
}

impl PoolFactory {
    pub fn new(address: Address, manager: Address) -> Self {
        Self {
            address,
            manager,
            pools: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    /// Create a pool for `token` bound to this factory's manager.
    ///
    /// Several pools may share a token. The returned pool is owned by the
    /// caller; the factory keeps only its address.
    pub fn create_pool(&mut self, token: Address, events: &mut EventLog) -> Pool {
        let address = self.next_pool_address();
        self.pools.push(address);

        events::emit_pool_created(events, self.address, address);
        info!(factory = %self.address, pool = %address, %token, "pool created");

        Pool::new(address, token, self.manager)
    }

    pub fn get_pools(&self) -> &[Address] {
        &self.pools
    }

    /// Registry slice `[start, start + count)`, clipped to the current length.
    ///
    /// Never fails: out-of-range windows simply return fewer (or no) entries.
    pub fn fetch_pools(&self, start: usize, count: usize) -> &[Address] {
        let len = self.pools.len();
        let from = start.min(len);
        let to = start.saturating_add(count).min(len);
        &self.pools[from..to]
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn contains(&self, pool: &Address) -> bool {
        self.pools.contains(pool)
    }

    /// Address the next [`Self::create_pool`] call will use:
    /// SHA-256(factory address || registry index), truncated.
    pub fn next_pool_address(&self) -> Address {
        let nonce = self.pools.len() as u64;
        let mut hasher = Sha256::new();
        hasher.update(self.address.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Address::from_bytes(bytes)
    }
}
