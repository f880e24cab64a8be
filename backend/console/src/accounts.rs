//! Named accounts.
//!
//! Scenarios and environment variables refer to accounts either by a
//! `0x`-prefixed address or by a plain name. A name resolves to whatever was
//! bound to it (role holders, created pools, deployed tokens) or, failing
//! that, to `Address::derive(name)`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ribon_ledger::Address;
use serde::{Deserialize, Deserializer};

use crate::errors::{ConsoleError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountRef {
    Address(Address),
    Name(String),
}

impl AccountRef {
    /// Address for this reference outside of any book: names are derived.
    pub fn standalone(&self) -> Address {
        match self {
            AccountRef::Address(address) => *address,
            AccountRef::Name(name) => Address::derive(name),
        }
    }
}

impl FromStr for AccountRef {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConsoleError::Scenario("empty account reference".to_string()));
        }
        if s.starts_with("0x") || s.starts_with("0X") {
            let address = s
                .parse()
                .map_err(|e| ConsoleError::Scenario(format!("bad address {s}: {e}")))?;
            return Ok(AccountRef::Address(address));
        }
        Ok(AccountRef::Name(s.to_string()))
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Address(address) => write!(f, "{address}"),
            AccountRef::Name(name) => f.write_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for AccountRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Name table shared by every step of a run.
#[derive(Debug, Default)]
pub struct Accounts {
    names: BTreeMap<String, Address>,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, address: Address) {
        self.names.insert(name.into(), address);
    }

    /// Resolve a reference, remembering derived names so they show up in
    /// the final report.
    pub fn resolve(&mut self, account: &AccountRef) -> Address {
        match account {
            AccountRef::Address(address) => *address,
            AccountRef::Name(name) => *self
                .names
                .entry(name.clone())
                .or_insert_with(|| Address::derive(name)),
        }
    }

    /// Name bound to `address`, if any.
    pub fn name_of(&self, address: &Address) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, a)| *a == address)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.names.iter().map(|(name, address)| (name.as_str(), *address))
    }
}
