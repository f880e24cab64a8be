//! Referral fee math.
//!
//! Fees are whole percentages strictly below [`MAX_FEE_PERCENTAGE`]. A fee is
//! always taken out of a pool's existing holding, so the amount actually
//! skimmed is `min(nominal, available)`: an underfunded pool yields a smaller
//! (possibly zero) fee and the operation still succeeds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Amount;
use crate::Error;

/// Exclusive upper bound for any fee percentage.
pub const MAX_FEE_PERCENTAGE: u8 = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FeePercentage(u8);

impl FeePercentage {
    pub const ZERO: FeePercentage = FeePercentage(0);

    pub fn new(pct: u8) -> Result<Self, Error> {
        if pct >= MAX_FEE_PERCENTAGE {
            return Err(Error::FeeTooHigh);
        }
        Ok(Self(pct))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// `floor(amount * pct / 100)`, computed without intermediate overflow.
    pub fn of(self, amount: Amount) -> Amount {
        let pct = Amount::from(self.0);
        // amount = 100q + r  =>  floor(amount * pct / 100) = q * pct + floor(r * pct / 100)
        (amount / 100) * pct + (amount % 100) * pct / 100
    }
}

impl TryFrom<u8> for FeePercentage {
    type Error = Error;

    fn try_from(pct: u8) -> Result<Self, Self::Error> {
        Self::new(pct)
    }
}

impl From<FeePercentage> for u8 {
    fn from(fee: FeePercentage) -> Self {
        fee.0
    }
}

impl fmt::Display for FeePercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Fee actually taken: the nominal fee, capped at what the pool holds.
pub fn capped_fee(nominal: Amount, available: Amount) -> Amount {
    nominal.min(available)
}
