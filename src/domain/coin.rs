// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An amount of a single denomination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: U256) -> Self {
        Coin {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = String;

    /// Parses the `<amount><denom>` form, e.g. `1000000uosmo`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (amount_raw, denom) = s.split_at(split);
        if amount_raw.is_empty() {
            return Err(format!("missing amount in coin: {s}"));
        }
        if denom.is_empty() {
            return Err(format!("missing denom in coin: {s}"));
        }
        let amount = U256::from_str_radix(amount_raw, 10)
            .map_err(|e| format!("invalid amount in coin {s}: {e}"))?;
        Ok(Coin::new(denom, amount))
    }
}

/// Unordered denomination pair in canonical (lexicographic) order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DenomPair {
    pub denom0: String,
    pub denom1: String,
}

impl DenomPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            DenomPair { denom0: a, denom1: b }
        } else {
            DenomPair { denom0: b, denom1: a }
        }
    }
}
