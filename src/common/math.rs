// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Scale of one whole unit: 10^18.
const ONE_RAW: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

const DECIMAL_PLACES: usize = 18;

/// Returns x * y / denominator, rounded down. `None` on overflow or zero denominator.
pub fn mul_div_down(x: U256, y: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    if x.is_zero() || y.is_zero() {
        return Some(U256::ZERO);
    }
    if x > U256::MAX / y {
        return None;
    }
    Some(x * y / denominator)
}

/// Floor of the base-10 logarithm of `amount`; zero maps to zero.
pub fn order_of_magnitude(amount: U256) -> u32 {
    let ten = U256::from(10u64);
    let mut value = amount;
    let mut magnitude = 0u32;
    while value >= ten {
        value /= ten;
        magnitude += 1;
    }
    magnitude
}

/// Non-negative fixed-point fraction with 18 decimal places, backed by U256.
///
/// Used for spread factors and taker fees, both constrained to [0, 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedDec(U256);

impl FixedDec {
    pub const ZERO: FixedDec = FixedDec(U256::ZERO);
    pub const ONE: FixedDec = FixedDec(ONE_RAW);

    pub const fn from_raw(raw: U256) -> Self {
        FixedDec(raw)
    }

    pub const fn raw(&self) -> U256 {
        self.0
    }

    /// `numerator / denominator` as a fixed-point fraction. Panics on a zero denominator.
    pub fn from_ratio(numerator: u64, denominator: u64) -> Self {
        assert!(denominator != 0, "zero denominator");
        FixedDec(U256::from(numerator) * ONE_RAW / U256::from(denominator))
    }

    pub fn from_bps(bps: u64) -> Self {
        Self::from_ratio(bps, 10_000)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `amount * self`, floored. `None` on overflow.
    pub fn mul_down(&self, amount: U256) -> Option<U256> {
        mul_div_down(amount, self.0, ONE_RAW)
    }

    /// `1 - self`, saturating at zero.
    pub fn complement(&self) -> FixedDec {
        FixedDec(ONE_RAW.saturating_sub(self.0))
    }
}

impl fmt::Display for FixedDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integer = self.0 / ONE_RAW;
        let fraction = self.0 % ONE_RAW;
        write!(f, "{integer}.{fraction:0>width$}", width = DECIMAL_PLACES)
    }
}

impl FromStr for FixedDec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if frac_part.len() > DECIMAL_PLACES {
            return Err(format!("more than {DECIMAL_PLACES} decimal places: {s}"));
        }
        let integer = if int_part.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(int_part, 10).map_err(|e| format!("invalid integer part: {e}"))?
        };
        let mut frac = if frac_part.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(frac_part, 10)
                .map_err(|e| format!("invalid fractional part: {e}"))?
        };
        for _ in frac_part.len()..DECIMAL_PLACES {
            frac *= U256::from(10u64);
        }
        integer
            .checked_mul(ONE_RAW)
            .and_then(|i| i.checked_add(frac))
            .map(FixedDec)
            .ok_or_else(|| format!("value out of range: {s}"))
    }
}

impl Serialize for FixedDec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FixedDec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
