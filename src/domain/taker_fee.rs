// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::math::FixedDec;
use crate::domain::coin::DenomPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-pair taker fee on the traded denom pair, canonical order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerFeeForPair {
    pub denom0: String,
    pub denom1: String,
    pub taker_fee: FixedDec,
}

/// Ordered-pair fee lookup with a default fallback. Lookups never fail.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerFeeTable {
    fees: BTreeMap<DenomPair, FixedDec>,
    default_fee: FixedDec,
}

impl TakerFeeTable {
    pub fn new(default_fee: FixedDec) -> Self {
        TakerFeeTable {
            fees: BTreeMap::new(),
            default_fee,
        }
    }

    pub fn insert(&mut self, denom_a: &str, denom_b: &str, fee: FixedDec) {
        self.fees.insert(DenomPair::new(denom_a, denom_b), fee);
    }

    /// Canonicalizes the pair, then looks it up; absent pairs use the default.
    pub fn get_fee(&self, denom_a: &str, denom_b: &str) -> FixedDec {
        self.fees
            .get(&DenomPair::new(denom_a, denom_b))
            .copied()
            .unwrap_or(self.default_fee)
    }

    pub fn default_fee(&self) -> FixedDec {
        self.default_fee
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DenomPair, &FixedDec)> {
        self.fees.iter()
    }

    pub fn len(&self) -> usize {
        self.fees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_order_insensitive() {
        let mut table = TakerFeeTable::new(FixedDec::from_bps(10));
        table.insert("uosmo", "uion", FixedDec::from_bps(15));

        assert_eq!(table.get_fee("uosmo", "uion"), FixedDec::from_bps(15));
        assert_eq!(table.get_fee("uion", "uosmo"), FixedDec::from_bps(15));
    }

    #[test]
    fn missing_pair_falls_back_to_default() {
        let table = TakerFeeTable::new(FixedDec::from_bps(10));
        assert_eq!(table.get_fee("uosmo", "uatom"), FixedDec::from_bps(10));
    }
}
