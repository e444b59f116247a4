// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::math::{mul_div_down, FixedDec};
use crate::domain::coin::Coin;
use crate::domain::error::{PoolError, RouterError};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed amplification coefficient for the stableswap curve (A * n^(n-1), n = 2).
const STABLE_AMP: u64 = 100;
const STABLE_MAX_ITERATIONS: usize = 255;

/// Q96 fixed-point one, the sqrt-price scale of the concentrated curve.
const Q96: U256 = U256::from_limbs([0, 0x1_0000_0000u64, 0, 0]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    Balancer,
    Stableswap,
    Concentrated,
    Transmuter,
    ExternalGeneric,
}

/// Active-range state of a concentrated-liquidity pool, enough to quote
/// a swap that stays inside the range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickModel {
    /// Current sqrt price in X96 fixed point.
    pub current_sqrt_price: U256,
    /// In-range liquidity.
    pub liquidity: U256,
}

/// A liquidity venue over two or more denominations.
///
/// The record is an immutable snapshot: `take_amount_in` simulates and
/// never mutates balances. Traversal state (the current token-out denom)
/// lives on the route binding, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pool {
    id: u64,
    pool_type: PoolType,
    denoms: Vec<String>,
    balances: HashMap<String, U256>,
    spread_factor: FixedDec,
    tvl: U256,
    tick_model: Option<TickModel>,
}

impl Pool {
    pub fn new(
        id: u64,
        pool_type: PoolType,
        denoms: Vec<String>,
        balances: HashMap<String, U256>,
        spread_factor: FixedDec,
        tvl: U256,
        tick_model: Option<TickModel>,
    ) -> Result<Self, RouterError> {
        if denoms.len() < 2 {
            return Err(RouterError::InvalidInput(format!(
                "pool {id} must hold at least two denoms"
            )));
        }
        for denom in &denoms {
            if denom.is_empty() {
                return Err(RouterError::InvalidInput(format!("pool {id} has an empty denom")));
            }
            if !balances.contains_key(denom) {
                return Err(RouterError::InvalidInput(format!(
                    "pool {id} is missing a balance for {denom}"
                )));
            }
        }
        if spread_factor >= FixedDec::ONE {
            return Err(RouterError::InvalidInput(format!(
                "pool {id} spread factor {spread_factor} is not below one"
            )));
        }
        Ok(Pool {
            id,
            pool_type,
            denoms,
            balances,
            spread_factor,
            tvl,
            tick_model,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pool_type(&self) -> PoolType {
        self.pool_type
    }

    pub fn denoms(&self) -> &[String] {
        &self.denoms
    }

    pub fn has_denom(&self, denom: &str) -> bool {
        self.denoms.iter().any(|d| d == denom)
    }

    pub fn balance_of(&self, denom: &str) -> U256 {
        self.balances.get(denom).copied().unwrap_or(U256::ZERO)
    }

    pub fn balances(&self) -> &HashMap<String, U256> {
        &self.balances
    }

    pub fn spread_factor(&self) -> FixedDec {
        self.spread_factor
    }

    pub fn tvl(&self) -> U256 {
        self.tvl
    }

    pub fn tick_model(&self) -> Option<&TickModel> {
        self.tick_model.as_ref()
    }

    /// Simulates swapping `token_in` for `token_out_denom` against the
    /// snapshot, shaving the spread factor off the input before the curve.
    pub fn take_amount_in(&self, token_in: &Coin, token_out_denom: &str) -> Result<Coin, PoolError> {
        if !self.has_denom(&token_in.denom) {
            return Err(self.invalid_swap(format!("{} is not a pool denom", token_in.denom)));
        }
        if !self.has_denom(token_out_denom) {
            return Err(self.invalid_swap(format!("{token_out_denom} is not a pool denom")));
        }
        if token_in.denom == token_out_denom {
            return Err(self.invalid_swap("token in equals token out".to_string()));
        }
        if token_in.amount.is_zero() {
            return Err(self.invalid_swap("zero amount in".to_string()));
        }

        let effective_in = self
            .spread_factor
            .complement()
            .mul_down(token_in.amount)
            .ok_or_else(|| self.insufficient("amount in overflows"))?;
        if effective_in.is_zero() {
            return Err(self.insufficient("amount in vanishes under the spread factor"));
        }

        let amount_out = match self.pool_type {
            PoolType::Balancer | PoolType::ExternalGeneric => {
                self.constant_product_out(&token_in.denom, token_out_denom, effective_in)?
            }
            PoolType::Stableswap => {
                self.stableswap_out(&token_in.denom, token_out_denom, effective_in)?
            }
            PoolType::Concentrated => {
                self.concentrated_out(&token_in.denom, token_out_denom, effective_in)?
            }
            PoolType::Transmuter => effective_in,
        };

        let balance_out = self.balance_of(token_out_denom);
        if amount_out.is_zero() {
            return Err(self.insufficient("output collapses to zero"));
        }
        if amount_out > balance_out {
            return Err(self.insufficient(format!(
                "output {amount_out} exceeds pool balance {balance_out}"
            )));
        }
        Ok(Coin::new(token_out_denom, amount_out))
    }

    /// `out = B_out * a / (B_in + a)`.
    fn constant_product_out(
        &self,
        denom_in: &str,
        denom_out: &str,
        amount_in: U256,
    ) -> Result<U256, PoolError> {
        let balance_in = self.balance_of(denom_in);
        let balance_out = self.balance_of(denom_out);
        if balance_in.is_zero() || balance_out.is_zero() {
            return Err(self.insufficient("empty reserves"));
        }
        let denominator = balance_in
            .checked_add(amount_in)
            .ok_or_else(|| self.insufficient("reserve overflow"))?;
        mul_div_down(balance_out, amount_in, denominator)
            .ok_or_else(|| self.insufficient("reserve overflow"))
    }

    /// Two-coin StableSwap: Newton-solve the invariant D from the touched
    /// reserves, then the post-swap reserve y.
    fn stableswap_out(
        &self,
        denom_in: &str,
        denom_out: &str,
        amount_in: U256,
    ) -> Result<U256, PoolError> {
        let balance_in = self.balance_of(denom_in);
        let balance_out = self.balance_of(denom_out);
        if balance_in.is_zero() || balance_out.is_zero() {
            return Err(self.insufficient("empty reserves"));
        }

        let ann = U256::from(STABLE_AMP * 4);
        let d = self.stable_d(balance_in, balance_out, ann)?;

        let x = balance_in
            .checked_add(amount_in)
            .ok_or_else(|| self.insufficient("reserve overflow"))?;
        let y = self.stable_y(x, d, ann)?;

        // One unit shaved for rounding, mirroring the curve's floor behavior.
        let gross = balance_out
            .checked_sub(y)
            .and_then(|v| v.checked_sub(U256::from(1u64)));
        gross.ok_or_else(|| self.insufficient("stable invariant leaves no output"))
    }

    fn stable_d(&self, x0: U256, x1: U256, ann: U256) -> Result<U256, PoolError> {
        let s = x0
            .checked_add(x1)
            .ok_or_else(|| self.insufficient("reserve overflow"))?;
        let two = U256::from(2u64);
        let mut d = s;
        for _ in 0..STABLE_MAX_ITERATIONS {
            let mut d_p = d;
            d_p = mul_div_down(d_p, d, x0 * two).ok_or_else(|| self.insufficient("overflow"))?;
            d_p = mul_div_down(d_p, d, x1 * two).ok_or_else(|| self.insufficient("overflow"))?;

            let d_prev = d;
            let numerator = (ann * s)
                .checked_add(d_p * two)
                .ok_or_else(|| self.insufficient("overflow"))?;
            let denominator = (ann - U256::from(1u64)) * d + U256::from(3u64) * d_p;
            d = mul_div_down(numerator, d, denominator)
                .ok_or_else(|| self.insufficient("overflow"))?;

            if d.abs_diff(d_prev) <= U256::from(1u64) {
                return Ok(d);
            }
        }
        Err(self.insufficient("stable invariant did not converge"))
    }

    fn stable_y(&self, x: U256, d: U256, ann: U256) -> Result<U256, PoolError> {
        let two = U256::from(2u64);
        let mut c = mul_div_down(d, d, x * two).ok_or_else(|| self.insufficient("overflow"))?;
        c = mul_div_down(c, d, ann * two).ok_or_else(|| self.insufficient("overflow"))?;
        let b = x + d / ann;

        let mut y = d;
        for _ in 0..STABLE_MAX_ITERATIONS {
            let y_prev = y;
            let numerator = y
                .checked_mul(y)
                .and_then(|yy| yy.checked_add(c))
                .ok_or_else(|| self.insufficient("overflow"))?;
            let denominator = (two * y + b)
                .checked_sub(d)
                .ok_or_else(|| self.insufficient("stable solve underflow"))?;
            if denominator.is_zero() {
                return Err(self.insufficient("stable solve degenerate"));
            }
            y = numerator / denominator;
            if y.abs_diff(y_prev) <= U256::from(1u64) {
                return Ok(y);
            }
        }
        Err(self.insufficient("stable solve did not converge"))
    }

    /// Single-range quote against the tick model: move the sqrt price by
    /// the input and emit the matching delta of the opposite token.
    fn concentrated_out(
        &self,
        denom_in: &str,
        denom_out: &str,
        amount_in: U256,
    ) -> Result<U256, PoolError> {
        let tick_model = self
            .tick_model
            .as_ref()
            .ok_or_else(|| self.insufficient("no tick model"))?;
        let liquidity = tick_model.liquidity;
        let sqrt_price = tick_model.current_sqrt_price;
        if liquidity.is_zero() || sqrt_price.is_zero() {
            return Err(self.insufficient("no in-range liquidity"));
        }

        // token0 is the lexicographically smaller of the traded pair.
        let zero_for_one = denom_in < denom_out;
        if zero_for_one {
            let shift = mul_div_down(amount_in, sqrt_price, Q96)
                .ok_or_else(|| self.insufficient("overflow"))?;
            let denominator = liquidity
                .checked_add(shift)
                .ok_or_else(|| self.insufficient("overflow"))?;
            let next_sqrt_price = mul_div_down(liquidity, sqrt_price, denominator)
                .ok_or_else(|| self.insufficient("overflow"))?;
            mul_div_down(liquidity, sqrt_price - next_sqrt_price, Q96)
                .ok_or_else(|| self.insufficient("overflow"))
        } else {
            let shift = mul_div_down(amount_in, Q96, liquidity)
                .ok_or_else(|| self.insufficient("overflow"))?;
            let next_sqrt_price = sqrt_price
                .checked_add(shift)
                .ok_or_else(|| self.insufficient("overflow"))?;
            let partial = mul_div_down(liquidity, next_sqrt_price - sqrt_price, next_sqrt_price)
                .ok_or_else(|| self.insufficient("overflow"))?;
            mul_div_down(partial, Q96, sqrt_price).ok_or_else(|| self.insufficient("overflow"))
        }
    }

    fn invalid_swap(&self, reason: String) -> PoolError {
        PoolError::InvalidSwap {
            pool_id: self.id,
            reason,
        }
    }

    fn insufficient(&self, reason: impl Into<String>) -> PoolError {
        PoolError::InsufficientLiquidity {
            pool_id: self.id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balancer_pool(id: u64, reserve: u64, spread: FixedDec) -> Pool {
        let reserve = U256::from(reserve);
        Pool::new(
            id,
            PoolType::Balancer,
            vec!["uion".into(), "uosmo".into()],
            HashMap::from([("uion".into(), reserve), ("uosmo".into(), reserve)]),
            spread,
            U256::from(1_000_000u64),
            None,
        )
        .unwrap()
    }

    #[test]
    fn constant_product_matches_closed_form() {
        let pool = balancer_pool(1, 1_000_000_000, FixedDec::ZERO);
        let coin_in = Coin::new("uosmo", U256::from(1_000_000u64));
        let out = pool.take_amount_in(&coin_in, "uion").unwrap();
        // 1e9 * 1e6 / (1e9 + 1e6)
        assert_eq!(out.amount, U256::from(999_000u64));
        assert_eq!(out.denom, "uion");
    }

    #[test]
    fn spread_factor_shaves_input_before_curve() {
        let no_fee = balancer_pool(1, 1_000_000_000, FixedDec::ZERO);
        let with_fee = balancer_pool(2, 1_000_000_000, FixedDec::from_ratio(3, 1000));
        let coin_in = Coin::new("uosmo", U256::from(1_000_000u64));
        let free = no_fee.take_amount_in(&coin_in, "uion").unwrap();
        let taxed = with_fee.take_amount_in(&coin_in, "uion").unwrap();
        assert!(taxed.amount < free.amount);
    }

    #[test]
    fn rejects_foreign_denom_same_denom_and_zero_amount() {
        let pool = balancer_pool(1, 1_000, FixedDec::ZERO);
        let invalid = |coin: Coin, out: &str| {
            matches!(
                pool.take_amount_in(&coin, out),
                Err(PoolError::InvalidSwap { .. })
            )
        };
        assert!(invalid(Coin::new("uatom", U256::from(10u64)), "uion"));
        assert!(invalid(Coin::new("uosmo", U256::from(10u64)), "uosmo"));
        assert!(invalid(Coin::new("uosmo", U256::ZERO), "uion"));
    }

    #[test]
    fn stableswap_beats_constant_product_near_balance() {
        let reserve = 1_000_000_000_000_000_000u64;
        let amount = U256::from(1_000_000_000_000u64);
        let stable = Pool::new(
            1,
            PoolType::Stableswap,
            vec!["uusdc".into(), "uusdt".into()],
            HashMap::from([
                ("uusdc".into(), U256::from(reserve)),
                ("uusdt".into(), U256::from(reserve)),
            ]),
            FixedDec::ZERO,
            U256::from(1u64),
            None,
        )
        .unwrap();
        let out = stable
            .take_amount_in(&Coin::new("uusdc", amount), "uusdt")
            .unwrap();

        let cp_out = U256::from(reserve) * amount / (U256::from(reserve) + amount);
        assert!(out.amount > cp_out);
        assert!(out.amount <= amount);
    }

    #[test]
    fn concentrated_quotes_inside_the_range() {
        let reserve = U256::from(1_000_000_000_000_000_000u64);
        let pool = Pool::new(
            7,
            PoolType::Concentrated,
            vec!["uion".into(), "uosmo".into()],
            HashMap::from([("uion".into(), reserve), ("uosmo".into(), reserve)]),
            FixedDec::ZERO,
            U256::from(1u64),
            Some(TickModel {
                current_sqrt_price: Q96,
                liquidity: U256::from(1_000_000_000_000_000_000u64),
            }),
        )
        .unwrap();
        let amount = U256::from(1_000_000_000_000u64);
        let out = pool
            .take_amount_in(&Coin::new("uion", amount), "uosmo")
            .unwrap();
        assert!(out.amount <= amount);
        assert!(out.amount > amount - amount / U256::from(1_000u64));
    }

    #[test]
    fn concentrated_without_tick_model_is_illiquid() {
        let reserve = U256::from(1_000u64);
        let pool = Pool::new(
            7,
            PoolType::Concentrated,
            vec!["uion".into(), "uosmo".into()],
            HashMap::from([("uion".into(), reserve), ("uosmo".into(), reserve)]),
            FixedDec::ZERO,
            U256::from(1u64),
            None,
        )
        .unwrap();
        let result = pool.take_amount_in(&Coin::new("uion", U256::from(10u64)), "uosmo");
        assert!(matches!(
            result,
            Err(PoolError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn transmuter_passes_through_until_reserves_run_out() {
        let pool = Pool::new(
            3,
            PoolType::Transmuter,
            vec!["uusdc.axl".into(), "uusdc".into()],
            HashMap::from([
                ("uusdc.axl".into(), U256::from(0u64)),
                ("uusdc".into(), U256::from(500u64)),
            ]),
            FixedDec::ZERO,
            U256::from(1u64),
            None,
        )
        .unwrap();
        let ok = pool
            .take_amount_in(&Coin::new("uusdc.axl", U256::from(500u64)), "uusdc")
            .unwrap();
        assert_eq!(ok.amount, U256::from(500u64));

        let too_much = pool.take_amount_in(&Coin::new("uusdc.axl", U256::from(501u64)), "uusdc");
        assert!(matches!(
            too_much,
            Err(PoolError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn pool_construction_validates_denoms_and_balances() {
        assert!(Pool::new(
            1,
            PoolType::Balancer,
            vec!["uosmo".into()],
            HashMap::from([("uosmo".into(), U256::from(1u64))]),
            FixedDec::ZERO,
            U256::ZERO,
            None,
        )
        .is_err());

        assert!(Pool::new(
            1,
            PoolType::Balancer,
            vec!["uosmo".into(), "uion".into()],
            HashMap::from([("uosmo".into(), U256::from(1u64))]),
            FixedDec::ZERO,
            U256::ZERO,
            None,
        )
        .is_err());
    }
}
