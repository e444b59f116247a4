// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::coin::Coin;
use crate::domain::error::RouterError;
use crate::domain::route::{Quote, RoutePlan, RouteProportion};
use crate::services::router::estimate::{simulate_route, RankedRoute};
use alloy::primitives::U256;

/// Discrete allocation of the input across ranked, pool-disjoint routes.
///
/// The input is cut into `max_split_iterations` equal parts and every
/// composition of those parts over the routes is simulated; the best
/// total wins. Returns `None` when splitting is disabled or there is
/// nothing to split across.
pub fn get_split_quote(
    ranked: &[RankedRoute],
    token_in: &Coin,
    max_split_iterations: u32,
) -> Result<Option<Quote>, RouterError> {
    if ranked.len() < 2 || max_split_iterations == 0 {
        return Ok(None);
    }
    let iterations = max_split_iterations;

    // Each route's output only depends on its own allocation, so simulate
    // once per (route, parts) and sum lookups while enumerating.
    let outs_per_allocation: Vec<Vec<U256>> = ranked
        .iter()
        .map(|route| {
            (0..=iterations)
                .map(|parts| {
                    let allocated = allocate(token_in.amount, parts, iterations);
                    if allocated.is_zero() {
                        return U256::ZERO;
                    }
                    let portion = Coin::new(token_in.denom.clone(), allocated);
                    simulate_route(&route.route, &portion).unwrap_or(U256::ZERO)
                })
                .collect()
        })
        .collect();

    let mut best_total = U256::ZERO;
    let mut best_parts: Vec<u32> = Vec::new();
    let mut current = vec![0u32; ranked.len()];
    enumerate_compositions(
        &outs_per_allocation,
        iterations,
        0,
        U256::ZERO,
        &mut current,
        &mut best_total,
        &mut best_parts,
    );

    if best_total.is_zero() {
        return Ok(None);
    }

    let mut routes = Vec::new();
    let mut proportions = Vec::new();
    let mut amount_out = U256::ZERO;
    for (index, parts) in best_parts.iter().copied().enumerate() {
        let out = outs_per_allocation[index][parts as usize];
        // Allocations that underflow to zero contribute nothing and are
        // dropped from the quote.
        if parts == 0 || out.is_zero() {
            continue;
        }
        let allocated = allocate(token_in.amount, parts, iterations);
        routes.push(RoutePlan::from_route(&ranked[index].route, allocated, out));
        proportions.push(RouteProportion {
            parts,
            total: iterations,
        });
        amount_out += out;
    }

    Ok(Some(Quote {
        amount_in: token_in.clone(),
        amount_out,
        routes,
        route_proportions: proportions,
    }))
}

fn allocate(amount: U256, parts: u32, total: u32) -> U256 {
    amount * U256::from(parts) / U256::from(total)
}

#[allow(clippy::too_many_arguments)]
fn enumerate_compositions(
    outs: &[Vec<U256>],
    remaining: u32,
    index: usize,
    total_so_far: U256,
    current: &mut Vec<u32>,
    best_total: &mut U256,
    best_parts: &mut Vec<u32>,
) {
    if index == outs.len() - 1 {
        current[index] = remaining;
        let total = total_so_far + outs[index][remaining as usize];
        // First composition found wins ties.
        if total > *best_total {
            *best_total = total;
            *best_parts = current.clone();
        }
        return;
    }
    for parts in 0..=remaining {
        current[index] = parts;
        enumerate_compositions(
            outs,
            remaining - parts,
            index + 1,
            total_so_far + outs[index][parts as usize],
            current,
            best_total,
            best_parts,
        );
    }
}
