// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::coin::Coin;
use crate::domain::error::{PoolError, RouterError};
use crate::domain::pool::Pool;
use crate::domain::route::{CandidateRoutes, Quote, RoutablePool, Route, RoutePlan};
use crate::domain::taker_fee::TakerFeeTable;
use alloy::primitives::U256;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A route annotated with its simulated output.
#[derive(Clone, Debug)]
pub struct RankedRoute {
    pub route: Route,
    pub amount_out: U256,
}

/// Re-binds plain candidate routes against a live pool snapshot.
///
/// Cached candidates can be stale: routes referencing pools that left the
/// snapshot, or whose hops no longer line up with the requested direction,
/// are dropped here rather than surfacing an error.
pub fn routes_from_candidates(
    candidates: &CandidateRoutes,
    pools_by_id: &HashMap<u64, Arc<Pool>>,
    taker_fees: &TakerFeeTable,
    token_in_denom: &str,
    token_out_denom: &str,
) -> Vec<Route> {
    let mut routes = Vec::with_capacity(candidates.routes.len());

    'candidate: for candidate in &candidates.routes {
        let Some(last) = candidate.pools.last() else {
            continue;
        };
        if last.token_out_denom != token_out_denom {
            tracing::debug!(route = ?candidate, "dropping candidate: direction mismatch");
            continue;
        }

        let mut bound = Vec::with_capacity(candidate.pools.len());
        let mut current_denom = token_in_denom;
        for hop in &candidate.pools {
            let Some(pool) = pools_by_id.get(&hop.pool_id) else {
                tracing::debug!(pool_id = hop.pool_id, "dropping candidate: pool left snapshot");
                continue 'candidate;
            };
            if !pool.has_denom(current_denom) || !pool.has_denom(&hop.token_out_denom) {
                tracing::debug!(pool_id = hop.pool_id, "dropping candidate: denoms shifted");
                continue 'candidate;
            }
            let taker_fee = taker_fees.get_fee(current_denom, &hop.token_out_denom);
            bound.push(RoutablePool::new(
                pool.clone(),
                hop.token_out_denom.clone(),
                taker_fee,
            ));
            current_denom = &hop.token_out_denom;
        }

        if let Some(route) = Route::try_new(bound) {
            routes.push(route);
        }
    }

    routes
}

/// Runs the input through every hop: taker fee off the input first, then
/// the pool curve (which applies its own spread factor).
pub fn simulate_route(route: &Route, token_in: &Coin) -> Result<U256, PoolError> {
    let mut coin = token_in.clone();
    for hop in &route.pools {
        let after_fee = hop
            .taker_fee()
            .complement()
            .mul_down(coin.amount)
            .ok_or_else(|| PoolError::InsufficientLiquidity {
                pool_id: hop.id(),
                reason: "taker fee application overflows".to_string(),
            })?;
        let hop_in = Coin::new(coin.denom.clone(), after_fee);
        coin = hop.pool().take_amount_in(&hop_in, hop.token_out_denom())?;
    }
    Ok(coin.amount)
}

/// Simulates every route and ranks the survivors by amount out
/// (descending), breaking ties by fewer hops, then by smaller first pool
/// id. Per-route pricing failures are swallowed; all routes failing is
/// `NoRankedRoutes`.
pub fn estimate_and_rank(
    routes: Vec<Route>,
    token_in: &Coin,
) -> Result<(Quote, Vec<RankedRoute>), RouterError> {
    let mut ranked = Vec::with_capacity(routes.len());
    for route in routes {
        match simulate_route(&route, token_in) {
            Ok(amount_out) => ranked.push(RankedRoute { route, amount_out }),
            Err(e) => {
                tracing::debug!(route = %route, error = %e, "route dropped during estimation");
            }
        }
    }

    if ranked.is_empty() {
        return Err(RouterError::NoRankedRoutes);
    }

    ranked.sort_by(|a, b| {
        b.amount_out
            .cmp(&a.amount_out)
            .then(a.route.len().cmp(&b.route.len()))
            .then(a.route.first_pool_id().cmp(&b.route.first_pool_id()))
    });

    let top = &ranked[0];
    let quote = single_route_quote(top, token_in);
    Ok((quote, ranked))
}

pub fn single_route_quote(ranked: &RankedRoute, token_in: &Coin) -> Quote {
    Quote {
        amount_in: token_in.clone(),
        amount_out: ranked.amount_out,
        routes: vec![RoutePlan::from_route(
            &ranked.route,
            token_in.amount,
            ranked.amount_out,
        )],
        route_proportions: Vec::new(),
    }
}

/// Drops any route sharing a pool id with a previously accepted route.
///
/// CONTRACT: input is sorted by decreasing amount out. A rejected route
/// does not reserve its pool ids, so later routes can still claim them.
/// Duplicate pool ids within a single route have no effect here.
pub fn filter_duplicate_pool_id_routes(ranked: Vec<RankedRoute>) -> Vec<RankedRoute> {
    let mut accepted_pool_ids: HashSet<u64> = HashSet::new();
    let mut filtered = Vec::with_capacity(ranked.len());

    for route in ranked {
        let route_pool_ids: HashSet<u64> = route.route.pool_ids().collect();
        if route_pool_ids
            .iter()
            .any(|id| accepted_pool_ids.contains(id))
        {
            continue;
        }
        accepted_pool_ids.extend(route_pool_ids);
        filtered.push(route);
    }
    filtered
}
