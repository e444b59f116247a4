// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::pool::Pool;
use crate::domain::route::{CandidatePool, CandidateRoute, CandidateRoutes};
use alloy::primitives::U256;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub struct SearchBounds {
    pub max_pools_per_route: usize,
    pub max_routes: usize,
    pub min_liquidity: U256,
}

/// Orders the snapshot for expansion: preferred pool ids first, in their
/// configured order, then the rest by TVL descending (id ascending on ties).
pub fn sort_pools(pools: &[Arc<Pool>], preferred_pool_ids: &[u64]) -> Vec<Arc<Pool>> {
    let preferred: Vec<Arc<Pool>> = preferred_pool_ids
        .iter()
        .filter_map(|id| pools.iter().find(|pool| pool.id() == *id).cloned())
        .collect();

    let mut rest: Vec<Arc<Pool>> = pools
        .iter()
        .filter(|pool| !preferred_pool_ids.contains(&pool.id()))
        .cloned()
        .collect();
    rest.sort_by(|a, b| b.tvl().cmp(&a.tvl()).then(a.id().cmp(&b.id())));

    preferred.into_iter().chain(rest).collect()
}

/// Depth-first enumeration of loop-free routes from `token_in_denom` to
/// `token_out_denom` over the sorted pool set, under the configured bounds.
pub fn find_candidate_routes(
    sorted_pools: &[Arc<Pool>],
    token_in_denom: &str,
    token_out_denom: &str,
    bounds: SearchBounds,
) -> CandidateRoutes {
    let liquid: Vec<&Arc<Pool>> = sorted_pools
        .iter()
        .filter(|pool| pool.tvl() >= bounds.min_liquidity)
        .collect();

    let mut search = Search {
        pools: &liquid,
        token_out_denom,
        bounds,
        path: Vec::new(),
        used_pool_ids: BTreeSet::new(),
        seen: HashSet::new(),
        routes: Vec::new(),
    };
    search.expand(token_in_denom);

    CandidateRoutes::from_routes(search.routes)
}

struct Search<'a> {
    pools: &'a [&'a Arc<Pool>],
    token_out_denom: &'a str,
    bounds: SearchBounds,
    path: Vec<CandidatePool>,
    used_pool_ids: BTreeSet<u64>,
    seen: HashSet<Vec<CandidatePool>>,
    routes: Vec<CandidateRoute>,
}

impl Search<'_> {
    /// Returns true once the route budget is exhausted.
    fn expand(&mut self, current_denom: &str) -> bool {
        let pools = self.pools;
        for pool in pools {
            if self.used_pool_ids.contains(&pool.id()) || !pool.has_denom(current_denom) {
                continue;
            }
            for out_denom in pool.denoms().to_vec() {
                if out_denom == current_denom {
                    continue;
                }

                self.path.push(CandidatePool {
                    pool_id: pool.id(),
                    token_out_denom: out_denom.clone(),
                });

                let full = if out_denom == self.token_out_denom {
                    self.emit()
                } else if self.path.len() < self.bounds.max_pools_per_route {
                    self.used_pool_ids.insert(pool.id());
                    let full = self.expand(&out_denom);
                    self.used_pool_ids.remove(&pool.id());
                    full
                } else {
                    false
                };

                self.path.pop();
                if full {
                    return true;
                }
            }
        }
        false
    }

    fn emit(&mut self) -> bool {
        if self.seen.insert(self.path.clone()) {
            self.routes.push(CandidateRoute {
                pools: self.path.clone(),
            });
        }
        self.routes.len() >= self.bounds.max_routes
    }
}
