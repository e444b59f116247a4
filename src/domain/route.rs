// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::math::FixedDec;
use crate::domain::coin::Coin;
use crate::domain::pool::Pool;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Directed use of a pool inside a route: the pool id plus the denom the
/// hop leaves with. Plain data so cached routes survive pool-state churn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidatePool {
    pub pool_id: u64,
    pub token_out_denom: String,
}

/// Ordered hops from token in to token out, by pool id only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRoute {
    pub pools: Vec<CandidatePool>,
}

impl CandidateRoute {
    pub fn pool_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.pools.iter().map(|p| p.pool_id)
    }
}

/// The enumeration result for a denom pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRoutes {
    pub routes: Vec<CandidateRoute>,
    pub unique_pool_ids: BTreeSet<u64>,
}

impl CandidateRoutes {
    pub fn from_routes(routes: Vec<CandidateRoute>) -> Self {
        let unique_pool_ids = routes
            .iter()
            .flat_map(|route| route.pool_ids())
            .collect();
        CandidateRoutes {
            routes,
            unique_pool_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

/// A candidate pool bound to its snapshot record and the taker fee that
/// applies to the hop. Carries the mutable current token-out denom so the
/// pool record itself stays shareable across routes.
#[derive(Clone, Debug)]
pub struct RoutablePool {
    pool: Arc<Pool>,
    token_out_denom: String,
    taker_fee: FixedDec,
}

impl RoutablePool {
    pub fn new(pool: Arc<Pool>, token_out_denom: impl Into<String>, taker_fee: FixedDec) -> Self {
        RoutablePool {
            pool,
            token_out_denom: token_out_denom.into(),
            taker_fee,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn id(&self) -> u64 {
        self.pool.id()
    }

    pub fn token_out_denom(&self) -> &str {
        &self.token_out_denom
    }

    pub fn set_token_out_denom(&mut self, denom: impl Into<String>) {
        self.token_out_denom = denom.into();
    }

    pub fn taker_fee(&self) -> FixedDec {
        self.taker_fee
    }
}

/// An evaluable sequence of bound pools.
#[derive(Clone, Debug, Default)]
pub struct Route {
    pub pools: Vec<RoutablePool>,
}

impl Route {
    /// Builds a route if hops are non-empty and denom continuity holds:
    /// each downstream pool must accept the upstream hop's token out.
    pub fn try_new(pools: Vec<RoutablePool>) -> Option<Self> {
        if pools.is_empty() || !Self::is_continuous(&pools) {
            return None;
        }
        Some(Route { pools })
    }

    pub fn is_continuous(pools: &[RoutablePool]) -> bool {
        pools
            .windows(2)
            .all(|pair| pair[1].pool().has_denom(pair[0].token_out_denom()))
    }

    pub fn pool_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.pools.iter().map(|p| p.id())
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn first_pool_id(&self) -> u64 {
        self.pools.first().map(|p| p.id()).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hops: Vec<String> = self
            .pools
            .iter()
            .map(|p| format!("{}:{}", p.id(), p.token_out_denom()))
            .collect();
        write!(f, "[{}]", hops.join(" -> "))
    }
}

/// One executed (simulated) route inside a quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub pools: Vec<CandidatePool>,
    pub in_amount: U256,
    pub out_amount: U256,
}

impl RoutePlan {
    pub fn from_route(route: &Route, in_amount: U256, out_amount: U256) -> Self {
        RoutePlan {
            pools: route
                .pools
                .iter()
                .map(|p| CandidatePool {
                    pool_id: p.id(),
                    token_out_denom: p.token_out_denom().to_string(),
                })
                .collect(),
            in_amount,
            out_amount,
        }
    }
}

/// Share of the split discretization allocated to a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteProportion {
    pub parts: u32,
    pub total: u32,
}

/// The planner's answer: simulated output against a frozen pool snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub amount_in: Coin,
    pub amount_out: U256,
    pub routes: Vec<RoutePlan>,
    /// Per-route split shares; empty when the quote is unsplit.
    pub route_proportions: Vec<RouteProportion>,
}
