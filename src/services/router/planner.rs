// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::cache::TtlCache;
use crate::common::math::order_of_magnitude;
use crate::common::metrics::{CacheMetrics, CANDIDATE_ROUTE_CACHE, RANKED_ROUTE_CACHE};
use crate::domain::coin::{Coin, DenomPair};
use crate::domain::error::RouterError;
use crate::domain::pool::{Pool, PoolType};
use crate::domain::route::{CandidatePool, CandidateRoute, CandidateRoutes, Quote};
use crate::domain::taker_fee::TakerFeeForPair;
use crate::services::repository::{PoolRepository, RouteRepository};
use crate::services::router::estimate::{
    estimate_and_rank, filter_duplicate_pool_id_routes, routes_from_candidates, single_route_quote,
    RankedRoute,
};
use crate::services::router::search::{find_candidate_routes, sort_pools, SearchBounds};
use crate::services::router::split::get_split_quote;
use crate::services::router::state_files;
use alloy::primitives::U256;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const RANKED_ROUTE_TTL: Duration = Duration::from_secs(5 * 60);

const OP_OPTIMAL_QUOTE: &str = "optimal_quote";
const OP_BEST_SINGLE: &str = "best_single_route_quote";
const OP_CUSTOM_QUOTE: &str = "custom_quote";
const OP_CANDIDATE_ROUTES: &str = "candidate_routes";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RouterConfig {
    /// Hop bound per route.
    pub max_pools_per_route: usize,
    /// Enumeration cap.
    pub max_routes: usize,
    /// Number of disjoint routes eligible for splitting; 0 disables splits.
    pub max_split_routes: usize,
    /// Split granularity: the input is cut into this many equal parts.
    pub max_split_iterations: u32,
    /// Pools below this TVL are excluded from search.
    pub min_liquidity: u64,
    /// Pool ids promoted to the front of the search order.
    pub preferred_pool_ids: Vec<u64>,
    pub route_cache_enabled: bool,
    /// Reserved for the external cache refresher cadence.
    pub route_update_height_interval: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            max_pools_per_route: 4,
            max_routes: 4,
            max_split_routes: 3,
            max_split_iterations: 10,
            min_liquidity: 0,
            preferred_pool_ids: Vec::new(),
            route_cache_enabled: true,
            route_update_height_interval: 0,
        }
    }
}

/// The quote planner: candidate enumeration, quote estimation, split
/// optimization, and the two cache tiers in front of them.
///
/// Every operation captures its own pool and taker-fee snapshot at entry;
/// nothing is shared across requests except the caches and metrics.
pub struct RoutePlanner {
    config: RouterConfig,
    request_timeout: Duration,
    pool_repository: Arc<dyn PoolRepository>,
    route_repository: Arc<dyn RouteRepository>,
    ranked_route_cache: TtlCache,
    metrics: Arc<CacheMetrics>,
}

impl RoutePlanner {
    pub fn new(
        config: RouterConfig,
        request_timeout: Duration,
        pool_repository: Arc<dyn PoolRepository>,
        route_repository: Arc<dyn RouteRepository>,
        metrics: Arc<CacheMetrics>,
    ) -> Result<Self, RouterError> {
        if config.max_pools_per_route == 0 {
            return Err(RouterError::Config("max_pools_per_route must be positive".into()));
        }
        if config.max_routes == 0 {
            return Err(RouterError::Config("max_routes must be positive".into()));
        }
        Ok(RoutePlanner {
            config,
            request_timeout,
            pool_repository,
            route_repository,
            ranked_route_cache: TtlCache::new(),
            metrics,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn ranked_route_cache(&self) -> &TtlCache {
        &self.ranked_route_cache
    }

    /// Best quote for swapping `token_in` into `token_out_denom`, split
    /// across routes when that beats the top single route.
    pub async fn get_optimal_quote(
        &self,
        token_in: &Coin,
        token_out_denom: &str,
    ) -> Result<Quote, RouterError> {
        validate_quote_input(token_in, token_out_denom)?;

        let magnitude = order_of_magnitude(token_in.amount);
        let cache_key = ranked_route_cache_key(&token_in.denom, token_out_denom, magnitude);

        let pools = self.bounded(self.pool_repository.get_all_pools()).await?;
        let pools_by_id = pools_by_id(&pools);
        let taker_fees = self
            .bounded(self.route_repository.get_all_taker_fees())
            .await?;

        let (top_quote, ranked) = match self.ranked_route_cache.get(&cache_key) {
            Some(cached) => {
                self.metrics.record_hit(
                    OP_OPTIMAL_QUOTE,
                    RANKED_ROUTE_CACHE,
                    &token_in.denom,
                    token_out_denom,
                );
                let candidates = cached
                    .downcast::<CandidateRoutes>()
                    .map_err(|_| RouterError::Cache("unexpected ranked route cache value".into()))?;
                // Pool state may have shifted since the write; re-bind and
                // re-rank against the live snapshot.
                let routes = routes_from_candidates(
                    candidates.as_ref(),
                    &pools_by_id,
                    &taker_fees,
                    &token_in.denom,
                    token_out_denom,
                );
                estimate_and_rank(routes, token_in)?
            }
            None => {
                self.metrics.record_miss(
                    OP_OPTIMAL_QUOTE,
                    RANKED_ROUTE_CACHE,
                    &token_in.denom,
                    token_out_denom,
                );
                let candidates = self
                    .handle_candidate_routes(
                        OP_OPTIMAL_QUOTE,
                        &pools,
                        &token_in.denom,
                        token_out_denom,
                    )
                    .await?;
                let routes = routes_from_candidates(
                    &candidates,
                    &pools_by_id,
                    &taker_fees,
                    &token_in.denom,
                    token_out_denom,
                );
                let (_, ranked) = estimate_and_rank(routes, token_in)?;

                let keep = match self.config.max_split_routes {
                    0 => 1,
                    k => k,
                };
                let disjoint: Vec<RankedRoute> = filter_duplicate_pool_id_routes(ranked)
                    .into_iter()
                    .take(keep)
                    .collect();

                if !disjoint.is_empty() {
                    self.ranked_route_cache.set(
                        cache_key,
                        convert_ranked_to_candidate_routes(&disjoint),
                        RANKED_ROUTE_TTL,
                    );
                }
                let top = single_route_quote(&disjoint[0], token_in);
                (top, disjoint)
            }
        };

        let final_quote = if ranked.len() > 1 {
            match get_split_quote(&ranked, token_in, self.config.max_split_iterations)? {
                Some(split) if split.amount_out > top_quote.amount_out => {
                    tracing::debug!(
                        route_count = split.routes.len(),
                        "split route beats top single route"
                    );
                    split
                }
                _ => top_quote,
            }
        } else {
            top_quote
        };

        if final_quote.amount_out.is_zero() {
            return Err(RouterError::ZeroOutput);
        }
        Ok(final_quote)
    }

    /// Best quote executed over exactly one route, without splitting.
    pub async fn get_best_single_route_quote(
        &self,
        token_in: &Coin,
        token_out_denom: &str,
    ) -> Result<Quote, RouterError> {
        validate_quote_input(token_in, token_out_denom)?;

        let pools = self.bounded(self.pool_repository.get_all_pools()).await?;
        let candidates = self
            .handle_candidate_routes(OP_BEST_SINGLE, &pools, &token_in.denom, token_out_denom)
            .await?;
        let taker_fees = self
            .bounded(self.route_repository.get_all_taker_fees())
            .await?;
        let routes = routes_from_candidates(
            &candidates,
            &pools_by_id(&pools),
            &taker_fees,
            &token_in.denom,
            token_out_denom,
        );
        let (quote, _) = estimate_and_rank(routes, token_in)?;
        Ok(quote)
    }

    /// Quote restricted to the route whose ordered pool-id sequence equals
    /// `pool_ids`.
    pub async fn get_custom_quote(
        &self,
        token_in: &Coin,
        token_out_denom: &str,
        pool_ids: &[u64],
    ) -> Result<Quote, RouterError> {
        validate_quote_input(token_in, token_out_denom)?;

        let pools = self.bounded(self.pool_repository.get_all_pools()).await?;
        let candidates = self
            .handle_candidate_routes(OP_CUSTOM_QUOTE, &pools, &token_in.denom, token_out_denom)
            .await?;
        let taker_fees = self
            .bounded(self.route_repository.get_all_taker_fees())
            .await?;
        let routes = routes_from_candidates(
            &candidates,
            &pools_by_id(&pools),
            &taker_fees,
            &token_in.denom,
            token_out_denom,
        );

        let matching = routes.into_iter().find(|route| {
            route.len() == pool_ids.len()
                && route.pool_ids().zip(pool_ids.iter().copied()).all(|(a, b)| a == b)
        });
        let Some(route) = matching else {
            return Err(RouterError::NoMatchingRoute(pool_ids.to_vec()));
        };

        let (quote, _) = estimate_and_rank(vec![route], token_in)?;
        Ok(quote)
    }

    /// Candidate routes for the pair, from cache or recomputed.
    pub async fn get_candidate_routes(
        &self,
        token_in_denom: &str,
        token_out_denom: &str,
    ) -> Result<CandidateRoutes, RouterError> {
        validate_denoms(token_in_denom, token_out_denom)?;
        let pools = self.bounded(self.pool_repository.get_all_pools()).await?;
        self.handle_candidate_routes(OP_CANDIDATE_ROUTES, &pools, token_in_denom, token_out_denom)
            .await
    }

    /// Cached candidate routes only; never recomputes.
    pub async fn get_cached_candidate_routes(
        &self,
        token_in_denom: &str,
        token_out_denom: &str,
    ) -> Result<CandidateRoutes, RouterError> {
        if !self.config.route_cache_enabled {
            return Err(RouterError::CacheDisabled);
        }
        self.bounded(
            self.route_repository
                .get_routes(token_in_denom, token_out_denom),
        )
        .await
    }

    /// Taker fees for every ordered unique denom pair of the pool.
    pub async fn get_taker_fee(&self, pool_id: u64) -> Result<Vec<TakerFeeForPair>, RouterError> {
        let taker_fees = self
            .bounded(self.route_repository.get_all_taker_fees())
            .await?;
        let pool = self.bounded(self.pool_repository.get_pool(pool_id)).await?;

        let denoms = pool.denoms();
        let mut result = Vec::new();
        for i in 0..denoms.len() {
            for j in i + 1..denoms.len() {
                let pair = DenomPair::new(denoms[i].clone(), denoms[j].clone());
                let taker_fee = taker_fees.get_fee(&pair.denom0, &pair.denom1);
                result.push(TakerFeeForPair {
                    denom0: pair.denom0,
                    denom1: pair.denom1,
                    taker_fee,
                });
            }
        }
        Ok(result)
    }

    /// Snapshots pools (with tick models) and taker fees to
    /// `pools.json` and `taker_fees.json` under `dir`.
    pub async fn store_router_state_files(&self, dir: &Path) -> Result<(), RouterError> {
        let pools = self.bounded(self.pool_repository.get_all_pools()).await?;

        let concentrated_ids: Vec<u64> = pools
            .iter()
            .filter(|pool| pool.pool_type() == PoolType::Concentrated)
            .map(|pool| pool.id())
            .collect();
        let tick_models = self
            .bounded(self.pool_repository.get_tick_model_map(&concentrated_ids))
            .await?;
        state_files::store_pools(&dir.join("pools.json"), &pools, &tick_models)?;

        let taker_fees = self
            .bounded(self.route_repository.get_all_taker_fees())
            .await?;
        state_files::store_taker_fees(&dir.join("taker_fees.json"), &taker_fees)?;
        Ok(())
    }

    /// Reads the candidate-route cache when enabled; recomputes from the
    /// snapshot on a miss and persists a non-empty result.
    async fn handle_candidate_routes(
        &self,
        operation: &str,
        pools: &[Arc<Pool>],
        token_in_denom: &str,
        token_out_denom: &str,
    ) -> Result<CandidateRoutes, RouterError> {
        let mut candidates = CandidateRoutes::default();
        if self.config.route_cache_enabled {
            candidates = self
                .bounded(
                    self.route_repository
                        .get_routes(token_in_denom, token_out_denom),
                )
                .await?;
        }

        if !candidates.is_empty() {
            self.metrics.record_hit(
                operation,
                CANDIDATE_ROUTE_CACHE,
                token_in_denom,
                token_out_denom,
            );
            return Ok(candidates);
        }
        self.metrics.record_miss(
            operation,
            CANDIDATE_ROUTE_CACHE,
            token_in_denom,
            token_out_denom,
        );

        let sorted = sort_pools(pools, &self.config.preferred_pool_ids);
        candidates = find_candidate_routes(
            &sorted,
            token_in_denom,
            token_out_denom,
            SearchBounds {
                max_pools_per_route: self.config.max_pools_per_route,
                max_routes: self.config.max_routes,
                min_liquidity: U256::from(self.config.min_liquidity),
            },
        );
        tracing::info!(
            token_in = token_in_denom,
            token_out = token_out_denom,
            num_routes = candidates.len(),
            "calculated candidate routes"
        );

        if !candidates.is_empty() && self.config.route_cache_enabled {
            self.bounded(self.route_repository.set_routes(
                token_in_denom,
                token_out_denom,
                candidates.clone(),
            ))
            .await?;
        }
        Ok(candidates)
    }

    /// Caps a repository call at the request deadline; elapsed surfaces
    /// as `Cancelled`.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, RouterError>>,
    ) -> Result<T, RouterError> {
        tokio::time::timeout(self.request_timeout, operation).await?
    }
}

fn pools_by_id(pools: &[Arc<Pool>]) -> HashMap<u64, Arc<Pool>> {
    pools.iter().map(|pool| (pool.id(), pool.clone())).collect()
}

fn ranked_route_cache_key(token_in_denom: &str, token_out_denom: &str, magnitude: u32) -> String {
    format!("{token_in_denom}/{token_out_denom}/{magnitude}")
}

fn validate_denoms(token_in_denom: &str, token_out_denom: &str) -> Result<(), RouterError> {
    if token_in_denom.is_empty() || token_out_denom.is_empty() {
        return Err(RouterError::InvalidInput("empty denom".into()));
    }
    if token_in_denom == token_out_denom {
        return Err(RouterError::InvalidInput(format!(
            "token in and token out are both {token_in_denom}"
        )));
    }
    Ok(())
}

fn validate_quote_input(token_in: &Coin, token_out_denom: &str) -> Result<(), RouterError> {
    validate_denoms(&token_in.denom, token_out_denom)?;
    if token_in.amount.is_zero() {
        return Err(RouterError::InvalidInput("zero amount in".into()));
    }
    Ok(())
}

/// Sheds all bound state from ranked routes, leaving the plain data kept
/// in caches.
pub fn convert_ranked_to_candidate_routes(ranked: &[RankedRoute]) -> CandidateRoutes {
    CandidateRoutes::from_routes(
        ranked
            .iter()
            .map(|r| CandidateRoute {
                pools: r
                    .route
                    .pools
                    .iter()
                    .map(|hop| CandidatePool {
                        pool_id: hop.id(),
                        token_out_denom: hop.token_out_denom().to_string(),
                    })
                    .collect(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::math::FixedDec;
    use crate::domain::route::{RoutablePool, Route};
    use std::collections::HashMap as StdHashMap;

    #[test]
    fn config_defaults_match_the_documented_values() {
        let config = RouterConfig::default();
        assert_eq!(config.max_pools_per_route, 4);
        assert_eq!(config.max_routes, 4);
        assert_eq!(config.max_split_iterations, 10);
        assert!(config.route_cache_enabled);
    }

    #[test]
    fn cache_key_embeds_pair_and_magnitude() {
        assert_eq!(ranked_route_cache_key("uosmo", "uion", 6), "uosmo/uion/6");
    }

    #[test]
    fn quote_input_validation_rejects_degenerate_requests() {
        let ok = Coin::new("uosmo", U256::from(10u64));
        assert!(validate_quote_input(&ok, "uion").is_ok());

        let zero = Coin::new("uosmo", U256::ZERO);
        assert!(validate_quote_input(&zero, "uion").is_err());
        assert!(validate_quote_input(&ok, "uosmo").is_err());
        assert!(validate_quote_input(&ok, "").is_err());
    }

    #[test]
    fn ranked_to_candidate_conversion_preserves_hops_and_unique_ids() {
        let pool_a = Arc::new(
            Pool::new(
                1,
                PoolType::Balancer,
                vec!["uosmo".into(), "uatom".into()],
                StdHashMap::from([
                    ("uosmo".into(), U256::from(1_000u64)),
                    ("uatom".into(), U256::from(1_000u64)),
                ]),
                FixedDec::ZERO,
                U256::from(1u64),
                None,
            )
            .unwrap(),
        );
        let pool_b = Arc::new(
            Pool::new(
                2,
                PoolType::Balancer,
                vec!["uatom".into(), "uion".into()],
                StdHashMap::from([
                    ("uatom".into(), U256::from(1_000u64)),
                    ("uion".into(), U256::from(1_000u64)),
                ]),
                FixedDec::ZERO,
                U256::from(1u64),
                None,
            )
            .unwrap(),
        );
        let route = Route::try_new(vec![
            RoutablePool::new(pool_a, "uatom", FixedDec::ZERO),
            RoutablePool::new(pool_b, "uion", FixedDec::ZERO),
        ])
        .unwrap();
        let ranked = vec![RankedRoute {
            route,
            amount_out: U256::from(99u64),
        }];

        let candidates = convert_ranked_to_candidate_routes(&ranked);
        assert_eq!(candidates.routes.len(), 1);
        assert_eq!(
            candidates.routes[0].pools,
            vec![
                CandidatePool {
                    pool_id: 1,
                    token_out_denom: "uatom".into()
                },
                CandidatePool {
                    pool_id: 2,
                    token_out_denom: "uion".into()
                },
            ]
        );
        assert_eq!(
            candidates.unique_pool_ids,
            std::collections::BTreeSet::from([1, 2])
        );
    }
}
