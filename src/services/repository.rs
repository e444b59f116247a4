// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::coin::DenomPair;
use crate::domain::error::RouterError;
use crate::domain::pool::{Pool, PoolType, TickModel};
use crate::domain::route::CandidateRoutes;
use crate::domain::taker_fee::TakerFeeTable;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read-only view of the on-chain pool state the planner quotes against.
#[async_trait]
pub trait PoolRepository: Send + Sync {
    /// Snapshot of every known pool.
    async fn get_all_pools(&self) -> Result<Vec<Arc<Pool>>, RouterError>;

    async fn get_pool(&self, id: u64) -> Result<Arc<Pool>, RouterError>;

    /// Tick models for the requested concentrated pools; pools without a
    /// model are absent from the result.
    async fn get_tick_model_map(
        &self,
        pool_ids: &[u64],
    ) -> Result<HashMap<u64, TickModel>, RouterError>;
}

/// Persistent candidate-route cache plus the taker-fee snapshot, keyed by
/// the canonicalized denom pair.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// Cached candidate routes for the pair; empty when none are stored.
    async fn get_routes(
        &self,
        denom_a: &str,
        denom_b: &str,
    ) -> Result<CandidateRoutes, RouterError>;

    async fn set_routes(
        &self,
        denom_a: &str,
        denom_b: &str,
        routes: CandidateRoutes,
    ) -> Result<(), RouterError>;

    async fn get_all_taker_fees(&self) -> Result<TakerFeeTable, RouterError>;
}

/// Process-local pool store, used by the replay binary and tests.
#[derive(Default)]
pub struct InMemoryPoolRepository {
    pools: DashMap<u64, Arc<Pool>>,
}

impl InMemoryPoolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pools(pools: impl IntoIterator<Item = Pool>) -> Self {
        let repository = Self::new();
        for pool in pools {
            repository.insert(pool);
        }
        repository
    }

    pub fn insert(&self, pool: Pool) {
        self.pools.insert(pool.id(), Arc::new(pool));
    }
}

#[async_trait]
impl PoolRepository for InMemoryPoolRepository {
    async fn get_all_pools(&self) -> Result<Vec<Arc<Pool>>, RouterError> {
        let mut pools: Vec<Arc<Pool>> = self.pools.iter().map(|p| p.value().clone()).collect();
        pools.sort_by_key(|pool| pool.id());
        Ok(pools)
    }

    async fn get_pool(&self, id: u64) -> Result<Arc<Pool>, RouterError> {
        self.pools
            .get(&id)
            .map(|p| p.value().clone())
            .ok_or(RouterError::PoolNotFound(id))
    }

    async fn get_tick_model_map(
        &self,
        pool_ids: &[u64],
    ) -> Result<HashMap<u64, TickModel>, RouterError> {
        let mut models = HashMap::new();
        for id in pool_ids {
            if let Some(pool) = self.pools.get(id) {
                if pool.pool_type() == PoolType::Concentrated {
                    if let Some(model) = pool.tick_model() {
                        models.insert(*id, model.clone());
                    }
                }
            }
        }
        Ok(models)
    }
}

/// Process-local route cache and taker-fee table.
#[derive(Default)]
pub struct InMemoryRouteRepository {
    routes: DashMap<DenomPair, CandidateRoutes>,
    taker_fees: RwLock<TakerFeeTable>,
}

impl InMemoryRouteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_taker_fees(&self, table: TakerFeeTable) {
        *self.taker_fees.write().await = table;
    }

    pub fn stored_route_count(&self) -> usize {
        self.routes.len()
    }
}

#[async_trait]
impl RouteRepository for InMemoryRouteRepository {
    async fn get_routes(
        &self,
        denom_a: &str,
        denom_b: &str,
    ) -> Result<CandidateRoutes, RouterError> {
        Ok(self
            .routes
            .get(&DenomPair::new(denom_a, denom_b))
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn set_routes(
        &self,
        denom_a: &str,
        denom_b: &str,
        routes: CandidateRoutes,
    ) -> Result<(), RouterError> {
        self.routes.insert(DenomPair::new(denom_a, denom_b), routes);
        Ok(())
    }

    async fn get_all_taker_fees(&self) -> Result<TakerFeeTable, RouterError> {
        Ok(self.taker_fees.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::math::FixedDec;
    use crate::domain::route::{CandidatePool, CandidateRoute};
    use alloy::primitives::U256;

    fn test_pool(id: u64) -> Pool {
        Pool::new(
            id,
            PoolType::Balancer,
            vec!["uion".into(), "uosmo".into()],
            HashMap::from([
                ("uion".into(), U256::from(1_000u64)),
                ("uosmo".into(), U256::from(1_000u64)),
            ]),
            FixedDec::ZERO,
            U256::from(10u64),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn pool_repository_snapshots_sorted_by_id() {
        let repository = InMemoryPoolRepository::with_pools([test_pool(3), test_pool(1)]);
        let pools = repository.get_all_pools().await.unwrap();
        assert_eq!(
            pools.iter().map(|p| p.id()).collect::<Vec<_>>(),
            vec![1, 3]
        );

        assert!(matches!(
            repository.get_pool(9).await,
            Err(RouterError::PoolNotFound(9))
        ));
    }

    #[tokio::test]
    async fn route_repository_is_pair_order_insensitive() {
        let repository = InMemoryRouteRepository::new();
        let routes = CandidateRoutes::from_routes(vec![CandidateRoute {
            pools: vec![CandidatePool {
                pool_id: 1,
                token_out_denom: "uion".into(),
            }],
        }]);
        repository
            .set_routes("uosmo", "uion", routes.clone())
            .await
            .unwrap();

        let reversed = repository.get_routes("uion", "uosmo").await.unwrap();
        assert_eq!(reversed, routes);

        let missing = repository.get_routes("uosmo", "uatom").await.unwrap();
        assert!(missing.is_empty());
    }
}
