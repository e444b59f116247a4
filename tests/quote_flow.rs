// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::U256;
use oxidity_router::common::math::FixedDec;
use oxidity_router::common::metrics::{CacheMetrics, RANKED_ROUTE_CACHE};
use oxidity_router::domain::coin::Coin;
use oxidity_router::domain::error::RouterError;
use oxidity_router::domain::pool::{Pool, PoolType, TickModel};
use oxidity_router::domain::route::RouteProportion;
use oxidity_router::domain::taker_fee::TakerFeeTable;
use oxidity_router::services::repository::{InMemoryPoolRepository, InMemoryRouteRepository};
use oxidity_router::services::router::planner::{RoutePlanner, RouterConfig};
use oxidity_router::services::router::state_files;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const RESERVE: u128 = 1_000_000_000_000_000_000;

fn pool(id: u64, denoms: &[&str], reserve: u128) -> Pool {
    let balances: HashMap<String, U256> = denoms
        .iter()
        .map(|d| (d.to_string(), U256::from(reserve)))
        .collect();
    Pool::new(
        id,
        PoolType::Balancer,
        denoms.iter().map(|d| d.to_string()).collect(),
        balances,
        FixedDec::ZERO,
        U256::from(1_000_000u64),
        None,
    )
    .unwrap()
}

struct Setup {
    planner: RoutePlanner,
    metrics: Arc<CacheMetrics>,
}

async fn setup_with_fees(pools: Vec<Pool>, fees: Option<TakerFeeTable>) -> Setup {
    let pool_repository = Arc::new(InMemoryPoolRepository::with_pools(pools));
    let route_repository = Arc::new(InMemoryRouteRepository::new());
    if let Some(fees) = fees {
        route_repository.set_taker_fees(fees).await;
    }
    let metrics = CacheMetrics::new();
    let planner = RoutePlanner::new(
        RouterConfig::default(),
        Duration::from_secs(10),
        pool_repository,
        route_repository,
        metrics.clone(),
    )
    .unwrap();
    Setup { planner, metrics }
}

async fn setup(pools: Vec<Pool>) -> Setup {
    setup_with_fees(pools, None).await
}

#[tokio::test]
async fn single_route_quote_matches_the_curve() {
    let setup = setup(vec![pool(1, &["uosmo", "uion"], RESERVE)]).await;
    let amount = U256::from(1_000_000_000_000_000u64);
    let token_in = Coin::new("uosmo", amount);

    let quote = setup.planner.get_optimal_quote(&token_in, "uion").await.unwrap();

    let reserve = U256::from(RESERVE);
    let expected = reserve * amount / (reserve + amount);
    assert_eq!(quote.amount_out, expected);
    assert_eq!(quote.routes.len(), 1);
    assert!(quote.route_proportions.is_empty());
}

#[tokio::test]
async fn repeated_quotes_are_idempotent_and_hit_the_ranked_cache() {
    let setup = setup(vec![pool(1, &["uosmo", "uion"], RESERVE)]).await;
    let token_in = Coin::new("uosmo", U256::from(1_000_000_000u64));

    let first = setup.planner.get_optimal_quote(&token_in, "uion").await.unwrap();
    let second = setup.planner.get_optimal_quote(&token_in, "uion").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        setup
            .metrics
            .hit_count("optimal_quote", RANKED_ROUTE_CACHE, "uosmo", "uion"),
        1
    );
    assert_eq!(
        setup
            .metrics
            .miss_count("optimal_quote", RANKED_ROUTE_CACHE, "uosmo", "uion"),
        1
    );
}

#[tokio::test]
async fn split_across_identical_pools_beats_the_single_route() {
    let setup = setup(vec![
        pool(1, &["uosmo", "uion"], RESERVE),
        pool(2, &["uosmo", "uion"], RESERVE),
    ])
    .await;
    // Large enough that single-route slippage is clearly nonlinear.
    let token_in = Coin::new("uosmo", U256::from(200_000_000_000_000_000u128));

    let single = setup
        .planner
        .get_best_single_route_quote(&token_in, "uion")
        .await
        .unwrap();
    let optimal = setup.planner.get_optimal_quote(&token_in, "uion").await.unwrap();

    assert!(optimal.amount_out > single.amount_out);
    assert_eq!(optimal.routes.len(), 2);
    assert_eq!(
        optimal.route_proportions,
        vec![
            RouteProportion { parts: 5, total: 10 },
            RouteProportion { parts: 5, total: 10 },
        ]
    );
}

#[tokio::test]
async fn quotes_traverse_multi_hop_routes() {
    let setup = setup(vec![
        pool(1, &["uosmo", "uatom"], RESERVE),
        pool(2, &["uatom", "uion"], RESERVE),
    ])
    .await;
    let token_in = Coin::new("uosmo", U256::from(1_000_000_000u64));

    let quote = setup.planner.get_optimal_quote(&token_in, "uion").await.unwrap();

    assert!(quote.amount_out > U256::ZERO);
    assert_eq!(quote.routes.len(), 1);
    let hops: Vec<u64> = quote.routes[0].pools.iter().map(|p| p.pool_id).collect();
    assert_eq!(hops, vec![1, 2]);
}

#[tokio::test]
async fn taker_fees_reduce_the_quote() {
    let free = setup(vec![pool(1, &["uosmo", "uion"], RESERVE)]).await;

    let mut fees = TakerFeeTable::new(FixedDec::ZERO);
    fees.insert("uosmo", "uion", FixedDec::from_bps(100));
    let taxed = setup_with_fees(vec![pool(1, &["uosmo", "uion"], RESERVE)], Some(fees)).await;

    let token_in = Coin::new("uosmo", U256::from(1_000_000_000u64));
    let free_quote = free.planner.get_optimal_quote(&token_in, "uion").await.unwrap();
    let taxed_quote = taxed.planner.get_optimal_quote(&token_in, "uion").await.unwrap();

    assert!(taxed_quote.amount_out < free_quote.amount_out);
}

#[tokio::test]
async fn custom_quote_requires_an_exact_pool_id_sequence() {
    let setup = setup(vec![
        pool(1, &["uosmo", "uion"], RESERVE),
        pool(2, &["uosmo", "uatom"], RESERVE),
        pool(3, &["uatom", "uion"], RESERVE),
    ])
    .await;
    let token_in = Coin::new("uosmo", U256::from(1_000_000u64));

    let custom = setup
        .planner
        .get_custom_quote(&token_in, "uion", &[2, 3])
        .await
        .unwrap();
    let hops: Vec<u64> = custom.routes[0].pools.iter().map(|p| p.pool_id).collect();
    assert_eq!(hops, vec![2, 3]);

    let missing = setup
        .planner
        .get_custom_quote(&token_in, "uion", &[9])
        .await;
    assert!(matches!(missing, Err(RouterError::NoMatchingRoute(_))));
}

#[tokio::test]
async fn taker_fee_listing_covers_every_pool_pair() {
    let mut fees = TakerFeeTable::new(FixedDec::from_bps(10));
    fees.insert("uosmo", "uion", FixedDec::from_bps(15));
    let setup = setup_with_fees(
        vec![pool(1, &["uosmo", "uion", "uatom"], RESERVE)],
        Some(fees),
    )
    .await;

    let pairs = setup.planner.get_taker_fee(1).await.unwrap();
    assert_eq!(pairs.len(), 3);
    for pair in &pairs {
        assert!(pair.denom0 < pair.denom1);
        let expected = if (pair.denom0.as_str(), pair.denom1.as_str()) == ("uion", "uosmo") {
            FixedDec::from_bps(15)
        } else {
            FixedDec::from_bps(10)
        };
        assert_eq!(pair.taker_fee, expected);
    }

    assert!(matches!(
        setup.planner.get_taker_fee(42).await,
        Err(RouterError::PoolNotFound(42))
    ));
}

#[tokio::test]
async fn state_files_round_trip_through_the_planner() {
    let concentrated = Pool::new(
        7,
        PoolType::Concentrated,
        vec!["uion".into(), "uosmo".into()],
        HashMap::from([
            ("uion".into(), U256::from(RESERVE)),
            ("uosmo".into(), U256::from(RESERVE)),
        ]),
        FixedDec::ZERO,
        U256::from(1_000_000u64),
        Some(TickModel {
            current_sqrt_price: U256::from(1u128 << 96),
            liquidity: U256::from(RESERVE),
        }),
    )
    .unwrap();

    let mut fees = TakerFeeTable::new(FixedDec::ZERO);
    fees.insert("uosmo", "uion", FixedDec::from_bps(15));
    let setup = setup_with_fees(
        vec![pool(1, &["uosmo", "uion"], RESERVE), concentrated],
        Some(fees),
    )
    .await;

    let dir = std::env::temp_dir().join(format!("oxidity-router-state-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    setup.planner.store_router_state_files(&dir).await.unwrap();

    let pools = state_files::load_pools(&dir.join("pools.json")).unwrap();
    assert_eq!(pools.len(), 2);
    let reloaded_cl = pools.iter().find(|p| p.id() == 7).unwrap();
    assert!(reloaded_cl.tick_model().is_some());

    let fees = state_files::load_taker_fees(&dir.join("taker_fees.json"), FixedDec::ZERO).unwrap();
    assert_eq!(fees.get_fee("uion", "uosmo"), FixedDec::from_bps(15));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn dust_input_cannot_produce_a_quote() {
    let setup = setup(vec![pool(1, &["uosmo", "uion"], RESERVE)]).await;
    let token_in = Coin::new("uosmo", U256::from(1u64));

    let result = setup.planner.get_optimal_quote(&token_in, "uion").await;
    assert!(matches!(
        result,
        Err(RouterError::NoRankedRoutes) | Err(RouterError::ZeroOutput)
    ));
    // Nothing half-baked was cached for the pair.
    assert!(setup.planner.ranked_route_cache().is_empty());
}
