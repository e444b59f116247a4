// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use oxidity_router::app::config::RouterSettings;
use oxidity_router::app::logging::setup_logging;
use oxidity_router::common::math::FixedDec;
use oxidity_router::common::metrics::CacheMetrics;
use oxidity_router::domain::coin::Coin;
use oxidity_router::domain::error::RouterError;
use oxidity_router::domain::route::Quote;
use oxidity_router::services::repository::{InMemoryPoolRepository, InMemoryRouteRepository};
use oxidity_router::services::router::planner::RoutePlanner;
use oxidity_router::services::router::state_files;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline quote replay over persisted router state")]
struct Cli {
    /// Path to config file (default: config.*)
    #[arg(long)]
    config: Option<String>,

    /// Persisted pool snapshot.
    #[arg(long, default_value = "pools.json")]
    pools: PathBuf,

    /// Persisted taker fees. Missing file means the default fee applies everywhere.
    #[arg(long, default_value = "taker_fees.json")]
    taker_fees: PathBuf,

    /// Token in as `<amount><denom>`, e.g. 1000000uosmo.
    #[arg(long)]
    token_in: String,

    /// Token out denom.
    #[arg(long)]
    token_out: String,

    /// Restrict to the route through these pool ids (comma-separated).
    #[arg(long)]
    pool_ids: Option<String>,

    /// Skip split optimization and quote the best single route.
    #[arg(long, default_value_t = false)]
    best_single: bool,

    /// Optional output path for the full JSON quote.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), RouterError> {
    let cli = Cli::parse();
    let settings = RouterSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(if settings.debug { "debug" } else { "info" }, settings.json_logs);

    let token_in: Coin = cli
        .token_in
        .parse()
        .map_err(RouterError::InvalidInput)?;

    let pools = state_files::load_pools(&cli.pools)?;
    tracing::info!(num_pools = pools.len(), path = %cli.pools.display(), "loaded pool snapshot");
    let pool_repository = Arc::new(InMemoryPoolRepository::with_pools(pools));

    let route_repository = Arc::new(InMemoryRouteRepository::new());
    if cli.taker_fees.exists() {
        let fees = state_files::load_taker_fees(&cli.taker_fees, FixedDec::ZERO)?;
        tracing::info!(num_pairs = fees.len(), "loaded taker fees");
        route_repository.set_taker_fees(fees).await;
    }

    let planner = RoutePlanner::new(
        settings.router.clone(),
        settings.request_timeout(),
        pool_repository,
        route_repository,
        CacheMetrics::new(),
    )?;

    let quote = if let Some(raw_ids) = cli.pool_ids.as_deref() {
        let pool_ids = parse_pool_ids(raw_ids)?;
        planner
            .get_custom_quote(&token_in, &cli.token_out, &pool_ids)
            .await?
    } else if cli.best_single {
        planner
            .get_best_single_route_quote(&token_in, &cli.token_out)
            .await?
    } else {
        planner.get_optimal_quote(&token_in, &cli.token_out).await?
    };

    print_quote(&quote, &cli.token_out);

    if let Some(out) = cli.out {
        let body = serde_json::to_string_pretty(&quote)
            .map_err(|e| RouterError::StateFile(format!("quote encode failed: {e}")))?;
        std::fs::write(&out, body)
            .map_err(|e| RouterError::StateFile(format!("quote write failed: {e}")))?;
        println!("Quote written to {}", out.display());
    }
    Ok(())
}

fn parse_pool_ids(raw: &str) -> Result<Vec<u64>, RouterError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| RouterError::InvalidInput(format!("invalid pool id '{part}'")))
        })
        .collect()
}

fn print_quote(quote: &Quote, token_out_denom: &str) {
    println!(
        "Quote: {} -> {}{}",
        quote.amount_in, quote.amount_out, token_out_denom
    );
    for (index, route) in quote.routes.iter().enumerate() {
        let hops: Vec<String> = route
            .pools
            .iter()
            .map(|hop| format!("{}:{}", hop.pool_id, hop.token_out_denom))
            .collect();
        let share = quote
            .route_proportions
            .get(index)
            .map(|p| format!(" ({}/{})", p.parts, p.total))
            .unwrap_or_default();
        println!(
            "  route {}{}: [{}] in={} out={}",
            index + 1,
            share,
            hops.join(" -> "),
            route.in_amount,
            route.out_amount
        );
    }
}
