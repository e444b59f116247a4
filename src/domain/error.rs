// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

/// Pricing-curve rejection. Dropped per route during evaluation; other
/// routes proceed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("invalid swap on pool {pool_id}: {reason}")]
    InvalidSwap { pool_id: u64, reason: String },

    #[error("insufficient liquidity on pool {pool_id}: {reason}")]
    InsufficientLiquidity { pool_id: u64, reason: String },
}

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no ranked routes found")]
    NoRankedRoutes,

    #[error("no route found for pool ids: {0:?}")]
    NoMatchingRoute(Vec<u64>),

    #[error("best we can do is no tokens out")]
    ZeroOutput,

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("pool {0} not found")]
    PoolNotFound(u64),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("route cache is disabled")]
    CacheDisabled,

    #[error("request deadline exceeded")]
    Cancelled,

    #[error("state file error: {0}")]
    StateFile(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<tokio::time::error::Elapsed> for RouterError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        RouterError::Cancelled
    }
}

impl From<config::ConfigError> for RouterError {
    fn from(err: config::ConfigError) -> Self {
        RouterError::Config(err.to_string())
    }
}
