// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::math::FixedDec;
use crate::domain::error::RouterError;
use crate::domain::pool::{Pool, PoolType, TickModel};
use crate::domain::taker_fee::{TakerFeeForPair, TakerFeeTable};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainModelRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub pool_type: PoolType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SqsModelRecord {
    pub denoms: Vec<String>,
    pub balances: BTreeMap<String, U256>,
    pub spread_factor: FixedDec,
    pub tvl: U256,
}

/// One pool entry in `pools.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolRecord {
    pub chain_model: ChainModelRecord,
    pub sqs_model: SqsModelRecord,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tick_model: Option<TickModel>,
}

pub fn store_pools(
    path: &Path,
    pools: &[Arc<Pool>],
    tick_models: &HashMap<u64, TickModel>,
) -> Result<(), RouterError> {
    let records: Vec<PoolRecord> = pools
        .iter()
        .map(|pool| PoolRecord {
            chain_model: ChainModelRecord {
                id: pool.id(),
                pool_type: pool.pool_type(),
            },
            sqs_model: SqsModelRecord {
                denoms: pool.denoms().to_vec(),
                balances: pool
                    .balances()
                    .iter()
                    .map(|(denom, amount)| (denom.clone(), *amount))
                    .collect(),
                spread_factor: pool.spread_factor(),
                tvl: pool.tvl(),
            },
            tick_model: tick_models
                .get(&pool.id())
                .cloned()
                .or_else(|| pool.tick_model().cloned()),
        })
        .collect();
    write_json(path, &records)
}

pub fn load_pools(path: &Path) -> Result<Vec<Pool>, RouterError> {
    let records: Vec<PoolRecord> = read_json(path)?;
    records
        .into_iter()
        .map(|record| {
            Pool::new(
                record.chain_model.id,
                record.chain_model.pool_type,
                record.sqs_model.denoms,
                record.sqs_model.balances.into_iter().collect(),
                record.sqs_model.spread_factor,
                record.sqs_model.tvl,
                record.tick_model,
            )
        })
        .collect()
}

/// Writes `taker_fees.json`: one entry per pair, denoms in canonical order.
pub fn store_taker_fees(path: &Path, table: &TakerFeeTable) -> Result<(), RouterError> {
    let records: Vec<TakerFeeForPair> = table
        .iter()
        .map(|(pair, fee)| TakerFeeForPair {
            denom0: pair.denom0.clone(),
            denom1: pair.denom1.clone(),
            taker_fee: *fee,
        })
        .collect();
    write_json(path, &records)
}

pub fn load_taker_fees(path: &Path, default_fee: FixedDec) -> Result<TakerFeeTable, RouterError> {
    let records: Vec<TakerFeeForPair> = read_json(path)?;
    let mut table = TakerFeeTable::new(default_fee);
    for record in records {
        table.insert(&record.denom0, &record.denom1, record.taker_fee);
    }
    Ok(table)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RouterError> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| RouterError::StateFile(format!("encode {}: {e}", path.display())))?;
    std::fs::write(path, body)
        .map_err(|e| RouterError::StateFile(format!("write {}: {e}", path.display())))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, RouterError> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| RouterError::StateFile(format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&body)
        .map_err(|e| RouterError::StateFile(format!("decode {}: {e}", path.display())))
}
