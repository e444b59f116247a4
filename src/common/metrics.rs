// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

pub const CANDIDATE_ROUTE_CACHE: &str = "candidate_route";
pub const RANKED_ROUTE_CACHE: &str = "ranked_route";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheLabels {
    route: String,
    cache_type: String,
    token_in: String,
    token_out: String,
}

/// Cache hit/miss counter vectors labeled by planner operation, cache
/// tier, and traded denoms.
#[derive(Default)]
pub struct CacheMetrics {
    hits: DashMap<CacheLabels, AtomicU64>,
    misses: DashMap<CacheLabels, AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_hit(&self, route: &str, cache_type: &str, token_in: &str, token_out: &str) {
        Self::bump(&self.hits, CacheLabels::new(route, cache_type, token_in, token_out));
    }

    pub fn record_miss(&self, route: &str, cache_type: &str, token_in: &str, token_out: &str) {
        Self::bump(&self.misses, CacheLabels::new(route, cache_type, token_in, token_out));
    }

    pub fn hit_count(&self, route: &str, cache_type: &str, token_in: &str, token_out: &str) -> u64 {
        Self::read(&self.hits, CacheLabels::new(route, cache_type, token_in, token_out))
    }

    pub fn miss_count(&self, route: &str, cache_type: &str, token_in: &str, token_out: &str) -> u64 {
        Self::read(&self.misses, CacheLabels::new(route, cache_type, token_in, token_out))
    }

    fn bump(counters: &DashMap<CacheLabels, AtomicU64>, labels: CacheLabels) {
        counters
            .entry(labels)
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    fn read(counters: &DashMap<CacheLabels, AtomicU64>, labels: CacheLabels) -> u64 {
        counters
            .get(&labels)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Prometheus text exposition of both counter vectors.
    pub fn render(&self) -> String {
        let mut body = String::new();
        body.push_str("# TYPE cache_hits_total counter\n");
        render_counter(&mut body, "cache_hits_total", &self.hits);
        body.push_str("# TYPE cache_misses_total counter\n");
        render_counter(&mut body, "cache_misses_total", &self.misses);
        body
    }
}

impl CacheLabels {
    fn new(route: &str, cache_type: &str, token_in: &str, token_out: &str) -> Self {
        CacheLabels {
            route: route.to_string(),
            cache_type: cache_type.to_string(),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
        }
    }
}

fn render_counter(body: &mut String, name: &str, counters: &DashMap<CacheLabels, AtomicU64>) {
    let mut lines: Vec<String> = counters
        .iter()
        .map(|entry| {
            let labels = entry.key();
            format!(
                "{name}{{route=\"{}\",cache_type=\"{}\",token_in=\"{}\",token_out=\"{}\"}} {}\n",
                labels.route,
                labels.cache_type,
                labels.token_in,
                labels.token_out,
                entry.value().load(Ordering::Relaxed)
            )
        })
        .collect();
    lines.sort();
    for line in lines {
        body.push_str(&line);
    }
}

pub async fn spawn_metrics_server(port: u16, metrics: Arc<CacheMetrics>) -> Option<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!("Metrics server failed to bind: {}", e);
            return None;
        }
    };

    let local = listener.local_addr().ok();
    if let Some(addr) = local {
        tracing::info!("Metrics server listening on {}", addr);
    }

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let body = metrics.render();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                }
                Err(e) => {
                    tracing::warn!("Metrics accept error: {}", e);
                    continue;
                }
            }
        }
    });

    local
}
