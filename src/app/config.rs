// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::error::RouterError;
use crate::services::router::planner::RouterConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct RouterSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_json_logs")]
    pub json_logs: bool,

    // Serving
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    // Planner
    #[serde(default)]
    pub router: RouterConfig,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_json_logs() -> bool {
    false
}
fn default_metrics_port() -> u16 {
    9100
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for RouterSettings {
    fn default() -> Self {
        RouterSettings {
            debug: default_debug(),
            json_logs: default_json_logs(),
            metrics_port: default_metrics_port(),
            request_timeout_ms: default_request_timeout_ms(),
            router: RouterConfig::default(),
        }
    }
}

impl RouterSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, RouterError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        match path {
            Some(path) => {
                builder = builder.add_source(File::with_name(path).required(true));
            }
            None => {
                builder = builder.add_source(File::with_name("config").required(false));
            }
        }
        // Environment overrides file values, e.g. ROUTER__MAX_ROUTES=8.
        builder = builder.add_source(Environment::default().separator("__"));

        let settings: RouterSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load() -> Result<Self, RouterError> {
        Self::load_with_path(None)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<(), RouterError> {
        if self.request_timeout_ms == 0 {
            return Err(RouterError::Config("request_timeout_ms must be positive".into()));
        }
        if self.router.max_pools_per_route == 0 {
            return Err(RouterError::Config("router.max_pools_per_route must be positive".into()));
        }
        if self.router.max_routes == 0 {
            return Err(RouterError::Config("router.max_routes must be positive".into()));
        }
        Ok(())
    }
}
