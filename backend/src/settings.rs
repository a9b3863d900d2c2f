//! Engine configuration loaded via OrthoConfig.
//!
//! Values come from `CAFEHUB_*` environment variables, configuration files
//! and command-line flags, in OrthoConfig's usual precedence. Every field is
//! optional; accessors supply the defaults.

use std::time::Duration;

use ortho_config::OrthoConfig;
use pagination::DEFAULT_MAX_PAGE_SIZE;
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/cafehub";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the cafe engine.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CAFEHUB")]
pub struct EngineSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    pub pool_max_size: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub pool_connection_timeout_secs: Option<u64>,
    /// Largest page size accepted by paged reads.
    pub max_page_size: Option<u32>,
}

impl EngineSettings {
    /// Configured database URL, falling back to a local default.
    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    /// Configured pool size.
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Configured pool checkout timeout.
    pub fn pool_connection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.pool_connection_timeout_secs
                .unwrap_or(DEFAULT_POOL_CONNECTION_TIMEOUT_SECS),
        )
    }

    /// Configured page size ceiling.
    pub fn max_page_size(&self) -> u32 {
        self.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE)
    }
}
