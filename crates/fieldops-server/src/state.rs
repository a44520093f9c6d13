//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use fieldops_core::OrgClock;
use fieldops_settings::FieldOpsSettings;
use fieldops_store::{Pool, PooledConnection};

use crate::errors::ApiResult;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool.
    pub pool: Pool,
    /// Loaded settings.
    pub settings: Arc<FieldOpsSettings>,
    /// Organization clock, built from settings.
    pub clock: OrgClock,
    /// When the server started.
    pub start_time: Instant,
}

impl AppState {
    /// Build state from a pool and settings.
    pub fn new(pool: Pool, settings: FieldOpsSettings) -> Self {
        let clock = OrgClock::with_offset_hours(settings.org.utc_offset_hours);
        Self {
            pool,
            settings: Arc::new(settings),
            clock,
            start_time: Instant::now(),
        }
    }

    /// Build state with an explicit clock (tests pin time this way).
    pub fn with_clock(pool: Pool, settings: FieldOpsSettings, clock: OrgClock) -> Self {
        Self {
            pool,
            settings: Arc::new(settings),
            clock,
            start_time: Instant::now(),
        }
    }

    /// Check out a pooled connection.
    pub fn conn(&self) -> ApiResult<PooledConnection> {
        Ok(self.pool.get()?)
    }
}
