pub mod config;
pub mod dashboard;
pub mod diagnostic;
pub mod error;
pub mod methods;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use config::AppConfig;
use dashboard::storage::DashboardStorage;
use diagnostic::storage::DiagnosticStorage;
use storage::{sessions::SessionStorage, Storage};

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub storage: Storage,
    /// Study-session CRUD + per-user aggregate upkeep.
    pub sessions: SessionStorage,
    /// Diagnostic quiz reference data, submissions, and recommendations.
    pub diagnostic: DiagnosticStorage,
    /// Read-only dashboard aggregation queries.
    pub dashboard: DashboardStorage,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<AppConfig>, storage: Storage) -> Self {
        let pool = storage.pool();
        Self {
            config,
            storage,
            sessions: SessionStorage::new(pool.clone()),
            diagnostic: DiagnosticStorage::new(pool.clone()),
            dashboard: DashboardStorage::new(pool),
            started_at: std::time::Instant::now(),
        }
    }
}
