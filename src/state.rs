use std::sync::Arc;

use crate::audit::AuditLog;
use crate::config::AppConfig;
use crate::store::SiteStore;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SiteStore>,
    pub audit: AuditLog,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn SiteStore>) -> Self {
        Self {
            config: Arc::new(config),
            audit: AuditLog::new(store.clone()),
            store,
        }
    }
}
