use std::sync::Arc;

use shared_config::AppConfig;
use shared_models::EventBus;

use crate::store::ClinicStore;

/// Shared state handed to every router.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<ClinicStore>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            store: Arc::new(ClinicStore::new()),
            events: EventBus::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
