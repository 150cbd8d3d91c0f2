use std::sync::Arc;

use briefing_core::config::Config;
use briefing_core::store::ResultStore;

/// Shared application state passed to all route handlers.
///
/// The store is constructed exactly once here and shared via `Arc`, so every
/// handler — ingestion, snapshot, and each open stream — sees the same
/// buffer and subscriber set for the life of the process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResultStore>,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(ResultStore::new(config.result_cap));
        Self {
            store,
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_store() {
        let state = AppState::new(Config::default());
        let clone = state.clone();
        state.store.add_result(serde_json::json!({"n": 1}), None);
        assert_eq!(clone.store.results().len(), 1);
    }
}
