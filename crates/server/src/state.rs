//! Application state shared across handlers.

use shelf_core::config::AppConfig;
use shelf_metadata::MetadataStore;
use shelf_storage::PathResolver;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Sharded path resolver rooted at the configured storage directory.
    pub resolver: Arc<PathResolver>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        let resolver = Arc::new(PathResolver::new(config.storage.root.clone()));
        Self {
            config: Arc::new(config),
            metadata,
            resolver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_metadata::SqliteStore;

    #[tokio::test]
    async fn resolver_is_rooted_at_configured_storage() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::for_testing();
        config.storage.root = temp.path().join("storage");

        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(temp.path().join("metadata.db"))
                .await
                .unwrap(),
        );

        let state = AppState::new(config, metadata);
        assert_eq!(state.resolver.root(), temp.path().join("storage"));
    }
}
