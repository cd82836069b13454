//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::platform::PlatformClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    platform: PlatformClient,
}

impl AppState {
    /// Create application state, building the platform client from config.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let platform = PlatformClient::new(&config.platform);
        Self {
            inner: Arc::new(AppStateInner { config, platform }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the hosted platform client.
    #[must_use]
    pub fn platform(&self) -> &PlatformClient {
        &self.inner.platform
    }
}
