//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::HelpersConfig;
use crate::error::Result;
use crate::middleware::CustomerIdResolver;
use crate::proxy::UpstreamClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: HelpersConfig,
    upstream: UpstreamClient,
    resolver: CustomerIdResolver,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn new(config: HelpersConfig) -> Result<Self> {
        let upstream = UpstreamClient::new(config.upstream_timeout)?;
        let resolver = CustomerIdResolver::for_environment(config.environment);

        if resolver.allows_query_override() {
            tracing::warn!(
                environment = %config.environment,
                "custId query override is enabled; any visitor can act as any customer"
            );
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                upstream,
                resolver,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &HelpersConfig {
        &self.inner.config
    }

    /// Get a reference to the outbound HTTP client.
    #[must_use]
    pub fn upstream(&self) -> &UpstreamClient {
        &self.inner.upstream
    }

    /// Get the customer ID resolver.
    #[must_use]
    pub fn resolver(&self) -> CustomerIdResolver {
        self.inner.resolver
    }
}

impl FromRef<AppState> for CustomerIdResolver {
    fn from_ref(state: &AppState) -> Self {
        state.resolver()
    }
}
