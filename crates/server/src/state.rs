use std::path::Path;

use anisearch_core::{
    ClientRateLimiter, Config, FetchGateway, SanitizedConfig, SourceRegistry,
};

/// Shared application state
pub struct AppState {
    config: Config,
    sources: SourceRegistry,
    gateway: FetchGateway,
    rate_limiter: ClientRateLimiter,
}

impl AppState {
    pub fn new(config: Config, sources: SourceRegistry, gateway: FetchGateway) -> Self {
        let rate_limiter = ClientRateLimiter::new(config.gateway.rate_limit_rpm);
        Self {
            config,
            sources,
            gateway,
            rate_limiter,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn gateway(&self) -> &FetchGateway {
        &self.gateway
    }

    pub fn rate_limiter(&self) -> &ClientRateLimiter {
        &self.rate_limiter
    }

    /// Directory served under `/extensions`.
    pub fn extensions_dir(&self) -> &Path {
        &self.config.gateway.extensions_dir
    }
}
