pub mod config;
pub mod gateway;
pub mod metrics;
pub mod source;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, GatewayConfig,
    HtmlSourceConfig, JsonSourceConfig, SanitizedConfig, ServerConfig, SourcesConfig,
};
pub use gateway::{
    Allowlist, ClientRateLimiter, FetchGateway, GatewayError, GatewayResponse, HttpUpstream,
    Upstream, UpstreamResponse,
};
pub use source::{
    build_sources, Accuracy, AudioType, CanonicalResult, Operation, Query, ReleaseType,
    Resolution, Source, SourceError, SourceRegistry, UrlSource,
};
