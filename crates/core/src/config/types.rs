use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

/// Fetch gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// How long a cached upstream response stays fresh (default: 60000)
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// Maximum number of cached responses (default: 1000)
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    /// Responses this large or larger are never cached (default: 2 MB)
    #[serde(default = "default_max_cacheable_bytes")]
    pub max_cacheable_bytes: usize,
    /// Hostnames the gateway may fetch
    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<String>,
    /// User-Agent sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Upstream request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Requests per minute allowed per client IP (default: 120)
    #[serde(default = "default_rate_limit_rpm")]
    pub rate_limit_rpm: u32,
    /// Directory served under `/extensions`
    #[serde(default = "default_extensions_dir")]
    pub extensions_dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
            cache_max_entries: default_cache_max_entries(),
            max_cacheable_bytes: default_max_cacheable_bytes(),
            allowlist: default_allowlist(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            rate_limit_rpm: default_rate_limit_rpm(),
            extensions_dir: default_extensions_dir(),
        }
    }
}

fn default_cache_ttl_ms() -> u64 {
    60_000
}

fn default_cache_max_entries() -> usize {
    1000
}

fn default_max_cacheable_bytes() -> usize {
    2_000_000
}

fn default_allowlist() -> Vec<String> {
    ["nyaa.si", "www.nyaa.si", "sukebei.nyaa.si", "www.sukebei.nyaa.si"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_user_agent() -> String {
    concat!("anisearch-gateway/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_rate_limit_rpm() -> u32 {
    120
}

fn default_extensions_dir() -> PathBuf {
    PathBuf::from("src/extensions")
}

/// Search source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Base URL of a fetch gateway (e.g., "http://localhost:3000")
    #[serde(default)]
    pub gateway_url: Option<String>,
    #[serde(default = "default_nyaa")]
    pub nyaa: HtmlSourceConfig,
    #[serde(default = "default_sukebei")]
    pub sukebei: HtmlSourceConfig,
    #[serde(default = "default_animetosho")]
    pub animetosho: JsonSourceConfig,
    #[serde(default = "default_animetosho")]
    pub animetosho_multi: JsonSourceConfig,
    #[serde(default = "default_seadex")]
    pub seadex: JsonSourceConfig,
    #[serde(default = "default_animetosho")]
    pub animetosho_nzb: JsonSourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            gateway_url: None,
            nyaa: default_nyaa(),
            sukebei: default_sukebei(),
            animetosho: default_animetosho(),
            animetosho_multi: default_animetosho(),
            seadex: default_seadex(),
            animetosho_nzb: default_animetosho(),
        }
    }
}

impl SourcesConfig {
    /// Every provider's base URL, keyed by id, enabled ones only.
    pub fn enabled_urls(&self) -> Vec<(&'static str, &str)> {
        [
            ("nyaa", self.nyaa.enabled, self.nyaa.url.as_str()),
            ("sukebei", self.sukebei.enabled, self.sukebei.url.as_str()),
            ("animetosho", self.animetosho.enabled, self.animetosho.url.as_str()),
            (
                "animetosho_multi",
                self.animetosho_multi.enabled,
                self.animetosho_multi.url.as_str(),
            ),
            ("seadex", self.seadex.enabled, self.seadex.url.as_str()),
            (
                "animetosho_nzb",
                self.animetosho_nzb.enabled,
                self.animetosho_nzb.url.as_str(),
            ),
        ]
        .into_iter()
        .filter(|(_, enabled, _)| *enabled)
        .map(|(id, _, url)| (id, url))
        .collect()
    }
}

/// An HTML search-page provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HtmlSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Site root (e.g., "https://nyaa.si")
    pub url: String,
    /// Site category filter (e.g., "1_2")
    pub category: String,
    /// Ask the site to sort by seeders
    #[serde(default = "default_true")]
    pub sort_by_seeders: bool,
    /// Fetch through `sources.gateway_url` when it is set
    #[serde(default)]
    pub via_gateway: bool,
}

/// A JSON API provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub url: String,
}

fn default_true() -> bool {
    true
}

fn default_nyaa() -> HtmlSourceConfig {
    HtmlSourceConfig {
        enabled: true,
        url: "https://nyaa.si".to_string(),
        category: "1_2".to_string(),
        sort_by_seeders: true,
        via_gateway: false,
    }
}

fn default_sukebei() -> HtmlSourceConfig {
    HtmlSourceConfig {
        enabled: true,
        url: "https://sukebei.nyaa.si".to_string(),
        category: "0_0".to_string(),
        sort_by_seeders: true,
        via_gateway: true,
    }
}

fn default_animetosho() -> JsonSourceConfig {
    JsonSourceConfig {
        enabled: true,
        url: "https://feed.animetosho.org/json".to_string(),
    }
}

fn default_seadex() -> JsonSourceConfig {
    JsonSourceConfig {
        enabled: true,
        url: "https://releases.moe/api/collections/entries/records".to_string(),
    }
}

/// Sanitized config for API responses (credentials in URLs redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub sources: SanitizedSourcesConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourcesConfig {
    pub timeout_secs: u64,
    pub gateway_configured: bool,
    pub enabled: Vec<SanitizedSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSource {
    pub id: String,
    pub url: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            gateway: config.gateway.clone(),
            sources: SanitizedSourcesConfig {
                timeout_secs: config.sources.timeout_secs,
                gateway_configured: config.sources.gateway_url.is_some(),
                enabled: config
                    .sources
                    .enabled_urls()
                    .into_iter()
                    .map(|(id, url)| SanitizedSource {
                        id: id.to_string(),
                        url: strip_credentials(url),
                    })
                    .collect(),
            },
        }
    }
}

/// Drop `user:pass@` from a URL, if present.
fn strip_credentials(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let authority_end = rest.find('/').unwrap_or(rest.len());
            match rest[..authority_end].rfind('@') {
                Some(at) => format!("{}://{}", scheme, &rest[at + 1..]),
                None => url.to_string(),
            }
        }
        None => url.to_string(),
    }
}
