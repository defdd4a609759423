use reqwest::Url;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Gateway cache capacity, timeout and rate limit are non-zero
/// - Gateway allowlist is not empty
/// - Source timeout is non-zero
/// - Every enabled source URL (and the gateway URL) parses as http(s)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Gateway validation
    let gateway = &config.gateway;
    if gateway.cache_max_entries == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.cache_max_entries cannot be 0".to_string(),
        ));
    }
    if gateway.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.timeout_secs cannot be 0".to_string(),
        ));
    }
    if gateway.rate_limit_rpm == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.rate_limit_rpm cannot be 0".to_string(),
        ));
    }
    if gateway.allowlist.iter().all(|host| host.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "gateway.allowlist cannot be empty".to_string(),
        ));
    }

    // Sources validation
    let sources = &config.sources;
    if sources.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sources.timeout_secs cannot be 0".to_string(),
        ));
    }
    if let Some(gateway_url) = &sources.gateway_url {
        validate_url("sources.gateway_url", gateway_url)?;
    }
    for (id, url) in sources.enabled_urls() {
        validate_url(&format!("sources.{}.url", id), url)?;
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::ValidationError(format!("{} is not a valid URL ({}): {}", field, value, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "{} must be http or https, got {}",
            field, other
        ))),
    }
}
