use std::collections::HashSet;

use reqwest::Url;

use super::GatewayError;

/// Fixed set of hostnames the gateway may fetch.
#[derive(Debug, Clone)]
pub struct Allowlist {
    hosts: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Parse `target` and check its host. Unparseable targets count as not
    /// allowed.
    pub fn check(&self, target: &str) -> Result<Url, GatewayError> {
        let url = Url::parse(target)
            .map_err(|_| GatewayError::HostNotAllowed(target.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(GatewayError::HostNotAllowed(target.to_string()));
        }

        match url.host_str() {
            Some(host) if self.hosts.contains(&host.to_ascii_lowercase()) => Ok(url),
            Some(host) => Err(GatewayError::HostNotAllowed(host.to_string())),
            None => Err(GatewayError::HostNotAllowed(target.to_string())),
        }
    }

    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.hosts.iter().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}
