//! Configuration structures for the content client

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// `User-Agent` sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("acz-protocol/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection timeout
    pub connect_timeout: Duration,

    /// Whole-request timeout, including reading the response body
    pub request_timeout: Option<Duration>,

    /// Ask for zstd `Content-Encoding` on manifest and download responses
    pub accept_zstd: bool,

    /// Check the download endpoint's supported protocol range before downloading
    pub probe_protocol: bool,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Some(Duration::from_secs(120)),
            accept_zstd: true,
            probe_protocol: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads `ACZ_CONNECT_TIMEOUT` and `ACZ_REQUEST_TIMEOUT` (seconds, 0
    /// disables the request timeout), `ACZ_ACCEPT_ZSTD`, `ACZ_PROBE_PROTOCOL`
    /// and `ACZ_USER_AGENT`. Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let request_timeout = match parsed::<u64>(&lookup, "ACZ_REQUEST_TIMEOUT") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_timeout,
        };

        Self {
            connect_timeout: parsed(&lookup, "ACZ_CONNECT_TIMEOUT")
                .map_or(defaults.connect_timeout, Duration::from_secs),
            request_timeout,
            accept_zstd: lookup("ACZ_ACCEPT_ZSTD")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.accept_zstd),
            probe_protocol: lookup("ACZ_PROBE_PROTOCOL")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.probe_protocol),
            user_agent: lookup("ACZ_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(120)));
        assert!(config.accept_zstd);
        assert!(!config.probe_protocol);
        assert!(config.user_agent.starts_with("acz-protocol/"));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("ACZ_CONNECT_TIMEOUT", "3"),
            ("ACZ_REQUEST_TIMEOUT", "0"),
            ("ACZ_ACCEPT_ZSTD", "off"),
            ("ACZ_PROBE_PROTOCOL", "yes"),
            ("ACZ_USER_AGENT", "launcher/2"),
        ]));

        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.request_timeout, None);
        assert!(!config.accept_zstd);
        assert!(config.probe_protocol);
        assert_eq!(config.user_agent, "launcher/2");
    }

    #[test]
    fn test_env_garbage_keeps_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("ACZ_CONNECT_TIMEOUT", "soon"),
            ("ACZ_ACCEPT_ZSTD", "maybe"),
        ]));

        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.accept_zstd);
    }

    #[test]
    fn test_serde_partial() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"probe_protocol": true}"#).expect("valid config");
        assert!(config.probe_protocol);
        assert!(config.accept_zstd);
    }
}
