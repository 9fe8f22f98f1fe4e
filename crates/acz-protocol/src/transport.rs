//! HTTP transport for content retrieval
//!
//! Wraps a shared reqwest client. Timeouts and cancellation are enforced
//! here; the protocol layers above only see completed requests or errors.

use reqwest::{Client, ClientBuilder};
use std::sync::{Arc, Once};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ContentError, Result};

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the ring rustls provider once per process
///
/// reqwest is built without a default provider, so one must be installed
/// before the first TLS client is created.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Fails only if another provider is already installed, which is fine
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// HTTP transport client
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        ensure_crypto_provider();

        let mut builder = ClientBuilder::new()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(config.tcp_nodelay)
            .tcp_keepalive(config.tcp_keepalive)
            .redirect(reqwest::redirect::Policy::limited(3))
            .user_agent(config.user_agent.clone());

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(ContentError::Client)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Whole-request timeout, body included; `None` disables it
    pub timeout: Option<Duration>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Enable `TCP_NODELAY`
    pub tcp_nodelay: bool,

    /// TCP keep-alive duration
    pub tcp_keepalive: Option<Duration>,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 4,
            timeout: Some(Duration::from_secs(120)),
            connect_timeout: Duration::from_secs(10),
            tcp_nodelay: true,
            tcp_keepalive: Some(Duration::from_secs(60)),
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&ClientConfig> for HttpConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timeout: config.request_timeout,
            connect_timeout: config.connect_timeout,
            user_agent: config.user_agent.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new().is_ok());

        let config = HttpConfig {
            timeout: None,
            ..HttpConfig::default()
        };
        assert!(HttpClient::with_config(&config).is_ok());
    }

    #[test]
    fn test_config_from_client_config() {
        let client_config = ClientConfig {
            connect_timeout: Duration::from_secs(3),
            request_timeout: Some(Duration::from_secs(7)),
            user_agent: "test-agent".to_string(),
            ..ClientConfig::default()
        };

        let config = HttpConfig::from(&client_config);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.timeout, Some(Duration::from_secs(7)));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.pool_max_idle_per_host, 4);
    }
}
