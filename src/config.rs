//! Proxy configuration
//!
//! Configuration is loaded from environment variables with defaults, then
//! overridden by command-line flags.

use std::net::SocketAddr;

use thiserror::Error;

use crate::credentials::Credentials;

/// Default upstream seller API
pub const DEFAULT_BASE_URL: &str = "https://api-seller.ozon.ru";

/// Default listen address of the proxy
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Errors that can occur when building the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The listen address could not be parsed
    #[error("Invalid bind address '{value}': {source}")]
    InvalidBind {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// The upstream URL is not http(s)
    #[error("Invalid upstream URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),
}

/// Settings for the credential-injecting proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Upstream seller API origin, without trailing slash
    pub base_url: String,
    /// Credentials used when a request carries none
    pub credentials: Credentials,
    /// Address the proxy listens on
    pub bind: SocketAddr,
}

impl ProxyConfig {
    /// Create ProxyConfig from environment variables.
    ///
    /// Environment variables:
    /// - `OZON_BASE_URL`: upstream origin (default: https://api-seller.ozon.ru)
    /// - `OZON_CLIENT_ID`: fallback client id (default: empty)
    /// - `OZON_API_KEY`: fallback API key (default: empty)
    /// - `SWRKIT_BIND`: listen address (default: 127.0.0.1:8787)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("OZON_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let credentials = Credentials::new(
            lookup("OZON_CLIENT_ID").unwrap_or_default(),
            lookup("OZON_API_KEY").unwrap_or_default(),
        );
        let bind = lookup("SWRKIT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());

        Self::new(base_url, credentials, &bind)
    }

    /// Validates and assembles a configuration
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        bind: &str,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }
        let bind = bind.parse().map_err(|source| ConfigError::InvalidBind {
            value: bind.to_string(),
            source,
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            bind,
        })
    }

    /// Applies command-line overrides on top of the loaded values
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        bind: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(base_url) = base_url {
            self = Self::new(base_url, self.credentials, &self.bind.to_string())?;
        }
        if let Some(bind) = bind {
            self = Self::new(self.base_url, self.credentials, &bind)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ProxyConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.credentials.is_empty());
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_values_from_environment() {
        let config = ProxyConfig::from_lookup(lookup_from(&[
            ("OZON_BASE_URL", "http://upstream.test/"),
            ("OZON_CLIENT_ID", "777"),
            ("OZON_API_KEY", "k"),
            ("SWRKIT_BIND", "0.0.0.0:9000"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://upstream.test");
        assert_eq!(config.credentials, Credentials::new("777", "k"));
        assert_eq!(config.bind.port(), 9000);
    }

    #[test]
    fn test_invalid_bind_is_error() {
        let result = ProxyConfig::from_lookup(lookup_from(&[("SWRKIT_BIND", "nowhere")]));

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBind { .. }));
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_invalid_base_url_is_error() {
        let result = ProxyConfig::from_lookup(lookup_from(&[("OZON_BASE_URL", "ftp://x")]));

        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_overrides_replace_loaded_values() {
        let config = ProxyConfig::from_lookup(lookup_from(&[("OZON_CLIENT_ID", "1")]))
            .unwrap()
            .with_overrides(
                Some("https://sandbox.test".to_string()),
                Some("127.0.0.1:1234".to_string()),
            )
            .unwrap();

        assert_eq!(config.base_url, "https://sandbox.test");
        assert_eq!(config.bind.port(), 1234);
        assert_eq!(config.credentials.client_id, "1");
    }
}
