//! Configuration for the Office 365 mail client.

use crate::auth::{AuthProvider, ClientCredentialsProvider};
use crate::errors::{ConfigurationError, Office365Error, Office365Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default base URL for Microsoft Graph.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0/";

/// Default timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a single upload fragment.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(1000);

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable names read by [`Office365Config::from_env`].
pub mod env {
    /// Directory (tenant) id or domain.
    pub const TENANT: &str = "OFFICE365MAIL_TENANT";
    /// Application (client) id.
    pub const CLIENT_ID: &str = "OFFICE365MAIL_CLIENT_ID";
    /// Client secret.
    pub const CLIENT_SECRET: &str = "OFFICE365MAIL_CLIENT_SECRET";
    /// Optional Graph base URL override.
    pub const BASE_URL: &str = "OFFICE365MAIL_BASE_URL";
    /// Optional API timeout in seconds.
    pub const TIMEOUT: &str = "OFFICE365MAIL_TIMEOUT";
}

/// Configuration for the Office 365 client.
#[derive(Clone)]
pub struct Office365Config {
    /// Authentication provider.
    pub auth_provider: Arc<dyn AuthProvider>,

    /// Base URL for the API. Always ends with `/`.
    pub base_url: Url,

    /// Timeout for API calls.
    pub timeout: Duration,

    /// Timeout for each upload fragment PUT.
    pub upload_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl Office365Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Office365ConfigBuilder {
        Office365ConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OFFICE365MAIL_TENANT` (required)
    /// - `OFFICE365MAIL_CLIENT_ID` (required)
    /// - `OFFICE365MAIL_CLIENT_SECRET` (required)
    /// - `OFFICE365MAIL_BASE_URL` (optional)
    /// - `OFFICE365MAIL_TIMEOUT` (optional, seconds)
    pub fn from_env() -> Office365Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Office365Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                Office365Error::Configuration(ConfigurationError::MissingCredentials(format!(
                    "{} environment variable not set",
                    key
                )))
            })
        };

        let tenant = required(env::TENANT)?;
        let client_id = required(env::CLIENT_ID)?;
        let client_secret = required(env::CLIENT_SECRET)?;

        let mut builder = Office365ConfigBuilder::new().auth_provider(
            ClientCredentialsProvider::new_with_strings(tenant, client_id, client_secret),
        );

        if let Some(base_url) = lookup(env::BASE_URL) {
            builder = builder.base_url(base_url);
        }

        if let Some(timeout_secs) = lookup(env::TIMEOUT).and_then(|s| s.parse::<u64>().ok()) {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }

        builder.build()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Office365Result<()> {
        match self.base_url.scheme() {
            "https" => {}
            "http" if is_loopback(&self.base_url) => {}
            _ => {
                return Err(Office365Error::Configuration(
                    ConfigurationError::InvalidConfiguration(
                        "Base URL must use HTTPS".to_string(),
                    ),
                ));
            }
        }

        if self.timeout.is_zero() || self.upload_timeout.is_zero() {
            return Err(Office365Error::Configuration(
                ConfigurationError::InvalidConfiguration(
                    "Timeouts must be greater than zero".to_string(),
                ),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for Office365Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Office365Config")
            .field("auth_provider", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("upload_timeout", &self.upload_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Builder for Office365Config.
pub struct Office365ConfigBuilder {
    auth_provider: Option<Arc<dyn AuthProvider>>,
    base_url: Option<String>,
    timeout: Duration,
    upload_timeout: Duration,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl Office365ConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            auth_provider: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Sets the authentication provider.
    pub fn auth_provider<A: AuthProvider + 'static>(mut self, provider: A) -> Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the per-fragment upload timeout.
    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Office365Result<Office365Config> {
        let auth_provider = self.auth_provider.ok_or_else(|| {
            Office365Error::Configuration(ConfigurationError::MissingCredentials(
                "Authentication provider is required".to_string(),
            ))
        })?;

        let raw_base = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // Url::join drops the last segment unless the base ends with a slash.
        let normalized = if raw_base.ends_with('/') {
            raw_base
        } else {
            format!("{}/", raw_base)
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            Office365Error::Configuration(ConfigurationError::InvalidUrl(format!(
                "{}: {}",
                normalized, e
            )))
        })?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("integrations-office365/{}", env!("CARGO_PKG_VERSION")));

        let config = Office365Config {
            auth_provider,
            base_url,
            timeout: self.timeout,
            upload_timeout: self.upload_timeout,
            connect_timeout: self.connect_timeout,
            user_agent,
        };

        config.validate()?;

        Ok(config)
    }
}

impl Default for Office365ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Office365Config::builder()
            .auth_provider(StaticTokenProvider::bearer("token"))
            .build()
            .unwrap();

        assert_eq!(config.base_url.as_str(), "https://graph.microsoft.com/v1.0/");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.upload_timeout, Duration::from_secs(1000));
        assert!(config.user_agent.starts_with("integrations-office365/"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = Office365Config::builder()
            .auth_provider(StaticTokenProvider::bearer("token"))
            .base_url("https://graph.microsoft.us/v1.0")
            .build()
            .unwrap();

        assert_eq!(config.base_url.as_str(), "https://graph.microsoft.us/v1.0/");
    }

    #[test]
    fn test_plain_http_only_for_loopback() {
        let local = Office365Config::builder()
            .auth_provider(StaticTokenProvider::bearer("token"))
            .base_url("http://127.0.0.1:9000/v1.0")
            .build();
        assert!(local.is_ok());

        let remote = Office365Config::builder()
            .auth_provider(StaticTokenProvider::bearer("token"))
            .base_url("http://graph.example.com/v1.0")
            .build();
        assert!(remote.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Office365Config::builder()
            .auth_provider(StaticTokenProvider::bearer("token"))
            .upload_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_auth_provider() {
        let result = Office365Config::builder().build();
        assert!(matches!(
            result,
            Err(Office365Error::Configuration(
                ConfigurationError::MissingCredentials(_)
            ))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (env::TENANT, "contoso"),
            (env::CLIENT_ID, "client"),
            (env::CLIENT_SECRET, "secret"),
            (env::TIMEOUT, "45"),
        ]
        .into_iter()
        .collect();

        let config =
            Office365Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_from_lookup_missing_secret() {
        let result = Office365Config::from_lookup(|k| match k {
            env::TENANT => Some("contoso".to_string()),
            env::CLIENT_ID => Some("client".to_string()),
            _ => None,
        });

        let err = result.unwrap_err();
        assert!(err.to_string().contains(env::CLIENT_SECRET));
    }

    #[test]
    fn test_debug_hides_provider() {
        let config = Office365Config::builder()
            .auth_provider(StaticTokenProvider::bearer("super-secret-token"))
            .build()
            .unwrap();
        assert!(!format!("{:?}", config).contains("super-secret-token"));
    }
}
