//! Authentication providers for Microsoft Graph.
//!
//! The mail client authenticates as an application (no signed-in user) using the
//! OAuth 2.0 client credentials grant against the Microsoft identity platform.
//!
//! # Example
//!
//! ```no_run
//! use integrations_office365::auth::{AuthProvider, ClientCredentialsProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ClientCredentialsProvider::new_with_strings(
//!     "contoso.onmicrosoft.com",
//!     "11111111-2222-3333-4444-555555555555",
//!     "client_secret",
//! );
//!
//! let token = provider.get_access_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::errors::AuthenticationError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default Microsoft identity platform authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Scope requesting every application permission granted to the client on Graph.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Authentication provider abstraction.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get an access token for API requests.
    async fn get_access_token(&self) -> Result<AccessToken, AuthenticationError>;
}

/// Access token with metadata.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The token string.
    pub token: SecretString,

    /// Token type (usually "Bearer").
    pub token_type: String,

    /// Expiration time, when the issuer reported one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a new access token.
    pub fn new(
        token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            token: SecretString::new(token.into()),
            token_type: token_type.into(),
            expires_at,
        }
    }

    /// Creates a bearer token with no known expiry.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(token, "Bearer", None)
    }

    /// Checks if the token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |at| Utc::now() >= at)
    }

    /// Returns the authorization header value.
    ///
    /// Graph expects the `Bearer` scheme regardless of the casing the
    /// token endpoint reports.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

/// Client credentials provider for the Microsoft identity platform.
///
/// Every call to [`AuthProvider::get_access_token`] performs a fresh token
/// request; nothing is cached here. [`crate::Office365Client`] calls it once
/// per client instance.
pub struct ClientCredentialsProvider {
    tenant: String,
    client_id: String,
    client_secret: SecretString,
    authority: String,
    scope: String,
    http_client: Client,
}

impl ClientCredentialsProvider {
    /// Creates a new client credentials provider.
    pub fn new(
        tenant: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            client_id: client_id.into(),
            client_secret,
            authority: DEFAULT_AUTHORITY.to_string(),
            scope: GRAPH_DEFAULT_SCOPE.to_string(),
            http_client: Client::new(),
        }
    }

    /// Creates a new provider with a string secret.
    pub fn new_with_strings(
        tenant: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::new(tenant, client_id, SecretString::new(client_secret.into()))
    }

    /// Sets a custom authority (sovereign clouds, tests).
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the token endpoint URL for the configured tenant.
    pub fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant)
    }

    async fn request_token(&self) -> Result<AccessToken, AuthenticationError> {
        #[derive(Serialize)]
        struct TokenRequest<'a> {
            client_id: &'a str,
            client_secret: &'a str,
            scope: &'a str,
            grant_type: &'a str,
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default = "default_token_type")]
            token_type: String,
            expires_in: Option<i64>,
        }

        #[derive(Deserialize)]
        struct TokenErrorResponse {
            error: String,
            error_description: Option<String>,
        }

        fn default_token_type() -> String {
            "Bearer".to_string()
        }

        let request = TokenRequest {
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
            scope: &self.scope,
            grant_type: "client_credentials",
        };

        let body = serde_urlencoded::to_string(&request).map_err(|e| {
            AuthenticationError::TokenRequestFailed(format!("Failed to encode request: {}", e))
        })?;

        debug!(tenant = %self.tenant, client_id = %self.client_id, "Requesting access token");

        let response = self
            .http_client
            .post(self.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                AuthenticationError::TokenRequestFailed(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Token request rejected");

            let detail = serde_json::from_str::<TokenErrorResponse>(&text).ok();
            return Err(match detail {
                Some(d) if d.error == "invalid_client" || d.error == "unauthorized_client" => {
                    AuthenticationError::InvalidClient(
                        d.error_description.unwrap_or(d.error),
                    )
                }
                Some(d) => AuthenticationError::TokenRequestFailed(format!(
                    "Token request failed with status {}: {}",
                    status,
                    d.error_description.unwrap_or(d.error)
                )),
                None => AuthenticationError::TokenRequestFailed(format!(
                    "Token request failed with status {}: {}",
                    status, text
                )),
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            AuthenticationError::TokenRequestFailed(format!("Failed to parse response: {}", e))
        })?;

        let expires_at = token_response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(AccessToken::new(
            token_response.access_token,
            token_response.token_type,
            expires_at,
        ))
    }
}

#[async_trait]
impl AuthProvider for ClientCredentialsProvider {
    async fn get_access_token(&self) -> Result<AccessToken, AuthenticationError> {
        self.request_token().await
    }
}

impl std::fmt::Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsProvider")
            .field("tenant", &self.tenant)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authority", &self.authority)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Provider for a token obtained elsewhere.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Wraps an existing token.
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    /// Wraps a raw bearer token string.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(AccessToken::bearer(token))
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn get_access_token(&self) -> Result<AccessToken, AuthenticationError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_expiry() {
        let expires_at = Utc::now() + Duration::hours(1);
        let token = AccessToken::new("test_token", "Bearer", Some(expires_at));
        assert!(!token.is_expired());

        let expired = Utc::now() - Duration::hours(1);
        let token = AccessToken::new("test_token", "Bearer", Some(expired));
        assert!(token.is_expired());

        let token = AccessToken::bearer("test_token");
        assert!(!token.is_expired());
    }

    #[test]
    fn test_authorization_header() {
        let token = AccessToken::new("test_token", "bearer", None);
        assert_eq!(token.authorization_header(), "Bearer test_token");
    }

    #[test]
    fn test_token_url() {
        let provider = ClientCredentialsProvider::new_with_strings("contoso", "id", "secret");
        assert_eq!(
            provider.token_url(),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );

        let provider = provider.with_authority("http://127.0.0.1:8080/");
        assert_eq!(
            provider.token_url(),
            "http://127.0.0.1:8080/contoso/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let provider = ClientCredentialsProvider::new_with_strings("t", "id", "hunter2");
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::bearer("abc");
        let token = provider.get_access_token().await.unwrap();
        assert_eq!(token.token.expose_secret(), "abc");
        assert_eq!(provider.token.token_type, "Bearer");
    }
}
