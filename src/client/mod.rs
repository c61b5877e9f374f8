//! Office 365 mail client implementation.

use crate::auth::AuthProvider;
use crate::config::Office365Config;
use crate::errors::{Office365Error, Office365Result};
use crate::services::{MailService, SentMessage};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::Message;
use std::sync::Arc;
use tracing::debug;

mod executor;
pub use executor::RequestExecutor;

/// Office 365 mail client.
///
/// Fetches one access token when it is created and uses it for every
/// request it makes. The token is not refreshed: once it expires, calls fail
/// with an expired-token error and a new client has to be created. Clients
/// are cheap to create and share nothing with each other.
pub struct Office365Client {
    /// Configuration.
    config: Office365Config,
    /// Request executor (auth, error mapping, logging).
    executor: Arc<RequestExecutor>,
}

impl Office365Client {
    /// Creates a client over reqwest, fetching its access token.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use integrations_office365::{ClientCredentialsProvider, Office365Client, Office365Config};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let auth = ClientCredentialsProvider::new_with_strings(
    ///     "contoso.onmicrosoft.com",
    ///     "client_id",
    ///     "client_secret",
    /// );
    ///
    /// let config = Office365Config::builder()
    ///     .auth_provider(auth)
    ///     .build()?;
    ///
    /// let client = Office365Client::connect(config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: Office365Config) -> Office365Result<Self> {
        let transport = ReqwestTransport::new(config.connect_timeout, &config.user_agent)
            .map_err(|e| {
                Office365Error::configuration(format!("Failed to create transport: {}", e))
            })?;

        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Creates a client over the given transport, fetching its access token.
    pub async fn with_transport(
        config: Office365Config,
        transport: Arc<dyn HttpTransport>,
    ) -> Office365Result<Self> {
        config.validate()?;

        let auth: Arc<dyn AuthProvider> = config.auth_provider.clone();
        let token = auth.get_access_token().await?;

        debug!(expires_at = ?token.expires_at, "Access token acquired");

        let executor = Arc::new(RequestExecutor::new(config.clone(), transport, token));

        Ok(Self { config, executor })
    }

    /// Access the mail service.
    pub fn mail(&self) -> MailService {
        MailService::new(self.executor.clone())
    }

    /// Sends a message. Shorthand for `client.mail().send(message)`.
    pub async fn send(&self, message: &Message) -> Office365Result<SentMessage> {
        self.mail().send(message).await
    }

    /// Gets the base URL for the API.
    pub fn base_url(&self) -> &str {
        self.config.base_url.as_str()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &Office365Config {
        &self.config
    }

    /// Gets the request executor (for advanced use cases).
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }
}
