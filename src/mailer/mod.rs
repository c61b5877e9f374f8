//! Mailer transport seam.
//!
//! A host mail subsystem hands assembled messages to a [`MailTransport`] and
//! does not care which service delivers them.

use crate::client::Office365Client;
use crate::errors::Office365Result;
use crate::services::SentMessage;
use crate::types::Message;
use async_trait::async_trait;

/// Transport name reported by [`Office365Client`].
pub const TRANSPORT_NAME: &str = "O365";

/// A transport that can deliver a fully assembled message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers `message`.
    async fn send(&self, message: &Message) -> Office365Result<SentMessage>;

    /// Short identifier of the transport.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl MailTransport for Office365Client {
    async fn send(&self, message: &Message) -> Office365Result<SentMessage> {
        Office365Client::send(self, message).await
    }

    fn name(&self) -> &'static str {
        TRANSPORT_NAME
    }
}

impl std::fmt::Display for Office365Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(TRANSPORT_NAME)
    }
}
