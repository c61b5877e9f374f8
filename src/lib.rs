//! Office 365 Mail Integration Module
//!
//! Sends mail through the Microsoft Graph API as an application
//! (client-credentials flow), handling Graph's request size limits.
//!
//! # Features
//!
//! - **Simple sends**: messages under 4 MB go out in one `sendMail` request
//! - **Large sends**: bigger messages are created as a draft, receive their
//!   attachments one by one and are then sent
//! - **Upload sessions**: attachments over 3 MB are uploaded in 4 MiB
//!   fragments with `Content-Range`
//! - **Typed errors**: Graph failures mapped to an error taxonomy; a failed
//!   large send reports the draft it left behind
//! - **Authentication**: client credentials against the Microsoft identity
//!   platform, or a token obtained elsewhere
//!
//! # Example
//!
//! ```no_run
//! use integrations_office365::{Attachment, Message, Office365Client, Office365Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Office365Config::from_env()?;
//! let client = Office365Client::connect(config).await?;
//!
//! let message = Message::builder()
//!     .from("Reports <reports@contoso.com>")?
//!     .to("adele@contoso.com")?
//!     .subject("Quarterly report")
//!     .html("<p>Attached.</p>")
//!     .attachment(Attachment::new("report.pdf", "application/pdf", std::fs::read("report.pdf")?))
//!     .build()?;
//!
//! let sent = client.send(&message).await?;
//! println!("sent via {:?} ({:.2} MB)", sent.strategy, sent.estimated_size_mb);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod mailer;
pub mod observability;
pub mod services;
pub mod transport;
pub mod types;

/// Mock implementations and fixtures for tests.
pub mod mocks;

// Re-exports for convenience
pub use auth::{AccessToken, AuthProvider, ClientCredentialsProvider, StaticTokenProvider};
pub use client::Office365Client;
pub use config::{Office365Config, Office365ConfigBuilder};
pub use errors::{DeliveryError, Office365Error, Office365Result};
pub use mailer::MailTransport;
pub use services::{DraftState, SendStrategy, SentMessage};
pub use types::{Attachment, EmailAddress, Message, MessageBody, MessageBuilder};

/// Prelude module with commonly used types and traits.
///
/// ```no_run
/// use integrations_office365::prelude::*;
/// ```
pub mod prelude {
    // Client
    pub use crate::client::Office365Client;
    pub use crate::mailer::MailTransport;

    // Configuration
    pub use crate::config::{Office365Config, Office365ConfigBuilder};

    // Authentication
    pub use crate::auth::{AccessToken, AuthProvider, ClientCredentialsProvider, StaticTokenProvider};

    // Services
    pub use crate::services::{
        AttachmentUploader, DraftState, MailService, SendStrategy, SentMessage,
    };

    // Message types
    pub use crate::types::{Attachment, EmailAddress, Message, MessageBody, MessageBuilder};

    // Errors
    pub use crate::errors::{DeliveryError, Office365Error, Office365Result};
}
