//! Outbound message model.

use crate::errors::{Office365Error, Office365Result, RequestError};
use bytes::Bytes;
use std::fmt;

/// Bytes per megabyte, as used for every size decision in this crate.
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Email address with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    /// Email address (e.g., "adele@contoso.com").
    pub address: String,
    /// Display name (e.g., "Adele Vance").
    pub name: Option<String>,
}

impl EmailAddress {
    /// Creates an address without display name.
    pub fn new(address: impl Into<String>) -> Office365Result<Self> {
        let address = address.into();
        Self::validate(&address)?;
        Ok(Self {
            address,
            name: None,
        })
    }

    /// Creates an address with a display name.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Office365Result<Self> {
        let address = address.into();
        Self::validate(&address)?;
        Ok(Self {
            address,
            name: Some(name.into()),
        })
    }

    /// Parses `"Name <address>"` or a bare address.
    pub fn parse(s: &str) -> Office365Result<Self> {
        let s = s.trim();

        if let (Some(start), Some(end)) = (s.find('<'), s.rfind('>')) {
            if start < end {
                let name = s[..start].trim().trim_matches('"');
                let address = s[start + 1..end].trim();
                return if name.is_empty() {
                    Self::new(address)
                } else {
                    Self::with_name(name, address)
                };
            }
        }

        Self::new(s)
    }

    fn validate(address: &str) -> Office365Result<()> {
        if address.is_empty() {
            return Err(RequestError::InvalidAddress("address cannot be empty".to_string()).into());
        }

        let mut parts = address.split('@');
        let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            _ => {
                return Err(RequestError::InvalidAddress(format!(
                    "{} must contain exactly one @",
                    address
                ))
                .into())
            }
        };

        if local.is_empty() || domain.is_empty() {
            return Err(RequestError::InvalidAddress(format!(
                "{} has an empty local part or domain",
                address
            ))
            .into());
        }

        if address.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(RequestError::InvalidAddress(format!(
                "{} contains whitespace or control characters",
                address
            ))
            .into());
        }

        Ok(())
    }

    /// Returns the display name, or an empty string.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = Office365Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        EmailAddress::parse(s)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = Office365Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        EmailAddress::parse(&s)
    }
}

/// Message body. HTML takes precedence when both kinds are supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// HTML body.
    Html(String),
    /// Plain text body.
    Text(String),
}

impl MessageBody {
    /// The Graph `contentType` value.
    pub fn content_type(&self) -> &'static str {
        match self {
            MessageBody::Html(_) => "html",
            MessageBody::Text(_) => "text",
        }
    }

    /// The body content.
    pub fn content(&self) -> &str {
        match self {
            MessageBody::Html(content) | MessageBody::Text(content) => content,
        }
    }

    /// Picks the body from optional HTML and text parts.
    ///
    /// An empty HTML part counts as absent.
    pub fn resolve(html: Option<String>, text: Option<String>) -> Self {
        match html {
            Some(html) if !html.is_empty() => MessageBody::Html(html),
            _ => MessageBody::Text(text.unwrap_or_default()),
        }
    }
}

impl Default for MessageBody {
    fn default() -> Self {
        MessageBody::Text(String::new())
    }
}

/// File attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name.
    pub file_name: String,
    /// Declared MIME content type.
    pub content_type: String,
    /// Raw content.
    pub content: Bytes,
    /// Content id for `cid:` references from an HTML body.
    pub content_id: Option<String>,
}

impl Attachment {
    /// Creates a new attachment.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
            content_id: None,
        }
    }

    /// Creates an `application/octet-stream` attachment.
    pub fn from_bytes(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::new(file_name, "application/octet-stream", content)
    }

    /// Sets the content id used by inline (`cid:`) references.
    pub fn inline(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Size in megabytes.
    pub fn size_mb(&self) -> f64 {
        self.size() as f64 / BYTES_PER_MB
    }
}

/// Whether a message carries attachments.
#[derive(Debug, Clone, Copy)]
pub enum AttachmentPresence<'a> {
    /// No attachments.
    None,
    /// One or more attachments, in declared order.
    Some(&'a [Attachment]),
}

/// A fully assembled outbound message.
///
/// Built once through [`Message::builder`] and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The single sender. Also the mailbox every API call is addressed to.
    pub from: EmailAddress,
    /// Primary recipients.
    pub to: Vec<EmailAddress>,
    /// CC recipients.
    pub cc: Vec<EmailAddress>,
    /// BCC recipients.
    pub bcc: Vec<EmailAddress>,
    /// Reply-to addresses.
    pub reply_to: Vec<EmailAddress>,
    /// Subject line.
    pub subject: String,
    /// Body.
    pub body: MessageBody,
    /// Attachments in declared order.
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Creates a new message builder.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// The mailbox the message is sent from.
    pub fn mailbox(&self) -> &str {
        &self.from.address
    }

    /// Attachment presence as an exhaustive variant.
    pub fn attachment_presence(&self) -> AttachmentPresence<'_> {
        if self.attachments.is_empty() {
            AttachmentPresence::None
        } else {
            AttachmentPresence::Some(&self.attachments)
        }
    }
}

/// Builder for [`Message`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    from: Option<EmailAddress>,
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    bcc: Vec<EmailAddress>,
    reply_to: Vec<EmailAddress>,
    subject: String,
    html: Option<String>,
    text: Option<String>,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    /// Sets the sender.
    pub fn from<A>(mut self, address: A) -> Office365Result<Self>
    where
        A: TryInto<EmailAddress>,
        A::Error: Into<Office365Error>,
    {
        self.from = Some(address.try_into().map_err(Into::into)?);
        Ok(self)
    }

    /// Adds a primary recipient.
    pub fn to<A>(mut self, address: A) -> Office365Result<Self>
    where
        A: TryInto<EmailAddress>,
        A::Error: Into<Office365Error>,
    {
        self.to.push(address.try_into().map_err(Into::into)?);
        Ok(self)
    }

    /// Adds a CC recipient.
    pub fn cc<A>(mut self, address: A) -> Office365Result<Self>
    where
        A: TryInto<EmailAddress>,
        A::Error: Into<Office365Error>,
    {
        self.cc.push(address.try_into().map_err(Into::into)?);
        Ok(self)
    }

    /// Adds a BCC recipient.
    pub fn bcc<A>(mut self, address: A) -> Office365Result<Self>
    where
        A: TryInto<EmailAddress>,
        A::Error: Into<Office365Error>,
    {
        self.bcc.push(address.try_into().map_err(Into::into)?);
        Ok(self)
    }

    /// Adds a reply-to address.
    pub fn reply_to<A>(mut self, address: A) -> Office365Result<Self>
    where
        A: TryInto<EmailAddress>,
        A::Error: Into<Office365Error>,
    {
        self.reply_to.push(address.try_into().map_err(Into::into)?);
        Ok(self)
    }

    /// Sets the subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the HTML body.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the plain text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Adds an attachment.
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Builds the message.
    pub fn build(self) -> Office365Result<Message> {
        let from = self.from.ok_or(RequestError::MissingSender)?;

        Ok(Message {
            from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            reply_to: self.reply_to,
            subject: self.subject,
            body: MessageBody::resolve(self.html, self.text),
            attachments: self.attachments,
        })
    }
}
