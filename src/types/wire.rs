//! Microsoft Graph request and response bodies.

use serde::{Deserialize, Serialize};

/// `@odata.type` discriminator of a file attachment.
pub const FILE_ATTACHMENT_ODATA_TYPE: &str = "#microsoft.graph.fileAttachment";

/// Graph `emailAddress` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAddress {
    /// Address.
    pub address: String,
    /// Display name (empty when unknown).
    #[serde(default)]
    pub name: String,
}

/// Graph `recipient` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// The wrapped address.
    pub email_address: WireAddress,
}

/// Graph `itemBody` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    /// `"html"` or `"text"`.
    pub content_type: String,
    /// Body content.
    pub content: String,
}

/// Graph `fileAttachment` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    /// Always [`FILE_ATTACHMENT_ODATA_TYPE`].
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    /// File name.
    pub name: String,
    /// MIME content type.
    pub content_type: String,
    /// Base64 (standard alphabet) content.
    pub content_bytes: String,
    /// Content id; omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

/// Graph `message` resource as sent by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Sender.
    pub from: Recipient,
    /// Primary recipients.
    pub to_recipients: Vec<Recipient>,
    /// CC recipients.
    pub cc_recipients: Vec<Recipient>,
    /// BCC recipients.
    pub bcc_recipients: Vec<Recipient>,
    /// Reply-to addresses.
    pub reply_to: Vec<Recipient>,
    /// Subject.
    pub subject: String,
    /// Body.
    pub body: ItemBody,
    /// Inline attachments; the key is absent when not inlined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<FileAttachment>>,
}

/// A request payload in either of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WirePayload {
    /// Unwrapped resource body for draft creation.
    Draft(WireMessage),
    /// `{ "message": ... }` body for `sendMail`.
    SendMail {
        /// The wrapped message.
        message: WireMessage,
    },
}

impl WirePayload {
    /// The message resource regardless of wrapping.
    pub fn message(&self) -> &WireMessage {
        match self {
            WirePayload::Draft(message) | WirePayload::SendMail { message } => message,
        }
    }

    /// Whether the payload is wrapped under `message`.
    pub fn is_wrapped(&self) -> bool {
        matches!(self, WirePayload::SendMail { .. })
    }
}

/// Body of `createUploadSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSessionRequest {
    /// The attachment being uploaded.
    #[serde(rename = "AttachmentItem")]
    pub attachment_item: AttachmentItem,
}

/// Graph `attachmentItem` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentItem {
    /// Always `"file"` here.
    pub attachment_type: String,
    /// File name.
    pub name: String,
    /// Exact size in bytes.
    pub size: u64,
}

impl AttachmentItem {
    /// A file attachment item.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            attachment_type: "file".to_string(),
            name: name.into(),
            size,
        }
    }
}

/// Message resource returned by Graph (only the fields this client reads).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResource {
    /// Message id.
    pub id: String,
    /// Whether the message is still a draft.
    #[serde(default)]
    pub is_draft: Option<bool>,
    /// Web link to the message.
    #[serde(default)]
    pub web_link: Option<String>,
}

/// Attachment resource returned by Graph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResource {
    /// Attachment id.
    #[serde(default)]
    pub id: Option<String>,
    /// Attachment name.
    #[serde(default)]
    pub name: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: Option<u64>,
}

/// Upload session returned by `createUploadSession`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    /// Pre-authorised URL fragments are PUT to.
    pub upload_url: String,
    /// Session expiry as reported by the server.
    #[serde(default)]
    pub expiration_date_time: Option<String>,
    /// Ranges the server still expects, e.g. `["0-"]`.
    #[serde(default)]
    pub next_expected_ranges: Vec<String>,
}

/// Graph error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorResponse {
    /// Error detail.
    pub error: GraphErrorDetail,
}

/// Graph error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorDetail {
    /// Machine-readable code, e.g. `ErrorInvalidRecipients`.
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}
