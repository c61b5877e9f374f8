//! Mock implementations for testing.
//!
//! This module provides mock implementations of the client's collaborators
//! plus canned Graph responses.

mod auth;
mod transport;

pub use auth::MockAuthProvider;
pub use transport::{MockResponse, MockTransport};

use crate::types::{Attachment, EmailAddress, Message, MessageBody};
use reqwest::StatusCode;
use serde_json::json;

/// Test fixtures for mail operations.
pub struct TestFixtures;

impl TestFixtures {
    /// Sender mailbox used by the fixtures.
    pub const SENDER: &'static str = "sender@contoso.com";

    /// Upload URL returned by [`TestFixtures::upload_session`].
    pub const UPLOAD_URL: &'static str =
        "https://upload.contoso.test/api/v2.0/Users('sender')/Messages('draft')/AttachmentSessions('s1')?authtoken=abc";

    /// A text message with two recipients and no attachments.
    pub fn sample_message() -> Message {
        Self::message_with(Vec::new())
    }

    /// The sample message carrying `attachments`.
    pub fn message_with(attachments: Vec<Attachment>) -> Message {
        Message {
            from: Self::address(Self::SENDER),
            to: vec![
                Self::address("alice@contoso.com"),
                Self::address("bob@contoso.com"),
            ],
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            subject: "Fixture".to_string(),
            body: MessageBody::Text("Hello from the fixtures".to_string()),
            attachments,
        }
    }

    fn address(address: &str) -> EmailAddress {
        EmailAddress {
            address: address.to_string(),
            name: None,
        }
    }

    /// An attachment of `len` bytes with a repeating byte pattern.
    pub fn attachment(name: &str, len: usize) -> Attachment {
        let content: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        Attachment::from_bytes(name, content)
    }

    /// Draft message resource.
    pub fn draft_created(id: &str) -> MockResponse {
        MockResponse::created(json!({
            "id": id,
            "isDraft": true,
            "webLink": format!("https://outlook.office365.com/owa/?ItemID={}", id)
        }))
    }

    /// Attachment resource returned by an inline attach.
    pub fn attachment_created(name: &str) -> MockResponse {
        MockResponse::created(json!({
            "@odata.type": "#microsoft.graph.fileAttachment",
            "id": "att-1",
            "name": name,
            "size": 1024
        }))
    }

    /// Upload session pointing at [`TestFixtures::UPLOAD_URL`].
    pub fn upload_session() -> MockResponse {
        MockResponse::json(
            StatusCode::OK,
            json!({
                "uploadUrl": Self::UPLOAD_URL,
                "expirationDateTime": "2030-01-01T00:00:00Z",
                "nextExpectedRanges": ["0-"]
            }),
        )
    }

    /// Response to an intermediate fragment.
    pub fn fragment_accepted(next_start: u64) -> MockResponse {
        MockResponse::json(
            StatusCode::OK,
            json!({
                "expirationDateTime": "2030-01-01T00:00:00Z",
                "nextExpectedRanges": [format!("{}-", next_start)]
            }),
        )
    }

    /// Response to the final fragment.
    pub fn fragment_completed() -> MockResponse {
        MockResponse::new(StatusCode::CREATED)
    }

    /// Graph error envelope.
    pub fn graph_error(status: StatusCode, code: &str, message: &str) -> MockResponse {
        MockResponse::json(
            status,
            json!({ "error": { "code": code, "message": message } }),
        )
    }
}
