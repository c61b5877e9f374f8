//! Mail sending service.

use super::payload::{build_payload, AttachmentMode, PayloadKind};
use super::size::{estimate_size_mb, SendStrategy};
use super::upload::{AttachmentDelivery, AttachmentUploader};
use super::{encode_segment, mailbox_path};
use crate::client::RequestExecutor;
use crate::errors::{DeliveryError, Office365Error, Office365Result};
use crate::types::{Message, MessageResource};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress of a draft on the large path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// Draft exists, no attachment delivered yet.
    Created,
    /// Attachments are being delivered.
    Attaching,
    /// Every attachment delivered, not yet sent.
    Attached,
    /// Dispatched.
    Sent,
}

/// A draft created on the server during a large send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Draft message id.
    pub id: String,
    /// Mailbox that owns the draft.
    pub mailbox: String,
    /// Current state.
    pub state: DraftState,
}

impl Draft {
    fn advance(&mut self, next: DraftState) {
        debug!(draft_id = %self.id, from = ?self.state, to = ?next, "Draft state");
        self.state = next;
    }

    fn fail(&self, source: Office365Error) -> Office365Error {
        warn!(
            draft_id = %self.id,
            state = ?self.state,
            error = %source,
            "Large send failed; draft left on server"
        );
        Office365Error::Delivery(DeliveryError {
            draft_id: self.id.clone(),
            state: self.state,
            source: Box::new(source),
        })
    }
}

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    /// Path that was taken.
    pub strategy: SendStrategy,
    /// Inline-everything size estimate that chose the path.
    pub estimated_size_mb: f64,
    /// Id of the dispatched draft on the large path.
    pub draft_id: Option<String>,
    /// How each attachment reached the draft, in declared order. Empty on
    /// the simple path.
    pub deliveries: Vec<AttachmentDelivery>,
}

/// Service for sending mail through Microsoft Graph.
pub struct MailService {
    executor: Arc<RequestExecutor>,
}

impl MailService {
    /// Creates a new mail service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Sends `message` as its sender.
    ///
    /// Messages whose inline-everything estimate is under 4 MB go out in one
    /// `sendMail` request. Larger ones are created as a draft, get their
    /// attachments delivered one by one and are then sent.
    ///
    /// A failure after the draft exists is reported as
    /// [`Office365Error::Delivery`] carrying the draft id and its state; the
    /// draft is not deleted.
    pub async fn send(&self, message: &Message) -> Office365Result<SentMessage> {
        let estimated_size_mb = estimate_size_mb(message)?;
        let strategy = SendStrategy::classify(estimated_size_mb);

        info!(
            mailbox = %message.mailbox(),
            attachments = message.attachments.len(),
            estimated_size_mb,
            strategy = ?strategy,
            "Sending message"
        );

        let (draft_id, deliveries) = match strategy {
            SendStrategy::Simple => {
                self.send_mail(message).await?;
                (None, Vec::new())
            }
            SendStrategy::Large => {
                let (draft_id, deliveries) = self.send_large(message).await?;
                (Some(draft_id), deliveries)
            }
        };

        Ok(SentMessage {
            strategy,
            estimated_size_mb,
            draft_id,
            deliveries,
        })
    }

    /// Sends in a single `sendMail` request with attachments inlined.
    pub async fn send_mail(&self, message: &Message) -> Office365Result<()> {
        let payload = build_payload(message, AttachmentMode::Inline, PayloadKind::SendMail);
        let path = format!("{}/sendMail", mailbox_path(message.mailbox()));

        self.executor.post_json_no_content(&path, &payload).await
    }

    /// Creates a draft without attachments.
    pub async fn create_draft(&self, message: &Message) -> Office365Result<Draft> {
        let payload = build_payload(message, AttachmentMode::Omit, PayloadKind::Draft);
        let path = format!("{}/messages", mailbox_path(message.mailbox()));

        let resource: MessageResource = self.executor.post_json(&path, &payload).await?;

        debug!(draft_id = %resource.id, "Draft created");

        Ok(Draft {
            id: resource.id,
            mailbox: message.mailbox().to_string(),
            state: DraftState::Created,
        })
    }

    /// Dispatches an existing draft.
    pub async fn send_draft(&self, mailbox: &str, draft_id: &str) -> Office365Result<()> {
        let path = format!(
            "{}/messages/{}/send",
            mailbox_path(mailbox),
            encode_segment(draft_id)
        );

        self.executor.post_empty(&path).await
    }

    async fn send_large(
        &self,
        message: &Message,
    ) -> Office365Result<(String, Vec<AttachmentDelivery>)> {
        // Nothing to clean up if this fails.
        let mut draft = self.create_draft(message).await?;

        draft.advance(DraftState::Attaching);
        let uploader = AttachmentUploader::new(self.executor.clone());
        let deliveries = uploader
            .deliver_attachments(message, &draft.id)
            .await
            .map_err(|e| draft.fail(e))?;

        draft.advance(DraftState::Attached);
        self.send_draft(&draft.mailbox, &draft.id)
            .await
            .map_err(|e| draft.fail(e))?;

        draft.advance(DraftState::Sent);
        info!(draft_id = %draft.id, "Draft sent");

        Ok((draft.id, deliveries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RequestError, ServerError};

    fn draft(state: DraftState) -> Draft {
        Draft {
            id: "AAMk=".to_string(),
            mailbox: "sender@contoso.com".to_string(),
            state,
        }
    }

    #[test]
    fn test_fail_wraps_with_state() {
        let error = draft(DraftState::Attaching).fail(Office365Error::Server(
            ServerError::InternalError("boom".to_string()),
        ));

        match error {
            Office365Error::Delivery(e) => {
                assert_eq!(e.draft_id, "AAMk=");
                assert_eq!(e.state, DraftState::Attaching);
                assert!(matches!(
                    *e.source,
                    Office365Error::Server(ServerError::InternalError(_))
                ));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_orphaned_draft_id() {
        let error = draft(DraftState::Attached)
            .fail(Office365Error::Request(RequestError::ValidationError("x".into())));
        assert_eq!(error.orphaned_draft_id(), Some("AAMk="));
        assert_eq!(
            error.status_code(),
            Some(reqwest::StatusCode::BAD_REQUEST)
        );
    }

    #[test]
    fn test_advance() {
        let mut d = draft(DraftState::Created);
        d.advance(DraftState::Attaching);
        d.advance(DraftState::Attached);
        assert_eq!(d.state, DraftState::Attached);
    }
}
