//! Attachment delivery for drafts.
//!
//! Attachments up to [`INLINE_ATTACHMENT_LIMIT_MB`] are posted to the
//! draft's `attachments` collection in one request. Larger ones go through an
//! upload session: the content is split into [`FRAGMENT_SIZE`] fragments that
//! are PUT one after another to the session's pre-authorised URL.
//!
//! # Protocol
//! 1. `POST /users/{mailbox}/messages/{id}/attachments/createUploadSession`
//!    declaring name and exact size, receive `uploadUrl`
//! 2. `PUT {uploadUrl}` per fragment with `Content-Length` and
//!    `Content-Range: bytes {start}-{end}/{total}`
//!
//! Fragments are never retried; the first failure aborts the attachment and
//! every attachment after it.

use super::{encode_segment, mailbox_path};
use crate::client::RequestExecutor;
use crate::errors::{Office365Error, Office365Result, UploadError};
use crate::services::payload::file_attachment;
use crate::types::{
    Attachment, AttachmentItem, AttachmentResource, Message, UploadSession, UploadSessionRequest,
};
use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_RANGE};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Attachments at or below this size (MB) are attached in a single request.
pub const INLINE_ATTACHMENT_LIMIT_MB: f64 = 3.0;

/// Size of one upload fragment (4 MiB).
pub const FRAGMENT_SIZE: usize = 4 * 1024 * 1024;

const CONTENT_ID_LEN: usize = 10;

/// A contiguous byte range of an attachment, offsets inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    /// Zero-based position in the upload.
    pub index: usize,
    /// First byte.
    pub start: u64,
    /// Last byte.
    pub end: u64,
    /// Size of the whole attachment.
    pub total: u64,
}

impl Fragment {
    /// Number of bytes in this fragment.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Fragments are never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` header value.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }

    fn slice(&self, content: &Bytes) -> Bytes {
        content.slice(self.start as usize..=self.end as usize)
    }
}

/// Splits `total` bytes into [`FRAGMENT_SIZE`] fragments.
pub fn fragments(total: u64) -> Vec<Fragment> {
    split(total, FRAGMENT_SIZE as u64)
}

fn split(total: u64, fragment_size: u64) -> Vec<Fragment> {
    let count = (total + fragment_size - 1) / fragment_size;

    (0..count)
        .map(|i| {
            let start = i * fragment_size;
            Fragment {
                index: i as usize,
                start,
                end: (start + fragment_size).min(total) - 1,
                total,
            }
        })
        .collect()
}

/// How one attachment reached the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentDelivery {
    /// Single `fileAttachment` request with a generated content id.
    Inline {
        /// The content id sent with the attachment.
        content_id: String,
    },
    /// Upload session.
    Uploaded {
        /// Number of fragments PUT.
        fragments: usize,
    },
}

/// Delivers attachments to an existing draft.
pub struct AttachmentUploader {
    executor: Arc<RequestExecutor>,
}

impl AttachmentUploader {
    /// Creates a new uploader.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Delivers every attachment of `message` to the draft, in declared order.
    ///
    /// Stops at the first failure; attachments already delivered stay on
    /// the draft.
    pub async fn deliver_attachments(
        &self,
        message: &Message,
        draft_id: &str,
    ) -> Office365Result<Vec<AttachmentDelivery>> {
        let mut deliveries = Vec::with_capacity(message.attachments.len());

        for attachment in &message.attachments {
            let delivery = self
                .deliver_attachment(message.mailbox(), draft_id, attachment)
                .await?;
            deliveries.push(delivery);
        }

        Ok(deliveries)
    }

    /// Delivers one attachment, choosing the inline or upload-session path by size.
    pub async fn deliver_attachment(
        &self,
        mailbox: &str,
        draft_id: &str,
        attachment: &Attachment,
    ) -> Office365Result<AttachmentDelivery> {
        let size_mb = attachment.size_mb();

        if size_mb <= INLINE_ATTACHMENT_LIMIT_MB {
            let content_id = self.attach_inline(mailbox, draft_id, attachment).await?;
            Ok(AttachmentDelivery::Inline { content_id })
        } else {
            let mut session = self
                .create_upload_session(mailbox, draft_id, attachment)
                .await?;
            let fragments = session.upload(&attachment.content).await?;
            Ok(AttachmentDelivery::Uploaded { fragments })
        }
    }

    async fn attach_inline(
        &self,
        mailbox: &str,
        draft_id: &str,
        attachment: &Attachment,
    ) -> Office365Result<String> {
        let content_id = generate_content_id();

        let mut body = file_attachment(attachment);
        body.content_id = Some(content_id.clone());

        let path = format!(
            "{}/messages/{}/attachments",
            mailbox_path(mailbox),
            encode_segment(draft_id)
        );

        debug!(
            name = %attachment.file_name,
            size = attachment.size(),
            content_id = %content_id,
            "Attaching inline"
        );

        let _: AttachmentResource = self.executor.post_json(&path, &body).await?;

        Ok(content_id)
    }

    /// Opens an upload session for `attachment` on the draft.
    pub async fn create_upload_session(
        &self,
        mailbox: &str,
        draft_id: &str,
        attachment: &Attachment,
    ) -> Office365Result<UploadSessionHandle> {
        let path = format!(
            "{}/messages/{}/attachments/createUploadSession",
            mailbox_path(mailbox),
            encode_segment(draft_id)
        );

        let request = UploadSessionRequest {
            attachment_item: AttachmentItem::file(&attachment.file_name, attachment.size()),
        };

        let session: UploadSession = self.executor.post_json(&path, &request).await?;

        let endpoint = Url::parse(&session.upload_url).map_err(|e| {
            Office365Error::Upload(UploadError::SessionFailed(format!(
                "Invalid upload URL: {}",
                e
            )))
        })?;

        debug!(
            name = %attachment.file_name,
            size = attachment.size(),
            expires = ?session.expiration_date_time,
            "Upload session created"
        );

        Ok(UploadSessionHandle {
            executor: self.executor.clone(),
            upload_url: session.upload_url,
            endpoint,
            total_size: attachment.size(),
            bytes_uploaded: 0,
        })
    }
}

/// An open upload session for one attachment.
///
/// Used once: the session is bound to the size declared when it was created.
pub struct UploadSessionHandle {
    executor: Arc<RequestExecutor>,
    upload_url: String,
    endpoint: Url,
    total_size: u64,
    bytes_uploaded: u64,
}

impl UploadSessionHandle {
    /// The pre-authorised upload URL, as returned by the server.
    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Declared size of the attachment.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Bytes acknowledged by the server so far.
    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded
    }

    /// Uploads `content` fragment by fragment and returns the fragment count.
    ///
    /// Each PUT completes before the next is issued. No `Authorization`
    /// header is sent; the URL carries its own credential.
    pub async fn upload(&mut self, content: &Bytes) -> Office365Result<usize> {
        if content.len() as u64 != self.total_size {
            return Err(Office365Error::Upload(UploadError::SizeMismatch(format!(
                "session declared {} bytes, content has {}",
                self.total_size,
                content.len()
            ))));
        }

        let fragments = fragments(self.total_size);

        for fragment in &fragments {
            self.upload_fragment(fragment, fragment.slice(content)).await?;
        }

        info!(
            total_size = self.total_size,
            fragments = fragments.len(),
            "Attachment upload completed"
        );

        Ok(fragments.len())
    }

    async fn upload_fragment(&mut self, fragment: &Fragment, data: Bytes) -> Office365Result<()> {
        let range = fragment.content_range();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(fragment.len()));
        headers.insert(
            CONTENT_RANGE,
            HeaderValue::from_str(&range).map_err(|e| fragment_failed(fragment, None, e))?,
        );

        debug!(
            index = fragment.index,
            range = %range,
            "Uploading fragment"
        );

        let response = self
            .executor
            .put_bytes(self.endpoint.clone(), headers, data)
            .await
            .map_err(|e| {
                warn!(index = fragment.index, error = %e, "Fragment upload failed");
                fragment_failed(fragment, None, e)
            })?;

        if !response.status.is_success() {
            warn!(
                index = fragment.index,
                status = %response.status,
                "Fragment rejected"
            );
            return Err(fragment_failed(
                fragment,
                Some(response.status),
                String::from_utf8_lossy(&response.body),
            ));
        }

        self.bytes_uploaded = fragment.end + 1;
        Ok(())
    }
}

fn fragment_failed(
    fragment: &Fragment,
    status: Option<reqwest::StatusCode>,
    message: impl ToString,
) -> Office365Error {
    Office365Error::Upload(UploadError::FragmentFailed {
        index: fragment.index,
        range: fragment.content_range(),
        status,
        message: message.to_string(),
    })
}

fn generate_content_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONTENT_ID_LEN)
        .map(char::from)
        .collect()
}
