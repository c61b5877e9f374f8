//! Payload size estimation and send strategy selection.

use super::payload::{build_payload, AttachmentMode, PayloadKind};
use crate::errors::{Office365Result, RequestError};
use crate::types::{Message, BYTES_PER_MB};

/// Estimated payloads at or above this size (MB) take the draft path.
pub const LARGE_MESSAGE_THRESHOLD_MB: f64 = 4.0;

/// How a message is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStrategy {
    /// One `sendMail` call with attachments inlined.
    Simple,
    /// Draft, attachments delivered one by one, then send.
    Large,
}

impl SendStrategy {
    /// Classifies an estimated payload size.
    pub fn classify(size_mb: f64) -> Self {
        if size_mb >= LARGE_MESSAGE_THRESHOLD_MB {
            SendStrategy::Large
        } else {
            SendStrategy::Simple
        }
    }
}

/// Estimates the payload size in MB with every attachment inlined.
///
/// This is the worst case: attachments that end up uploaded separately are
/// still measured as base64 here.
pub fn estimate_size_mb(message: &Message) -> Office365Result<f64> {
    Ok(estimate_size_bytes(message)? as f64 / BYTES_PER_MB)
}

/// Serialized byte length of the inline-everything draft payload.
pub fn estimate_size_bytes(message: &Message) -> Office365Result<usize> {
    let payload = build_payload(message, AttachmentMode::Inline, PayloadKind::Draft);
    let encoded = serde_json::to_vec(&payload)
        .map_err(|e| RequestError::Serialization(format!("Failed to encode payload: {}", e)))?;
    Ok(encoded.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attachment;

    fn message_with(attachment: Option<Attachment>) -> Message {
        let mut builder = Message::builder()
            .from("sender@contoso.com")
            .unwrap()
            .to("a@contoso.com")
            .unwrap()
            .subject("Size estimate")
            .text("x".repeat(2048));
        if let Some(attachment) = attachment {
            builder = builder.attachment(attachment);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_classify_threshold() {
        assert_eq!(SendStrategy::classify(0.0), SendStrategy::Simple);
        assert_eq!(SendStrategy::classify(3.999), SendStrategy::Simple);
        assert_eq!(SendStrategy::classify(4.0), SendStrategy::Large);
        assert_eq!(SendStrategy::classify(12.5), SendStrategy::Large);
    }

    #[test]
    fn test_small_message_is_simple() {
        let size = estimate_size_mb(&message_with(None)).unwrap();
        assert!(size < 0.01);
        assert_eq!(SendStrategy::classify(size), SendStrategy::Simple);
    }

    #[test]
    fn test_estimate_matches_serialized_length() {
        let message = message_with(None);
        let payload = build_payload(&message, AttachmentMode::Inline, PayloadKind::Draft);
        let expected = serde_json::to_vec(&payload).unwrap().len();
        assert_eq!(estimate_size_bytes(&message).unwrap(), expected);
    }

    #[test]
    fn test_base64_inflation_counts() {
        // 3.5 MB raw becomes ~4.67 MB once base64-encoded.
        let raw = vec![7u8; 3 * 1024 * 1024 + 512 * 1024];
        let message = message_with(Some(Attachment::from_bytes("big.bin", raw)));

        let size = estimate_size_mb(&message).unwrap();
        assert!(size > 4.6 && size < 4.8, "unexpected estimate {}", size);
        assert_eq!(SendStrategy::classify(size), SendStrategy::Large);
    }

    #[test]
    fn test_two_mb_attachment_stays_simple() {
        let message = message_with(Some(Attachment::from_bytes("mid.bin", vec![1u8; 2 * 1024 * 1024])));
        assert_eq!(
            SendStrategy::classify(estimate_size_mb(&message).unwrap()),
            SendStrategy::Simple
        );
    }
}
