//! Conversion of a [`Message`] into the Graph message resource.
//!
//! Pure functions, no I/O.

use crate::types::wire::FILE_ATTACHMENT_ODATA_TYPE;
use crate::types::{
    Attachment, AttachmentPresence, EmailAddress, FileAttachment, ItemBody, Message, Recipient,
    WireAddress, WireMessage, WirePayload,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Whether attachments are embedded in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentMode {
    /// Embed every attachment as base64.
    Inline,
    /// Leave the `attachments` key out.
    Omit,
}

/// Which endpoint the payload is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// `POST /users/{mailbox}/messages`: unwrapped resource.
    Draft,
    /// `POST /users/{mailbox}/sendMail`: wrapped under `message`.
    SendMail,
}

/// Builds the request payload for `message`.
pub fn build_payload(message: &Message, attachments: AttachmentMode, kind: PayloadKind) -> WirePayload {
    let inlined = match (attachments, message.attachment_presence()) {
        (AttachmentMode::Inline, AttachmentPresence::Some(list)) => {
            Some(list.iter().map(file_attachment).collect())
        }
        (AttachmentMode::Inline, AttachmentPresence::None) | (AttachmentMode::Omit, _) => None,
    };

    let resource = WireMessage {
        from: recipient(&message.from),
        to_recipients: recipients(&message.to),
        cc_recipients: recipients(&message.cc),
        bcc_recipients: recipients(&message.bcc),
        reply_to: recipients(&message.reply_to),
        subject: message.subject.clone(),
        body: ItemBody {
            content_type: message.body.content_type().to_string(),
            content: message.body.content().to_string(),
        },
        attachments: inlined,
    };

    match kind {
        PayloadKind::Draft => WirePayload::Draft(resource),
        PayloadKind::SendMail => WirePayload::SendMail { message: resource },
    }
}

/// Maps a single attachment to a Graph `fileAttachment`, keeping its content id.
pub fn file_attachment(attachment: &Attachment) -> FileAttachment {
    FileAttachment {
        odata_type: FILE_ATTACHMENT_ODATA_TYPE.to_string(),
        name: attachment.file_name.clone(),
        content_type: attachment.content_type.clone(),
        content_bytes: STANDARD.encode(&attachment.content),
        content_id: attachment.content_id.clone(),
    }
}

fn recipient(address: &EmailAddress) -> Recipient {
    Recipient {
        email_address: WireAddress {
            address: address.address.clone(),
            name: address.display_name().to_string(),
        },
    }
}

fn recipients(addresses: &[EmailAddress]) -> Vec<Recipient> {
    addresses.iter().map(recipient).collect()
}
