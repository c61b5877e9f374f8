//! Type definitions for the Office 365 mail integration.
//!
//! - [`message`]: the outbound message handed to the client
//! - [`wire`]: Microsoft Graph request and response bodies

pub mod message;
pub mod wire;

pub use message::{
    Attachment, AttachmentPresence, EmailAddress, Message, MessageBody, MessageBuilder,
    BYTES_PER_MB,
};
pub use wire::{
    AttachmentItem, AttachmentResource, FileAttachment, GraphErrorResponse, ItemBody,
    MessageResource, Recipient, UploadSession, UploadSessionRequest, WireAddress, WireMessage,
    WirePayload,
};
