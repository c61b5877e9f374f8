//! Microsoft Graph mail service implementations.

pub mod mail;
pub mod payload;
pub mod size;
pub mod upload;

pub use mail::*;
pub use payload::*;
pub use size::*;
pub use upload::*;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped in a single path segment. `@` is kept as-is.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// `users/{mailbox}` with the mailbox escaped.
pub(crate) fn mailbox_path(mailbox: &str) -> String {
    format!("users/{}", encode_segment(mailbox))
}
