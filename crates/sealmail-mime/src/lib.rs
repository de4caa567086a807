//! # sealmail-mime
//!
//! RFC 822 message encoding and decoding for the sealmail SDK.
//!
//! ## Features
//!
//! - **Message parsing**: nested multipart messages, transfer and charset decoding
//! - **Message generation**: text or HTML bodies with inline and regular attachments
//! - **Encoded words**: RFC 2047 header encoding and decoding
//! - **Addresses**: mailbox and address list parsing
//! - **Encrypted envelopes**: notice body plus secure attachments
//!
//! ## Quick Start
//!
//! ```ignore
//! use sealmail_mime::{EmailMessageDetails, Mailbox, encode_internet_message, decode_internet_message};
//!
//! let details = EmailMessageDetails {
//!     from: vec![Mailbox::new("sender@example.com")],
//!     to: vec![Mailbox::new("recipient@example.com")],
//!     subject: Some("Test".to_string()),
//!     body: Some("Hello, World!".to_string()),
//!     ..EmailMessageDetails::default()
//! };
//!
//! let data = encode_internet_message(&details)?;
//! let decoded = decode_internet_message(&data)?;
//! assert_eq!(decoded.subject.as_deref(), Some("Test"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod builder;
mod content_type;
mod error;
mod header;
mod message;
mod rfc822;

pub mod encoding;

pub use address::{Mailbox, format_list};
pub use builder::{Attachment, MessageBuilder};
pub use content_type::{ContentDisposition, ContentType, DispositionType};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding, extract_ids};
pub use rfc822::{
    BodyFormat, ENCRYPTED_BODY_NOTICE, EmailMessageDetails, EncryptionStatus,
    SecureAttachmentType, decode_internet_message, encode_internet_message,
};
