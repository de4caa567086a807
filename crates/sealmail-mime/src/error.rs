//! Errors raised while encoding or decoding messages.

use std::string::FromUtf8Error;

/// Result type alias for message encoding and decoding.
pub type Result<T> = std::result::Result<T, Error>;

/// Message encoding and decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `Content-Type` value could not be parsed.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// A mailbox could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Base64 content is malformed.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Decoded text is not UTF-8.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// A multipart body declares no boundary.
    #[error("Multipart body without boundary")]
    MissingBoundary,

    /// A multipart body is malformed or nested too deeply.
    #[error("Invalid multipart body: {0}")]
    InvalidMultipart(String),

    /// The details do not describe a sendable message.
    #[error("Cannot build message: {0}")]
    Build(String),
}
