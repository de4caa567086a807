//! Error types for the core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::ValidationError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An input failed validation before any service call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An email address or domain is malformed or not allowed.
    #[error("Invalid email address {address}: {reason}")]
    InvalidEmailAddress {
        /// The offending address as given.
        address: String,
        /// Why it was rejected.
        reason: ValidationError,
    },

    /// The requested address is already taken or reserved.
    #[error("Email address unavailable: {0}")]
    AddressUnavailable(String),

    /// Email address not found.
    #[error("Email address not found: {0}")]
    AddressNotFound(String),

    /// Email message not found.
    #[error("Email message not found: {0}")]
    MessageNotFound(String),

    /// Email folder not found.
    #[error("Email folder not found: {0}")]
    FolderNotFound(String),

    /// Draft message not found.
    #[error("Draft message not found: {0}")]
    DraftNotFound(String),

    /// Email mask not found.
    #[error("Email mask not found: {0}")]
    MaskNotFound(String),

    /// A count limit (batch size, recipients) was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// The encoded message is larger than the service accepts.
    #[error("Message size {size} exceeds limit of {limit} bytes")]
    MessageSizeLimitExceeded {
        /// Encoded size in bytes.
        size: u64,
        /// Configured maximum.
        limit: u64,
    },

    /// The caller's entitlements do not allow the operation.
    #[error("Insufficient entitlements: {0}")]
    InsufficientEntitlements(String),

    /// The caller is not authorized for the resource.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The resource changed since it was read.
    #[error("Version mismatch: {0}")]
    VersionMismatch(String),

    /// Sealing or unsealing through the sealing service failed.
    #[error("Sealing error: {0}")]
    Sealing(String),

    /// Any other failure reported by the backend.
    #[error("Service error ({error_type}): {message}")]
    Service {
        /// Backend error type.
        error_type: String,
        /// Backend message.
        message: String,
    },

    /// RFC 822 encoding or decoding failed.
    #[error("Message format error: {0}")]
    Mime(#[from] sealmail_mime::Error),

    /// Local cache operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Short error type name, reported in per-item batch failures.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::InvalidEmailAddress { .. } => "InvalidEmailAddress",
            Self::AddressUnavailable(_) => "AddressUnavailable",
            Self::AddressNotFound(_) => "AddressNotFound",
            Self::MessageNotFound(_) => "MessageNotFound",
            Self::FolderNotFound(_) => "FolderNotFound",
            Self::DraftNotFound(_) => "DraftNotFound",
            Self::MaskNotFound(_) => "MaskNotFound",
            Self::LimitExceeded(_) => "LimitExceeded",
            Self::MessageSizeLimitExceeded { .. } => "MessageSizeLimitExceeded",
            Self::InsufficientEntitlements(_) => "InsufficientEntitlements",
            Self::NotAuthorized(_) => "NotAuthorized",
            Self::VersionMismatch(_) => "VersionMismatch",
            Self::Sealing(_) => "Sealing",
            Self::Service { .. } => "ServiceError",
            Self::Mime(_) => "MessageFormat",
            Self::Database(_) => "Database",
            Self::Serde(_) => "Serialization",
            Self::Io(_) => "Io",
            Self::Config(_) => "Config",
        }
    }
}

/// An error as reported by the backend, before mapping.
///
/// Error types are namespaced (`sealmail.email.AddressUnavailableError`);
/// only the last segment is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    /// Namespaced error type.
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
}

impl BackendError {
    /// Creates a backend error.
    #[must_use]
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        let kind = err
            .error_type
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .trim_end_matches("Error");
        let message = err.message;

        match kind {
            "InvalidArgument" => Self::InvalidArgument(message),
            "InvalidEmailAddress" => Self::InvalidEmailAddress {
                address: message,
                reason: ValidationError::RejectedByService,
            },
            "AddressUnavailable" => Self::AddressUnavailable(message),
            "AddressNotFound" | "EmailAddressNotFound" => Self::AddressNotFound(message),
            "MessageNotFound" | "EmailMessageNotFound" => Self::MessageNotFound(message),
            "FolderNotFound" | "EmailFolderNotFound" => Self::FolderNotFound(message),
            "DraftNotFound" | "DraftMessageNotFound" => Self::DraftNotFound(message),
            "MaskNotFound" | "EmailMaskNotFound" => Self::MaskNotFound(message),
            "LimitExceeded" | "RecipientLimitExceeded" | "MessageSizeLimitExceeded" => {
                Self::LimitExceeded(message)
            }
            "InsufficientEntitlements" | "ServiceQuotaExceeded" => {
                Self::InsufficientEntitlements(message)
            }
            "NotAuthorized" | "UnauthorizedAddress" => Self::NotAuthorized(message),
            "VersionMismatch" | "ConditionalCheckFailed" => Self::VersionMismatch(message),
            _ => Self::Service {
                error_type: err.error_type.clone(),
                message,
            },
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result returned by backend service implementations.
pub type ServiceResult<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_mapping_uses_last_segment() {
        let err: Error = BackendError::new("sealmail.email.AddressUnavailableError", "taken").into();
        assert!(matches!(err, Error::AddressUnavailable(ref m) if m == "taken"));

        let err: Error = BackendError::new("EmailMessageNotFoundError", "m-1").into();
        assert!(matches!(err, Error::MessageNotFound(_)));

        let err: Error = BackendError::new("sealmail.InsufficientEntitlementsError", "").into();
        assert_eq!(err.error_type(), "InsufficientEntitlements");
    }

    #[test]
    fn test_backend_error_unknown_type_is_kept() {
        let err: Error = BackendError::new("sealmail.email.SomethingNew", "boom").into();
        match err {
            Error::Service {
                error_type,
                message,
            } => {
                assert_eq!(error_type, "sealmail.email.SomethingNew");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_address_from_backend() {
        let err: Error = BackendError::new("InvalidEmailAddressError", "x@y").into();
        assert_eq!(err.error_type(), "InvalidEmailAddress");
        assert!(err.to_string().contains("x@y"));
    }
}
