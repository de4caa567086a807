//! Client configuration.
//!
//! [`EmailConfig`] holds the limits published by the service;
//! [`ClientOptions`] holds local settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Limits and policies published by the email service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailConfig {
    /// Maximum ids per delete request.
    pub delete_email_messages_limit: u32,
    /// Maximum ids per update request.
    pub update_email_messages_limit: u32,
    /// Maximum size of a received message in bytes.
    pub email_message_max_inbound_message_size: u64,
    /// Maximum size of a sent message in bytes.
    pub email_message_max_outbound_message_size: u64,
    /// Maximum recipients of an unencrypted message.
    pub email_message_recipients_limit: u32,
    /// Maximum recipients of an encrypted message.
    pub encrypted_email_message_recipients_limit: u32,
    /// Attachment extensions the service refuses to send (lowercase, no dot).
    pub prohibited_file_extensions: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            delete_email_messages_limit: 100,
            update_email_messages_limit: 100,
            email_message_max_inbound_message_size: 10_485_760,
            email_message_max_outbound_message_size: 10_485_760,
            email_message_recipients_limit: 10,
            encrypted_email_message_recipients_limit: 10,
            prohibited_file_extensions: ["bat", "cmd", "com", "exe", "js", "msi", "scr", "vbs"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EmailConfig {
    /// Returns true if attachments with this extension may not be sent.
    #[must_use]
    pub fn is_prohibited_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.prohibited_file_extensions
            .iter()
            .any(|p| p.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

/// Local client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// Path of the local cache database; `None` disables the cache.
    pub cache_path: Option<PathBuf>,
    /// Page size used when a list call does not specify one.
    pub default_page_limit: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cache_path: None,
            default_page_limit: 10,
        }
    }
}

impl ClientOptions {
    /// Parses options from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the page limit is zero.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.default_page_limit == 0 {
            return Err(Error::Config(
                "defaultPageLimit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_config_defaults_from_partial_json() {
        let config: EmailConfig =
            serde_json::from_str(r#"{"deleteEmailMessagesLimit": 5}"#).unwrap();
        assert_eq!(config.delete_email_messages_limit, 5);
        assert_eq!(config.update_email_messages_limit, 100);
    }

    #[test]
    fn test_prohibited_extension() {
        let config = EmailConfig::default();
        assert!(config.is_prohibited_extension("EXE"));
        assert!(config.is_prohibited_extension(".js"));
        assert!(!config.is_prohibited_extension("pdf"));
    }

    #[test]
    fn test_client_options_from_json() {
        let options =
            ClientOptions::from_json_str(r#"{"cachePath": "/tmp/cache.db"}"#).unwrap();
        assert_eq!(options.cache_path, Some(PathBuf::from("/tmp/cache.db")));
        assert_eq!(options.default_page_limit, 10);

        assert!(matches!(
            ClientOptions::from_json_str(r#"{"defaultPageLimit": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ClientOptions::from_json_str("not json"),
            Err(Error::Serde(_))
        ));
    }

    #[test]
    fn test_client_options_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"defaultPageLimit": 25}"#).unwrap();

        let options = ClientOptions::from_json_file(&path).unwrap();
        assert_eq!(options.default_page_limit, 25);

        assert!(matches!(
            ClientOptions::from_json_file(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
