//! Sealing service interface.
//!
//! Everything the backend stores on the user's behalf (aliases, folder
//! names, draft bodies, blocklist values, mask metadata) is sealed with the
//! user's key first. Key management lives outside this crate; use cases
//! only see this trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::EmailAddressPublicInfo;
use crate::{Error, Result};

/// Data sealed with one of the user's symmetric keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedData {
    /// Id of the key that sealed the data.
    pub key_id: String,
    /// Sealing algorithm identifier.
    pub algorithm: String,
    /// Sealed bytes.
    pub ciphertext: Vec<u8>,
}

/// Session key material wrapped for one key holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyExchange {
    /// Address of the key holder.
    pub email_address: String,
    /// Id of the public key the session key is wrapped with.
    pub key_id: String,
    /// Wrapped session key.
    pub data: Vec<u8>,
}

/// An end-to-end encrypted message body and the key exchange entries that
/// let each key holder open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurePackage {
    /// Encrypted body.
    pub body: Vec<u8>,
    /// One entry per key holder.
    pub key_exchanges: Vec<KeyExchange>,
}

impl SecurePackage {
    /// The entry for `email_address`, compared case-insensitively.
    #[must_use]
    pub fn key_exchange_for(&self, email_address: &str) -> Option<&KeyExchange> {
        self.key_exchanges
            .iter()
            .find(|k| k.email_address.eq_ignore_ascii_case(email_address))
    }
}

/// Seals and unseals data with keys the caller controls.
#[async_trait]
pub trait SealingService: Send + Sync {
    /// Seals `plaintext` with the current symmetric key.
    async fn seal(&self, plaintext: &[u8]) -> Result<SealedData>;

    /// Unseals data sealed by [`SealingService::seal`].
    async fn unseal(&self, sealed: &SealedData) -> Result<Vec<u8>>;

    /// Encrypts `plaintext` so that each of `recipients` can open it. The
    /// package holds one key exchange entry per recipient.
    async fn seal_for_recipients(
        &self,
        plaintext: &[u8],
        recipients: &[EmailAddressPublicInfo],
    ) -> Result<SecurePackage>;

    /// Opens an encrypted body with the key exchange entry of one of the
    /// user's addresses.
    async fn open_package(&self, body: &[u8], key_exchange: &KeyExchange) -> Result<Vec<u8>>;

    /// Seals a UTF-8 string.
    async fn seal_string(&self, plaintext: &str) -> Result<SealedData> {
        self.seal(plaintext.as_bytes()).await
    }

    /// Unseals a UTF-8 string.
    async fn unseal_string(&self, sealed: &SealedData) -> Result<String> {
        let bytes = self.unseal(sealed).await?;
        String::from_utf8(bytes)
            .map_err(|_| Error::Sealing(format!("key {} produced invalid UTF-8", sealed.key_id)))
    }
}

/// Seals `value` as JSON.
pub(crate) async fn seal_json<T: Serialize + Sync>(
    sealing: &dyn SealingService,
    value: &T,
) -> Result<SealedData> {
    let json = serde_json::to_vec(value)?;
    sealing.seal(&json).await
}

/// Unseals JSON sealed by [`seal_json`].
pub(crate) async fn unseal_json<T: DeserializeOwned>(
    sealing: &dyn SealingService,
    sealed: &SealedData,
) -> Result<T> {
    let json = sealing.unseal(sealed).await?;
    Ok(serde_json::from_slice(&json)?)
}

/// Unseals an optional string.
pub(crate) async fn unseal_optional(
    sealing: &dyn SealingService,
    sealed: Option<&SealedData>,
) -> Result<Option<String>> {
    match sealed {
        Some(sealed) => sealing.unseal_string(sealed).await.map(Some),
        None => Ok(None),
    }
}
