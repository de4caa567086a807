//! Email address data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheIndex, CacheKind, Cacheable, timestamp_sort_key};
use crate::common::{CachePolicy, Pagination};
use crate::folder::{EmailFolder, EmailFolderRecord};
use crate::sealing::SealedData;

/// Provisioned email address as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddressRecord {
    /// Address id.
    pub id: String,
    /// Owning user.
    pub owner: String,
    /// Normalized address.
    pub email_address: String,
    /// Display alias, sealed.
    pub sealed_alias: Option<SealedData>,
    /// Standard and custom folders.
    pub folders: Vec<EmailFolderRecord>,
    /// Total size of stored messages in bytes.
    pub size: u64,
    /// Number of stored messages.
    pub number_of_email_messages: u64,
    /// Record version.
    pub version: u32,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// When the last message was received.
    pub last_received_at: Option<DateTime<Utc>>,
}

impl Cacheable for EmailAddressRecord {
    const KIND: CacheKind = CacheKind::EmailAddress;

    fn cache_id(&self) -> &str {
        &self.id
    }

    fn cache_index(&self) -> CacheIndex {
        CacheIndex {
            parent_id: Some(self.owner.clone()),
            group_id: None,
            sort_key: timestamp_sort_key(self.created_at),
        }
    }
}

/// Provisioned email address with its alias and folder names unsealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Address id.
    pub id: String,
    /// Owning user.
    pub owner: String,
    /// Normalized address.
    pub email_address: String,
    /// Display alias.
    pub alias: Option<String>,
    /// Standard and custom folders.
    pub folders: Vec<EmailFolder>,
    /// Total size of stored messages in bytes.
    pub size: u64,
    /// Number of stored messages.
    pub number_of_email_messages: u64,
    /// Record version.
    pub version: u32,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// When the last message was received.
    pub last_received_at: Option<DateTime<Utc>>,
}

/// Published key information of an in-network address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddressPublicInfo {
    /// Normalized address.
    pub email_address: String,
    /// Id of the published key.
    pub key_id: String,
    /// Published public key.
    pub public_key: String,
}

/// Input for provisioning an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionEmailAddressInput {
    /// Requested address.
    pub email_address: String,
    /// Optional display alias.
    pub alias: Option<String>,
}

/// What the backend receives to provision an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionEmailAddressRequest {
    /// Normalized address.
    pub email_address: String,
    /// Sealed alias.
    pub sealed_alias: Option<SealedData>,
}

/// Input for updating address metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEmailAddressMetadataInput {
    /// Address id.
    pub id: String,
    /// New alias; `None` or blank clears it.
    pub alias: Option<String>,
}

/// Input for reading one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEmailAddressInput {
    /// Address id.
    pub id: String,
    /// Where to read from.
    pub cache_policy: CachePolicy,
}

/// Input for listing the caller's addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEmailAddressesInput {
    /// Where to read from.
    pub cache_policy: CachePolicy,
    /// Page request.
    pub pagination: Pagination,
}

/// Input for checking address availability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckEmailAddressAvailabilityInput {
    /// Candidate local parts.
    pub local_parts: Vec<String>,
    /// Domains to combine them with; every supported domain when `None`.
    pub domains: Option<Vec<String>>,
}
