//! Email mask data models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Pagination;
use crate::sealing::SealedData;

/// Free-form key/value metadata stored with a mask.
pub type EmailMaskMetadata = BTreeMap<String, String>;

/// Lifecycle state of a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailMaskStatus {
    /// Forwarding mail.
    Enabled,
    /// Rejecting mail.
    Disabled,
    /// Locked by the service.
    Locked,
    /// Being provisioned.
    Pending,
}

/// Where a mask forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailMaskRealAddressType {
    /// One of the caller's own addresses.
    Internal,
    /// An address outside the service.
    External,
}

/// Email mask as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMaskRecord {
    /// Mask id.
    pub id: String,
    /// Owning user.
    pub owner: String,
    /// Public masked address.
    pub masked_email_address: String,
    /// Address mail is forwarded to.
    pub real_email_address: String,
    /// Kind of real address.
    pub real_email_address_type: EmailMaskRealAddressType,
    /// Lifecycle state.
    pub status: EmailMaskStatus,
    /// Sealed JSON metadata.
    pub sealed_metadata: Option<SealedData>,
    /// Messages received on the mask.
    pub inbound_received: u64,
    /// Messages forwarded to the real address.
    pub inbound_delivered: u64,
    /// Messages sent through the mask.
    pub outbound_received: u64,
    /// Messages delivered from the mask.
    pub outbound_delivered: u64,
    /// Messages classified as spam.
    pub spam_count: u64,
    /// Messages carrying a virus.
    pub virus_count: u64,
    /// When the mask stops working.
    pub expires_at: Option<DateTime<Utc>>,
    /// Record version.
    pub version: u32,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Email mask with its metadata unsealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMask {
    /// Mask id.
    pub id: String,
    /// Owning user.
    pub owner: String,
    /// Public masked address.
    pub masked_email_address: String,
    /// Address mail is forwarded to.
    pub real_email_address: String,
    /// Kind of real address.
    pub real_email_address_type: EmailMaskRealAddressType,
    /// Lifecycle state.
    pub status: EmailMaskStatus,
    /// Metadata.
    pub metadata: Option<EmailMaskMetadata>,
    /// Messages received on the mask.
    pub inbound_received: u64,
    /// Messages forwarded to the real address.
    pub inbound_delivered: u64,
    /// Messages sent through the mask.
    pub outbound_received: u64,
    /// Messages delivered from the mask.
    pub outbound_delivered: u64,
    /// Messages classified as spam.
    pub spam_count: u64,
    /// Messages carrying a virus.
    pub virus_count: u64,
    /// When the mask stops working.
    pub expires_at: Option<DateTime<Utc>>,
    /// Record version.
    pub version: u32,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl EmailMask {
    pub(crate) fn from_record(record: EmailMaskRecord, metadata: Option<EmailMaskMetadata>) -> Self {
        Self {
            id: record.id,
            owner: record.owner,
            masked_email_address: record.masked_email_address,
            real_email_address: record.real_email_address,
            real_email_address_type: record.real_email_address_type,
            status: record.status,
            metadata,
            inbound_received: record.inbound_received,
            inbound_delivered: record.inbound_delivered,
            outbound_received: record.outbound_received,
            outbound_delivered: record.outbound_delivered,
            spam_count: record.spam_count,
            virus_count: record.virus_count,
            expires_at: record.expires_at,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Input for provisioning a mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionEmailMaskInput {
    /// Requested masked address.
    pub masked_email_address: String,
    /// Address to forward to.
    pub real_email_address: String,
    /// Optional metadata.
    pub metadata: Option<EmailMaskMetadata>,
    /// Optional expiry; must be in the future.
    pub expires_at: Option<DateTime<Utc>>,
}

/// What the backend receives to provision a mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionEmailMaskRequest {
    /// Normalized masked address.
    pub masked_email_address: String,
    /// Normalized real address.
    pub real_email_address: String,
    /// Sealed metadata.
    pub sealed_metadata: Option<SealedData>,
    /// Expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input for updating a mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateEmailMaskInput {
    /// Mask id.
    pub email_mask_id: String,
    /// Replacement metadata; `None` leaves it unchanged.
    pub metadata: Option<EmailMaskMetadata>,
    /// Replacement expiry; `None` leaves it unchanged.
    pub expires_at: Option<DateTime<Utc>>,
}

/// What the backend receives to update a mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEmailMaskRequest {
    /// Mask id.
    pub email_mask_id: String,
    /// Replacement sealed metadata.
    pub sealed_metadata: Option<SealedData>,
    /// Replacement expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Filter for listing masks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailMaskFilter {
    /// Only masks in one of these states.
    pub status: Option<Vec<EmailMaskStatus>>,
    /// Only masks forwarding to this kind of address.
    pub real_address_type: Option<EmailMaskRealAddressType>,
}

impl EmailMaskFilter {
    /// Whether `mask` passes the filter.
    #[must_use]
    pub fn matches(&self, mask: &EmailMaskRecord) -> bool {
        self.status
            .as_ref()
            .is_none_or(|statuses| statuses.contains(&mask.status))
            && self
                .real_address_type
                .is_none_or(|kind| kind == mask.real_email_address_type)
    }
}

/// Input for listing the caller's masks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEmailMasksForOwnerInput {
    /// Optional filter.
    pub filter: Option<EmailMaskFilter>,
    /// Page request.
    pub pagination: Pagination,
}
