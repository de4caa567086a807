//! Blocklist data models.

use serde::{Deserialize, Serialize};

use crate::sealing::SealedData;

/// What a blocklist entry matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockedAddressLevel {
    /// The exact sender address.
    #[default]
    Address,
    /// Every sender on the address's domain.
    Domain,
}

/// What happens to mail from a blocked sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockedAddressAction {
    /// Discard silently.
    #[default]
    Drop,
    /// Deliver to the spam folder.
    Spam,
}

/// Blocklist entry as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedAddressRecord {
    /// Hash of the scope and normalized value.
    pub hashed_blocked_value: String,
    /// Sealed normalized value.
    pub sealed_value: SealedData,
    /// Match level.
    pub level: BlockedAddressLevel,
    /// Action taken.
    pub action: BlockedAddressAction,
    /// Only applies to this address when set; to every address otherwise.
    pub email_address_id: Option<String>,
}

/// Outcome of unsealing one blocklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsealedBlockedAddressStatus {
    /// Value unsealed.
    Completed,
    /// Value could not be unsealed.
    Failed {
        /// Error type of the failure.
        error_type: String,
    },
}

/// Blocklist entry with its value unsealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsealedBlockedAddress {
    /// Hash identifying the entry.
    pub hashed_blocked_value: String,
    /// Blocked address or domain; empty when unsealing failed.
    pub address: String,
    /// Match level.
    pub level: BlockedAddressLevel,
    /// Action taken.
    pub action: BlockedAddressAction,
    /// Address the entry is scoped to, if any.
    pub email_address_id: Option<String>,
    /// Whether the value could be unsealed.
    pub status: UnsealedBlockedAddressStatus,
}

/// Input for blocking senders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockEmailAddressesInput {
    /// Owning user.
    pub owner: String,
    /// Addresses to block; at `Domain` level their domains are blocked.
    pub blocked_addresses: Vec<String>,
    /// Match level.
    pub level: BlockedAddressLevel,
    /// Action taken.
    pub action: BlockedAddressAction,
    /// Scope the entries to one address.
    pub email_address_id: Option<String>,
}

/// Input for unblocking senders by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnblockEmailAddressesInput {
    /// Owning user.
    pub owner: String,
    /// Addresses or domains to unblock.
    pub unblocked_addresses: Vec<String>,
    /// Scope the entries were created with.
    pub email_address_id: Option<String>,
}

/// Input for unblocking senders by entry hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnblockEmailAddressesByHashedValueInput {
    /// Owning user.
    pub owner: String,
    /// Entry hashes.
    pub hashed_values: Vec<String>,
}
