//! Email folder data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheIndex, CacheKind, Cacheable};
use crate::common::{CachePolicy, Pagination};
use crate::sealing::SealedData;

/// Email folder as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailFolderRecord {
    /// Folder id.
    pub id: String,
    /// Owning user.
    pub owner: String,
    /// Email address the folder belongs to.
    pub email_address_id: String,
    /// Well-known name (`INBOX`, `SENT`, `TRASH`, ...) or `CUSTOM`.
    pub folder_name: String,
    /// Display name of a custom folder, sealed.
    pub sealed_custom_folder_name: Option<SealedData>,
    /// Total size of the folder's messages in bytes.
    pub size: u64,
    /// Number of unseen messages.
    pub unseen_count: u64,
    /// Record version.
    pub version: u32,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Cacheable for EmailFolderRecord {
    const KIND: CacheKind = CacheKind::EmailFolder;

    fn cache_id(&self) -> &str {
        &self.id
    }

    fn cache_index(&self) -> CacheIndex {
        CacheIndex {
            parent_id: Some(self.email_address_id.clone()),
            group_id: None,
            sort_key: self.folder_name.clone(),
        }
    }
}

/// Email folder with its custom name unsealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailFolder {
    /// Folder id.
    pub id: String,
    /// Owning user.
    pub owner: String,
    /// Email address the folder belongs to.
    pub email_address_id: String,
    /// Well-known name or `CUSTOM`.
    pub folder_name: String,
    /// Display name of a custom folder.
    pub custom_folder_name: Option<String>,
    /// Total size of the folder's messages in bytes.
    pub size: u64,
    /// Number of unseen messages.
    pub unseen_count: u64,
    /// Record version.
    pub version: u32,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl EmailFolder {
    /// Whether this is a user-created folder.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.custom_folder_name.is_some()
    }

    /// Name to show: the custom name if any, otherwise the well-known name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.custom_folder_name
            .as_deref()
            .unwrap_or(&self.folder_name)
    }
}

/// Input for listing the folders of an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEmailFoldersForEmailAddressIdInput {
    /// Email address id.
    pub email_address_id: String,
    /// Where to read from.
    pub cache_policy: CachePolicy,
    /// Page request.
    pub pagination: Pagination,
}

/// Input for creating a custom folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomEmailFolderInput {
    /// Email address the folder belongs to.
    pub email_address_id: String,
    /// Display name.
    pub custom_folder_name: String,
}

/// Input for renaming a custom folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCustomEmailFolderInput {
    /// Folder to update.
    pub email_folder_id: String,
    /// Email address the folder belongs to.
    pub email_address_id: String,
    /// New display name; `None` leaves it unchanged.
    pub custom_folder_name: Option<String>,
}

/// Input for deleting a custom folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCustomEmailFolderInput {
    /// Folder to delete.
    pub email_folder_id: String,
    /// Email address the folder belongs to.
    pub email_address_id: String,
}

/// Input for emptying a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteMessagesForFolderIdInput {
    /// Folder to empty.
    pub email_folder_id: String,
    /// Email address the folder belongs to.
    pub email_address_id: String,
    /// Delete permanently instead of moving to trash.
    pub hard_delete: bool,
}
