//! Backend interface for email folders.

use async_trait::async_trait;

use super::model::EmailFolderRecord;
use crate::common::{ListOutput, Pagination};
use crate::error::ServiceResult;
use crate::sealing::SealedData;

/// Email folder operations offered by the backend.
#[async_trait]
pub trait EmailFolderService: Send + Sync {
    /// Lists the folders of an address.
    async fn list_for_email_address_id(
        &self,
        email_address_id: &str,
        pagination: &Pagination,
    ) -> ServiceResult<ListOutput<EmailFolderRecord>>;

    /// Creates a custom folder with a sealed display name.
    async fn create_custom(
        &self,
        email_address_id: &str,
        sealed_name: SealedData,
    ) -> ServiceResult<EmailFolderRecord>;

    /// Updates a custom folder.
    async fn update_custom(
        &self,
        email_folder_id: &str,
        email_address_id: &str,
        sealed_name: Option<SealedData>,
    ) -> ServiceResult<EmailFolderRecord>;

    /// Deletes a custom folder; `None` if it did not exist.
    async fn delete_custom(
        &self,
        email_folder_id: &str,
        email_address_id: &str,
    ) -> ServiceResult<Option<EmailFolderRecord>>;

    /// Deletes every message in a folder. Returns the folder id.
    async fn delete_messages(
        &self,
        email_folder_id: &str,
        email_address_id: &str,
        hard_delete: bool,
    ) -> ServiceResult<String>;
}
