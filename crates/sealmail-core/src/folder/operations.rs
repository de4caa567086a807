//! Email folder use cases.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::model::{
    CreateCustomEmailFolderInput, DeleteCustomEmailFolderInput, DeleteMessagesForFolderIdInput,
    EmailFolder, EmailFolderRecord, ListEmailFoldersForEmailAddressIdInput,
    UpdateCustomEmailFolderInput,
};
use super::service::EmailFolderService;
use crate::address::require_id;
use crate::cache::{CacheKind, CacheQuery};
use crate::common::{CachePolicy, ListOutput};
use crate::context::Context;
use crate::sealing::{SealingService, unseal_optional};
use crate::{Error, Result};

/// Folder listing and custom folder management.
pub struct EmailFolderOperations {
    service: Arc<dyn EmailFolderService>,
    context: Context,
}

impl EmailFolderOperations {
    pub(crate) fn new(service: Arc<dyn EmailFolderService>, context: Context) -> Self {
        Self { service, context }
    }

    /// Lists the folders of an address. Folders whose custom name cannot be
    /// unsealed are listed without it.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error or a cache error.
    pub async fn list_email_folders_for_email_address_id(
        &self,
        input: ListEmailFoldersForEmailAddressIdInput,
    ) -> Result<ListOutput<EmailFolder>> {
        let email_address_id = require_id(&input.email_address_id)?;

        let page = match input.cache_policy {
            CachePolicy::CacheOnly => {
                let query = CacheQuery {
                    parent_id: Some(email_address_id.to_string()),
                    ..CacheQuery::default()
                };
                self.context
                    .cached_page::<EmailFolderRecord>(query, &input.pagination)
                    .await?
            }
            CachePolicy::RemoteOnly => {
                let pagination = self.context.page(&input.pagination)?;
                let page = self
                    .service
                    .list_for_email_address_id(email_address_id, &pagination)
                    .await?;
                self.context.write_through(&page.items).await;
                page
            }
        };

        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            items.push(unseal_listed_folder(self.context.sealing(), record).await);
        }
        Ok(ListOutput::new(items, page.next_token))
    }

    /// Creates a custom folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank name, or the mapped
    /// backend error.
    pub async fn create_custom_email_folder(
        &self,
        input: CreateCustomEmailFolderInput,
    ) -> Result<EmailFolder> {
        let email_address_id = require_id(&input.email_address_id)?;
        let name = require_folder_name(&input.custom_folder_name)?;

        let sealed = self.context.sealing().seal_string(name).await?;
        let record = self.service.create_custom(email_address_id, sealed).await?;
        info!(id = %record.id, email_address_id, "Created custom folder");

        self.context.write_through(std::slice::from_ref(&record)).await;
        unseal_folder(self.context.sealing(), record).await
    }

    /// Renames a custom folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank name, or the mapped
    /// backend error.
    pub async fn update_custom_email_folder(
        &self,
        input: UpdateCustomEmailFolderInput,
    ) -> Result<EmailFolder> {
        let email_folder_id = require_id(&input.email_folder_id)?;
        let email_address_id = require_id(&input.email_address_id)?;
        let sealed = match input.custom_folder_name.as_deref() {
            Some(name) => {
                let name = require_folder_name(name)?;
                Some(self.context.sealing().seal_string(name).await?)
            }
            None => None,
        };

        let record = self
            .service
            .update_custom(email_folder_id, email_address_id, sealed)
            .await?;
        debug!(id = %record.id, "Updated custom folder");

        self.context.write_through(std::slice::from_ref(&record)).await;
        unseal_folder(self.context.sealing(), record).await
    }

    /// Deletes a custom folder. Returns `None` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn delete_custom_email_folder(
        &self,
        input: DeleteCustomEmailFolderInput,
    ) -> Result<Option<EmailFolder>> {
        let email_folder_id = require_id(&input.email_folder_id)?;
        let email_address_id = require_id(&input.email_address_id)?;

        let record = self
            .service
            .delete_custom(email_folder_id, email_address_id)
            .await?;
        self.context.evict(CacheKind::EmailFolder, email_folder_id).await;
        self.context
            .evict_group(CacheKind::EmailMessage, email_folder_id)
            .await;

        match record {
            Some(record) => {
                info!(id = %record.id, "Deleted custom folder");
                unseal_folder(self.context.sealing(), record).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Deletes every message in a folder. Returns the folder id.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn delete_messages_for_folder_id(
        &self,
        input: DeleteMessagesForFolderIdInput,
    ) -> Result<String> {
        let email_folder_id = require_id(&input.email_folder_id)?;
        let email_address_id = require_id(&input.email_address_id)?;

        let folder_id = self
            .service
            .delete_messages(email_folder_id, email_address_id, input.hard_delete)
            .await?;
        info!(
            email_folder_id,
            hard_delete = input.hard_delete,
            "Deleted messages for folder"
        );
        self.context
            .evict_group(CacheKind::EmailMessage, email_folder_id)
            .await;
        Ok(folder_id)
    }
}

/// Unseals the custom name of a folder record.
pub(crate) async fn unseal_folder(
    sealing: &dyn SealingService,
    record: EmailFolderRecord,
) -> Result<EmailFolder> {
    let custom_folder_name =
        unseal_optional(sealing, record.sealed_custom_folder_name.as_ref()).await?;
    Ok(folder_from_record(record, custom_folder_name))
}

/// Unseals a folder for a listing, dropping a custom name that cannot be
/// unsealed.
pub(crate) async fn unseal_listed_folder(
    sealing: &dyn SealingService,
    record: EmailFolderRecord,
) -> EmailFolder {
    let custom_folder_name = unseal_optional(sealing, record.sealed_custom_folder_name.as_ref())
        .await
        .unwrap_or_else(|e| {
            warn!(id = %record.id, error = %e, "Failed to unseal custom folder name");
            None
        });
    folder_from_record(record, custom_folder_name)
}

fn folder_from_record(record: EmailFolderRecord, custom_folder_name: Option<String>) -> EmailFolder {
    EmailFolder {
        id: record.id,
        owner: record.owner,
        email_address_id: record.email_address_id,
        folder_name: record.folder_name,
        custom_folder_name,
        size: record.size,
        unseen_count: record.unseen_count,
        version: record.version,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn require_folder_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument(
            "custom folder name must not be empty".to_string(),
        ));
    }
    Ok(name)
}
