//! Draft and scheduled send use cases.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::{
    CreateDraftEmailMessageInput, DeleteDraftEmailMessagesInput, DraftEmailMessage,
    DraftEmailMessageKey, DraftEmailMessageMetadata, ListScheduledDraftMessagesInput,
    ScheduleSendDraftMessageInput, ScheduledDraftMessage, SealedDraft,
    UpdateDraftEmailMessageInput,
};
use super::service::DraftMessageService;
use crate::address::{EmailAccountService, require_address, require_id};
use crate::common::{
    BatchOperationResult, EmailMessageOperationFailure, ListOutput, unique_batch_ids,
};
use crate::context::Context;
use crate::{Error, Result};

/// Draft storage and scheduled sending.
pub struct DraftOperations {
    service: Arc<dyn DraftMessageService>,
    accounts: Arc<dyn EmailAccountService>,
    context: Context,
}

impl DraftOperations {
    pub(crate) fn new(
        service: Arc<dyn DraftMessageService>,
        accounts: Arc<dyn EmailAccountService>,
        context: Context,
    ) -> Self {
        Self {
            service,
            accounts,
            context,
        }
    }

    /// Stores a new draft under a generated id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] if the sender address does not
    /// exist, [`Error::InvalidArgument`] for empty data, or the mapped
    /// backend error.
    pub async fn create_draft_email_message(
        &self,
        input: CreateDraftEmailMessageInput,
    ) -> Result<DraftEmailMessageMetadata> {
        require_data(&input.rfc822_data)?;
        let address = require_address(self.accounts.as_ref(), &input.sender_email_address_id).await?;

        let id = Uuid::new_v4().to_string();
        let sealed = self.context.sealing().seal(&input.rfc822_data).await?;
        let metadata = self.service.save(&address.id, &id, sealed).await?;
        info!(id = %metadata.id, email_address_id = %address.id, "Created draft");
        Ok(metadata)
    }

    /// Replaces the content of an existing draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] or [`Error::DraftNotFound`] if the
    /// address or draft does not exist, or the mapped backend error.
    pub async fn update_draft_email_message(
        &self,
        input: UpdateDraftEmailMessageInput,
    ) -> Result<DraftEmailMessageMetadata> {
        let id = require_id(&input.id)?;
        require_data(&input.rfc822_data)?;
        let address = require_address(self.accounts.as_ref(), &input.sender_email_address_id).await?;
        self.require_draft(&address.id, id).await?;

        let sealed = self.context.sealing().seal(&input.rfc822_data).await?;
        let metadata = self.service.save(&address.id, id, sealed).await?;
        debug!(id, "Updated draft");
        Ok(metadata)
    }

    /// Deletes drafts, reporting per-id outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no id is given or
    /// [`Error::AddressNotFound`] if the address does not exist.
    pub async fn delete_draft_email_messages(
        &self,
        input: DeleteDraftEmailMessagesInput,
    ) -> Result<BatchOperationResult<String, EmailMessageOperationFailure>> {
        let address = require_address(self.accounts.as_ref(), &input.email_address_id).await?;
        let ids = unique_batch_ids(&input.ids, u32::MAX, "draft")?;

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            match self.service.delete(&address.id, &id).await {
                Ok(()) => outcomes.push(Ok(id)),
                Err(e) => {
                    let error = Error::from(e);
                    warn!(id = %id, error = %error, "Failed to delete draft");
                    outcomes.push(Err(EmailMessageOperationFailure::from_error(id, &error)));
                }
            }
        }

        let result = BatchOperationResult::from_results(outcomes);
        info!(
            status = ?result.status,
            deleted = result.success_values.len(),
            "Deleted drafts"
        );
        Ok(result)
    }

    /// Reads one draft.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error or a sealing error.
    pub async fn get_draft_email_message(
        &self,
        input: DraftEmailMessageKey,
    ) -> Result<Option<DraftEmailMessage>> {
        let id = require_id(&input.id)?;
        let email_address_id = require_id(&input.email_address_id)?;

        match self.service.get(email_address_id, id).await? {
            Some(draft) => self.unseal(draft).await.map(Some),
            None => Ok(None),
        }
    }

    /// Reads every draft of an address. Drafts that cannot be unsealed are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] if the address does not exist, or
    /// the mapped backend error.
    pub async fn list_draft_email_messages_for_email_address_id(
        &self,
        email_address_id: &str,
    ) -> Result<Vec<DraftEmailMessage>> {
        let metadata = self
            .list_draft_email_message_metadata_for_email_address_id(email_address_id)
            .await?;

        let mut drafts = Vec::with_capacity(metadata.len());
        for entry in metadata {
            // deleted between listing and reading
            let Some(draft) = self.service.get(&entry.email_address_id, &entry.id).await? else {
                continue;
            };
            match self.unseal(draft).await {
                Ok(draft) => drafts.push(draft),
                Err(e) => warn!(id = %entry.id, error = %e, "Skipping draft that failed to unseal"),
            }
        }
        Ok(drafts)
    }

    /// Lists draft ids and timestamps of an address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressNotFound`] if the address does not exist, or
    /// the mapped backend error.
    pub async fn list_draft_email_message_metadata_for_email_address_id(
        &self,
        email_address_id: &str,
    ) -> Result<Vec<DraftEmailMessageMetadata>> {
        let address = require_address(self.accounts.as_ref(), email_address_id).await?;
        Ok(self.service.list_metadata(&address.id).await?)
    }

    /// Schedules a draft to be sent later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `send_at` is not in the future,
    /// [`Error::DraftNotFound`] if the draft does not exist, or the mapped
    /// backend error.
    pub async fn schedule_send_draft_message(
        &self,
        input: ScheduleSendDraftMessageInput,
    ) -> Result<ScheduledDraftMessage> {
        let id = require_id(&input.id)?;
        let email_address_id = require_id(&input.email_address_id)?;
        if input.send_at <= Utc::now() {
            return Err(Error::InvalidArgument(
                "send_at must be in the future".to_string(),
            ));
        }
        self.require_draft(email_address_id, id).await?;

        let scheduled = self
            .service
            .schedule_send(email_address_id, id, input.send_at)
            .await?;
        info!(id, send_at = %scheduled.send_at, "Scheduled draft");
        Ok(scheduled)
    }

    /// Cancels a scheduled send. Returns the draft id.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn cancel_scheduled_draft_message(
        &self,
        input: DraftEmailMessageKey,
    ) -> Result<String> {
        let id = require_id(&input.id)?;
        let email_address_id = require_id(&input.email_address_id)?;

        let cancelled = self.service.cancel_scheduled(email_address_id, id).await?;
        info!(id = %cancelled, "Cancelled scheduled draft");
        Ok(cancelled)
    }

    /// Lists scheduled drafts of an address, optionally filtered by state.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn list_scheduled_draft_messages_for_email_address_id(
        &self,
        input: ListScheduledDraftMessagesInput,
    ) -> Result<ListOutput<ScheduledDraftMessage>> {
        let email_address_id = require_id(&input.email_address_id)?;
        let pagination = self.context.page(&input.pagination)?;

        let mut page = self
            .service
            .list_scheduled(email_address_id, input.state.as_ref(), &pagination)
            .await?;
        if let Some(state) = &input.state {
            page.items.retain(|scheduled| state.matches(scheduled.state));
        }
        Ok(page)
    }

    async fn require_draft(&self, email_address_id: &str, id: &str) -> Result<()> {
        if self.service.get(email_address_id, id).await?.is_none() {
            return Err(Error::DraftNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn unseal(&self, draft: SealedDraft) -> Result<DraftEmailMessage> {
        let rfc822_data = self
            .context
            .sealing()
            .unseal(&draft.sealed_rfc822_data)
            .await?;
        Ok(DraftEmailMessage {
            id: draft.metadata.id,
            email_address_id: draft.metadata.email_address_id,
            updated_at: draft.metadata.updated_at,
            rfc822_data,
        })
    }
}

fn require_data(rfc822_data: &[u8]) -> Result<()> {
    if rfc822_data.is_empty() {
        return Err(Error::InvalidArgument(
            "draft data must not be empty".to_string(),
        ));
    }
    Ok(())
}
