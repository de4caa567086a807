//! Backend interface for drafts and scheduled sends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{
    DraftEmailMessageMetadata, ScheduledDraftMessage, ScheduledDraftMessageStateFilter,
    SealedDraft,
};
use crate::common::{ListOutput, Pagination};
use crate::error::ServiceResult;
use crate::sealing::SealedData;

/// Draft storage and scheduling offered by the backend.
#[async_trait]
pub trait DraftMessageService: Send + Sync {
    /// Stores a sealed draft, replacing any previous version.
    async fn save(
        &self,
        email_address_id: &str,
        id: &str,
        sealed_rfc822_data: SealedData,
    ) -> ServiceResult<DraftEmailMessageMetadata>;

    /// Reads one draft.
    async fn get(&self, email_address_id: &str, id: &str) -> ServiceResult<Option<SealedDraft>>;

    /// Lists the drafts of an address.
    async fn list_metadata(
        &self,
        email_address_id: &str,
    ) -> ServiceResult<Vec<DraftEmailMessageMetadata>>;

    /// Deletes one draft.
    async fn delete(&self, email_address_id: &str, id: &str) -> ServiceResult<()>;

    /// Schedules a draft to be sent at `send_at`.
    async fn schedule_send(
        &self,
        email_address_id: &str,
        id: &str,
        send_at: DateTime<Utc>,
    ) -> ServiceResult<ScheduledDraftMessage>;

    /// Cancels a scheduled send. Returns the draft id.
    async fn cancel_scheduled(&self, email_address_id: &str, id: &str) -> ServiceResult<String>;

    /// Lists scheduled drafts of an address.
    async fn list_scheduled(
        &self,
        email_address_id: &str,
        state: Option<&ScheduledDraftMessageStateFilter>,
        pagination: &Pagination,
    ) -> ServiceResult<ListOutput<ScheduledDraftMessage>>;
}
