//! Backend interface for email messages.

use async_trait::async_trait;

use super::model::{
    EmailMessageRecord, ListEmailMessagesInput, MessageScope, SendEmailMessageRequest,
    SendEmailMessageResult, UpdateEmailMessagesValues, UpdatedEmailMessageSuccess,
};
use crate::common::{BatchOperationResult, EmailMessageOperationFailure, ListOutput};
use crate::config::EmailConfig;
use crate::error::ServiceResult;
use crate::sealing::SealedData;

/// Email message operations offered by the backend.
#[async_trait]
pub trait EmailMessageService: Send + Sync {
    /// Sends an encoded message.
    async fn send(&self, request: SendEmailMessageRequest)
    -> ServiceResult<SendEmailMessageResult>;

    /// Applies `values` to each message, reporting per-id outcomes.
    async fn update(
        &self,
        ids: &[String],
        values: &UpdateEmailMessagesValues,
    ) -> ServiceResult<BatchOperationResult<UpdatedEmailMessageSuccess, EmailMessageOperationFailure>>;

    /// Deletes each message, reporting per-id outcomes.
    async fn delete(
        &self,
        ids: &[String],
    ) -> ServiceResult<BatchOperationResult<String, EmailMessageOperationFailure>>;

    /// Reads one message.
    async fn get(&self, id: &str) -> ServiceResult<Option<EmailMessageRecord>>;

    /// Lists messages in `scope`. The pagination in `filter` is resolved.
    async fn list(
        &self,
        scope: &MessageScope,
        filter: &ListEmailMessagesInput,
    ) -> ServiceResult<ListOutput<EmailMessageRecord>>;

    /// Reads the sealed RFC 822 data of a message.
    async fn get_rfc822_data(
        &self,
        id: &str,
        email_address_id: &str,
    ) -> ServiceResult<Option<SealedData>>;

    /// Current service limits.
    async fn get_config(&self) -> ServiceResult<EmailConfig>;
}
