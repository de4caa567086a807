//! Email message use cases.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sealmail_mime::{
    EmailMessageDetails, EncryptionStatus, SecureAttachmentType, decode_internet_message,
    encode_internet_message,
};
use tracing::{debug, info, warn};

use super::model::{
    EmailMessage, EmailMessageHeaders, EmailMessageRecord, EmailMessageRfc822Data,
    EmailMessageWithBody, GetEmailMessageDataInput, GetEmailMessageInput, ListEmailMessagesInput,
    MessageScope, SendEmailMessageInput, SendEmailMessageRequest, SendEmailMessageResult,
    UpdateEmailMessagesInput, UpdatedEmailMessageSuccess,
};
use super::service::EmailMessageService;
use crate::address::{EmailAccountService, require_address, require_id, require_valid_address};
use crate::cache::{CacheKind, CacheQuery, timestamp_sort_key};
use crate::common::{
    BatchOperationResult, BatchOperationStatus, CachePolicy, EmailMessageOperationFailure,
    ListOutput, SortOrder, unique_batch_ids,
};
use crate::config::EmailConfig;
use crate::context::Context;
use crate::sealing::{KeyExchange, SealingService, SecurePackage, unseal_json};
use crate::{Error, Result};

/// Sending, reading and batch maintenance of email messages.
pub struct EmailMessageOperations {
    service: Arc<dyn EmailMessageService>,
    accounts: Arc<dyn EmailAccountService>,
    context: Context,
}

impl EmailMessageOperations {
    pub(crate) fn new(
        service: Arc<dyn EmailMessageService>,
        accounts: Arc<dyn EmailAccountService>,
        context: Context,
    ) -> Self {
        Self {
            service,
            accounts,
            context,
        }
    }

    /// Sends a message.
    ///
    /// The message is end-to-end encrypted when the sender and every
    /// recipient are in-network addresses with a published key; otherwise it
    /// is sent as-is. An encrypted message carries one key exchange
    /// attachment per key holder, the sender included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a missing sender, no recipients
    /// or a prohibited attachment, [`Error::InvalidEmailAddress`] for a
    /// malformed address, [`Error::LimitExceeded`] for too many recipients,
    /// [`Error::MessageSizeLimitExceeded`] for an oversized message, or the
    /// mapped backend error.
    pub async fn send_email_message(
        &self,
        input: SendEmailMessageInput,
    ) -> Result<SendEmailMessageResult> {
        let sender_id = require_id(&input.sender_email_address_id)?.to_string();
        let from = require_valid_address(&input.from.address)?;
        let recipients = input
            .recipients()
            .map(|mailbox| require_valid_address(&mailbox.address))
            .collect::<Result<BTreeSet<_>>>()?;
        if recipients.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one recipient is required".to_string(),
            ));
        }

        let sender = require_address(self.accounts.as_ref(), &sender_id).await?;
        if sender.email_address != from {
            return Err(Error::InvalidArgument(format!(
                "{from} is not the address of sender {sender_id}"
            )));
        }

        let config = self.service.get_config().await?;
        check_attachments(&config, &input)?;

        let mut lookup = recipients.clone();
        lookup.insert(from.clone());
        let lookup: Vec<String> = lookup.into_iter().collect();
        let keys = self.accounts.lookup_public_info(&lookup).await?;
        let known: HashSet<String> = keys
            .iter()
            .map(|info| info.email_address.to_lowercase())
            .collect();
        let encrypted = known.contains(&from) && recipients.iter().all(|r| known.contains(r));

        let limit = if encrypted {
            config.encrypted_email_message_recipients_limit
        } else {
            config.email_message_recipients_limit
        };
        if recipients.len() > limit as usize {
            return Err(Error::LimitExceeded(format!(
                "{} recipients exceed the limit of {limit}",
                recipients.len()
            )));
        }

        let details = EmailMessageDetails {
            from: vec![input.from],
            to: input.to,
            cc: input.cc,
            bcc: input.bcc,
            reply_to: input.reply_to,
            subject: input.subject,
            body: input.body,
            body_format: input.body_format,
            attachments: input.attachments,
            inline_attachments: input.inline_attachments,
            encryption_status: EncryptionStatus::Unencrypted,
            date: Some(Utc::now()),
            message_id: None,
            in_reply_to: input.in_reply_to,
            references: input.references,
        };

        let (rfc822_data, encryption_status) = if encrypted {
            let inner = encode_internet_message(&details)?;
            let package = self
                .context
                .sealing()
                .seal_for_recipients(&inner, &keys)
                .await?;
            if let Some(missing) = lookup
                .iter()
                .find(|a| package.key_exchange_for(a).is_none())
            {
                return Err(Error::Sealing(format!("no key exchange was produced for {missing}")));
            }

            let mut attachments = Vec::with_capacity(package.key_exchanges.len() + 1);
            attachments.push(SecureAttachmentType::Body.attachment(package.body));
            for (index, key_exchange) in package.key_exchanges.iter().enumerate() {
                attachments.push(
                    SecureAttachmentType::KeyExchange
                        .indexed_attachment(index, serde_json::to_vec(key_exchange)?),
                );
            }
            let envelope = EmailMessageDetails {
                body: None,
                attachments,
                inline_attachments: Vec::new(),
                encryption_status: EncryptionStatus::Encrypted,
                ..details
            };
            (encode_internet_message(&envelope)?, EncryptionStatus::Encrypted)
        } else {
            (encode_internet_message(&details)?, EncryptionStatus::Unencrypted)
        };

        let size = rfc822_data.len() as u64;
        if size > config.email_message_max_outbound_message_size {
            return Err(Error::MessageSizeLimitExceeded {
                size,
                limit: config.email_message_max_outbound_message_size,
            });
        }

        let result = self
            .service
            .send(SendEmailMessageRequest {
                email_address_id: sender_id,
                rfc822_data,
                encryption_status,
            })
            .await?;
        info!(
            id = %result.id,
            recipients = recipients.len(),
            encrypted,
            size,
            "Sent email message"
        );
        Ok(result)
    }

    /// Moves messages or changes their seen flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no change or no id is given,
    /// [`Error::LimitExceeded`] when there are more ids than the update
    /// limit, or the mapped backend error.
    pub async fn update_email_messages(
        &self,
        input: UpdateEmailMessagesInput,
    ) -> Result<BatchOperationResult<UpdatedEmailMessageSuccess, EmailMessageOperationFailure>>
    {
        if input.values.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one value to update is required".to_string(),
            ));
        }
        if let Some(folder_id) = &input.values.folder_id {
            require_id(folder_id)?;
        }

        let config = self.service.get_config().await?;
        let ids = unique_batch_ids(&input.ids, config.update_email_messages_limit, "message")?;

        let outcome = self.service.update(&ids, &input.values).await?;
        let result = BatchOperationResult::new(outcome.success_values, outcome.failure_values);
        for success in &result.success_values {
            self.context.evict(CacheKind::EmailMessage, &success.id).await;
        }
        log_batch("Updated email messages", &result);
        Ok(result)
    }

    /// Deletes messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no id is given,
    /// [`Error::LimitExceeded`] when there are more ids than the delete
    /// limit, or the mapped backend error.
    pub async fn delete_email_messages(
        &self,
        ids: &[String],
    ) -> Result<BatchOperationResult<String, EmailMessageOperationFailure>> {
        let config = self.service.get_config().await?;
        let ids = unique_batch_ids(ids, config.delete_email_messages_limit, "message")?;

        let outcome = self.service.delete(&ids).await?;
        let result = BatchOperationResult::new(outcome.success_values, outcome.failure_values);
        for id in &result.success_values {
            self.context.evict(CacheKind::EmailMessage, id).await;
        }
        log_batch("Deleted email messages", &result);
        Ok(result)
    }

    /// Deletes one message. Returns `None` if the backend reported a
    /// failure for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty id, or the mapped
    /// backend error.
    pub async fn delete_email_message(&self, id: &str) -> Result<Option<String>> {
        let id = require_id(id)?;
        let result = self.delete_email_messages(&[id.to_string()]).await?;
        if let Some(failure) = result.failure_values.first() {
            debug!(id, error_type = %failure.error_type, "Email message not deleted");
        }
        Ok(result.success_values.into_iter().next())
    }

    /// Reads one message.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error, a cache error or a sealing error.
    pub async fn get_email_message(
        &self,
        input: GetEmailMessageInput,
    ) -> Result<Option<EmailMessage>> {
        let id = require_id(&input.id)?;
        let record = match input.cache_policy {
            CachePolicy::CacheOnly => self.context.cached::<EmailMessageRecord>(id).await?,
            CachePolicy::RemoteOnly => {
                let record = self.service.get(id).await?;
                if let Some(record) = &record {
                    self.context.write_through(std::slice::from_ref(record)).await;
                }
                record
            }
        };

        match record {
            Some(record) => unseal_message(self.context.sealing(), record).await.map(Some),
            None => Ok(None),
        }
    }

    /// Lists every message of the caller.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error or a cache error.
    pub async fn list_email_messages(
        &self,
        input: ListEmailMessagesInput,
    ) -> Result<ListOutput<EmailMessage>> {
        self.list(MessageScope::All, input).await
    }

    /// Lists the messages of one address.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error or a cache error.
    pub async fn list_email_messages_for_email_address_id(
        &self,
        email_address_id: &str,
        input: ListEmailMessagesInput,
    ) -> Result<ListOutput<EmailMessage>> {
        let email_address_id = require_id(email_address_id)?;
        self.list(MessageScope::EmailAddress(email_address_id.to_string()), input)
            .await
    }

    /// Lists the messages in one folder.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error or a cache error.
    pub async fn list_email_messages_for_email_folder_id(
        &self,
        email_folder_id: &str,
        input: ListEmailMessagesInput,
    ) -> Result<ListOutput<EmailMessage>> {
        let email_folder_id = require_id(email_folder_id)?;
        self.list(MessageScope::Folder(email_folder_id.to_string()), input)
            .await
    }

    /// Reads the unsealed RFC 822 data of a message.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error or a sealing error.
    pub async fn get_email_message_rfc822_data(
        &self,
        input: GetEmailMessageDataInput,
    ) -> Result<Option<EmailMessageRfc822Data>> {
        let id = require_id(&input.id)?;
        let email_address_id = require_id(&input.email_address_id)?;

        let Some(sealed) = self.service.get_rfc822_data(id, email_address_id).await? else {
            return Ok(None);
        };
        let rfc822_data = self.context.sealing().unseal(&sealed).await?;
        Ok(Some(EmailMessageRfc822Data {
            id: id.to_string(),
            rfc822_data,
        }))
    }

    /// Reads and decodes the body of a message, opening encrypted bodies.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error, a sealing error, or a format error
    /// if the message cannot be decoded.
    pub async fn get_email_message_with_body(
        &self,
        input: GetEmailMessageDataInput,
    ) -> Result<Option<EmailMessageWithBody>> {
        let reader_id = input.email_address_id.clone();
        let Some(data) = self.get_email_message_rfc822_data(input).await? else {
            return Ok(None);
        };

        let mut details = decode_internet_message(&data.rfc822_data)?;
        if details.encryption_status == EncryptionStatus::Encrypted {
            let reader = require_address(self.accounts.as_ref(), &reader_id).await?;
            details = self
                .open_encrypted(&data.id, &reader.email_address, &details)
                .await?;
        }

        Ok(Some(EmailMessageWithBody {
            id: data.id,
            body: details.body,
            body_format: details.body_format,
            attachments: details.attachments,
            inline_attachments: details.inline_attachments,
        }))
    }

    /// Current service limits.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn get_email_config(&self) -> Result<EmailConfig> {
        Ok(self.service.get_config().await?)
    }

    async fn list(
        &self,
        scope: MessageScope,
        input: ListEmailMessagesInput,
    ) -> Result<ListOutput<EmailMessage>> {
        let page = match input.cache_policy {
            CachePolicy::CacheOnly => {
                let (parent_id, group_id) = match &scope {
                    MessageScope::All => (None, None),
                    MessageScope::EmailAddress(id) => (Some(id.clone()), None),
                    MessageScope::Folder(id) => (None, Some(id.clone())),
                };
                let query = CacheQuery {
                    parent_id,
                    group_id,
                    sort_from: input.date_range.map(|r| timestamp_sort_key(r.start)),
                    sort_to: input.date_range.map(|r| timestamp_sort_key(r.end)),
                    descending: input.sort_order == SortOrder::Desc,
                    ..CacheQuery::default()
                };
                self.context
                    .cached_page::<EmailMessageRecord>(query, &input.pagination)
                    .await?
            }
            CachePolicy::RemoteOnly => {
                let filter = ListEmailMessagesInput {
                    pagination: self.context.page(&input.pagination)?,
                    ..input
                };
                let page = self.service.list(&scope, &filter).await?;
                self.context.write_through(&page.items).await;
                page
            }
        };

        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            let id = record.id.clone();
            match unseal_message(self.context.sealing(), record).await {
                Ok(message) => items.push(message),
                Err(e) => warn!(id = %id, error = %e, "Skipping email message that failed to unseal"),
            }
        }
        Ok(ListOutput::new(items, page.next_token))
    }

    async fn open_encrypted(
        &self,
        id: &str,
        reader: &str,
        envelope: &EmailMessageDetails,
    ) -> Result<EmailMessageDetails> {
        let Some(body) = envelope.secure_body() else {
            return Err(Error::Sealing(format!(
                "encrypted message {id} is missing its secure body"
            )));
        };

        let mut key_exchanges = Vec::new();
        for attachment in envelope.key_exchanges() {
            match serde_json::from_slice::<KeyExchange>(&attachment.data) {
                Ok(key_exchange) => key_exchanges.push(key_exchange),
                Err(e) => warn!(id, error = %e, "Ignoring malformed key exchange attachment"),
            }
        }
        let package = SecurePackage {
            body: body.data.clone(),
            key_exchanges,
        };
        let Some(key_exchange) = package.key_exchange_for(reader) else {
            return Err(Error::Sealing(format!(
                "encrypted message {id} has no key exchange for {reader}"
            )));
        };

        let inner = self
            .context
            .sealing()
            .open_package(&package.body, key_exchange)
            .await?;
        debug!(id, reader, "Opened encrypted email message");
        Ok(decode_internet_message(&inner)?)
    }
}

/// Unseals the envelope of a message record.
async fn unseal_message(
    sealing: &dyn SealingService,
    record: EmailMessageRecord,
) -> Result<EmailMessage> {
    let headers: EmailMessageHeaders = unseal_json(sealing, &record.sealed_headers).await?;
    Ok(EmailMessage::from_record(record, headers))
}

fn check_attachments(config: &EmailConfig, input: &SendEmailMessageInput) -> Result<()> {
    for attachment in input.attachments.iter().chain(&input.inline_attachments) {
        if let Some(extension) = attachment.extension() {
            if config.is_prohibited_extension(&extension) {
                return Err(Error::InvalidArgument(format!(
                    "attachment {} has a prohibited file type",
                    attachment.filename
                )));
            }
        }
    }
    Ok(())
}

fn log_batch<S, F>(what: &str, result: &BatchOperationResult<S, F>) {
    let succeeded = result.success_values.len();
    let failed = result.failure_values.len();
    if result.status == BatchOperationStatus::Success {
        debug!(succeeded, "{what}");
    } else {
        warn!(status = ?result.status, succeeded, failed, "{what}");
    }
}
