//! Email message data models.

use chrono::{DateTime, Utc};
use sealmail_mime::{Attachment, BodyFormat, EncryptionStatus, Mailbox};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheIndex, CacheKind, Cacheable, timestamp_sort_key};
use crate::common::{CachePolicy, DateRange, Pagination, SortOrder};
use crate::sealing::SealedData;

/// Whether a message was received or sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Received by one of the caller's addresses.
    Inbound,
    /// Sent from one of the caller's addresses.
    Outbound,
}

/// Delivery state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailMessageState {
    /// Accepted, not yet handed off.
    Queued,
    /// Handed off to the next hop.
    Sent,
    /// Delivered to the recipient's mailbox.
    Delivered,
    /// Could not be delivered.
    Undelivered,
    /// Sending failed.
    Failed,
    /// Received from outside.
    Received,
}

/// Envelope fields of a message, sealed as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessageHeaders {
    /// Sender(s).
    pub from: Vec<Mailbox>,
    /// To recipients.
    pub to: Vec<Mailbox>,
    /// Cc recipients.
    pub cc: Vec<Mailbox>,
    /// Bcc recipients.
    pub bcc: Vec<Mailbox>,
    /// Reply-To addresses.
    pub reply_to: Vec<Mailbox>,
    /// Subject.
    pub subject: Option<String>,
}

/// Email message as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessageRecord {
    /// Message id.
    pub id: String,
    /// Client supplied reference.
    pub client_ref_id: Option<String>,
    /// Owning user.
    pub owner: String,
    /// Email address the message belongs to.
    pub email_address_id: String,
    /// Current folder.
    pub folder_id: String,
    /// Folder before the last move.
    pub previous_folder_id: Option<String>,
    /// Whether the message has been seen.
    pub seen: bool,
    /// Whether the message has been replied to.
    pub replied_to: bool,
    /// Whether the message has been forwarded.
    pub forwarded: bool,
    /// Inbound or outbound.
    pub direction: Direction,
    /// Delivery state.
    pub state: EmailMessageState,
    /// Record version.
    pub version: u32,
    /// Size of the RFC 822 data in bytes.
    pub size: u64,
    /// Whether the message carries attachments.
    pub has_attachments: bool,
    /// Whether the body is end-to-end encrypted.
    pub encryption_status: EncryptionStatus,
    /// Date header.
    pub date: Option<DateTime<Utc>>,
    /// Timestamp used for ordering.
    pub sort_date: DateTime<Utc>,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Sealed [`EmailMessageHeaders`].
    pub sealed_headers: SealedData,
}

impl Cacheable for EmailMessageRecord {
    const KIND: CacheKind = CacheKind::EmailMessage;

    fn cache_id(&self) -> &str {
        &self.id
    }

    fn cache_index(&self) -> CacheIndex {
        CacheIndex {
            parent_id: Some(self.email_address_id.clone()),
            group_id: Some(self.folder_id.clone()),
            sort_key: timestamp_sort_key(self.sort_date),
        }
    }
}

/// Email message with its envelope unsealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Message id.
    pub id: String,
    /// Client supplied reference.
    pub client_ref_id: Option<String>,
    /// Owning user.
    pub owner: String,
    /// Email address the message belongs to.
    pub email_address_id: String,
    /// Current folder.
    pub folder_id: String,
    /// Folder before the last move.
    pub previous_folder_id: Option<String>,
    /// Whether the message has been seen.
    pub seen: bool,
    /// Whether the message has been replied to.
    pub replied_to: bool,
    /// Whether the message has been forwarded.
    pub forwarded: bool,
    /// Inbound or outbound.
    pub direction: Direction,
    /// Delivery state.
    pub state: EmailMessageState,
    /// Record version.
    pub version: u32,
    /// Size of the RFC 822 data in bytes.
    pub size: u64,
    /// Whether the message carries attachments.
    pub has_attachments: bool,
    /// Whether the body is end-to-end encrypted.
    pub encryption_status: EncryptionStatus,
    /// Date header.
    pub date: Option<DateTime<Utc>>,
    /// Timestamp used for ordering.
    pub sort_date: DateTime<Utc>,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Sender(s).
    pub from: Vec<Mailbox>,
    /// To recipients.
    pub to: Vec<Mailbox>,
    /// Cc recipients.
    pub cc: Vec<Mailbox>,
    /// Bcc recipients.
    pub bcc: Vec<Mailbox>,
    /// Reply-To addresses.
    pub reply_to: Vec<Mailbox>,
    /// Subject.
    pub subject: Option<String>,
}

impl EmailMessage {
    pub(crate) fn from_record(record: EmailMessageRecord, headers: EmailMessageHeaders) -> Self {
        Self {
            id: record.id,
            client_ref_id: record.client_ref_id,
            owner: record.owner,
            email_address_id: record.email_address_id,
            folder_id: record.folder_id,
            previous_folder_id: record.previous_folder_id,
            seen: record.seen,
            replied_to: record.replied_to,
            forwarded: record.forwarded,
            direction: record.direction,
            state: record.state,
            version: record.version,
            size: record.size,
            has_attachments: record.has_attachments,
            encryption_status: record.encryption_status,
            date: record.date,
            sort_date: record.sort_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
            from: headers.from,
            to: headers.to,
            cc: headers.cc,
            bcc: headers.bcc,
            reply_to: headers.reply_to,
            subject: headers.subject,
        }
    }
}

/// Input for sending a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendEmailMessageInput {
    /// Address the message is sent from.
    pub sender_email_address_id: String,
    /// Sender mailbox; must be the address behind `sender_email_address_id`.
    pub from: Mailbox,
    /// To recipients.
    pub to: Vec<Mailbox>,
    /// Cc recipients.
    pub cc: Vec<Mailbox>,
    /// Bcc recipients.
    pub bcc: Vec<Mailbox>,
    /// Reply-To addresses.
    pub reply_to: Vec<Mailbox>,
    /// Subject.
    pub subject: Option<String>,
    /// Body text.
    pub body: Option<String>,
    /// Body format.
    pub body_format: BodyFormat,
    /// Regular attachments.
    pub attachments: Vec<Attachment>,
    /// Inline attachments.
    pub inline_attachments: Vec<Attachment>,
    /// Message being replied to.
    pub in_reply_to: Option<String>,
    /// Thread references.
    pub references: Vec<String>,
}

impl SendEmailMessageInput {
    /// All recipients: To, Cc and Bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }
}

/// What the backend receives to send a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendEmailMessageRequest {
    /// Address the message is sent from.
    pub email_address_id: String,
    /// Encoded RFC 822 message.
    pub rfc822_data: Vec<u8>,
    /// Whether the body is end-to-end encrypted.
    pub encryption_status: EncryptionStatus,
}

/// Result of sending a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailMessageResult {
    /// Id of the sent message.
    pub id: String,
    /// When the message was accepted.
    pub created_at: DateTime<Utc>,
}

/// Changes applied by a batch update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEmailMessagesValues {
    /// Move to this folder.
    pub folder_id: Option<String>,
    /// Mark seen or unseen.
    pub seen: Option<bool>,
}

impl UpdateEmailMessagesValues {
    /// Whether no change is requested.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.folder_id.is_none() && self.seen.is_none()
    }
}

/// Input for a batch update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateEmailMessagesInput {
    /// Messages to update.
    pub ids: Vec<String>,
    /// Changes to apply.
    pub values: UpdateEmailMessagesValues,
}

/// One successfully updated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedEmailMessageSuccess {
    /// Message id.
    pub id: String,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// New update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for reading one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEmailMessageInput {
    /// Message id.
    pub id: String,
    /// Where to read from.
    pub cache_policy: CachePolicy,
}

/// Which messages a list call covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageScope {
    /// Every message of the caller.
    All,
    /// Messages of one address.
    EmailAddress(String),
    /// Messages in one folder.
    Folder(String),
}

/// Filters shared by the message list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEmailMessagesInput {
    /// Only messages whose sort date falls in this range.
    pub date_range: Option<DateRange>,
    /// Result order by sort date.
    pub sort_order: SortOrder,
    /// Include messages in the trash.
    pub include_deleted_messages: bool,
    /// Where to read from.
    pub cache_policy: CachePolicy,
    /// Page request.
    pub pagination: Pagination,
}

/// Input for reading raw message data or the decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEmailMessageDataInput {
    /// Message id.
    pub id: String,
    /// Email address the message belongs to.
    pub email_address_id: String,
}

/// Raw RFC 822 data of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessageRfc822Data {
    /// Message id.
    pub id: String,
    /// Unsealed RFC 822 data.
    pub rfc822_data: Vec<u8>,
}

/// Decoded body of a message; encrypted bodies are opened first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessageWithBody {
    /// Message id.
    pub id: String,
    /// Body text.
    pub body: Option<String>,
    /// Body format.
    pub body_format: BodyFormat,
    /// Regular attachments.
    pub attachments: Vec<Attachment>,
    /// Inline attachments.
    pub inline_attachments: Vec<Attachment>,
}
