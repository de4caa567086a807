//! Draft and scheduled draft data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Pagination;
use crate::sealing::SealedData;

/// Draft identity and last update time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEmailMessageMetadata {
    /// Draft id.
    pub id: String,
    /// Email address the draft belongs to.
    pub email_address_id: String,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Draft as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedDraft {
    /// Identity and timestamps.
    pub metadata: DraftEmailMessageMetadata,
    /// Sealed RFC 822 data.
    pub sealed_rfc822_data: SealedData,
}

/// Draft with its RFC 822 data unsealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEmailMessage {
    /// Draft id.
    pub id: String,
    /// Email address the draft belongs to.
    pub email_address_id: String,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// RFC 822 data.
    pub rfc822_data: Vec<u8>,
}

/// Input for creating a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDraftEmailMessageInput {
    /// Address the draft will be sent from.
    pub sender_email_address_id: String,
    /// RFC 822 data.
    pub rfc822_data: Vec<u8>,
}

/// Input for replacing a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDraftEmailMessageInput {
    /// Draft id.
    pub id: String,
    /// Address the draft will be sent from.
    pub sender_email_address_id: String,
    /// RFC 822 data.
    pub rfc822_data: Vec<u8>,
}

/// Input for deleting drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDraftEmailMessagesInput {
    /// Draft ids.
    pub ids: Vec<String>,
    /// Email address the drafts belong to.
    pub email_address_id: String,
}

/// Identifies one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEmailMessageKey {
    /// Draft id.
    pub id: String,
    /// Email address the draft belongs to.
    pub email_address_id: String,
}

/// State of a scheduled send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduledDraftMessageState {
    /// Waiting for its send time.
    Scheduled,
    /// Sending failed.
    Failed,
    /// Sent.
    Sent,
    /// Cancelled before sending.
    Cancelled,
}

/// A draft scheduled to be sent later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDraftMessage {
    /// Draft id.
    pub draft_message_id: String,
    /// Email address the draft belongs to.
    pub email_address_id: String,
    /// Owning user.
    pub owner: String,
    /// When the draft will be sent.
    pub send_at: DateTime<Utc>,
    /// Current state.
    pub state: ScheduledDraftMessageState,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for scheduling a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSendDraftMessageInput {
    /// Draft id.
    pub id: String,
    /// Email address the draft belongs to.
    pub email_address_id: String,
    /// When to send; must be in the future.
    pub send_at: DateTime<Utc>,
}

/// Filter on scheduled draft state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledDraftMessageStateFilter {
    /// State equals the value.
    Equal(ScheduledDraftMessageState),
    /// State is one of the values.
    OneOf(Vec<ScheduledDraftMessageState>),
    /// State differs from the value.
    NotEqual(ScheduledDraftMessageState),
    /// State is none of the values.
    NotOneOf(Vec<ScheduledDraftMessageState>),
}

impl ScheduledDraftMessageStateFilter {
    /// Whether `state` passes the filter.
    #[must_use]
    pub fn matches(&self, state: ScheduledDraftMessageState) -> bool {
        match self {
            Self::Equal(value) => state == *value,
            Self::OneOf(values) => values.contains(&state),
            Self::NotEqual(value) => state != *value,
            Self::NotOneOf(values) => !values.contains(&state),
        }
    }
}

/// Input for listing scheduled drafts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListScheduledDraftMessagesInput {
    /// Email address the drafts belong to.
    pub email_address_id: String,
    /// Optional state filter.
    pub state: Option<ScheduledDraftMessageStateFilter>,
    /// Page request.
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::ScheduledDraftMessageState::{Cancelled, Failed, Scheduled, Sent};
    use super::*;

    #[test]
    fn test_state_filter() {
        assert!(ScheduledDraftMessageStateFilter::Equal(Scheduled).matches(Scheduled));
        assert!(!ScheduledDraftMessageStateFilter::Equal(Scheduled).matches(Sent));

        let one_of = ScheduledDraftMessageStateFilter::OneOf(vec![Sent, Failed]);
        assert!(one_of.matches(Failed));
        assert!(!one_of.matches(Cancelled));

        assert!(ScheduledDraftMessageStateFilter::NotEqual(Sent).matches(Scheduled));
        assert!(!ScheduledDraftMessageStateFilter::NotEqual(Sent).matches(Sent));

        let not_one_of = ScheduledDraftMessageStateFilter::NotOneOf(vec![Sent, Cancelled]);
        assert!(not_one_of.matches(Scheduled));
        assert!(!not_one_of.matches(Cancelled));
    }
}
