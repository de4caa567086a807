//! Cache data models.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Kind of cached entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Email address records.
    EmailAddress,
    /// Email folder records.
    EmailFolder,
    /// Email message records.
    EmailMessage,
}

impl CacheKind {
    /// Stored discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmailAddress => "email_address",
            Self::EmailFolder => "email_folder",
            Self::EmailMessage => "email_message",
        }
    }
}

/// Secondary keys stored next to a cached payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheIndex {
    /// Owning entity, e.g. the email address of a folder or message.
    pub parent_id: Option<String>,
    /// Grouping entity, e.g. the folder of a message.
    pub group_id: Option<String>,
    /// Ordering key; compared as text.
    pub sort_key: String,
}

/// Filter for listing cached entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheQuery {
    /// Only entities with this parent.
    pub parent_id: Option<String>,
    /// Only entities in this group.
    pub group_id: Option<String>,
    /// Inclusive lower bound on the sort key.
    pub sort_from: Option<String>,
    /// Inclusive upper bound on the sort key.
    pub sort_to: Option<String>,
    /// Largest sort key first.
    pub descending: bool,
    /// Maximum rows returned.
    pub limit: u32,
    /// Rows skipped.
    pub offset: u32,
}

/// A record that can be written to the local cache.
pub trait Cacheable: Serialize + DeserializeOwned {
    /// Kind under which the record is stored.
    const KIND: CacheKind;

    /// Primary key.
    fn cache_id(&self) -> &str;

    /// Secondary keys.
    fn cache_index(&self) -> CacheIndex;
}

/// Sort key for a timestamp; fixed width so text order is time order.
#[must_use]
pub fn timestamp_sort_key(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
