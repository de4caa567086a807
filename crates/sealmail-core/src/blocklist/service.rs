//! Backend interface for blocklists.

use async_trait::async_trait;

use super::model::BlockedAddressRecord;
use crate::error::ServiceResult;

/// Blocklist storage offered by the backend.
#[async_trait]
pub trait BlocklistService: Send + Sync {
    /// Adds entries. Returns the hashes of entries that could not be stored.
    async fn block(
        &self,
        owner: &str,
        entries: Vec<BlockedAddressRecord>,
    ) -> ServiceResult<Vec<String>>;

    /// Removes entries. Returns the hashes that could not be removed.
    async fn unblock(&self, owner: &str, hashed_values: &[String]) -> ServiceResult<Vec<String>>;

    /// Every entry of the owner.
    async fn get(&self, owner: &str) -> ServiceResult<Vec<BlockedAddressRecord>>;
}
