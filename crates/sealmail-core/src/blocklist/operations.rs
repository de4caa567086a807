//! Blocklist use cases.

use std::collections::HashSet;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::model::{
    BlockEmailAddressesInput, BlockedAddressLevel, BlockedAddressRecord,
    UnblockEmailAddressesByHashedValueInput, UnblockEmailAddressesInput, UnsealedBlockedAddress,
    UnsealedBlockedAddressStatus,
};
use super::service::BlocklistService;
use crate::address::{
    domain_of, normalize_email_address, require_id, require_valid_address, validate_domain,
};
use crate::common::BatchOperationResult;
use crate::context::Context;
use crate::{Error, Result};

/// Blocking and unblocking of senders.
pub struct BlocklistOperations {
    service: Arc<dyn BlocklistService>,
    context: Context,
}

impl BlocklistOperations {
    pub(crate) fn new(service: Arc<dyn BlocklistService>, context: Context) -> Self {
        Self { service, context }
    }

    /// Blocks senders. Success and failure values are the normalized
    /// addresses (or domains, at `Domain` level).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty or duplicated list,
    /// [`Error::InvalidEmailAddress`] for a malformed value, or the mapped
    /// backend error.
    pub async fn block_email_addresses(
        &self,
        input: BlockEmailAddressesInput,
    ) -> Result<BatchOperationResult<String, String>> {
        let owner = require_id(&input.owner)?;
        let scope = scope_of(owner, input.email_address_id.as_deref())?;
        let values = normalize_values(&input.blocked_addresses, Some(input.level))?;

        let mut entries = Vec::with_capacity(values.len());
        let mut hashes = Vec::with_capacity(values.len());
        for value in &values {
            let hashed_blocked_value = hash_blocked_value(scope, value);
            hashes.push(hashed_blocked_value.clone());
            entries.push(BlockedAddressRecord {
                hashed_blocked_value,
                sealed_value: self.context.sealing().seal_string(value).await?,
                level: input.level,
                action: input.action,
                email_address_id: input.email_address_id.clone(),
            });
        }

        let failed = self.service.block(owner, entries).await?;
        let result = split_by_hash(values, &hashes, &failed);
        info!(
            status = ?result.status,
            blocked = result.success_values.len(),
            level = ?input.level,
            "Blocked email addresses"
        );
        Ok(result)
    }

    /// Unblocks senders by value. Values with an `@` are addresses, others
    /// are domains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty or duplicated list,
    /// [`Error::InvalidEmailAddress`] for a malformed value, or the mapped
    /// backend error.
    pub async fn unblock_email_addresses(
        &self,
        input: UnblockEmailAddressesInput,
    ) -> Result<BatchOperationResult<String, String>> {
        let owner = require_id(&input.owner)?;
        let scope = scope_of(owner, input.email_address_id.as_deref())?;
        let values = normalize_values(&input.unblocked_addresses, None)?;

        let hashes: Vec<String> = values
            .iter()
            .map(|value| hash_blocked_value(scope, value))
            .collect();
        let failed = self.service.unblock(owner, &hashes).await?;
        let result = split_by_hash(values, &hashes, &failed);
        info!(
            status = ?result.status,
            unblocked = result.success_values.len(),
            "Unblocked email addresses"
        );
        Ok(result)
    }

    /// Unblocks senders by entry hash, for entries whose value cannot be
    /// unsealed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty or duplicated list, or
    /// the mapped backend error.
    pub async fn unblock_email_addresses_by_hashed_value(
        &self,
        input: UnblockEmailAddressesByHashedValueInput,
    ) -> Result<BatchOperationResult<String, String>> {
        let owner = require_id(&input.owner)?;
        let hashes: Vec<String> = input
            .hashed_values
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        require_distinct(&hashes, "hashed value")?;

        let failed = self.service.unblock(owner, &hashes).await?;
        let result = split_by_hash(hashes.clone(), &hashes, &failed);
        info!(
            status = ?result.status,
            unblocked = result.success_values.len(),
            "Unblocked email addresses by hashed value"
        );
        Ok(result)
    }

    /// Reads the owner's blocklist. Entries that cannot be unsealed are
    /// returned with a `Failed` status.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn get_email_address_blocklist(
        &self,
        owner: &str,
    ) -> Result<Vec<UnsealedBlockedAddress>> {
        let owner = require_id(owner)?;
        let records = self.service.get(owner).await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let unsealed = self
                .context
                .sealing()
                .unseal_string(&record.sealed_value)
                .await;
            let (address, status) = match unsealed {
                Ok(address) => (address, UnsealedBlockedAddressStatus::Completed),
                Err(e) => {
                    warn!(
                        hash = %record.hashed_blocked_value,
                        error = %e,
                        "Failed to unseal blocklist entry"
                    );
                    (
                        String::new(),
                        UnsealedBlockedAddressStatus::Failed {
                            error_type: e.error_type().to_string(),
                        },
                    )
                }
            };
            entries.push(UnsealedBlockedAddress {
                hashed_blocked_value: record.hashed_blocked_value,
                address,
                level: record.level,
                action: record.action,
                email_address_id: record.email_address_id,
                status,
            });
        }
        Ok(entries)
    }
}

/// Hash identifying a blocklist entry: SHA-256 over `scope|value`, base64url
/// without padding. `scope` is the address id for scoped entries and the
/// owner otherwise.
#[must_use]
pub fn hash_blocked_value(scope: &str, normalized_value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update(b"|");
    hasher.update(normalized_value.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn scope_of<'a>(owner: &'a str, email_address_id: Option<&'a str>) -> Result<&'a str> {
    match email_address_id {
        Some(id) => require_id(id),
        None => Ok(owner),
    }
}

/// Normalizes blocklist values. With `Some(Domain)` addresses are reduced to
/// their domain; with `None` the level is inferred per value.
fn normalize_values(values: &[String], level: Option<BlockedAddressLevel>) -> Result<Vec<String>> {
    let normalized = values
        .iter()
        .map(|value| -> Result<String> {
            let is_address = value.contains('@');
            match (level, is_address) {
                (Some(BlockedAddressLevel::Address), _) | (None, true) => {
                    require_valid_address(value)
                }
                (Some(BlockedAddressLevel::Domain), true) => {
                    require_valid_address(value).map(|address| domain_of(&address).to_string())
                }
                (_, false) => {
                    let domain = normalize_email_address(value);
                    validate_domain(&domain).map_err(|reason| Error::InvalidEmailAddress {
                        address: value.clone(),
                        reason,
                    })?;
                    Ok(domain)
                }
            }
        })
        .collect::<Result<Vec<_>>>()?;

    require_distinct(&normalized, "blocked address")?;
    Ok(normalized)
}

fn require_distinct(values: &[String], what: &str) -> Result<()> {
    if values.is_empty() || values.iter().any(String::is_empty) {
        return Err(Error::InvalidArgument(format!(
            "at least one non-empty {what} is required"
        )));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = values.iter().find(|v| !seen.insert(v.as_str())) {
        return Err(Error::InvalidArgument(format!("duplicate {what}: {duplicate}")));
    }
    Ok(())
}

fn split_by_hash(
    values: Vec<String>,
    hashes: &[String],
    failed_hashes: &[String],
) -> BatchOperationResult<String, String> {
    let failed: HashSet<&str> = failed_hashes.iter().map(String::as_str).collect();
    BatchOperationResult::from_results(values.into_iter().zip(hashes).map(|(value, hash)| {
        if failed.contains(hash.as_str()) {
            Err(value)
        } else {
            Ok(value)
        }
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::common::BatchOperationStatus;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_hash_is_scoped_and_stable() {
        let a = hash_blocked_value("owner-1", "spam@example.com");
        assert_eq!(a, hash_blocked_value("owner-1", "spam@example.com"));
        assert_ne!(a, hash_blocked_value("owner-2", "spam@example.com"));
        assert_ne!(a, hash_blocked_value("owner-1", "spam@example.org"));
        // 32 bytes, base64url without padding
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_normalize_values_by_level() {
        let values = normalize_values(
            &strings(&[" Spam@Example.com", "other@example.org"]),
            Some(BlockedAddressLevel::Address),
        )
        .unwrap();
        assert_eq!(values, strings(&["spam@example.com", "other@example.org"]));

        let values = normalize_values(
            &strings(&["spam@Example.com", "junk.example.net"]),
            Some(BlockedAddressLevel::Domain),
        )
        .unwrap();
        assert_eq!(values, strings(&["example.com", "junk.example.net"]));

        let values = normalize_values(&strings(&["a@example.com", "example.org"]), None).unwrap();
        assert_eq!(values, strings(&["a@example.com", "example.org"]));
    }

    #[test]
    fn test_normalize_values_rejects_bad_input() {
        assert!(matches!(
            normalize_values(&[], None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize_values(&strings(&["a@example.com", "A@EXAMPLE.COM"]), None),
            Err(Error::InvalidArgument(_))
        ));
        // two addresses on one domain collapse at domain level
        assert!(matches!(
            normalize_values(
                &strings(&["a@example.com", "b@example.com"]),
                Some(BlockedAddressLevel::Domain)
            ),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize_values(&strings(&["not an address@"]), None),
            Err(Error::InvalidEmailAddress { .. })
        ));
    }

    #[test]
    fn test_split_by_hash() {
        let result = split_by_hash(
            strings(&["a", "b"]),
            &strings(&["h1", "h2"]),
            &strings(&["h2"]),
        );
        assert_eq!(result.status, BatchOperationStatus::Partial);
        assert_eq!(result.success_values, strings(&["a"]));
        assert_eq!(result.failure_values, strings(&["b"]));
    }
}
