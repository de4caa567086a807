//! Email address use cases.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::model::{
    CheckEmailAddressAvailabilityInput, EmailAddress, EmailAddressPublicInfo, EmailAddressRecord,
    GetEmailAddressInput, ListEmailAddressesInput, ProvisionEmailAddressInput,
    ProvisionEmailAddressRequest, UpdateEmailAddressMetadataInput,
};
use super::service::EmailAccountService;
use super::validation::{
    ValidationError, domain_of, normalize_email_address, require_valid_address, validate_domain,
    validate_local_part,
};
use crate::cache::{CacheKind, CacheQuery};
use crate::common::{CachePolicy, ListOutput};
use crate::context::Context;
use crate::folder::{EmailFolder, unseal_folder, unseal_listed_folder};
use crate::sealing::{SealingService, unseal_optional};
use crate::{Error, Result};

/// Provisioning and lookup of the caller's email addresses.
pub struct EmailAddressOperations {
    service: Arc<dyn EmailAccountService>,
    context: Context,
}

impl EmailAddressOperations {
    pub(crate) fn new(service: Arc<dyn EmailAccountService>, context: Context) -> Self {
        Self { service, context }
    }

    /// Provisions a new address on one of the supported domains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmailAddress`] if the address is malformed or
    /// its domain unsupported, or the mapped backend error.
    pub async fn provision_email_address(
        &self,
        input: ProvisionEmailAddressInput,
    ) -> Result<EmailAddress> {
        let email_address = require_valid_address(&input.email_address)?;
        self.require_supported_domain(&email_address).await?;

        let sealed_alias = match non_blank(input.alias.as_deref()) {
            Some(alias) => Some(self.context.sealing().seal_string(alias).await?),
            None => None,
        };

        let record = {
            let _guard = self.context.account_lock.lock().await;
            self.service
                .provision(ProvisionEmailAddressRequest {
                    email_address: email_address.clone(),
                    sealed_alias,
                })
                .await?
        };
        info!(id = %record.id, email_address = %email_address, "Provisioned email address");

        self.context.write_through(std::slice::from_ref(&record)).await;
        unseal_address(self.context.sealing(), record).await
    }

    /// Deprovisions an address and drops everything cached under it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty id, or the mapped
    /// backend error.
    pub async fn deprovision_email_address(&self, id: &str) -> Result<EmailAddress> {
        let id = require_id(id)?;

        let record = {
            let _guard = self.context.account_lock.lock().await;
            self.service.deprovision(id).await?
        };
        info!(id, "Deprovisioned email address");

        self.context.evict(CacheKind::EmailAddress, id).await;
        self.context.evict_children(CacheKind::EmailFolder, id).await;
        self.context.evict_children(CacheKind::EmailMessage, id).await;
        unseal_address(self.context.sealing(), record).await
    }

    /// Replaces the alias of an address. Returns the address id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty id, or the mapped
    /// backend error.
    pub async fn update_email_address_metadata(
        &self,
        input: UpdateEmailAddressMetadataInput,
    ) -> Result<String> {
        let id = require_id(&input.id)?;
        let sealed_alias = match non_blank(input.alias.as_deref()) {
            Some(alias) => Some(self.context.sealing().seal_string(alias).await?),
            None => None,
        };

        let updated = self.service.update_metadata(id, sealed_alias).await?;
        debug!(id = %updated, "Updated email address metadata");
        self.context.evict(CacheKind::EmailAddress, id).await;
        Ok(updated)
    }

    /// Reads one address.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error, a cache error or a sealing error.
    pub async fn get_email_address(
        &self,
        input: GetEmailAddressInput,
    ) -> Result<Option<EmailAddress>> {
        let record = match input.cache_policy {
            CachePolicy::CacheOnly => self.context.cached::<EmailAddressRecord>(&input.id).await?,
            CachePolicy::RemoteOnly => {
                let record = self.service.get(&input.id).await?;
                if let Some(record) = &record {
                    self.context.write_through(std::slice::from_ref(record)).await;
                }
                record
            }
        };

        match record {
            Some(record) => unseal_address(self.context.sealing(), record).await.map(Some),
            None => Ok(None),
        }
    }

    /// Lists the caller's addresses. Sealed names that cannot be unsealed
    /// are left out of the listed addresses.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error or a cache error.
    pub async fn list_email_addresses(
        &self,
        input: ListEmailAddressesInput,
    ) -> Result<ListOutput<EmailAddress>> {
        let page = match input.cache_policy {
            CachePolicy::CacheOnly => {
                self.context
                    .cached_page::<EmailAddressRecord>(CacheQuery::default(), &input.pagination)
                    .await?
            }
            CachePolicy::RemoteOnly => {
                let pagination = self.context.page(&input.pagination)?;
                let page = self.service.list(&pagination).await?;
                self.context.write_through(&page.items).await;
                page
            }
        };

        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            items.push(unseal_listed_address(self.context.sealing(), record).await);
        }
        Ok(ListOutput::new(items, page.next_token))
    }

    /// Looks up the published keys of in-network addresses. Addresses the
    /// service does not know are left out of the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmailAddress`] for a malformed address, or the
    /// mapped backend error.
    pub async fn lookup_email_addresses_public_info(
        &self,
        email_addresses: &[String],
    ) -> Result<Vec<EmailAddressPublicInfo>> {
        let unique = email_addresses
            .iter()
            .map(|address| require_valid_address(address))
            .collect::<Result<BTreeSet<_>>>()?;
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let unique: Vec<String> = unique.into_iter().collect();
        let mut info = self.service.lookup_public_info(&unique).await?;
        for entry in &mut info {
            entry.email_address = normalize_email_address(&entry.email_address);
        }
        Ok(info)
    }

    /// Returns the addresses, out of every combination of the given local
    /// parts and domains, that are free to provision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no local part is given,
    /// [`Error::InvalidEmailAddress`] for a malformed local part or an
    /// unsupported domain, or the mapped backend error.
    pub async fn check_email_address_availability(
        &self,
        input: CheckEmailAddressAvailabilityInput,
    ) -> Result<Vec<String>> {
        let local_parts = input
            .local_parts
            .iter()
            .map(|local| -> Result<String> {
                let normalized = normalize_email_address(local);
                validate_local_part(&normalized).map_err(|reason| Error::InvalidEmailAddress {
                    address: local.clone(),
                    reason,
                })?;
                Ok(normalized)
            })
            .collect::<Result<BTreeSet<_>>>()?;
        if local_parts.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one local part is required".to_string(),
            ));
        }

        let supported = self.get_supported_email_domains().await?;
        let domains = match input.domains {
            Some(domains) => {
                let mut checked = BTreeSet::new();
                for domain in domains {
                    let normalized = normalize_email_address(&domain);
                    validate_domain(&normalized)
                        .and_then(|()| {
                            if supported.contains(&normalized) {
                                Ok(())
                            } else {
                                Err(ValidationError::UnsupportedDomain)
                            }
                        })
                        .map_err(|reason| Error::InvalidEmailAddress {
                            address: domain.clone(),
                            reason,
                        })?;
                    checked.insert(normalized);
                }
                checked.into_iter().collect()
            }
            None => supported,
        };

        let local_parts: Vec<String> = local_parts.into_iter().collect();
        let available = self
            .service
            .check_availability(&local_parts, &domains)
            .await?;
        Ok(available
            .iter()
            .map(|address| normalize_email_address(address))
            .collect())
    }

    /// Domains addresses may be provisioned on, lowercased.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn get_supported_email_domains(&self) -> Result<Vec<String>> {
        let domains = self.service.supported_domains().await?;
        Ok(domains.iter().map(|d| normalize_email_address(d)).collect())
    }

    /// Every domain the service handles mail for, lowercased.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn get_configured_email_domains(&self) -> Result<Vec<String>> {
        let domains = self.service.configured_domains().await?;
        Ok(domains.iter().map(|d| normalize_email_address(d)).collect())
    }

    async fn require_supported_domain(&self, email_address: &str) -> Result<()> {
        let supported = self.get_supported_email_domains().await?;
        if supported.iter().any(|d| d == domain_of(email_address)) {
            Ok(())
        } else {
            Err(Error::InvalidEmailAddress {
                address: email_address.to_string(),
                reason: ValidationError::UnsupportedDomain,
            })
        }
    }
}

/// Checks that an address exists, for use cases that act on its behalf.
pub(crate) async fn require_address(
    service: &dyn EmailAccountService,
    id: &str,
) -> Result<EmailAddressRecord> {
    let id = require_id(id)?;
    service
        .get(id)
        .await?
        .ok_or_else(|| Error::AddressNotFound(id.to_string()))
}

/// Unseals the alias and folder names of an address record.
pub(crate) async fn unseal_address(
    sealing: &dyn SealingService,
    mut record: EmailAddressRecord,
) -> Result<EmailAddress> {
    let alias = unseal_optional(sealing, record.sealed_alias.as_ref()).await?;
    let mut folders = Vec::with_capacity(record.folders.len());
    for folder in std::mem::take(&mut record.folders) {
        folders.push(unseal_folder(sealing, folder).await?);
    }
    Ok(address_from_record(record, alias, folders))
}

/// Unseals an address for a listing. An alias or folder name that cannot be
/// unsealed is dropped.
async fn unseal_listed_address(
    sealing: &dyn SealingService,
    mut record: EmailAddressRecord,
) -> EmailAddress {
    let alias = unseal_optional(sealing, record.sealed_alias.as_ref())
        .await
        .unwrap_or_else(|e| {
            warn!(id = %record.id, error = %e, "Failed to unseal email address alias");
            None
        });
    let mut folders = Vec::with_capacity(record.folders.len());
    for folder in std::mem::take(&mut record.folders) {
        folders.push(unseal_listed_folder(sealing, folder).await);
    }
    address_from_record(record, alias, folders)
}

fn address_from_record(
    record: EmailAddressRecord,
    alias: Option<String>,
    folders: Vec<EmailFolder>,
) -> EmailAddress {
    EmailAddress {
        id: record.id,
        owner: record.owner,
        email_address: record.email_address,
        alias,
        folders,
        size: record.size,
        number_of_email_messages: record.number_of_email_messages,
        version: record.version,
        created_at: record.created_at,
        updated_at: record.updated_at,
        last_received_at: record.last_received_at,
    }
}

pub(crate) fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::InvalidArgument("id must not be empty".to_string()));
    }
    Ok(id)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
