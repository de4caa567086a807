//! Email mask use cases.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::model::{
    EmailMask, EmailMaskMetadata, EmailMaskRecord, ListEmailMasksForOwnerInput,
    ProvisionEmailMaskInput, ProvisionEmailMaskRequest, UpdateEmailMaskInput,
    UpdateEmailMaskRequest,
};
use super::service::EmailMaskService;
use crate::address::{
    ValidationError, domain_of, normalize_email_address, require_id, require_valid_address,
};
use crate::common::ListOutput;
use crate::context::Context;
use crate::sealing::{SealedData, seal_json, unseal_json};
use crate::{Error, Result};

/// Provisioning and management of masked addresses.
pub struct EmailMaskOperations {
    service: Arc<dyn EmailMaskService>,
    context: Context,
}

impl EmailMaskOperations {
    pub(crate) fn new(service: Arc<dyn EmailMaskService>, context: Context) -> Self {
        Self { service, context }
    }

    /// Provisions a mask forwarding to `real_email_address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmailAddress`] for a malformed address or an
    /// unsupported mask domain, [`Error::InvalidArgument`] for an expiry in
    /// the past, or the mapped backend error.
    pub async fn provision_email_mask(&self, input: ProvisionEmailMaskInput) -> Result<EmailMask> {
        let masked_email_address = require_valid_address(&input.masked_email_address)?;
        let real_email_address = require_valid_address(&input.real_email_address)?;
        if masked_email_address == real_email_address {
            return Err(Error::InvalidArgument(
                "a mask cannot forward to itself".to_string(),
            ));
        }
        require_future(input.expires_at)?;

        let supported = self.get_supported_email_mask_domains().await?;
        if !supported
            .iter()
            .any(|d| d == domain_of(&masked_email_address))
        {
            return Err(Error::InvalidEmailAddress {
                address: masked_email_address,
                reason: ValidationError::UnsupportedDomain,
            });
        }

        let sealed_metadata = self.seal_metadata(input.metadata.as_ref()).await?;
        let record = {
            let _guard = self.context.account_lock.lock().await;
            self.service
                .provision(ProvisionEmailMaskRequest {
                    masked_email_address,
                    real_email_address,
                    sealed_metadata,
                    expires_at: input.expires_at,
                })
                .await?
        };
        info!(id = %record.id, masked = %record.masked_email_address, "Provisioned email mask");
        self.unseal(record).await
    }

    /// Deprovisions a mask.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty id, or the mapped
    /// backend error.
    pub async fn deprovision_email_mask(&self, id: &str) -> Result<EmailMask> {
        let id = require_id(id)?;
        let record = {
            let _guard = self.context.account_lock.lock().await;
            self.service.deprovision(id).await?
        };
        info!(id, "Deprovisioned email mask");
        self.unseal(record).await
    }

    /// Replaces the metadata or expiry of a mask.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when nothing changes or the expiry
    /// is in the past, or the mapped backend error.
    pub async fn update_email_mask(&self, input: UpdateEmailMaskInput) -> Result<EmailMask> {
        let id = require_id(&input.email_mask_id)?;
        if input.metadata.is_none() && input.expires_at.is_none() {
            return Err(Error::InvalidArgument(
                "at least one value to update is required".to_string(),
            ));
        }
        require_future(input.expires_at)?;

        let sealed_metadata = self.seal_metadata(input.metadata.as_ref()).await?;
        let record = self
            .service
            .update(UpdateEmailMaskRequest {
                email_mask_id: id.to_string(),
                sealed_metadata,
                expires_at: input.expires_at,
            })
            .await?;
        debug!(id, "Updated email mask");
        self.unseal(record).await
    }

    /// Enables forwarding.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn enable_email_mask(&self, id: &str) -> Result<EmailMask> {
        let id = require_id(id)?;
        let record = self.service.enable(id).await?;
        info!(id, "Enabled email mask");
        self.unseal(record).await
    }

    /// Disables forwarding.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn disable_email_mask(&self, id: &str) -> Result<EmailMask> {
        let id = require_id(id)?;
        let record = self.service.disable(id).await?;
        info!(id, "Disabled email mask");
        self.unseal(record).await
    }

    /// Lists the caller's masks. Masks whose metadata cannot be unsealed are
    /// returned without metadata.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn list_email_masks_for_owner(
        &self,
        input: ListEmailMasksForOwnerInput,
    ) -> Result<ListOutput<EmailMask>> {
        let pagination = self.context.page(&input.pagination)?;
        let page = self
            .service
            .list_for_owner(input.filter.as_ref(), &pagination)
            .await?;

        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            if input.filter.as_ref().is_some_and(|f| !f.matches(&record)) {
                continue;
            }
            let metadata = match self.unseal_metadata(record.sealed_metadata.as_ref()).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Failed to unseal email mask metadata");
                    None
                }
            };
            items.push(EmailMask::from_record(record, metadata));
        }
        Ok(ListOutput::new(items, page.next_token))
    }

    /// Domains masks may be provisioned on, lowercased.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn get_supported_email_mask_domains(&self) -> Result<Vec<String>> {
        let domains = self.service.supported_mask_domains().await?;
        Ok(domains.iter().map(|d| normalize_email_address(d)).collect())
    }

    async fn seal_metadata(
        &self,
        metadata: Option<&EmailMaskMetadata>,
    ) -> Result<Option<SealedData>> {
        match metadata {
            Some(metadata) => seal_json(self.context.sealing(), metadata).await.map(Some),
            None => Ok(None),
        }
    }

    async fn unseal_metadata(
        &self,
        sealed: Option<&SealedData>,
    ) -> Result<Option<EmailMaskMetadata>> {
        match sealed {
            Some(sealed) => unseal_json(self.context.sealing(), sealed).await.map(Some),
            None => Ok(None),
        }
    }

    async fn unseal(&self, record: EmailMaskRecord) -> Result<EmailMask> {
        let metadata = self.unseal_metadata(record.sealed_metadata.as_ref()).await?;
        Ok(EmailMask::from_record(record, metadata))
    }
}

fn require_future(expires_at: Option<DateTime<Utc>>) -> Result<()> {
    match expires_at {
        Some(at) if at <= Utc::now() => Err(Error::InvalidArgument(
            "expires_at must be in the future".to_string(),
        )),
        _ => Ok(()),
    }
}
