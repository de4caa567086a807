//! Backend interface for email accounts.

use async_trait::async_trait;

use super::model::{EmailAddressPublicInfo, EmailAddressRecord, ProvisionEmailAddressRequest};
use crate::common::{ListOutput, Pagination};
use crate::error::ServiceResult;
use crate::sealing::SealedData;

/// Email address operations offered by the backend.
#[async_trait]
pub trait EmailAccountService: Send + Sync {
    /// Provisions a new address.
    async fn provision(&self, request: ProvisionEmailAddressRequest)
    -> ServiceResult<EmailAddressRecord>;

    /// Deprovisions an address, returning its final state.
    async fn deprovision(&self, id: &str) -> ServiceResult<EmailAddressRecord>;

    /// Replaces the sealed alias. Returns the address id.
    async fn update_metadata(&self, id: &str, sealed_alias: Option<SealedData>)
    -> ServiceResult<String>;

    /// Reads one address.
    async fn get(&self, id: &str) -> ServiceResult<Option<EmailAddressRecord>>;

    /// Lists the caller's addresses.
    async fn list(&self, pagination: &Pagination) -> ServiceResult<ListOutput<EmailAddressRecord>>;

    /// Key information of the given addresses; unknown addresses are omitted.
    async fn lookup_public_info(
        &self,
        email_addresses: &[String],
    ) -> ServiceResult<Vec<EmailAddressPublicInfo>>;

    /// Which combinations of local part and domain are free.
    async fn check_availability(
        &self,
        local_parts: &[String],
        domains: &[String],
    ) -> ServiceResult<Vec<String>>;

    /// Domains addresses may be provisioned on.
    async fn supported_domains(&self) -> ServiceResult<Vec<String>>;

    /// Every domain the service handles mail for.
    async fn configured_domains(&self) -> ServiceResult<Vec<String>>;
}
