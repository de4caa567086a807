//! Backend interface for email masks.

use async_trait::async_trait;

use super::model::{
    EmailMaskFilter, EmailMaskRecord, ProvisionEmailMaskRequest, UpdateEmailMaskRequest,
};
use crate::common::{ListOutput, Pagination};
use crate::error::ServiceResult;

/// Email mask operations offered by the backend.
#[async_trait]
pub trait EmailMaskService: Send + Sync {
    /// Provisions a mask.
    async fn provision(&self, request: ProvisionEmailMaskRequest) -> ServiceResult<EmailMaskRecord>;

    /// Deprovisions a mask, returning its final state.
    async fn deprovision(&self, id: &str) -> ServiceResult<EmailMaskRecord>;

    /// Updates metadata or expiry.
    async fn update(&self, request: UpdateEmailMaskRequest) -> ServiceResult<EmailMaskRecord>;

    /// Enables forwarding.
    async fn enable(&self, id: &str) -> ServiceResult<EmailMaskRecord>;

    /// Disables forwarding.
    async fn disable(&self, id: &str) -> ServiceResult<EmailMaskRecord>;

    /// Lists the caller's masks.
    async fn list_for_owner(
        &self,
        filter: Option<&EmailMaskFilter>,
        pagination: &Pagination,
    ) -> ServiceResult<ListOutput<EmailMaskRecord>>;

    /// Domains masks may be provisioned on.
    async fn supported_mask_domains(&self) -> ServiceResult<Vec<String>>;
}
