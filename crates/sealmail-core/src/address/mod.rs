//! Email address provisioning.
//!
//! Provides address models, validation, the backend interface and the
//! provisioning use cases.

mod model;
mod operations;
mod service;
mod validation;

pub use model::{
    CheckEmailAddressAvailabilityInput, EmailAddress, EmailAddressPublicInfo, EmailAddressRecord,
    GetEmailAddressInput, ListEmailAddressesInput, ProvisionEmailAddressInput,
    ProvisionEmailAddressRequest, UpdateEmailAddressMetadataInput,
};
pub use operations::EmailAddressOperations;
pub(crate) use operations::{require_address, require_id};
pub use service::EmailAccountService;
pub use validation::{
    ValidationError, domain_of, normalize_email_address, validate_domain, validate_email_address,
    validate_local_part,
};
pub(crate) use validation::require_valid_address;
