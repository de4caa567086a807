//! Masked email addresses that forward to a real address.

mod model;
mod operations;
mod service;

pub use model::{
    EmailMask, EmailMaskFilter, EmailMaskMetadata, EmailMaskRealAddressType, EmailMaskRecord,
    EmailMaskStatus, ListEmailMasksForOwnerInput, ProvisionEmailMaskInput,
    ProvisionEmailMaskRequest, UpdateEmailMaskInput, UpdateEmailMaskRequest,
};
pub use operations::EmailMaskOperations;
pub use service::EmailMaskService;
