//! Email folders.

mod model;
mod operations;
mod service;

pub use model::{
    CreateCustomEmailFolderInput, DeleteCustomEmailFolderInput, DeleteMessagesForFolderIdInput,
    EmailFolder, EmailFolderRecord, ListEmailFoldersForEmailAddressIdInput,
    UpdateCustomEmailFolderInput,
};
pub use operations::EmailFolderOperations;
pub(crate) use operations::{unseal_folder, unseal_listed_folder};
pub use service::EmailFolderService;
