//! Drafts and scheduled sends.

mod model;
mod operations;
mod service;

pub use model::{
    CreateDraftEmailMessageInput, DeleteDraftEmailMessagesInput, DraftEmailMessage,
    DraftEmailMessageKey, DraftEmailMessageMetadata, ListScheduledDraftMessagesInput,
    ScheduleSendDraftMessageInput, ScheduledDraftMessage, ScheduledDraftMessageState,
    ScheduledDraftMessageStateFilter, SealedDraft, UpdateDraftEmailMessageInput,
};
pub use operations::DraftOperations;
pub use service::DraftMessageService;
