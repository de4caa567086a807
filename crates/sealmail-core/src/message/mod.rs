//! Email messages.
//!
//! Sending (with end-to-end encryption between in-network addresses),
//! reading with cache policies, and batch update and delete.

mod model;
mod operations;
mod service;

pub use model::{
    Direction, EmailMessage, EmailMessageHeaders, EmailMessageRecord, EmailMessageRfc822Data,
    EmailMessageState, EmailMessageWithBody, GetEmailMessageDataInput, GetEmailMessageInput,
    ListEmailMessagesInput, MessageScope, SendEmailMessageInput, SendEmailMessageRequest,
    SendEmailMessageResult, UpdateEmailMessagesInput, UpdateEmailMessagesValues,
    UpdatedEmailMessageSuccess,
};
pub use operations::EmailMessageOperations;
pub use service::EmailMessageService;
