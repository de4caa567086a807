//! Sender blocklists.
//!
//! Blocked values are sealed before they leave the client; the backend
//! matches incoming mail on a hash of the value.

mod model;
mod operations;
mod service;

pub use model::{
    BlockEmailAddressesInput, BlockedAddressAction, BlockedAddressLevel, BlockedAddressRecord,
    UnblockEmailAddressesByHashedValueInput, UnblockEmailAddressesInput, UnsealedBlockedAddress,
    UnsealedBlockedAddressStatus,
};
pub use operations::{BlocklistOperations, hash_blocked_value};
pub use service::BlocklistService;
