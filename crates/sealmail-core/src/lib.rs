//! # sealmail-core
//!
//! Use cases of the sealmail email-as-a-service SDK.
//!
//! This crate provides:
//! - Email address provisioning, lookup and availability checks
//! - Folder management, including custom folders
//! - Sending with end-to-end encryption between in-network addresses
//! - Message reads and batch updates with cache policies
//! - Drafts and scheduled sends
//! - Sender blocklists
//! - Email masks
//! - **Local cache** - `SQLite` store of sealed records for offline reads
//!
//! The backend and the key store are injected as trait objects
//! ([`address::EmailAccountService`], [`sealing::SealingService`], ...), so
//! the crate itself performs no network I/O and holds no key material.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod blocklist;
pub mod cache;
mod client;
pub mod common;
pub mod config;
mod context;
pub mod draft;
mod error;
pub mod folder;
pub mod mask;
pub mod message;
pub mod sealing;

pub use client::{EmailClient, EmailClientBuilder};
pub use common::{
    BatchOperationResult, BatchOperationStatus, CachePolicy, DateRange,
    EmailMessageOperationFailure, ListOutput, Pagination, SortOrder,
};
pub use config::{ClientOptions, EmailConfig};
pub use error::{BackendError, Error, Result, ServiceResult};
pub use sealing::{KeyExchange, SealedData, SealingService, SecurePackage};
