//! Client entry point.
//!
//! An [`EmailClient`] is assembled from the backend services it talks to and
//! groups the use cases by area:
//!
//! ```ignore
//! let client = EmailClient::builder()
//!     .account_service(accounts)
//!     .folder_service(folders)
//!     .message_service(messages)
//!     .draft_service(drafts)
//!     .blocklist_service(blocklist)
//!     .mask_service(masks)
//!     .sealing_service(sealing)
//!     .options(ClientOptions::from_json_file("sealmail.json")?)
//!     .build()
//!     .await?;
//!
//! let addresses = client.addresses().list_email_addresses(input).await?;
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::address::{EmailAccountService, EmailAddressOperations};
use crate::blocklist::{BlocklistOperations, BlocklistService};
use crate::cache::CacheRepository;
use crate::config::ClientOptions;
use crate::context::Context;
use crate::draft::{DraftMessageService, DraftOperations};
use crate::folder::{EmailFolderOperations, EmailFolderService};
use crate::mask::{EmailMaskOperations, EmailMaskService};
use crate::message::{EmailMessageOperations, EmailMessageService};
use crate::sealing::SealingService;
use crate::{Error, Result};

/// Email client.
pub struct EmailClient {
    addresses: EmailAddressOperations,
    folders: EmailFolderOperations,
    messages: EmailMessageOperations,
    drafts: DraftOperations,
    blocklist: BlocklistOperations,
    masks: EmailMaskOperations,
    cache: Option<Arc<CacheRepository>>,
    options: ClientOptions,
}

impl EmailClient {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> EmailClientBuilder {
        EmailClientBuilder::new()
    }

    /// Address provisioning and lookup.
    #[must_use]
    pub const fn addresses(&self) -> &EmailAddressOperations {
        &self.addresses
    }

    /// Folder management.
    #[must_use]
    pub const fn folders(&self) -> &EmailFolderOperations {
        &self.folders
    }

    /// Sending and reading messages.
    #[must_use]
    pub const fn messages(&self) -> &EmailMessageOperations {
        &self.messages
    }

    /// Drafts and scheduled sends.
    #[must_use]
    pub const fn drafts(&self) -> &DraftOperations {
        &self.drafts
    }

    /// Sender blocklist.
    #[must_use]
    pub const fn blocklist(&self) -> &BlocklistOperations {
        &self.blocklist
    }

    /// Email masks.
    #[must_use]
    pub const fn masks(&self) -> &EmailMaskOperations {
        &self.masks
    }

    /// Options the client was built with.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Local cache, if one is configured.
    #[must_use]
    pub fn cache(&self) -> Option<&CacheRepository> {
        self.cache.as_deref()
    }

    /// Removes everything from the local cache. Call on sign-out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the cache cannot be cleared.
    pub async fn reset(&self) -> Result<()> {
        if let Some(cache) = &self.cache {
            cache.clear().await?;
        }
        Ok(())
    }
}

/// Builder for [`EmailClient`].
#[derive(Default)]
pub struct EmailClientBuilder {
    accounts: Option<Arc<dyn EmailAccountService>>,
    folders: Option<Arc<dyn EmailFolderService>>,
    messages: Option<Arc<dyn EmailMessageService>>,
    drafts: Option<Arc<dyn DraftMessageService>>,
    blocklist: Option<Arc<dyn BlocklistService>>,
    masks: Option<Arc<dyn EmailMaskService>>,
    sealing: Option<Arc<dyn SealingService>>,
    cache: Option<Arc<CacheRepository>>,
    options: ClientOptions,
}

impl EmailClientBuilder {
    /// Creates an empty builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address backend.
    #[must_use]
    pub fn account_service(mut self, service: Arc<dyn EmailAccountService>) -> Self {
        self.accounts = Some(service);
        self
    }

    /// Sets the folder backend.
    #[must_use]
    pub fn folder_service(mut self, service: Arc<dyn EmailFolderService>) -> Self {
        self.folders = Some(service);
        self
    }

    /// Sets the message backend.
    #[must_use]
    pub fn message_service(mut self, service: Arc<dyn EmailMessageService>) -> Self {
        self.messages = Some(service);
        self
    }

    /// Sets the draft backend.
    #[must_use]
    pub fn draft_service(mut self, service: Arc<dyn DraftMessageService>) -> Self {
        self.drafts = Some(service);
        self
    }

    /// Sets the blocklist backend.
    #[must_use]
    pub fn blocklist_service(mut self, service: Arc<dyn BlocklistService>) -> Self {
        self.blocklist = Some(service);
        self
    }

    /// Sets the mask backend.
    #[must_use]
    pub fn mask_service(mut self, service: Arc<dyn EmailMaskService>) -> Self {
        self.masks = Some(service);
        self
    }

    /// Sets the sealing service.
    #[must_use]
    pub fn sealing_service(mut self, service: Arc<dyn SealingService>) -> Self {
        self.sealing = Some(service);
        self
    }

    /// Uses an already opened cache instead of `options.cache_path`.
    #[must_use]
    pub fn cache(mut self, cache: Arc<CacheRepository>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the client options.
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the client, opening the cache database if a path is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a service is missing or the page limit is
    /// zero, or [`Error::Database`] if the cache cannot be opened.
    pub async fn build(self) -> Result<EmailClient> {
        if self.options.default_page_limit == 0 {
            return Err(Error::Config(
                "default page limit must be greater than zero".to_string(),
            ));
        }

        let accounts = required(self.accounts, "account")?;
        let folders = required(self.folders, "folder")?;
        let messages = required(self.messages, "message")?;
        let drafts = required(self.drafts, "draft")?;
        let blocklist = required(self.blocklist, "blocklist")?;
        let masks = required(self.masks, "mask")?;
        let sealing = required(self.sealing, "sealing")?;

        let cache = match (self.cache, &self.options.cache_path) {
            (Some(cache), _) => Some(cache),
            (None, Some(path)) => {
                debug!(path = %path.display(), "Opening cache database");
                Some(Arc::new(CacheRepository::new(path).await?))
            }
            (None, None) => None,
        };

        let context = Context {
            sealing,
            cache: cache.clone(),
            account_lock: Arc::new(Mutex::new(())),
            default_page_limit: self.options.default_page_limit,
        };

        Ok(EmailClient {
            addresses: EmailAddressOperations::new(Arc::clone(&accounts), context.clone()),
            folders: EmailFolderOperations::new(folders, context.clone()),
            messages: EmailMessageOperations::new(
                messages,
                Arc::clone(&accounts),
                context.clone(),
            ),
            drafts: DraftOperations::new(drafts, accounts, context.clone()),
            blocklist: BlocklistOperations::new(blocklist, context.clone()),
            masks: EmailMaskOperations::new(masks, context),
            cache,
            options: self.options,
        })
    }
}

fn required<T: ?Sized>(service: Option<Arc<T>>, name: &str) -> Result<Arc<T>> {
    service.ok_or_else(|| Error::Config(format!("{name} service is required")))
}
