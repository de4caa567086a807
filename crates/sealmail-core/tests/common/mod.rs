//! In-memory backend and sealing service shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use sealmail_core::address::{
    EmailAccountService, EmailAddressPublicInfo, EmailAddressRecord, ProvisionEmailAddressRequest,
};
use sealmail_core::blocklist::{BlockedAddressRecord, BlocklistService};
use sealmail_core::cache::CacheRepository;
use sealmail_core::common::{BatchOperationResult, EmailMessageOperationFailure, ListOutput};
use sealmail_core::draft::{
    DraftEmailMessageMetadata, DraftMessageService, ScheduledDraftMessage,
    ScheduledDraftMessageState, ScheduledDraftMessageStateFilter, SealedDraft,
};
use sealmail_core::folder::{EmailFolderRecord, EmailFolderService};
use sealmail_core::mask::{
    EmailMaskFilter, EmailMaskRealAddressType, EmailMaskRecord, EmailMaskService, EmailMaskStatus,
    ProvisionEmailMaskRequest, UpdateEmailMaskRequest,
};
use sealmail_core::message::{
    Direction, EmailMessageHeaders, EmailMessageRecord, EmailMessageService, EmailMessageState,
    ListEmailMessagesInput, MessageScope, SendEmailMessageRequest, SendEmailMessageResult,
    UpdateEmailMessagesValues, UpdatedEmailMessageSuccess,
};
use sealmail_core::{
    BackendError, ClientOptions, EmailClient, EmailConfig, Error, KeyExchange, Pagination,
    Result, SealedData, SealingService, SecurePackage, ServiceResult, SortOrder,
};
use sealmail_mime::EncryptionStatus;

pub const OWNER: &str = "owner-1";
pub const KEY_ID: &str = "key-1";
/// Key id the sealing service does not hold.
pub const LOST_KEY_ID: &str = "lost-key";

const MASK: u8 = 0x5a;
const SESSION_KEY: &[u8] = b"session-key";

fn scramble(data: &[u8]) -> Vec<u8> {
    data.iter().map(|b| b ^ MASK).collect()
}

/// Seals synchronously, the same way [`FakeSealing`] does.
pub fn seal_now(plaintext: &[u8]) -> SealedData {
    SealedData {
        key_id: KEY_ID.to_string(),
        algorithm: "xor-test".to_string(),
        ciphertext: scramble(plaintext),
    }
}

/// Data sealed with a key that has since been lost.
pub fn sealed_with_lost_key(plaintext: &[u8]) -> SealedData {
    SealedData {
        key_id: LOST_KEY_ID.to_string(),
        ..seal_now(plaintext)
    }
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

/// Reversible sealing with a single known key.
#[derive(Default)]
pub struct FakeSealing {
    /// Recipients passed to each `seal_for_recipients` call.
    pub packages: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl SealingService for FakeSealing {
    async fn seal(&self, plaintext: &[u8]) -> Result<SealedData> {
        Ok(seal_now(plaintext))
    }

    async fn unseal(&self, sealed: &SealedData) -> Result<Vec<u8>> {
        if sealed.key_id != KEY_ID {
            return Err(Error::Sealing(format!("key {} not found", sealed.key_id)));
        }
        Ok(scramble(&sealed.ciphertext))
    }

    async fn seal_for_recipients(
        &self,
        plaintext: &[u8],
        recipients: &[EmailAddressPublicInfo],
    ) -> Result<SecurePackage> {
        let addresses: Vec<String> = recipients
            .iter()
            .map(|r| r.email_address.clone())
            .collect();
        self.packages.lock().unwrap().push(addresses);
        Ok(SecurePackage {
            body: scramble(plaintext),
            key_exchanges: recipients
                .iter()
                .map(|r| KeyExchange {
                    email_address: r.email_address.clone(),
                    key_id: r.key_id.clone(),
                    data: scramble(SESSION_KEY),
                })
                .collect(),
        })
    }

    async fn open_package(&self, body: &[u8], key_exchange: &KeyExchange) -> Result<Vec<u8>> {
        if key_exchange.data != scramble(SESSION_KEY) {
            return Err(Error::Sealing("session key mismatch".to_string()));
        }
        Ok(scramble(body))
    }
}

#[derive(Default)]
pub struct State {
    pub next_id: u32,
    pub addresses: BTreeMap<String, EmailAddressRecord>,
    pub public_info: Vec<EmailAddressPublicInfo>,
    pub supported_domains: Vec<String>,
    pub configured_domains: Vec<String>,
    pub taken: HashSet<String>,
    pub folders: BTreeMap<String, EmailFolderRecord>,
    pub messages: BTreeMap<String, EmailMessageRecord>,
    pub rfc822: BTreeMap<String, SealedData>,
    pub sent: Vec<SendEmailMessageRequest>,
    pub failing_ids: HashSet<String>,
    pub config: EmailConfig,
    pub drafts: BTreeMap<(String, String), SealedDraft>,
    pub scheduled: Vec<ScheduledDraftMessage>,
    pub blocklist: Vec<BlockedAddressRecord>,
    pub failing_hashes: HashSet<String>,
    pub masks: BTreeMap<String, EmailMaskRecord>,
    pub mask_domains: Vec<String>,
    pub remote_reads: usize,
}

/// One in-memory backend implementing every service interface.
pub struct FakeBackend {
    state: Mutex<State>,
    provisioning: AtomicUsize,
    /// Highest number of concurrent provision calls observed.
    pub max_concurrent_provisioning: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let state = State {
            supported_domains: vec!["Example.com".to_string()],
            configured_domains: vec!["example.com".to_string(), "example.org".to_string()],
            mask_domains: vec!["mask.example.com".to_string()],
            ..State::default()
        };
        Arc::new(Self {
            state: Mutex::new(state),
            provisioning: AtomicUsize::new(0),
            max_concurrent_provisioning: AtomicUsize::new(0),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }

    /// Publishes a key for an in-network address.
    pub fn publish_key(&self, email_address: &str) {
        self.state().public_info.push(EmailAddressPublicInfo {
            email_address: email_address.to_string(),
            key_id: format!("pub-{email_address}"),
            public_key: "public-key".to_string(),
        });
    }

    /// Stores a message with sealed headers and RFC 822 data.
    pub fn add_message(
        &self,
        email_address_id: &str,
        folder_id: &str,
        sort_date: DateTime<Utc>,
        subject: &str,
    ) -> String {
        let id = self.next_id("msg");
        let headers = EmailMessageHeaders {
            subject: Some(subject.to_string()),
            ..EmailMessageHeaders::default()
        };
        let sealed_headers = seal_now(&serde_json::to_vec(&headers).unwrap());
        self.insert_message(message_record(
            &id,
            email_address_id,
            folder_id,
            sort_date,
            sealed_headers,
        ));
        id
    }

    pub fn insert_message(&self, record: EmailMessageRecord) {
        self.state().messages.insert(record.id.clone(), record);
    }

    pub fn sent(&self) -> Vec<SendEmailMessageRequest> {
        self.state().sent.clone()
    }

    pub fn remote_reads(&self) -> usize {
        self.state().remote_reads
    }
}

pub fn message_record(
    id: &str,
    email_address_id: &str,
    folder_id: &str,
    sort_date: DateTime<Utc>,
    sealed_headers: SealedData,
) -> EmailMessageRecord {
    EmailMessageRecord {
        id: id.to_string(),
        client_ref_id: None,
        owner: OWNER.to_string(),
        email_address_id: email_address_id.to_string(),
        folder_id: folder_id.to_string(),
        previous_folder_id: None,
        seen: false,
        replied_to: false,
        forwarded: false,
        direction: Direction::Inbound,
        state: EmailMessageState::Received,
        version: 1,
        size: 128,
        has_attachments: false,
        encryption_status: EncryptionStatus::Unencrypted,
        date: Some(sort_date),
        sort_date,
        created_at: sort_date,
        updated_at: sort_date,
        sealed_headers,
    }
}

fn folder_record(id: &str, email_address_id: &str, name: &str) -> EmailFolderRecord {
    EmailFolderRecord {
        id: id.to_string(),
        owner: OWNER.to_string(),
        email_address_id: email_address_id.to_string(),
        folder_name: name.to_string(),
        sealed_custom_folder_name: None,
        size: 0,
        unseen_count: 0,
        version: 1,
        created_at: at(1),
        updated_at: at(1),
    }
}

fn not_found(kind: &str, id: &str) -> BackendError {
    BackendError::new(format!("sealmail.email.{kind}NotFoundError"), id)
}

fn page_of<T: Clone>(items: &[T], pagination: &Pagination) -> ListOutput<T> {
    let limit = pagination.limit.unwrap_or(10) as usize;
    let offset = pagination
        .next_token
        .as_deref()
        .and_then(|t| t.parse::<usize>().ok())
        .unwrap_or(0);
    let page: Vec<T> = items.iter().skip(offset).take(limit).cloned().collect();
    let next_token = (offset + limit < items.len()).then(|| (offset + limit).to_string());
    ListOutput::new(page, next_token)
}

#[async_trait]
impl EmailAccountService for FakeBackend {
    async fn provision(
        &self,
        request: ProvisionEmailAddressRequest,
    ) -> ServiceResult<EmailAddressRecord> {
        let running = self.provisioning.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_provisioning
            .fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.provisioning.fetch_sub(1, Ordering::SeqCst);

        if !self.state().taken.insert(request.email_address.clone()) {
            return Err(BackendError::new(
                "sealmail.email.AddressUnavailableError",
                request.email_address,
            ));
        }

        let id = self.next_id("addr");
        let folders = ["INBOX", "SENT", "TRASH"]
            .iter()
            .map(|name| folder_record(&format!("{id}-{}", name.to_lowercase()), &id, name))
            .collect::<Vec<_>>();
        let record = EmailAddressRecord {
            id: id.clone(),
            owner: OWNER.to_string(),
            email_address: request.email_address,
            sealed_alias: request.sealed_alias,
            folders: folders.clone(),
            size: 0,
            number_of_email_messages: 0,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_received_at: None,
        };

        let mut state = self.state();
        for folder in folders {
            state.folders.insert(folder.id.clone(), folder);
        }
        state.addresses.insert(id, record.clone());
        Ok(record)
    }

    async fn deprovision(&self, id: &str) -> ServiceResult<EmailAddressRecord> {
        let mut state = self.state();
        let record = state
            .addresses
            .remove(id)
            .ok_or_else(|| not_found("Address", id))?;
        state.taken.remove(&record.email_address);
        state.folders.retain(|_, f| f.email_address_id != id);
        Ok(record)
    }

    async fn update_metadata(
        &self,
        id: &str,
        sealed_alias: Option<SealedData>,
    ) -> ServiceResult<String> {
        let mut state = self.state();
        let record = state
            .addresses
            .get_mut(id)
            .ok_or_else(|| not_found("Address", id))?;
        record.sealed_alias = sealed_alias;
        record.version += 1;
        Ok(id.to_string())
    }

    async fn get(&self, id: &str) -> ServiceResult<Option<EmailAddressRecord>> {
        let mut state = self.state();
        state.remote_reads += 1;
        Ok(state.addresses.get(id).cloned())
    }

    async fn list(&self, pagination: &Pagination) -> ServiceResult<ListOutput<EmailAddressRecord>> {
        let mut state = self.state();
        state.remote_reads += 1;
        let records: Vec<_> = state.addresses.values().cloned().collect();
        Ok(page_of(&records, pagination))
    }

    async fn lookup_public_info(
        &self,
        email_addresses: &[String],
    ) -> ServiceResult<Vec<EmailAddressPublicInfo>> {
        Ok(self
            .state()
            .public_info
            .iter()
            .filter(|info| email_addresses.contains(&info.email_address.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn check_availability(
        &self,
        local_parts: &[String],
        domains: &[String],
    ) -> ServiceResult<Vec<String>> {
        let state = self.state();
        Ok(local_parts
            .iter()
            .flat_map(|local| domains.iter().map(move |domain| format!("{local}@{domain}")))
            .filter(|address| !state.taken.contains(address))
            .collect())
    }

    async fn supported_domains(&self) -> ServiceResult<Vec<String>> {
        Ok(self.state().supported_domains.clone())
    }

    async fn configured_domains(&self) -> ServiceResult<Vec<String>> {
        Ok(self.state().configured_domains.clone())
    }
}

#[async_trait]
impl EmailFolderService for FakeBackend {
    async fn list_for_email_address_id(
        &self,
        email_address_id: &str,
        pagination: &Pagination,
    ) -> ServiceResult<ListOutput<EmailFolderRecord>> {
        let mut state = self.state();
        state.remote_reads += 1;
        let folders: Vec<_> = state
            .folders
            .values()
            .filter(|f| f.email_address_id == email_address_id)
            .cloned()
            .collect();
        Ok(page_of(&folders, pagination))
    }

    async fn create_custom(
        &self,
        email_address_id: &str,
        sealed_name: SealedData,
    ) -> ServiceResult<EmailFolderRecord> {
        let id = self.next_id("folder");
        let mut record = folder_record(&id, email_address_id, "CUSTOM");
        record.sealed_custom_folder_name = Some(sealed_name);
        self.state().folders.insert(id, record.clone());
        Ok(record)
    }

    async fn update_custom(
        &self,
        email_folder_id: &str,
        _email_address_id: &str,
        sealed_name: Option<SealedData>,
    ) -> ServiceResult<EmailFolderRecord> {
        let mut state = self.state();
        let record = state
            .folders
            .get_mut(email_folder_id)
            .ok_or_else(|| not_found("Folder", email_folder_id))?;
        if let Some(sealed_name) = sealed_name {
            record.sealed_custom_folder_name = Some(sealed_name);
        }
        record.version += 1;
        Ok(record.clone())
    }

    async fn delete_custom(
        &self,
        email_folder_id: &str,
        _email_address_id: &str,
    ) -> ServiceResult<Option<EmailFolderRecord>> {
        Ok(self.state().folders.remove(email_folder_id))
    }

    async fn delete_messages(
        &self,
        email_folder_id: &str,
        _email_address_id: &str,
        _hard_delete: bool,
    ) -> ServiceResult<String> {
        self.state()
            .messages
            .retain(|_, m| m.folder_id != email_folder_id);
        Ok(email_folder_id.to_string())
    }
}

#[async_trait]
impl EmailMessageService for FakeBackend {
    async fn send(
        &self,
        request: SendEmailMessageRequest,
    ) -> ServiceResult<SendEmailMessageResult> {
        let id = self.next_id("sent");
        self.state().sent.push(request);
        Ok(SendEmailMessageResult {
            id,
            created_at: Utc::now(),
        })
    }

    async fn update(
        &self,
        ids: &[String],
        values: &UpdateEmailMessagesValues,
    ) -> ServiceResult<BatchOperationResult<UpdatedEmailMessageSuccess, EmailMessageOperationFailure>>
    {
        let mut state = self.state();
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for id in ids {
            let failing = state.failing_ids.contains(id);
            match state.messages.get_mut(id) {
                Some(message) if !failing => {
                    if let Some(folder_id) = &values.folder_id {
                        message.previous_folder_id = Some(message.folder_id.clone());
                        message.folder_id.clone_from(folder_id);
                    }
                    if let Some(seen) = values.seen {
                        message.seen = seen;
                    }
                    message.updated_at = Utc::now();
                    successes.push(UpdatedEmailMessageSuccess {
                        id: id.clone(),
                        created_at: message.created_at,
                        updated_at: message.updated_at,
                    });
                }
                _ => failures.push(EmailMessageOperationFailure::new(
                    id.clone(),
                    "MessageNotFound",
                )),
            }
        }
        Ok(BatchOperationResult::new(successes, failures))
    }

    async fn delete(
        &self,
        ids: &[String],
    ) -> ServiceResult<BatchOperationResult<String, EmailMessageOperationFailure>> {
        let mut state = self.state();
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for id in ids {
            if state.failing_ids.contains(id) || state.messages.remove(id).is_none() {
                failures.push(EmailMessageOperationFailure::new(
                    id.clone(),
                    "MessageNotFound",
                ));
            } else {
                successes.push(id.clone());
            }
        }
        Ok(BatchOperationResult::new(successes, failures))
    }

    async fn get(&self, id: &str) -> ServiceResult<Option<EmailMessageRecord>> {
        let mut state = self.state();
        state.remote_reads += 1;
        Ok(state.messages.get(id).cloned())
    }

    async fn list(
        &self,
        scope: &MessageScope,
        filter: &ListEmailMessagesInput,
    ) -> ServiceResult<ListOutput<EmailMessageRecord>> {
        let mut state = self.state();
        state.remote_reads += 1;
        let mut messages: Vec<_> = state
            .messages
            .values()
            .filter(|m| match scope {
                MessageScope::All => true,
                MessageScope::EmailAddress(id) => &m.email_address_id == id,
                MessageScope::Folder(id) => &m.folder_id == id,
            })
            .filter(|m| filter.date_range.is_none_or(|r| r.contains(m.sort_date)))
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sort_date);
        if filter.sort_order == SortOrder::Desc {
            messages.reverse();
        }
        Ok(page_of(&messages, &filter.pagination))
    }

    async fn get_rfc822_data(
        &self,
        id: &str,
        _email_address_id: &str,
    ) -> ServiceResult<Option<SealedData>> {
        Ok(self.state().rfc822.get(id).cloned())
    }

    async fn get_config(&self) -> ServiceResult<EmailConfig> {
        Ok(self.state().config.clone())
    }
}

#[async_trait]
impl DraftMessageService for FakeBackend {
    async fn save(
        &self,
        email_address_id: &str,
        id: &str,
        sealed_rfc822_data: SealedData,
    ) -> ServiceResult<DraftEmailMessageMetadata> {
        let metadata = DraftEmailMessageMetadata {
            id: id.to_string(),
            email_address_id: email_address_id.to_string(),
            updated_at: Utc::now(),
        };
        self.state().drafts.insert(
            (email_address_id.to_string(), id.to_string()),
            SealedDraft {
                metadata: metadata.clone(),
                sealed_rfc822_data,
            },
        );
        Ok(metadata)
    }

    async fn get(&self, email_address_id: &str, id: &str) -> ServiceResult<Option<SealedDraft>> {
        Ok(self
            .state()
            .drafts
            .get(&(email_address_id.to_string(), id.to_string()))
            .cloned())
    }

    async fn list_metadata(
        &self,
        email_address_id: &str,
    ) -> ServiceResult<Vec<DraftEmailMessageMetadata>> {
        Ok(self
            .state()
            .drafts
            .values()
            .filter(|d| d.metadata.email_address_id == email_address_id)
            .map(|d| d.metadata.clone())
            .collect())
    }

    async fn delete(&self, email_address_id: &str, id: &str) -> ServiceResult<()> {
        self.state()
            .drafts
            .remove(&(email_address_id.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found("Draft", id))
    }

    async fn schedule_send(
        &self,
        email_address_id: &str,
        id: &str,
        send_at: DateTime<Utc>,
    ) -> ServiceResult<ScheduledDraftMessage> {
        let scheduled = ScheduledDraftMessage {
            draft_message_id: id.to_string(),
            email_address_id: email_address_id.to_string(),
            owner: OWNER.to_string(),
            send_at,
            state: ScheduledDraftMessageState::Scheduled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.state().scheduled.push(scheduled.clone());
        Ok(scheduled)
    }

    async fn cancel_scheduled(&self, email_address_id: &str, id: &str) -> ServiceResult<String> {
        let mut state = self.state();
        let scheduled = state
            .scheduled
            .iter_mut()
            .find(|s| s.email_address_id == email_address_id && s.draft_message_id == id)
            .ok_or_else(|| not_found("Draft", id))?;
        scheduled.state = ScheduledDraftMessageState::Cancelled;
        Ok(id.to_string())
    }

    async fn list_scheduled(
        &self,
        email_address_id: &str,
        _state: Option<&ScheduledDraftMessageStateFilter>,
        pagination: &Pagination,
    ) -> ServiceResult<ListOutput<ScheduledDraftMessage>> {
        // the state filter is left to the client
        let scheduled: Vec<_> = self
            .state()
            .scheduled
            .iter()
            .filter(|s| s.email_address_id == email_address_id)
            .cloned()
            .collect();
        Ok(page_of(&scheduled, pagination))
    }
}

#[async_trait]
impl BlocklistService for FakeBackend {
    async fn block(
        &self,
        _owner: &str,
        entries: Vec<BlockedAddressRecord>,
    ) -> ServiceResult<Vec<String>> {
        let mut state = self.state();
        let mut failed = Vec::new();
        for entry in entries {
            if state.failing_hashes.contains(&entry.hashed_blocked_value) {
                failed.push(entry.hashed_blocked_value);
            } else {
                state.blocklist.push(entry);
            }
        }
        Ok(failed)
    }

    async fn unblock(&self, _owner: &str, hashed_values: &[String]) -> ServiceResult<Vec<String>> {
        let mut state = self.state();
        let mut failed = Vec::new();
        for hash in hashed_values {
            let before = state.blocklist.len();
            state.blocklist.retain(|e| &e.hashed_blocked_value != hash);
            if state.blocklist.len() == before {
                failed.push(hash.clone());
            }
        }
        Ok(failed)
    }

    async fn get(&self, _owner: &str) -> ServiceResult<Vec<BlockedAddressRecord>> {
        Ok(self.state().blocklist.clone())
    }
}

#[async_trait]
impl EmailMaskService for FakeBackend {
    async fn provision(&self, request: ProvisionEmailMaskRequest) -> ServiceResult<EmailMaskRecord> {
        let running = self.provisioning.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_provisioning
            .fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.provisioning.fetch_sub(1, Ordering::SeqCst);

        let id = self.next_id("mask");
        let mut state = self.state();
        let internal = state
            .addresses
            .values()
            .any(|a| a.email_address == request.real_email_address);
        let record = EmailMaskRecord {
            id: id.clone(),
            owner: OWNER.to_string(),
            masked_email_address: request.masked_email_address,
            real_email_address: request.real_email_address,
            real_email_address_type: if internal {
                EmailMaskRealAddressType::Internal
            } else {
                EmailMaskRealAddressType::External
            },
            status: EmailMaskStatus::Enabled,
            sealed_metadata: request.sealed_metadata,
            inbound_received: 0,
            inbound_delivered: 0,
            outbound_received: 0,
            outbound_delivered: 0,
            spam_count: 0,
            virus_count: 0,
            expires_at: request.expires_at,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.masks.insert(id, record.clone());
        Ok(record)
    }

    async fn deprovision(&self, id: &str) -> ServiceResult<EmailMaskRecord> {
        self.state()
            .masks
            .remove(id)
            .ok_or_else(|| not_found("Mask", id))
    }

    async fn update(&self, request: UpdateEmailMaskRequest) -> ServiceResult<EmailMaskRecord> {
        let mut state = self.state();
        let record = state
            .masks
            .get_mut(&request.email_mask_id)
            .ok_or_else(|| not_found("Mask", &request.email_mask_id))?;
        if request.sealed_metadata.is_some() {
            record.sealed_metadata = request.sealed_metadata;
        }
        if request.expires_at.is_some() {
            record.expires_at = request.expires_at;
        }
        record.version += 1;
        Ok(record.clone())
    }

    async fn enable(&self, id: &str) -> ServiceResult<EmailMaskRecord> {
        let mut state = self.state();
        let record = state.masks.get_mut(id).ok_or_else(|| not_found("Mask", id))?;
        record.status = EmailMaskStatus::Enabled;
        Ok(record.clone())
    }

    async fn disable(&self, id: &str) -> ServiceResult<EmailMaskRecord> {
        let mut state = self.state();
        let record = state.masks.get_mut(id).ok_or_else(|| not_found("Mask", id))?;
        record.status = EmailMaskStatus::Disabled;
        Ok(record.clone())
    }

    async fn list_for_owner(
        &self,
        filter: Option<&EmailMaskFilter>,
        pagination: &Pagination,
    ) -> ServiceResult<ListOutput<EmailMaskRecord>> {
        let masks: Vec<_> = self
            .state()
            .masks
            .values()
            .filter(|m| filter.is_none_or(|f| f.matches(m)))
            .cloned()
            .collect();
        Ok(page_of(&masks, pagination))
    }

    async fn supported_mask_domains(&self) -> ServiceResult<Vec<String>> {
        Ok(self.state().mask_domains.clone())
    }
}

/// Test harness: a client over a fresh backend.
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub sealing: Arc<FakeSealing>,
    pub client: EmailClient,
}

impl Harness {
    /// Client without a local cache.
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Client with an in-memory cache.
    pub async fn with_cache() -> Self {
        let cache = Arc::new(CacheRepository::in_memory().await.unwrap());
        Self::build(Some(cache)).await
    }

    async fn build(cache: Option<Arc<CacheRepository>>) -> Self {
        let backend = FakeBackend::new();
        let sealing = Arc::new(FakeSealing::default());
        let mut builder = EmailClient::builder()
            .account_service(backend.clone())
            .folder_service(backend.clone())
            .message_service(backend.clone())
            .draft_service(backend.clone())
            .blocklist_service(backend.clone())
            .mask_service(backend.clone())
            .sealing_service(sealing.clone())
            .options(ClientOptions::default());
        if let Some(cache) = cache {
            builder = builder.cache(cache);
        }
        let client = builder.build().await.unwrap();
        Self {
            backend,
            sealing,
            client,
        }
    }

    /// Provisions `email_address` and returns its id.
    pub async fn provision(&self, email_address: &str) -> String {
        use sealmail_core::address::ProvisionEmailAddressInput;

        self.client
            .addresses()
            .provision_email_address(ProvisionEmailAddressInput {
                email_address: email_address.to_string(),
                alias: None,
            })
            .await
            .unwrap()
            .id
    }
}
