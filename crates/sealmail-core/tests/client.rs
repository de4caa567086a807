//! Client assembly and reset.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use sealmail_core::address::GetEmailAddressInput;
use sealmail_core::cache::CacheKind;
use sealmail_core::{CachePolicy, ClientOptions, EmailClient, Error};
use tempfile::TempDir;

use common::{FakeBackend, FakeSealing, Harness};

fn full_builder(backend: &Arc<FakeBackend>) -> sealmail_core::EmailClientBuilder {
    EmailClient::builder()
        .account_service(backend.clone())
        .folder_service(backend.clone())
        .message_service(backend.clone())
        .draft_service(backend.clone())
        .blocklist_service(backend.clone())
        .mask_service(backend.clone())
        .sealing_service(Arc::new(FakeSealing::default()))
}

#[tokio::test]
async fn test_build_requires_every_service() {
    let backend = FakeBackend::new();

    let result = EmailClient::builder()
        .account_service(backend.clone())
        .folder_service(backend.clone())
        .build()
        .await;
    assert!(matches!(result, Err(Error::Config(_))));

    let result = full_builder(&backend)
        .options(ClientOptions {
            default_page_limit: 0,
            ..ClientOptions::default()
        })
        .build()
        .await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_build_without_cache() {
    let backend = FakeBackend::new();
    let client = full_builder(&backend).build().await.unwrap();

    assert!(client.cache().is_none());
    assert_eq!(client.options().default_page_limit, 10);
    client.reset().await.unwrap();
}

#[tokio::test]
async fn test_build_opens_cache_from_options() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let backend = FakeBackend::new();

    let client = full_builder(&backend)
        .options(ClientOptions {
            cache_path: Some(path.clone()),
            default_page_limit: 5,
        })
        .build()
        .await
        .unwrap();
    assert!(client.cache().is_some());
    assert!(path.exists());
    assert_eq!(client.options().default_page_limit, 5);
}

#[tokio::test]
async fn test_reset_clears_cache() {
    let h = Harness::with_cache().await;
    let id = h.provision("alice@example.com").await;
    let cache = h.client.cache().unwrap();
    assert_eq!(cache.count(CacheKind::EmailAddress).await.unwrap(), 1);

    h.client.reset().await.unwrap();
    assert_eq!(cache.count(CacheKind::EmailAddress).await.unwrap(), 0);

    let cached = h
        .client
        .addresses()
        .get_email_address(GetEmailAddressInput {
            id,
            cache_policy: CachePolicy::CacheOnly,
        })
        .await
        .unwrap();
    assert!(cached.is_none());
}
