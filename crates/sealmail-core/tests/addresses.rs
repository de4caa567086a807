//! Email address provisioning and lookup.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::atomic::Ordering;

use sealmail_core::address::{
    CheckEmailAddressAvailabilityInput, GetEmailAddressInput, ListEmailAddressesInput,
    ProvisionEmailAddressInput, UpdateEmailAddressMetadataInput, ValidationError,
};
use sealmail_core::{CachePolicy, Error, Pagination};

use common::{Harness, sealed_with_lost_key};

fn provision_input(email_address: &str, alias: Option<&str>) -> ProvisionEmailAddressInput {
    ProvisionEmailAddressInput {
        email_address: email_address.to_string(),
        alias: alias.map(ToString::to_string),
    }
}

#[tokio::test]
async fn test_provision_normalizes_and_seals_alias() {
    let h = Harness::new().await;

    let address = h
        .client
        .addresses()
        .provision_email_address(provision_input("  Alice@Example.COM ", Some("Alice")))
        .await
        .unwrap();

    assert_eq!(address.email_address, "alice@example.com");
    assert_eq!(address.alias.as_deref(), Some("Alice"));
    assert_eq!(address.folders.len(), 3);
    assert!(address.folders.iter().all(|f| !f.is_custom()));

    // the backend only ever sees the sealed alias
    let state = h.backend.state();
    let stored = &state.addresses[&address.id];
    let sealed = stored.sealed_alias.as_ref().unwrap();
    assert_ne!(sealed.ciphertext, b"Alice");
}

#[tokio::test]
async fn test_provision_rejects_invalid_and_unsupported() {
    let h = Harness::new().await;
    let addresses = h.client.addresses();

    let err = addresses
        .provision_email_address(provision_input("no-at-sign", None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidEmailAddress {
            reason: ValidationError::MissingAtSign,
            ..
        }
    ));

    let err = addresses
        .provision_email_address(provision_input("alice@elsewhere.org", None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidEmailAddress {
            reason: ValidationError::UnsupportedDomain,
            ..
        }
    ));
    assert!(h.backend.state().addresses.is_empty());
}

#[tokio::test]
async fn test_provision_taken_address_maps_backend_error() {
    let h = Harness::new().await;
    h.provision("alice@example.com").await;

    let err = h
        .client
        .addresses()
        .provision_email_address(provision_input("alice@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AddressUnavailable(_)));
    assert_eq!(err.error_type(), "AddressUnavailable");
}

#[tokio::test]
async fn test_concurrent_provisioning_is_serialized() {
    let h = Harness::new().await;
    let addresses = h.client.addresses();

    let (a, b, c) = tokio::join!(
        addresses.provision_email_address(provision_input("a@example.com", None)),
        addresses.provision_email_address(provision_input("b@example.com", None)),
        addresses.provision_email_address(provision_input("c@example.com", None)),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert_eq!(
        h.backend.max_concurrent_provisioning.load(Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn test_update_metadata_and_clear_alias() {
    let h = Harness::new().await;
    let id = h.provision("alice@example.com").await;
    let addresses = h.client.addresses();

    let updated = addresses
        .update_email_address_metadata(UpdateEmailAddressMetadataInput {
            id: id.clone(),
            alias: Some("Work".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(updated, id);

    let read = |id: String| GetEmailAddressInput {
        id,
        cache_policy: CachePolicy::RemoteOnly,
    };
    let address = addresses.get_email_address(read(id.clone())).await.unwrap().unwrap();
    assert_eq!(address.alias.as_deref(), Some("Work"));

    addresses
        .update_email_address_metadata(UpdateEmailAddressMetadataInput {
            id: id.clone(),
            alias: Some("   ".to_string()),
        })
        .await
        .unwrap();
    let address = addresses.get_email_address(read(id)).await.unwrap().unwrap();
    assert_eq!(address.alias, None);
}

#[tokio::test]
async fn test_cache_only_reads_never_reach_backend() {
    let h = Harness::with_cache().await;
    let id = h.provision("alice@example.com").await;
    let addresses = h.client.addresses();
    let reads = h.backend.remote_reads();

    let cached = addresses
        .get_email_address(GetEmailAddressInput {
            id: id.clone(),
            cache_policy: CachePolicy::CacheOnly,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.email_address, "alice@example.com");

    let listed = addresses
        .list_email_addresses(ListEmailAddressesInput {
            cache_policy: CachePolicy::CacheOnly,
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(h.backend.remote_reads(), reads);
}

#[tokio::test]
async fn test_cache_only_without_cache_is_empty() {
    let h = Harness::new().await;
    let id = h.provision("alice@example.com").await;

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

#[tokio::test]
async fn test_deprovision_evicts_cache() {
    let h = Harness::with_cache().await;
    let id = h.provision("alice@example.com").await;
    let addresses = h.client.addresses();

    let removed = addresses.deprovision_email_address(&id).await.unwrap();
    assert_eq!(removed.id, id);

    let cached = addresses
        .get_email_address(GetEmailAddressInput {
            id,
            cache_policy: CachePolicy::CacheOnly,
        })
        .await
        .unwrap();
    assert!(cached.is_none());

    let err = addresses.deprovision_email_address("  ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_list_paginates() {
    let h = Harness::new().await;
    for local in ["a", "b", "c"] {
        h.provision(&format!("{local}@example.com")).await;
    }
    let addresses = h.client.addresses();

    let first = addresses
        .list_email_addresses(ListEmailAddressesInput {
            cache_policy: CachePolicy::RemoteOnly,
            pagination: Pagination::with_limit(2),
        })
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    let token = first.next_token.unwrap();

    let second = addresses
        .list_email_addresses(ListEmailAddressesInput {
            cache_policy: CachePolicy::RemoteOnly,
            pagination: Pagination {
                limit: Some(2),
                next_token: Some(token),
            },
        })
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(second.next_token.is_none());

    let err = addresses
        .list_email_addresses(ListEmailAddressesInput {
            cache_policy: CachePolicy::RemoteOnly,
            pagination: Pagination::with_limit(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_list_tolerates_unreadable_names() {
    let h = Harness::new().await;
    let addresses = h.client.addresses();
    let broken = addresses
        .provision_email_address(provision_input("ann@example.com", Some("Ann")))
        .await
        .unwrap()
        .id;
    let intact = addresses
        .provision_email_address(provision_input("bob@example.com", Some("Bob")))
        .await
        .unwrap()
        .id;
    {
        let mut state = h.backend.state();
        let record = state.addresses.get_mut(&broken).unwrap();
        record.sealed_alias = Some(sealed_with_lost_key(b"Ann"));
        record.folders[0].sealed_custom_folder_name = Some(sealed_with_lost_key(b"Work"));
    }

    let listed = addresses
        .list_email_addresses(ListEmailAddressesInput::default())
        .await
        .unwrap();
    assert_eq!(listed.items.len(), 2);
    let ann = listed.items.iter().find(|a| a.id == broken).unwrap();
    assert_eq!(ann.email_address, "ann@example.com");
    assert!(ann.alias.is_none());
    assert_eq!(ann.folders.len(), 3);
    assert!(ann.folders[0].custom_folder_name.is_none());
    let bob = listed.items.iter().find(|a| a.id == intact).unwrap();
    assert_eq!(bob.alias.as_deref(), Some("Bob"));

    // a single read still reports the failure
    let err = addresses
        .get_email_address(GetEmailAddressInput {
            id: broken,
            cache_policy: CachePolicy::RemoteOnly,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Sealing(_)));
}

#[tokio::test]
async fn test_lookup_public_info_dedupes() {
    let h = Harness::new().await;
    h.backend.publish_key("bob@example.com");
    let addresses = h.client.addresses();

    let info = addresses
        .lookup_email_addresses_public_info(&[
            "Bob@Example.com".to_string(),
            "bob@example.com".to_string(),
            "stranger@example.org".to_string(),
        ])
        .await
        .unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].email_address, "bob@example.com");

    assert!(
        addresses
            .lookup_email_addresses_public_info(&[])
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_check_availability() {
    let h = Harness::new().await;
    h.provision("alice@example.com").await;
    let addresses = h.client.addresses();

    let available = addresses
        .check_email_address_availability(CheckEmailAddressAvailabilityInput {
            local_parts: vec!["Alice".to_string(), "bob".to_string()],
            domains: None,
        })
        .await
        .unwrap();
    assert_eq!(available, vec!["bob@example.com".to_string()]);

    let err = addresses
        .check_email_address_availability(CheckEmailAddressAvailabilityInput {
            local_parts: vec!["bob".to_string()],
            domains: Some(vec!["example.org".to_string()]),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidEmailAddress {
            reason: ValidationError::UnsupportedDomain,
            ..
        }
    ));

    let err = addresses
        .check_email_address_availability(CheckEmailAddressAvailabilityInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_domains_are_lowercased() {
    let h = Harness::new().await;
    let addresses = h.client.addresses();

    assert_eq!(
        addresses.get_supported_email_domains().await.unwrap(),
        vec!["example.com".to_string()]
    );
    assert_eq!(
        addresses.get_configured_email_domains().await.unwrap(),
        vec!["example.com".to_string(), "example.org".to_string()]
    );
}
