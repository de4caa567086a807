//! Email masks.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use sealmail_core::address::ValidationError;
use sealmail_core::mask::{
    EmailMaskFilter, EmailMaskMetadata, EmailMaskRealAddressType, EmailMaskStatus,
    ListEmailMasksForOwnerInput, ProvisionEmailMaskInput, UpdateEmailMaskInput,
};
use sealmail_core::{Error, Pagination};

use common::{Harness, sealed_with_lost_key};

fn metadata(label: &str) -> EmailMaskMetadata {
    EmailMaskMetadata::from([("label".to_string(), label.to_string())])
}

fn mask_input(masked: &str, real: &str) -> ProvisionEmailMaskInput {
    ProvisionEmailMaskInput {
        masked_email_address: masked.to_string(),
        real_email_address: real.to_string(),
        metadata: Some(metadata("shopping")),
        expires_at: None,
    }
}

#[tokio::test]
async fn test_provision_and_update_mask() {
    let h = Harness::new().await;
    h.provision("alice@example.com").await;
    let masks = h.client.masks();

    let mask = masks
        .provision_email_mask(mask_input("Shop@Mask.Example.com", "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(mask.masked_email_address, "shop@mask.example.com");
    assert_eq!(mask.real_email_address_type, EmailMaskRealAddressType::Internal);
    assert_eq!(mask.metadata, Some(metadata("shopping")));

    let expires_at = Utc::now() + Duration::days(30);
    let updated = masks
        .update_email_mask(UpdateEmailMaskInput {
            email_mask_id: mask.id.clone(),
            metadata: Some(metadata("travel")),
            expires_at: Some(expires_at),
        })
        .await
        .unwrap();
    assert_eq!(updated.metadata, Some(metadata("travel")));
    assert_eq!(updated.expires_at, Some(expires_at));
    assert_eq!(updated.version, 2);

    let err = masks
        .update_email_mask(UpdateEmailMaskInput {
            email_mask_id: mask.id.clone(),
            ..UpdateEmailMaskInput::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let removed = masks.deprovision_email_mask(&mask.id).await.unwrap();
    assert_eq!(removed.id, mask.id);
    let err = masks.deprovision_email_mask(&mask.id).await.unwrap_err();
    assert!(matches!(err, Error::MaskNotFound(_)));
}

#[tokio::test]
async fn test_provision_validation() {
    let h = Harness::new().await;
    let masks = h.client.masks();

    let err = masks
        .provision_email_mask(mask_input("shop@example.com", "me@outside.org"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidEmailAddress {
            reason: ValidationError::UnsupportedDomain,
            ..
        }
    ));

    let err = masks
        .provision_email_mask(mask_input("me@mask.example.com", "ME@mask.example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let mut input = mask_input("shop@mask.example.com", "me@outside.org");
    input.expires_at = Some(Utc::now() - Duration::days(1));
    let err = masks.provision_email_mask(input).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    assert!(h.backend.state().masks.is_empty());
}

#[tokio::test]
async fn test_concurrent_mask_provisioning_is_serialized() {
    let h = Harness::new().await;
    let masks = h.client.masks();

    let (a, b) = tokio::join!(
        masks.provision_email_mask(mask_input("a@mask.example.com", "me@outside.org")),
        masks.provision_email_mask(mask_input("b@mask.example.com", "me@outside.org")),
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(
        h.backend.max_concurrent_provisioning.load(Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn test_enable_disable_and_filtered_list() {
    let h = Harness::new().await;
    let masks = h.client.masks();
    let first = masks
        .provision_email_mask(mask_input("a@mask.example.com", "me@outside.org"))
        .await
        .unwrap();
    masks
        .provision_email_mask(mask_input("b@mask.example.com", "me@outside.org"))
        .await
        .unwrap();

    let disabled = masks.disable_email_mask(&first.id).await.unwrap();
    assert_eq!(disabled.status, EmailMaskStatus::Disabled);

    let list = |status: Option<Vec<EmailMaskStatus>>| ListEmailMasksForOwnerInput {
        filter: Some(EmailMaskFilter {
            status,
            real_address_type: None,
        }),
        pagination: Pagination::default(),
    };

    let enabled = masks
        .list_email_masks_for_owner(list(Some(vec![EmailMaskStatus::Enabled])))
        .await
        .unwrap();
    assert_eq!(enabled.items.len(), 1);
    assert_eq!(enabled.items[0].masked_email_address, "b@mask.example.com");

    masks.enable_email_mask(&first.id).await.unwrap();
    let enabled = masks
        .list_email_masks_for_owner(list(Some(vec![EmailMaskStatus::Enabled])))
        .await
        .unwrap();
    assert_eq!(enabled.items.len(), 2);
}

#[tokio::test]
async fn test_list_tolerates_unreadable_metadata() {
    let h = Harness::new().await;
    let masks = h.client.masks();
    let mask = masks
        .provision_email_mask(mask_input("a@mask.example.com", "me@outside.org"))
        .await
        .unwrap();
    h.backend
        .state()
        .masks
        .get_mut(&mask.id)
        .unwrap()
        .sealed_metadata = Some(sealed_with_lost_key(b"{}"));

    let listed = masks
        .list_email_masks_for_owner(ListEmailMasksForOwnerInput::default())
        .await
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].metadata, None);
}

#[tokio::test]
async fn test_supported_mask_domains() {
    let h = Harness::new().await;
    assert_eq!(
        h.client
            .masks()
            .get_supported_email_mask_domains()
            .await
            .unwrap(),
        vec!["mask.example.com".to_string()]
    );
}
