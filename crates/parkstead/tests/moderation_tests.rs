//! Moderation workflow and listing CRUD integration tests.

mod common;

use std::sync::Arc;

use common::{harness, quiet_logger};
use parkstead::{AuthState, ListingService, ModerationWorkflow};
use parkstead_core::backend::listings::ListingStore;
use parkstead_core::backend::storage::ObjectStorage;
use parkstead_core::error::ErrorCode;
use parkstead_core::models::{
    Identity, Listing, ListingDraft, ListingPatch, ListingStatus, Role,
};

fn actor(id: &str, role: Role) -> AuthState {
    AuthState::Authenticated {
        identity: Identity::new(id, format!("{id}@parkstead.com"), "tok"),
        role,
    }
}

fn draft(title: &str) -> ListingDraft {
    ListingDraft {
        title: title.into(),
        price: 950_000,
        description: "32 full-hookup pads, bathhouse, well water".into(),
        location: "Flagstaff, AZ".into(),
    }
}

struct Setup {
    h: common::Harness,
    workflow: ModerationWorkflow,
    service: ListingService,
}

fn setup() -> Setup {
    let h = harness();
    let workflow = ModerationWorkflow::new(
        h.backend.listings.clone(),
        Arc::clone(&h.options),
        quiet_logger(),
    );
    let service = ListingService::new(
        h.backend.listings.clone(),
        h.backend.storage.clone(),
        Arc::clone(&h.options),
        quiet_logger(),
    );
    Setup {
        h,
        workflow,
        service,
    }
}

async fn seeded_listing(s: &Setup, owner: &str, title: &str) -> Listing {
    s.service
        .create(&actor(owner, Role::Broker), draft(title))
        .await
        .unwrap()
}

// ─── Moderation transitions ─────────────────────────────────────

#[tokio::test]
async fn reject_then_approve_round_trip() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Juniper Flats RV Resort").await;
    let admin = actor("admin-1", Role::Admin);

    let rejected = s
        .workflow
        .reject(&admin, &listing.id, Some("Missing required information"))
        .await
        .unwrap();
    assert_eq!(rejected.status, ListingStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("Missing required information")
    );

    let approved = s.workflow.approve(&admin, &listing.id).await.unwrap();
    assert_eq!(approved.status, ListingStatus::Approved);
    assert!(approved.rejection_reason.is_none());
}

#[tokio::test]
async fn reject_without_reason_uses_default() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Bent Pine Campground").await;
    let admin = actor("admin-1", Role::Admin);

    let rejected = s.workflow.reject(&admin, &listing.id, None).await.unwrap();
    assert_eq!(rejected.rejection_reason.as_deref(), Some("No reason provided"));

    let rejected = s
        .workflow
        .reject(&admin, &listing.id, Some("   "))
        .await
        .unwrap();
    assert_eq!(rejected.rejection_reason.as_deref(), Some("No reason provided"));
}

#[tokio::test]
async fn revert_to_pending_reopens_a_decision() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Lakeview Pads").await;
    let admin = actor("admin-1", Role::Admin);

    s.workflow.approve(&admin, &listing.id).await.unwrap();
    let reverted = s
        .workflow
        .revert_to_pending(&admin, &listing.id)
        .await
        .unwrap();
    assert_eq!(reverted.status, ListingStatus::Pending);
}

#[tokio::test]
async fn non_admin_actors_cannot_moderate() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Cactus Bloom RV").await;

    for state in [
        actor("owner-1", Role::Broker),
        actor("user-1", Role::User),
        AuthState::Unauthenticated,
        AuthState::Loading,
    ] {
        let err = s.workflow.approve(&state, &listing.id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotAllowedToModerateListings));

        let err = s
            .workflow
            .reject(&state, &listing.id, Some("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotAllowedToModerateListings));
    }

    // Nothing was mutated by the denied attempts.
    let stored = s
        .h
        .backend
        .listings
        .find_by_id(&listing.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ListingStatus::Pending);
    assert!(stored.rejection_reason.is_none());
}

#[tokio::test]
async fn failed_remote_update_leaves_listing_untouched() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Granite Pass RV").await;
    let admin = actor("admin-1", Role::Admin);
    s.h.backend.listings.fail_updates(true);

    assert!(s.workflow.approve(&admin, &listing.id).await.is_err());

    s.h.backend.listings.fail_updates(false);
    let stored = s
        .h
        .backend
        .listings
        .find_by_id(&listing.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ListingStatus::Pending);
}

#[tokio::test]
async fn moderating_a_missing_listing_is_not_found() {
    let s = setup();
    let admin = actor("admin-1", Role::Admin);
    let err = s.workflow.approve(&admin, "no-such-id").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ListingNotFound));
}

// ─── Listing CRUD ───────────────────────────────────────────────

#[tokio::test]
async fn create_stamps_owner_and_pending_status() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-9", "Sagebrush Acres").await;
    assert_eq!(listing.owner_id, "owner-9");
    assert_eq!(listing.status, ListingStatus::Pending);
}

#[tokio::test]
async fn create_requires_authentication() {
    let s = setup();
    let err = s
        .service
        .create(&AuthState::Unauthenticated, draft("Nope"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
}

#[tokio::test]
async fn owner_edits_content_in_any_status_without_touching_it() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Old Name").await;
    let admin = actor("admin-1", Role::Admin);
    s.workflow
        .reject(&admin, &listing.id, Some("typos"))
        .await
        .unwrap();

    let updated = s
        .service
        .edit(
            &actor("owner-1", Role::Broker),
            &listing.id,
            ListingPatch {
                title: Some("New Name".into()),
                price: Some(875_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "New Name");
    assert_eq!(updated.price, 875_000);
    // Content edits never move the moderation state.
    assert_eq!(updated.status, ListingStatus::Rejected);
    assert_eq!(updated.rejection_reason.as_deref(), Some("typos"));
}

#[tokio::test]
async fn non_owner_cannot_edit() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Hidden Gulch").await;

    for state in [
        actor("someone-else", Role::Broker),
        // Admins moderate status; content stays with the owner.
        actor("admin-1", Role::Admin),
    ] {
        let err = s
            .service
            .edit(
                &state,
                &listing.id,
                ListingPatch {
                    title: Some("Hijacked".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotAllowedToEditListing));
    }
}

#[tokio::test]
async fn delete_allowed_for_owner_and_admin_only() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Twin Rivers").await;

    let err = s
        .service
        .delete(&actor("stranger", Role::User), &listing.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotAllowedToDeleteListing));

    s.service
        .delete(&actor("owner-1", Role::Broker), &listing.id)
        .await
        .unwrap();
    assert_eq!(s.h.backend.listings.listing_count().await, 0);

    let listing = seeded_listing(&s, "owner-2", "Elk Meadow").await;
    s.service
        .delete(&actor("admin-1", Role::Admin), &listing.id)
        .await
        .unwrap();
    assert_eq!(s.h.backend.listings.listing_count().await, 0);
}

#[tokio::test]
async fn delete_cascades_to_asset_rows_and_storage() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Copper Canyon").await;

    let bucket = s.h.options.uploads.image_bucket.clone();
    for (idx, path) in ["a.jpg", "b.jpg"].iter().enumerate() {
        let stored = s
            .h
            .backend
            .storage
            .upload(&bucket, path, vec![1, 2, 3])
            .await
            .unwrap();
        s.h.backend
            .listings
            .insert_asset(parkstead_core::models::ListingAsset {
                id: format!("asset-{idx}"),
                listing_id: listing.id.clone(),
                storage_path: stored,
                position: idx as i32,
                is_primary: idx == 0,
                file_type: parkstead_core::models::AssetKind::Image,
            })
            .await
            .unwrap();
    }

    s.service
        .delete(&actor("owner-1", Role::Broker), &listing.id)
        .await
        .unwrap();
    assert_eq!(s.h.backend.listings.asset_count().await, 0);
    assert_eq!(s.h.backend.storage.object_count().await, 0);
}

#[tokio::test]
async fn delete_accepts_orphaned_storage_objects() {
    let s = setup();
    let listing = seeded_listing(&s, "owner-1", "Silver Creek").await;

    let bucket = s.h.options.uploads.image_bucket.clone();
    let stored = s
        .h
        .backend
        .storage
        .upload(&bucket, "photo.jpg", vec![1])
        .await
        .unwrap();
    s.h.backend
        .listings
        .insert_asset(parkstead_core::models::ListingAsset {
            id: "asset-1".into(),
            listing_id: listing.id.clone(),
            storage_path: stored.clone(),
            position: 0,
            is_primary: true,
            file_type: parkstead_core::models::AssetKind::Image,
        })
        .await
        .unwrap();

    // Storage sweep fails; the delete still completes and the object is
    // left behind as a logged orphan.
    s.h.backend.storage.fail_remove(true);
    s.service
        .delete(&actor("owner-1", Role::Broker), &listing.id)
        .await
        .unwrap();

    assert_eq!(s.h.backend.listings.listing_count().await, 0);
    assert_eq!(s.h.backend.listings.asset_count().await, 0);
    assert!(s.h.backend.storage.contains(&bucket, &stored).await);
}
