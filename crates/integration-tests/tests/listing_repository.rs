//! Listing repository tests against a mock backend.
//!
//! These exercise the full operation chains: photo upload + record create,
//! the non-transactional delete cascade, and the three query shapes.

use httpmock::prelude::*;

use carlot_core::Phone;
use carlot_integration_tests::{BUCKET, documents_path, listing_document, owner, repository};
use carlot_site::firebase::firestore::Document;
use carlot_site::models::{Listing, NewListing};
use carlot_site::services::ListingError;

fn new_listing_form() -> NewListing {
    NewListing {
        name: "Onix 1.0".to_owned(),
        model: "1.0 flex plus manual".to_owned(),
        year: "2024/2024".to_owned(),
        km: "23100".to_owned(),
        price: "46.700".to_owned(),
        city: "Recife - PE".to_owned(),
        whatsapp: Phone::parse("81988880000").expect("valid phone"),
        description: "Well kept, single owner.".to_owned(),
    }
}

fn stored_listing(id: &str, name: &str, uid: &str, created: &str, images: &[&str]) -> Listing {
    let document: Document =
        serde_json::from_value(listing_document(id, name, uid, created, images))
            .expect("document json should parse");
    Listing::from_document(&document).expect("document should decode")
}

// =============================================================================
// Upload + create
// =============================================================================

#[tokio::test]
async fn test_upload_two_images_then_create_listing() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);
    let seller = owner("u1", "Seller");

    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/v0/b/{BUCKET}/o"));
            then.status(200)
                .json_body(serde_json::json!({"name": "ignored", "downloadTokens": "tok"}));
        })
        .await;

    let first = repo
        .upload_image(&seller, "image/jpeg", vec![0xFF, 0xD8])
        .await
        .expect("first upload should succeed");
    let second = repo
        .upload_image(&seller, "image/png", vec![0x89, 0x50])
        .await
        .expect("second upload should succeed");

    assert_eq!(upload.hits_async().await, 2);
    assert_ne!(first.image.name, second.image.name);
    assert_eq!(first.image.uid.as_str(), "u1");
    assert!(first.image.blob_path().starts_with("images/u1/"));

    // The record write must carry the upper-cased name, both owner fields,
    // and exactly the two uploaded refs.
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}/cars", documents_path()))
                .json_body_partial(
                    r#"{
                        "fields": {
                            "name": {"stringValue": "ONIX 1.0"},
                            "owner": {"stringValue": "Seller"},
                            "uid": {"stringValue": "u1"}
                        }
                    }"#,
                )
                .body_contains(first.image.name.as_str())
                .body_contains(second.image.name.as_str());
            then.status(200).json_body(listing_document(
                "fresh-id",
                "ONIX 1.0",
                "u1",
                "2024-03-01T12:00:00Z",
                &["a", "b"],
            ));
        })
        .await;

    let id = repo
        .create_listing(
            &seller,
            new_listing_form(),
            vec![first.image.clone(), second.image.clone()],
        )
        .await
        .expect("create should succeed");

    create.assert_async().await;
    assert_eq!(id.as_str(), "fresh-id");
}

#[tokio::test]
async fn test_upload_rejects_wrong_content_type_without_store_call() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);
    let seller = owner("u1", "Seller");

    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/v0/b/{BUCKET}/o"));
            then.status(200).json_body(serde_json::json!({"name": "x"}));
        })
        .await;

    let result = repo
        .upload_image(&seller, "image/gif", vec![0x47, 0x49])
        .await;

    assert!(matches!(
        result,
        Err(ListingError::UnsupportedImageType(_))
    ));
    assert_eq!(upload.hits_async().await, 0);
}

#[tokio::test]
async fn test_create_listing_with_no_images_is_rejected_before_any_write() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);
    let seller = owner("u1", "Seller");

    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}/cars", documents_path()));
            then.status(200).json_body(serde_json::json!({}));
        })
        .await;

    let result = repo.create_listing(&seller, new_listing_form(), vec![]).await;

    assert!(matches!(result, Err(ListingError::NoImages)));
    assert_eq!(create.hits_async().await, 0);
}

// =============================================================================
// Delete cascade
// =============================================================================

#[tokio::test]
async fn test_delete_listing_attempts_every_blob_without_short_circuiting() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);
    let seller = owner("u1", "Seller");
    let listing = stored_listing("h2J9x", "ONIX 1.0", "u1", "2024-03-01T12:00:00Z", &["blob-a", "blob-b"]);

    let record = server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("{}/cars/h2J9x", documents_path()));
            then.status(200).json_body(serde_json::json!({}));
        })
        .await;
    // First blob fails server-side; the second must still be attempted.
    let blob_a = server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("blob-a");
            then.status(500).json_body(serde_json::json!({
                "error": {"code": 500, "message": "backend error"}
            }));
        })
        .await;
    let blob_b = server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("blob-b");
            then.status(204);
        })
        .await;

    let outcome = repo
        .delete_listing(&seller, &listing)
        .await
        .expect("record delete succeeded, so the operation succeeds");

    record.assert_async().await;
    assert_eq!(blob_a.hits_async().await, 1);
    assert_eq!(blob_b.hits_async().await, 1);
    assert_eq!(outcome.deleted_blobs, 1);
    assert_eq!(outcome.failed_blobs, 1);
    assert!(!outcome.is_clean());
}

#[tokio::test]
async fn test_failed_record_delete_skips_the_blob_cascade() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);
    let seller = owner("u1", "Seller");
    let listing = stored_listing("h2J9x", "ONIX 1.0", "u1", "2024-03-01T12:00:00Z", &["blob-a", "blob-b"]);

    server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("{}/cars/h2J9x", documents_path()));
            then.status(403).json_body(serde_json::json!({
                "error": {"code": 403, "message": "PERMISSION_DENIED"}
            }));
        })
        .await;
    let blobs = server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("blob-");
            then.status(204);
        })
        .await;

    let result = repo.delete_listing(&seller, &listing).await;

    assert!(matches!(result, Err(ListingError::Write(_))));
    assert_eq!(blobs.hits_async().await, 0);
}

#[tokio::test]
async fn test_delete_image_on_never_written_path_reports_not_found() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);
    let seller = owner("u1", "Seller");
    let listing = stored_listing("x", "GOL", "u1", "2024-03-01T12:00:00Z", &["never-written"]);
    let image = listing.images.first().expect("listing has one image");

    server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("never-written");
            then.status(404).json_body(serde_json::json!({
                "error": {"code": 404, "message": "Not Found."}
            }));
        })
        .await;

    let result = repo.delete_image(&seller, image).await;
    assert!(matches!(result, Err(ListingError::Storage(_))));
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_list_all_requests_descending_creation_order() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);

    // Only a query ordered by created DESCENDING matches; anything else
    // would fall through to the mock server's 404.
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}:runQuery", documents_path()))
                .body_contains("created")
                .body_contains("DESCENDING");
            then.status(200).json_body(serde_json::json!([
                {"document": listing_document("t3", "GOL", "u1", "2024-03-03T12:00:00Z", &["a"])},
                {"document": listing_document("t2", "GOL", "u2", "2024-03-02T12:00:00Z", &["a"])},
                {"document": listing_document("t1", "GOL", "u1", "2024-03-01T12:00:00Z", &["a"])}
            ]));
        })
        .await;

    let listings = repo.list_all().await.expect("list should succeed");

    query.assert_async().await;
    let ids: Vec<_> = listings.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["t3", "t2", "t1"]);
    assert!(listings.windows(2).all(|w| w[0].created >= w[1].created));
}

#[tokio::test]
async fn test_list_by_owner_filters_on_uid_equality() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);
    let seller = owner("u1", "Seller");

    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}:runQuery", documents_path()))
                .json_body_partial(
                    r#"{
                        "structuredQuery": {
                            "where": {
                                "fieldFilter": {
                                    "field": {"fieldPath": "uid"},
                                    "op": "EQUAL",
                                    "value": {"stringValue": "u1"}
                                }
                            }
                        }
                    }"#,
                );
            then.status(200).json_body(serde_json::json!([
                {"document": listing_document("mine-1", "GOL", "u1", "2024-03-01T12:00:00Z", &["a"])},
                {"document": listing_document("mine-2", "UNO", "u1", "2024-02-01T12:00:00Z", &["a"])}
            ]));
        })
        .await;

    let listings = repo
        .list_by_owner(&seller.uid)
        .await
        .expect("list should succeed");

    query.assert_async().await;
    assert_eq!(listings.len(), 2);
    assert!(listings.iter().all(|l| l.uid.as_str() == "u1"));
}

#[tokio::test]
async fn test_search_by_name_prefix_matches_onix_and_not_civic() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);

    // The emulated prefix match is an upper-cased range query bounded by
    // the sentinel character; "CIVIC 2.0" sorts outside it, so the store
    // never returns it.
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}:runQuery", documents_path()))
                .body_contains("GREATER_THAN_OR_EQUAL")
                .body_contains("LESS_THAN_OR_EQUAL")
                .body_contains("ONIX\u{f8ff}");
            then.status(200).json_body(serde_json::json!([
                {"document": listing_document("o1", "ONIX 1.0", "u1", "2024-03-01T12:00:00Z", &["a"])}
            ]));
        })
        .await;

    let listings = repo
        .search_by_name_prefix("Onix")
        .await
        .expect("search should succeed");

    query.assert_async().await;
    assert_eq!(listings.len(), 1);
    assert!(listings.iter().any(|l| l.name == "ONIX 1.0"));
    assert!(!listings.iter().any(|l| l.name.starts_with("CIVIC")));
}

// =============================================================================
// Single get
// =============================================================================

#[tokio::test]
async fn test_get_missing_listing_is_none() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);

    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{}/cars/missing", documents_path()));
            then.status(404).json_body(serde_json::json!({
                "error": {"code": 404, "message": "Document not found.", "status": "NOT_FOUND"}
            }));
        })
        .await;

    let listing = repo
        .get(&carlot_core::ListingId::new("missing"))
        .await
        .expect("a missing record is not an error");
    assert!(listing.is_none());
}

#[tokio::test]
async fn test_get_decodes_full_listing() {
    let server = MockServer::start_async().await;
    let repo = repository(&server);

    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{}/cars/h2J9x", documents_path()));
            then.status(200).json_body(listing_document(
                "h2J9x",
                "ONIX 1.0",
                "u1",
                "2024-03-01T12:00:00Z",
                &["blob-a", "blob-b"],
            ));
        })
        .await;

    let listing = repo
        .get(&carlot_core::ListingId::new("h2J9x"))
        .await
        .expect("get should succeed")
        .expect("listing exists");

    assert_eq!(listing.name, "ONIX 1.0");
    assert_eq!(listing.images.len(), 2);
    assert_eq!(listing.whatsapp, "81988880000");
}
