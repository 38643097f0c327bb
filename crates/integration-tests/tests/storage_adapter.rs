//! Object store client tests against a mock backend.

use httpmock::prelude::*;

use carlot_integration_tests::{BUCKET, storage_client};
use carlot_site::firebase::StorageError;

#[tokio::test]
async fn test_put_returns_tokened_and_preview_urls() {
    let server = MockServer::start_async().await;
    let client = storage_client(&server);

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v0/b/{BUCKET}/o"))
                .query_param("name", "images/u1/blob-1")
                .header("content-type", "image/jpeg");
            then.status(200).json_body(serde_json::json!({
                "name": "images/u1/blob-1",
                "bucket": BUCKET,
                "contentType": "image/jpeg",
                "downloadTokens": "tok-1"
            }));
        })
        .await;

    let blob = client
        .put("images/u1/blob-1", vec![0xFF, 0xD8], "image/jpeg", Some("token-u1"))
        .await
        .expect("upload should succeed");

    mock.assert_async().await;
    assert!(blob.url.contains("images%2Fu1%2Fblob-1"));
    assert!(blob.url.ends_with("alt=media&token=tok-1"));
    assert!(blob.preview_url.ends_with("alt=media"));
    assert_ne!(blob.url, blob.preview_url);
}

#[tokio::test]
async fn test_delete_succeeds_on_existing_blob() {
    let server = MockServer::start_async().await;
    let client = storage_client(&server);

    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("blob-1");
            then.status(204);
        })
        .await;

    client
        .delete("images/u1/blob-1", Some("token-u1"))
        .await
        .expect("delete should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_of_never_written_path_is_not_found() {
    let server = MockServer::start_async().await;
    let client = storage_client(&server);

    server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains("never-written");
            then.status(404).json_body(serde_json::json!({
                "error": {"code": 404, "message": "Not Found."}
            }));
        })
        .await;

    let result = client.delete("images/u1/never-written", Some("token-u1")).await;
    assert!(matches!(result, Err(StorageError::NotFound(ref p)) if p == "images/u1/never-written"));
}

#[tokio::test]
async fn test_put_surfaces_backend_rejection() {
    let server = MockServer::start_async().await;
    let client = storage_client(&server);

    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/v0/b/{BUCKET}/o"));
            then.status(403).json_body(serde_json::json!({
                "error": {"code": 403, "message": "Permission denied."}
            }));
        })
        .await;

    let result = client
        .put("images/u1/blob-1", vec![1, 2, 3], "image/png", None)
        .await;

    match result {
        Err(StorageError::Status { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Permission denied.");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
