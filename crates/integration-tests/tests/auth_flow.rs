//! Identity provider client tests against a mock backend.

use httpmock::prelude::*;

use carlot_integration_tests::auth_client;
use carlot_site::firebase::AuthError;

#[tokio::test]
async fn test_sign_in_returns_session() {
    let server = MockServer::start_async().await;
    let client = auth_client(&server);

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/accounts:signInWithPassword")
                .query_param("key", "AIzaTestKey")
                .json_body_partial(r#"{"email": "seller@example.com", "returnSecureToken": true}"#);
            then.status(200).json_body(serde_json::json!({
                "localId": "u1",
                "email": "seller@example.com",
                "displayName": "Seller",
                "idToken": "fresh-token",
                "refreshToken": "r",
                "expiresIn": "3600"
            }));
        })
        .await;

    let session = client
        .sign_in("seller@example.com", "hunter22")
        .await
        .expect("sign-in should succeed");

    mock.assert_async().await;
    assert_eq!(session.uid.as_str(), "u1");
    assert_eq!(session.display_name.as_deref(), Some("Seller"));
    assert_eq!(session.id_token, "fresh-token");
}

#[tokio::test]
async fn test_sign_in_rejection_maps_to_invalid_credentials() {
    let server = MockServer::start_async().await;
    let client = auth_client(&server);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/accounts:signInWithPassword");
            then.status(400).json_body(serde_json::json!({
                "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
            }));
        })
        .await;

    let result = client.sign_in("seller@example.com", "wrong").await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_sign_up_creates_account_then_sets_display_name() {
    let server = MockServer::start_async().await;
    let client = auth_client(&server);

    let sign_up = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/accounts:signUp");
            then.status(200).json_body(serde_json::json!({
                "localId": "u2",
                "email": "new@example.com",
                "idToken": "fresh-token",
                "refreshToken": "r",
                "expiresIn": "3600"
            }));
        })
        .await;

    let update = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/accounts:update")
                .json_body_partial(r#"{"idToken": "fresh-token", "displayName": "New Seller"}"#);
            then.status(200).json_body(serde_json::json!({
                "localId": "u2",
                "email": "new@example.com",
                "displayName": "New Seller",
                "idToken": "fresh-token"
            }));
        })
        .await;

    let session = client
        .sign_up("new@example.com", "hunter22", "New Seller")
        .await
        .expect("sign-up should succeed");

    sign_up.assert_async().await;
    update.assert_async().await;
    assert_eq!(session.uid.as_str(), "u2");
    assert_eq!(session.display_name.as_deref(), Some("New Seller"));
}

#[tokio::test]
async fn test_sign_up_existing_email() {
    let server = MockServer::start_async().await;
    let client = auth_client(&server);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/accounts:signUp");
            then.status(400).json_body(serde_json::json!({
                "error": {"code": 400, "message": "EMAIL_EXISTS"}
            }));
        })
        .await;

    let result = client.sign_up("taken@example.com", "hunter22", "Someone").await;
    assert!(matches!(result, Err(AuthError::EmailExists)));
}
