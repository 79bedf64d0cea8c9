/*
[INPUT]:  Mock authentication responses
[OUTPUT]: Test results for auth flow
[POS]:    Integration tests - authentication
[UPDATE]: When auth endpoints or flow changes
*/

mod common;

use common::{API_KEY, client_for, setup_mock_server, sign_in_response};
use firetodo_adapter::{AuthProvider, AuthState, FirebaseAuth, GoogleCredential, TokenSource};
use tokio_test::assert_ok;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_sign_up_then_sign_out_publishes_states() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(query_param("key", API_KEY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(sign_in_response("uid-new", "n@example.com", "tok-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = FirebaseAuth::new(client_for(&server));
    let mut rx = auth.subscribe();
    assert_eq!(*rx.borrow_and_update(), AuthState::Initializing);

    let identity = assert_ok!(auth.sign_up("n@example.com", "secret1").await);
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), AuthState::SignedIn(identity.clone()));
    assert_eq!(auth.current_identity(), Some(identity));

    assert_ok!(auth.sign_out().await);
    assert_eq!(*rx.borrow_and_update(), AuthState::SignedOut);
    assert!(auth.current_identity().is_none());
    assert_eq!(assert_ok!(auth.id_token().await), None);
}

#[tokio::test]
async fn test_wrong_password_is_normalized() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 400, "message": "INVALID_PASSWORD"}
        })))
        .mount(&server)
        .await;

    let auth = FirebaseAuth::new(client_for(&server));
    let err = auth.sign_in("a@example.com", "bad").await.unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.auth_code(), Some("auth/wrong-password"));
}

#[tokio::test]
async fn test_idp_error_message_in_success_body() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithIdp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errorMessage": "INVALID_IDP_RESPONSE",
        })))
        .mount(&server)
        .await;

    let auth = FirebaseAuth::new(client_for(&server));
    let err = auth
        .sign_in_with_google(&GoogleCredential::AccessToken("bad".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.auth_code(), Some("auth/invalid-credential"));
    assert_eq!(*auth.subscribe().borrow(), AuthState::Initializing);
}
