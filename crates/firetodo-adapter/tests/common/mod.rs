/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for firetodo-adapter tests

#![allow(dead_code)]

use firetodo_adapter::{BaseUrls, ClientConfig, FirebaseClient};
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const PROJECT_ID: &str = "demo-project";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointing every Firebase API at the mock server
pub fn client_for(server: &MockServer) -> FirebaseClient {
    FirebaseClient::with_config_and_base_urls(
        ClientConfig::default(),
        API_KEY,
        PROJECT_ID,
        &BaseUrls::single(&server.uri()),
    )
    .expect("client init")
}

/// Identity Toolkit sign-in response body
pub fn sign_in_response(uid: &str, email: &str, id_token: &str) -> serde_json::Value {
    serde_json::json!({
        "idToken": id_token,
        "refreshToken": format!("refresh-{uid}"),
        "expiresIn": "3600",
        "localId": uid,
        "email": email,
    })
}

/// Document root path of the mock project
pub fn documents_path() -> String {
    format!("/v1/projects/{PROJECT_ID}/databases/(default)/documents")
}
