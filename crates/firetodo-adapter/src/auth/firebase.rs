/*
[INPUT]:  Firebase HTTP client, credentials, optional session persistence
[OUTPUT]: Signed-in identities, fresh ID tokens, auth-state notifications
[POS]:    Auth layer - Identity Toolkit implementation of AuthProvider
[UPDATE]: When auth endpoints, refresh policy or persistence change
*/

use async_trait::async_trait;
use chrono::Duration;
use reqwest::Method;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::http::{FirebaseClient, FirebaseError, Result};
use crate::types::{
    AuthState, Identity, IdpSignInRequest, PasswordAuthRequest, RefreshTokenRequest,
    RefreshTokenResponse, SignInMethod, SignInResponse,
};

use super::codes::auth_code_for;
use super::{AuthProvider, GoogleCredential, SessionPersistence, StoredSession, TokenManager, TokenSource};

/// Refresh the ID token this long before it expires
const REFRESH_SKEW_SECONDS: i64 = 60;
const IDP_REQUEST_URI: &str = "http://localhost";

/// Identity Toolkit backed auth provider
#[derive(Debug)]
pub struct FirebaseAuth {
    client: FirebaseClient,
    tokens: TokenManager,
    persistence: Option<SessionPersistence>,
    state: watch::Sender<AuthState>,
}

impl FirebaseAuth {
    /// Create an auth provider that keeps the session in memory only
    pub fn new(client: FirebaseClient) -> Self {
        let (state, _rx) = watch::channel(AuthState::Initializing);
        Self {
            client,
            tokens: TokenManager::new(),
            persistence: None,
            state,
        }
    }

    /// Create an auth provider that persists the sign-in across runs
    pub fn with_persistence(client: FirebaseClient, persistence: SessionPersistence) -> Self {
        let mut auth = Self::new(client);
        auth.persistence = Some(persistence);
        auth
    }

    /// Get the token manager
    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// POST /v1/accounts:signUp
    async fn request_sign_up(&self, email: &str, password: &str) -> Result<SignInResponse> {
        let body = PasswordAuthRequest {
            email: email.to_string(),
            password: password.to_string(),
            return_secure_token: true,
        };
        let builder = self
            .client
            .identity_request(Method::POST, "/v1/accounts:signUp")?
            .json(&body);
        self.client.send_json(builder).await.map_err(map_auth_error)
    }

    /// POST /v1/accounts:signInWithPassword
    async fn request_sign_in(&self, email: &str, password: &str) -> Result<SignInResponse> {
        let body = PasswordAuthRequest {
            email: email.to_string(),
            password: password.to_string(),
            return_secure_token: true,
        };
        let builder = self
            .client
            .identity_request(Method::POST, "/v1/accounts:signInWithPassword")?
            .json(&body);
        self.client.send_json(builder).await.map_err(map_auth_error)
    }

    /// POST /v1/accounts:signInWithIdp
    async fn request_idp_sign_in(&self, credential: &GoogleCredential) -> Result<SignInResponse> {
        let token_param = match credential {
            GoogleCredential::IdToken(_) => "id_token",
            GoogleCredential::AccessToken(_) => "access_token",
        };
        let post_body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(token_param, credential.token())
            .append_pair("providerId", SignInMethod::Google.provider_id())
            .finish();
        let body = IdpSignInRequest {
            post_body,
            request_uri: IDP_REQUEST_URI.to_string(),
            return_idp_credential: true,
            return_secure_token: true,
        };
        let builder = self
            .client
            .identity_request(Method::POST, "/v1/accounts:signInWithIdp")?
            .json(&body);
        let response: SignInResponse = self.client.send_json(builder).await.map_err(map_auth_error)?;

        match response.error_message.as_deref() {
            Some(message) => Err(FirebaseError::auth(auth_code_for(message), message)),
            None => Ok(response),
        }
    }

    /// POST /v1/token (grant_type=refresh_token)
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<RefreshTokenResponse> {
        let builder = self
            .client
            .secure_token_request(Method::POST, "/v1/token")?
            .form(&RefreshTokenRequest::new(refresh_token));
        self.client.send_json(builder).await.map_err(map_auth_error)
    }

    /// Store tokens, persist, and publish the new identity
    fn complete_sign_in(&self, response: SignInResponse, method: SignInMethod) -> Result<Identity> {
        if response.id_token.is_empty() || response.local_id.is_empty() {
            return Err(FirebaseError::InvalidResponse(
                "sign-in response without idToken/localId".to_string(),
            ));
        }
        let expires_seconds = parse_expires_in(&response.expires_in)?;

        let identity = Identity {
            uid: response.local_id,
            email: response.email,
            display_name: response.display_name,
            sign_in_method: method,
        };
        self.tokens.set_tokens(
            identity.clone(),
            response.id_token,
            response.refresh_token.clone(),
            expires_seconds,
        );
        self.persist(&response.refresh_token, &identity);

        info!(uid = %identity.uid, method = ?method, "signed in");
        self.state.send_replace(AuthState::SignedIn(identity.clone()));
        Ok(identity)
    }

    fn persist(&self, refresh_token: &str, identity: &Identity) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let stored = StoredSession {
            refresh_token: refresh_token.to_string(),
            identity: identity.clone(),
        };
        if let Err(err) = persistence.save(&stored) {
            warn!(path = %persistence.path().display(), error = %err, "failed to persist session");
        }
    }

    fn forget_session(&self) {
        self.tokens.clear();
        if let Some(persistence) = &self.persistence {
            if let Err(err) = persistence.clear() {
                warn!(path = %persistence.path().display(), error = %err, "failed to remove session file");
            }
        }
    }

    /// Restore a persisted sign-in by exchanging its refresh token
    async fn restore(&self) -> Result<Option<Identity>> {
        let Some(stored) = self.persistence.as_ref().and_then(SessionPersistence::load) else {
            return Ok(None);
        };

        let response = match self.exchange_refresh_token(&stored.refresh_token).await {
            Ok(response) => response,
            Err(err) if err.is_auth_error() => {
                warn!(uid = %stored.identity.uid, error = %err, "stored session rejected");
                self.forget_session();
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if response.user_id != stored.identity.uid {
            warn!(
                stored = %stored.identity.uid,
                returned = %response.user_id,
                "stored session belongs to another user"
            );
            self.forget_session();
            return Ok(None);
        }

        let expires_seconds = parse_expires_in(&response.expires_in)?;
        self.tokens.set_tokens(
            stored.identity.clone(),
            response.id_token,
            response.refresh_token.clone(),
            expires_seconds,
        );
        self.persist(&response.refresh_token, &stored.identity);
        info!(uid = %stored.identity.uid, "restored stored session");
        Ok(Some(stored.identity))
    }
}

/// Turn 4xx REST error envelopes into SDK-style auth errors
///
/// Server-side failures (5xx) stay `Api` so callers do not mistake an
/// outage for a rejected credential.
fn map_auth_error(err: FirebaseError) -> FirebaseError {
    match err {
        FirebaseError::Api { code, message } if (400..500).contains(&code) => {
            FirebaseError::Auth {
                code: auth_code_for(&message),
                message,
            }
        }
        other => other,
    }
}

fn parse_expires_in(value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| FirebaseError::InvalidResponse(format!("invalid expiresIn {value:?}: {e}")))
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    async fn initialize(&self) -> Result<()> {
        let (state, result) = match self.restore().await {
            Ok(Some(identity)) => (AuthState::SignedIn(identity), Ok(())),
            Ok(None) => (AuthState::SignedOut, Ok(())),
            Err(err) => {
                warn!(error = %err, "could not restore session, starting signed out");
                (AuthState::SignedOut, Err(err))
            }
        };
        self.state.send_replace(state);
        result
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let response = self.request_sign_up(email, password).await?;
        self.complete_sign_in(response, SignInMethod::Password)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let response = self.request_sign_in(email, password).await?;
        self.complete_sign_in(response, SignInMethod::Password)
    }

    async fn sign_in_with_google(&self, credential: &GoogleCredential) -> Result<Identity> {
        let response = self.request_idp_sign_in(credential).await?;
        self.complete_sign_in(response, SignInMethod::Google)
    }

    async fn sign_out(&self) -> Result<()> {
        let uid = self.tokens.identity().map(|identity| identity.uid);
        self.tokens.clear();
        let removal = match &self.persistence {
            Some(persistence) => persistence.clear(),
            None => Ok(()),
        };
        info!(uid = ?uid, "signed out");
        self.state.send_replace(AuthState::SignedOut);
        removal.map_err(FirebaseError::from)
    }

    fn current_identity(&self) -> Option<Identity> {
        self.tokens.identity()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

#[async_trait]
impl TokenSource for FirebaseAuth {
    async fn id_token(&self) -> Result<Option<String>> {
        let Some(data) = self.tokens.token_data() else {
            return Ok(None);
        };
        if !self.tokens.needs_refresh(Duration::seconds(REFRESH_SKEW_SECONDS)) {
            return Ok(Some(data.id_token));
        }

        debug!(uid = %data.identity.uid, "refreshing id token");
        match self.exchange_refresh_token(&data.refresh_token).await {
            Ok(response) => {
                let expires_seconds = parse_expires_in(&response.expires_in)?;
                self.tokens.update_tokens(
                    response.id_token.clone(),
                    response.refresh_token.clone(),
                    expires_seconds,
                );
                self.persist(&response.refresh_token, &data.identity);
                Ok(Some(response.id_token))
            }
            Err(err) if err.is_auth_error() => {
                warn!(uid = %data.identity.uid, error = %err, "token refresh rejected, signing out");
                self.forget_session();
                self.state.send_replace(AuthState::SignedOut);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::PathBuf;

    use uuid::Uuid;
    use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::{BaseUrls, ClientConfig};

    fn temp_dir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("firetodo-test-{}", Uuid::new_v4()));
        path
    }

    fn client_for(server: &MockServer) -> FirebaseClient {
        FirebaseClient::with_config_and_base_urls(
            ClientConfig::default(),
            "test-key",
            "demo-project",
            &BaseUrls::single(&server.uri()),
        )
        .unwrap()
    }

    fn sign_in_body(uid: &str, email: &str) -> serde_json::Value {
        serde_json::json!({
            "idToken": "id-token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600",
            "localId": uid,
            "email": email,
            "registered": true,
        })
    }

    #[tokio::test]
    async fn test_sign_in_happy_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .and(body_json(serde_json::json!({
                "email": "a@example.com",
                "password": "secret1",
                "returnSecureToken": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sign_in_body("uid-a", "a@example.com")))
            .expect(1)
            .mount(&server)
            .await;

        let auth = FirebaseAuth::new(client_for(&server));
        let rx = auth.subscribe();

        let identity = auth.sign_in("a@example.com", "secret1").await.unwrap();
        assert_eq!(identity.uid, "uid-a");
        assert_eq!(identity.email.as_deref(), Some("a@example.com"));
        assert_eq!(*rx.borrow(), AuthState::SignedIn(identity.clone()));
        assert_eq!(auth.id_token().await.unwrap(), Some("id-token-1".to_string()));
    }

    #[tokio::test]
    async fn test_sign_up_maps_rest_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signUp"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "EMAIL_EXISTS", "errors": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = FirebaseAuth::new(client_for(&server));
        let err = auth.sign_up("a@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/email-already-in-use"));
        assert_eq!(*auth.subscribe().borrow(), AuthState::Initializing);
    }

    #[tokio::test]
    async fn test_google_sign_in_posts_idp_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithIdp"))
            .and(body_string_contains("providerId=google.com"))
            .and(body_string_contains("id_token=google-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "idToken": "id-token-g",
                "refreshToken": "refresh-g",
                "expiresIn": "3600",
                "localId": "uid-g",
                "email": "g@example.com",
                "displayName": "Grace",
                "providerId": "google.com",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = FirebaseAuth::new(client_for(&server));
        let identity = auth
            .sign_in_with_google(&GoogleCredential::IdToken("google-token".to_string()))
            .await
            .unwrap();
        assert_eq!(identity.sign_in_method, SignInMethod::Google);
        assert_eq!(identity.label(), "Grace");
    }

    #[tokio::test]
    async fn test_initialize_restores_persisted_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=stored-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "expires_in": "3600",
                "token_type": "Bearer",
                "refresh_token": "rotated-refresh",
                "id_token": "id-token-r",
                "user_id": "uid-a",
                "project_id": "demo-project",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let persistence = SessionPersistence::new(&dir);
        let identity = Identity {
            uid: "uid-a".to_string(),
            email: Some("a@example.com".to_string()),
            display_name: None,
            sign_in_method: SignInMethod::Password,
        };
        persistence
            .save(&StoredSession {
                refresh_token: "stored-refresh".to_string(),
                identity: identity.clone(),
            })
            .unwrap();

        let auth = FirebaseAuth::with_persistence(client_for(&server), persistence.clone());
        auth.initialize().await.unwrap();

        assert_eq!(*auth.subscribe().borrow(), AuthState::SignedIn(identity));
        assert_eq!(auth.id_token().await.unwrap(), Some("id-token-r".to_string()));
        assert_eq!(
            persistence.load().map(|s| s.refresh_token),
            Some("rotated-refresh".to_string())
        );

        auth.sign_out().await.unwrap();
        assert!(persistence.load().is_none());
        assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_initialize_drops_rejected_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "TOKEN_EXPIRED", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let persistence = SessionPersistence::new(&dir);
        persistence
            .save(&StoredSession {
                refresh_token: "stale".to_string(),
                identity: Identity {
                    uid: "uid-a".to_string(),
                    email: None,
                    display_name: None,
                    sign_in_method: SignInMethod::Password,
                },
            })
            .unwrap();

        let auth = FirebaseAuth::with_persistence(client_for(&server), persistence.clone());
        auth.initialize().await.unwrap();

        assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);
        assert!(persistence.load().is_none());

        fs::remove_dir_all(dir).unwrap();
    }

    fn unavailable() -> ResponseTemplate {
        ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": {"code": 503, "message": "The service is currently unavailable.", "status": "UNAVAILABLE"}
        }))
    }

    fn stored_identity() -> Identity {
        Identity {
            uid: "uid-a".to_string(),
            email: None,
            display_name: None,
            sign_in_method: SignInMethod::Password,
        }
    }

    #[tokio::test]
    async fn test_sign_in_outage_is_not_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(unavailable())
            .expect(1)
            .mount(&server)
            .await;

        let auth = FirebaseAuth::new(client_for(&server));
        let err = auth.sign_in("a@example.com", "secret1").await.unwrap_err();
        assert!(!err.is_auth_error());
        assert!(matches!(err, FirebaseError::Api { code: 503, .. }));
    }

    #[tokio::test]
    async fn test_refresh_outage_keeps_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "idToken": "id-token-1",
                "refreshToken": "refresh-1",
                "expiresIn": "30",
                "localId": "uid-a",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .respond_with(unavailable())
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let persistence = SessionPersistence::new(&dir);
        let auth = FirebaseAuth::with_persistence(client_for(&server), persistence.clone());
        let identity = auth.sign_in("a@example.com", "secret1").await.unwrap();

        let err = auth.id_token().await.unwrap_err();
        assert!(!err.is_auth_error());
        assert_eq!(*auth.subscribe().borrow(), AuthState::SignedIn(identity.clone()));
        assert_eq!(auth.current_identity(), Some(identity));
        assert_eq!(
            persistence.load().map(|s| s.refresh_token),
            Some("refresh-1".to_string())
        );

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_restore_outage_keeps_session_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .respond_with(unavailable())
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let persistence = SessionPersistence::new(&dir);
        persistence
            .save(&StoredSession {
                refresh_token: "stored-refresh".to_string(),
                identity: stored_identity(),
            })
            .unwrap();

        let auth = FirebaseAuth::with_persistence(client_for(&server), persistence.clone());
        let err = auth.initialize().await.unwrap_err();

        assert!(!err.is_auth_error());
        assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);
        assert_eq!(
            persistence.load().map(|s| s.refresh_token),
            Some("stored-refresh".to_string())
        );

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_initialize_without_persistence_is_signed_out() {
        let server = MockServer::start().await;
        let auth = FirebaseAuth::new(client_for(&server));
        auth.initialize().await.unwrap();
        assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);
        assert_eq!(auth.id_token().await.unwrap(), None);
    }
}
