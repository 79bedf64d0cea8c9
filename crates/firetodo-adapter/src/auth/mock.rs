/*
[INPUT]:  Registered accounts, Google tokens and forced failures
[OUTPUT]: AuthProvider double publishing auth-state notifications
[POS]:    Auth layer - test double for AuthProvider
[UPDATE]: When AuthProvider gains operations or error codes
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::http::{FirebaseError, Result};
use crate::types::{AuthState, Identity, SignInMethod};

use super::provider::{AuthProvider, GoogleCredential};

#[derive(Debug, Clone)]
struct MockAccount {
    password: String,
    uid: String,
    disabled: bool,
}

/// In-memory auth provider for testing
#[derive(Debug)]
pub struct MockAuthProvider {
    accounts: Mutex<HashMap<String, MockAccount>>,
    google_accounts: Mutex<HashMap<String, Identity>>,
    restored: Mutex<Option<Identity>>,
    forced_error: Mutex<Option<String>>,
    current: Mutex<Option<Identity>>,
    state: watch::Sender<AuthState>,
    calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAuthProvider {
    /// Create a provider with no accounts, still `Initializing`
    pub fn new() -> Self {
        let (state, _rx) = watch::channel(AuthState::Initializing);
        Self {
            accounts: Mutex::new(HashMap::new()),
            google_accounts: Mutex::new(HashMap::new()),
            restored: Mutex::new(None),
            forced_error: Mutex::new(None),
            current: Mutex::new(None),
            state,
            calls: AtomicUsize::new(0),
        }
    }

    /// Register an email/password account
    pub fn with_account(self, email: &str, password: &str, uid: &str) -> Self {
        lock(&self.accounts).insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                uid: uid.to_string(),
                disabled: false,
            },
        );
        self
    }

    /// Register a disabled email/password account
    pub fn with_disabled_account(self, email: &str, password: &str, uid: &str) -> Self {
        lock(&self.accounts).insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                uid: uid.to_string(),
                disabled: true,
            },
        );
        self
    }

    /// Accept `token` as a Google credential for `identity`
    pub fn with_google_account(self, token: &str, identity: Identity) -> Self {
        lock(&self.google_accounts).insert(token.to_string(), identity);
        self
    }

    /// Identity resolved by `initialize`, as if restored from a previous run
    pub fn with_restored(self, identity: Identity) -> Self {
        *lock(&self.restored) = Some(identity);
        self
    }

    /// Fail the next auth call with `code`
    pub fn fail_next(&self, code: &str) {
        *lock(&self.forced_error) = Some(code.to_string());
    }

    /// Publish an arbitrary notification, as the service would on its own
    pub fn notify(&self, state: AuthState) {
        *lock(&self.current) = state.identity().cloned();
        self.state.send_replace(state);
    }

    /// Number of credential calls (sign-up, sign-in, Google sign-in) made
    pub fn auth_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn take_forced_error(&self) -> Option<FirebaseError> {
        lock(&self.forced_error)
            .take()
            .map(|code| FirebaseError::auth(code.clone(), code))
    }

    fn complete(&self, identity: Identity) -> Identity {
        self.notify(AuthState::SignedIn(identity.clone()));
        identity
    }
}

impl Default for MockAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn password_identity(email: &str, uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: None,
        sign_in_method: SignInMethod::Password,
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn initialize(&self) -> Result<()> {
        let state = match lock(&self.restored).clone() {
            Some(identity) => AuthState::SignedIn(identity),
            None => AuthState::SignedOut,
        };
        self.notify(state);
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_forced_error() {
            return Err(err);
        }
        if !email.contains('@') {
            return Err(FirebaseError::auth("auth/invalid-email", "INVALID_EMAIL"));
        }
        if password.len() < 6 {
            return Err(FirebaseError::auth("auth/weak-password", "WEAK_PASSWORD"));
        }

        let uid = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(email) {
                return Err(FirebaseError::auth(
                    "auth/email-already-in-use",
                    "EMAIL_EXISTS",
                ));
            }
            let uid = format!("uid-{}", Uuid::new_v4().simple());
            accounts.insert(
                email.to_string(),
                MockAccount {
                    password: password.to_string(),
                    uid: uid.clone(),
                    disabled: false,
                },
            );
            uid
        };

        Ok(self.complete(password_identity(email, &uid)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_forced_error() {
            return Err(err);
        }

        let account = lock(&self.accounts).get(email).cloned();
        let account = match account {
            Some(account) => account,
            None => return Err(FirebaseError::auth("auth/user-not-found", "EMAIL_NOT_FOUND")),
        };
        if account.disabled {
            return Err(FirebaseError::auth("auth/user-disabled", "USER_DISABLED"));
        }
        if account.password != password {
            return Err(FirebaseError::auth("auth/wrong-password", "INVALID_PASSWORD"));
        }

        Ok(self.complete(password_identity(email, &account.uid)))
    }

    async fn sign_in_with_google(&self, credential: &GoogleCredential) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_forced_error() {
            return Err(err);
        }

        let identity = lock(&self.google_accounts).get(credential.token()).cloned();
        match identity {
            Some(identity) => Ok(self.complete(identity)),
            None => Err(FirebaseError::auth(
                "auth/invalid-credential",
                "INVALID_IDP_RESPONSE",
            )),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.notify(AuthState::SignedOut);
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        lock(&self.current).clone()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_sign_in_publishes_state() {
        let provider = MockAuthProvider::new().with_account("a@example.com", "secret1", "uid-a");
        let rx = provider.subscribe();

        let identity = provider.sign_in("a@example.com", "secret1").await.unwrap();
        assert_eq!(identity.uid, "uid-a");
        assert_eq!(*rx.borrow(), AuthState::SignedIn(identity.clone()));
        assert_eq!(provider.current_identity(), Some(identity));
    }

    #[tokio::test]
    async fn test_mock_error_codes() {
        let provider = MockAuthProvider::new()
            .with_account("a@example.com", "secret1", "uid-a")
            .with_disabled_account("d@example.com", "secret1", "uid-d");

        let err = provider.sign_in("a@example.com", "nope").await.unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/wrong-password"));

        let err = provider.sign_in("b@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/user-not-found"));

        let err = provider.sign_in("d@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/user-disabled"));

        let err = provider.sign_up("a@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/email-already-in-use"));

        let err = provider.sign_up("c@example.com", "123").await.unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/weak-password"));

        provider.fail_next("auth/foo");
        let err = provider.sign_in("a@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/foo"));

        assert_eq!(provider.auth_calls(), 6);
        assert_eq!(*provider.subscribe().borrow(), AuthState::Initializing);
    }

    #[tokio::test]
    async fn test_mock_initialize_resolves() {
        let provider = MockAuthProvider::new();
        provider.initialize().await.unwrap();
        assert_eq!(*provider.subscribe().borrow(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_mock_google_account() {
        let identity = Identity {
            uid: "uid-g".to_string(),
            email: Some("g@example.com".to_string()),
            display_name: Some("Grace".to_string()),
            sign_in_method: SignInMethod::Google,
        };
        let provider = MockAuthProvider::new().with_google_account("google-token", identity.clone());

        let signed_in = provider
            .sign_in_with_google(&GoogleCredential::IdToken("google-token".to_string()))
            .await
            .unwrap();
        assert_eq!(signed_in, identity);
        assert_eq!(provider.auth_calls(), 1);

        let err = provider
            .sign_in_with_google(&GoogleCredential::AccessToken("other".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.auth_code(), Some("auth/invalid-credential"));
    }
}
