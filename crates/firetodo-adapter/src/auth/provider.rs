/*
[INPUT]:  Credentials (email/password, Google token) and sign-out requests
[OUTPUT]: Identities and auth-state notifications on a watch channel
[POS]:    Auth layer - auth service abstraction
[UPDATE]: When adding sign-in methods or changing notification semantics
*/

use async_trait::async_trait;
use tokio::sync::watch;

use crate::http::Result;
use crate::types::{AuthState, Identity};

/// Credential obtained by the front end from Google
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleCredential {
    IdToken(String),
    AccessToken(String),
}

impl GoogleCredential {
    pub fn token(&self) -> &str {
        match self {
            GoogleCredential::IdToken(token) | GoogleCredential::AccessToken(token) => token,
        }
    }
}

/// Trait for auth service operations
///
/// Every successful sign-in publishes `AuthState::SignedIn` and every
/// sign-out publishes `AuthState::SignedOut` to `subscribe()` receivers.
/// Subscribers should treat the channel as the source of truth.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the initial auth state (restore a previous sign-in if any).
    ///
    /// After this returns the channel holds a resolved state, even on error.
    async fn initialize(&self) -> Result<()>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_in_with_google(&self, credential: &GoogleCredential) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()>;

    /// Identity as currently known to the provider
    fn current_identity(&self) -> Option<Identity>;

    /// Subscribe to auth-state notifications
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// Source of bearer tokens for authorized requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// ID token of the signed-in user, `None` when signed out
    async fn id_token(&self) -> Result<Option<String>>;
}
