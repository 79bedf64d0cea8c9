/*
[INPUT]:  ID tokens, refresh tokens and expiration timestamps
[OUTPUT]: Token retrieval, refresh-due status and the signed-in identity
[POS]:    Auth layer - token lifecycle management
[UPDATE]: When changing refresh policy or storage strategy
*/

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};

use crate::types::Identity;

/// Stored token data with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

/// Thread-safe token manager for the signed-in user
#[derive(Debug, Clone)]
pub struct TokenManager {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenManager {
    /// Create a new empty token manager
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(None)),
        }
    }

    /// Store tokens for a freshly signed-in identity
    pub fn set_tokens(
        &self,
        identity: Identity,
        id_token: String,
        refresh_token: String,
        expires_seconds: i64,
    ) {
        let token_data = TokenData {
            id_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_seconds),
            identity,
        };

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token_data);
    }

    /// Replace tokens after a refresh; no-op when signed out meanwhile
    pub fn update_tokens(&self, id_token: String, refresh_token: String, expires_seconds: i64) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(data) = guard.as_mut() {
            data.id_token = id_token;
            data.refresh_token = refresh_token;
            data.expires_at = Utc::now() + Duration::seconds(expires_seconds);
        }
    }

    /// Get the current ID token if available
    pub fn id_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|data| data.id_token.clone())
    }

    /// Get the signed-in identity if available
    pub fn identity(&self) -> Option<Identity> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|data| data.identity.clone())
    }

    /// True when the token expires within `skew` (or there is no token)
    pub fn needs_refresh(&self, skew: Duration) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(data) => Utc::now() + skew >= data.expires_at,
            None => true,
        }
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Clear the stored tokens
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new()
    }
}
