/*
[INPUT]:  Decoded API payloads
[OUTPUT]: Domain-neutral models shared by adapters and consumers
[POS]:    Data layer - identities, auth state and plain documents
[UPDATE]: When API schema changes or new types added
*/

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::SignInMethod;
use crate::http::Result;

/// Authenticated user handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub sign_in_method: SignInMethod,
}

impl Identity {
    /// Name suitable for display: display name, then email, then uid
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Value carried by auth-state notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Initial state has not been resolved yet
    Initializing,
    SignedIn(Identity),
    SignedOut,
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Initializing)
    }
}

/// Stored document: store-assigned id plus plain JSON fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decode into a typed record; the id is exposed as field `id`
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}
