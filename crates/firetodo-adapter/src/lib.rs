/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Firebase adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod store;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    AuthProvider,
    FirebaseAuth,
    GoogleCredential,
    SessionPersistence,
    TokenManager,
    TokenSource,
};

// Re-export commonly used types from http
pub use http::{
    BaseUrls,
    ClientConfig,
    FirebaseClient,
    FirebaseError,
    Result,
};

// Re-export commonly used types from store
pub use store::{
    DocumentStore,
    FirestoreStore,
};

// In-memory doubles for downstream tests
#[cfg(any(test, feature = "testing"))]
pub use auth::MockAuthProvider;
#[cfg(any(test, feature = "testing"))]
pub use store::MemoryDocumentStore;

// Re-export all types
pub use types::*;
