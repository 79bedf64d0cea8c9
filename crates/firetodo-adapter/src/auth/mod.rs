/*
[INPUT]:  Firebase client, credentials and persisted sessions
[OUTPUT]: Identities, ID tokens, auth-state notifications and auth errors
[POS]:    Auth layer - handles Firebase authentication
[UPDATE]: When auth flow or sign-in methods change
*/

pub mod codes;
pub mod firebase;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod provider;
pub mod session_file;
pub mod token;

pub use codes::auth_code_for;
pub use firebase::FirebaseAuth;
#[cfg(any(test, feature = "testing"))]
pub use mock::MockAuthProvider;
pub use provider::{AuthProvider, GoogleCredential, TokenSource};
pub use session_file::{SessionPersistence, StoredSession};
pub use token::{TokenData, TokenManager};
