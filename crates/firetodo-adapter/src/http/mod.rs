/*
[INPUT]:  HTTP client configuration and Firebase REST endpoints
[OUTPUT]: HTTP responses decoded into typed results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;

pub use error::{FirebaseError, Result};

pub use client::{BaseUrls, ClientConfig, FirebaseClient};
