/*
[INPUT]:  Collection names, document ids and plain JSON fields
[OUTPUT]: Stored documents and store-assigned ids
[POS]:    Store layer - document store abstraction and implementations
[UPDATE]: When adding store operations or backends
*/

pub mod firestore;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod value;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::http::Result;
use crate::types::Document;

pub use firestore::FirestoreStore;
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryDocumentStore;

/// Trait for remote document store operations
///
/// Each method performs exactly one remote call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, returning its store-assigned id
    async fn add_document(&self, collection: &str, fields: Map<String, Value>) -> Result<String>;

    /// Overwrite only the given fields of an existing document
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;

    /// All documents of `collection` whose `field` equals `value`
    async fn query_equal(&self, collection: &str, field: &str, value: &Value)
    -> Result<Vec<Document>>;
}
