/*
[INPUT]:  Plain JSON documents
[OUTPUT]: In-process document storage with call counters and failure injection
[POS]:    Store layer - test double for DocumentStore
[UPDATE]: When DocumentStore gains operations
*/

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::http::{FirebaseError, Result};
use crate::types::Document;

use super::DocumentStore;

type Collection = BTreeMap<String, Map<String, Value>>;

/// In-memory document store for testing
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Collection>>,
    writes: AtomicUsize,
    queries: AtomicUsize,
    fail_writes: AtomicBool,
    fail_queries: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write calls received (including failed ones)
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of query calls received (including failed ones)
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail with a 503
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent queries fail with a 503
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Insert a document directly, bypassing counters
    pub async fn seed(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Snapshot of a stored document
    pub async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let collections = self.collections.lock().await;
        collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            })
    }

    fn begin_write(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn unavailable() -> FirebaseError {
    FirebaseError::api_error(StatusCode::SERVICE_UNAVAILABLE, "The service is currently unavailable.")
}

fn not_found(collection: &str, id: &str) -> FirebaseError {
    FirebaseError::api_error(
        StatusCode::NOT_FOUND,
        format!("No document to update: {collection}/{id}"),
    )
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add_document(&self, collection: &str, fields: Map<String, Value>) -> Result<String> {
        self.begin_write()?;
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        self.begin_write()?;
        if fields.is_empty() {
            return Err(FirebaseError::InvalidRequest(format!(
                "update of {collection}/{id} has no fields"
            )));
        }
        let mut collections = self.collections.lock().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.begin_write()?;
        if let Some(docs) = self.collections.lock().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query_equal(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let collections = self.collections.lock().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, fields)| fields.get(field) == Some(value))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }
}
