/*
[INPUT]:  Firebase HTTP client, token source, plain JSON documents
[OUTPUT]: Firestore REST calls (create, patch, delete, runQuery)
[POS]:    Store layer - Firestore implementation of DocumentStore
[UPDATE]: When Firestore endpoints or query shapes change
*/

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::auth::TokenSource;
use crate::http::{FirebaseClient, FirebaseError, Result};
use crate::types::{Document, DocumentWrite, FirestoreDocument, RunQueryRequest, RunQueryRow};

use super::DocumentStore;
use super::value::{decode_fields, encode_fields, encode_value};

/// Firestore REST document store for the project's default database
pub struct FirestoreStore {
    client: FirebaseClient,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("project_id", &self.client.project_id())
            .finish_non_exhaustive()
    }
}

impl FirestoreStore {
    pub fn new(client: FirebaseClient, tokens: Arc<dyn TokenSource>) -> Self {
        Self { client, tokens }
    }

    /// Request builder with the bearer token of the signed-in user, if any
    async fn request(&self, method: Method, suffix: &str) -> Result<RequestBuilder> {
        let builder = self.client.firestore_request(method, suffix)?;
        Ok(match self.tokens.id_token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    fn decode_document(doc: FirestoreDocument) -> Result<Document> {
        Ok(Document {
            id: doc.id().to_string(),
            fields: decode_fields(&doc.fields)?,
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    /// POST /v1/projects/{p}/databases/(default)/documents/{collection}
    async fn add_document(&self, collection: &str, fields: Map<String, Value>) -> Result<String> {
        let body = DocumentWrite {
            fields: encode_fields(&fields),
        };
        let builder = self
            .request(Method::POST, &format!("/{collection}"))
            .await?
            .json(&body);
        let created: FirestoreDocument = self.client.send_json(builder).await?;
        debug!(collection, id = created.id(), "document created");
        Ok(created.id().to_string())
    }

    /// PATCH .../documents/{collection}/{id}?updateMask.fieldPaths=...&currentDocument.exists=true
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        // Without a mask Firestore replaces the whole document
        if fields.is_empty() {
            return Err(FirebaseError::InvalidRequest(format!(
                "update of {collection}/{id} has no fields"
            )));
        }
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let body = DocumentWrite {
            fields: encode_fields(&fields),
        };
        let builder = self
            .request(Method::PATCH, &format!("/{collection}/{id}"))
            .await?
            .query(&query)
            .json(&body);
        let _: FirestoreDocument = self.client.send_json(builder).await?;
        debug!(collection, id, "document updated");
        Ok(())
    }

    /// DELETE .../documents/{collection}/{id}
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let builder = self
            .request(Method::DELETE, &format!("/{collection}/{id}"))
            .await?;
        let _: Value = self.client.send_json(builder).await?;
        debug!(collection, id, "document deleted");
        Ok(())
    }

    /// POST .../documents:runQuery
    async fn query_equal(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        let body = RunQueryRequest::field_equals(collection, field, encode_value(value));
        let builder = self
            .request(Method::POST, ":runQuery")
            .await?
            .json(&body);
        let rows: Vec<RunQueryRow> = self.client.send_json(builder).await?;

        let mut documents = Vec::with_capacity(rows.len());
        for doc in rows.into_iter().filter_map(|row| row.document) {
            let name = doc.name.clone();
            match Self::decode_document(doc) {
                Ok(document) => documents.push(document),
                Err(err) => warn!(document = %name, error = %err, "skipping undecodable document"),
            }
        }
        debug!(collection, field, count = documents.len(), "query completed");
        Ok(documents)
    }
}
