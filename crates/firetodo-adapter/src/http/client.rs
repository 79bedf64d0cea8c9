/*
[INPUT]:  HTTP configuration (base URLs, timeouts, API key, project id)
[OUTPUT]: Configured reqwest client ready for Identity Toolkit and Firestore calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::http::{FirebaseError, Result};
use crate::types::ErrorEnvelope;

/// Base URLs for the Firebase REST APIs
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com";
const FIRESTORE_URL: &str = "https://firestore.googleapis.com";

/// HTTP client configuration
///
/// `timeout` is unset by default: a dispatched call runs until the server
/// answers or the connection drops.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// REST endpoints, overridable for emulators and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    pub identity_toolkit: String,
    pub secure_token: String,
    pub firestore: String,
}

impl BaseUrls {
    /// Point every API at the same host (wiremock, emulator suite)
    pub fn single(base: &str) -> Self {
        Self {
            identity_toolkit: base.to_string(),
            secure_token: base.to_string(),
            firestore: base.to_string(),
        }
    }
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            identity_toolkit: IDENTITY_TOOLKIT_URL.to_string(),
            secure_token: SECURE_TOKEN_URL.to_string(),
            firestore: FIRESTORE_URL.to_string(),
        }
    }
}

/// Shared HTTP client for the Firebase project
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    http_client: Client,
    api_key: String,
    project_id: String,
    identity_base_url: Url,
    secure_token_base_url: Url,
    firestore_base_url: Url,
}

impl FirebaseClient {
    /// Create a new client with default configuration
    pub fn new(api_key: &str, project_id: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), api_key, project_id)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, api_key: &str, project_id: &str) -> Result<Self> {
        Self::with_config_and_base_urls(config, api_key, project_id, &BaseUrls::default())
    }

    /// Create a new client with custom configuration and endpoints
    pub fn with_config_and_base_urls(
        config: ClientConfig,
        api_key: &str,
        project_id: &str,
        base_urls: &BaseUrls,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(FirebaseError::Config("api key is empty".to_string()));
        }
        if project_id.trim().is_empty() {
            return Err(FirebaseError::Config("project id is empty".to_string()));
        }

        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            project_id: project_id.to_string(),
            identity_base_url: Url::parse(&base_urls.identity_toolkit)?,
            secure_token_base_url: Url::parse(&base_urls.secure_token)?,
            firestore_base_url: Url::parse(&base_urls.firestore)?,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Path of the default database's document root
    pub fn documents_path(&self) -> String {
        format!("/v1/projects/{}/databases/(default)/documents", self.project_id)
    }

    /// Build request builder for Identity Toolkit endpoints (`?key=` appended)
    pub(crate) fn identity_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let mut url = self.identity_base_url.join(endpoint)?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder for Secure Token endpoints (`?key=` appended)
    pub(crate) fn secure_token_request(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<RequestBuilder> {
        let mut url = self.secure_token_base_url.join(endpoint)?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder for a path below the document root
    ///
    /// `suffix` is appended verbatim: `/tasks`, `/tasks/abc`, `:runQuery`.
    pub(crate) fn firestore_request(&self, method: Method, suffix: &str) -> Result<RequestBuilder> {
        let endpoint = format!("{}{}", self.documents_path(), suffix);
        let url = self.firestore_base_url.join(&endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode the JSON body, mapping error envelopes
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, path = %path, "request rejected");
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => envelope.error.message,
                Err(_) if body.trim().is_empty() => status.to_string(),
                Err(_) => body,
            };
            return Err(FirebaseError::api_error(status, message));
        }

        debug!(status = %status, path = %path, "request completed");
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}
