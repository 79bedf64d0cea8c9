/*
[INPUT]:  Optional YAML configuration file, FIRETODO_* environment variables
[OUTPUT]: Validated application configuration
[POS]:    Configuration layer - backend project setup
[UPDATE]: When adding new configuration options
*/

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File, FileFormat};
use firetodo_adapter::{BaseUrls, SessionPersistence};
use url::Url;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "FIRETODO";

/// Firebase project settings plus local overrides
///
/// Required keys are kept optional here so `validate` can report every
/// missing one at once instead of failing on the first.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub auth_domain: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    #[serde(default)]
    pub messaging_sender_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub measurement_id: Option<String>,
    #[serde(default)]
    pub database_url: Option<String>,

    /// Endpoint overrides (emulator suite, tests)
    #[serde(default)]
    pub identity_toolkit_url: Option<String>,
    #[serde(default)]
    pub secure_token_url: Option<String>,
    #[serde(default)]
    pub firestore_url: Option<String>,

    /// Collection holding task documents
    #[serde(default = "default_tasks_collection")]
    pub tasks_collection: String,
    /// Directory for the persisted sign-in; platform data dir when unset
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
    #[serde(default = "default_persist_session")]
    pub persist_session: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            auth_domain: None,
            project_id: None,
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
            measurement_id: None,
            database_url: None,
            identity_toolkit_url: None,
            secure_token_url: None,
            firestore_url: None,
            tasks_collection: default_tasks_collection(),
            session_dir: None,
            persist_session: default_persist_session(),
        }
    }
}

fn default_tasks_collection() -> String {
    "tasks".to_string()
}

fn default_persist_session() -> bool {
    true
}

impl AppConfig {
    /// Load from an optional YAML file overlaid by `FIRETODO_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as `load`, reading variables from `env` instead of the process
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX).source(env),
        );

        let config = builder.build().context("read configuration")?;
        config
            .try_deserialize()
            .context("parse configuration")
    }

    /// Reject missing required keys and unparsable endpoint overrides
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("api_key", &self.api_key),
            ("auth_domain", &self.auth_domain),
            ("project_id", &self.project_id),
            ("storage_bucket", &self.storage_bucket),
            ("messaging_sender_id", &self.messaging_sender_id),
            ("app_id", &self.app_id),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            bail!(
                "missing required configuration: {} (set them in the config file or as {}_<KEY>)",
                missing.join(", "),
                ENV_PREFIX
            );
        }

        let overrides = [
            ("identity_toolkit_url", &self.identity_toolkit_url),
            ("secure_token_url", &self.secure_token_url),
            ("firestore_url", &self.firestore_url),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                Url::parse(value).with_context(|| format!("invalid {key}: {value}"))?;
            }
        }

        if self.tasks_collection.trim().is_empty() {
            bail!("tasks_collection must not be empty");
        }
        Ok(())
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    pub fn project_id(&self) -> &str {
        self.project_id.as_deref().unwrap_or_default()
    }

    /// REST endpoints with overrides applied
    pub fn base_urls(&self) -> BaseUrls {
        let defaults = BaseUrls::default();
        BaseUrls {
            identity_toolkit: self
                .identity_toolkit_url
                .clone()
                .unwrap_or(defaults.identity_toolkit),
            secure_token: self.secure_token_url.clone().unwrap_or(defaults.secure_token),
            firestore: self.firestore_url.clone().unwrap_or(defaults.firestore),
        }
    }

    /// Where to keep the signed-in session, `None` when persistence is off
    pub fn session_persistence(&self) -> Option<SessionPersistence> {
        if !self.persist_session {
            return None;
        }
        self.session_dir
            .clone()
            .or_else(SessionPersistence::default_dir)
            .map(SessionPersistence::new)
    }
}
