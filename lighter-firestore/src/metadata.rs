//! Project lookup through the instance metadata service.
//!
//! Code running on Google Cloud can ask the metadata server which project it belongs to. The
//! host is `metadata.google.internal` unless `GCE_METADATA_HOST` names another one, which is how
//! emulators and tests redirect the lookup.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use lighter_core::{
    config::ProjectMetadata,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Environment variable overriding the metadata host.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

/// Metadata host used when [`METADATA_HOST_ENV`] is unset.
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// User agent sent with metadata requests.
pub const DEFAULT_USER_AGENT: &str = "lighter";

const PROJECT_ID_PATH: &str = "/computeMetadata/v1/project/project-id";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the metadata server.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: Client,
    host: String,
}

impl MetadataClient {
    /// Creates a client for `host`, given as `name` or `name:port`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if the HTTP client cannot be built.
    pub fn new(host: impl Into<String>) -> DocumentStoreResult<Self> {
        let http = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(DEFAULT_TIMEOUT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        Ok(Self { http, host: host.into() })
    }

    /// Creates a client for the host named by [`METADATA_HOST_ENV`], or the default host.
    pub fn from_env() -> DocumentStoreResult<Self> {
        Self::new(metadata_host(|key| std::env::var(key).ok()))
    }

    /// Returns the URL of the project ID endpoint.
    pub fn project_id_url(&self) -> String {
        format!("http://{}{}", self.host.trim_end_matches('/'), PROJECT_ID_PATH)
    }
}

#[async_trait]
impl ProjectMetadata for MetadataClient {
    async fn project_id(&self) -> DocumentStoreResult<String> {
        let url = self.project_id_url();
        debug!("Requesting project id from {url}");

        let project_id = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| DocumentStoreError::Initialization(format!("metadata request to {url} failed: {e}")))?
            .text()
            .await
            .map_err(|e| DocumentStoreError::Initialization(format!("metadata response from {url} unreadable: {e}")))?;

        Ok(project_id.trim().to_string())
    }
}

fn metadata_host<F>(env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env(METADATA_HOST_ENV)
        .map(|host| host.trim().to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string())
}
