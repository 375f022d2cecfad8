//! Client configuration and project discovery.
//!
//! A [`ClientConfig`] carries everything a remote backend needs to open its connection: the
//! project, an optional region, an optional service-account credentials file and an optional
//! per-operation timeout. Configs are either spelled out with [`ClientConfig::new`] and the
//! `with_*` setters, or discovered from the environment with [`ClientConfig::discover`].
//!
//! # Project discovery
//!
//! [`discover_project`] checks [`PROJECT_ENV_KEYS`] in order and falls back to the instance
//! metadata service through a [`ProjectMetadata`] implementation.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use log::debug;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Environment variables that may name the project, in lookup order.
///
/// Values are trimmed, and a variable that is blank after trimming counts as unset, so lookup
/// moves on to the next one.
pub const PROJECT_ENV_KEYS: [&str; 6] = [
    "GCP_PROJECT",
    "PROJECT",
    "PROJECT_ID",
    "GOOGLE_CLOUD_PROJECT",
    "GCLOUD_PROJECT",
    "CLOUDSDK_CORE_PROJECT",
];

/// Environment variable naming a credentials file when none is configured.
pub const CREDENTIALS_ENV_KEY: &str = "FS_CLIENT_IDENTITY";

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-central1";

/// Source of the project ID when the environment does not name one.
#[async_trait]
pub trait ProjectMetadata: Send + Sync {
    async fn project_id(&self) -> DocumentStoreResult<String>;
}

/// Connection settings for a remote document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// The project owning the database.
    pub project_id: String,
    /// The region of the database; [`DEFAULT_REGION`] when unset.
    pub region: Option<String>,
    /// A service-account key file; ambient credentials are used when unset.
    pub credentials_file: Option<PathBuf>,
    /// Upper bound for each remote round-trip.
    pub operation_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a config for `project_id` with every optional setting unset.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: None,
            credentials_file: None,
            operation_timeout: None,
        }
    }

    /// Discovers the project from the process environment or `metadata`, and picks up a
    /// credentials file from [`CREDENTIALS_ENV_KEY`] if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if no project can be discovered.
    pub async fn discover<M>(metadata: &M) -> DocumentStoreResult<Self>
    where
        M: ProjectMetadata + ?Sized,
    {
        Self::discover_with(|key| std::env::var(key).ok(), metadata).await
    }

    /// Like [`discover`](ClientConfig::discover), reading variables through `env`.
    pub async fn discover_with<F, M>(env: F, metadata: &M) -> DocumentStoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
        M: ProjectMetadata + ?Sized,
    {
        let project_id = discover_project(&env, metadata).await?;
        let mut config = Self::new(project_id);

        if let Some(path) = env(CREDENTIALS_ENV_KEY).filter(|path| !path.trim().is_empty()) {
            debug!("Using credentials file from {CREDENTIALS_ENV_KEY}");
            config.credentials_file = Some(PathBuf::from(path.trim()));
        }

        Ok(config)
    }

    /// Sets the region of the database.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Uses the service-account key at `path` instead of ambient credentials.
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Bounds each remote round-trip by `timeout`.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Returns the configured region, or [`DEFAULT_REGION`].
    pub fn region(&self) -> &str {
        match self.region.as_deref() {
            Some(region) if !region.is_empty() => region,
            _ => DEFAULT_REGION,
        }
    }

    /// Returns `true` if no region is configured and [`region`](ClientConfig::region) falls back
    /// to [`DEFAULT_REGION`].
    pub fn uses_default_region(&self) -> bool {
        self.region.as_deref().is_none_or(str::is_empty)
    }

    /// Checks the config before a connection is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] for an empty project ID or a credentials
    /// file that does not exist or is a directory.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(DocumentStoreError::Initialization("project id required".to_string()));
        }

        if let Some(path) = &self.credentials_file {
            validate_credentials_file(path)?;
        }

        Ok(())
    }
}

/// Finds the project ID: the first of [`PROJECT_ENV_KEYS`] with a non-blank value, trimmed,
/// or else whatever `metadata` reports.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Initialization`] if the environment names no project and the
/// metadata lookup fails or returns a blank ID.
pub async fn discover_project<F, M>(env: F, metadata: &M) -> DocumentStoreResult<String>
where
    F: Fn(&str) -> Option<String>,
    M: ProjectMetadata + ?Sized,
{
    for key in PROJECT_ENV_KEYS {
        if let Some(value) = env(key) {
            let value = value.trim();

            if !value.is_empty() {
                debug!("Project id found in {key}");
                return Ok(value.to_string());
            }
        }
    }

    debug!("Project id not set in environment, asking the metadata service");

    let project_id = metadata
        .project_id()
        .await
        .map_err(|e| DocumentStoreError::Initialization(format!("unable to discover project id: {e}")))?;

    match project_id.trim() {
        "" => Err(DocumentStoreError::Initialization(
            "metadata service returned an empty project id".to_string(),
        )),
        trimmed => Ok(trimmed.to_string()),
    }
}

/// Checks that `path` names an existing regular file.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Initialization`] if it does not exist or is a directory.
pub fn validate_credentials_file(path: &Path) -> DocumentStoreResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if !meta.is_dir() => Ok(()),
        _ => Err(DocumentStoreError::Initialization(format!(
            "credential file does not exist: {}",
            path.display()
        ))),
    }
}
