use std::{fmt, time::Duration};

use async_trait::async_trait;
use bson::Document as BsonDocument;
use firestore::{FirestoreDb, FirestoreDbOptions};
use futures::{StreamExt, TryStreamExt};
use log::{debug, info};
use serde::Deserialize;

use lighter_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    config::{ClientConfig, ProjectMetadata},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{CriteriaVisitor, QueryCriteria},
};

use crate::{
    metadata::MetadataClient,
    query::{FirestoreFilterTranslator, direction, strip_metadata},
    value::FirestoreFields,
};

/// Name-only projection used when listing document IDs.
#[derive(Debug, Deserialize)]
struct DocumentKey {
    #[serde(rename = "_firestore_id")]
    id: String,
}

/// A [`StoreBackend`] over a Cloud Firestore database.
#[derive(Clone)]
pub struct FirestoreStore {
    db: FirestoreDb,
    config: ClientConfig,
}

impl FirestoreStore {
    /// Wraps an already connected database.
    pub fn new(db: FirestoreDb, config: ClientConfig) -> Self {
        Self { db, config }
    }

    /// Starts building a store from an explicit config.
    pub fn builder(config: ClientConfig) -> FirestoreStoreBuilder {
        FirestoreStoreBuilder::new(config)
    }

    /// Starts building a store whose config is discovered from the environment.
    pub fn discover() -> FirestoreStoreBuilder {
        FirestoreStoreBuilder::discover()
    }

    /// Returns the config this store was opened with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the underlying database handle.
    pub fn db(&self) -> &FirestoreDb {
        &self.db
    }
}

impl fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StoreBackend for FirestoreStore {
    async fn upsert_document(&self, collection: &str, id: &str, document: BsonDocument) -> DocumentStoreResult<()> {
        self.db
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&FirestoreFields(&document))
            .execute::<BsonDocument>()
            .await
            .map_err(|e| DocumentStoreError::remote_for("save", collection, id, e))?;

        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<BsonDocument>> {
        Ok(
            self.db
                .fluent()
                .select()
                .by_id_in(collection)
                .obj::<BsonDocument>()
                .one(id)
                .await
                .map_err(|e| DocumentStoreError::remote_for("get_by_id", collection, id, e))?
                .map(strip_metadata)
        )
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        self.db
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| DocumentStoreError::remote_for("delete_by_id", collection, id, e))
    }

    async fn list_document_ids(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.db
                .fluent()
                .select()
                .fields(["__name__"])
                .from(collection)
                .limit(u32::try_from(limit).unwrap_or(u32::MAX))
                .obj::<DocumentKey>()
                .query()
                .await
                .map_err(|e| DocumentStoreError::remote("delete_all", collection, e))?
                .into_iter()
                .map(|key| key.id)
                .collect()
        )
    }

    async fn delete_documents(&self, collection: &str, ids: Vec<String>) -> DocumentStoreResult<()> {
        let mut transaction = self
            .db
            .begin_transaction()
            .await
            .map_err(|e| DocumentStoreError::remote("delete_all", collection, e))?;

        for id in &ids {
            self.db
                .fluent()
                .delete()
                .from(collection)
                .document_id(id)
                .add_to_transaction(&mut transaction)
                .map_err(|e| DocumentStoreError::remote_for("delete_all", collection, id, e))?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| DocumentStoreError::remote("delete_all", collection, e))?;

        debug!("Committed deletion of {} documents from {collection}", ids.len());

        Ok(())
    }

    async fn run_query<'a>(&'a self, criteria: &'a QueryCriteria) -> DocumentStoreResult<DocumentStream<'a>> {
        let collection = criteria.collection.as_str();

        let mut query = self
            .db
            .fluent()
            .select()
            .from(collection)
            .filter(|builder| {
                FirestoreFilterTranslator::new(&builder)
                    .visit_criteria(&criteria.criteria)
                    .unwrap_or_else(|never| match never {})
            });

        if let Some(order) = &criteria.order_by {
            query = query.order_by([(order.property.as_str(), direction(order))]);
        }

        if let Some(limit) = criteria.limit {
            query = query.limit(u32::try_from(limit).unwrap_or(u32::MAX));
        }

        let results = query
            .obj::<BsonDocument>()
            .stream_query_with_errors()
            .await
            .map_err(|e| DocumentStoreError::remote("get_by_query", collection, e))?;

        Ok(
            results
                .map_ok(strip_metadata)
                .map_err(move |e| DocumentStoreError::remote("get_by_query", collection, e))
                .boxed()
        )
    }

    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        debug!("Releasing Firestore client for project {}", self.config.project_id);

        Ok(())
    }
}

/// Builder for [`FirestoreStore`].
///
/// ```ignore
/// use lighter::{config::ClientConfig, firestore::FirestoreStore, store::DocumentStore};
///
/// let config = ClientConfig::new("my-project").with_credentials_file("/secrets/key.json");
/// let store = DocumentStore::open(FirestoreStore::builder(config)).await?;
/// ```
pub struct FirestoreStoreBuilder {
    config: Option<ClientConfig>,
    metadata: Option<Box<dyn ProjectMetadata>>,
    operation_timeout: Option<Duration>,
}

impl FirestoreStoreBuilder {
    /// Starts from `config`, taking its operation timeout.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            operation_timeout: config.operation_timeout,
            config: Some(config),
            metadata: None,
        }
    }

    /// Defers the config to build time, when it is discovered from the environment.
    pub fn discover() -> Self {
        Self {
            config: None,
            metadata: None,
            operation_timeout: None,
        }
    }

    /// Uses `metadata` instead of the metadata server when discovering the project.
    pub fn with_metadata(mut self, metadata: impl ProjectMetadata + 'static) -> Self {
        self.metadata = Some(Box::new(metadata));
        self
    }

    /// Overrides the operation timeout of the config.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    async fn resolve_config(self) -> DocumentStoreResult<ClientConfig> {
        let mut config = match (self.config, self.metadata) {
            (Some(config), _) => config,
            (None, Some(metadata)) => ClientConfig::discover(metadata.as_ref()).await?,
            (None, None) => ClientConfig::discover(&MetadataClient::from_env()?).await?,
        };

        if self.operation_timeout.is_some() {
            config.operation_timeout = self.operation_timeout;
        }

        Ok(config)
    }
}

#[async_trait]
impl StoreBackendBuilder for FirestoreStoreBuilder {
    type Backend = FirestoreStore;

    fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let config = self.resolve_config().await?;
        config.validate()?;

        let options = FirestoreDbOptions::new(config.project_id.clone());
        let db = match &config.credentials_file {
            Some(path) => FirestoreDb::with_options_service_account_key_file(options, path.clone()).await,
            None => FirestoreDb::with_options(options).await,
        }
        .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        if config.uses_default_region() {
            info!("Region not set, defaulting to {}", config.region());
        }

        info!(
            "Connected to Firestore project {} in region {}",
            config.project_id,
            config.region()
        );

        Ok(FirestoreStore::new(db, config))
    }
}
