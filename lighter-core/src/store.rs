//! Main document store interface for interacting with document backends.
//!
//! [`DocumentStore`] is the facade every caller goes through. It validates arguments before any
//! backend call, encodes and decodes payloads, bounds each remote round-trip by the optional
//! operation timeout and logs what it sends to the backend.
//!
//! # Example
//!
//! ```ignore
//! use lighter::{id::generate_id, store::DocumentStore};
//! use lighter::memory::InMemoryStore;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let id = generate_id();
//! store.save("things", &id, &thing).await?;
//! let back: Thing = store.get_by_id("things", &id).await?;
//! ```

use std::{future::Future, time::Duration};

use futures::TryStreamExt;
use log::{debug, info, warn};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    document::{Document, decode_document, decode_document_into, encode_payload},
    error::{DocumentStoreError, DocumentStoreResult},
    id::is_valid_id,
    query::{QueryCriteria, ResultHandler},
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
    operation_timeout: Option<Duration>,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend, operation_timeout: None }
    }

    /// Builds the backend and wraps it in a store, carrying over the builder's operation timeout.
    ///
    /// # Errors
    ///
    /// Returns whatever error the builder reports, typically
    /// [`DocumentStoreError::Initialization`].
    pub async fn open<Bld>(builder: Bld) -> DocumentStoreResult<Self>
    where
        Bld: StoreBackendBuilder<Backend = B>,
    {
        let operation_timeout = builder.operation_timeout();
        let backend = builder.build().await?;

        Ok(Self { backend, operation_timeout })
    }

    /// Bounds every remote round-trip by `timeout`.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Returns the configured per-operation timeout, if any.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets a typed collection for the specified document type.
    ///
    /// The collection name is determined by the document type's `collection_name()` method.
    pub fn typed_collection<'a, D: Document>(&'a self) -> TypedCollection<'a, B, D> {
        TypedCollection::new(D::collection_name().to_string(), self)
    }

    /// Gets an untyped collection with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), self)
    }

    /// Creates or replaces the document `id` in `collection` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] for an empty collection, an invalid ID or
    /// a payload that does not encode to a document, before contacting the backend.
    pub async fn save<T>(&self, collection: &str, id: &str, payload: &T) -> DocumentStoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        validate_target(collection, id)?;
        let document = encode_payload(payload)?;

        debug!("Saving document {id} in collection {collection}");

        self.bounded("save", collection, self.backend.upsert_document(collection, id, document))
            .await
    }

    /// Fetches the document `id` from `collection` and decodes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotFound`] if there is no such document and
    /// [`DocumentStoreError::Decode`] if it does not fit `T`.
    pub async fn get_by_id<T>(&self, collection: &str, id: &str) -> DocumentStoreResult<T>
    where
        T: DeserializeOwned,
    {
        validate_target(collection, id)?;

        debug!("Fetching document {id} from collection {collection}");

        let document = self
            .bounded("get_by_id", collection, self.backend.get_document(collection, id))
            .await?
            .ok_or_else(|| DocumentStoreError::NotFound {
                id: id.to_string(),
                collection: collection.to_string(),
            })?;

        decode_document(document)
    }

    /// Deletes the document `id` from `collection`. Deleting a missing document succeeds.
    pub async fn delete_by_id(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        validate_target(collection, id)?;

        debug!("Deleting document {id} from collection {collection}");

        self.bounded("delete_by_id", collection, self.backend.delete_document(collection, id))
            .await
    }

    /// Deletes every document of `collection`, `batch_size` documents per round-trip.
    ///
    /// Returns the number of deleted documents. The first listing or batch failure aborts the
    /// loop; documents deleted by earlier batches stay deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] for an empty collection or a zero
    /// `batch_size`.
    pub async fn delete_all(&self, collection: &str, batch_size: usize) -> DocumentStoreResult<usize> {
        if collection.is_empty() {
            return Err(DocumentStoreError::invalid("collection required"));
        }

        if batch_size == 0 {
            return Err(DocumentStoreError::invalid("batch size must be greater than zero"));
        }

        let mut deleted = 0;

        loop {
            let ids = self
                .bounded(
                    "delete_all",
                    collection,
                    self.backend.list_document_ids(collection, batch_size),
                )
                .await
                .inspect_err(|e| warn!("Aborting delete_all on {collection} after {deleted} documents: {e}"))?;

            if ids.is_empty() {
                break;
            }

            let count = ids.len();
            debug!("Deleting batch of {count} documents from collection {collection}");

            self.bounded("delete_all", collection, self.backend.delete_documents(collection, ids))
                .await
                .inspect_err(|e| warn!("Aborting delete_all on {collection} after {deleted} documents: {e}"))?;

            deleted += count;
        }

        info!("Deleted {deleted} documents from collection {collection}");

        Ok(deleted)
    }

    /// Runs `query` and feeds every result to `handler`, in cursor order.
    ///
    /// For each document, the handler's [`make_new`](ResultHandler::make_new) item is filled
    /// with the document's fields and passed to [`append`](ResultHandler::append). Returns the
    /// number of appended items.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] if `query` is `None` or malformed. A
    /// decode or cursor error stops the iteration; items appended before it stay appended.
    pub async fn get_by_query<'q, T, H>(
        &self,
        query: impl Into<Option<&'q QueryCriteria>>,
        mut handler: H,
    ) -> DocumentStoreResult<usize>
    where
        T: Serialize + DeserializeOwned,
        H: ResultHandler<T>,
    {
        let query = query
            .into()
            .ok_or_else(|| DocumentStoreError::invalid("query required"))?;
        query.validate()?;

        debug!(
            "Querying collection {} with {} criteria",
            query.collection,
            query.criteria.len()
        );

        let drain = async {
            let mut results = self.backend.run_query(query).await?;
            let mut appended = 0;

            while let Some(document) = results.try_next().await? {
                let item = decode_document_into(&handler.make_new(), document)?;
                handler.append(item);
                appended += 1;
            }

            Ok::<_, DocumentStoreError>(appended)
        };

        self.bounded("get_by_query", &query.collection, drain)
            .await
    }

    /// Runs `query` and collects the results into a vector.
    pub async fn query<T>(&self, query: &QueryCriteria) -> DocumentStoreResult<Vec<T>>
    where
        T: Default + Serialize + DeserializeOwned,
    {
        let mut items = Vec::new();
        self.get_by_query(query, &mut items).await?;

        Ok(items)
    }

    /// Closes the store and releases the backend connection.
    pub async fn close(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        debug!("Document store closed");

        Ok(())
    }

    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        collection: &str,
        call: F,
    ) -> DocumentStoreResult<T>
    where
        F: Future<Output = DocumentStoreResult<T>>,
    {
        match self.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(DocumentStoreError::Timeout {
                    operation,
                    collection: collection.to_string(),
                    millis: limit.as_millis(),
                }),
            },
            None => call.await,
        }
    }
}

fn validate_target(collection: &str, id: &str) -> DocumentStoreResult<()> {
    if collection.is_empty() {
        return Err(DocumentStoreError::invalid("collection required"));
    }

    if !is_valid_id(id) {
        return Err(DocumentStoreError::invalid(format!("id must start with letter: '{id}'")));
    }

    Ok(())
}
