//! Storage backend abstraction for the document store.
//!
//! The [`StoreBackend`] trait is the seam between the [`DocumentStore`](crate::store::DocumentStore)
//! facade and a concrete store. It speaks [`bson::Document`] and plain string IDs; payload
//! encoding, argument validation, timeouts and logging all happen in the facade, so a backend
//! only maps each call onto its store's primitives.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Error context
//!
//! Backends report store failures as [`DocumentStoreError::Remote`](crate::error::DocumentStoreError::Remote),
//! naming the facade operation each method serves: `save`, `get_by_id`, `delete_by_id`,
//! `delete_all` and `get_by_query`.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use bson::Document as BsonDocument;
use futures::stream::BoxStream;

use crate::{error::DocumentStoreResult, query::QueryCriteria};

/// A cursor over the documents matching a query, in result order.
pub type DocumentStream<'a> = BoxStream<'a, DocumentStoreResult<BsonDocument>>;

/// Abstract interface for document storage backends.
///
/// Implementations must be thread-safe; one backend handle is expected to be shared by every
/// task of a process.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Creates or fully replaces the document at `(collection, id)`.
    async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        document: BsonDocument,
    ) -> DocumentStoreResult<()>;

    /// Fetches the document at `(collection, id)`, or `None` if there is none.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<BsonDocument>>;

    /// Deletes the document at `(collection, id)`. Deleting a missing document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()>;

    /// Lists up to `limit` document IDs of `collection`.
    async fn list_document_ids(
        &self,
        collection: &str,
        limit: usize,
    ) -> DocumentStoreResult<Vec<String>>;

    /// Deletes every listed document of `collection` in one atomic batch.
    async fn delete_documents(&self, collection: &str, ids: Vec<String>) -> DocumentStoreResult<()>;

    /// Runs `criteria` and returns a cursor over the matching documents.
    ///
    /// Criteria are combined with logical AND. Without an order the store's default order
    /// applies.
    async fn run_query<'a>(
        &'a self,
        criteria: &'a QueryCriteria,
    ) -> DocumentStoreResult<DocumentStream<'a>>;

    /// Releases the connection held by this backend.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        document: BsonDocument,
    ) -> DocumentStoreResult<()> {
        (*self)
            .upsert_document(collection, id, document)
            .await
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<BsonDocument>> {
        (*self).get_document(collection, id).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        (*self).delete_document(collection, id).await
    }

    async fn list_document_ids(
        &self,
        collection: &str,
        limit: usize,
    ) -> DocumentStoreResult<Vec<String>> {
        (*self)
            .list_document_ids(collection, limit)
            .await
    }

    async fn delete_documents(&self, collection: &str, ids: Vec<String>) -> DocumentStoreResult<()> {
        (*self)
            .delete_documents(collection, ids)
            .await
    }

    async fn run_query<'a>(
        &'a self,
        criteria: &'a QueryCriteria,
    ) -> DocumentStoreResult<DocumentStream<'a>> {
        (**self).run_query(criteria).await
    }
}

/// Factory for backends that need asynchronous setup, such as opening a connection.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    /// Upper bound for each remote round-trip of the built backend, if any.
    fn operation_timeout(&self) -> Option<Duration> {
        None
    }

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
