//! In-memory storage implementation for document stores.
//!
//! Documents live in per-collection maps behind an async-aware read-write lock. Collections
//! come into existence on first write, like they do in managed document stores.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};

use async_trait::async_trait;
use bson::Document as BsonDocument;
use futures::stream;
use log::debug;
use mea::rwlock::RwLock;

use lighter_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    error::DocumentStoreResult,
    query::QueryCriteria,
};

use crate::evaluator::{Comparable, DocumentEvaluator, lookup};

type CollectionMap = BTreeMap<String, BsonDocument>;
type StoreMap = BTreeMap<String, CollectionMap>;

/// A thread-safe, process-local [`StoreBackend`].
///
/// Clones share the same data. Documents are kept in ID order, which is also the default result
/// order of queries without an explicit order.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder for opening the store through [`DocumentStore::open`](lighter_core::store::DocumentStore::open).
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns how many backend calls this store has served.
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Returns the number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn upsert_document(&self, collection: &str, id: &str, document: BsonDocument) -> DocumentStoreResult<()> {
        self.record_call();

        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);

        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<BsonDocument>> {
        self.record_call();

        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .and_then(|documents| documents.get(id))
                .cloned()
        )
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        self.record_call();

        if let Some(documents) = self.store.write().await.get_mut(collection) {
            documents.remove(id);
        }

        Ok(())
    }

    async fn list_document_ids(&self, collection: &str, limit: usize) -> DocumentStoreResult<Vec<String>> {
        self.record_call();

        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .map(|documents| {
                    documents
                        .keys()
                        .take(limit)
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        )
    }

    async fn delete_documents(&self, collection: &str, ids: Vec<String>) -> DocumentStoreResult<()> {
        self.record_call();

        // One write guard for the whole batch keeps it atomic for readers.
        let mut store = self.store.write().await;

        if let Some(documents) = store.get_mut(collection) {
            for id in &ids {
                documents.remove(id);
            }
        }

        debug!("Deleted batch of {} ids from {collection}", ids.len());

        Ok(())
    }

    async fn run_query<'a>(&'a self, criteria: &'a QueryCriteria) -> DocumentStoreResult<DocumentStream<'a>> {
        self.record_call();

        let store = self.store.read().await;
        let Some(documents) = store.get(&criteria.collection) else {
            return Ok(Box::pin(stream::empty()));
        };

        let mut matched = Vec::new();
        for document in documents.values() {
            if DocumentEvaluator::matches(document, &criteria.criteria)? {
                matched.push(document);
            }
        }

        if let Some(order) = &criteria.order_by {
            // Documents without the order property are left out of ordered results.
            matched.retain(|document| lookup(document, &order.property).is_some());
            matched.sort_by(|a, b| {
                let left = lookup(a, &order.property).map(Comparable::from);
                let right = lookup(b, &order.property).map(Comparable::from);

                match order.is_descending() {
                    false => left.cmp(&right),
                    true => right.cmp(&left),
                }
            });
        }

        let results = matched
            .into_iter()
            .take(criteria.limit.unwrap_or(usize::MAX))
            .map(|document| Ok(document.clone()))
            .collect::<Vec<_>>();

        Ok(Box::pin(stream::iter(results)))
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use lighter::{backend::StoreBackendBuilder, memory::InMemoryStore, store::DocumentStore};
///
/// let store = DocumentStore::open(InMemoryStore::builder()).await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use futures::TryStreamExt;
    use lighter_core::query::{Filter, SortDirection};
    use rstest::{fixture, rstest};

    #[fixture]
    fn backend() -> InMemoryStore {
        InMemoryStore::new()
    }

    async fn seed(backend: &InMemoryStore, count: i64) {
        for n in 0..count {
            backend
                .upsert_document("nums", &format!("tid{n}"), doc! { "id": format!("tid{n}"), "n": n, "odd": (n % 2 == 1) })
                .await
                .expect("upsert");
        }
    }

    #[rstest]
    #[tokio::test]
    async fn upsert_replaces_whole_document(backend: InMemoryStore) {
        backend.upsert_document("c", "tid1", doc! { "a": 1, "b": 2 }).await.expect("upsert");
        backend.upsert_document("c", "tid1", doc! { "a": 3 }).await.expect("upsert");

        let stored = backend.get_document("c", "tid1").await.expect("get");

        assert_eq!(stored, Some(doc! { "a": 3 }));
        assert_eq!(backend.len("c").await, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_missing_document_succeeds(backend: InMemoryStore) {
        backend.delete_document("nowhere", "tid1").await.expect("delete");

        assert_eq!(backend.get_document("nowhere", "tid1").await.expect("get"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn listing_respects_limit(backend: InMemoryStore) {
        seed(&backend, 5).await;

        let ids = backend.list_document_ids("nums", 3).await.expect("list");

        assert_eq!(ids.len(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn batch_delete_removes_listed_ids(backend: InMemoryStore) {
        seed(&backend, 4).await;

        backend
            .delete_documents("nums", vec!["tid0".to_string(), "tid2".to_string()])
            .await
            .expect("batch");

        assert_eq!(backend.list_document_ids("nums", 10).await.expect("list"), vec!["tid1", "tid3"]);
    }

    #[rstest]
    #[tokio::test]
    async fn query_filters_orders_and_limits(backend: InMemoryStore) {
        seed(&backend, 6).await;
        let query = QueryCriteria::builder("nums")
            .filter(Filter::eq("odd", true))
            .order_by("n", SortDirection::Desc)
            .limit(2)
            .build();

        let results = backend
            .run_query(&query)
            .await
            .expect("query")
            .try_collect::<Vec<_>>()
            .await
            .expect("drain");

        let values = results
            .iter()
            .map(|document| document.get_i64("n").expect("n"))
            .collect::<Vec<_>>();
        assert_eq!(values, vec![5, 3]);
    }

    #[rstest]
    #[tokio::test]
    async fn ordered_query_skips_documents_without_property(backend: InMemoryStore) {
        seed(&backend, 2).await;
        backend.upsert_document("nums", "tidx", doc! { "other": 1 }).await.expect("upsert");

        let results = backend
            .run_query(&QueryCriteria::builder("nums").order_by("n", SortDirection::Asc).build())
            .await
            .expect("query")
            .try_collect::<Vec<_>>()
            .await
            .expect("drain");

        assert_eq!(results.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn mixed_type_order_is_total(backend: InMemoryStore) {
        for n in 0..30_i64 {
            let value = match n % 3 {
                0 => bson::Bson::Int64(n),
                1 => bson::Bson::String(format!("s{n:02}")),
                _ => bson::Bson::Double(f64::NAN),
            };
            backend
                .upsert_document("mixed", &format!("tid{n:02}"), doc! { "v": value })
                .await
                .expect("upsert");
        }

        let results = backend
            .run_query(&QueryCriteria::builder("mixed").order_by("v", SortDirection::Asc).build())
            .await
            .expect("query")
            .try_collect::<Vec<_>>()
            .await
            .expect("drain");

        let values = results
            .iter()
            .map(|document| document.get("v").cloned().expect("v"))
            .collect::<Vec<_>>();
        let numbers = values
            .iter()
            .filter_map(|value| value.as_i64())
            .collect::<Vec<_>>();
        let strings = values
            .iter()
            .filter_map(|value| value.as_str())
            .collect::<Vec<_>>();

        assert_eq!(values.len(), 30);
        assert!(values[..10].iter().all(|value| value.as_f64().is_some_and(f64::is_nan)));
        assert!(values[10..20].iter().all(|value| value.as_i64().is_some()));
        assert!(numbers.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(strings.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[rstest]
    #[tokio::test]
    async fn query_on_unknown_collection_is_empty(backend: InMemoryStore) {
        let results = backend
            .run_query(&QueryCriteria::new("ghosts"))
            .await
            .expect("query")
            .try_collect::<Vec<_>>()
            .await
            .expect("drain");

        assert!(results.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn counts_backend_calls(backend: InMemoryStore) {
        backend.get_document("c", "tid1").await.expect("get");
        backend.delete_document("c", "tid1").await.expect("delete");

        assert_eq!(backend.call_count(), 2);
    }
}
