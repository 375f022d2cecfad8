//! Collection-bound views over a document store.
//!
//! A view remembers its collection name so call sites do not repeat it. Every call goes through
//! the owning [`DocumentStore`], so validation, timeouts and logging apply as usual.
//!
//! # Collection Types
//!
//! - [`Collection`] - Untyped view; payload types are chosen per call
//! - [`TypedCollection`] - View for one [`Document`] type, which supplies its own ID
//!
//! # Example
//!
//! ```ignore
//! use lighter::document::Document;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! impl Document for User {
//!     fn id(&self) -> &str { &self.id }
//!     fn collection_name() -> &'static str { "users" }
//! }
//!
//! let users = store.typed_collection::<User>();
//! users.save(&User { id: generate_id(), name: "Alice".to_string() }).await?;
//! ```

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    backend::StoreBackend,
    document::Document,
    error::DocumentStoreResult,
    query::{Criterion, QueryBuilder, QueryCriteria, ResultHandler},
    store::DocumentStore,
};

/// An untyped view of one collection.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the store reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    store: &'a DocumentStore<B>,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, store: &'a DocumentStore<B>) -> Self {
        Self { name, store }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates or replaces the document `id` with `payload`.
    pub async fn save<T>(&self, id: &str, payload: &T) -> DocumentStoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.store.save(&self.name, id, payload).await
    }

    /// Fetches the document `id` and decodes it into `T`.
    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> DocumentStoreResult<T> {
        self.store.get_by_id(&self.name, id).await
    }

    /// Deletes the document `id`.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        self.store.delete_by_id(&self.name, id).await
    }

    /// Deletes every document, `batch_size` per round-trip. Returns the number deleted.
    pub async fn delete_all(&self, batch_size: usize) -> DocumentStoreResult<usize> {
        self.store.delete_all(&self.name, batch_size).await
    }

    /// Starts a query over this collection.
    pub fn query_builder(&self) -> QueryBuilder {
        QueryCriteria::builder(self.name.clone())
    }

    /// Runs a query over this collection and feeds the results to `handler`.
    pub async fn find_with<T, H>(
        &self,
        criteria: impl IntoIterator<Item = Criterion>,
        handler: H,
    ) -> DocumentStoreResult<usize>
    where
        T: Serialize + DeserializeOwned,
        H: ResultHandler<T>,
    {
        let query = self.query_builder().filters(criteria).build();

        self.store.get_by_query(&query, handler).await
    }

    /// Runs a query over this collection and collects the results.
    pub async fn find<T>(
        &self,
        criteria: impl IntoIterator<Item = Criterion>,
    ) -> DocumentStoreResult<Vec<T>>
    where
        T: Default + Serialize + DeserializeOwned,
    {
        let query = self.query_builder().filters(criteria).build();

        self.store.query(&query).await
    }
}

/// A view of the collection that stores documents of type `D`.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the store reference
/// * `B` - The storage backend type
/// * `D` - The document type
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    store: &'a DocumentStore<B>,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, store: &'a DocumentStore<B>) -> Self {
        Self { name, store, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reinterprets this collection as holding documents of another type.
    pub fn with_type<T: Document>(&self) -> TypedCollection<'a, B, T> {
        TypedCollection {
            name: self.name.clone(),
            store: self.store,
            _marker: PhantomData,
        }
    }

    /// Saves `document` under its own ID.
    pub async fn save(&self, document: &D) -> DocumentStoreResult<()> {
        self.store
            .save(&self.name, document.id(), document)
            .await
    }

    /// Saves each document in turn, stopping at the first failure.
    pub async fn save_all(&self, documents: &[D]) -> DocumentStoreResult<()> {
        for document in documents {
            self.save(document).await?;
        }

        Ok(())
    }

    /// Fetches the document `id`.
    pub async fn get(&self, id: &str) -> DocumentStoreResult<D> {
        self.store.get_by_id(&self.name, id).await
    }

    /// Deletes the document `id`.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        self.store.delete_by_id(&self.name, id).await
    }

    /// Deletes every document, `batch_size` per round-trip. Returns the number deleted.
    pub async fn delete_all(&self, batch_size: usize) -> DocumentStoreResult<usize> {
        self.store.delete_all(&self.name, batch_size).await
    }

    /// Starts a query over this collection.
    pub fn query_builder(&self) -> QueryBuilder {
        QueryCriteria::builder(self.name.clone())
    }

    /// Runs `query` and collects the matching documents.
    ///
    /// The query's own collection name is used, so build it with
    /// [`query_builder`](TypedCollection::query_builder).
    pub async fn query(&self, query: &QueryCriteria) -> DocumentStoreResult<Vec<D>>
    where
        D: Default,
    {
        self.store.query(query).await
    }

    /// Runs a query over this collection and collects the matching documents.
    pub async fn find(
        &self,
        criteria: impl IntoIterator<Item = Criterion>,
    ) -> DocumentStoreResult<Vec<D>>
    where
        D: Default,
    {
        self.query(&self.query_builder().filters(criteria).build())
            .await
    }
}
