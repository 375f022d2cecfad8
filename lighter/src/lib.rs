//! A thin data-access layer over managed document databases.
//!
//! This crate is the entry point of lighter. It re-exports the core types from `lighter-core`
//! and the available storage backends.
//!
//! # Features
//!
//! - **Opaque payloads** - Anything serde can encode is stored as-is under a caller-chosen ID
//! - **Valid IDs** - Generated and derived IDs always start with a letter
//! - **Batch deletion** - Empty a collection in bounded batches
//! - **Streaming queries** - Criteria and ordering, results fed to a [`ResultHandler`](query::ResultHandler)
//!
//! # Quick Start
//!
//! ```ignore
//! use lighter::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! pub struct City {
//!     #[serde(rename = "City")]
//!     pub city: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::new());
//!
//!     let record = Record::new(City { city: "Portland".to_string() });
//!     store.save("cities", &record.id, &record).await?;
//!
//!     let portland: Vec<Record<City>> = store
//!         .query(
//!             &QueryCriteria::builder("cities")
//!                 .filter(Filter::eq("data.City", "Portland"))
//!                 .build(),
//!         )
//!         .await?;
//!
//!     store.delete_all("cities", 100).await?;
//!     store.close().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-process storage for development and testing
//! - `firestore` - Cloud Firestore (requires the `firestore` feature)

pub mod prelude;

pub use lighter_core::{backend, collection, config, document, error, id, query, store};

pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use lighter_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// Cloud Firestore storage backend implementations.
///
/// This module is only available when the `firestore` feature is enabled.
#[cfg(feature = "firestore")]
pub mod firestore {
    pub use lighter_firestore::{FirestoreStore, FirestoreStoreBuilder, MetadataClient};
}
