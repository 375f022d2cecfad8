//! Cloud Firestore backend implementation for lighter.
//!
//! This crate provides a Firestore-based implementation of the `StoreBackend` trait. It is
//! enabled through the `firestore` feature of the `lighter` crate:
//!
//! ```toml
//! [dependencies]
//! lighter = { version = "x.y.z", features = ["firestore"] }
//! ```
//!
//! # Connection
//!
//! A store connects either with an explicit [`ClientConfig`](lighter_core::config::ClientConfig)
//! or by discovering the project at build time. Discovery reads the usual project environment
//! variables and falls back to the instance metadata server ([`MetadataClient`]). A credentials
//! file, when configured or named by `FS_CLIENT_IDENTITY`, must exist; otherwise the ambient
//! application-default credentials are used.
//!
//! # Indexes
//!
//! Queries that combine several criteria, or a criterion with an order on another property,
//! need a composite index. Firestore reports the missing index in the query error.
//!
//! # Example
//!
//! ```ignore
//! use lighter::{firestore::FirestoreStore, store::DocumentStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::open(FirestoreStore::discover()).await?;
//!
//!     store.delete_all("scratch", 100).await?;
//!     store.close().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod metadata;
pub mod query;
pub mod store;
pub mod value;

pub use metadata::MetadataClient;
pub use store::{FirestoreStore, FirestoreStoreBuilder};
