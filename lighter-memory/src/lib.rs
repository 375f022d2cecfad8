//! In-memory document storage backend for lighter.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait. It
//! evaluates the same criteria, ordering and limits a remote store would, which makes it the
//! backend of choice for tests and local development.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Nested criteria** - Dotted property paths such as `data.City`
//! - **Call accounting** - [`InMemoryStore::call_count`] tells tests whether the backend was reached
//!
//! # Quick Start
//!
//! ```ignore
//! use lighter::{id::generate_id, memory::InMemoryStore, store::DocumentStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::new());
//!
//!     let id = generate_id();
//!     store.save("users", &id, &user).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
