//! A thin data-access layer over managed document databases.
//!
//! This crate is the core of the lighter project and provides:
//!
//! - **Identifiers** ([`id`]) - Generating, deriving and validating document IDs
//! - **Documents** ([`document`]) - The persisted record layout and payload encoding
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Client configuration** ([`config`]) - Connection settings and project discovery
//! - **Queries** ([`query`]) - Criteria, ordering and result handlers
//! - **Collections interface** ([`collection`]) - Collection-bound views over a store
//! - **Document store** ([`store`]) - The facade for saving, fetching, deleting and querying
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use lighter::{document::Record, id::generate_id, store::DocumentStore};
//!
//! let store = DocumentStore::new(backend);
//! let record = Record::new(Thing { name: "lamp".to_string() });
//!
//! store.save("things", &record.id, &record).await?;
//! let back: Record<Thing> = store.get_by_id("things", &record.id).await?;
//! ```

pub mod backend;
pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod id;
pub mod query;
pub mod store;
