//! Convenient re-exports of commonly used types from lighter.
//!
//! ```ignore
//! use lighter::prelude::*;
//! ```

pub use lighter_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    config::{ClientConfig, ProjectMetadata},
    document::{Document, Record},
    error::{DocumentStoreError, DocumentStoreResult},
    id::{derive_id, generate_id, is_valid_id},
    query::{Criterion, Filter, Operator, Order, QueryBuilder, QueryCriteria, ResultHandler, SortDirection, handler_fn},
    store::DocumentStore,
};
