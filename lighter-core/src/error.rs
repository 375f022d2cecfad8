//! Error types and result types for document store operations.
//!
//! Every fallible operation in this crate returns [`DocumentStoreResult<T>`]. The variants of
//! [`DocumentStoreError`] are deliberately coarse so callers can decide on their own retry policy:
//!
//! - [`DocumentStoreError::InvalidArgument`] is raised locally, before any backend call.
//! - [`DocumentStoreError::NotFound`] means the backend reported no document for an ID.
//! - [`DocumentStoreError::Decode`] means a stored document could not be mapped into the target type.
//! - [`DocumentStoreError::Remote`] wraps any other backend failure with the operation context.
//!
//! No operation in this crate retries on its own.

use std::convert::Infallible;

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A required argument was missing or malformed (empty collection, invalid ID, missing query).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The backend reported no document for the given ID.
    #[error("No data for ID {id} in collection {collection}")]
    NotFound {
        /// The requested document ID.
        id: String,
        /// The collection that was searched.
        collection: String,
    },
    /// A stored document could not be mapped into the caller's target type.
    #[error("Error parsing data: {0}")]
    Decode(String),
    /// A payload could not be encoded into a storable document.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The backend call itself failed (network, permission, quota, ...).
    #[error("Backend error during {operation} on collection {collection}{}: {message}", id_suffix(.id))]
    Remote {
        /// The facade operation that issued the call.
        operation: &'static str,
        /// The collection the call targeted.
        collection: String,
        /// The document ID, when the call addressed a single document.
        id: Option<String>,
        /// The backend's error message.
        message: String,
    },
    /// A remote call did not complete within the configured operation timeout.
    #[error("Operation {operation} on collection {collection} timed out after {millis}ms")]
    Timeout {
        /// The facade operation that timed out.
        operation: &'static str,
        /// The collection the call targeted.
        collection: String,
        /// The configured timeout.
        millis: u128,
    },
    /// Error during client configuration or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

impl DocumentStoreError {
    /// Creates an [`InvalidArgument`](DocumentStoreError::InvalidArgument) error.
    pub fn invalid(message: impl Into<String>) -> Self {
        DocumentStoreError::InvalidArgument(message.into())
    }

    /// Creates a [`Remote`](DocumentStoreError::Remote) error for a collection-wide call.
    pub fn remote(operation: &'static str, collection: &str, message: impl ToString) -> Self {
        DocumentStoreError::Remote {
            operation,
            collection: collection.to_string(),
            id: None,
            message: message.to_string(),
        }
    }

    /// Creates a [`Remote`](DocumentStoreError::Remote) error for a call addressing one document.
    pub fn remote_for(
        operation: &'static str,
        collection: &str,
        id: &str,
        message: impl ToString,
    ) -> Self {
        DocumentStoreError::Remote {
            operation,
            collection: collection.to_string(),
            id: Some(id.to_string()),
            message: message.to_string(),
        }
    }

    /// Returns `true` if this error reports a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::NotFound { .. })
    }

    /// Returns `true` if this error was raised by local argument validation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DocumentStoreError::InvalidArgument(_))
    }

    /// Returns `true` if this error was caused by the configured operation timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DocumentStoreError::Timeout { .. })
    }
}

fn id_suffix(id: &Option<String>) -> String {
    id.as_deref()
        .map(|id| format!(" (id {id})"))
        .unwrap_or_default()
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<Infallible> for DocumentStoreError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}
