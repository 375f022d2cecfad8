//! Core traits and types for document representation and serialization.
//!
//! Payloads are opaque to this crate: anything implementing `Serialize` can be saved, and
//! anything implementing `Deserialize` can be read back. On their way to and from a backend,
//! payloads pass through [`bson::Document`], the backend-neutral representation every
//! [`StoreBackend`](crate::backend::StoreBackend) speaks.

use bson::{Bson, Document as BsonDocument, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    id::generate_id,
};

/// Name of the creation timestamp field of a [`Record`].
pub const CREATED_ON_FIELD: &str = "created_on";

/// The canonical persisted layout: an ID, a creation timestamp and an opaque payload.
///
/// # Example
///
/// ```ignore
/// use lighter::document::Record;
/// use std::collections::HashMap;
///
/// let record = Record::new(HashMap::from([("City".to_string(), "Portland".to_string())]));
/// store.save("cities", &record.id, &record).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    /// The document ID, always valid according to [`is_valid_id`](crate::id::is_valid_id).
    pub id: String,
    /// When the record was created, in UTC.
    #[serde(rename = "created_on", with = "timestamp")]
    pub on: DateTime<Utc>,
    /// The caller's payload.
    pub data: T,
}

impl<T> Record<T> {
    /// Wraps `data` in a record with a freshly generated ID and the current time.
    pub fn new(data: T) -> Self {
        Self {
            id: generate_id(),
            on: Utc::now(),
            data,
        }
    }

    /// Wraps `data` in a record with a caller-chosen ID.
    pub fn with_id(id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            on: Utc::now(),
            data,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Record<T> {
    /// Converts this record to a JSON value.
    pub fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    /// Creates a record from a JSON value.
    pub fn from_json(value: Value) -> DocumentStoreResult<Self> {
        from_value(value).map_err(|e| DocumentStoreError::Decode(e.to_string()))
    }
}

/// Timestamps are encoded as fixed-width RFC 3339 strings in UTC so that they order
/// chronologically on every backend. Backends with a native timestamp type may store them as
/// such; any RFC 3339 string they return decodes.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

/// Trait for payload types that know their own ID and collection.
///
/// Implementing it enables [`TypedCollection`](crate::collection::TypedCollection), which
/// saves documents without repeating the collection name and ID at every call site.
///
/// # Example
///
/// ```ignore
/// use lighter::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// pub struct User {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl Document for User {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns this document's ID.
    fn id(&self) -> &str;

    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;
}

/// Encodes a payload into a storable document.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidArgument`] if the payload encodes to nothing (e.g.
/// `None` or `()`) or to a value that is not a document, and
/// [`DocumentStoreError::Serialization`] if encoding itself fails.
pub fn encode_payload<T: Serialize + ?Sized>(payload: &T) -> DocumentStoreResult<BsonDocument> {
    match serialize_to_bson(payload)? {
        Bson::Document(document) => Ok(document),
        Bson::Null | Bson::Undefined => Err(DocumentStoreError::invalid("object required")),
        other => Err(DocumentStoreError::invalid(format!(
            "object must encode to a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Decodes a stored document into `T`.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Decode`] if the document does not fit `T`.
pub fn decode_document<T: DeserializeOwned>(document: BsonDocument) -> DocumentStoreResult<T> {
    deserialize_from_bson(Bson::Document(document))
        .map_err(|e| DocumentStoreError::Decode(e.to_string()))
}

/// Decodes a stored document over an existing value.
///
/// Top-level fields present in `document` replace those of `base`; fields the document lacks
/// keep the value `base` carried. This is how result items produced by a
/// [`ResultHandler`](crate::query::ResultHandler) get filled.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Decode`] if the merged document does not fit `T`.
pub fn decode_document_into<T>(base: &T, document: BsonDocument) -> DocumentStoreResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = match serialize_to_bson(base) {
        Ok(Bson::Document(fields)) => fields,
        _ => BsonDocument::new(),
    };

    for (key, value) in document {
        merged.insert(key, value);
    }

    decode_document(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use rstest::rstest;
    use std::collections::HashMap;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
        count: i64,
        #[serde(default)]
        note: Option<String>,
    }

    #[rstest]
    fn record_encodes_persisted_layout() {
        let record = Record::new(HashMap::from([("City".to_string(), "Portland".to_string())]));

        let encoded = encode_payload(&record).expect("encode record");

        assert_eq!(encoded.get_str("id").expect("id"), record.id);
        assert!(encoded.get_str("created_on").expect("created_on").ends_with('Z'));
        assert_eq!(
            encoded
                .get_document("data")
                .expect("data")
                .get_str("City")
                .expect("City"),
            "Portland"
        );
    }

    #[rstest]
    fn record_round_trips_through_storage_form() {
        let record = Record::new(Item { name: "John".into(), count: 40, note: None });

        let decoded: Record<Item> = decode_document(encode_payload(&record).expect("encode"))
            .expect("decode");

        assert_eq!(decoded.id, record.id);
        assert_eq!(decoded.data, record.data);
        assert_eq!(decoded.on.timestamp_micros(), record.on.timestamp_micros());
    }

    #[rstest]
    fn encode_rejects_missing_payload() {
        let err = encode_payload(&Option::<Item>::None).expect_err("none is not a payload");

        assert!(err.is_invalid_argument());
    }

    #[rstest]
    fn encode_rejects_scalar_payload() {
        let err = encode_payload(&42_i32).expect_err("scalar is not a document");

        assert!(err.is_invalid_argument());
    }

    #[rstest]
    fn decode_reports_shape_mismatch() {
        let err = decode_document::<Item>(doc! { "name": 12 }).expect_err("mismatch");

        assert!(matches!(err, DocumentStoreError::Decode(_)));
    }

    #[rstest]
    fn decode_into_keeps_fields_missing_from_document() {
        let base = Item { name: String::new(), count: 0, note: Some("default".into()) };

        let decoded = decode_document_into(&base, doc! { "name": "B", "count": 2_i64 })
            .expect("decode");

        assert_eq!(decoded, Item { name: "B".into(), count: 2, note: Some("default".into()) });
    }

    #[rstest]
    fn record_json_round_trip() {
        let record = Record::with_id("tid-a1", Item { name: "x".into(), count: 1, note: None });

        let json = record.to_json().expect("to json");
        assert_eq!(json["id"], "tid-a1");

        let back = Record::<Item>::from_json(json).expect("from json");
        assert_eq!(back.data, record.data);
    }
}
