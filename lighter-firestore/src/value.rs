//! Conversion of stored documents into Firestore field values.
//!
//! BSON datetimes, and the record creation time which travels as an RFC 3339 string, are
//! written as native Firestore timestamps. Firestore reads timestamps back as RFC 3339 strings,
//! which is what the record layout decodes.

use bson::{Bson, Document as BsonDocument};
use chrono::{DateTime, Utc};
use firestore::FirestoreTimestamp;
use serde::{Serialize, Serializer, ser::SerializeMap};

use lighter_core::document::CREATED_ON_FIELD;

/// Serializes a document for Firestore, turning timestamp fields into Firestore timestamps.
pub(crate) struct FirestoreFields<'a>(pub &'a BsonDocument);

impl Serialize for FirestoreFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        for (key, value) in self.0 {
            match (timestamp_of(key, value), value) {
                (Some(timestamp), _) => map.serialize_entry(key, &FirestoreTimestamp(timestamp))?,
                (None, Bson::Document(nested)) => map.serialize_entry(key, &FirestoreFields(nested))?,
                (None, _) => map.serialize_entry(key, value)?,
            }
        }

        map.end()
    }
}

/// Returns the instant `value` stands for, if the field at `key` holds a timestamp.
pub(crate) fn timestamp_of(key: &str, value: &Bson) -> Option<DateTime<Utc>> {
    match value {
        Bson::DateTime(datetime) => Some(datetime.to_chrono()),
        Bson::String(text) if key == CREATED_ON_FIELD => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn creation_time_becomes_timestamp() {
        let value = Bson::String("2024-03-01T12:30:00.000250Z".to_string());

        let timestamp = timestamp_of(CREATED_ON_FIELD, &value).expect("timestamp");

        assert_eq!(
            timestamp,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap() + chrono::Duration::microseconds(250)
        );
    }

    #[rstest]
    fn bson_datetimes_become_timestamps() {
        let at = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();

        assert_eq!(timestamp_of("seen", &Bson::DateTime(bson::DateTime::from_chrono(at))), Some(at));
    }

    #[rstest]
    #[case("name", Bson::String("2024-03-01T12:30:00Z".to_string()))]
    #[case(CREATED_ON_FIELD, Bson::String("yesterday".to_string()))]
    #[case(CREATED_ON_FIELD, Bson::Int64(5))]
    fn other_values_stay_as_they_are(#[case] key: &str, #[case] value: Bson) {
        assert_eq!(timestamp_of(key, &value), None);
    }
}
