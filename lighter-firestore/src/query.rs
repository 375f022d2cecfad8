//! Translation of query criteria into Firestore structured queries.

use std::convert::Infallible;

use bson::{Bson, Document as BsonDocument};
use firestore::{FirestoreQueryDirection, FirestoreQueryFilter};
use firestore::select_filter_builder::FirestoreQueryFilterBuilder;

use lighter_core::query::{CriteriaVisitor, Operator, Order};

/// Field names the Firestore deserializer adds to every document it reads.
const FIRESTORE_METADATA_PREFIX: &str = "_firestore_";

pub(crate) struct FirestoreFilterTranslator<'q> {
    builder: &'q FirestoreQueryFilterBuilder,
}

impl<'q> FirestoreFilterTranslator<'q> {
    pub fn new(builder: &'q FirestoreQueryFilterBuilder) -> Self {
        Self { builder }
    }
}

impl<'q> CriteriaVisitor for FirestoreFilterTranslator<'q> {
    type Output = Option<FirestoreQueryFilter>;
    type Error = Infallible;

    fn visit_all(&mut self, parts: Vec<Self::Output>) -> Result<Self::Output, Self::Error> {
        Ok(self.builder.for_all(parts))
    }

    fn visit_field(&mut self, property: &str, op: &Operator, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field = self.builder.field(property);
        let value = value.clone();

        Ok(match op {
            Operator::Eq => field.eq(value),
            Operator::Ne => field.neq(value),
            Operator::Lt => field.less_than(value),
            Operator::Lte => field.less_than_or_equal(value),
            Operator::Gt => field.greater_than(value),
            Operator::Gte => field.greater_than_or_equal(value),
            Operator::ArrayContains => field.array_contains(value),
            Operator::ArrayContainsAny => field.array_contains_any(value),
            Operator::In => field.is_in(value),
            Operator::NotIn => field.is_not_in(value),
        })
    }
}

pub(crate) fn direction(order: &Order) -> FirestoreQueryDirection {
    match order.is_descending() {
        true => FirestoreQueryDirection::Descending,
        false => FirestoreQueryDirection::Ascending,
    }
}

/// Drops the bookkeeping fields Firestore adds on read, leaving the stored payload.
pub(crate) fn strip_metadata(document: BsonDocument) -> BsonDocument {
    document
        .into_iter()
        .filter(|(key, _)| !key.starts_with(FIRESTORE_METADATA_PREFIX))
        .collect()
}
