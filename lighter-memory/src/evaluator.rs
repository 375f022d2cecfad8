//! Criteria evaluation for in-memory document filtering.
//!
//! Property paths are dotted (`data.City`) and walk nested documents. A document that lacks the
//! property never matches, whatever the operator, which mirrors how managed document stores
//! treat missing fields.

use std::{cmp::Ordering, collections::BTreeMap};

use bson::{Bson, Document as BsonDocument, datetime::DateTime};

use lighter_core::{
    error::DocumentStoreError,
    query::{CriteriaVisitor, Criterion, Operator},
};

/// Type-erased, comparable representation of BSON values.
///
/// Values of different types order by type rank: null, booleans, numbers, timestamps, strings,
/// arrays, maps. Integers compare exactly with each other and are only widened against floats,
/// where `3` and `3.0` compare equal. NaN sorts before every other number. BSON types the
/// document stores have no counterpart for are `Unsupported` and never match a filter.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(BTreeMap<&'a str, Comparable<'a>>),
    Unsupported,
}

impl<'a> Comparable<'a> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Int(_) | Comparable::Float(_) => 2,
            Comparable::DateTime(_) => 3,
            Comparable::String(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Map(_) => 6,
            Comparable::Unsupported => 7,
        }
    }

    fn is_unsupported(&self) -> bool {
        matches!(self, Comparable::Unsupported)
    }

    fn is_nan(&self) -> bool {
        matches!(self, Comparable::Float(value) if value.is_nan())
    }

    /// Filter equality. Unsupported values equal nothing, not even themselves.
    pub fn matches(&self, other: &Self) -> bool {
        !self.is_unsupported() && !other.is_unsupported() && self == other
    }

    /// Range comparison, defined only between values of the same type.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.rank() != other.rank() || self.is_unsupported() || self.is_nan() || other.is_nan() {
            return None;
        }

        Some(self.cmp(other))
    }
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Float(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<BTreeMap<_, _>>()
            ),
            _ => Comparable::Unsupported,
        }
    }
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_int_float(int: i64, float: f64) -> Ordering {
    if float.is_nan() {
        return Ordering::Greater;
    }

    match compare_floats(int as f64, float) {
        // The widened integer may have rounded; settle ties in integer space.
        Ordering::Equal if float >= i64::MAX as f64 => Ordering::Less,
        Ordering::Equal => int.cmp(&(float as i64)),
        ordering => ordering,
    }
}

impl<'a> Ord for Comparable<'a> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.cmp(b),
            (Comparable::Float(a), Comparable::Float(b)) => compare_floats(*a, *b),
            (Comparable::Int(a), Comparable::Float(b)) => compare_int_float(*a, *b),
            (Comparable::Float(a), Comparable::Int(b)) => compare_int_float(*b, *a).reverse(),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a.cmp(b),
            (Comparable::Map(a), Comparable::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<'a> Eq for Comparable<'a> {}

/// Resolves a dotted property path inside `document`.
pub(crate) fn lookup<'a>(document: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a BsonDocument,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a BsonDocument) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every criterion.
    pub fn matches(document: &'a BsonDocument, criteria: &[Criterion]) -> Result<bool, DocumentStoreError> {
        DocumentEvaluator::new(document).visit_criteria(criteria)
    }
}

impl<'a> CriteriaVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_all(&mut self, parts: Vec<bool>) -> Result<Self::Output, Self::Error> {
        Ok(parts.into_iter().all(|matched| matched))
    }

    fn visit_field(&mut self, property: &str, op: &Operator, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = lookup(self.document, property) else {
            return Ok(false);
        };

        let field = Comparable::from(field_value);
        let expected = Comparable::from(value);

        Ok(match op {
            Operator::Eq => field.matches(&expected),
            Operator::Ne => !field.matches(&expected),
            Operator::Lt => field.compare(&expected) == Some(Ordering::Less),
            Operator::Lte => matches!(field.compare(&expected), Some(Ordering::Less | Ordering::Equal)),
            Operator::Gt => field.compare(&expected) == Some(Ordering::Greater),
            Operator::Gte => matches!(field.compare(&expected), Some(Ordering::Greater | Ordering::Equal)),
            Operator::ArrayContains => match field {
                Comparable::Array(items) => items.iter().any(|item| item.matches(&expected)),
                _ => false,
            },
            Operator::ArrayContainsAny => match (field, expected) {
                (Comparable::Array(items), Comparable::Array(candidates)) => candidates
                    .iter()
                    .any(|candidate| items.iter().any(|item| item.matches(candidate))),
                _ => false,
            },
            Operator::In => match expected {
                Comparable::Array(candidates) => candidates.iter().any(|candidate| candidate.matches(&field)),
                _ => false,
            },
            Operator::NotIn => match expected {
                Comparable::Array(candidates) => !candidates.iter().any(|candidate| candidate.matches(&field)),
                _ => false,
            },
        })
    }
}
