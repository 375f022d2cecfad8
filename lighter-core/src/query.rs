//! Query construction and result collection for document stores.
//!
//! A [`QueryCriteria`] names a collection, a list of [`Criterion`] filters that are combined with
//! logical AND, an optional [`Order`], and an optional limit. Backends translate it through a
//! [`CriteriaVisitor`] into their native query form.
//!
//! # Query Building
//!
//! ```ignore
//! use lighter::query::{QueryCriteria, Filter, SortDirection};
//!
//! let query = QueryCriteria::builder("cities")
//!     .filter(Filter::eq("data.City", "Portland"))
//!     .filter(Filter::gt("data.Population", 500_000))
//!     .order_by("data.Population", SortDirection::Desc)
//!     .build();
//! ```
//!
//! Property paths may use dots to address nested fields. Combining several filters, or a filter
//! with an order on another property, usually requires a composite index in the store; creating
//! it is the caller's responsibility.
//!
//! # Result Collection
//!
//! Results are streamed into a [`ResultHandler`], which produces empty items and accepts decoded
//! ones. Any `Vec<T>` where `T: Default` is a handler, and [`handler_fn`] builds one from two
//! closures.

use std::{fmt, str::FromStr};

use bson::Bson;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    #[default]
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// The property path to sort by.
    pub property: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Order {
    /// Orders ascending by `property`.
    pub fn asc(property: impl Into<String>) -> Self {
        Self { property: property.into(), direction: SortDirection::Asc }
    }

    /// Orders descending by `property`.
    pub fn desc(property: impl Into<String>) -> Self {
        Self { property: property.into(), direction: SortDirection::Desc }
    }

    /// Returns `true` if this order is descending.
    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Desc
    }
}

/// Comparison operators supported in a [`Criterion`].
///
/// The string forms accepted by [`Operator::from_str`] are the store's own operator spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `array-contains`: the array property contains the value.
    ArrayContains,
    /// `array-contains-any`: the array property contains any of the values.
    ArrayContainsAny,
    /// `in`: the property equals one of the values.
    In,
    /// `not-in`: the property equals none of the values.
    NotIn,
}

impl Operator {
    /// Returns the store spelling of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::ArrayContains => "array-contains",
            Operator::ArrayContainsAny => "array-contains-any",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }

    /// Returns `true` if this operator expects an array of candidate values.
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn | Operator::ArrayContainsAny)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "array-contains" => Operator::ArrayContains,
            "array-contains-any" => Operator::ArrayContainsAny,
            "in" => Operator::In,
            "not-in" => Operator::NotIn,
            other => {
                return Err(DocumentStoreError::invalid(format!("unsupported operator: '{other}'")));
            }
        })
    }
}

/// A single filter condition: `property operator value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    /// The property path, dotted for nested fields (e.g. `data.City`).
    pub property: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The value to compare against.
    pub value: Bson,
}

impl Criterion {
    /// Creates a criterion from an already parsed operator.
    pub fn new(property: impl Into<String>, operator: Operator, value: impl Into<Bson>) -> Self {
        Self {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates a criterion from the store's operator spelling, e.g. `Criterion::parse("City", "==", "Portland")`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] for an unknown operator.
    pub fn parse(
        property: impl Into<String>,
        operator: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<Self> {
        Ok(Self::new(property, operator.parse()?, value))
    }

    fn validate(&self) -> DocumentStoreResult<()> {
        if self.property.is_empty() {
            return Err(DocumentStoreError::invalid("criterion property required"));
        }

        if self.operator.takes_list() && !matches!(self.value, Bson::Array(_)) {
            return Err(DocumentStoreError::invalid(format!(
                "operator '{}' on '{}' requires an array value",
                self.operator, self.property
            )));
        }

        Ok(())
    }
}

/// Helper for constructing criteria in a type-safe manner.
///
/// ```ignore
/// use lighter::query::Filter;
///
/// let criterion = Filter::eq("name", "Alice");
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents where the property equals the value.
    pub fn eq(property: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::Eq, value)
    }

    /// Matches documents where the property does not equal the value.
    pub fn ne(property: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::Ne, value)
    }

    /// Matches documents where the property is greater than the value.
    pub fn gt(property: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::Gt, value)
    }

    /// Matches documents where the property is greater than or equal to the value.
    pub fn gte(property: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::Gte, value)
    }

    /// Matches documents where the property is less than the value.
    pub fn lt(property: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::Lt, value)
    }

    /// Matches documents where the property is less than or equal to the value.
    pub fn lte(property: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::Lte, value)
    }

    /// Matches documents whose array property contains the value.
    pub fn array_contains(property: impl Into<String>, value: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::ArrayContains, value)
    }

    /// Matches documents whose array property contains any of the values.
    pub fn array_contains_any(property: impl Into<String>, values: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::ArrayContainsAny, values)
    }

    /// Matches documents whose property equals one of the values.
    pub fn any_of(property: impl Into<String>, values: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::In, values)
    }

    /// Matches documents whose property equals none of the values.
    pub fn none_of(property: impl Into<String>, values: impl Into<Bson>) -> Criterion {
        Criterion::new(property, Operator::NotIn, values)
    }
}

/// Fully describes one read query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryCriteria {
    /// The collection to query.
    pub collection: String,
    /// Filters, combined with logical AND.
    pub criteria: Vec<Criterion>,
    /// Optional result order; `None` leaves the order to the store.
    pub order_by: Option<Order>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl QueryCriteria {
    /// Creates a query over every document of `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder(collection: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(collection)
    }

    /// Checks the query locally, before it reaches a backend.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] for an empty collection name, a criterion
    /// without a property, a list operator without an array value, or a zero limit.
    pub fn validate(&self) -> DocumentStoreResult<()> {
        if self.collection.is_empty() {
            return Err(DocumentStoreError::invalid("collection required"));
        }

        for criterion in &self.criteria {
            criterion.validate()?;
        }

        if let Some(order) = &self.order_by {
            if order.property.is_empty() {
                return Err(DocumentStoreError::invalid("order property required"));
            }
        }

        if self.limit == Some(0) {
            return Err(DocumentStoreError::invalid("limit must be greater than zero"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: QueryCriteria,
}

impl QueryBuilder {
    /// Creates a new query builder for `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        QueryBuilder { query: QueryCriteria::new(collection) }
    }

    /// Adds a criterion; all criteria must match.
    pub fn filter(mut self, criterion: Criterion) -> Self {
        self.query.criteria.push(criterion);
        self
    }

    /// Adds several criteria at once.
    pub fn filters(mut self, criteria: impl IntoIterator<Item = Criterion>) -> Self {
        self.query.criteria.extend(criteria);
        self
    }

    /// Sets the result order.
    pub fn order_by(mut self, property: impl Into<String>, direction: SortDirection) -> Self {
        self.query.order_by = Some(Order { property: property.into(), direction });
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> QueryCriteria {
        self.query
    }
}

/// Translates a list of criteria into a backend's native filter form.
///
/// Backends implement [`visit_field`](CriteriaVisitor::visit_field) and
/// [`visit_all`](CriteriaVisitor::visit_all); [`visit_criteria`](CriteriaVisitor::visit_criteria)
/// is the entry point.
pub trait CriteriaVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    /// Combines already translated criteria with logical AND.
    fn visit_all(&mut self, parts: Vec<Self::Output>) -> Result<Self::Output, Self::Error>;

    fn visit_field(
        &mut self,
        property: &str,
        op: &Operator,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_criterion(&mut self, criterion: &Criterion) -> Result<Self::Output, Self::Error> {
        self.visit_field(&criterion.property, &criterion.operator, &criterion.value)
    }

    fn visit_criteria(&mut self, criteria: &[Criterion]) -> Result<Self::Output, Self::Error> {
        let parts = criteria
            .iter()
            .map(|criterion| self.visit_criterion(criterion))
            .collect::<Result<Vec<_>, _>>()?;

        self.visit_all(parts)
    }
}

/// Receives the items of a query, one at a time.
///
/// For every document the cursor yields, the store calls [`make_new`](ResultHandler::make_new),
/// decodes the document's fields over the new item, and hands it to
/// [`append`](ResultHandler::append). Fields the document lacks keep whatever `make_new` put
/// there.
pub trait ResultHandler<T> {
    /// Produces a new, empty item to decode the next document into.
    fn make_new(&mut self) -> T;

    /// Accepts one decoded item.
    fn append(&mut self, item: T);
}

/// Collects items into the vector, starting each from `T::default()`.
///
/// Method-call syntax on a `Vec` resolves to the inherent [`Vec::append`], so call this one as
/// `ResultHandler::append(&mut items, item)` when using it directly.
impl<T: Default> ResultHandler<T> for Vec<T> {
    fn make_new(&mut self) -> T {
        T::default()
    }

    fn append(&mut self, item: T) {
        self.push(item);
    }
}

impl<T, H> ResultHandler<T> for &mut H
where
    H: ResultHandler<T> + ?Sized,
{
    fn make_new(&mut self) -> T {
        (**self).make_new()
    }

    fn append(&mut self, item: T) {
        (**self).append(item)
    }
}

/// A [`ResultHandler`] built from a factory closure and a sink closure.
#[derive(Debug, Clone)]
pub struct FnHandler<M, A> {
    make: M,
    accept: A,
}

impl<T, M, A> ResultHandler<T> for FnHandler<M, A>
where
    M: FnMut() -> T,
    A: FnMut(T),
{
    fn make_new(&mut self) -> T {
        (self.make)()
    }

    fn append(&mut self, item: T) {
        (self.accept)(item)
    }
}

/// Builds a [`ResultHandler`] from a factory and a sink.
///
/// ```ignore
/// let mut names = Vec::new();
/// store
///     .get_by_query(&query, handler_fn(Item::default, |item: Item| names.push(item.name)))
///     .await?;
/// ```
pub fn handler_fn<T, M, A>(make: M, accept: A) -> FnHandler<M, A>
where
    M: FnMut() -> T,
    A: FnMut(T),
{
    FnHandler { make, accept }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("==", Operator::Eq)]
    #[case("!=", Operator::Ne)]
    #[case("<", Operator::Lt)]
    #[case("<=", Operator::Lte)]
    #[case(">", Operator::Gt)]
    #[case(">=", Operator::Gte)]
    #[case("array-contains", Operator::ArrayContains)]
    #[case("array-contains-any", Operator::ArrayContainsAny)]
    #[case("in", Operator::In)]
    #[case("not-in", Operator::NotIn)]
    fn parses_store_operator_spellings(#[case] raw: &str, #[case] expected: Operator) {
        let parsed: Operator = raw.parse().expect("known operator");

        assert_eq!(parsed, expected);
        assert_eq!(parsed.as_str(), raw);
    }

    #[rstest]
    fn rejects_unknown_operator() {
        let err = Criterion::parse("name", "=~", "x").expect_err("unknown operator");

        assert!(err.is_invalid_argument());
    }

    #[rstest]
    fn builder_collects_criteria_in_order() {
        let query = QueryCriteria::builder("cities")
            .filter(Filter::eq("data.City", "Portland"))
            .filter(Filter::gte("data.Population", 10))
            .order_by("data.Population", SortDirection::Desc)
            .limit(5)
            .build();

        assert_eq!(query.collection, "cities");
        assert_eq!(query.criteria.len(), 2);
        assert_eq!(query.criteria[0].operator, Operator::Eq);
        assert_eq!(query.criteria[1].value, Bson::Int32(10));
        assert!(query.order_by.as_ref().is_some_and(Order::is_descending));
        assert_eq!(query.limit, Some(5));
        assert!(query.validate().is_ok());
    }

    #[rstest]
    #[case(QueryCriteria::new(""))]
    #[case(QueryCriteria::builder("c").filter(Filter::eq("", 1)).build())]
    #[case(QueryCriteria::builder("c").filter(Filter::any_of("tag", "x")).build())]
    #[case(QueryCriteria::builder("c").order_by("", SortDirection::Asc).build())]
    #[case(QueryCriteria::builder("c").limit(0).build())]
    fn validate_rejects_malformed_queries(#[case] query: QueryCriteria) {
        let err = query.validate().expect_err("malformed query");

        assert!(err.is_invalid_argument());
    }

    #[rstest]
    fn list_operators_accept_arrays() {
        let query = QueryCriteria::builder("c")
            .filter(Filter::any_of("tag", vec!["a", "b"]))
            .build();

        assert!(query.validate().is_ok());
    }

    #[rstest]
    fn vec_handler_appends_default_items() {
        let mut items: Vec<String> = Vec::new();
        let item = items.make_new();
        ResultHandler::append(&mut items, format!("{item}x"));

        assert_eq!(items, vec!["x".to_string()]);
    }

    #[rstest]
    fn fn_handler_uses_both_closures() {
        let mut seen = Vec::new();
        {
            let mut handler = handler_fn(|| 10, |item: i32| seen.push(item + 1));
            let item = handler.make_new();
            handler.append(item);
        }

        assert_eq!(seen, vec![11]);
    }

    struct Describe;

    impl CriteriaVisitor for Describe {
        type Output = String;
        type Error = DocumentStoreError;

        fn visit_all(&mut self, parts: Vec<String>) -> Result<String, DocumentStoreError> {
            Ok(parts.join(" AND "))
        }

        fn visit_field(&mut self, property: &str, op: &Operator, value: &Bson) -> Result<String, DocumentStoreError> {
            Ok(format!("{property} {op} {value}"))
        }
    }

    #[rstest]
    fn visitor_combines_criteria_with_and() {
        let criteria = vec![Filter::eq("a", 1), Filter::lt("b", 2)];

        let described = Describe.visit_criteria(&criteria).expect("visit");

        assert_eq!(described, "a == 1 AND b < 2");
    }
}
