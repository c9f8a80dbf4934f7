//! Query options and the filter expression API handed to drivers.
//!
//! A [`QueryOptions`] value carries everything a driver needs to build a cursor:
//! a filter predicate, pagination (`skip`, `limit`), ordering and a projection.
//! Every field is optional and absence means "no-op".
//!
//! ```ignore
//! use docmapper::query::{Filter, QueryOptions, SortDirection};
//!
//! let options = QueryOptions::builder()
//!     .query(Filter::eq("status", "active").and(Filter::gt("age", 18)))
//!     .skip(20)
//!     .limit(10)
//!     .sort("created_at", SortDirection::Desc)
//!     .project(Projection::include(["name", "age"]))
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static constructors for filter expressions:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - String: `starts_with`, `ends_with`, `contains`, `not_contains`
//! - Existence: `exists`, `not_exists`
//! - Array: `any_of`, `none_of`
//! - Logical: `and`, `or`, `not`
//!
//! Drivers consume expressions through [`QueryVisitor`].

use bson::{Bson, Document};

use crate::error::DataMapperError;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// One sort key. Queries carry an ordered list of these; earlier keys take precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Sort { field: field.into(), direction }
    }
}

/// Which fields to return. Applied after pagination.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Return only the listed fields (plus `_id`, unless it is explicitly excluded
    /// through [`Projection::without_id`]).
    Include { fields: Vec<String>, with_id: bool },
    /// Return every field except the listed ones.
    Exclude(Vec<String>),
}

impl Projection {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include {
            fields: fields.into_iter().map(Into::into).collect(),
            with_id: true,
        }
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Drops `_id` from an inclusion projection. No effect on exclusions.
    pub fn without_id(self) -> Self {
        match self {
            Projection::Include { fields, .. } => Projection::Include { fields, with_id: false },
            other => other,
        }
    }
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// String or array contains value.
    Contains,
    /// String or array does not contain value.
    NotContains,
    /// String starts with value.
    StartsWith,
    /// String ends with value.
    EndsWith,
    /// Field matches any of the values.
    AnyOf,
    /// Field matches none of the values.
    NoneOf,
}

/// A filter expression for selecting documents.
///
/// Expressions can be combined using logical operators (`And`, `Or`, `Not`)
/// to build complex filter predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Static constructors for filter expressions.
///
/// ```ignore
/// let expr = Filter::eq("name", "Alice").and(Filter::gt("age", 18));
/// ```
pub struct Filter;

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    /// Matches documents where the field (string or array) contains the value.
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NotContains, value.into())
    }

    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    pub fn not(expr: Expr) -> Expr {
        expr.not()
    }

    /// Matches documents where the field equals any of the given values
    /// (or, for array fields, shares at least one element with them).
    pub fn any_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, value.into())
    }

    pub fn none_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, value.into())
    }
}

/// Cursor options for `find`, `find_one` and `remove`.
///
/// Drivers apply them in a fixed order: filter first, then `skip`/`sorting`/`limit`,
/// then `projection`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Filter predicate. `None` matches every document.
    pub query: Option<Expr>,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Sort keys. Empty means natural order.
    pub sorting: Vec<Sort>,
    /// Field projection. `None` returns all fields.
    pub projection: Option<Projection>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for options that only carry a filter.
    pub fn filter(query: Expr) -> Self {
        QueryOptions { query: Some(query), ..Self::default() }
    }

    pub fn builder() -> QueryOptionsBuilder {
        QueryOptionsBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptionsBuilder {
    options: QueryOptions,
}

impl QueryOptionsBuilder {
    pub fn new() -> Self {
        QueryOptionsBuilder { options: QueryOptions::default() }
    }

    /// Sets the filter predicate.
    pub fn query(mut self, query: Expr) -> Self {
        self.options.query = Some(query);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Appends a sort key. Call repeatedly for compound ordering.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.options.sorting.push(Sort::new(field, direction));
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.options.projection = Some(projection);
        self
    }

    pub fn build(self) -> QueryOptions {
        self.options
    }
}

/// Arguments for an atomic find-and-update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Selects the document to update. `None` matches the first document.
    pub query: Option<Expr>,
    /// Top-level fields to set on the matched document.
    pub fields: Document,
}

impl UpdateOptions {
    pub fn new(query: impl Into<Option<Expr>>, fields: Document) -> Self {
        UpdateOptions { query: query.into(), fields }
    }
}

/// Walks a filter expression. Drivers implement this to translate or evaluate filters.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DataMapperError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
