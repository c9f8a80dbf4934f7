//! Filter evaluation, ordering and projection for in-memory documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docmapper_core::{
    error::{DataMapperError, DataMapperResult},
    query::{Expr, FieldOp, Projection, QueryVisitor, Sort, SortDirection},
};

/// A BSON number. Integers compare exactly; doubles compare against integers by value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Number {
    Int(i64),
    Double(f64),
}

/// `2^63`, the first double above `i64::MAX`.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn cmp_int_double(int: i64, double: f64) -> Ordering {
    if double.is_nan() {
        return Ordering::Greater;
    }
    if double >= I64_UPPER {
        return Ordering::Less;
    }
    if double < -I64_UPPER {
        return Ordering::Greater;
    }

    let whole = double.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal if double > whole => Ordering::Less,
        Ordering::Equal if double < whole => Ordering::Greater,
        ordering => ordering,
    }
}

impl Number {
    /// Total order over numbers. NaN equals NaN and sorts below every other number.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(b),
            (Number::Double(a), Number::Double(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
            (Number::Int(a), Number::Double(b)) => cmp_int_double(*a, *b),
            (Number::Double(a), Number::Int(b)) => cmp_int_double(*b, *a).reverse(),
        }
    }
}

/// Comparable view over a BSON value.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(Number),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(Number::Int(i64::from(*value))),
            Bson::Int64(value) => Comparable::Number(Number::Int(*value)),
            Bson::Double(value) => Comparable::Number(Number::Double(*value)),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect()
            ),
            _ => Comparable::Null,
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in BSON comparison order.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Total order used for sorting. Values of different types order by type rank.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.sort_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Comparable::Map(_), Comparable::Map(_)) => Ordering::Equal,
            _ => self
                .partial_cmp(other)
                .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank())),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b).is_eq(),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => Some(a.total_cmp(b)),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted path (`address.city`) inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DataMapperResult<bool> {
        self.visit_expr(expr)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: &Expr,
    ) -> DataMapperResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(expr)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    /// Index of the first document matching `filter`. With no filter the first document matches.
    pub fn first_match(documents: &[Document], filter: Option<&Expr>) -> DataMapperResult<Option<usize>> {
        let Some(expr) = filter else {
            return Ok(if documents.is_empty() { None } else { Some(0) });
        };

        for (index, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).evaluate(expr)? {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }
}

/// Equality as a query sees it: the value itself, or any element of an array field.
fn element_matches(field: &Comparable<'_>, value: &Comparable<'_>) -> bool {
    field == value || matches!(field, Comparable::Array(items) if items.iter().any(|item| item == value))
}

fn has_substring(field: &Comparable<'_>, needle: &str) -> bool {
    match field {
        Comparable::String(value) => value.contains(needle),
        Comparable::Array(items) => items
            .iter()
            .any(|item| matches!(item, Comparable::String(value) if value.contains(needle))),
        _ => false,
    }
}

/// An array needle requires every element; a string needle is a substring match.
fn contains(field: &Comparable<'_>, needle: &Comparable<'_>) -> bool {
    match needle {
        Comparable::Array(values) => {
            !values.is_empty() && values.iter().all(|value| element_matches(field, value))
        }
        Comparable::String(value) => has_substring(field, value),
        other => matches!(field, Comparable::Array(_)) && element_matches(field, other),
    }
}

/// An array needle rejects any shared element.
fn not_contains(field: &Comparable<'_>, needle: &Comparable<'_>) -> bool {
    match needle {
        Comparable::Array(values) => !values.iter().any(|value| element_matches(field, value)),
        Comparable::String(value) => !has_substring(field, value),
        other => !element_matches(field, other),
    }
}

fn any_of(field: &Comparable<'_>, candidates: &Comparable<'_>) -> bool {
    match (field, candidates) {
        (Comparable::Array(items), Comparable::Array(values)) => {
            values.iter().any(|value| items.iter().any(|item| item == value))
        }
        (Comparable::Array(items), single) => items.iter().any(|item| item == single),
        (single, Comparable::Array(values)) => values.iter().any(|value| value == single),
        (left, right) => left == right,
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DataMapperError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(lookup(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = lookup(self.document, field) else {
            // Missing fields only satisfy the negative operators.
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => element_matches(&left, &right),
            FieldOp::Ne => !element_matches(&left, &right),
            FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
            FieldOp::Gte => matches!(left.partial_cmp(&right), Some(Ordering::Greater | Ordering::Equal)),
            FieldOp::Lt => left.partial_cmp(&right) == Some(Ordering::Less),
            FieldOp::Lte => matches!(left.partial_cmp(&right), Some(Ordering::Less | Ordering::Equal)),
            FieldOp::Contains => contains(&left, &right),
            FieldOp::NotContains => not_contains(&left, &right),
            FieldOp::StartsWith => match (left, right) {
                (Comparable::String(left), Comparable::String(right)) => left.starts_with(right),
                _ => false,
            },
            FieldOp::EndsWith => match (left, right) {
                (Comparable::String(left), Comparable::String(right)) => left.ends_with(right),
                _ => false,
            },
            FieldOp::AnyOf => any_of(&left, &right),
            FieldOp::NoneOf => !any_of(&left, &right),
        })
    }
}

/// Compares two documents by the given sort keys, earlier keys first.
///
/// Missing fields sort as null, before every other value in ascending order.
pub(crate) fn compare_documents(a: &Document, b: &Document, sorting: &[Sort]) -> Ordering {
    for sort in sorting {
        let left = lookup(a, &sort.field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = lookup(b, &sort.field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match sort.direction {
            SortDirection::Asc => left.sort_cmp(&right),
            SortDirection::Desc => right.sort_cmp(&left),
        };

        if ordering.is_ne() {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Shapes a document with a projection over top-level fields.
pub(crate) fn project(document: Document, projection: &Projection) -> Document {
    match projection {
        Projection::Include { fields, with_id } => document
            .into_iter()
            .filter(|(key, _)| (*with_id && key == "_id") || fields.iter().any(|field| field == key))
            .collect(),
        Projection::Exclude(fields) => document
            .into_iter()
            .filter(|(key, _)| !fields.iter().any(|field| field == key))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmapper_core::query::Filter;
    use pretty_assertions::assert_eq;

    fn matches(document: &Document, expr: Expr) -> bool {
        DocumentEvaluator::new(document).evaluate(&expr).unwrap()
    }

    #[test]
    fn test_comparison_operators_normalize_numbers() {
        let document = doc! { "age": 30_i64, "score": 4.5 };

        assert!(matches(&document, Filter::eq("age", 30)));
        assert!(matches(&document, Filter::gt("score", 4)));
        assert!(matches(&document, Filter::lte("age", 30.0)));
        assert!(!matches(&document, Filter::lt("age", 30)));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let document = doc! { "n": 9_007_199_254_740_993_i64 };

        assert!(!matches(&document, Filter::eq("n", 9_007_199_254_740_992_i64)));
        assert!(matches(&document, Filter::gt("n", 9_007_199_254_740_992_i64)));
        assert!(matches(&document, Filter::eq("n", 9_007_199_254_740_993_i64)));
        assert!(matches(&document, Filter::gt("n", 9_007_199_254_740_992.0)));
    }

    #[test]
    fn test_number_order_is_total() {
        // Equal rank means equal value.
        let values = [
            (0, Number::Double(f64::NAN)),
            (1, Number::Double(f64::NEG_INFINITY)),
            (2, Number::Int(i64::MIN)),
            (3, Number::Double(-0.5)),
            (4, Number::Int(0)),
            (4, Number::Double(0.0)),
            (5, Number::Double(2.5)),
            (6, Number::Int(3)),
            (7, Number::Int(i64::MAX)),
            (8, Number::Double(I64_UPPER)),
            (9, Number::Double(f64::INFINITY)),
        ];

        for (rank_a, a) in &values {
            for (rank_b, b) in &values {
                assert_eq!(a.total_cmp(b), rank_a.cmp(rank_b), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_sort_with_nan_values() {
        let mut documents: Vec<Document> = (0..40)
            .map(|n| if n % 3 == 0 { doc! { "v": f64::NAN, "n": n } } else { doc! { "v": 40 - n, "n": n } })
            .collect();
        let sorting = [Sort::new("v", SortDirection::Asc)];

        documents.sort_by(|a, b| compare_documents(a, b, &sorting));

        let nan_count = (0..40).filter(|n| n % 3 == 0).count();
        assert!(documents[..nan_count].iter().all(|d| d.get_f64("v").is_ok_and(f64::is_nan)));
        let rest: Vec<i32> = documents[nan_count..].iter().map(|d| d.get_i32("v").unwrap()).collect();
        assert!(rest.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_contains_with_array_needs_every_element() {
        let document = doc! { "tags": ["rust", "db", "x"] };

        assert!(matches(&document, Filter::contains("tags", vec!["rust", "db"])));
        assert!(!matches(&document, Filter::contains("tags", vec!["rust", "zzz"])));
        assert!(!matches(&document, Filter::contains("tags", Vec::<&str>::new())));
        assert!(matches(&document, Filter::contains("tags", "us")));
    }

    #[test]
    fn test_not_contains_with_array_rejects_any_element() {
        let document = doc! { "tags": ["rust", "db", "x"] };

        assert!(!matches(&document, Filter::not_contains("tags", vec!["zzz", "db"])));
        assert!(matches(&document, Filter::not_contains("tags", vec!["zzz", "yyy"])));
        assert!(matches(&doc! { "name": "Alice" }, Filter::not_contains("tags", vec!["db"])));
    }

    #[test]
    fn test_eq_matches_array_elements() {
        let document = doc! { "tags": ["rust", "db"] };

        assert!(matches(&document, Filter::eq("tags", "db")));
        assert!(!matches(&document, Filter::ne("tags", "db")));
        assert!(matches(&document, Filter::eq("tags", vec!["rust", "db"])));
    }

    #[test]
    fn test_missing_fields() {
        let document = doc! { "name": "Alice" };

        assert!(!matches(&document, Filter::eq("age", 30)));
        assert!(matches(&document, Filter::ne("age", 30)));
        assert!(matches(&document, Filter::not_exists("age")));
    }

    #[test]
    fn test_dotted_paths() {
        let document = doc! { "address": { "city": "Oslo" } };

        assert!(matches(&document, Filter::eq("address.city", "Oslo")));
        assert!(matches(&document, Filter::exists("address.city")));
        assert!(!matches(&document, Filter::exists("address.zip")));
    }

    #[test]
    fn test_logical_operators() {
        let document = doc! { "name": "Alice", "age": 30 };

        assert!(matches(&document, Filter::eq("name", "Alice").and(Filter::gte("age", 18))));
        assert!(matches(&document, Filter::eq("name", "Bob").or(Filter::eq("age", 30))));
        assert!(matches(&document, Filter::not(Filter::starts_with("name", "B"))));
        assert!(matches(&document, Filter::any_of("name", vec!["Alice", "Bob"])));
        assert!(matches(&document, Filter::none_of("name", vec!["Carol"])));
    }

    #[test]
    fn test_compare_documents_uses_keys_in_order() {
        let a = doc! { "last": "Smith", "age": 40 };
        let b = doc! { "last": "Smith", "age": 30 };
        let sorting = [
            Sort::new("last", SortDirection::Asc),
            Sort::new("age", SortDirection::Asc),
        ];

        assert_eq!(compare_documents(&a, &b, &sorting), Ordering::Greater);
        assert_eq!(compare_documents(&a, &a, &sorting), Ordering::Equal);
    }

    #[test]
    fn test_missing_sort_field_sorts_first() {
        let missing = doc! { "name": "x" };
        let present = doc! { "name": "y", "age": 1 };
        let sorting = [Sort::new("age", SortDirection::Asc)];

        assert_eq!(compare_documents(&missing, &present, &sorting), Ordering::Less);
    }

    #[test]
    fn test_projection_keeps_id_in_inclusion_mode() {
        let document = doc! { "_id": 1, "name": "Alice", "age": 30 };

        assert_eq!(project(document.clone(), &Projection::include(["name"])), doc! { "_id": 1, "name": "Alice" });
        assert_eq!(project(document.clone(), &Projection::include(["name"]).without_id()), doc! { "name": "Alice" });
        assert_eq!(project(document, &Projection::exclude(["age"])), doc! { "_id": 1, "name": "Alice" });
    }
}
