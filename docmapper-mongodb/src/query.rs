//! Translation of docmapper query options into MongoDB query syntax.

use bson::{Bson, Document, doc};

use docmapper_core::{
    error::DataMapperError,
    query::{Expr, FieldOp, Projection, QueryVisitor, Sort, SortDirection},
};

/// Translates filter expressions into MongoDB filter documents.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Filter document for an optional expression. `None` matches everything.
    pub fn filter(query: Option<&Expr>) -> Result<Document, DataMapperError> {
        match query {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn operand_error(op: &str, expected: &str) -> DataMapperError {
    DataMapperError::Operation(format!("{op} operator requires {expected} value"))
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DataMapperError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    // `$not` is only valid inside a field predicate; `$nor` negates a whole expression.
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": escape_regex(s) },
                    Bson::Array(arr) => doc! { "$all": arr },
                    other => doc! { "$elemMatch": { "$eq": other } },
                },
                FieldOp::NotContains => match value {
                    Bson::String(s) => doc! { "$not": { "$regex": escape_regex(s) } },
                    Bson::Array(arr) => doc! { "$nin": arr },
                    other => doc! { "$ne": other },
                },
                FieldOp::StartsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("^{}", escape_regex(s)) },
                    _ => return Err(operand_error("StartsWith", "a string")),
                },
                FieldOp::EndsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("{}$", escape_regex(s)) },
                    _ => return Err(operand_error("EndsWith", "a string")),
                },
                FieldOp::AnyOf => match value {
                    Bson::Array(arr) => doc! { "$in": arr },
                    other => doc! { "$in": [other] },
                },
                FieldOp::NoneOf => match value {
                    Bson::Array(arr) => doc! { "$nin": arr },
                    other => doc! { "$nin": [other] },
                },
            }
        })
    }
}

/// Sort document with keys in precedence order.
pub(crate) fn sort_document(sorting: &[Sort]) -> Document {
    sorting
        .iter()
        .map(|sort| {
            let direction = match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            (sort.field.clone(), Bson::Int32(direction))
        })
        .collect()
}

pub(crate) fn projection_document(projection: &Projection) -> Document {
    match projection {
        Projection::Include { fields, with_id } => {
            let mut document: Document = fields
                .iter()
                .map(|field| (field.clone(), Bson::Int32(1)))
                .collect();
            if !with_id {
                document.insert("_id", 0);
            }
            document
        }
        Projection::Exclude(fields) => fields
            .iter()
            .map(|field| (field.clone(), Bson::Int32(0)))
            .collect(),
    }
}
