//! In-memory driver.
//!
//! Documents live in a process-wide map keyed by connection URI and collection name,
//! guarded by an async-aware read-write lock. Every clone of an [`InMemoryDriver`]
//! shares the same data, so two mappers built on one driver and the same URI see each
//! other's writes.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;
use tracing::debug;

use docmapper_core::{
    config::redact_uri,
    driver::{CollectionHandle, Connection, Driver},
    error::{DataMapperError, DataMapperResult},
    query::{Expr, QueryOptions, Sort},
};

use crate::evaluator::{DocumentEvaluator, compare_documents, project};

type CollectionMap = HashMap<String, Vec<Document>>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory driver.
///
/// # Example
///
/// ```ignore
/// use docmapper_memory::InMemoryDriver;
/// use docmapper_core::driver::Driver;
/// use bson::doc;
///
/// let driver = InMemoryDriver::new();
/// let connection = driver.connect("memory://app").await?;
/// let users = connection.collection("users");
///
/// users.insert_document(doc! { "name": "Alice" }).await?;
/// assert_eq!(users.find(None).to_vec().await?.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryDriver {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryDriver {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }
}

#[async_trait]
impl Driver for InMemoryDriver {
    async fn connect(&self, uri: &str) -> DataMapperResult<Box<dyn Connection>> {
        if !uri.contains("://") {
            return Err(DataMapperError::Connection(format!("invalid connection uri `{uri}`")));
        }

        debug!(uri = %redact_uri(uri), "memory connection opened");

        Ok(Box::new(InMemoryConnection {
            uri: uri.to_string(),
            store: self.store.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

/// A connection handed out by [`InMemoryDriver`].
#[derive(Debug)]
pub struct InMemoryConnection {
    uri: String,
    store: Arc<RwLock<StoreMap>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for InMemoryConnection {
    fn collection(&self, name: &str) -> Box<dyn CollectionHandle> {
        Box::new(InMemoryCollection {
            uri: self.uri.clone(),
            name: name.to_string(),
            store: self.store.clone(),
            closed: self.closed.clone(),
        })
    }

    async fn close(&self) -> DataMapperResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(DataMapperError::Connection("connection is already closed".into()));
        }

        debug!(uri = %redact_uri(&self.uri), "memory connection closed");

        Ok(())
    }
}

/// A collection on an [`InMemoryConnection`]. Documents are kept in insertion order.
#[derive(Debug)]
pub struct InMemoryCollection {
    uri: String,
    name: String,
    store: Arc<RwLock<StoreMap>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryCollection {
    fn ensure_open(&self) -> DataMapperResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DataMapperError::Operation(format!(
                "collection `{}` used after its connection was closed",
                self.name
            )));
        }

        Ok(())
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Writes `value` at a dotted path, creating missing intermediate documents.
fn set_path(document: &mut Document, path: &str, value: Bson) -> DataMapperResult<()> {
    if path.split('.').any(str::is_empty) {
        return Err(DataMapperError::Operation(format!(
            "the update path '{path}' contains an empty field name, which is not allowed"
        )));
    }

    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => match document.entry(head.to_string()).or_insert_with(|| Document::new().into()) {
            Bson::Document(child) => set_path(child, rest, value),
            other => Err(DataMapperError::Operation(format!(
                "cannot create field '{rest}' in element {{{head}: {other}}}"
            ))),
        },
    }
}

#[async_trait]
impl CollectionHandle for InMemoryCollection {
    async fn query_documents(&self, options: QueryOptions) -> DataMapperResult<Vec<Document>> {
        self.ensure_open()?;

        let store = self.store.read().await;
        let Some(documents) = store.get(&self.uri).and_then(|collections| collections.get(&self.name)) else {
            return Ok(vec![]);
        };

        let mut matched = match &options.query {
            Some(filter) => DocumentEvaluator::filter_documents(documents, filter)?,
            None => documents.clone(),
        };

        if !options.sorting.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &options.sorting));
        }

        // A limit of zero means no limit.
        let limit = match options.limit {
            Some(0) | None => usize::MAX,
            Some(limit) => to_usize(limit),
        };

        Ok(
            matched
                .into_iter()
                .skip(to_usize(options.skip.unwrap_or(0)))
                .take(limit)
                .map(|document| match &options.projection {
                    Some(projection) => project(document, projection),
                    None => document,
                })
                .collect()
        )
    }

    async fn insert_document(&self, document: Document) -> DataMapperResult<()> {
        self.ensure_open()?;

        let mut store = self.store.write().await;
        let documents = store
            .entry(self.uri.clone())
            .or_default()
            .entry(self.name.clone())
            .or_default();

        let stored = match document.get("_id") {
            Some(id) => {
                if documents.iter().any(|existing| existing.get("_id") == Some(id)) {
                    return Err(DataMapperError::Operation(format!(
                        "duplicate key in collection `{}`: _id {id}",
                        self.name
                    )));
                }
                document
            }
            None => {
                let mut stored = Document::new();
                stored.insert("_id", ObjectId::new());
                for (key, value) in document {
                    stored.insert(key, value);
                }
                stored
            }
        };

        documents.push(stored);

        Ok(())
    }

    async fn find_one_and_remove(
        &self,
        filter: Option<Expr>,
        sorting: Vec<Sort>,
    ) -> DataMapperResult<Option<Document>> {
        self.ensure_open()?;

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(&self.uri).and_then(|collections| collections.get_mut(&self.name)) else {
            return Ok(None);
        };

        let index = if sorting.is_empty() {
            DocumentEvaluator::first_match(documents, filter.as_ref())?
        } else {
            let mut candidates = Vec::new();
            for (index, document) in documents.iter().enumerate() {
                let selected = match &filter {
                    Some(expr) => DocumentEvaluator::new(document).evaluate(expr)?,
                    None => true,
                };
                if selected {
                    candidates.push(index);
                }
            }

            candidates
                .into_iter()
                .min_by(|a, b| compare_documents(&documents[*a], &documents[*b], &sorting))
        };

        Ok(index.map(|index| documents.remove(index)))
    }

    /// Applies `fields` with `$set` semantics: dotted keys address nested fields and an
    /// empty update is rejected. The stored document is left untouched when any path fails.
    async fn find_one_and_update(
        &self,
        filter: Option<Expr>,
        fields: Document,
    ) -> DataMapperResult<Option<Document>> {
        self.ensure_open()?;

        if fields.is_empty() {
            return Err(DataMapperError::Operation(
                "'$set' is empty. You must specify a field like so: {$set: {<field>: ...}}".into(),
            ));
        }

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(&self.uri).and_then(|collections| collections.get_mut(&self.name)) else {
            return Ok(None);
        };

        let Some(index) = DocumentEvaluator::first_match(documents, filter.as_ref())? else {
            return Ok(None);
        };

        let mut updated = documents[index].clone();

        for (path, value) in fields {
            set_path(&mut updated, &path, value)?;
        }

        if updated.get("_id") != documents[index].get("_id") {
            return Err(DataMapperError::Operation(
                "performing an update on the path '_id' would modify the immutable field '_id'".into(),
            ));
        }

        documents[index] = updated.clone();

        Ok(Some(updated))
    }
}
