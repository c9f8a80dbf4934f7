//! Database driver abstraction for the data mapper.
//!
//! The mapper never talks to a database directly. It goes through three traits that
//! together form the driver contract:
//!
//! - [`Driver`]: opens a [`Connection`] from a connection URI
//! - [`Connection`]: resolves collection handles and closes the connection
//! - [`CollectionHandle`]: runs queries and atomic single-document writes
//!
//! On top of a handle, [`DocumentCursor`] offers the chained
//! `find(filter).skip(n).sort(..).limit(n).project(..)` builder with terminal
//! [`to_vec`](DocumentCursor::to_vec) and [`next`](DocumentCursor::next) calls.
//!
//! # Examples
//!
//! ```ignore
//! use docmapper::driver::Driver;
//! use docmapper::query::{Filter, SortDirection, Sort};
//!
//! let connection = driver.connect("mongodb://localhost/test").await?;
//! let users = connection.collection("users");
//!
//! let adults = users
//!     .find(Some(Filter::gte("age", 18)))
//!     .sort(vec![Sort::new("name", SortDirection::Asc)])
//!     .limit(10)
//!     .to_vec()
//!     .await?;
//!
//! connection.close().await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{
    error::DataMapperResult,
    query::{Expr, Projection, QueryOptions, Sort},
};

/// Opens connections to a document database.
///
/// Implementations must be thread-safe; one driver value may back many mappers.
#[async_trait]
pub trait Driver: Send + Sync + Debug {
    /// Connects to the database identified by `uri`.
    ///
    /// # Errors
    ///
    /// Implementations report failures as
    /// [`DataMapperError::Connection`](crate::error::DataMapperError::Connection).
    async fn connect(&self, uri: &str) -> DataMapperResult<Box<dyn Connection>>;
}

/// An open database connection.
#[async_trait]
pub trait Connection: Send + Sync + Debug {
    /// Resolves a handle to the named collection. No I/O is performed.
    fn collection(&self, name: &str) -> Box<dyn CollectionHandle>;

    /// Closes the connection. Handles resolved from it must not be used afterwards.
    async fn close(&self) -> DataMapperResult<()>;
}

/// A handle to a single collection on an open connection.
///
/// Every method is a single driver round-trip. Failures are reported as
/// [`DataMapperError::Operation`](crate::error::DataMapperError::Operation).
#[async_trait]
pub trait CollectionHandle: Send + Sync + Debug {
    /// Returns every document selected by `options`, in the order the database yields them.
    ///
    /// The filter is applied first, then `skip`, `sorting` and `limit`, then the projection.
    async fn query_documents(&self, options: QueryOptions) -> DataMapperResult<Vec<Document>>;

    /// Inserts a new document. The identifier assigned by the database is not returned.
    async fn insert_document(&self, document: Document) -> DataMapperResult<()>;

    /// Atomically deletes the first document matching `filter` (in `sorting` order
    /// when given) and returns it, or `None` when nothing matches.
    async fn find_one_and_remove(
        &self,
        filter: Option<Expr>,
        sorting: Vec<Sort>,
    ) -> DataMapperResult<Option<Document>>;

    /// Atomically sets `fields` on the first document matching `filter` and returns the
    /// document as it is after the update, or `None` when nothing matches.
    async fn find_one_and_update(
        &self,
        filter: Option<Expr>,
        fields: Document,
    ) -> DataMapperResult<Option<Document>>;
}

impl<'c> dyn CollectionHandle + 'c {
    /// Starts a cursor over the documents matching `query`.
    pub fn find(&self, query: Option<Expr>) -> DocumentCursor<'_> {
        DocumentCursor::new(self, query)
    }
}

/// A lazily executed query against a collection handle.
///
/// Nothing is sent to the driver until [`to_vec`](Self::to_vec) or
/// [`next`](Self::next) is awaited.
#[derive(Debug)]
pub struct DocumentCursor<'a> {
    collection: &'a dyn CollectionHandle,
    options: QueryOptions,
}

impl<'a> DocumentCursor<'a> {
    pub fn new(collection: &'a dyn CollectionHandle, query: Option<Expr>) -> Self {
        Self {
            collection,
            options: QueryOptions { query, ..QueryOptions::default() },
        }
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    /// Replaces the sort keys of this cursor.
    pub fn sort(mut self, sorting: Vec<Sort>) -> Self {
        self.options.sorting = sorting;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.options.projection = Some(projection);
        self
    }

    /// The options this cursor will hand to the driver.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Executes the query and materializes every matching document.
    pub async fn to_vec(self) -> DataMapperResult<Vec<Document>> {
        self.collection
            .query_documents(self.options)
            .await
    }

    /// Executes the query with a limit of one and returns the first matching document.
    pub async fn next(mut self) -> DataMapperResult<Option<Document>> {
        self.options.limit = Some(1);

        Ok(self
            .collection
            .query_documents(self.options)
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, SortDirection};
    use bson::doc;
    use mockall::mock;
    use pretty_assertions::assert_eq;

    mock! {
        pub Collection {}

        #[async_trait]
        impl CollectionHandle for Collection {
            async fn query_documents(&self, options: QueryOptions) -> DataMapperResult<Vec<Document>>;
            async fn insert_document(&self, document: Document) -> DataMapperResult<()>;
            async fn find_one_and_remove(
                &self,
                filter: Option<Expr>,
                sorting: Vec<Sort>,
            ) -> DataMapperResult<Option<Document>>;
            async fn find_one_and_update(
                &self,
                filter: Option<Expr>,
                fields: Document,
            ) -> DataMapperResult<Option<Document>>;
        }
    }


    impl std::fmt::Debug for MockCollection {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("MockCollection")
        }
    }

    #[tokio::test]
    async fn test_next_requests_a_single_document() {
        let mut collection = MockCollection::new();
        collection
            .expect_query_documents()
            .withf(|options| options.limit == Some(1) && options.skip == Some(2) && options.sorting.len() == 1)
            .times(1)
            .returning(|_| Ok(vec![doc! { "name": "Alice" }]));
        let handle: &dyn CollectionHandle = &collection;

        let first = handle
            .find(Some(Filter::eq("active", true)))
            .skip(2)
            .sort(vec![Sort::new("name", SortDirection::Asc)])
            .limit(20)
            .next()
            .await
            .unwrap();

        assert_eq!(first, Some(doc! { "name": "Alice" }));
    }

    #[tokio::test]
    async fn test_to_vec_keeps_the_cursor_limit() {
        let mut collection = MockCollection::new();
        collection
            .expect_query_documents()
            .withf(|options| options.limit == Some(20))
            .times(1)
            .returning(|_| Ok(vec![]));
        let handle: &dyn CollectionHandle = &collection;

        assert!(handle.find(None).limit(20).to_vec().await.unwrap().is_empty());
    }
}
