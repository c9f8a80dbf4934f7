//! Capability traits implemented by data mappers.
//!
//! A mapper exposes two small interfaces: [`Lifecycle`] for connection management and
//! [`DocumentMapper`] for CRUD. Lifecycle transitions take `&mut self`, so they cannot
//! overlap with each other or with in-flight CRUD calls; CRUD takes `&self` and may run
//! concurrently over the same connection.

use async_trait::async_trait;
use bson::Document;

use crate::{
    error::DataMapperResult,
    query::{QueryOptions, UpdateOptions},
};

/// Two-phase connection lifecycle: `Uninitialized -> Initialized -> Uninitialized`.
#[async_trait]
pub trait Lifecycle: Send {
    /// Opens the connection and resolves the collection handle.
    ///
    /// # Errors
    ///
    /// Returns [`DataMapperError::AlreadyInitialized`](crate::error::DataMapperError::AlreadyInitialized)
    /// if called twice, or whatever the driver reports when connecting fails. On failure
    /// the mapper stays uninitialized.
    async fn initialize(&mut self) -> DataMapperResult<()>;

    /// Closes the connection opened by [`initialize`](Self::initialize) and releases the
    /// collection handle.
    ///
    /// # Errors
    ///
    /// Returns [`DataMapperError::NotInitialized`](crate::error::DataMapperError::NotInitialized)
    /// if there is no open connection, or whatever the driver reports when closing fails.
    /// On failure the mapper stays initialized.
    async fn destroy(&mut self) -> DataMapperResult<()>;

    fn is_initialized(&self) -> bool;
}

/// CRUD over a single collection, with a transform applied at the boundary.
///
/// All methods require an initialized mapper and fail with
/// [`DataMapperError::NotInitialized`](crate::error::DataMapperError::NotInitialized) otherwise.
#[async_trait]
pub trait DocumentMapper: Send + Sync {
    /// Returns every document selected by `options`, transformed, in driver order.
    async fn find(&self, options: QueryOptions) -> DataMapperResult<Vec<Document>>;

    /// Returns the first document selected by `options`, transformed.
    ///
    /// The caller's `limit` is ignored; at most one document is requested.
    async fn find_one(&self, options: QueryOptions) -> DataMapperResult<Option<Document>>;

    /// Transforms `fields` and inserts the result as a new document.
    async fn create(&self, fields: Document) -> DataMapperResult<()>;

    /// Atomically deletes one document matching `options.query`. No match is not an error.
    async fn remove(&self, options: QueryOptions) -> DataMapperResult<()>;

    /// Transforms `options.fields`, applies them to one document matching `options.query`
    /// and returns the transformed post-update document, or `None` if nothing matched.
    async fn update(&self, options: UpdateOptions) -> DataMapperResult<Option<Document>>;
}
