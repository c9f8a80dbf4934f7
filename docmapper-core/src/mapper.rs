//! The connection-scoped data mapper.
//!
//! A [`DataMapper`] wraps one collection on one connection. It is built from
//! [`MapperOptions`], starts uninitialized, and only touches the database between
//! [`Lifecycle::initialize`] and [`Lifecycle::destroy`].
//!
//! # Example
//!
//! ```ignore
//! use docmapper::prelude::*;
//! use docmapper::memory::InMemoryDriver;
//! use bson::doc;
//!
//! let mut mapper = DataMapper::new(
//!     MapperOptions::builder()
//!         .driver(InMemoryDriver::new())
//!         .connection_uri("memory://app")
//!         .collection_name("users")
//!         .build(),
//! )?;
//!
//! mapper.initialize().await?;
//! mapper.create(doc! { "name": "Alice" }).await?;
//! let users = mapper.find(QueryOptions::default()).await?;
//! mapper.destroy().await?;
//! ```

use async_trait::async_trait;
use bson::Document;
use tracing::{debug, info};

use crate::{
    config::{MapperOptions, ResolvedOptions, redact_uri},
    driver::{CollectionHandle, Connection, DocumentCursor},
    error::{DataMapperError, DataMapperResult},
    lifecycle::{DocumentMapper, Lifecycle},
    query::{QueryOptions, UpdateOptions},
};

#[derive(Debug)]
enum ConnectionState {
    Uninitialized,
    Initialized {
        connection: Box<dyn Connection>,
        collection: Box<dyn CollectionHandle>,
    },
}

/// Data mapper over a single collection.
#[derive(Debug)]
pub struct DataMapper {
    options: ResolvedOptions,
    state: ConnectionState,
}

impl DataMapper {
    /// Validates `options` and returns an uninitialized mapper. No I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`DataMapperError::Configuration`] naming the first missing option, checked
    /// in the order `options`, `options.connection_uri`, `options.collection_name`,
    /// `options.driver`.
    pub fn new(options: impl Into<Option<MapperOptions>>) -> DataMapperResult<Self> {
        Ok(Self {
            options: MapperOptions::resolve(options.into())?,
            state: ConnectionState::Uninitialized,
        })
    }

    pub fn connection_uri(&self) -> &str {
        &self.options.connection_uri
    }

    pub fn collection_name(&self) -> &str {
        &self.options.collection_name
    }

    fn collection(&self) -> DataMapperResult<&dyn CollectionHandle> {
        match &self.state {
            ConnectionState::Initialized { collection, .. } => Ok(collection.as_ref()),
            ConnectionState::Uninitialized => Err(DataMapperError::NotInitialized),
        }
    }
}

/// Builds the cursor for `options`: filter, then skip, sort, limit, then projection.
fn cursor(collection: &dyn CollectionHandle, options: QueryOptions) -> DocumentCursor<'_> {
    let mut cursor = collection.find(options.query);

    if let Some(skip) = options.skip {
        cursor = cursor.skip(skip);
    }
    if !options.sorting.is_empty() {
        cursor = cursor.sort(options.sorting);
    }
    if let Some(limit) = options.limit {
        cursor = cursor.limit(limit);
    }
    if let Some(projection) = options.projection {
        cursor = cursor.project(projection);
    }

    cursor
}

#[async_trait]
impl Lifecycle for DataMapper {
    async fn initialize(&mut self) -> DataMapperResult<()> {
        if self.is_initialized() {
            return Err(DataMapperError::AlreadyInitialized);
        }

        let connection = self
            .options
            .driver
            .connect(&self.options.connection_uri)
            .await?;
        let collection = connection.collection(&self.options.collection_name);

        info!(
            uri = %redact_uri(&self.options.connection_uri),
            collection = %self.options.collection_name,
            "data mapper initialized"
        );

        self.state = ConnectionState::Initialized { connection, collection };

        Ok(())
    }

    async fn destroy(&mut self) -> DataMapperResult<()> {
        match &self.state {
            ConnectionState::Initialized { connection, .. } => connection.close().await?,
            ConnectionState::Uninitialized => return Err(DataMapperError::NotInitialized),
        }

        self.state = ConnectionState::Uninitialized;

        info!(
            uri = %redact_uri(&self.options.connection_uri),
            collection = %self.options.collection_name,
            "data mapper destroyed"
        );

        Ok(())
    }

    fn is_initialized(&self) -> bool {
        matches!(self.state, ConnectionState::Initialized { .. })
    }
}

#[async_trait]
impl DocumentMapper for DataMapper {
    async fn find(&self, options: QueryOptions) -> DataMapperResult<Vec<Document>> {
        let documents = cursor(self.collection()?, options)
            .to_vec()
            .await?;

        debug!(collection = %self.options.collection_name, count = documents.len(), "find");

        Ok(documents
            .into_iter()
            .map(|document| self.options.transform.apply(document))
            .collect())
    }

    async fn find_one(&self, options: QueryOptions) -> DataMapperResult<Option<Document>> {
        let document = cursor(self.collection()?, options)
            .next()
            .await?;

        debug!(collection = %self.options.collection_name, found = document.is_some(), "find_one");

        Ok(self.options.transform.apply_opt(document))
    }

    async fn create(&self, fields: Document) -> DataMapperResult<()> {
        let collection = self.collection()?;

        collection
            .insert_document(self.options.transform.apply(fields))
            .await?;

        debug!(collection = %self.options.collection_name, "create");

        Ok(())
    }

    async fn remove(&self, options: QueryOptions) -> DataMapperResult<()> {
        let removed = self
            .collection()?
            .find_one_and_remove(options.query, options.sorting)
            .await?;

        debug!(collection = %self.options.collection_name, removed = removed.is_some(), "remove");

        Ok(())
    }

    async fn update(&self, options: UpdateOptions) -> DataMapperResult<Option<Document>> {
        let collection = self.collection()?;
        let fields = self.options.transform.apply(options.fields);

        let updated = collection
            .find_one_and_update(options.query, fields)
            .await?;

        debug!(collection = %self.options.collection_name, updated = updated.is_some(), "update");

        Ok(self.options.transform.apply_opt(updated))
    }
}
