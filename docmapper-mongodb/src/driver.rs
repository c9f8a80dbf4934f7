use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc};
use mongodb::{
    Client, Collection as MongoCollection, Database,
    options::{
        ClientOptions, FindOneAndDeleteOptions, FindOneAndUpdateOptions, FindOptions,
        ReturnDocument,
    },
};
use tracing::{debug, info};

use docmapper_core::{
    driver::{CollectionHandle, Connection, Driver},
    error::{DataMapperError, DataMapperResult},
    query::{Expr, QueryOptions, Sort},
};

use crate::query::{MongoQueryTranslator, projection_document, sort_document};

/// Database used when the connection URI names none.
pub const DEFAULT_DATABASE: &str = "test";

fn connection_error(e: mongodb::error::Error) -> DataMapperError {
    DataMapperError::Connection(e.to_string())
}

fn operation_error(e: mongodb::error::Error) -> DataMapperError {
    DataMapperError::Operation(e.to_string())
}

/// Driver backed by the official MongoDB client.
#[derive(Debug, Clone, Default)]
pub struct MongoDbDriver;

impl MongoDbDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for MongoDbDriver {
    async fn connect(&self, uri: &str) -> DataMapperResult<Box<dyn Connection>> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(connection_error)?;
        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(options).map_err(connection_error)?;

        // The client connects lazily; a ping surfaces unreachable servers here.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;

        info!(database = %database_name, "connected to MongoDB");

        Ok(Box::new(MongoDbConnection {
            database: client.database(&database_name),
            client,
        }))
    }
}

#[derive(Debug)]
pub struct MongoDbConnection {
    client: Client,
    database: Database,
}

#[async_trait]
impl Connection for MongoDbConnection {
    fn collection(&self, name: &str) -> Box<dyn CollectionHandle> {
        Box::new(MongoDbCollection {
            collection: self.database.collection(name),
        })
    }

    async fn close(&self) -> DataMapperResult<()> {
        self.client.clone().shutdown().await;

        info!(database = %self.database.name(), "MongoDB client shut down");

        Ok(())
    }
}

#[derive(Debug)]
pub struct MongoDbCollection {
    collection: MongoCollection<Document>,
}

#[async_trait]
impl CollectionHandle for MongoDbCollection {
    async fn query_documents(&self, query: QueryOptions) -> DataMapperResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(skip) = query.skip {
            options.skip = Some(skip);
        }
        if !query.sorting.is_empty() {
            options.sort = Some(sort_document(&query.sorting));
        }
        if let Some(limit) = query.limit {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(projection) = &query.projection {
            options.projection = Some(projection_document(projection));
        }

        let filter = MongoQueryTranslator::filter(query.query.as_ref())?;

        debug!(collection = %self.collection.name(), %filter, "find");

        self.collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(operation_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(operation_error)
    }

    async fn insert_document(&self, document: Document) -> DataMapperResult<()> {
        self.collection
            .insert_one(document)
            .await
            .map_err(operation_error)?;

        Ok(())
    }

    async fn find_one_and_remove(
        &self,
        filter: Option<Expr>,
        sorting: Vec<Sort>,
    ) -> DataMapperResult<Option<Document>> {
        let mut options = FindOneAndDeleteOptions::default();

        if !sorting.is_empty() {
            options.sort = Some(sort_document(&sorting));
        }

        self.collection
            .find_one_and_delete(MongoQueryTranslator::filter(filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(operation_error)
    }

    async fn find_one_and_update(
        &self,
        filter: Option<Expr>,
        fields: Document,
    ) -> DataMapperResult<Option<Document>> {
        let mut options = FindOneAndUpdateOptions::default();
        options.return_document = Some(ReturnDocument::After);

        self.collection
            .find_one_and_update(
                MongoQueryTranslator::filter(filter.as_ref())?,
                doc! { "$set": fields },
            )
            .with_options(options)
            .await
            .map_err(operation_error)
    }
}
