//! Main docmapper crate: a connection-scoped data mapper over one document collection.
//!
//! This crate is the entry point for users of docmapper. It re-exports the core types
//! and the bundled drivers, and provides [`create_data_mapper`], which fills in the
//! default MongoDB driver when none is configured.
//!
//! # Features
//!
//! - **Two-phase lifecycle** - Construct without I/O, then `initialize` and `destroy` explicitly
//! - **Boundary transform** - One `Document -> Document` function applied on the way in and out
//! - **Pluggable drivers** - MongoDB by default, an in-memory driver for tests
//!
//! # Quick Start
//!
//! ```ignore
//! use docmapper::prelude::*;
//! use docmapper::bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DataMapperResult<()> {
//!     let mut mapper = create_data_mapper(
//!         MapperOptions::from_json(r#"{
//!             "connectionUri": "mongodb://localhost/test",
//!             "collectionName": "docs"
//!         }"#)?
//!         .with_transform(|mut doc| {
//!             doc.remove("_id");
//!             doc
//!         }),
//!     )?;
//!
//!     mapper.initialize().await?;
//!
//!     mapper.create(doc! { "title": "hello", "views": 0 }).await?;
//!
//!     let updated = mapper
//!         .update(UpdateOptions::new(Filter::eq("title", "hello"), doc! { "views": 1 }))
//!         .await?;
//!     println!("updated: {updated:?}");
//!
//!     let popular = mapper
//!         .find(
//!             QueryOptions::builder()
//!                 .query(Filter::gte("views", 1))
//!                 .sort("views", SortDirection::Desc)
//!                 .limit(10)
//!                 .build(),
//!         )
//!         .await?;
//!     println!("popular: {popular:?}");
//!
//!     mapper.remove(QueryOptions::filter(Filter::eq("title", "hello"))).await?;
//!     mapper.destroy().await
//! }
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - In-memory driver for development and testing
//! - [`mongodb`] - MongoDB driver (requires the `mongodb` feature, on by default)

pub mod prelude;

pub use docmapper_core::{config, document, driver, error, lifecycle, mapper, query};

// Re-export BSON types for convenience
pub use bson;

use docmapper_core::{config::MapperOptions, error::DataMapperResult, mapper::DataMapper};

/// In-memory driver implementations.
pub mod memory {
    pub use docmapper_memory::{InMemoryCollection, InMemoryConnection, InMemoryDriver};
}

/// MongoDB driver implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmapper_mongodb::{DEFAULT_DATABASE, MongoDbCollection, MongoDbConnection, MongoDbDriver};
}

/// Builds a [`DataMapper`], using [`MongoDbDriver`](crate::mongodb::MongoDbDriver) when
/// `options.driver` is unset.
///
/// Without the `mongodb` feature there is no default driver and a missing one is a
/// configuration error.
///
/// # Errors
///
/// Returns [`DataMapperError::Configuration`](crate::error::DataMapperError::Configuration)
/// naming the first missing option.
pub fn create_data_mapper(options: impl Into<Option<MapperOptions>>) -> DataMapperResult<DataMapper> {
    let options: Option<MapperOptions> = options.into();

    #[cfg(feature = "mongodb")]
    let options = options.map(|options| {
        options.with_default_driver(|| {
            std::sync::Arc::new(docmapper_mongodb::MongoDbDriver::new()) as std::sync::Arc<dyn driver::Driver>
        })
    });

    DataMapper::new(options)
}
