//! MongoDB driver for docmapper.
//!
//! This crate implements the driver traits of `docmapper-core` on top of the official
//! `mongodb` client. It is enabled in the `docmapper` facade through the default
//! `mongodb` feature:
//!
//! ```toml
//! [dependencies]
//! docmapper = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The connection URI is handed to the client unchanged. The database is the one named
//! in the URI path (`mongodb://host/app` uses `app`) and defaults to `test`.
//!
//! # Example
//!
//! ```ignore
//! use docmapper::{config::MapperOptions, mongodb::MongoDbDriver};
//!
//! let options = MapperOptions::builder()
//!     .driver(MongoDbDriver::new())
//!     .connection_uri("mongodb://localhost:27017/app")
//!     .collection_name("users")
//!     .build();
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmapper_mongodb;

pub mod driver;
pub(crate) mod query;

pub use driver::{DEFAULT_DATABASE, MongoDbCollection, MongoDbConnection, MongoDbDriver};
