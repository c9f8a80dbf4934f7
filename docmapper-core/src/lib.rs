//! A connection-scoped data mapper over a single document collection.
//!
//! This crate is the core of the docmapper project and provides:
//!
//! - **Mapper** ([`mapper`]) - The [`DataMapper`](mapper::DataMapper) with its two-phase lifecycle and CRUD
//! - **Capabilities** ([`lifecycle`]) - The `Lifecycle` and `DocumentMapper` traits
//! - **Driver contract** ([`driver`]) - Traits a database driver implements, plus the chained cursor
//! - **Query options** ([`query`]) - Filters, pagination, sorting and projections
//! - **Configuration** ([`config`]) - Mapper options, their builder and serialized form
//! - **Documents** ([`document`]) - The document type and the boundary transform
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmapper_core::{config::MapperOptions, mapper::DataMapper};
//! use docmapper_core::lifecycle::{DocumentMapper, Lifecycle};
//! use docmapper_core::query::{Filter, QueryOptions};
//!
//! let mut mapper = DataMapper::new(
//!     MapperOptions::builder()
//!         .driver(my_driver)
//!         .connection_uri("mongodb://localhost/test")
//!         .collection_name("users")
//!         .build(),
//! )?;
//!
//! mapper.initialize().await?;
//! let alice = mapper.find_one(QueryOptions::filter(Filter::eq("name", "Alice"))).await?;
//! mapper.destroy().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmapper_core;

pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod mapper;
pub mod query;
