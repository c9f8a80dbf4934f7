//! In-memory driver for docmapper.
//!
//! This crate provides a thread-safe, in-memory implementation of the driver traits in
//! `docmapper-core`. Data is held in async-aware read-write locks and shared by every
//! clone of the driver, which makes it suitable for tests and local development.
//!
//! # Features
//!
//! - **Insertion order** - Unsorted queries return documents in the order they were inserted
//! - **Full query support** - Filtering, stable multi-key sorting, pagination and projections
//! - **Atomic writes** - Find-and-remove and find-and-update under a single write lock
//!
//! # Quick Start
//!
//! ```ignore
//! use docmapper::prelude::*;
//! use docmapper::memory::InMemoryDriver;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut mapper = DataMapper::new(
//!         MapperOptions::builder()
//!             .driver(InMemoryDriver::new())
//!             .connection_uri("memory://app")
//!             .collection_name("users")
//!             .build(),
//!     )?;
//!
//!     mapper.initialize().await?;
//!     mapper.create(doc! { "name": "Alice" }).await?;
//!     mapper.destroy().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmapper_memory;

pub mod driver;
pub(crate) mod evaluator;

pub use driver::{InMemoryCollection, InMemoryConnection, InMemoryDriver};
