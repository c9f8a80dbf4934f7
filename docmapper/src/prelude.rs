//! Convenient re-exports of commonly used types from docmapper.
//!
//! ```ignore
//! use docmapper::prelude::*;
//! ```
//!
//! This provides access to:
//! - The mapper, its options and the capability traits
//! - Query options and filter construction
//! - The driver traits
//! - Error types

pub use crate::create_data_mapper;
pub use docmapper_core::{
    config::{MapperConfig, MapperOptions, MapperOptionsBuilder},
    document::{Document, Transform},
    driver::{CollectionHandle, Connection, DocumentCursor, Driver},
    error::{DataMapperError, DataMapperResult},
    lifecycle::{DocumentMapper, Lifecycle},
    mapper::DataMapper,
    query::{
        Expr, FieldOp, Filter, Projection, QueryOptions, QueryOptionsBuilder, QueryVisitor, Sort,
        SortDirection, UpdateOptions,
    },
};
