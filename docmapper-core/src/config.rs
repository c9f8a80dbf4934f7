//! Mapper configuration.
//!
//! [`MapperOptions`] is what a caller hands to [`DataMapper::new`](crate::mapper::DataMapper::new).
//! It can be assembled in code with [`MapperOptions::builder`] or loaded from a serialized
//! [`MapperConfig`] (JSON or BSON) and completed with a driver and transform afterwards.
//!
//! ```ignore
//! use docmapper::config::MapperOptions;
//!
//! let options = MapperOptions::from_json(r#"{
//!     "connectionUri": "mongodb://localhost/test",
//!     "collectionName": "docs"
//! }"#)?
//! .with_transform(|mut doc| {
//!     doc.remove("_id");
//!     doc
//! });
//! ```

use bson::{Bson, Document, de::deserialize_from_bson};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, sync::Arc};

use crate::{
    document::Transform,
    driver::Driver,
    error::{DataMapperError, DataMapperResult},
};

/// Serializable part of the mapper configuration.
///
/// Keys are camelCase (`connectionUri`, `collectionName`); snake_case spellings are
/// accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperConfig {
    #[serde(default, alias = "connection_uri")]
    pub connection_uri: Option<String>,
    #[serde(default, alias = "collection_name")]
    pub collection_name: Option<String>,
}

/// Options for building a data mapper.
///
/// `connection_uri` and `collection_name` are required; `driver` and `transform`
/// fall back to defaults. Nothing is validated until the mapper is built.
#[derive(Debug, Clone, Default)]
pub struct MapperOptions {
    pub driver: Option<Arc<dyn Driver>>,
    pub transform: Option<Transform>,
    pub connection_uri: Option<String>,
    pub collection_name: Option<String>,
}

impl MapperOptions {
    pub fn builder() -> MapperOptionsBuilder {
        MapperOptionsBuilder::default()
    }

    pub fn from_config(config: MapperConfig) -> Self {
        Self {
            connection_uri: config.connection_uri,
            collection_name: config.collection_name,
            ..Self::default()
        }
    }

    /// Parses a JSON [`MapperConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`DataMapperError::Serialization`] if the JSON is malformed.
    pub fn from_json(json: &str) -> DataMapperResult<Self> {
        Ok(Self::from_config(serde_json::from_str::<MapperConfig>(json)?))
    }

    /// Reads a [`MapperConfig`] out of a BSON document.
    pub fn from_document(document: Document) -> DataMapperResult<Self> {
        Ok(Self::from_config(deserialize_from_bson::<MapperConfig>(Bson::Document(document))?))
    }

    pub fn with_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Document) -> Document + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(transform));
        self
    }

    /// Fills in `driver` only if none was supplied.
    pub fn with_default_driver<F>(mut self, default: F) -> Self
    where
        F: FnOnce() -> Arc<dyn Driver>,
    {
        if self.driver.is_none() {
            self.driver = Some(default());
        }
        self
    }

    /// Checks required options in order and resolves defaults.
    ///
    /// The checks run `options`, `options.connection_uri`, `options.collection_name`,
    /// then `options.driver`. Empty strings count as missing.
    pub(crate) fn resolve(options: Option<MapperOptions>) -> DataMapperResult<ResolvedOptions> {
        let options = options.ok_or_else(|| DataMapperError::missing("options"))?;

        let connection_uri = options
            .connection_uri
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| DataMapperError::missing("options.connection_uri"))?;
        let collection_name = options
            .collection_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DataMapperError::missing("options.collection_name"))?;
        let driver = options
            .driver
            .ok_or_else(|| DataMapperError::missing("options.driver"))?;

        Ok(ResolvedOptions {
            driver,
            transform: options.transform.unwrap_or_default(),
            connection_uri,
            collection_name,
        })
    }
}

/// Fluent builder for [`MapperOptions`].
#[derive(Debug, Default)]
pub struct MapperOptionsBuilder {
    options: MapperOptions,
}

impl MapperOptionsBuilder {
    pub fn connection_uri(mut self, uri: impl Into<String>) -> Self {
        self.options.connection_uri = Some(uri.into());
        self
    }

    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.options.collection_name = Some(name.into());
        self
    }

    pub fn driver<D: Driver + 'static>(mut self, driver: D) -> Self {
        self.options.driver = Some(Arc::new(driver));
        self
    }

    pub fn shared_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.options.driver = Some(driver);
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Document) -> Document + Send + Sync + 'static,
    {
        self.options.transform = Some(Transform::new(transform));
        self
    }

    pub fn build(self) -> MapperOptions {
        self.options
    }
}

/// Options after validation, owned by a mapper for its whole life.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOptions {
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) transform: Transform,
    pub(crate) connection_uri: String,
    pub(crate) collection_name: String,
}

/// Masks the user info of a connection URI for logging.
///
/// `mongodb://user:secret@db:27017/app` becomes `mongodb://***@db:27017/app`.
/// URIs without credentials are returned unchanged.
pub fn redact_uri(uri: &str) -> Cow<'_, str> {
    let Some(scheme_end) = uri.find("://").map(|index| index + 3) else {
        return Cow::Borrowed(uri);
    };

    let rest = &uri[scheme_end..];
    let authority = rest.find(['/', '?', '#']).map_or(rest, |end| &rest[..end]);

    match authority.rfind('@') {
        Some(at) => Cow::Owned(format!("{}***{}", &uri[..scheme_end], &rest[at..])),
        None => Cow::Borrowed(uri),
    }
}
