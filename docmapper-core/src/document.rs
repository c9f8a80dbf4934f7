//! Documents and the transform applied to them at the mapper boundary.
//!
//! Documents are plain BSON documents. A [`Transform`] maps a stored document to its
//! application-level shape; the mapper runs it on every document that enters or leaves
//! the store.

use std::{fmt, sync::Arc};

pub use bson::Document;

type TransformFn = dyn Fn(Document) -> Document + Send + Sync;

/// A pure `Document -> Document` function shared by a mapper and its clones.
///
/// # Example
///
/// ```ignore
/// use docmapper::document::Transform;
/// use bson::doc;
///
/// let transform = Transform::new(|mut doc| {
///     doc.remove("_id");
///     doc
/// });
///
/// assert_eq!(transform.apply(doc! { "_id": 1, "name": "Alice" }), doc! { "name": "Alice" });
/// ```
#[derive(Clone)]
pub struct Transform {
    inner: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Document) -> Document + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// The transform that returns its input unchanged.
    pub fn identity() -> Self {
        Self::new(|document| document)
    }

    pub fn apply(&self, document: Document) -> Document {
        (self.inner)(document)
    }

    /// Applies the transform to a possibly absent document.
    ///
    /// Absent documents stay absent: the transform is never called with a placeholder.
    pub fn apply_opt(&self, document: Option<Document>) -> Option<Document> {
        document.map(|document| self.apply(document))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").finish_non_exhaustive()
    }
}
