//! Document tree kinds.

use std::sync::Arc;

use crate::element::ElementMeta;

/// A named document kind with exactly one root element kind.
#[derive(Debug)]
pub struct TreeMeta {
    /// Kind name, unique within its world kind (e.g. `scene`, `level`).
    pub name: String,

    /// The root element kind of documents of this kind.
    pub root: Arc<ElementMeta>,
}

impl TreeMeta {
    pub fn new(name: impl Into<String>, root: Arc<ElementMeta>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            root,
        })
    }
}
