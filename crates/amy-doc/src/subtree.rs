//! Value snapshots of element subtrees.
//!
//! A [`Subtree`] is a detached, self-contained copy of an element and its
//! descendants: meta handle, attributes, children. The undo journal and the
//! clipboard both store subtrees; they survive arbitrary model churn
//! because they hold no arena handles.

use std::collections::BTreeMap;
use std::sync::Arc;

use amy_meta::ElementMeta;

/// A detached copy of an element subtree.
#[derive(Debug, Clone)]
pub struct Subtree {
    /// Kind of the copied element.
    pub meta: Arc<ElementMeta>,
    /// Attribute values, copied verbatim (identifiers included).
    pub attributes: BTreeMap<String, String>,
    /// Copied children, in document order.
    pub children: Vec<Subtree>,
}

impl Subtree {
    /// A childless snapshot with no attributes.
    pub fn leaf(meta: Arc<ElementMeta>) -> Self {
        Self {
            meta,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// The snapshot's own attribute value, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Number of elements in the whole snapshot.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Subtree::len).sum::<usize>()
    }

    /// Always false; a subtree contains at least its own element.
    pub fn is_empty(&self) -> bool {
        false
    }
}
