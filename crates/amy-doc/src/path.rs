//! Indices-from-root element paths.
//!
//! Paths address an element by tree kind and the chain of child indices
//! leading to it. Unlike arena handles, a path stays meaningful across
//! remove-then-reinsert cycles, which is what the undo journal needs.

use std::fmt;

/// A position inside a world: tree kind plus child indices from the root.
///
/// An empty index list addresses the tree's root itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    /// Tree kind name within the owning world.
    pub tree: String,
    /// Child indices from the root, outermost first.
    pub indices: Vec<usize>,
}

impl ElementPath {
    /// The root of the given tree kind.
    pub fn root(tree: impl Into<String>) -> Self {
        Self {
            tree: tree.into(),
            indices: Vec::new(),
        }
    }

    /// True when this path addresses the tree root.
    pub fn is_root(&self) -> bool {
        self.indices.is_empty()
    }

    /// The path of this position's parent, or `None` at the root.
    pub fn parent(&self) -> Option<ElementPath> {
        if self.indices.is_empty() {
            return None;
        }
        Some(Self {
            tree: self.tree.clone(),
            indices: self.indices[..self.indices.len() - 1].to_vec(),
        })
    }

    /// The final child index, or `None` at the root.
    pub fn last_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// This path extended by one child index.
    pub fn child(&self, index: usize) -> ElementPath {
        let mut indices = self.indices.clone();
        indices.push(index);
        Self {
            tree: self.tree.clone(),
            indices,
        }
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)?;
        for index in &self.indices {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_children() {
        let root = ElementPath::root("scene");
        assert!(root.is_root());
        assert_eq!(root.parent(), None);

        let child = root.child(3);
        assert!(!child.is_root());
        assert_eq!(child.last_index(), Some(3));
        assert_eq!(child.parent(), Some(root));
        assert_eq!(child.to_string(), "scene/3");
    }
}
