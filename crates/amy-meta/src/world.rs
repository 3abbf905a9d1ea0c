//! World kinds: the identifier-scoping hierarchy.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::element::ElementMeta;
use crate::error::{MetaError, Result};
use crate::tree::TreeMeta;

/// A named world kind holding tree kinds and child world kinds.
///
/// World kinds form a strict tree. Identifier and Reference attributes name
/// a world kind; call [`WorldMeta::validate`] on the outermost kind once the
/// whole hierarchy is declared to verify that every named kind is an
/// ancestor of (or equal to) the kind owning the attribute's element.
#[derive(Debug)]
pub struct WorldMeta {
    /// Kind name (e.g. `global`, `level`).
    pub name: String,

    /// Tree kinds directly owned by worlds of this kind.
    pub trees: Vec<Arc<TreeMeta>>,

    /// Child world kinds.
    pub children: Vec<Arc<WorldMeta>>,
}

impl WorldMeta {
    /// Start declaring a new world kind.
    pub fn builder(name: impl Into<String>) -> WorldMetaBuilder {
        WorldMetaBuilder {
            name: name.into(),
            trees: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Find a tree kind by name in this world kind.
    pub fn find_tree_kind(&self, name: &str) -> Option<&Arc<TreeMeta>> {
        self.trees.iter().find(|t| t.name == name)
    }

    /// Find a child world kind by name.
    pub fn find_child_kind(&self, name: &str) -> Option<&Arc<WorldMeta>> {
        self.children.iter().find(|w| w.name == name)
    }

    /// Verify reference scoping across the whole hierarchy rooted here.
    ///
    /// World kinds are built inside-out, so an inner kind cannot see the
    /// ancestors it will eventually sit under; the check therefore runs on
    /// the finished outermost kind rather than in the builder.
    ///
    /// # Errors
    ///
    /// Fails on any Identifier/Reference attribute whose `world_kind` is
    /// not on the ancestor chain of the world kind owning its element.
    pub fn validate(self: &Arc<Self>) -> Result<()> {
        check_reference_scoping(self, &mut Vec::new())
    }
}

/// Builder for [`WorldMeta`].
pub struct WorldMetaBuilder {
    name: String,
    trees: Vec<Arc<TreeMeta>>,
    children: Vec<Arc<WorldMeta>>,
}

impl WorldMetaBuilder {
    /// Declare a tree kind owned by this world kind.
    #[must_use]
    pub fn tree(mut self, tree: Arc<TreeMeta>) -> Self {
        self.trees.push(tree);
        self
    }

    /// Declare a child world kind.
    #[must_use]
    pub fn child(mut self, child: Arc<WorldMeta>) -> Self {
        self.children.push(child);
        self
    }

    /// Validate local invariants and freeze the kind.
    ///
    /// # Errors
    ///
    /// Fails on duplicate tree or child world kind names.
    pub fn build(self) -> Result<Arc<WorldMeta>> {
        for (index, tree) in self.trees.iter().enumerate() {
            if self.trees[..index].iter().any(|t| t.name == tree.name) {
                return Err(MetaError::DuplicateTreeKind {
                    world: self.name,
                    tree: tree.name.clone(),
                });
            }
        }
        for (index, child) in self.children.iter().enumerate() {
            if self.children[..index].iter().any(|c| c.name == child.name) {
                return Err(MetaError::DuplicateWorldKind {
                    world: self.name,
                    child: child.name.clone(),
                });
            }
        }

        Ok(Arc::new(WorldMeta {
            name: self.name,
            trees: self.trees,
            children: self.children,
        }))
    }
}

/// Walk the world-kind tree verifying Identifier/Reference scoping.
fn check_reference_scoping(world: &Arc<WorldMeta>, ancestors: &mut Vec<String>) -> Result<()> {
    ancestors.push(world.name.clone());

    for tree in &world.trees {
        let mut visited = BTreeSet::new();
        check_element(&tree.root, ancestors, &mut visited)?;
    }
    for child in &world.children {
        check_reference_scoping(child, ancestors)?;
    }

    ancestors.pop();
    Ok(())
}

/// Check one element kind and its children; the meta graph is a DAG, so a
/// visited set keyed by pointer prevents re-walking shared kinds.
fn check_element(
    element: &Arc<ElementMeta>,
    ancestors: &[String],
    visited: &mut BTreeSet<usize>,
) -> Result<()> {
    if !visited.insert(Arc::as_ptr(element) as usize) {
        return Ok(());
    }

    for attribute in &element.attributes {
        if let Some(kind) = attribute.world_kind()
            && !ancestors.iter().any(|a| a == kind)
        {
            return Err(MetaError::UnreachableWorldKind {
                tag: element.tag.clone(),
                attribute: attribute.name.clone(),
                world_kind: kind.to_string(),
                owner: ancestors.last().cloned().unwrap_or_default(),
            });
        }
    }
    for child in &element.children {
        check_element(&child.meta, ancestors, visited)?;
    }
    Ok(())
}
