//! Element lifecycle and mutation.
//!
//! Structural checks (schema acceptance, detachment, index bounds) fail
//! synchronously with no change applied. Content problems — duplicate
//! identifiers, out-of-range values, cardinality breaches — are accepted
//! here and flagged asynchronously by the validation engine.
//!
//! Every mutation of world-attached state emits events, maintains the
//! reference tracker and dirty sets inline, and records its inverse in the
//! owning world's undo journal before returning.

use std::collections::BTreeMap;
use std::sync::Arc;

use amy_meta::ElementMeta;

use crate::error::{DocError, Result};
use crate::event::DocEvent;
use crate::ids::{ElementId, TreeId};
use crate::journal::InverseOp;
use crate::subtree::Subtree;
use crate::universe::{ElementData, Universe};

impl Universe {
    // -- lifecycle --------------------------------------------------------

    /// Create a detached element, applying declared init values.
    pub fn create_element(&mut self, meta: &Arc<ElementMeta>) -> ElementId {
        let mut attributes = BTreeMap::new();
        for attr in &meta.attributes {
            if let Some(init) = &attr.init {
                attributes.insert(attr.name.clone(), init.clone());
            }
        }
        self.create_with_attributes(meta, attributes)
    }

    /// Create a detached element with no attributes at all; deserializers
    /// use this to avoid mixing init values into loaded content.
    pub fn create_blank_element(&mut self, meta: &Arc<ElementMeta>) -> ElementId {
        self.create_with_attributes(meta, BTreeMap::new())
    }

    fn create_with_attributes(
        &mut self,
        meta: &Arc<ElementMeta>,
        attributes: BTreeMap<String, String>,
    ) -> ElementId {
        let id = self.next_element_id();
        self.elements.insert(
            id,
            ElementData {
                meta: Arc::clone(meta),
                attributes,
                parent: None,
                children: Vec::new(),
                tree: None,
            },
        );
        id
    }

    /// Drop a detached element and all its descendants.
    ///
    /// # Errors
    ///
    /// Fails when the element is still attached to a parent or tree.
    pub fn destroy_element(&mut self, element: ElementId) -> Result<()> {
        let data = self.elem(element)?;
        if data.parent.is_some() || data.tree.is_some() {
            return Err(DocError::NotDetached {
                tag: data.meta.tag.clone(),
            });
        }
        self.drop_subtree(element);
        Ok(())
    }

    // -- structure --------------------------------------------------------

    /// Append a detached element as the parent's last child.
    pub fn append(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        let index = self.elem(parent)?.children.len();
        self.insert(parent, index, child)
    }

    /// Insert a detached element at `index` among the parent's children.
    ///
    /// # Errors
    ///
    /// Fails when the child is attached, the parent kind does not declare
    /// the child's kind, or `index` exceeds the child count.
    pub fn insert(&mut self, parent: ElementId, index: usize, child: ElementId) -> Result<()> {
        self.attach_guard(parent, child)?;
        let len = self.elem(parent)?.children.len();
        if index > len {
            return Err(DocError::InvalidIndex { index, len });
        }

        let tree = self.elem(parent)?.tree;
        self.elem_mut(parent)?.children.insert(index, child);
        self.elem_mut(child)?.parent = Some(parent);
        self.set_subtree_tree(child, tree);
        if let Some(tree) = tree {
            self.notify_added(tree, Some(parent), child, index)?;
        }
        Ok(())
    }

    /// Detach a child from its parent. The child stays alive and the
    /// caller decides whether to reattach or destroy it.
    pub fn remove(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        let index = self
            .index_of(parent, child)?
            .ok_or_else(|| DocError::StaleHandle {
                handle: child.to_string(),
            })?;
        if let Some(tree) = self.elem(parent)?.tree {
            self.notify_removed(tree, Some(parent), child, index)?;
        }
        self.elem_mut(parent)?.children.remove(index);
        self.elem_mut(child)?.parent = None;
        self.set_subtree_tree(child, None);
        Ok(())
    }

    /// Swap the child at `index` for a detached element; returns the old
    /// child, detached.
    pub fn replace(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> Result<ElementId> {
        self.attach_guard(parent, child)?;
        let len = self.elem(parent)?.children.len();
        let old = *self
            .elem(parent)?
            .children
            .get(index)
            .ok_or(DocError::InvalidIndex { index, len })?;
        self.remove(parent, old)?;
        self.insert(parent, index, child)?;
        Ok(old)
    }

    /// Detach the children in `start..stop`, in document order; returns
    /// them detached and alive.
    pub fn delete_range(
        &mut self,
        parent: ElementId,
        start: usize,
        stop: usize,
    ) -> Result<Vec<ElementId>> {
        let len = self.elem(parent)?.children.len();
        if start > stop || stop > len {
            return Err(DocError::InvalidIndex { index: stop, len });
        }
        let mut detached = Vec::with_capacity(stop - start);
        for _ in start..stop {
            let child = self.elem(parent)?.children[start];
            self.remove(parent, child)?;
            detached.push(child);
        }
        Ok(detached)
    }

    /// Detach all children of `parent`; returns them detached and alive.
    pub fn clear(&mut self, parent: ElementId) -> Result<Vec<ElementId>> {
        let len = self.elem(parent)?.children.len();
        self.delete_range(parent, 0, len)
    }

    /// Set or clear a tree's root; returns the previous root, detached.
    ///
    /// # Errors
    ///
    /// Fails when the new root is attached elsewhere or its kind is not the
    /// tree kind's declared root kind.
    pub fn set_root(&mut self, tree: TreeId, root: Option<ElementId>) -> Result<Option<ElementId>> {
        if let Some(new) = root {
            let data = self.elem(new)?;
            if data.parent.is_some() || data.tree.is_some() {
                return Err(DocError::NotDetached {
                    tag: data.meta.tag.clone(),
                });
            }
            let tree_meta = &self.tree(tree)?.meta;
            if !Arc::ptr_eq(&tree_meta.root, &data.meta) {
                return Err(DocError::RootKindMismatch {
                    tree: tree_meta.name.clone(),
                    expected: tree_meta.root.tag.clone(),
                    found: data.meta.tag.clone(),
                });
            }
        }

        let old = self.tree(tree)?.root;
        if old == root {
            return Ok(old);
        }
        if let Some(old_root) = old {
            self.notify_removed(tree, None, old_root, 0)?;
            self.tree_mut(tree)?.root = None;
            self.set_subtree_tree(old_root, None);
        }
        if let Some(new_root) = root {
            self.tree_mut(tree)?.root = Some(new_root);
            self.set_subtree_tree(new_root, Some(tree));
            self.notify_added(tree, None, new_root, 0)?;
        }
        Ok(old)
    }

    // -- attributes -------------------------------------------------------

    /// Set a declared attribute. Setting a value equal to the current one
    /// is a no-op; setting an empty value on a `remove_when_empty`
    /// attribute removes it instead.
    ///
    /// The value is stored even when it fails its kind's value check; the
    /// validation engine flags it.
    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Result<()> {
        let data = self.elem(element)?;
        let meta = Arc::clone(&data.meta);
        let old = data.attributes.get(name).cloned();
        let attr = meta
            .attribute(name)
            .ok_or_else(|| DocError::UnknownAttribute {
                tag: meta.tag.clone(),
                attribute: name.to_string(),
            })?;
        if attr.remove_when_empty && value.is_empty() {
            return self.unset_impl(element, name, true);
        }
        if old.as_deref() == Some(value) {
            return Ok(());
        }
        self.elem_mut(element)?
            .attributes
            .insert(name.to_string(), value.to_string());

        if let Some(tree) = self.elem(element)?.tree
            && let Some(world) = self.tree(tree)?.world
        {
            if let Some(old_value) = &old {
                self.track_attribute(world, element, attr, old_value, false);
            }
            self.track_attribute(world, element, attr, value, true);
            self.emit(DocEvent::AttributeUpdated {
                tree,
                element,
                name: name.to_string(),
                new_value: Some(value.to_string()),
                old_value: old.clone(),
            });
            self.mark_dirty(world, tree);
            if let Some(at) = self.path_of(element)? {
                self.record_op(
                    world,
                    InverseOp::SetAttribute {
                        at,
                        name: name.to_string(),
                        value: old,
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove an attribute; removing an absent attribute is a no-op.
    ///
    /// # Errors
    ///
    /// Fails for mandatory attributes on attached elements.
    pub fn unset_attribute(&mut self, element: ElementId, name: &str) -> Result<()> {
        self.unset_impl(element, name, false)
    }

    /// Attribute removal without the mandatory guard; undo replay needs to
    /// rewind a first-time set of a mandatory attribute.
    pub(crate) fn unset_attribute_raw(&mut self, element: ElementId, name: &str) -> Result<()> {
        self.unset_impl(element, name, true)
    }

    fn unset_impl(&mut self, element: ElementId, name: &str, force: bool) -> Result<()> {
        let data = self.elem(element)?;
        let meta = Arc::clone(&data.meta);
        let Some(attr) = meta.attribute(name) else {
            // Detached elements tolerate unknown names; there is nothing
            // to remove and no tracker state to repair.
            if data.tree.is_none() {
                return Ok(());
            }
            return Err(DocError::UnknownAttribute {
                tag: meta.tag.clone(),
                attribute: name.to_string(),
            });
        };
        if !force && attr.mandatory && data.tree.is_some() {
            return Err(DocError::MandatoryAttribute {
                tag: meta.tag.clone(),
                attribute: name.to_string(),
            });
        }

        let Some(old) = self.elem_mut(element)?.attributes.remove(name) else {
            return Ok(());
        };

        if let Some(tree) = self.elem(element)?.tree
            && let Some(world) = self.tree(tree)?.world
        {
            self.track_attribute(world, element, attr, &old, false);
            self.emit(DocEvent::AttributeUpdated {
                tree,
                element,
                name: name.to_string(),
                new_value: None,
                old_value: Some(old.clone()),
            });
            self.mark_dirty(world, tree);
            if let Some(at) = self.path_of(element)? {
                self.record_op(
                    world,
                    InverseOp::SetAttribute {
                        at,
                        name: name.to_string(),
                        value: Some(old),
                    },
                );
            }
        }
        Ok(())
    }

    // -- copies -----------------------------------------------------------

    /// Deep value copy of an element and its descendants.
    pub fn snapshot(&self, element: ElementId) -> Result<Subtree> {
        let data = self.elem(element)?;
        let mut subtree = Subtree {
            meta: Arc::clone(&data.meta),
            attributes: data.attributes.clone(),
            children: Vec::with_capacity(data.children.len()),
        };
        for &child in &data.children {
            subtree.children.push(self.snapshot(child)?);
        }
        Ok(subtree)
    }

    /// Build a detached element tree from a snapshot.
    pub fn materialize(&mut self, subtree: &Subtree) -> ElementId {
        let id = self.create_blank_element(&subtree.meta);
        if let Ok(data) = self.elem_mut(id) {
            data.attributes = subtree.attributes.clone();
        }
        for child in &subtree.children {
            let child_id = self.materialize(child);
            if let Ok(child_data) = self.elem_mut(child_id) {
                child_data.parent = Some(id);
            }
            if let Ok(data) = self.elem_mut(id) {
                data.children.push(child_id);
            }
        }
        id
    }

    /// Detached deep copy of an element; identifier values are copied
    /// verbatim.
    pub fn clone_element(&mut self, element: ElementId) -> Result<ElementId> {
        let subtree = self.snapshot(element)?;
        Ok(self.materialize(&subtree))
    }

    // -- internals --------------------------------------------------------

    fn attach_guard(&self, parent: ElementId, child: ElementId) -> Result<()> {
        let parent_data = self.elem(parent)?;
        let child_data = self.elem(child)?;
        if child_data.parent.is_some() || child_data.tree.is_some() {
            return Err(DocError::NotDetached {
                tag: child_data.meta.tag.clone(),
            });
        }
        match parent_data.meta.child_spec(&child_data.meta.tag) {
            Some(spec) if Arc::ptr_eq(&spec.meta, &child_data.meta) => Ok(()),
            _ => Err(DocError::ChildNotAccepted {
                parent: parent_data.meta.tag.clone(),
                child: child_data.meta.tag.clone(),
            }),
        }
    }

    fn set_subtree_tree(&mut self, element: ElementId, tree: Option<TreeId>) {
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.elements.get_mut(&id) {
                data.tree = tree;
                stack.extend(data.children.iter().copied());
            }
        }
    }

    fn notify_added(
        &mut self,
        tree: TreeId,
        parent: Option<ElementId>,
        element: ElementId,
        index: usize,
    ) -> Result<()> {
        let Some(world) = self.tree(tree)?.world else {
            return Ok(());
        };
        self.emit(DocEvent::ElementAdded {
            tree,
            parent,
            element,
            index,
        });
        self.track_subtree(world, element, true);
        self.mark_dirty(world, tree);
        if let Some(at) = self.path_of(element)? {
            self.record_op(world, InverseOp::Remove { at });
        }
        Ok(())
    }

    /// Runs before detachment so the path and snapshot still resolve.
    fn notify_removed(
        &mut self,
        tree: TreeId,
        parent: Option<ElementId>,
        element: ElementId,
        index: usize,
    ) -> Result<()> {
        let Some(world) = self.tree(tree)?.world else {
            return Ok(());
        };
        let at = self.path_of(element)?;
        let subtree = self.snapshot(element)?;
        self.emit(DocEvent::ElementAboutToBeRemoved {
            tree,
            parent,
            element,
            index,
        });
        self.track_subtree(world, element, false);
        self.mark_dirty(world, tree);
        if let Some(at) = at {
            self.record_op(world, InverseOp::Insert { at, subtree });
        }
        Ok(())
    }
}
