//! The universe: arena-backed storage for worlds, trees and elements.
//!
//! All live document state of one editing session hangs off a [`Universe`].
//! Entities are stored in id-keyed arenas and addressed through copyable
//! handles; a handle to a destroyed entity stops resolving instead of
//! dangling. The universe also owns the reference tracker, the per-world
//! dirty sets and undo journals, and the event journal external consumers
//! drain with [`Universe::take_events`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use amy_meta::{AttributeMeta, ElementMeta, TreeMeta, WorldMeta};
use tracing::warn;

use crate::error::{DocError, Result};
use crate::event::DocEvent;
use crate::ids::{ElementId, TreeId, WorldId};
use crate::journal::Journal;
use crate::path::ElementPath;
use crate::tracker::{RefTracker, pick_unique_identifier};

/// One stored element.
#[derive(Debug)]
pub(crate) struct ElementData {
    pub(crate) meta: Arc<ElementMeta>,
    /// Explicitly present attribute values (defaults are not materialized).
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    /// Containing tree, cached on every element of an attached subtree.
    pub(crate) tree: Option<TreeId>,
}

/// One stored tree.
#[derive(Debug)]
pub(crate) struct TreeData {
    pub(crate) meta: Arc<TreeMeta>,
    pub(crate) root: Option<ElementId>,
    pub(crate) world: Option<WorldId>,
}

/// One stored world.
#[derive(Debug)]
pub(crate) struct WorldData {
    pub(crate) meta: Arc<WorldMeta>,
    pub(crate) parent: Option<WorldId>,
    pub(crate) key: String,
    pub(crate) children: Vec<WorldId>,
    pub(crate) trees: Vec<TreeId>,
    pub(crate) journal: Journal,
    /// Kind names of trees changed since the last save.
    pub(crate) dirty: BTreeSet<String>,
    pub(crate) read_only: bool,
}

/// A tracker maintenance step, collected read-only then applied.
enum TrackAction {
    Id {
        world: WorldId,
        family: String,
        value: String,
        element: ElementId,
    },
    Ref {
        world: WorldId,
        family: String,
        value: String,
        element: ElementId,
        attribute: String,
    },
}

/// The complete live document state of one session.
#[derive(Debug)]
pub struct Universe {
    root: WorldId,
    pub(crate) worlds: HashMap<WorldId, WorldData>,
    pub(crate) trees: HashMap<TreeId, TreeData>,
    pub(crate) elements: HashMap<ElementId, ElementData>,
    next_id: u64,
    pub(crate) tracker: RefTracker,
    events: Vec<DocEvent>,
}

impl Universe {
    /// Create a universe whose root world has the given kind.
    pub fn new(root_meta: Arc<WorldMeta>) -> Self {
        let root = WorldId(0);
        let key = root_meta.name.clone();
        let mut worlds = HashMap::new();
        worlds.insert(
            root,
            WorldData {
                meta: root_meta,
                parent: None,
                key,
                children: Vec::new(),
                trees: Vec::new(),
                journal: Journal::default(),
                dirty: BTreeSet::new(),
                read_only: false,
            },
        );
        Self {
            root,
            worlds,
            trees: HashMap::new(),
            elements: HashMap::new(),
            next_id: 1,
            tracker: RefTracker::default(),
            events: Vec::new(),
        }
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // -- arena access -----------------------------------------------------

    pub(crate) fn world(&self, id: WorldId) -> Result<&WorldData> {
        self.worlds.get(&id).ok_or_else(|| DocError::StaleHandle {
            handle: id.to_string(),
        })
    }

    pub(crate) fn world_mut(&mut self, id: WorldId) -> Result<&mut WorldData> {
        self.worlds
            .get_mut(&id)
            .ok_or_else(|| DocError::StaleHandle {
                handle: id.to_string(),
            })
    }

    pub(crate) fn tree(&self, id: TreeId) -> Result<&TreeData> {
        self.trees.get(&id).ok_or_else(|| DocError::StaleHandle {
            handle: id.to_string(),
        })
    }

    pub(crate) fn tree_mut(&mut self, id: TreeId) -> Result<&mut TreeData> {
        self.trees
            .get_mut(&id)
            .ok_or_else(|| DocError::StaleHandle {
                handle: id.to_string(),
            })
    }

    pub(crate) fn elem(&self, id: ElementId) -> Result<&ElementData> {
        self.elements.get(&id).ok_or_else(|| DocError::StaleHandle {
            handle: id.to_string(),
        })
    }

    pub(crate) fn elem_mut(&mut self, id: ElementId) -> Result<&mut ElementData> {
        self.elements
            .get_mut(&id)
            .ok_or_else(|| DocError::StaleHandle {
                handle: id.to_string(),
            })
    }

    // -- events -----------------------------------------------------------

    pub(crate) fn emit(&mut self, event: DocEvent) {
        self.events.push(event);
    }

    /// Drain all events recorded since the previous call, oldest first.
    pub fn take_events(&mut self) -> Vec<DocEvent> {
        std::mem::take(&mut self.events)
    }

    // -- worlds -----------------------------------------------------------

    /// The outermost world; exists for the universe's whole lifetime.
    pub fn root_world(&self) -> WorldId {
        self.root
    }

    /// The world's kind declaration.
    pub fn world_meta(&self, world: WorldId) -> Result<&Arc<WorldMeta>> {
        Ok(&self.world(world)?.meta)
    }

    /// The key distinguishing this world among siblings of its kind.
    pub fn world_key(&self, world: WorldId) -> Result<&str> {
        Ok(&self.world(world)?.key)
    }

    /// The parent world, or `None` for the root.
    pub fn world_parent(&self, world: WorldId) -> Result<Option<WorldId>> {
        Ok(self.world(world)?.parent)
    }

    /// Direct child worlds, in creation order.
    pub fn child_worlds(&self, world: WorldId) -> Result<&[WorldId]> {
        Ok(&self.world(world)?.children)
    }

    /// Every world in the universe, root first, preorder.
    pub fn all_worlds(&self) -> Vec<WorldId> {
        let mut out = Vec::with_capacity(self.worlds.len());
        let mut stack = vec![self.root];
        while let Some(world) = stack.pop() {
            out.push(world);
            if let Some(data) = self.worlds.get(&world) {
                stack.extend(data.children.iter().rev());
            }
        }
        out
    }

    /// Create a child world of the declared `kind` under `parent`.
    ///
    /// # Errors
    ///
    /// Fails when the parent kind does not declare `kind`, or a sibling of
    /// that kind already carries `key`.
    pub fn make_world(&mut self, parent: WorldId, kind: &str, key: &str) -> Result<WorldId> {
        let parent_data = self.world(parent)?;
        let meta = parent_data
            .meta
            .find_child_kind(kind)
            .cloned()
            .ok_or_else(|| DocError::UnknownWorldKind {
                parent: parent_data.meta.name.clone(),
                kind: kind.to_string(),
            })?;
        if self.find_world(parent, kind, key)?.is_some() {
            return Err(DocError::DuplicateWorldKey {
                kind: kind.to_string(),
                key: key.to_string(),
            });
        }

        let world = WorldId(self.alloc());
        self.worlds.insert(
            world,
            WorldData {
                meta,
                parent: Some(parent),
                key: key.to_string(),
                children: Vec::new(),
                trees: Vec::new(),
                journal: Journal::default(),
                dirty: BTreeSet::new(),
                read_only: false,
            },
        );
        self.world_mut(parent)?.children.push(world);
        self.emit(DocEvent::WorldAdded { world });
        Ok(world)
    }

    /// Remove a world with everything in it: trees, elements, child worlds.
    ///
    /// Removal events for the world, its trees and its descendants are
    /// emitted before anything detaches.
    ///
    /// # Errors
    ///
    /// Fails on the root world or a stale handle.
    pub fn remove_world(&mut self, world: WorldId) -> Result<()> {
        if world == self.root {
            return Err(DocError::CannotRemoveRoot);
        }
        let parent = self.world(world)?.parent;

        self.emit(DocEvent::WorldAboutToBeRemoved { world });

        for tree in self.world(world)?.trees.clone() {
            self.remove_tree(world, tree)?;
            self.destroy_tree(tree)?;
        }
        for child in self.world(world)?.children.clone() {
            self.remove_world(child)?;
        }

        if let Some(parent) = parent {
            self.world_mut(parent)?.children.retain(|&w| w != world);
        }
        self.worlds.remove(&world);
        Ok(())
    }

    /// Find a child world by kind and key.
    pub fn find_world(&self, parent: WorldId, kind: &str, key: &str) -> Result<Option<WorldId>> {
        for &child in &self.world(parent)?.children {
            let data = self.world(child)?;
            if data.meta.name == kind && data.key == key {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Child worlds of one kind, in creation order.
    pub fn worlds_of_kind(&self, parent: WorldId, kind: &str) -> Result<Vec<WorldId>> {
        let mut out = Vec::new();
        for &child in &self.world(parent)?.children {
            if self.world(child)?.meta.name == kind {
                out.push(child);
            }
        }
        Ok(out)
    }

    /// Keys of child worlds of one kind, in creation order.
    pub fn world_keys(&self, parent: WorldId, kind: &str) -> Result<Vec<String>> {
        self.worlds_of_kind(parent, kind)?
            .into_iter()
            .map(|w| Ok(self.world(w)?.key.clone()))
            .collect()
    }

    /// Nearest world on the ancestor chain (inclusive) with the given kind
    /// name; this is the scope world of an Identifier or Reference
    /// attribute whose `world_kind` is `kind`.
    pub fn scope_world(&self, from: WorldId, kind: &str) -> Option<WorldId> {
        let mut cursor = Some(from);
        while let Some(world) = cursor {
            let data = self.worlds.get(&world)?;
            if data.meta.name == kind {
                return Some(world);
            }
            cursor = data.parent;
        }
        None
    }

    // -- dirty state / read-only ------------------------------------------

    /// True when any tree of the world changed since the last save.
    pub fn is_dirty(&self, world: WorldId) -> Result<bool> {
        Ok(!self.world(world)?.dirty.is_empty())
    }

    /// Kind names of the trees changed since the last save.
    pub fn dirty_trees(&self, world: WorldId) -> Result<Vec<String>> {
        Ok(self.world(world)?.dirty.iter().cloned().collect())
    }

    /// Forget recorded changes (called after a successful save).
    pub fn mark_clean(&mut self, world: WorldId) -> Result<()> {
        self.world_mut(world)?.dirty.clear();
        Ok(())
    }

    pub fn set_world_read_only(&mut self, world: WorldId, read_only: bool) -> Result<()> {
        self.world_mut(world)?.read_only = read_only;
        Ok(())
    }

    pub fn is_world_read_only(&self, world: WorldId) -> Result<bool> {
        Ok(self.world(world)?.read_only)
    }

    pub(crate) fn mark_dirty(&mut self, world: WorldId, tree: TreeId) {
        let Ok(kind) = self.tree(tree).map(|t| t.meta.name.clone()) else {
            return;
        };
        if let Ok(data) = self.world_mut(world) {
            data.dirty.insert(kind);
        }
    }

    // -- trees ------------------------------------------------------------

    /// Create an empty, world-less tree of the given kind.
    pub fn create_tree(&mut self, meta: &Arc<TreeMeta>) -> TreeId {
        let tree = TreeId(self.alloc());
        self.trees.insert(
            tree,
            TreeData {
                meta: Arc::clone(meta),
                root: None,
                world: None,
            },
        );
        tree
    }

    /// The tree's kind declaration.
    pub fn tree_meta(&self, tree: TreeId) -> Result<&Arc<TreeMeta>> {
        Ok(&self.tree(tree)?.meta)
    }

    /// The tree's root element, if set.
    pub fn tree_root(&self, tree: TreeId) -> Result<Option<ElementId>> {
        Ok(self.tree(tree)?.root)
    }

    /// The world the tree is attached to, if any.
    pub fn tree_world(&self, tree: TreeId) -> Result<Option<WorldId>> {
        Ok(self.tree(tree)?.world)
    }

    /// Trees attached to a world, in attachment order.
    pub fn trees_of(&self, world: WorldId) -> Result<&[TreeId]> {
        Ok(&self.world(world)?.trees)
    }

    /// Find a world's tree by kind name.
    pub fn find_tree(&self, world: WorldId, kind: &str) -> Result<Option<TreeId>> {
        for &tree in &self.world(world)?.trees {
            if self.tree(tree)?.meta.name == kind {
                return Ok(Some(tree));
            }
        }
        Ok(None)
    }

    /// Attach a tree to a world. The tree's whole content enters the
    /// reference tracker and the world is marked dirty for its kind.
    ///
    /// # Errors
    ///
    /// Fails when the world kind does not declare the tree's kind, the
    /// world already holds a tree of that kind, or the tree is attached
    /// elsewhere.
    pub fn add_tree(&mut self, world: WorldId, tree: TreeId) -> Result<()> {
        let kind = self.tree(tree)?.meta.name.clone();
        if self.tree(tree)?.world.is_some() {
            return Err(DocError::NotDetached { tag: kind });
        }
        let world_data = self.world(world)?;
        if world_data.meta.find_tree_kind(&kind).is_none() {
            return Err(DocError::UnknownTreeKind {
                world: world_data.meta.name.clone(),
                kind,
            });
        }
        if self.find_tree(world, &kind)?.is_some() {
            return Err(DocError::DuplicateTree { kind });
        }

        self.tree_mut(tree)?.world = Some(world);
        self.world_mut(world)?.trees.push(tree);
        self.emit(DocEvent::TreeAdded { world, tree });
        if let Some(root) = self.tree(tree)?.root {
            self.track_subtree(world, root, true);
        }
        self.mark_dirty(world, tree);
        Ok(())
    }

    /// Detach a tree from its world. Elements stay in the tree; they just
    /// leave the tracker and stop generating events.
    pub fn remove_tree(&mut self, world: WorldId, tree: TreeId) -> Result<()> {
        if self.tree(tree)?.world != Some(world) {
            return Err(DocError::StaleHandle {
                handle: tree.to_string(),
            });
        }
        self.emit(DocEvent::TreeAboutToBeRemoved { world, tree });
        if let Some(root) = self.tree(tree)?.root {
            self.track_subtree(world, root, false);
        }
        self.mark_dirty(world, tree);
        self.tree_mut(tree)?.world = None;
        self.world_mut(world)?.trees.retain(|&t| t != tree);
        Ok(())
    }

    /// Drop a detached tree and every element in it.
    ///
    /// # Errors
    ///
    /// Fails when the tree is still attached to a world.
    pub fn destroy_tree(&mut self, tree: TreeId) -> Result<()> {
        let data = self.tree(tree)?;
        if data.world.is_some() {
            return Err(DocError::NotDetached {
                tag: data.meta.name.clone(),
            });
        }
        if let Some(root) = data.root {
            self.drop_subtree(root);
        }
        self.trees.remove(&tree);
        Ok(())
    }

    pub(crate) fn drop_subtree(&mut self, element: ElementId) {
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.elements.remove(&id) {
                stack.extend(data.children);
            }
        }
    }

    // -- element queries --------------------------------------------------

    /// The element's kind declaration.
    pub fn element_meta(&self, element: ElementId) -> Result<&Arc<ElementMeta>> {
        Ok(&self.elem(element)?.meta)
    }

    /// The element's explicitly present attributes (no defaults).
    pub fn attributes(&self, element: ElementId) -> Result<&BTreeMap<String, String>> {
        Ok(&self.elem(element)?.attributes)
    }

    /// An explicitly present attribute value.
    pub fn attribute(&self, element: ElementId, name: &str) -> Result<Option<&str>> {
        Ok(self.elem(element)?.attributes.get(name).map(String::as_str))
    }

    /// An attribute value with the declared default applied when absent.
    pub fn effective_attribute(&self, element: ElementId, name: &str) -> Result<Option<&str>> {
        let data = self.elem(element)?;
        if let Some(value) = data.attributes.get(name) {
            return Ok(Some(value));
        }
        Ok(data
            .meta
            .attribute(name)
            .and_then(|a| a.default.as_deref()))
    }

    /// The element's children, in document order.
    pub fn children(&self, element: ElementId) -> Result<&[ElementId]> {
        Ok(&self.elem(element)?.children)
    }

    /// The element's parent, `None` for roots and detached elements.
    pub fn parent(&self, element: ElementId) -> Result<Option<ElementId>> {
        Ok(self.elem(element)?.parent)
    }

    /// The tree the element is attached to, if any.
    pub fn containing_tree(&self, element: ElementId) -> Result<Option<TreeId>> {
        Ok(self.elem(element)?.tree)
    }

    /// The world the element is attached to, through its tree.
    pub fn containing_world(&self, element: ElementId) -> Result<Option<WorldId>> {
        match self.elem(element)?.tree {
            Some(tree) => self.tree_world(tree),
            None => Ok(None),
        }
    }

    /// True when the handle resolves, attached or not.
    pub fn is_alive(&self, element: ElementId) -> bool {
        self.elements.contains_key(&element)
    }

    /// Position of `child` among `parent`'s children.
    pub fn index_of(&self, parent: ElementId, child: ElementId) -> Result<Option<usize>> {
        Ok(self.elem(parent)?.children.iter().position(|&c| c == child))
    }

    /// Preorder walk of one tree's attached elements.
    pub fn walk_tree(&self, tree: TreeId) -> Result<Vec<ElementId>> {
        let mut out = Vec::new();
        let Some(root) = self.tree(tree)?.root else {
            return Ok(out);
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Ok(data) = self.elem(id) {
                stack.extend(data.children.iter().rev());
            }
        }
        Ok(out)
    }

    /// Path of an attached element within its world, `None` when detached.
    pub fn path_of(&self, element: ElementId) -> Result<Option<ElementPath>> {
        let Some(tree) = self.elem(element)?.tree else {
            return Ok(None);
        };
        let kind = self.tree(tree)?.meta.name.clone();
        let mut indices = Vec::new();
        let mut cursor = element;
        while let Some(parent) = self.elem(cursor)?.parent {
            match self.index_of(parent, cursor)? {
                Some(index) => indices.push(index),
                None => return Ok(None),
            }
            cursor = parent;
        }
        indices.reverse();
        Ok(Some(ElementPath {
            tree: kind,
            indices,
        }))
    }

    /// Resolve a path against one world.
    pub fn resolve_path(&self, world: WorldId, path: &ElementPath) -> Result<ElementId> {
        let out_of_sync = || DocError::JournalOutOfSync;
        let tree = self.find_tree(world, &path.tree)?.ok_or_else(out_of_sync)?;
        let mut cursor = self.tree(tree)?.root.ok_or_else(out_of_sync)?;
        for &index in &path.indices {
            cursor = self
                .elem(cursor)?
                .children
                .get(index)
                .copied()
                .ok_or_else(out_of_sync)?;
        }
        Ok(cursor)
    }

    // -- reference tracker ------------------------------------------------

    /// True when an identifier of `family` with `value` is registered in
    /// `world` or any of its ancestors.
    pub fn identifier_exists(&self, world: WorldId, family: &str, value: &str) -> bool {
        let mut cursor = Some(world);
        while let Some(w) = cursor {
            if self.tracker.has_identifier(w, family, value) {
                return true;
            }
            cursor = self.worlds.get(&w).and_then(|d| d.parent);
        }
        false
    }

    /// All identifier values of `family` visible from `world` (its own
    /// scope plus ancestors), sorted.
    pub fn identifiers_in_scope(&self, world: WorldId, family: &str) -> Vec<String> {
        let mut out = BTreeSet::new();
        let mut cursor = Some(world);
        while let Some(w) = cursor {
            out.extend(self.tracker.identifiers_in(w, family));
            cursor = self.worlds.get(&w).and_then(|d| d.parent);
        }
        out.into_iter().collect()
    }

    /// Elements claiming one identifier value in the exact scope world.
    pub fn identifier_claimants(
        &self,
        world: WorldId,
        family: &str,
        value: &str,
    ) -> Vec<ElementId> {
        self.tracker.claimants(world, family, value)
    }

    /// `(element, attribute)` pairs referring to `(family, value)` scoped
    /// to `world`.
    pub fn references_to(&self, world: WorldId, family: &str, value: &str) -> Vec<(ElementId, String)> {
        self.tracker.references(world, family, value)
    }

    /// A fresh identifier for `family`, unique across the scopes visible
    /// from `world`.
    ///
    /// Continues the `prefix_N` naming already dominant in the scope.
    pub fn generate_unique_identifier(&self, world: WorldId, family: &str) -> String {
        let taken: BTreeSet<String> = self.identifiers_in_scope(world, family).into_iter().collect();
        pick_unique_identifier(family, &taken)
    }

    /// Register or unregister a whole attached subtree with the tracker.
    pub(crate) fn track_subtree(&mut self, world: WorldId, element: ElementId, register: bool) {
        let mut actions = Vec::new();
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            let Ok(data) = self.elem(id) else { continue };
            for (name, value) in &data.attributes {
                if let Some(attr) = data.meta.attribute(name) {
                    self.collect_track_action(world, id, attr, value, &mut actions);
                }
            }
            stack.extend(data.children.iter().rev());
        }
        self.apply_track_actions(actions, register);
    }

    /// Tracker maintenance for a single attribute value.
    pub(crate) fn track_attribute(
        &mut self,
        world: WorldId,
        element: ElementId,
        attr: &AttributeMeta,
        value: &str,
        register: bool,
    ) {
        let mut actions = Vec::new();
        self.collect_track_action(world, element, attr, value, &mut actions);
        self.apply_track_actions(actions, register);
    }

    fn collect_track_action(
        &self,
        world: WorldId,
        element: ElementId,
        attr: &AttributeMeta,
        value: &str,
        actions: &mut Vec<TrackAction>,
    ) {
        if value.is_empty() {
            return;
        }
        let (Some(family), Some(kind)) = (attr.family(), attr.world_kind()) else {
            return;
        };
        let Some(scope) = self.scope_world(world, kind) else {
            warn!(
                attribute = %attr.name,
                world_kind = %kind,
                "no scope world on ancestor chain, value not tracked"
            );
            return;
        };
        if attr.is_identifier() {
            actions.push(TrackAction::Id {
                world: scope,
                family: family.to_string(),
                value: value.to_string(),
                element,
            });
        } else if attr.is_reference() {
            actions.push(TrackAction::Ref {
                world: scope,
                family: family.to_string(),
                value: value.to_string(),
                element,
                attribute: attr.name.clone(),
            });
        }
    }

    fn apply_track_actions(&mut self, actions: Vec<TrackAction>, register: bool) {
        for action in actions {
            match action {
                TrackAction::Id {
                    world,
                    family,
                    value,
                    element,
                } => {
                    if register {
                        self.tracker
                            .register_identifier(world, &family, &value, element);
                    } else {
                        self.tracker
                            .unregister_identifier(world, &family, &value, element);
                    }
                }
                TrackAction::Ref {
                    world,
                    family,
                    value,
                    element,
                    attribute,
                } => {
                    if register {
                        self.tracker
                            .register_reference(world, &family, &value, element, &attribute);
                    } else {
                        self.tracker
                            .unregister_reference(world, &family, &value, element, &attribute);
                    }
                }
            }
        }
    }

    pub(crate) fn next_element_id(&mut self) -> ElementId {
        ElementId(self.alloc())
    }
}
