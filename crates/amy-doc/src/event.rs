//! Typed change notifications.
//!
//! Every mutation of world-attached state appends events to the universe
//! journal, in mutation order, before the mutating call returns. Built-in
//! consumers (reference tracker, dirty sets, undo recorder) are updated
//! inline by the mutation itself; external consumers drain the journal
//! with [`crate::Universe::take_events`].

use crate::ids::{ElementId, TreeId, WorldId};

/// A change notification.
///
/// `*AboutToBeRemoved` events are recorded before detachment, so consumers
/// observing them can still resolve the affected subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocEvent {
    /// A world was created and attached.
    WorldAdded { world: WorldId },

    /// A world is about to be removed; its trees and children are still
    /// attached (their own removal events follow).
    WorldAboutToBeRemoved { world: WorldId },

    /// A tree was attached to a world.
    TreeAdded { world: WorldId, tree: TreeId },

    /// A tree is about to be detached from its world.
    TreeAboutToBeRemoved { world: WorldId, tree: TreeId },

    /// An element was attached. `parent` is `None` for a root; `index` is
    /// the position among the parent's children (0 for a root).
    ElementAdded {
        tree: TreeId,
        parent: Option<ElementId>,
        element: ElementId,
        index: usize,
    },

    /// An element is about to be detached; its children are still attached.
    ElementAboutToBeRemoved {
        tree: TreeId,
        parent: Option<ElementId>,
        element: ElementId,
        index: usize,
    },

    /// An attribute changed on an attached element. `new_value` is `None`
    /// for removal, `old_value` is `None` for first set.
    AttributeUpdated {
        tree: TreeId,
        element: ElementId,
        name: String,
        new_value: Option<String>,
        old_value: Option<String>,
    },
}
