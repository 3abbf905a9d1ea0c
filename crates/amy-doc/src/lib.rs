//! Live document model: universes, worlds, trees and elements.
//!
//! A [`Universe`] owns all document state of one editing session. Worlds
//! form a tree and scope identifiers; each world holds at most one
//! document tree per declared tree kind; trees hold ordered elements with
//! string attribute values, shaped by the kind declarations of
//! [`amy_meta`].
//!
//! Mutations validate structure synchronously and content never: a
//! mis-typed value or duplicate identifier is stored and left for the
//! validation engine to flag. Every mutation of world-attached state
//! emits [`DocEvent`]s, keeps the reference tracker current, marks the
//! world dirty and records its inverse for undo.

mod clipboard;
mod error;
mod event;
mod ids;
mod journal;
mod mutate;
mod path;
mod subtree;
mod tracker;
mod universe;

pub use clipboard::{ATTR_CONTENT_TYPE, ATTR_POS_X, ATTR_POS_Y, CONTAINER_TAG, CONTENT_VARIOUS, Clipboard};
pub use error::{DocError, Result};
pub use event::DocEvent;
pub use ids::{ElementId, TreeId, WorldId};
pub use path::ElementPath;
pub use subtree::Subtree;
pub use universe::Universe;
