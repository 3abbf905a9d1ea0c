//! Meta-schema vocabulary for Amy level documents.
//!
//! Every editable document kind is described statically before any document
//! is loaded: which element kinds exist, which attributes they carry, how
//! many children of each kind a parent accepts, and which attributes
//! contribute to or consume identifier namespaces.
//!
//! The vocabulary has four layers, outermost first:
//!
//! - [`WorldMeta`] - an identifier scope kind; worlds form a strict tree.
//! - [`TreeMeta`] - a document kind with exactly one root element kind.
//! - [`ElementMeta`] - a node kind with attributes and child cardinalities.
//! - [`AttributeMeta`] - a named, typed attribute declaration whose type is
//!   the closed [`AttributeKind`] sum.
//!
//! All meta entities are immutable after construction and shared via `Arc`;
//! the same [`ElementMeta`] may be reachable under multiple parents (the
//! meta graph is a DAG by tag).
//!
//! # Example
//!
//! ```
//! use amy_meta::{AttributeKind, AttributeMeta, ElementMeta, TreeMeta, WorldMeta};
//!
//! let rectangle = ElementMeta::builder("rectangle")
//!     .attribute(
//!         AttributeMeta::new("id", AttributeKind::identifier("geometry", "level"))
//!             .mandatory(),
//!     )
//!     .attribute(AttributeMeta::new("pos", AttributeKind::Xy).position())
//!     .build()
//!     .unwrap();
//!
//! let scene = ElementMeta::builder("scene")
//!     .child(rectangle, 0, u32::MAX)
//!     .build()
//!     .unwrap();
//!
//! let scene_tree = TreeMeta::new("scene", scene);
//! let level = WorldMeta::builder("level").tree(scene_tree).build().unwrap();
//! assert!(level.find_tree_kind("scene").is_some());
//! ```

mod attribute;
mod element;
mod error;
mod kind;
mod tree;
mod value;
mod world;

pub use attribute::AttributeMeta;
pub use element::{ChildSpec, ElementMeta, ElementMetaBuilder};
pub use error::{MetaError, Result};
pub use kind::{AttributeKind, ValueError};
pub use tree::TreeMeta;
pub use value::{Argb, Rgb, Xy, format_real, parse_real};
pub use world::{WorldMeta, WorldMetaBuilder};
