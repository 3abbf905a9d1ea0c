//! Document model errors.
//!
//! Structural and schema errors return synchronously to the caller with no
//! mutation performed. Validation findings (duplicate identifiers, bad
//! values, cardinality breaches) are never errors here; they live in the
//! issue store of the validation engine.

use thiserror::Error;

/// Document mutation or query error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocError {
    /// Handle does not resolve in this universe.
    #[error("stale handle: {handle}")]
    StaleHandle { handle: String },

    /// Attribute name not declared by the element's kind.
    #[error("element kind '{tag}' has no attribute '{attribute}'")]
    UnknownAttribute { tag: String, attribute: String },

    /// Refusing to drop a mandatory attribute from an attached element.
    #[error("attribute '{attribute}' on element kind '{tag}' is mandatory")]
    MandatoryAttribute { tag: String, attribute: String },

    /// Structural operation with an out-of-range index.
    #[error("index {index} out of range (length {len})")]
    InvalidIndex { index: usize, len: usize },

    /// The element to attach is already attached somewhere.
    #[error("element of kind '{tag}' is already attached")]
    NotDetached { tag: String },

    /// Parent kind does not declare the child's tag.
    #[error("element kind '{parent}' does not accept children of kind '{child}'")]
    ChildNotAccepted { parent: String, child: String },

    /// Root element kind does not match the tree kind's declared root.
    #[error("tree kind '{tree}' requires a root of kind '{expected}', got '{found}'")]
    RootKindMismatch {
        tree: String,
        expected: String,
        found: String,
    },

    /// A world of this kind with this key already exists under the parent.
    #[error("world kind '{kind}' already has a child keyed '{key}'")]
    DuplicateWorldKey { kind: String, key: String },

    /// The parent world kind does not declare this child world kind.
    #[error("world kind '{parent}' has no child kind '{kind}'")]
    UnknownWorldKind { parent: String, kind: String },

    /// The world kind does not declare this tree kind.
    #[error("world kind '{world}' has no tree kind '{kind}'")]
    UnknownTreeKind { world: String, kind: String },

    /// The world already holds a tree of this kind.
    #[error("world already holds a tree of kind '{kind}'")]
    DuplicateTree { kind: String },

    /// The outermost world cannot be removed.
    #[error("the root world cannot be removed")]
    CannotRemoveRoot,

    /// Cut/delete refused for a meta-read-only element.
    #[error("element kind '{tag}' is read-only")]
    ReadOnlyElement { tag: String },

    /// Unpaired undo-recording resume.
    #[error("undo recording resumed without a matching suspension")]
    UnbalancedSuspension,

    /// An undo path no longer resolves against the current model.
    #[error("undo journal entry no longer applies")]
    JournalOutOfSync,
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, DocError>;
