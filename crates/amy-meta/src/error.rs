//! Meta-schema construction errors.
//!
//! These surface only while a schema is being declared; a schema that built
//! successfully never produces them again at runtime.

use thiserror::Error;

/// Schema declaration error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetaError {
    /// Two attributes with the same name on one element kind.
    #[error("element kind '{tag}' declares attribute '{attribute}' twice")]
    DuplicateAttribute { tag: String, attribute: String },

    /// More than one Identifier attribute on one element kind.
    #[error("element kind '{tag}' declares more than one identifier attribute")]
    MultipleIdentifiers { tag: String },

    /// Two child specs with the same tag under one parent.
    #[error("element kind '{tag}' declares child tag '{child}' twice")]
    DuplicateChildTag { tag: String, child: String },

    /// Child cardinality with min above max.
    #[error(
        "element kind '{tag}', child '{child}': min occurrence {min} exceeds max occurrence {max}"
    )]
    InvalidCardinality {
        tag: String,
        child: String,
        min: u32,
        max: u32,
    },

    /// Two tree kinds with the same name in one world kind.
    #[error("world kind '{world}' declares tree kind '{tree}' twice")]
    DuplicateTreeKind { world: String, tree: String },

    /// Two child world kinds with the same name under one parent.
    #[error("world kind '{world}' declares child world kind '{child}' twice")]
    DuplicateWorldKind { world: String, child: String },

    /// An Identifier/Reference attribute names a world kind that is not an
    /// ancestor of (or equal to) the world kind owning its element.
    #[error(
        "attribute '{attribute}' on element kind '{tag}' targets world kind \
         '{world_kind}', which is not an ancestor of world kind '{owner}'"
    )]
    UnreachableWorldKind {
        tag: String,
        attribute: String,
        world_kind: String,
        owner: String,
    },
}

/// Result type alias for meta-schema construction.
pub type Result<T> = std::result::Result<T, MetaError>;
