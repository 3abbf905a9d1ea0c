//! Attribute declarations.

use serde::{Deserialize, Serialize};

use crate::kind::AttributeKind;

/// A named, typed attribute declaration on an element kind.
///
/// Construction is chainable; the defaults are the permissive ones
/// (optional, empty allowed, no default or init value):
///
/// ```
/// use amy_meta::{AttributeKind, AttributeMeta};
///
/// let mass = AttributeMeta::new("mass", AttributeKind::real())
///     .mandatory()
///     .with_init("1");
/// assert!(mass.mandatory);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
    /// Attribute name, unique within its element kind.
    pub name: String,

    /// The attribute's type.
    pub kind: AttributeKind,

    /// Whether the attribute must be present on every attached element.
    pub mandatory: bool,

    /// Whether an empty string is an acceptable value.
    pub allow_empty: bool,

    /// Whether setting the attribute to an empty string removes it instead.
    pub remove_when_empty: bool,

    /// Textual value assumed when the attribute is missing.
    pub default: Option<String>,

    /// Textual value applied when an element of this kind is freshly created.
    pub init: Option<String>,

    /// Marks this attribute as the element's canonical position, used by
    /// paste-at-point to translate subtrees.
    pub position: bool,
}

impl AttributeMeta {
    /// A new optional attribute of the given kind.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mandatory: false,
            allow_empty: true,
            remove_when_empty: false,
            default: None,
            init: None,
            position: false,
        }
    }

    /// Require the attribute on every attached element.
    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Reject empty values.
    #[must_use]
    pub fn deny_empty(mut self) -> Self {
        self.allow_empty = false;
        self
    }

    /// Remove the attribute when set to an empty string.
    #[must_use]
    pub fn remove_when_empty(mut self) -> Self {
        self.remove_when_empty = true;
        self
    }

    /// Value assumed when the attribute is missing.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Value applied on fresh element creation.
    #[must_use]
    pub fn with_init(mut self, value: impl Into<String>) -> Self {
        self.init = Some(value.into());
        self
    }

    /// Mark as the element's canonical position attribute.
    #[must_use]
    pub fn position(mut self) -> Self {
        self.position = true;
        self
    }

    /// True when the kind is `Identifier`.
    pub fn is_identifier(&self) -> bool {
        self.kind.is_identifier()
    }

    /// True when the kind is `Reference`.
    pub fn is_reference(&self) -> bool {
        self.kind.is_reference()
    }

    /// The identifier family, for Reference/Identifier kinds.
    pub fn family(&self) -> Option<&str> {
        self.kind.family()
    }

    /// The scoping world kind name, for Reference/Identifier kinds.
    pub fn world_kind(&self) -> Option<&str> {
        self.kind.world_kind()
    }
}
