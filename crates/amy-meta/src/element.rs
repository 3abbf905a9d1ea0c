//! Element kinds and child cardinalities.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::attribute::AttributeMeta;
use crate::error::{MetaError, Result};

/// Occurrence bounds for one child kind under one parent.
///
/// `max_occurrence == u32::MAX` means unbounded.
#[derive(Debug, Clone)]
pub struct ChildSpec {
    /// The child element kind. Kinds are shared; the same `ElementMeta` may
    /// appear as a child of several parents.
    pub meta: Arc<ElementMeta>,
    /// Minimum number of children of this kind.
    pub min_occurrence: u32,
    /// Maximum number of children of this kind.
    pub max_occurrence: u32,
}

impl ChildSpec {
    /// True when the bounds are `[0, unbounded]`.
    pub fn is_unconstrained(&self) -> bool {
        self.min_occurrence == 0 && self.max_occurrence == u32::MAX
    }
}

/// A named node kind: ordered attributes, ordered child kinds, cardinalities.
///
/// Immutable after construction; build one with [`ElementMeta::builder`].
#[derive(Debug)]
pub struct ElementMeta {
    /// Tag, unique among the siblings of any parent declaring this kind.
    pub tag: String,

    /// Declared attributes, in declaration order.
    pub attributes: Vec<AttributeMeta>,

    /// Declared child kinds, in declaration order.
    pub children: Vec<ChildSpec>,

    /// Read-only kinds refuse cut/delete in the editor.
    pub read_only: bool,

    /// Index into `attributes` of the single Identifier attribute, if any.
    identifier_index: Option<usize>,

    /// Attribute name to index, for O(log n) lookup.
    by_name: BTreeMap<String, usize>,
}

impl ElementMeta {
    /// Start declaring a new element kind.
    pub fn builder(tag: impl Into<String>) -> ElementMetaBuilder {
        ElementMetaBuilder {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            read_only: false,
        }
    }

    /// Look up a declared attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeMeta> {
        self.by_name.get(name).map(|&i| &self.attributes[i])
    }

    /// True when `name` is a declared attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The single Identifier attribute of this kind, if declared.
    pub fn identifier_attribute(&self) -> Option<&AttributeMeta> {
        self.identifier_index.map(|i| &self.attributes[i])
    }

    /// All Reference attributes of this kind, in declaration order.
    pub fn reference_attributes(&self) -> impl Iterator<Item = &AttributeMeta> {
        self.attributes.iter().filter(|a| a.is_reference())
    }

    /// The first position-carrying attribute, used by paste-at-point.
    pub fn position_attribute(&self) -> Option<&AttributeMeta> {
        self.attributes.iter().find(|a| a.position)
    }

    /// The child spec for `tag`, if this kind accepts such children.
    pub fn child_spec(&self, tag: &str) -> Option<&ChildSpec> {
        self.children.iter().find(|c| c.meta.tag == tag)
    }

    /// True when this kind accepts children with the given tag.
    pub fn accepts_child(&self, tag: &str) -> bool {
        self.child_spec(tag).is_some()
    }
}

/// Builder for [`ElementMeta`]; `build` enforces the kind invariants.
pub struct ElementMetaBuilder {
    tag: String,
    attributes: Vec<AttributeMeta>,
    children: Vec<ChildSpec>,
    read_only: bool,
}

impl ElementMetaBuilder {
    /// Declare an attribute. Declaration order is preserved.
    #[must_use]
    pub fn attribute(mut self, attribute: AttributeMeta) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a child kind with occurrence bounds.
    ///
    /// Use `u32::MAX` as `max` for unbounded.
    #[must_use]
    pub fn child(mut self, meta: Arc<ElementMeta>, min: u32, max: u32) -> Self {
        self.children.push(ChildSpec {
            meta,
            min_occurrence: min,
            max_occurrence: max,
        });
        self
    }

    /// Mark the kind read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Validate and freeze the kind.
    ///
    /// # Errors
    ///
    /// Fails on duplicate attribute names, more than one Identifier
    /// attribute, duplicate child tags, or inverted cardinalities.
    pub fn build(self) -> Result<Arc<ElementMeta>> {
        let mut by_name = BTreeMap::new();
        let mut identifier_index = None;

        for (index, attribute) in self.attributes.iter().enumerate() {
            if by_name.insert(attribute.name.clone(), index).is_some() {
                return Err(MetaError::DuplicateAttribute {
                    tag: self.tag,
                    attribute: attribute.name.clone(),
                });
            }
            if attribute.is_identifier() {
                if identifier_index.is_some() {
                    return Err(MetaError::MultipleIdentifiers { tag: self.tag });
                }
                identifier_index = Some(index);
            }
        }

        for (index, child) in self.children.iter().enumerate() {
            if self.children[..index]
                .iter()
                .any(|c| c.meta.tag == child.meta.tag)
            {
                return Err(MetaError::DuplicateChildTag {
                    tag: self.tag,
                    child: child.meta.tag.clone(),
                });
            }
            if child.min_occurrence > child.max_occurrence {
                return Err(MetaError::InvalidCardinality {
                    tag: self.tag,
                    child: child.meta.tag.clone(),
                    min: child.min_occurrence,
                    max: child.max_occurrence,
                });
            }
        }

        Ok(Arc::new(ElementMeta {
            tag: self.tag,
            attributes: self.attributes,
            children: self.children,
            read_only: self.read_only,
            identifier_index,
            by_name,
        }))
    }
}
