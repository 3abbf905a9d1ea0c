//! Copy, cut and schema-aware paste.
//!
//! The clipboard holds a synthetic container subtree whose children are
//! the copied elements. Paste walks up from the target until it finds an
//! element kind accepting the copied tags, rebuilds the content against
//! the accepting kinds (so cross-document pastes re-kind cleanly), and
//! renames colliding identifiers on the pasted top-level elements.

use std::sync::{Arc, OnceLock};

use amy_meta::{AttributeKind, AttributeMeta, ElementMeta, Xy, format_real, parse_real};
use tracing::warn;

use crate::error::{DocError, Result};
use crate::ids::{ElementId, WorldId};
use crate::subtree::Subtree;
use crate::universe::Universe;

/// Container tag; never appears in documents.
pub const CONTAINER_TAG: &str = "clipboard";
/// Container attribute: common tag of the copied elements, or `Various`.
pub const ATTR_CONTENT_TYPE: &str = "type";
/// Container attributes: centre of the copied elements' positions.
pub const ATTR_POS_X: &str = "posx";
pub const ATTR_POS_Y: &str = "posy";

/// Content-type value when the copied elements have mixed tags.
pub const CONTENT_VARIOUS: &str = "Various";

fn container_meta() -> &'static Arc<ElementMeta> {
    static META: OnceLock<Arc<ElementMeta>> = OnceLock::new();
    META.get_or_init(|| {
        ElementMeta::builder(CONTAINER_TAG)
            .attribute(AttributeMeta::new(ATTR_CONTENT_TYPE, AttributeKind::String))
            .attribute(AttributeMeta::new(ATTR_POS_X, AttributeKind::real()))
            .attribute(AttributeMeta::new(ATTR_POS_Y, AttributeKind::real()))
            .build()
            .expect("container kind is statically valid")
    })
}

/// An editing clipboard. Independent of any universe; content survives
/// document closes and can be pasted across documents.
#[derive(Debug, Default)]
pub struct Clipboard {
    container: Option<Subtree>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_none()
    }

    /// Number of copied top-level elements.
    pub fn len(&self) -> usize {
        self.container.as_ref().map_or(0, |c| c.children.len())
    }

    /// Common tag of the copied elements, or `Various` for a mixed copy.
    pub fn content_type(&self) -> Option<&str> {
        self.container.as_ref()?.attribute(ATTR_CONTENT_TYPE)
    }

    pub fn clear(&mut self) {
        self.container = None;
    }

    /// Replace the clipboard content with deep copies of `elements`.
    ///
    /// Identifier values are copied verbatim; collisions are resolved at
    /// paste time. Copying nothing clears the clipboard.
    pub fn copy(&mut self, universe: &Universe, elements: &[ElementId]) -> Result<()> {
        if elements.is_empty() {
            self.container = None;
            return Ok(());
        }

        let mut container = Subtree::leaf(Arc::clone(container_meta()));
        let mut positions = Vec::new();
        let mut common_tag: Option<String> = None;
        let mut mixed = false;

        for &element in elements {
            let subtree = universe.snapshot(element)?;
            match &common_tag {
                None => common_tag = Some(subtree.meta.tag.clone()),
                Some(tag) if *tag != subtree.meta.tag => mixed = true,
                Some(_) => {}
            }
            if let Some(position) = position_of(&subtree) {
                positions.push(position);
            }
            container.children.push(subtree);
        }

        let content_type = if mixed {
            CONTENT_VARIOUS.to_string()
        } else {
            common_tag.unwrap_or_else(|| CONTENT_VARIOUS.to_string())
        };
        container
            .attributes
            .insert(ATTR_CONTENT_TYPE.to_string(), content_type);

        let centre = centre_of(&positions);
        container
            .attributes
            .insert(ATTR_POS_X.to_string(), format_real(centre.x));
        container
            .attributes
            .insert(ATTR_POS_Y.to_string(), format_real(centre.y));

        self.container = Some(container);
        Ok(())
    }

    /// Copy `elements`, then detach and destroy them as one undo step per
    /// affected world.
    ///
    /// # Errors
    ///
    /// Fails when any element's kind is read-only, or any element has no
    /// parent to be cut from; nothing is cut in that case.
    pub fn cut(&mut self, universe: &mut Universe, elements: &[ElementId]) -> Result<()> {
        for &element in elements {
            let meta = universe.element_meta(element)?;
            if meta.read_only {
                return Err(DocError::ReadOnlyElement {
                    tag: meta.tag.clone(),
                });
            }
            if universe.parent(element)?.is_none() {
                return Err(DocError::StaleHandle {
                    handle: element.to_string(),
                });
            }
        }

        self.copy(universe, elements)?;

        let mut worlds = Vec::new();
        for &element in elements {
            if let Some(world) = universe.containing_world(element)?
                && !worlds.contains(&world)
            {
                worlds.push(world);
            }
        }
        for &world in &worlds {
            universe.begin_composite(world)?;
        }
        let result = (|| {
            for &element in elements {
                if let Some(parent) = universe.parent(element)? {
                    universe.remove(parent, element)?;
                    universe.destroy_element(element)?;
                }
            }
            Ok(())
        })();
        for &world in &worlds {
            universe.commit_composite(world)?;
        }
        result
    }

    /// Paste the content near `target`, preserving copied positions.
    pub fn paste(&self, universe: &mut Universe, target: ElementId) -> Result<Vec<ElementId>> {
        self.paste_impl(universe, target, None)
    }

    /// Paste the content with the copied centre translated to `cursor`.
    pub fn paste_at(
        &self,
        universe: &mut Universe,
        target: ElementId,
        cursor: Xy,
    ) -> Result<Vec<ElementId>> {
        self.paste_impl(universe, target, Some(cursor))
    }

    fn paste_impl(
        &self,
        universe: &mut Universe,
        target: ElementId,
        cursor: Option<Xy>,
    ) -> Result<Vec<ElementId>> {
        let Some(container) = &self.container else {
            return Ok(Vec::new());
        };
        if container.children.is_empty() {
            return Ok(Vec::new());
        }

        let acceptor = find_acceptor(universe, target, container)?;
        let world = universe.containing_world(acceptor)?;

        let delta = cursor.map(|cursor| {
            let centre = Xy::new(
                container
                    .attribute(ATTR_POS_X)
                    .and_then(parse_real)
                    .unwrap_or(0.0),
                container
                    .attribute(ATTR_POS_Y)
                    .and_then(parse_real)
                    .unwrap_or(0.0),
            );
            Xy::new(cursor.x - centre.x, cursor.y - centre.y)
        });

        if let Some(world) = world {
            universe.begin_composite(world)?;
        }
        let result = (|| {
            let acceptor_meta = Arc::clone(universe.element_meta(acceptor)?);
            let mut pasted = Vec::new();
            for child in &container.children {
                let Some(spec) = acceptor_meta.child_spec(&child.meta.tag) else {
                    warn!(tag = %child.meta.tag, parent = %acceptor_meta.tag, "pasted element not accepted here, skipped");
                    continue;
                };
                let mut adapted = adapt_to(&spec.meta, child);
                if let Some(delta) = delta {
                    translate(&mut adapted, delta);
                }
                if let Some(world) = world {
                    rename_colliding_identifier(universe, world, &mut adapted);
                }
                let element = universe.materialize(&adapted);
                universe.append(acceptor, element)?;
                pasted.push(element);
            }
            Ok(pasted)
        })();
        if let Some(world) = world {
            universe.commit_composite(world)?;
        }
        result
    }
}

/// Nearest ancestor-or-self of `target` accepting at least one copied tag.
fn find_acceptor(
    universe: &Universe,
    target: ElementId,
    container: &Subtree,
) -> Result<ElementId> {
    let mut cursor = Some(target);
    while let Some(element) = cursor {
        let meta = universe.element_meta(element)?;
        if container
            .children
            .iter()
            .any(|c| meta.accepts_child(&c.meta.tag))
        {
            return Ok(element);
        }
        cursor = universe.parent(element)?;
    }
    Err(DocError::ChildNotAccepted {
        parent: universe.element_meta(target)?.tag.clone(),
        child: container
            .children
            .first()
            .map(|c| c.meta.tag.clone())
            .unwrap_or_default(),
    })
}

/// Rebuild a snapshot against the kind the paste target declares.
///
/// Attributes the accepting kind does not declare are dropped with a
/// warning; children it does not declare are skipped likewise.
fn adapt_to(meta: &Arc<ElementMeta>, subtree: &Subtree) -> Subtree {
    let mut adapted = Subtree::leaf(Arc::clone(meta));
    for (name, value) in &subtree.attributes {
        if meta.has_attribute(name) {
            adapted.attributes.insert(name.clone(), value.clone());
        } else {
            warn!(tag = %meta.tag, attribute = %name, "attribute not declared by paste target kind, dropped");
        }
    }
    for child in &subtree.children {
        if let Some(spec) = meta.child_spec(&child.meta.tag) {
            adapted.children.push(adapt_to(&spec.meta, child));
        } else {
            warn!(tag = %meta.tag, child = %child.meta.tag, "child not declared by paste target kind, skipped");
        }
    }
    adapted
}

/// Shift a pasted top-level element's position attribute by `delta`.
fn translate(subtree: &mut Subtree, delta: Xy) {
    let Some(attr) = subtree.meta.position_attribute() else {
        return;
    };
    let Some(position) = subtree.attribute(&attr.name).and_then(Xy::parse) else {
        return;
    };
    let moved = Xy::new(position.x + delta.x, position.y + delta.y);
    let name = attr.name.clone();
    subtree.attributes.insert(name, moved.format());
}

/// Give a pasted top-level element a fresh identifier when its copied one
/// is already taken in scope. Identifiers deeper in the subtree are kept
/// verbatim; validation flags them if they clash.
fn rename_colliding_identifier(universe: &Universe, world: WorldId, subtree: &mut Subtree) {
    let Some(attr) = subtree.meta.identifier_attribute() else {
        return;
    };
    let Some(family) = attr.family() else { return };
    let Some(value) = subtree.attribute(&attr.name) else {
        return;
    };
    if !value.is_empty() && universe.identifier_exists(world, family, value) {
        let fresh = universe.generate_unique_identifier(world, family);
        let name = attr.name.clone();
        subtree.attributes.insert(name, fresh);
    }
}

fn position_of(subtree: &Subtree) -> Option<Xy> {
    let attr = subtree.meta.position_attribute()?;
    subtree.attribute(&attr.name).and_then(Xy::parse)
}

fn centre_of(positions: &[Xy]) -> Xy {
    if positions.is_empty() {
        return Xy::new(0.0, 0.0);
    }
    let n = positions.len() as f64;
    Xy::new(
        positions.iter().map(|p| p.x).sum::<f64>() / n,
        positions.iter().map(|p| p.y).sum::<f64>() / n,
    )
}
