//! Cross-tree domain rules, scheduled per level world.
//!
//! These rules read across the logic, scene and resource trees of one
//! level, so they recompute per world rather than per element. Each
//! finding is attributed to the element the editor should highlight.

use std::path::Path;

use amy_doc::{ElementId, Universe, WorldId};
use amy_meta::{Xy, parse_real};
use amy_schema::tags;

use crate::issue::Issue;
use crate::probe::{ProbeOutcome, ResourceProbe};

/// Compute all domain-rule issues of one world.
///
/// Only level worlds carry rules; other world kinds yield nothing.
pub fn check_world_rules(
    universe: &Universe,
    world: WorldId,
    probe: &dyn ResourceProbe,
) -> Vec<(ElementId, Issue)> {
    let mut issues = Vec::new();
    let Ok(meta) = universe.world_meta(world) else {
        return issues;
    };
    if meta.name != tags::WORLD_LEVEL {
        return issues;
    }

    check_scene(universe, world, &mut issues);
    check_logic(universe, world, &mut issues);
    check_resources(universe, world, probe, &mut issues);
    issues
}

fn effective<'a>(universe: &'a Universe, element: ElementId, name: &str) -> Option<&'a str> {
    universe.effective_attribute(element, name).ok().flatten()
}

fn is_static(universe: &Universe, element: ElementId) -> bool {
    effective(universe, element, tags::ATTR_STATIC) == Some("true")
}

fn has_positive_mass(universe: &Universe, element: ElementId) -> bool {
    effective(universe, element, tags::ATTR_MASS)
        .and_then(parse_real)
        .is_some_and(|mass| mass > 0.0)
}

fn scene_shapes(universe: &Universe, world: WorldId) -> (Option<ElementId>, Vec<ElementId>) {
    let root = universe
        .find_tree(world, tags::TREE_SCENE)
        .ok()
        .flatten()
        .and_then(|tree| universe.tree_root(tree).ok().flatten());
    let shapes = root
        .and_then(|root| universe.children(root).ok())
        .map(|children| children.to_vec())
        .unwrap_or_default();
    (root, shapes)
}

/// Mass rules and the rotating-without-hinge advice.
fn check_scene(universe: &Universe, world: WorldId, issues: &mut Vec<(ElementId, Issue)>) {
    let (_, shapes) = scene_shapes(universe, world);
    for shape in shapes {
        if !is_static(universe, shape) {
            if !has_positive_mass(universe, shape) {
                issues.push((shape, Issue::MissingMass));
            }
            // Composite bodies need a mass on each part for the physics
            // solver to balance them.
            for &part in universe.children(shape).ok().unwrap_or(&[]) {
                if !has_positive_mass(universe, part) {
                    issues.push((part, Issue::PartMissingMass));
                }
            }
        }

        let rotates = effective(universe, shape, tags::ATTR_ROT_SPEED)
            .and_then(parse_real)
            .is_some_and(|speed| speed != 0.0);
        if rotates
            && let Some(id) = effective(universe, shape, tags::ATTR_ID)
            && !is_hinged(universe, world, id)
        {
            issues.push((shape, Issue::RotatingWithoutHinge));
        }
    }
}

fn is_hinged(universe: &Universe, world: WorldId, body_id: &str) -> bool {
    universe
        .references_to(world, tags::FAMILY_GEOMETRY, body_id)
        .iter()
        .any(|(element, attribute)| {
            attribute == tags::ATTR_BODY
                && universe
                    .element_meta(*element)
                    .is_ok_and(|m| m.tag == tags::HINGE)
        })
}

/// Joint, force-field, exit and camera rules.
fn check_logic(universe: &Universe, world: WorldId, issues: &mut Vec<(ElementId, Issue)>) {
    let Some(root) = universe
        .find_tree(world, tags::TREE_LOGIC)
        .ok()
        .flatten()
        .and_then(|tree| universe.tree_root(tree).ok().flatten())
    else {
        return;
    };
    let Ok(children) = universe.children(root) else {
        return;
    };
    let children = children.to_vec();

    let mut aspect_counts: Vec<(&str, u32)> =
        tags::CAMERA_ASPECTS.iter().map(|&a| (a, 0)).collect();

    for &child in &children {
        let Ok(meta) = universe.element_meta(child) else {
            continue;
        };
        match meta.tag.as_str() {
            tags::HINGE | tags::MOTOR => {
                if let Some(body) = effective(universe, child, tags::ATTR_BODY)
                    && let Some(target) = universe
                        .identifier_claimants(world, tags::FAMILY_GEOMETRY, body)
                        .last()
                        .copied()
                    && is_static(universe, target)
                {
                    issues.push((
                        child,
                        Issue::StaticBodyDriven {
                            attribute: tags::ATTR_BODY.to_string(),
                            body: body.to_string(),
                        },
                    ));
                }
            }
            tags::FORCE_FIELD => {
                let has_size = universe
                    .attribute(child, tags::ATTR_SIZE)
                    .ok()
                    .flatten()
                    .is_some();
                let has_center = universe
                    .attribute(child, tags::ATTR_CENTER)
                    .ok()
                    .flatten()
                    .is_some();
                if has_size && !has_center {
                    issues.push((child, Issue::FieldSizeWithoutCenter));
                }
            }
            tags::EXIT => check_exit_bounds(universe, world, child, issues),
            tags::CAMERA => {
                if let Some(aspect) = effective(universe, child, tags::ATTR_ASPECT)
                    && let Some(entry) =
                        aspect_counts.iter_mut().find(|(name, _)| *name == aspect)
                {
                    entry.1 += 1;
                }
            }
            _ => {}
        }
    }

    for (aspect, count) in aspect_counts {
        if count != 1 {
            issues.push((
                root,
                Issue::CameraAspectCount {
                    aspect: aspect.to_string(),
                    count,
                },
            ));
        }
    }
}

fn check_exit_bounds(
    universe: &Universe,
    world: WorldId,
    exit: ElementId,
    issues: &mut Vec<(ElementId, Issue)>,
) {
    let (Some(scene_root), _) = scene_shapes(universe, world) else {
        return;
    };
    let bound = |name| effective(universe, scene_root, name).and_then(parse_real);
    let (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) = (
        bound(tags::ATTR_MIN_X),
        bound(tags::ATTR_MIN_Y),
        bound(tags::ATTR_MAX_X),
        bound(tags::ATTR_MAX_Y),
    ) else {
        return;
    };
    // Unparseable positions are the attribute checks' business.
    let Some(pos) = effective(universe, exit, tags::ATTR_POS).and_then(Xy::parse) else {
        return;
    };
    if pos.x < min_x || pos.x > max_x || pos.y < min_y || pos.y > max_y {
        issues.push((exit, Issue::ExitOutOfBounds));
    }
}

/// Resource existence, extension casing, and unused-entry advice.
///
/// The unused check covers images only: sounds are triggered from game
/// scripts the document model does not see.
fn check_resources(
    universe: &Universe,
    world: WorldId,
    probe: &dyn ResourceProbe,
    issues: &mut Vec<(ElementId, Issue)>,
) {
    let Some(root) = universe
        .find_tree(world, tags::TREE_RESOURCES)
        .ok()
        .flatten()
        .and_then(|tree| universe.tree_root(tree).ok().flatten())
    else {
        return;
    };
    let Ok(level) = universe.world_key(world) else {
        return;
    };
    let level = level.to_string();
    let Ok(entries) = universe.children(root) else {
        return;
    };

    for &entry in entries.to_vec().iter() {
        let Ok(meta) = universe.element_meta(entry) else {
            continue;
        };
        let (extension, family) = match meta.tag.as_str() {
            tags::IMAGE => ("png", tags::FAMILY_IMAGE),
            tags::SOUND => ("ogg", tags::FAMILY_SOUND),
            _ => continue,
        };

        if let Some(path) = effective(universe, entry, tags::ATTR_PATH)
            && !path.is_empty()
        {
            let file = format!("{path}.{extension}");
            match probe.probe(&level, Path::new(&file)) {
                ProbeOutcome::Present => {}
                ProbeOutcome::WrongCase => {
                    issues.push((entry, Issue::ResourceCasing { path: file }));
                }
                ProbeOutcome::Missing => {
                    issues.push((entry, Issue::ResourceMissing { path: file }));
                }
            }
        }

        if family == tags::FAMILY_IMAGE
            && let Some(id) = effective(universe, entry, tags::ATTR_ID)
            && !id.is_empty()
            && universe.references_to(world, family, id).is_empty()
        {
            issues.push((
                entry,
                Issue::ResourceUnused {
                    identifier: id.to_string(),
                },
            ));
        }
    }
}
