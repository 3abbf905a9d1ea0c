//! Per-element attribute checks.

use std::sync::Arc;

use amy_doc::{ElementId, Universe};

use crate::issue::Issue;

/// Compute the attribute issues of one element.
///
/// Declared attributes are evaluated in declaration order: presence (with
/// defaults applied), emptiness, kind check, then reference resolution and
/// identifier uniqueness against the tracker. Stale handles yield no
/// issues; the element is simply gone.
pub fn check_attributes(universe: &Universe, element: ElementId) -> Vec<Issue> {
    let Ok(meta) = universe.element_meta(element) else {
        return Vec::new();
    };
    let meta = Arc::clone(meta);
    let world = universe.containing_world(element).ok().flatten();

    let mut issues = Vec::new();
    for attr in &meta.attributes {
        let explicit = universe.attribute(element, &attr.name).ok().flatten();
        let effective = explicit.or(attr.default.as_deref());

        let Some(value) = effective else {
            if attr.mandatory {
                issues.push(Issue::MandatoryMissing {
                    attribute: attr.name.clone(),
                });
            }
            continue;
        };
        if value.is_empty() {
            if !attr.allow_empty {
                issues.push(Issue::EmptyValue {
                    attribute: attr.name.clone(),
                });
            }
            continue;
        }

        if let Err(err) = attr.kind.check(value) {
            issues.push(Issue::InvalidValue {
                attribute: attr.name.clone(),
                value: value.to_string(),
                detail: err.describe(),
            });
            continue;
        }

        let Some(world) = world else { continue };
        if attr.is_reference()
            && let Some(family) = attr.family()
            && !universe.identifier_exists(world, family, value)
        {
            issues.push(Issue::DanglingReference {
                attribute: attr.name.clone(),
                family: family.to_string(),
                value: value.to_string(),
            });
        }
        if attr.is_identifier()
            && let (Some(family), Some(kind)) = (attr.family(), attr.world_kind())
            && let Some(scope) = universe.scope_world(world, kind)
            && universe.identifier_claimants(scope, family, value).len() > 1
        {
            issues.push(Issue::DuplicateIdentifier {
                attribute: attr.name.clone(),
                value: value.to_string(),
            });
        }
    }
    issues
}
