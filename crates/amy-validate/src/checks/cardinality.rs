//! Per-element child-cardinality checks.

use amy_doc::{ElementId, Universe};

use crate::issue::Issue;

/// Compare the element's children against its declared occurrence bounds.
pub fn check_cardinality(universe: &Universe, element: ElementId) -> Vec<Issue> {
    let Ok(meta) = universe.element_meta(element) else {
        return Vec::new();
    };
    let Ok(children) = universe.children(element) else {
        return Vec::new();
    };

    let mut issues = Vec::new();
    for spec in &meta.children {
        if spec.is_unconstrained() {
            continue;
        }
        let count = children
            .iter()
            .filter(|&&child| {
                universe
                    .element_meta(child)
                    .is_ok_and(|m| m.tag == spec.meta.tag)
            })
            .count() as u32;
        if count < spec.min_occurrence || count > spec.max_occurrence {
            issues.push(Issue::CardinalityMismatch {
                child: spec.meta.tag.clone(),
                count,
                min: spec.min_occurrence,
                max: spec.max_occurrence,
            });
        }
    }
    issues
}
