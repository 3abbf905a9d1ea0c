//! The three check groups: attributes, cardinality, domain rules.

mod attributes;
mod cardinality;
mod rules;

pub use attributes::check_attributes;
pub use cardinality::check_cardinality;
pub use rules::check_world_rules;

use amy_doc::{ElementId, Universe};

use crate::issue::Issue;

/// All per-element issues of one element: attribute checks followed by
/// cardinality checks.
pub fn check_element(universe: &Universe, element: ElementId) -> Vec<Issue> {
    let mut issues = check_attributes(universe, element);
    issues.extend(check_cardinality(universe, element));
    issues
}
