//! Issue storage and severity aggregation.

use std::collections::HashMap;

use amy_doc::{ElementId, TreeId, Universe, WorldId};

use crate::issue::{Issue, Severity};

/// The engine's view of every known issue.
///
/// Per-element findings (attribute and cardinality checks) and world-rule
/// findings are kept in separate buckets, so a rule sweep never clobbers
/// element results and vice versa.
#[derive(Debug, Default)]
pub struct IssueStore {
    local: HashMap<ElementId, Vec<Issue>>,
    rules: HashMap<ElementId, Vec<Issue>>,
    rule_owners: HashMap<WorldId, Vec<ElementId>>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the per-element findings of one element. Returns true when
    /// the stored findings actually changed.
    pub fn set_local(&mut self, element: ElementId, issues: Vec<Issue>) -> bool {
        if issues.is_empty() {
            return self.local.remove(&element).is_some();
        }
        match self.local.get(&element) {
            Some(existing) if *existing == issues => false,
            _ => {
                self.local.insert(element, issues);
                true
            }
        }
    }

    /// Replace the rule findings of one world.
    ///
    /// Returns every element whose rule findings changed, including
    /// previous owners whose findings were cleared.
    pub fn set_world_rules(
        &mut self,
        world: WorldId,
        findings: Vec<(ElementId, Issue)>,
    ) -> Vec<ElementId> {
        let mut fresh: HashMap<ElementId, Vec<Issue>> = HashMap::new();
        for (element, issue) in findings {
            fresh.entry(element).or_default().push(issue);
        }

        let mut affected = Vec::new();
        for element in self.rule_owners.remove(&world).unwrap_or_default() {
            if !fresh.contains_key(&element) {
                self.rules.remove(&element);
                affected.push(element);
            }
        }
        let mut owners: Vec<ElementId> = fresh.keys().copied().collect();
        owners.sort_unstable();
        for (element, issues) in fresh {
            if self.rules.get(&element) != Some(&issues) {
                if !affected.contains(&element) {
                    affected.push(element);
                }
                self.rules.insert(element, issues);
            }
        }
        self.rule_owners.insert(world, owners);
        affected
    }

    /// Drop every finding attached to one element.
    pub fn forget(&mut self, element: ElementId) {
        self.local.remove(&element);
        self.rules.remove(&element);
    }

    /// Drop the rule findings of one world.
    pub fn forget_world(&mut self, world: WorldId) {
        if let Some(owners) = self.rule_owners.remove(&world) {
            for element in owners {
                self.rules.remove(&element);
            }
        }
    }

    /// All findings on one element, per-element checks first.
    pub fn issues_of(&self, element: ElementId) -> Vec<&Issue> {
        let mut out: Vec<&Issue> = Vec::new();
        if let Some(issues) = self.local.get(&element) {
            out.extend(issues.iter());
        }
        if let Some(issues) = self.rules.get(&element) {
            out.extend(issues.iter());
        }
        out
    }

    /// Highest severity of the element's own findings.
    pub fn own_severity(&self, element: ElementId) -> Severity {
        self.issues_of(element)
            .iter()
            .map(|issue| issue.severity())
            .max()
            .unwrap_or(Severity::None)
    }

    /// Highest severity across the element and all its descendants.
    pub fn element_severity(&self, universe: &Universe, element: ElementId) -> Severity {
        let mut worst = self.own_severity(element);
        if worst == Severity::Critical {
            return worst;
        }
        if let Ok(children) = universe.children(element) {
            for &child in children {
                worst = worst.max(self.element_severity(universe, child));
                if worst == Severity::Critical {
                    break;
                }
            }
        }
        worst
    }

    /// Highest severity across one tree.
    pub fn tree_severity(&self, universe: &Universe, tree: TreeId) -> Severity {
        match universe.tree_root(tree) {
            Ok(Some(root)) => self.element_severity(universe, root),
            _ => Severity::None,
        }
    }

    /// Highest severity across every tree of one world. Child worlds are
    /// not included; they carry their own verdicts.
    pub fn world_severity(&self, universe: &Universe, world: WorldId) -> Severity {
        let Ok(trees) = universe.trees_of(world) else {
            return Severity::None;
        };
        trees
            .iter()
            .map(|&tree| self.tree_severity(universe, tree))
            .max()
            .unwrap_or(Severity::None)
    }

    /// Drop findings whose element no longer exists or is detached.
    pub fn sweep(&mut self, universe: &Universe) {
        let attached = |element: &ElementId| {
            universe.is_alive(*element)
                && universe
                    .containing_tree(*element)
                    .is_ok_and(|tree| tree.is_some())
        };
        self.local.retain(|element, _| attached(element));
        self.rules.retain(|element, _| attached(element));
        for owners in self.rule_owners.values_mut() {
            owners.retain(attached);
        }
    }

    pub fn clear(&mut self) {
        self.local.clear();
        self.rules.clear();
        self.rule_owners.clear();
    }
}
