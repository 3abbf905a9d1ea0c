//! The incremental validation engine.
//!
//! The engine consumes document events, queues the affected elements and
//! worlds, and settles them in budgeted ticks so a large paste or load
//! never stalls the editor. Findings live in the [`IssueStore`]; callers
//! query severities from there.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::{Duration, Instant};

use amy_doc::{DocEvent, ElementId, TreeId, Universe, WorldId};
use tracing::debug;

use crate::checks::{check_element, check_world_rules};
use crate::probe::ResourceProbe;
use crate::store::IssueStore;

/// Tick scheduling knobs.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Minimum time between two ticks driven by [`Engine::pump`].
    pub tick_period: Duration,
    /// Soft budget per tick; the queue carries over when it is exceeded.
    pub tick_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(300),
            tick_budget: Duration::from_millis(50),
        }
    }
}

enum Pending {
    Element(ElementId),
    Subtree(ElementId),
    Tree(TreeId),
}

/// Incremental validator over one universe.
pub struct Engine {
    config: EngineConfig,
    store: IssueStore,
    probe: Box<dyn ResourceProbe>,
    queue: VecDeque<Pending>,
    queued: HashSet<ElementId>,
    rule_worlds: BTreeSet<WorldId>,
    last_tick: Option<Instant>,
}

impl Engine {
    pub fn new(probe: Box<dyn ResourceProbe>) -> Self {
        Self::with_config(probe, EngineConfig::default())
    }

    pub fn with_config(probe: Box<dyn ResourceProbe>, config: EngineConfig) -> Self {
        Self {
            config,
            store: IssueStore::new(),
            probe,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            rule_worlds: BTreeSet::new(),
            last_tick: None,
        }
    }

    pub fn store(&self) -> &IssueStore {
        &self.store
    }

    /// Swap the resource probe, e.g. after the game directory changes.
    /// All level worlds are re-ruled on the next tick.
    pub fn set_probe(&mut self, probe: Box<dyn ResourceProbe>, universe: &Universe) {
        self.probe = probe;
        self.rule_worlds.extend(universe.all_worlds());
    }

    pub fn has_pending_work(&self) -> bool {
        !self.queue.is_empty() || !self.rule_worlds.is_empty()
    }

    /// Feed a batch of document events into the queues.
    pub fn observe(&mut self, universe: &Universe, events: &[DocEvent]) {
        for event in events {
            match event {
                DocEvent::WorldAdded { world } => {
                    self.rule_worlds.insert(*world);
                }
                DocEvent::WorldAboutToBeRemoved { world } => {
                    self.store.forget_world(*world);
                    self.rule_worlds.remove(world);
                }
                DocEvent::TreeAdded { world, tree } => {
                    self.queue.push_back(Pending::Tree(*tree));
                    self.rule_worlds.insert(*world);
                }
                DocEvent::TreeAboutToBeRemoved { world, .. } => {
                    // References into the detached tree may now dangle.
                    self.rule_worlds.insert(*world);
                }
                DocEvent::ElementAdded {
                    tree,
                    parent,
                    element,
                    ..
                } => {
                    self.queue.push_back(Pending::Subtree(*element));
                    if let Some(parent) = *parent {
                        self.enqueue_element(parent);
                    }
                    self.enqueue_rule_world(universe, *tree);
                    self.enqueue_identifier_neighbors(universe, *element);
                }
                DocEvent::ElementAboutToBeRemoved {
                    tree,
                    parent,
                    element,
                    ..
                } => {
                    self.store.forget(*element);
                    if let Some(parent) = *parent {
                        self.enqueue_element(parent);
                    }
                    // The removed subtree may have claimed identifiers other
                    // elements duplicate or reference; by the time the event
                    // is drained those values are gone, so recheck the world's
                    // trees wholesale.
                    self.enqueue_world_trees(universe, *tree);
                    self.enqueue_rule_world(universe, *tree);
                }
                DocEvent::AttributeUpdated {
                    tree,
                    element,
                    name,
                    new_value,
                    old_value,
                } => {
                    self.enqueue_element(*element);
                    self.enqueue_rule_world(universe, *tree);
                    self.enqueue_referers(universe, *element, name, old_value.as_deref());
                    self.enqueue_referers(universe, *element, name, new_value.as_deref());
                }
            }
        }
    }

    /// Drain the universe's event journal and run a tick when one is due.
    pub fn pump(&mut self, universe: &mut Universe) -> Vec<ElementId> {
        let events = universe.take_events();
        self.observe(universe, &events);

        let due = self
            .last_tick
            .is_none_or(|at| at.elapsed() >= self.config.tick_period);
        if due && (self.has_pending_work() || !events.is_empty()) {
            self.tick(universe)
        } else {
            Vec::new()
        }
    }

    /// Run one budgeted tick. Returns the elements whose findings changed.
    pub fn tick(&mut self, universe: &Universe) -> Vec<ElementId> {
        self.last_tick = Some(Instant::now());
        let deadline = Instant::now() + self.config.tick_budget;
        let mut changed = Vec::new();
        let mut settled = 0usize;

        while let Some(pending) = self.queue.pop_front() {
            match pending {
                Pending::Tree(tree) => {
                    if let Ok(Some(root)) = universe.tree_root(tree) {
                        self.queue.push_front(Pending::Subtree(root));
                    }
                }
                Pending::Subtree(element) => {
                    self.settle_element(universe, element, &mut changed);
                    if let Ok(children) = universe.children(element) {
                        for &child in children.iter().rev() {
                            self.queue.push_front(Pending::Subtree(child));
                        }
                    }
                }
                Pending::Element(element) => {
                    self.queued.remove(&element);
                    self.settle_element(universe, element, &mut changed);
                }
            }
            settled += 1;
            if Instant::now() >= deadline {
                break;
            }
        }

        while Instant::now() < deadline {
            let Some(world) = self.rule_worlds.pop_first() else {
                break;
            };
            if universe.world_meta(world).is_err() {
                continue;
            }
            let findings = check_world_rules(universe, world, self.probe.as_ref());
            changed.extend(self.store.set_world_rules(world, findings));
        }

        if !self.has_pending_work() {
            self.store.sweep(universe);
        }
        if settled > 0 {
            debug!(settled, carried = self.queue.len(), "validation tick");
        }

        changed.retain(|&element| universe.is_alive(element));
        changed.sort_unstable();
        changed.dedup();
        changed
    }

    /// Validate one world synchronously, ignoring period and budget.
    /// Used by batch checks; the store holds the results afterwards.
    pub fn validate_world_now(&mut self, universe: &Universe, world: WorldId) {
        let Ok(trees) = universe.trees_of(world) else {
            return;
        };
        for tree in trees.to_vec() {
            let Ok(elements) = universe.walk_tree(tree) else {
                continue;
            };
            for element in elements {
                let issues = check_element(universe, element);
                self.store.set_local(element, issues);
            }
        }
        let findings = check_world_rules(universe, world, self.probe.as_ref());
        self.store.set_world_rules(world, findings);
    }

    fn settle_element(
        &mut self,
        universe: &Universe,
        element: ElementId,
        changed: &mut Vec<ElementId>,
    ) {
        // Removed or detached elements carry no findings.
        let attached = universe.is_alive(element)
            && universe
                .containing_tree(element)
                .is_ok_and(|tree| tree.is_some());
        if !attached {
            self.store.forget(element);
            return;
        }
        if self.store.set_local(element, check_element(universe, element)) {
            changed.push(element);
        }
    }

    fn enqueue_element(&mut self, element: ElementId) {
        if self.queued.insert(element) {
            self.queue.push_back(Pending::Element(element));
        }
    }

    fn enqueue_world_trees(&mut self, universe: &Universe, tree: TreeId) {
        let Ok(Some(world)) = universe.tree_world(tree) else {
            return;
        };
        let Ok(trees) = universe.trees_of(world) else {
            return;
        };
        for &tree in trees {
            self.queue.push_back(Pending::Tree(tree));
        }
    }

    /// When an attached subtree claims identifiers, other claimants of the
    /// same values flip their duplicate state and dangling references onto
    /// those values heal; recheck them all.
    fn enqueue_identifier_neighbors(&mut self, universe: &Universe, element: ElementId) {
        let Ok(Some(world)) = universe.containing_world(element) else {
            return;
        };
        let mut targets = Vec::new();
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            let Ok(meta) = universe.element_meta(id) else {
                continue;
            };
            for attr in &meta.attributes {
                if !attr.is_identifier() {
                    continue;
                }
                let (Some(family), Some(kind)) = (attr.family(), attr.world_kind()) else {
                    continue;
                };
                let Ok(Some(value)) = universe.attribute(id, &attr.name) else {
                    continue;
                };
                if value.is_empty() {
                    continue;
                }
                let Some(scope) = universe.scope_world(world, kind) else {
                    continue;
                };
                targets.extend(universe.identifier_claimants(scope, family, value));
                targets.extend(
                    universe
                        .references_to(scope, family, value)
                        .into_iter()
                        .map(|(referer, _)| referer),
                );
            }
            if let Ok(children) = universe.children(id) {
                stack.extend(children);
            }
        }
        for target in targets {
            self.enqueue_element(target);
        }
    }

    fn enqueue_rule_world(&mut self, universe: &Universe, tree: TreeId) {
        if let Ok(Some(world)) = universe.tree_world(tree) {
            self.rule_worlds.insert(world);
        }
    }

    /// When an identifier changes, every element referring to the old or
    /// new value needs its dangling-reference state rechecked.
    fn enqueue_referers(
        &mut self,
        universe: &Universe,
        element: ElementId,
        name: &str,
        value: Option<&str>,
    ) {
        let Some(value) = value else { return };
        let Ok(meta) = universe.element_meta(element) else {
            return;
        };
        let Some(attr) = meta.attribute(name) else {
            return;
        };
        if !attr.is_identifier() {
            return;
        }
        let (Some(family), Some(kind)) = (attr.family(), attr.world_kind()) else {
            return;
        };
        let family = family.to_string();
        let Ok(Some(world)) = universe.containing_world(element) else {
            return;
        };
        let Some(scope) = universe.scope_world(world, kind) else {
            return;
        };
        let referers: Vec<ElementId> = universe
            .references_to(scope, &family, value)
            .into_iter()
            .map(|(referer, _)| referer)
            .collect();
        for referer in referers {
            self.enqueue_element(referer);
        }
        // Siblings claiming the same value flip their duplicate state.
        for claimant in universe.identifier_claimants(scope, &family, value) {
            self.enqueue_element(claimant);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("queue", &self.queue.len())
            .field("rule_worlds", &self.rule_worlds.len())
            .finish_non_exhaustive()
    }
}
