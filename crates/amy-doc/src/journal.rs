//! Per-world undo journal.
//!
//! Every journaled mutation records its inverse as an [`InverseOp`]; a user
//! action groups one or more of them into a [`Composite`]. Undo replays a
//! composite's ops in reverse, and that replay records a fresh composite
//! which becomes the redo entry. Paths, not handles, address positions so
//! entries survive remove-then-reinsert cycles.

use std::collections::VecDeque;

use crate::error::{DocError, Result};
use crate::ids::WorldId;
use crate::path::ElementPath;
use crate::subtree::Subtree;
use crate::universe::Universe;

/// Maximum number of undoable composites kept per world.
pub(crate) const UNDO_DEPTH: usize = 100;

/// The inverse of a single journaled mutation.
#[derive(Debug, Clone)]
pub(crate) enum InverseOp {
    /// Re-materialize `subtree` at `at` (root set or child insert).
    Insert { at: ElementPath, subtree: Subtree },

    /// Detach and drop the element at `at`.
    Remove { at: ElementPath },

    /// Restore an attribute at `at` to `value` (`None` removes it).
    SetAttribute {
        at: ElementPath,
        name: String,
        value: Option<String>,
    },
}

/// One undoable user action: inverse ops in recording order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Composite {
    pub(crate) ops: Vec<InverseOp>,
}

/// Undo/redo state of one world.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    undo: VecDeque<Composite>,
    redo: Vec<Composite>,
    /// Open composite between `begin_composite` and `commit_composite`.
    current: Option<Composite>,
    /// Replay sink; set while undo/redo re-applies ops so their inverses
    /// land here instead of on the undo stack.
    scratch: Option<Composite>,
    suspended: u32,
}

impl Journal {
    /// Record one inverse op according to the current recording mode.
    pub(crate) fn record(&mut self, op: InverseOp) {
        if self.suspended > 0 {
            return;
        }
        if let Some(scratch) = &mut self.scratch {
            scratch.ops.push(op);
            return;
        }
        self.redo.clear();
        if let Some(current) = &mut self.current {
            current.ops.push(op);
        } else {
            self.push_undo(Composite { ops: vec![op] });
        }
    }

    fn push_undo(&mut self, composite: Composite) {
        self.undo.push_back(composite);
        if self.undo.len() > UNDO_DEPTH {
            self.undo.pop_front();
        }
    }

    /// Open a composite; ops recorded until commit become one undo entry.
    /// Nested begins fold into the already-open composite.
    pub(crate) fn begin(&mut self) {
        if self.current.is_none() {
            self.current = Some(Composite::default());
        }
    }

    /// Close the open composite. Empty composites are discarded.
    pub(crate) fn commit(&mut self) {
        if let Some(composite) = self.current.take()
            && !composite.ops.is_empty()
        {
            self.redo.clear();
            self.push_undo(composite);
        }
    }

    pub(crate) fn suspend(&mut self) {
        self.suspended += 1;
    }

    pub(crate) fn resume(&mut self) -> bool {
        if self.suspended == 0 {
            return false;
        }
        self.suspended -= 1;
        true
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Composite> {
        self.undo.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Composite> {
        self.redo.pop()
    }

    /// Start capturing replay inverses.
    pub(crate) fn start_replay(&mut self) {
        self.scratch = Some(Composite::default());
    }

    /// Stop capturing and hand back the captured composite.
    pub(crate) fn finish_replay(&mut self) -> Composite {
        self.scratch.take().unwrap_or_default()
    }

    pub(crate) fn push_redo(&mut self, composite: Composite) {
        self.redo.push(composite);
    }

    /// Re-push a composite produced by replaying a redo entry.
    pub(crate) fn push_undo_replayed(&mut self, composite: Composite) {
        self.push_undo(composite);
    }

    /// Drop all recorded history (used after loads).
    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.current = None;
    }
}

impl Universe {
    /// Open a composite on a world's journal; all journaled mutations up
    /// to the matching commit become one undo step.
    pub fn begin_composite(&mut self, world: WorldId) -> Result<()> {
        self.world_mut(world)?.journal.begin();
        Ok(())
    }

    /// Close the open composite; an empty composite leaves no undo step.
    pub fn commit_composite(&mut self, world: WorldId) -> Result<()> {
        self.world_mut(world)?.journal.commit();
        Ok(())
    }

    /// Stop recording undo steps for a world until the matching resume.
    /// Suspensions nest.
    pub fn suspend_undo(&mut self, world: WorldId) -> Result<()> {
        self.world_mut(world)?.journal.suspend();
        Ok(())
    }

    /// Undo the matching suspension.
    ///
    /// # Errors
    ///
    /// Fails when recording is not suspended.
    pub fn resume_undo(&mut self, world: WorldId) -> Result<()> {
        if self.world_mut(world)?.journal.resume() {
            Ok(())
        } else {
            Err(DocError::UnbalancedSuspension)
        }
    }

    pub fn can_undo(&self, world: WorldId) -> Result<bool> {
        Ok(self.world(world)?.journal.can_undo())
    }

    pub fn can_redo(&self, world: WorldId) -> Result<bool> {
        Ok(self.world(world)?.journal.can_redo())
    }

    /// Drop a world's undo and redo history, e.g. after a load.
    pub fn clear_history(&mut self, world: WorldId) -> Result<()> {
        self.world_mut(world)?.journal.clear();
        Ok(())
    }

    /// Undo the most recent composite on `world`. Returns `false` when
    /// there is nothing to undo.
    ///
    /// Replaying the composite records the matching redo entry; element
    /// handles inside the undone region are invalidated.
    pub fn undo(&mut self, world: WorldId) -> Result<bool> {
        let Some(composite) = self.world_mut(world)?.journal.pop_undo() else {
            return Ok(false);
        };
        self.world_mut(world)?.journal.start_replay();
        let result = self.apply_composite(world, &composite);
        let captured = self.world_mut(world)?.journal.finish_replay();
        result?;
        self.world_mut(world)?.journal.push_redo(captured);
        Ok(true)
    }

    /// Redo the most recently undone composite on `world`. Returns `false`
    /// when there is nothing to redo.
    pub fn redo(&mut self, world: WorldId) -> Result<bool> {
        let Some(composite) = self.world_mut(world)?.journal.pop_redo() else {
            return Ok(false);
        };
        self.world_mut(world)?.journal.start_replay();
        let result = self.apply_composite(world, &composite);
        let captured = self.world_mut(world)?.journal.finish_replay();
        result?;
        self.world_mut(world)?.journal.push_undo_replayed(captured);
        Ok(true)
    }

    pub(crate) fn record_op(&mut self, world: WorldId, op: InverseOp) {
        if let Some(data) = self.worlds.get_mut(&world) {
            data.journal.record(op);
        }
    }

    fn apply_composite(&mut self, world: WorldId, composite: &Composite) -> Result<()> {
        for op in composite.ops.iter().rev() {
            self.apply_inverse(world, op)?;
        }
        Ok(())
    }

    fn apply_inverse(&mut self, world: WorldId, op: &InverseOp) -> Result<()> {
        match op {
            InverseOp::Insert { at, subtree } => {
                let tree = self
                    .find_tree(world, &at.tree)?
                    .ok_or(DocError::JournalOutOfSync)?;
                if at.is_root() {
                    if self.tree_root(tree)?.is_some() {
                        return Err(DocError::JournalOutOfSync);
                    }
                    let element = self.materialize(subtree);
                    self.set_root(tree, Some(element))?;
                } else {
                    let parent_path = at.parent().ok_or(DocError::JournalOutOfSync)?;
                    let parent = self.resolve_path(world, &parent_path)?;
                    let index = at.last_index().ok_or(DocError::JournalOutOfSync)?;
                    let element = self.materialize(subtree);
                    self.insert(parent, index, element)?;
                }
                Ok(())
            }
            InverseOp::Remove { at } => {
                if at.is_root() {
                    let tree = self
                        .find_tree(world, &at.tree)?
                        .ok_or(DocError::JournalOutOfSync)?;
                    if let Some(old) = self.set_root(tree, None)? {
                        self.destroy_element(old)?;
                    }
                } else {
                    let element = self.resolve_path(world, at)?;
                    let parent = self.parent(element)?.ok_or(DocError::JournalOutOfSync)?;
                    self.remove(parent, element)?;
                    self.destroy_element(element)?;
                }
                Ok(())
            }
            InverseOp::SetAttribute { at, name, value } => {
                let element = self.resolve_path(world, at)?;
                match value {
                    Some(value) => self.set_attribute(element, name, value),
                    None => self.unset_attribute_raw(element, name),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str) -> InverseOp {
        InverseOp::SetAttribute {
            at: ElementPath::root("scene"),
            name: name.to_string(),
            value: None,
        }
    }

    #[test]
    fn single_ops_become_single_composites() {
        let mut journal = Journal::default();
        journal.record(op("a"));
        journal.record(op("b"));

        assert!(journal.can_undo());
        assert_eq!(journal.pop_undo().unwrap().ops.len(), 1);
        assert_eq!(journal.pop_undo().unwrap().ops.len(), 1);
        assert!(!journal.can_undo());
    }

    #[test]
    fn composite_groups_ops() {
        let mut journal = Journal::default();
        journal.begin();
        journal.record(op("a"));
        journal.record(op("b"));
        journal.commit();

        assert_eq!(journal.pop_undo().unwrap().ops.len(), 2);
        assert!(!journal.can_undo());
    }

    #[test]
    fn empty_composite_is_discarded() {
        let mut journal = Journal::default();
        journal.begin();
        journal.commit();
        assert!(!journal.can_undo());
    }

    #[test]
    fn recording_clears_redo() {
        let mut journal = Journal::default();
        journal.push_redo(Composite { ops: vec![op("r")] });
        assert!(journal.can_redo());

        journal.record(op("a"));
        assert!(!journal.can_redo());
    }

    #[test]
    fn suspension_drops_ops() {
        let mut journal = Journal::default();
        journal.suspend();
        journal.record(op("a"));
        assert!(journal.resume());
        assert!(!journal.can_undo());
        assert!(!journal.resume());
    }

    #[test]
    fn replay_captures_into_scratch() {
        let mut journal = Journal::default();
        journal.start_replay();
        journal.record(op("a"));
        let captured = journal.finish_replay();
        assert_eq!(captured.ops.len(), 1);
        assert!(!journal.can_undo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut journal = Journal::default();
        for _ in 0..(UNDO_DEPTH + 10) {
            journal.record(op("a"));
        }
        let mut count = 0;
        while journal.pop_undo().is_some() {
            count += 1;
        }
        assert_eq!(count, UNDO_DEPTH);
    }
}
