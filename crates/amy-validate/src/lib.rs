//! Incremental validation for document universes.
//!
//! Validation is advisory: the document model accepts structurally valid
//! edits regardless of findings, and this crate turns the resulting state
//! into [`Issue`]s. Three check groups run:
//!
//! - attribute checks (presence, emptiness, value kinds, references,
//!   identifier uniqueness), per element,
//! - cardinality checks against declared child bounds, per element,
//! - domain rules that read across the trees of one level world.
//!
//! The [`Engine`] consumes [`amy_doc::DocEvent`]s and settles affected
//! elements in budgeted ticks; batch callers use
//! [`Engine::validate_world_now`].

pub mod checks;
mod engine;
mod issue;
mod probe;
mod store;

pub use engine::{Engine, EngineConfig};
pub use issue::{Issue, IssueCategory, Severity};
pub use probe::{DiskProbe, NullProbe, ProbeOutcome, ResourceProbe};
pub use store::IssueStore;
