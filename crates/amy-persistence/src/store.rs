//! Level save and load.
//!
//! Saving writes all three documents of a level world atomically (temp
//! file + rename) and clears the world's dirty set. Saving a read-only
//! world is a no-op that keeps the dirty set, so the caller's state still
//! reflects the unsaved edits.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use amy_doc::{Universe, WorldId};
use amy_schema::{AmySchema, tags};
use tracing::{info, warn};

use crate::codec;
use crate::error::{PersistenceError, Result};
use crate::format::{self, Backend};
use crate::layout::{DocKind, GameDir};

/// Reads and writes the levels of one game directory.
#[derive(Debug)]
pub struct LevelStore {
    game: GameDir,
    backend: Backend,
    packed: bool,
}

impl LevelStore {
    pub fn new(game: GameDir) -> Self {
        Self {
            game,
            backend: Backend::default(),
            packed: false,
        }
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Write the packed (encrypted) form on save.
    #[must_use]
    pub fn with_packed(mut self, packed: bool) -> Self {
        self.packed = packed;
        self
    }

    pub fn game(&self) -> &GameDir {
        &self.game
    }

    /// Save every document of one level world.
    pub fn save_level(&self, universe: &mut Universe, world: WorldId) -> Result<()> {
        let name = universe.world_key(world)?.to_string();
        if universe.is_world_read_only(world)? {
            warn!(level = %name, "world is read-only; save skipped");
            return Ok(());
        }

        for kind in DocKind::ALL {
            let Some(tree) = universe.find_tree(world, kind.tree_kind())? else {
                continue;
            };
            let text = format::write_tree(universe, tree, self.backend)?;
            let bytes = if self.packed {
                codec::pack(text.as_bytes())
            } else {
                text.into_bytes()
            };
            write_atomic(&self.game.doc_path(&name, kind, self.packed), &bytes)?;
        }
        universe.mark_clean(world)?;
        info!(level = %name, "saved level");
        Ok(())
    }

    /// Load a level into a fresh child world of `parent`.
    pub fn load_level(
        &self,
        universe: &mut Universe,
        parent: WorldId,
        schema: &AmySchema,
        name: &str,
    ) -> Result<WorldId> {
        if !self.game.level_exists(name) {
            return Err(PersistenceError::UnknownLevel {
                name: name.to_string(),
            });
        }
        let world = universe.make_world(parent, tags::WORLD_LEVEL, name)?;
        match self.load_documents(universe, world, schema, name) {
            Ok(()) => {
                universe.mark_clean(world)?;
                universe.clear_history(world)?;
                info!(level = name, "loaded level");
                Ok(world)
            }
            Err(err) => {
                let _ = universe.remove_world(world);
                Err(err)
            }
        }
    }

    fn load_documents(
        &self,
        universe: &mut Universe,
        world: WorldId,
        schema: &AmySchema,
        name: &str,
    ) -> Result<()> {
        for kind in DocKind::ALL {
            let Some((path, packed)) = self.game.find_doc(name, kind) else {
                return Err(PersistenceError::MissingDocument {
                    level: name.to_string(),
                    extension: kind.extension(),
                });
            };
            let bytes = fs::read(&path).map_err(|source| PersistenceError::Io {
                operation: "read",
                path: path.clone(),
                source,
            })?;
            let bytes = if packed {
                codec::unpack(&bytes)
                    .map_err(|err| format::malformed(&path, err.to_string()))?
            } else {
                bytes
            };
            let text = String::from_utf8(bytes)
                .map_err(|_| format::malformed(&path, "not valid UTF-8"))?;

            let tree_meta = match kind {
                DocKind::Logic => &schema.logic_tree,
                DocKind::Scene => &schema.scene_tree,
                DocKind::Resources => &schema.resources_tree,
            };
            let tree = format::read_tree(universe, tree_meta, &text, &path, self.backend)?;
            universe.add_tree(world, tree)?;
        }
        Ok(())
    }
}

/// Write to a temp file first, then rename for atomicity.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut temp_name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    let mut file = File::create(&temp_path).map_err(|source| PersistenceError::Io {
        operation: "create",
        path: temp_path.clone(),
        source,
    })?;
    file.write_all(bytes).map_err(|source| PersistenceError::Io {
        operation: "write",
        path: temp_path.clone(),
        source,
    })?;
    file.sync_all().map_err(|source| PersistenceError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source,
    })?;

    fs::rename(&temp_path, path).map_err(|source| PersistenceError::AtomicWriteFailed {
        temp_path,
        target_path: path.to_path_buf(),
        source,
    })
}
