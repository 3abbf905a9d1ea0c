//! The on-disk game directory layout.
//!
//! ```text
//! <game>/
//!   <executable>
//!   resources/levels/<level>/
//!     <level>.level[.bin]   game logic
//!     <level>.scene[.bin]   scene geometry
//!     <level>.resrc[.bin]   resource manifest
//!     animations/ fx/ scripts/ textures/ sounds/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use amy_schema::tags;
use tracing::info;

use crate::codec::PACKED_SUFFIX;
use crate::error::{PersistenceError, Result};

pub const RESOURCES_SUBDIR: &str = "resources";
pub const LEVELS_SUBDIR: &str = "levels";

/// Asset subfolders created alongside the documents of a new level.
pub const LEVEL_SUBFOLDERS: [&str; 5] = ["animations", "fx", "scripts", "textures", "sounds"];

/// The three documents making up one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Logic,
    Scene,
    Resources,
}

impl DocKind {
    pub const ALL: [DocKind; 3] = [DocKind::Logic, DocKind::Scene, DocKind::Resources];

    pub fn extension(self) -> &'static str {
        match self {
            DocKind::Logic => "level",
            DocKind::Scene => "scene",
            DocKind::Resources => "resrc",
        }
    }

    /// The tree kind this document serializes.
    pub fn tree_kind(self) -> &'static str {
        match self {
            DocKind::Logic => tags::TREE_LOGIC,
            DocKind::Scene => tags::TREE_SCENE,
            DocKind::Resources => tags::TREE_RESOURCES,
        }
    }
}

/// Path arithmetic over one game directory.
#[derive(Debug, Clone)]
pub struct GameDir {
    root: PathBuf,
}

impl GameDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn levels_dir(&self) -> PathBuf {
        self.root.join(RESOURCES_SUBDIR).join(LEVELS_SUBDIR)
    }

    pub fn level_dir(&self, level: &str) -> PathBuf {
        self.levels_dir().join(level)
    }

    pub fn level_exists(&self, level: &str) -> bool {
        self.level_dir(level).is_dir()
    }

    /// Path of one level document, in plain or packed form.
    pub fn doc_path(&self, level: &str, kind: DocKind, packed: bool) -> PathBuf {
        let mut name = format!("{level}.{}", kind.extension());
        if packed {
            name.push('.');
            name.push_str(PACKED_SUFFIX);
        }
        self.level_dir(level).join(name)
    }

    /// Locate an existing document, preferring the plain form.
    pub fn find_doc(&self, level: &str, kind: DocKind) -> Option<(PathBuf, bool)> {
        let plain = self.doc_path(level, kind, false);
        if plain.is_file() {
            return Some((plain, false));
        }
        let packed = self.doc_path(level, kind, true);
        packed.is_file().then_some((packed, true))
    }

    /// Names of all level directories, sorted.
    pub fn list_levels(&self) -> Result<Vec<String>> {
        let dir = self.levels_dir();
        let entries = fs::read_dir(&dir).map_err(|source| PersistenceError::Io {
            operation: "read",
            path: dir,
            source,
        })?;
        let mut levels = Vec::new();
        for entry in entries.flatten() {
            if entry.path().is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                levels.push(name.to_string());
            }
        }
        levels.sort();
        Ok(levels)
    }

    /// Create the directory skeleton of a new level.
    pub fn create_level(&self, level: &str) -> Result<PathBuf> {
        if self.level_exists(level) {
            return Err(PersistenceError::LevelExists {
                name: level.to_string(),
            });
        }
        let dir = self.level_dir(level);
        self.make_skeleton(&dir)?;
        info!(level, path = %dir.display(), "created level skeleton");
        Ok(dir)
    }

    /// Clone an existing level's documents into a fresh skeleton.
    ///
    /// Asset subfolders are created but their contents are not copied; the
    /// documents keep referencing the source level's assets until edited.
    pub fn clone_level(&self, source: &str, target: &str) -> Result<PathBuf> {
        if !self.level_exists(source) {
            return Err(PersistenceError::UnknownLevel {
                name: source.to_string(),
            });
        }
        if self.level_exists(target) {
            return Err(PersistenceError::LevelExists {
                name: target.to_string(),
            });
        }
        let dir = self.level_dir(target);
        self.make_skeleton(&dir)?;
        for kind in DocKind::ALL {
            if let Some((from, packed)) = self.find_doc(source, kind) {
                let to = self.doc_path(target, kind, packed);
                fs::copy(&from, &to).map_err(|source| PersistenceError::Io {
                    operation: "copy",
                    path: from.clone(),
                    source,
                })?;
            }
        }
        info!(source, target, "cloned level");
        Ok(dir)
    }

    fn make_skeleton(&self, dir: &Path) -> Result<()> {
        for sub in LEVEL_SUBFOLDERS {
            let path = dir.join(sub);
            fs::create_dir_all(&path).map_err(|source| PersistenceError::Io {
                operation: "create directory",
                path,
                source,
            })?;
        }
        Ok(())
    }
}
