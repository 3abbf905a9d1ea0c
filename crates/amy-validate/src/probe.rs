//! Resource existence probing.
//!
//! The disk seam of the validation engine: resource rules ask a probe
//! whether a manifest path exists for a given level, instead of touching
//! the filesystem directly. Tests and headless runs swap in [`NullProbe`].

use std::path::{Path, PathBuf};

/// Outcome of probing one resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// File exists with the exact expected name.
    Present,
    /// File exists but only under a differently-cased name.
    WrongCase,
    Missing,
}

/// Looks up resource files referenced by a level's manifest.
pub trait ResourceProbe {
    /// Probe `relative` within the directory of the level keyed `level`.
    fn probe(&self, level: &str, relative: &Path) -> ProbeOutcome;
}

/// Probe that reports every path present; used when no game directory is
/// configured.
#[derive(Debug, Default)]
pub struct NullProbe;

impl ResourceProbe for NullProbe {
    fn probe(&self, _level: &str, _relative: &Path) -> ProbeOutcome {
        ProbeOutcome::Present
    }
}

/// Filesystem probe rooted at a levels directory.
///
/// Casing is checked by listing the parent directory, so a wrongly-cased
/// extension is caught even on case-insensitive filesystems.
#[derive(Debug)]
pub struct DiskProbe {
    levels_root: PathBuf,
}

impl DiskProbe {
    pub fn new(levels_root: impl Into<PathBuf>) -> Self {
        Self {
            levels_root: levels_root.into(),
        }
    }
}

impl ResourceProbe for DiskProbe {
    fn probe(&self, level: &str, relative: &Path) -> ProbeOutcome {
        let full = self.levels_root.join(level).join(relative);
        let (Some(parent), Some(name)) = (full.parent(), full.file_name()) else {
            return ProbeOutcome::Missing;
        };
        let Ok(entries) = parent.read_dir() else {
            return ProbeOutcome::Missing;
        };

        let wanted = name.to_string_lossy();
        let mut case_mismatch = false;
        for entry in entries.flatten() {
            let found = entry.file_name();
            if found == name {
                return ProbeOutcome::Present;
            }
            if found.to_string_lossy().eq_ignore_ascii_case(&wanted) {
                case_mismatch = true;
            }
        }
        if case_mismatch {
            ProbeOutcome::WrongCase
        } else {
            ProbeOutcome::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn disk_probe_distinguishes_missing_and_miscased() {
        let dir = tempfile::tempdir().unwrap();
        let level_dir = dir.path().join("intro").join("textures");
        fs::create_dir_all(&level_dir).unwrap();
        fs::write(level_dir.join("wall.png"), b"png").unwrap();
        fs::write(level_dir.join("sky.PNG"), b"png").unwrap();

        let probe = DiskProbe::new(dir.path());
        assert_eq!(
            probe.probe("intro", Path::new("textures/wall.png")),
            ProbeOutcome::Present
        );
        assert_eq!(
            probe.probe("intro", Path::new("textures/sky.png")),
            ProbeOutcome::WrongCase
        );
        assert_eq!(
            probe.probe("intro", Path::new("textures/floor.png")),
            ProbeOutcome::Missing
        );
        assert_eq!(
            probe.probe("caves", Path::new("textures/wall.png")),
            ProbeOutcome::Missing
        );
    }

    #[test]
    fn null_probe_reports_everything_present() {
        assert_eq!(
            NullProbe.probe("intro", Path::new("anything.png")),
            ProbeOutcome::Present
        );
    }
}
