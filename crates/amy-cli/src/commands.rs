use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::warn;

use amy_cli::settings::Settings;
use amy_doc::{Universe, WorldId};
use amy_persistence::{GameDir, LevelStore, PACKED_SUFFIX, pack, unpack};
use amy_schema::tags;
use amy_validate::{DiskProbe, Engine, Severity};

use crate::cli::{FileArgs, LevelArgs, NewArgs, PlayArgs};
use crate::launch::launch_game;

/// Load a level, validate it, and print every finding.
///
/// Returns the aggregated level severity so the caller can pick the exit
/// code.
pub fn run_check(args: &LevelArgs) -> Result<Severity> {
    let (universe, engine, world) = load_and_validate(&args.game_dir, &args.level)?;
    let store = engine.store();

    let mut total = 0usize;
    for &tree in universe.trees_of(world)? {
        for element in universe.walk_tree(tree)? {
            let issues = store.issues_of(element);
            if issues.is_empty() {
                continue;
            }
            let path = match universe.path_of(element)? {
                Some(p) => p.to_string(),
                None => "?".to_string(),
            };
            for issue in issues {
                println!("{:<9} {path}: {}", issue.severity().as_str(), issue.message());
                total += 1;
            }
        }
    }

    let severity = store.world_severity(&universe, world);
    if total == 0 {
        println!("{}: no findings", args.level);
    } else {
        println!("{}: {total} finding(s), severity {}", args.level, severity.as_str());
    }
    Ok(severity)
}

/// Encrypt a plain document, writing it next to the input with a `.bin`
/// suffix appended.
pub fn run_pack(args: &FileArgs) -> Result<()> {
    let plain = fs::read(&args.file)
        .with_context(|| format!("read {}", args.file.display()))?;
    let mut name = args
        .file
        .file_name()
        .map(OsStr::to_os_string)
        .with_context(|| format!("{} has no file name", args.file.display()))?;
    name.push(".");
    name.push(PACKED_SUFFIX);
    let target = args.file.with_file_name(name);

    fs::write(&target, pack(&plain))
        .with_context(|| format!("write {}", target.display()))?;
    println!("packed {} -> {}", args.file.display(), target.display());
    Ok(())
}

/// Decrypt a packed document, writing it next to the input with the `.bin`
/// suffix stripped.
pub fn run_unpack(args: &FileArgs) -> Result<()> {
    if args.file.extension() != Some(OsStr::new(PACKED_SUFFIX)) {
        bail!(
            "{} is not a packed document (expected a .{PACKED_SUFFIX} suffix)",
            args.file.display()
        );
    }
    let packed = fs::read(&args.file)
        .with_context(|| format!("read {}", args.file.display()))?;
    let plain = unpack(&packed)
        .with_context(|| format!("decode {}", args.file.display()))?;
    let target = args.file.with_extension("");

    fs::write(&target, plain)
        .with_context(|| format!("write {}", target.display()))?;
    println!("unpacked {} -> {}", args.file.display(), target.display());
    Ok(())
}

/// Create a level: skeleton folders plus the three blank documents.
pub fn run_new(args: &NewArgs) -> Result<()> {
    let schema = amy_schema::build().context("build schema")?;
    let game = GameDir::new(&args.game_dir);
    game.create_level(&args.level)?;

    let mut universe = Universe::new(Arc::clone(&schema.global));
    let root = universe.root_world();
    let world = universe.make_world(root, tags::WORLD_LEVEL, &args.level)?;
    for tree_meta in [&schema.logic_tree, &schema.scene_tree, &schema.resources_tree] {
        let tree = universe.create_tree(tree_meta);
        let doc_root = universe.create_element(&tree_meta.root);
        universe.set_root(tree, Some(doc_root))?;
        universe.add_tree(world, tree)?;
    }

    let store = LevelStore::new(game)
        .with_backend(args.backend.into())
        .with_packed(args.packed);
    store.save_level(&mut universe, world)?;
    println!("created level '{}'", args.level);
    Ok(())
}

/// Print the level names of a game directory, one per line.
pub fn run_levels(game_dir: &Path) -> Result<()> {
    let game = GameDir::new(game_dir);
    for level in game.list_levels()? {
        println!("{level}");
    }
    Ok(())
}

/// Validate a level, then launch the game on it.
///
/// Critical findings refuse the launch; warnings are reported but do not
/// block it.
pub fn run_play(args: &PlayArgs) -> Result<()> {
    let (universe, engine, world) = load_and_validate(&args.game_dir, &args.level)?;
    let severity = engine.store().world_severity(&universe, world);
    if severity >= Severity::Critical {
        bail!(
            "level '{}' has critical findings; run `amyed check` for details",
            args.level
        );
    }
    if severity >= Severity::Warning {
        warn!(level = %args.level, "level has warnings; launching anyway");
    }

    let settings = Settings::load();
    let Some(exe) = args.game_exe.clone().or(settings.amy_path) else {
        bail!("no game executable configured; pass --game-exe or set amy_path in the settings");
    };
    launch_game(&exe, &args.game_dir, &args.level)
        .with_context(|| format!("launch {}", exe.display()))?;
    Ok(())
}

/// Load one level into a fresh universe and validate it synchronously.
fn load_and_validate(game_dir: &Path, level: &str) -> Result<(Universe, Engine, WorldId)> {
    let schema = amy_schema::build().context("build schema")?;
    let store = LevelStore::new(GameDir::new(game_dir));
    let mut universe = Universe::new(Arc::clone(&schema.global));
    let root = universe.root_world();
    let world = store
        .load_level(&mut universe, root, &schema, level)
        .with_context(|| format!("load level '{level}'"))?;

    let mut engine = Engine::new(Box::new(DiskProbe::new(store.game().levels_dir())));
    engine.validate_world_now(&universe, world);
    Ok((universe, engine, world))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BackendArg;

    #[test]
    fn new_level_is_loadable_and_checks_at_warning() {
        let dir = tempfile::tempdir().unwrap();
        run_new(&NewArgs {
            game_dir: dir.path().to_path_buf(),
            level: "caves".to_string(),
            backend: BackendArg::Xml,
            packed: false,
        })
        .unwrap();

        let game = GameDir::new(dir.path());
        for kind in amy_persistence::DocKind::ALL {
            assert!(game.doc_path("caves", kind, false).is_file());
        }

        // A blank level is missing its exit and cameras, but nothing worse.
        let severity = run_check(&LevelArgs {
            game_dir: dir.path().to_path_buf(),
            level: "caves".to_string(),
        })
        .unwrap();
        assert_eq!(severity, Severity::Warning);
    }

    #[test]
    fn new_packed_writes_bin_documents() {
        let dir = tempfile::tempdir().unwrap();
        run_new(&NewArgs {
            game_dir: dir.path().to_path_buf(),
            level: "caves".to_string(),
            backend: BackendArg::Keyval,
            packed: true,
        })
        .unwrap();

        let game = GameDir::new(dir.path());
        assert!(game
            .doc_path("caves", amy_persistence::DocKind::Scene, true)
            .is_file());
        assert!(!game
            .doc_path("caves", amy_persistence::DocKind::Scene, false)
            .is_file());
    }

    #[test]
    fn pack_then_unpack_round_trips_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let plain_path = dir.path().join("intro.scene");
        fs::write(&plain_path, b"<scene/>\n").unwrap();

        run_pack(&FileArgs {
            file: plain_path.clone(),
        })
        .unwrap();
        let packed_path = dir.path().join("intro.scene.bin");
        assert!(packed_path.is_file());
        assert_ne!(fs::read(&packed_path).unwrap(), b"<scene/>\n");

        fs::remove_file(&plain_path).unwrap();
        run_unpack(&FileArgs { file: packed_path }).unwrap();
        assert_eq!(fs::read(&plain_path).unwrap(), b"<scene/>\n");
    }

    #[test]
    fn unpack_rejects_files_without_the_packed_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intro.scene");
        fs::write(&path, b"<scene/>").unwrap();
        assert!(run_unpack(&FileArgs { file: path }).is_err());
    }

    #[test]
    fn play_refuses_an_unknown_level() {
        let dir = tempfile::tempdir().unwrap();
        let error = run_play(&PlayArgs {
            game_dir: dir.path().to_path_buf(),
            level: "ghost".to_string(),
            game_exe: None,
        })
        .unwrap_err();
        assert!(error.to_string().contains("ghost"));
    }
}
