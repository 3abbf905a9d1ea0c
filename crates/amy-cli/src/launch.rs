//! Detached game launch.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

/// Spawn the game on `level`, with `game_dir` as working directory.
///
/// The level name is the single command-line argument the game expects.
/// The child is detached and never waited on; dropping the handle leaves
/// the game running on its own.
pub fn launch_game(exe: &Path, game_dir: &Path, level: &str) -> io::Result<()> {
    let child = Command::new(exe)
        .arg(level)
        .current_dir(game_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    info!(pid = child.id(), level, "launched game");
    Ok(())
}
