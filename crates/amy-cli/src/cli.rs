//! CLI argument definitions for the Amy level tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use amy_persistence::Backend;

#[derive(Parser)]
#[command(
    name = "amyed",
    version,
    about = "Amy level tool - inspect, validate and pack game levels",
    long_about = "Work with the level documents of an Amy game directory.\n\n\
                  Loads the logic, scene and resource documents of a level,\n\
                  validates them against the game schema, converts between the\n\
                  plain and packed (encrypted) forms, and launches the game on\n\
                  a level for testing."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a level and report its validation findings.
    Check(LevelArgs),

    /// Encrypt a plain document into its packed .bin form.
    Pack(FileArgs),

    /// Decrypt a packed .bin document back to plain text.
    Unpack(FileArgs),

    /// Create a new level: skeleton folders plus blank documents.
    New(NewArgs),

    /// List the levels of a game directory.
    Levels(GameArgs),

    /// Validate a level, then launch the game on it.
    Play(PlayArgs),
}

#[derive(Parser)]
pub struct LevelArgs {
    /// Path to the game directory (the folder holding the executable).
    #[arg(value_name = "GAME_DIR")]
    pub game_dir: PathBuf,

    /// Level name (the per-level folder under resources/levels).
    #[arg(value_name = "LEVEL")]
    pub level: String,
}

#[derive(Parser)]
pub struct FileArgs {
    /// Document file to convert.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Parser)]
pub struct NewArgs {
    /// Path to the game directory.
    #[arg(value_name = "GAME_DIR")]
    pub game_dir: PathBuf,

    /// Name of the level to create.
    #[arg(value_name = "LEVEL")]
    pub level: String,

    /// Document form to write.
    #[arg(long = "backend", value_enum, default_value = "xml")]
    pub backend: BackendArg,

    /// Write the packed (encrypted) form the shipping game reads.
    #[arg(long = "packed")]
    pub packed: bool,
}

#[derive(Parser)]
pub struct GameArgs {
    /// Path to the game directory.
    #[arg(value_name = "GAME_DIR")]
    pub game_dir: PathBuf,
}

#[derive(Parser)]
pub struct PlayArgs {
    /// Path to the game directory.
    #[arg(value_name = "GAME_DIR")]
    pub game_dir: PathBuf,

    /// Level name to play.
    #[arg(value_name = "LEVEL")]
    pub level: String,

    /// Game executable to launch (overrides the stored amy_path setting).
    #[arg(long = "game-exe", value_name = "PATH")]
    pub game_exe: Option<PathBuf>,
}

/// Document backend choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Xml,
    Keyval,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Xml => Backend::Xml,
            BackendArg::Keyval => Backend::KeyValue,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
