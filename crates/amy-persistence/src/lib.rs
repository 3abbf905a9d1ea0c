//! Persistent storage for Amy level documents.
//!
//! A level world serializes to three textual documents (`.level` game
//! logic, `.scene` geometry, `.resrc` manifest) under the game directory's
//! `resources/levels/<name>/` folder. Two backends produce the text:
//!
//! - structured markup (XML, the default), and
//! - indented key-value lines.
//!
//! Either form may additionally pass through the obfuscation codec
//! (AES-192-CBC, fixed key), producing `.bin`-suffixed packed files the
//! shipping game reads.
//!
//! # Architecture
//!
//! - `codec` - the pack/unpack cipher
//! - `format` - backend selection, version header
//! - `xml` / `keyval` - the two document forms
//! - `layout` - game directory path arithmetic
//! - `store` - level save/load with atomic writes
//! - `error` - error types with user-friendly messages

mod codec;
mod error;
mod format;
mod keyval;
mod layout;
mod store;
mod xml;

pub use codec::{CodecError, PACKED_SUFFIX, pack, unpack};
pub use error::{PersistenceError, Result};
pub use format::{Backend, FORMAT_VERSION, read_tree, strip_header, write_tree};
pub use layout::{DocKind, GameDir, LEVEL_SUBFOLDERS, LEVELS_SUBDIR, RESOURCES_SUBDIR};
pub use store::LevelStore;
