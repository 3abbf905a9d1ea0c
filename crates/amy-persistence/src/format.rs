//! Backend selection and the version header.
//!
//! Two textual document forms coexist; the owning process picks one via a
//! configuration flag. Both carry a first-line header naming the producing
//! editor version, which is stripped on read.

use std::path::Path;
use std::sync::Arc;

use amy_doc::{ElementId, TreeId, Universe};
use amy_meta::TreeMeta;

use crate::error::{PersistenceError, Result};
use crate::{keyval, xml};

/// Version written into the file header.
pub const FORMAT_VERSION: u32 = 1;

/// The textual document form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Structured markup (the shipping default).
    #[default]
    Xml,
    /// Indented key-value lines.
    KeyValue,
}

impl Backend {
    pub fn header(self) -> String {
        match self {
            Backend::Xml => format!("<!-- amyed v{FORMAT_VERSION} -->\n"),
            Backend::KeyValue => format!("# amyed v{FORMAT_VERSION}\n"),
        }
    }
}

/// Drop the header line if the text starts with one.
pub fn strip_header(text: &str) -> &str {
    let Some((first, rest)) = text.split_once('\n') else {
        return text;
    };
    let line = first.trim();
    let is_header = line.contains("amyed")
        && ((line.starts_with("<!--") && line.ends_with("-->")) || line.starts_with('#'));
    if is_header { rest } else { text }
}

/// Serialize one attached tree to its textual form, header included.
pub fn write_tree(universe: &Universe, tree: TreeId, backend: Backend) -> Result<String> {
    let Some(root) = universe.tree_root(tree)? else {
        return Ok(backend.header());
    };
    let body = match backend {
        Backend::Xml => xml::write_element(universe, root)?,
        Backend::KeyValue => keyval::write_element(universe, root)?,
    };
    Ok(format!("{}{body}", backend.header()))
}

/// Parse `text` into a fresh detached tree of `meta`'s kind.
///
/// The header is stripped first. `path` only labels errors.
pub fn read_tree(
    universe: &mut Universe,
    meta: &Arc<TreeMeta>,
    text: &str,
    path: &Path,
    backend: Backend,
) -> Result<TreeId> {
    let body = strip_header(text);
    let root = match backend {
        Backend::Xml => xml::read_element(universe, meta, body, path)?,
        Backend::KeyValue => keyval::read_element(universe, meta, body, path)?,
    };
    let tree = universe.create_tree(meta);
    universe.set_root(tree, Some(root))?;
    Ok(tree)
}

pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> PersistenceError {
    PersistenceError::MalformedFile {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Drop a detached element tree that failed to attach, e.g. after a parse
/// error further into the file.
pub(crate) fn discard_subtree(universe: &mut Universe, root: ElementId) {
    let mut stack = vec![root];
    let mut order = Vec::new();
    while let Some(id) = stack.pop() {
        order.push(id);
        if let Ok(children) = universe.children(id) {
            stack.extend(children);
        }
    }
    for id in order.into_iter().rev() {
        if let Ok(Some(parent)) = universe.parent(id) {
            let _ = universe.remove(parent, id);
        }
        let _ = universe.destroy_element(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_stripped_on_read() {
        assert_eq!(strip_header("<!-- amyed v1 -->\n<scene/>"), "<scene/>");
        assert_eq!(strip_header("# amyed v1\nscene\n"), "scene\n");
        assert_eq!(strip_header("<scene/>"), "<scene/>");
        assert_eq!(strip_header("# plain comment\nscene"), "# plain comment\nscene");
    }

    #[test]
    fn headers_carry_the_format_version() {
        assert!(Backend::Xml.header().contains("v1"));
        assert!(Backend::KeyValue.header().starts_with('#'));
    }
}
