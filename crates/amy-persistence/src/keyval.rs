//! Indented key-value document form, the alternate backend.
//!
//! Each element is a mapping of `name: value` lines; child elements sit
//! under a `children:` key, each introduced by a `- tag` list entry. All
//! attribute values are single-line scalar strings, written verbatim.
//!
//! ```text
//! level
//!   name: Intro
//!   children:
//!     - camera
//!       aspect: normal
//!       pos: 0,0
//! ```

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use amy_doc::{ElementId, Universe};
use amy_meta::{ElementMeta, TreeMeta};
use tracing::warn;

use crate::error::Result;
use crate::format::{discard_subtree, malformed};

const CHILDREN_KEY: &str = "children:";

pub(crate) fn write_element(universe: &Universe, root: ElementId) -> Result<String> {
    let mut out = String::new();
    let meta = universe.element_meta(root)?;
    out.push_str(&meta.tag);
    out.push('\n');
    write_body(universe, root, 1, &mut out)?;
    Ok(out)
}

fn write_body(
    universe: &Universe,
    element: ElementId,
    depth: usize,
    out: &mut String,
) -> Result<()> {
    let pad = "  ".repeat(depth);
    let meta = Arc::clone(universe.element_meta(element)?);
    for attr in &meta.attributes {
        if let Some(value) = universe.attribute(element, &attr.name)? {
            let _ = writeln!(out, "{pad}{}: {value}", attr.name);
        }
    }
    let children = universe.children(element)?.to_vec();
    if !children.is_empty() {
        let _ = writeln!(out, "{pad}{CHILDREN_KEY}");
        for child in children {
            let child_meta = universe.element_meta(child)?;
            let _ = writeln!(out, "{pad}  - {}", child_meta.tag);
            write_body(universe, child, depth + 2, out)?;
        }
    }
    Ok(())
}

struct Lines<'a> {
    items: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let items = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let trimmed = line.trim_start();
                (line.len() - trimmed.len(), trimmed.trim_end())
            })
            .collect();
        Self { items, pos: 0 }
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.items.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let item = self.peek();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    /// Drop every line indented deeper than `indent`.
    fn skip_block(&mut self, indent: usize) {
        while let Some((next_indent, _)) = self.peek() {
            if next_indent <= indent {
                break;
            }
            self.pos += 1;
        }
    }
}

pub(crate) fn read_element(
    universe: &mut Universe,
    tree_meta: &Arc<TreeMeta>,
    text: &str,
    path: &Path,
) -> Result<ElementId> {
    let mut lines = Lines::new(text);
    let Some((indent, tag)) = lines.next() else {
        return Err(malformed(path, "document has no root element"));
    };
    if tag != tree_meta.root.tag {
        return Err(malformed(
            path,
            format!("root tag '{tag}' does not match '{}'", tree_meta.root.tag),
        ));
    }

    let meta = Arc::clone(&tree_meta.root);
    let root = universe.create_blank_element(&meta);
    match parse_body(universe, &mut lines, root, &meta, indent, path) {
        Ok(()) => Ok(root),
        Err(err) => {
            discard_subtree(universe, root);
            Err(err)
        }
    }
}

fn parse_body(
    universe: &mut Universe,
    lines: &mut Lines<'_>,
    element: ElementId,
    meta: &Arc<ElementMeta>,
    indent: usize,
    path: &Path,
) -> Result<()> {
    while let Some((line_indent, line)) = lines.peek() {
        if line_indent <= indent {
            break;
        }
        if line == CHILDREN_KEY {
            lines.next();
            parse_children(universe, lines, element, meta, line_indent, path)?;
        } else if let Some((name, value)) = line.split_once(':') {
            lines.next();
            let name = name.trim();
            let value = value.trim();
            if meta.has_attribute(name) {
                universe.set_attribute(element, name, value)?;
            } else {
                warn!(tag = %meta.tag, attribute = %name, "skipping undeclared attribute");
            }
        } else {
            return Err(malformed(path, format!("unexpected line '{line}'")));
        }
    }
    Ok(())
}

fn parse_children(
    universe: &mut Universe,
    lines: &mut Lines<'_>,
    parent: ElementId,
    parent_meta: &Arc<ElementMeta>,
    key_indent: usize,
    path: &Path,
) -> Result<()> {
    while let Some((entry_indent, line)) = lines.peek() {
        if entry_indent <= key_indent {
            break;
        }
        let Some(tag) = line.strip_prefix("- ") else {
            break;
        };
        lines.next();
        let tag = tag.trim();
        match parent_meta.child_spec(tag) {
            Some(spec) => {
                let meta = Arc::clone(&spec.meta);
                let child = universe.create_blank_element(&meta);
                match parse_body(universe, lines, child, &meta, entry_indent, path) {
                    Ok(()) => universe.append(parent, child)?,
                    Err(err) => {
                        discard_subtree(universe, child);
                        return Err(err);
                    }
                }
            }
            None => {
                warn!(tag, parent = %parent_meta.tag, "skipping undeclared tag");
                lines.skip_block(entry_indent);
            }
        }
    }
    Ok(())
}
