//! Structured-markup document form.
//!
//! One element per tag, attributes as tag attributes, children nested.
//! Reading is tolerant: undeclared attributes and tags are warned about and
//! skipped, everything else is driven by the target tree's meta-schema.

use std::path::Path;
use std::sync::Arc;

use amy_doc::{ElementId, Universe};
use amy_meta::{ElementMeta, TreeMeta};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::warn;

use crate::error::{PersistenceError, Result};
use crate::format::{discard_subtree, malformed};

pub(crate) fn write_element(universe: &Universe, root: ElementId) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_node(&mut writer, universe, root)?;
    let mut out = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    out.push('\n');
    Ok(out)
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    universe: &Universe,
    element: ElementId,
) -> Result<()> {
    let meta = Arc::clone(universe.element_meta(element)?);
    let mut start = BytesStart::new(meta.tag.as_str());
    // Declaration order keeps the files diffable.
    for attr in &meta.attributes {
        if let Some(value) = universe.attribute(element, &attr.name)? {
            start.push_attribute((attr.name.as_str(), value));
        }
    }

    let children = universe.children(element)?.to_vec();
    if children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(serialize)?;
    } else {
        writer.write_event(Event::Start(start)).map_err(serialize)?;
        for child in children {
            write_node(writer, universe, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(meta.tag.as_str())))
            .map_err(serialize)?;
    }
    Ok(())
}

fn serialize(source: std::io::Error) -> PersistenceError {
    PersistenceError::Serialization {
        source: Box::new(source),
    }
}

pub(crate) fn read_element(
    universe: &mut Universe,
    tree_meta: &Arc<TreeMeta>,
    text: &str,
    path: &Path,
) -> Result<ElementId> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<(ElementId, Arc<ElementMeta>)> = Vec::new();
    let mut root: Option<ElementId> = None;
    let mut skip_depth = 0usize;

    let outcome = loop {
        match reader.read_event() {
            Err(err) => break Err(malformed(path, err.to_string())),
            Ok(Event::Eof) => break Ok(()),
            Ok(Event::Start(start)) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                match open_node(universe, tree_meta, &stack, &start, path) {
                    Ok(Some((element, meta))) => {
                        if let Some((parent, _)) = stack.last() {
                            universe.append(*parent, element)?;
                        } else {
                            root = Some(element);
                        }
                        stack.push((element, meta));
                    }
                    Ok(None) => skip_depth = 1,
                    Err(err) => break Err(err),
                }
            }
            Ok(Event::Empty(start)) => {
                if skip_depth > 0 {
                    continue;
                }
                match open_node(universe, tree_meta, &stack, &start, path) {
                    Ok(Some((element, _))) => {
                        if let Some((parent, _)) = stack.last() {
                            universe.append(*parent, element)?;
                        } else {
                            root = Some(element);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => break Err(err),
                }
            }
            Ok(Event::End(_)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                if stack.pop().is_none() {
                    break Err(malformed(path, "unbalanced closing tag"));
                }
            }
            Ok(_) => {}
        }
    };

    match (outcome, root) {
        (Ok(()), Some(root)) => Ok(root),
        (Ok(()), None) => Err(malformed(path, "document has no root element")),
        (Err(err), root) => {
            if let Some(root) = root {
                discard_subtree(universe, root);
            }
            Err(err)
        }
    }
}

/// Create the element for one opening tag, or `None` when the tag is
/// undeclared and its subtree should be skipped.
fn open_node(
    universe: &mut Universe,
    tree_meta: &Arc<TreeMeta>,
    stack: &[(ElementId, Arc<ElementMeta>)],
    start: &BytesStart<'_>,
    path: &Path,
) -> Result<Option<(ElementId, Arc<ElementMeta>)>> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let meta = if let Some((_, parent_meta)) = stack.last() {
        match parent_meta.child_spec(&tag) {
            Some(spec) => Arc::clone(&spec.meta),
            None => {
                warn!(tag, parent = %parent_meta.tag, "skipping undeclared tag");
                return Ok(None);
            }
        }
    } else if tree_meta.root.tag == tag {
        Arc::clone(&tree_meta.root)
    } else {
        return Err(malformed(
            path,
            format!("root tag '{tag}' does not match '{}'", tree_meta.root.tag),
        ));
    };

    let element = universe.create_blank_element(&meta);
    for attr in start.attributes() {
        let attr = attr.map_err(|err| malformed(path, err.to_string()))?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(path, err.to_string()))?;
        if meta.has_attribute(&name) {
            universe.set_attribute(element, &name, &value)?;
        } else {
            warn!(tag, attribute = %name, "skipping undeclared attribute");
        }
    }
    Ok(Some((element, meta)))
}
