//! Undo/redo journal behavior.

use std::sync::Arc;

use amy_doc::{ElementId, TreeId, Universe, WorldId};
use amy_schema::{AmySchema, tags};

struct Fixture {
    universe: Universe,
    schema: AmySchema,
    level: WorldId,
    scene: TreeId,
    scene_root: ElementId,
}

fn fixture() -> Fixture {
    let schema = amy_schema::build().expect("schema");
    let mut universe = Universe::new(Arc::clone(&schema.global));
    let level = universe
        .make_world(universe.root_world(), tags::WORLD_LEVEL, "intro")
        .unwrap();
    let scene = universe.create_tree(&schema.scene_tree);
    let scene_root = universe.create_element(&schema.scene_tree.root);
    universe.set_root(scene, Some(scene_root)).unwrap();
    universe.add_tree(level, scene).unwrap();
    universe.clear_history(level).unwrap();
    Fixture {
        universe,
        schema,
        level,
        scene,
        scene_root,
    }
}

fn add_rect(f: &mut Fixture, id: &str) -> ElementId {
    let meta = Arc::clone(&f.schema.scene_tree.root.child_spec(tags::RECTANGLE).unwrap().meta);
    let rect = f.universe.create_element(&meta);
    f.universe.set_attribute(rect, tags::ATTR_ID, id).unwrap();
    f.universe.append(f.scene_root, rect).unwrap();
    rect
}

fn first_child(f: &Fixture) -> ElementId {
    f.universe.children(f.scene_root).unwrap()[0]
}

#[test]
fn attribute_change_undoes_and_redoes() {
    let mut f = fixture();
    let rect = add_rect(&mut f, "rect_1");
    f.universe.set_attribute(rect, tags::ATTR_ANGLE, "45").unwrap();

    assert!(f.universe.undo(f.level).unwrap());
    assert_eq!(f.universe.attribute(rect, tags::ATTR_ANGLE).unwrap(), None);

    assert!(f.universe.redo(f.level).unwrap());
    assert_eq!(
        f.universe.attribute(rect, tags::ATTR_ANGLE).unwrap(),
        Some("45")
    );
}

#[test]
fn overwrite_undoes_to_previous_value() {
    let mut f = fixture();
    let rect = add_rect(&mut f, "rect_1");
    // pos is mandatory and was set by init; the undo of its first explicit
    // overwrite must restore the init value, not drop the attribute.
    f.universe.set_attribute(rect, tags::ATTR_POS, "5,5").unwrap();
    f.universe.undo(f.level).unwrap();
    assert_eq!(f.universe.attribute(rect, tags::ATTR_POS).unwrap(), Some("0,0"));
}

#[test]
fn insertion_undo_detaches_and_redo_restores_content() {
    let mut f = fixture();
    add_rect(&mut f, "rect_1");
    f.universe.undo(f.level).unwrap();
    assert!(f.universe.children(f.scene_root).unwrap().is_empty());
    assert!(!f.universe.identifier_exists(f.level, tags::FAMILY_GEOMETRY, "rect_1"));

    assert!(f.universe.redo(f.level).unwrap());
    let restored = first_child(&f);
    assert_eq!(
        f.universe.attribute(restored, tags::ATTR_ID).unwrap(),
        Some("rect_1")
    );
    assert!(f.universe.identifier_exists(f.level, tags::FAMILY_GEOMETRY, "rect_1"));
}

#[test]
fn removal_undo_restores_the_whole_subtree() {
    let mut f = fixture();
    let rect = add_rect(&mut f, "rect_1");
    let part_meta = Arc::clone(
        &f.universe.element_meta(rect).unwrap().child_spec(tags::CIRCLE).unwrap().meta,
    );
    let part = f.universe.create_element(&part_meta);
    f.universe.set_attribute(part, tags::ATTR_ID, "wheel").unwrap();
    f.universe.append(rect, part).unwrap();

    f.universe.remove(f.scene_root, rect).unwrap();
    f.universe.destroy_element(rect).unwrap();

    assert!(f.universe.undo(f.level).unwrap());
    let restored = first_child(&f);
    assert_eq!(
        f.universe.attribute(restored, tags::ATTR_ID).unwrap(),
        Some("rect_1")
    );
    let children = f.universe.children(restored).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(
        f.universe.attribute(children[0], tags::ATTR_ID).unwrap(),
        Some("wheel")
    );
    assert!(f.universe.identifier_exists(f.level, tags::FAMILY_GEOMETRY, "wheel"));
}

#[test]
fn composite_is_one_undo_step() {
    let mut f = fixture();
    f.universe.begin_composite(f.level).unwrap();
    add_rect(&mut f, "rect_1");
    add_rect(&mut f, "rect_2");
    add_rect(&mut f, "rect_3");
    f.universe.commit_composite(f.level).unwrap();

    assert_eq!(f.universe.children(f.scene_root).unwrap().len(), 3);
    assert!(f.universe.undo(f.level).unwrap());
    assert!(f.universe.children(f.scene_root).unwrap().is_empty());

    assert!(f.universe.redo(f.level).unwrap());
    assert_eq!(f.universe.children(f.scene_root).unwrap().len(), 3);
    let ids: Vec<_> = f
        .universe
        .children(f.scene_root)
        .unwrap()
        .iter()
        .map(|&c| f.universe.attribute(c, tags::ATTR_ID).unwrap().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["rect_1", "rect_2", "rect_3"]);
}

#[test]
fn new_edit_clears_redo() {
    let mut f = fixture();
    let rect = add_rect(&mut f, "rect_1");
    f.universe.undo(f.level).unwrap();
    assert!(f.universe.can_redo(f.level).unwrap());

    let _ = rect;
    add_rect(&mut f, "rect_9");
    assert!(!f.universe.can_redo(f.level).unwrap());
}

#[test]
fn undo_on_empty_journal_is_a_no_op() {
    let mut f = fixture();
    assert!(!f.universe.undo(f.level).unwrap());
    assert!(!f.universe.redo(f.level).unwrap());
}

#[test]
fn suspension_skips_recording() {
    let mut f = fixture();
    f.universe.suspend_undo(f.level).unwrap();
    add_rect(&mut f, "rect_1");
    f.universe.resume_undo(f.level).unwrap();

    assert!(!f.universe.can_undo(f.level).unwrap());
    assert!(f.universe.resume_undo(f.level).is_err());
}

#[test]
fn undo_replays_in_reverse_order() {
    let mut f = fixture();
    let rect = add_rect(&mut f, "rect_1");
    f.universe.begin_composite(f.level).unwrap();
    f.universe.set_attribute(rect, tags::ATTR_ANGLE, "10").unwrap();
    f.universe.set_attribute(rect, tags::ATTR_ANGLE, "20").unwrap();
    f.universe.commit_composite(f.level).unwrap();

    f.universe.undo(f.level).unwrap();
    assert_eq!(f.universe.attribute(rect, tags::ATTR_ANGLE).unwrap(), None);

    f.universe.redo(f.level).unwrap();
    assert_eq!(
        f.universe.attribute(rect, tags::ATTR_ANGLE).unwrap(),
        Some("20")
    );
}

#[test]
fn undo_is_per_world() {
    let mut f = fixture();
    add_rect(&mut f, "rect_1");

    let other = f
        .universe
        .make_world(f.universe.root_world(), tags::WORLD_LEVEL, "caves")
        .unwrap();
    assert!(!f.universe.can_undo(other).unwrap());
    assert!(f.universe.can_undo(f.level).unwrap());
}

#[test]
fn set_root_undo_restores_previous_root() {
    let mut f = fixture();
    add_rect(&mut f, "rect_1");
    f.universe.clear_history(f.level).unwrap();

    let old = f.universe.set_root(f.scene, None).unwrap().unwrap();
    f.universe.destroy_element(old).unwrap();
    assert_eq!(f.universe.tree_root(f.scene).unwrap(), None);

    assert!(f.universe.undo(f.level).unwrap());
    let root = f.universe.tree_root(f.scene).unwrap().unwrap();
    assert_eq!(f.universe.children(root).unwrap().len(), 1);
}
