//! Round trips through the markup backends, the codec, and the store.

use std::sync::Arc;

use amy_doc::{ElementId, Universe, WorldId};
use amy_persistence::{
    Backend, DocKind, GameDir, LevelStore, PersistenceError, read_tree, strip_header, write_tree,
};
use amy_schema::{AmySchema, tags};

struct Fixture {
    universe: Universe,
    schema: AmySchema,
    level: WorldId,
}

fn fixture() -> Fixture {
    let schema = amy_schema::build().expect("schema");
    let mut universe = Universe::new(Arc::clone(&schema.global));
    let level = universe
        .make_world(universe.root_world(), tags::WORLD_LEVEL, "intro")
        .unwrap();
    Fixture {
        universe,
        schema,
        level,
    }
}

impl Fixture {
    /// Attach a populated scene tree: two shapes, one with a part.
    fn populate_scene(&mut self) {
        let u = &mut self.universe;
        let tree = u.create_tree(&self.schema.scene_tree);
        let root = u.create_element(&self.schema.scene_tree.root);
        u.set_root(tree, Some(root)).unwrap();

        let rect_meta = Arc::clone(
            &self
                .schema
                .scene_tree
                .root
                .child_spec(tags::RECTANGLE)
                .unwrap()
                .meta,
        );
        let rect = u.create_element(&rect_meta);
        u.set_attribute(rect, tags::ATTR_ID, "cart").unwrap();
        u.set_attribute(rect, tags::ATTR_POS, "10,20").unwrap();
        u.set_attribute(rect, tags::ATTR_MASS, "5").unwrap();
        u.append(root, rect).unwrap();

        let wheel_meta = Arc::clone(&rect_meta.child_spec(tags::CIRCLE).unwrap().meta);
        let wheel = u.create_element(&wheel_meta);
        u.set_attribute(wheel, tags::ATTR_ID, "wheel").unwrap();
        u.set_attribute(wheel, tags::ATTR_RADIUS, "12").unwrap();
        u.append(rect, wheel).unwrap();

        let circle_meta = Arc::clone(
            &self
                .schema
                .scene_tree
                .root
                .child_spec(tags::CIRCLE)
                .unwrap()
                .meta,
        );
        let ball = u.create_element(&circle_meta);
        u.set_attribute(ball, tags::ATTR_ID, "ball").unwrap();
        u.set_attribute(ball, tags::ATTR_STATIC, "true").unwrap();
        u.append(root, ball).unwrap();

        u.add_tree(self.level, tree).unwrap();
    }

    fn populate_logic(&mut self) {
        let u = &mut self.universe;
        let tree = u.create_tree(&self.schema.logic_tree);
        let root = u.create_element(&self.schema.logic_tree.root);
        u.set_root(tree, Some(root)).unwrap();

        let camera_meta = Arc::clone(
            &self
                .schema
                .logic_tree
                .root
                .child_spec(tags::CAMERA)
                .unwrap()
                .meta,
        );
        let camera = u.create_element(&camera_meta);
        u.set_attribute(camera, tags::ATTR_ASPECT, tags::ASPECT_NORMAL)
            .unwrap();
        u.append(root, camera).unwrap();

        let exit_meta = Arc::clone(
            &self
                .schema
                .logic_tree
                .root
                .child_spec(tags::EXIT)
                .unwrap()
                .meta,
        );
        let exit = u.create_element(&exit_meta);
        u.set_attribute(exit, tags::ATTR_POS, "40,-3.5").unwrap();
        u.append(root, exit).unwrap();

        u.add_tree(self.level, tree).unwrap();
    }

    fn populate_resources(&mut self) {
        let u = &mut self.universe;
        let tree = u.create_tree(&self.schema.resources_tree);
        let root = u.create_element(&self.schema.resources_tree.root);
        u.set_root(tree, Some(root)).unwrap();
        let image_meta = Arc::clone(
            &self
                .schema
                .resources_tree
                .root
                .child_spec(tags::IMAGE)
                .unwrap()
                .meta,
        );
        let image = u.create_element(&image_meta);
        u.set_attribute(image, tags::ATTR_ID, "bg").unwrap();
        u.set_attribute(image, tags::ATTR_PATH, "textures/bg").unwrap();
        u.append(root, image).unwrap();
        u.add_tree(self.level, tree).unwrap();
    }
}

/// Structural equality: same tags, attributes, and child order.
fn assert_same_tree(a_u: &Universe, a: ElementId, b_u: &Universe, b: ElementId) {
    let a_meta = a_u.element_meta(a).unwrap();
    let b_meta = b_u.element_meta(b).unwrap();
    assert_eq!(a_meta.tag, b_meta.tag);
    assert_eq!(
        a_u.attributes(a).unwrap(),
        b_u.attributes(b).unwrap(),
        "attributes differ on <{}>",
        a_meta.tag
    );
    let a_children = a_u.children(a).unwrap().to_vec();
    let b_children = b_u.children(b).unwrap().to_vec();
    assert_eq!(a_children.len(), b_children.len(), "children differ on <{}>", a_meta.tag);
    for (&ac, &bc) in a_children.iter().zip(&b_children) {
        assert_same_tree(a_u, ac, b_u, bc);
    }
}

#[test]
fn scene_round_trips_through_xml() {
    let mut f = fixture();
    f.populate_scene();
    let tree = f
        .universe
        .find_tree(f.level, tags::TREE_SCENE)
        .unwrap()
        .unwrap();

    let text = write_tree(&f.universe, tree, Backend::Xml).unwrap();
    assert!(text.starts_with("<!-- amyed v1 -->"));

    let path = std::path::Path::new("intro.scene");
    let reread = read_tree(&mut f.universe, &f.schema.scene_tree, &text, path, Backend::Xml)
        .unwrap();

    let original = f.universe.tree_root(tree).unwrap().unwrap();
    let copy = f.universe.tree_root(reread).unwrap().unwrap();
    assert_same_tree(&f.universe, original, &f.universe, copy);
}

#[test]
fn logic_round_trips_through_keyval() {
    let mut f = fixture();
    f.populate_logic();
    let tree = f
        .universe
        .find_tree(f.level, tags::TREE_LOGIC)
        .unwrap()
        .unwrap();

    let text = write_tree(&f.universe, tree, Backend::KeyValue).unwrap();
    assert!(text.starts_with("# amyed v1\n"));
    assert!(text.contains("children:"));
    assert!(text.contains("- camera"));

    let path = std::path::Path::new("intro.level");
    let reread = read_tree(
        &mut f.universe,
        &f.schema.logic_tree,
        &text,
        path,
        Backend::KeyValue,
    )
    .unwrap();

    let original = f.universe.tree_root(tree).unwrap().unwrap();
    let copy = f.universe.tree_root(reread).unwrap().unwrap();
    assert_same_tree(&f.universe, original, &f.universe, copy);
}

#[test]
fn attribute_values_are_escaped_in_markup() {
    let mut f = fixture();
    f.populate_logic();
    let tree = f
        .universe
        .find_tree(f.level, tags::TREE_LOGIC)
        .unwrap()
        .unwrap();
    let root = f.universe.tree_root(tree).unwrap().unwrap();
    f.universe
        .set_attribute(root, tags::ATTR_NAME, "Tom & \"Jerry\" <3")
        .unwrap();

    let text = write_tree(&f.universe, tree, Backend::Xml).unwrap();
    let path = std::path::Path::new("intro.level");
    let reread = read_tree(&mut f.universe, &f.schema.logic_tree, &text, path, Backend::Xml)
        .unwrap();
    let copy = f.universe.tree_root(reread).unwrap().unwrap();
    assert_eq!(
        f.universe.attribute(copy, tags::ATTR_NAME).unwrap(),
        Some("Tom & \"Jerry\" <3")
    );
}

#[test]
fn unknown_attributes_and_tags_are_skipped_not_fatal() {
    let mut f = fixture();
    let text = r#"<scene minx="-100" sparkle="yes">
  <rectangle id="floor" pos="0,0" size="10,10"/>
  <portal to="nowhere"><beam/></portal>
  <circle id="sun" pos="5,5" radius="3"/>
</scene>
"#;
    let path = std::path::Path::new("intro.scene");
    let tree = read_tree(&mut f.universe, &f.schema.scene_tree, text, path, Backend::Xml)
        .unwrap();
    let root = f.universe.tree_root(tree).unwrap().unwrap();

    assert_eq!(f.universe.attribute(root, tags::ATTR_MIN_X).unwrap(), Some("-100"));
    assert_eq!(f.universe.attributes(root).unwrap().len(), 1);
    let children = f.universe.children(root).unwrap().to_vec();
    assert_eq!(children.len(), 2);
    let tags_found: Vec<String> = children
        .iter()
        .map(|&c| f.universe.element_meta(c).unwrap().tag.clone())
        .collect();
    assert_eq!(tags_found, vec!["rectangle", "circle"]);
}

#[test]
fn mismatched_root_tag_is_malformed() {
    let mut f = fixture();
    let path = std::path::Path::new("intro.scene");
    let err = read_tree(
        &mut f.universe,
        &f.schema.scene_tree,
        "<level/>",
        path,
        Backend::Xml,
    )
    .unwrap_err();
    assert!(matches!(err, PersistenceError::MalformedFile { .. }));
}

#[test]
fn store_round_trips_a_level_plain() {
    store_round_trip(false);
}

#[test]
fn store_round_trips_a_level_packed() {
    store_round_trip(true);
}

fn store_round_trip(packed: bool) {
    let mut f = fixture();
    f.populate_scene();
    f.populate_logic();
    f.populate_resources();

    let dir = tempfile::tempdir().unwrap();
    let game = GameDir::new(dir.path());
    game.create_level("intro").unwrap();
    let store = LevelStore::new(game).with_packed(packed);

    store.save_level(&mut f.universe, f.level).unwrap();
    assert!(!f.universe.is_dirty(f.level).unwrap());
    let saved = store.game().doc_path("intro", DocKind::Scene, packed);
    assert!(saved.is_file());
    if packed {
        let bytes = std::fs::read(&saved).unwrap();
        assert!(std::str::from_utf8(&bytes).map_or(true, |s| !s.contains("<scene")));
    }

    let schema = f.schema;
    let mut fresh = Universe::new(Arc::clone(&schema.global));
    let fresh_root = fresh.root_world();
    let loaded = store
        .load_level(&mut fresh, fresh_root, &schema, "intro")
        .unwrap();
    assert!(!fresh.is_dirty(loaded).unwrap());

    for kind in [tags::TREE_SCENE, tags::TREE_LOGIC, tags::TREE_RESOURCES] {
        let a = f.universe.find_tree(f.level, kind).unwrap().unwrap();
        let b = fresh.find_tree(loaded, kind).unwrap().unwrap();
        assert_same_tree(
            &f.universe,
            f.universe.tree_root(a).unwrap().unwrap(),
            &fresh,
            fresh.tree_root(b).unwrap().unwrap(),
        );
    }

    // Identifiers registered during load resolve immediately.
    assert!(fresh.identifier_exists(loaded, tags::FAMILY_GEOMETRY, "cart"));
    assert!(fresh.identifier_exists(loaded, tags::FAMILY_IMAGE, "bg"));
}

#[test]
fn read_only_world_save_is_skipped_and_stays_dirty() {
    let mut f = fixture();
    f.populate_scene();

    let dir = tempfile::tempdir().unwrap();
    let game = GameDir::new(dir.path());
    game.create_level("intro").unwrap();
    let store = LevelStore::new(game);

    assert!(f.universe.is_dirty(f.level).unwrap());
    f.universe.set_world_read_only(f.level, true).unwrap();
    store.save_level(&mut f.universe, f.level).unwrap();

    assert!(f.universe.is_dirty(f.level).unwrap());
    assert!(!store.game().doc_path("intro", DocKind::Scene, false).is_file());
}

#[test]
fn loading_a_missing_level_fails_cleanly() {
    let mut f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let store = LevelStore::new(GameDir::new(dir.path()));
    let root = f.universe.root_world();
    let err = store
        .load_level(&mut f.universe, root, &f.schema, "ghost")
        .unwrap_err();
    assert!(matches!(err, PersistenceError::UnknownLevel { .. }));
    assert!(
        f.universe
            .find_world(f.universe.root_world(), tags::WORLD_LEVEL, "ghost")
            .unwrap()
            .is_none()
    );
}

#[test]
fn incomplete_level_rolls_back_the_world() {
    let mut f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let game = GameDir::new(dir.path());
    game.create_level("broken").unwrap();
    // Only a scene file; the logic document is missing.
    std::fs::write(
        game.doc_path("broken", DocKind::Scene, false),
        "<!-- amyed v1 -->\n<scene/>\n",
    )
    .unwrap();
    let store = LevelStore::new(game);
    let root = f.universe.root_world();
    let err = store
        .load_level(&mut f.universe, root, &f.schema, "broken")
        .unwrap_err();
    assert!(matches!(err, PersistenceError::MissingDocument { .. }));
    assert!(
        f.universe
            .find_world(f.universe.root_world(), tags::WORLD_LEVEL, "broken")
            .unwrap()
            .is_none()
    );
}

#[test]
fn headers_survive_a_save_load_cycle() {
    assert_eq!(strip_header("<!-- amyed v1 -->\n<scene/>\n"), "<scene/>\n");
}
