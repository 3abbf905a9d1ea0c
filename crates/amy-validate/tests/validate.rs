//! Validation behavior across the three check groups and the engine.

use std::sync::Arc;

use amy_doc::{ElementId, Universe, WorldId};
use amy_schema::{AmySchema, tags};
use amy_validate::{
    DiskProbe, Engine, Issue, NullProbe, Severity,
    checks::{check_attributes, check_cardinality, check_world_rules},
};

struct Fixture {
    universe: Universe,
    schema: AmySchema,
    level: WorldId,
    scene_root: ElementId,
    logic_root: ElementId,
    resources_root: ElementId,
}

fn fixture() -> Fixture {
    let schema = amy_schema::build().expect("schema");
    let mut universe = Universe::new(Arc::clone(&schema.global));
    let level = universe
        .make_world(universe.root_world(), tags::WORLD_LEVEL, "intro")
        .unwrap();

    let mut attach = |tree_meta: &Arc<amy_meta::TreeMeta>| {
        let tree = universe.create_tree(tree_meta);
        let root = universe.create_element(&tree_meta.root);
        universe.set_root(tree, Some(root)).unwrap();
        universe.add_tree(level, tree).unwrap();
        root
    };
    let scene_root = attach(&schema.scene_tree);
    let logic_root = attach(&schema.logic_tree);
    let resources_root = attach(&schema.resources_tree);

    Fixture {
        universe,
        schema,
        level,
        scene_root,
        logic_root,
        resources_root,
    }
}

impl Fixture {
    fn add_rect(&mut self, id: &str) -> ElementId {
        let meta = Arc::clone(
            &self
                .schema
                .scene_tree
                .root
                .child_spec(tags::RECTANGLE)
                .unwrap()
                .meta,
        );
        let rect = self.universe.create_element(&meta);
        self.universe.set_attribute(rect, tags::ATTR_ID, id).unwrap();
        self.universe.append(self.scene_root, rect).unwrap();
        rect
    }

    fn add_logic(&mut self, tag: &str) -> ElementId {
        let meta = Arc::clone(&self.schema.logic_tree.root.child_spec(tag).unwrap().meta);
        let element = self.universe.create_element(&meta);
        self.universe.append(self.logic_root, element).unwrap();
        element
    }

    fn add_image(&mut self, id: &str, path: &str) -> ElementId {
        let meta = Arc::clone(
            &self
                .schema
                .resources_tree
                .root
                .child_spec(tags::IMAGE)
                .unwrap()
                .meta,
        );
        let image = self.universe.create_element(&meta);
        self.universe.set_attribute(image, tags::ATTR_ID, id).unwrap();
        self.universe
            .set_attribute(image, tags::ATTR_PATH, path)
            .unwrap();
        self.universe.append(self.resources_root, image).unwrap();
        image
    }

    /// A minimal level that passes every check: one static shape, both
    /// cameras, an exit inside the bounds.
    fn make_playable(&mut self) {
        let rect = self.add_rect("floor");
        self.universe
            .set_attribute(rect, tags::ATTR_STATIC, "true")
            .unwrap();
        let normal = self.add_logic(tags::CAMERA);
        self.universe
            .set_attribute(normal, tags::ATTR_ASPECT, tags::ASPECT_NORMAL)
            .unwrap();
        let wide = self.add_logic(tags::CAMERA);
        self.universe
            .set_attribute(wide, tags::ATTR_ASPECT, tags::ASPECT_WIDESCREEN)
            .unwrap();
        self.add_logic(tags::EXIT);
    }

    fn rules(&self) -> Vec<(ElementId, Issue)> {
        check_world_rules(&self.universe, self.level, &NullProbe)
    }
}

fn issues_of(rules: &[(ElementId, Issue)], element: ElementId) -> Vec<&Issue> {
    rules
        .iter()
        .filter(|(id, _)| *id == element)
        .map(|(_, issue)| issue)
        .collect()
}

// -- attribute checks -----------------------------------------------------

#[test]
fn playable_level_is_clean() {
    let mut f = fixture();
    f.make_playable();

    let mut engine = Engine::new(Box::new(NullProbe));
    engine.validate_world_now(&f.universe, f.level);
    assert_eq!(
        engine.store().world_severity(&f.universe, f.level),
        Severity::None
    );
}

#[test]
fn blank_element_reports_missing_mandatory_attributes() {
    let mut f = fixture();
    let meta = Arc::clone(
        &f.schema
            .scene_tree
            .root
            .child_spec(tags::RECTANGLE)
            .unwrap()
            .meta,
    );
    let rect = f.universe.create_blank_element(&meta);
    f.universe.append(f.scene_root, rect).unwrap();

    let issues = check_attributes(&f.universe, rect);
    let missing: Vec<&str> = issues
        .iter()
        .filter_map(|issue| match issue {
            Issue::MandatoryMissing { attribute } => Some(attribute.as_str()),
            _ => None,
        })
        .collect();
    assert!(missing.contains(&tags::ATTR_ID));
    assert!(missing.contains(&tags::ATTR_POS));
    assert!(missing.contains(&tags::ATTR_SIZE));
}

#[test]
fn unparseable_value_is_reported_not_rejected() {
    let mut f = fixture();
    let rect = f.add_rect("floor");
    f.universe
        .set_attribute(rect, tags::ATTR_POS, "banana")
        .unwrap();

    let issues = check_attributes(&f.universe, rect);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        Issue::InvalidValue { attribute, .. } if attribute == tags::ATTR_POS
    )));
}

#[test]
fn dangling_reference_is_critical() {
    let mut f = fixture();
    let motor = f.add_logic(tags::MOTOR);
    f.universe
        .set_attribute(motor, tags::ATTR_BODY, "ghost")
        .unwrap();

    let issues = check_attributes(&f.universe, motor);
    let dangling = issues
        .iter()
        .find(|issue| matches!(issue, Issue::DanglingReference { .. }))
        .expect("dangling reference issue");
    assert_eq!(dangling.severity(), Severity::Critical);
}

#[test]
fn duplicate_identifiers_flag_every_claimant() {
    let mut f = fixture();
    let a = f.add_rect("rect_1");
    let b = f.add_rect("rect_1");

    for element in [a, b] {
        assert!(
            check_attributes(&f.universe, element)
                .iter()
                .any(|issue| matches!(
                    issue,
                    Issue::DuplicateIdentifier { value, .. } if value == "rect_1"
                )),
            "claimant {element} not flagged"
        );
    }
}

// -- cardinality ----------------------------------------------------------

#[test]
fn missing_exit_violates_cardinality() {
    let f = fixture();
    let issues = check_cardinality(&f.universe, f.logic_root);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        Issue::CardinalityMismatch { child, count: 0, min: 1, max: 1 } if child == tags::EXIT
    )));
}

#[test]
fn three_cameras_violate_cardinality() {
    let mut f = fixture();
    f.make_playable();
    let extra = f.add_logic(tags::CAMERA);
    f.universe
        .set_attribute(extra, tags::ATTR_ASPECT, tags::ASPECT_NORMAL)
        .unwrap();

    let issues = check_cardinality(&f.universe, f.logic_root);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        Issue::CardinalityMismatch { child, count: 3, .. } if child == tags::CAMERA
    )));
}

// -- domain rules ---------------------------------------------------------

#[test]
fn dynamic_shape_without_mass_is_critical() {
    let mut f = fixture();
    let rect = f.add_rect("crate");

    let rules = f.rules();
    assert_eq!(issues_of(&rules, rect), vec![&Issue::MissingMass]);

    f.universe.set_attribute(rect, tags::ATTR_MASS, "5").unwrap();
    assert!(issues_of(&f.rules(), rect).is_empty());
}

#[test]
fn static_shape_needs_no_mass() {
    let mut f = fixture();
    let rect = f.add_rect("floor");
    f.universe
        .set_attribute(rect, tags::ATTR_STATIC, "true")
        .unwrap();

    assert!(issues_of(&f.rules(), rect).is_empty());
}

#[test]
fn parts_of_a_dynamic_composite_need_mass() {
    let mut f = fixture();
    let rect = f.add_rect("cart");
    f.universe.set_attribute(rect, tags::ATTR_MASS, "10").unwrap();
    let rect_meta = f.universe.element_meta(rect).unwrap();
    let part_meta = Arc::clone(&rect_meta.child_spec(tags::CIRCLE).unwrap().meta);
    let wheel = f.universe.create_element(&part_meta);
    f.universe.set_attribute(wheel, tags::ATTR_ID, "wheel").unwrap();
    f.universe.append(rect, wheel).unwrap();

    let rules = f.rules();
    assert_eq!(issues_of(&rules, wheel), vec![&Issue::PartMissingMass]);

    f.universe.set_attribute(wheel, tags::ATTR_MASS, "2").unwrap();
    assert!(issues_of(&f.rules(), wheel).is_empty());
}

#[test]
fn motor_on_static_body_warns() {
    let mut f = fixture();
    let rect = f.add_rect("floor");
    f.universe
        .set_attribute(rect, tags::ATTR_STATIC, "true")
        .unwrap();
    let motor = f.add_logic(tags::MOTOR);
    f.universe
        .set_attribute(motor, tags::ATTR_BODY, "floor")
        .unwrap();

    let rules = f.rules();
    let issue = issues_of(&rules, motor);
    assert!(matches!(
        issue.first(),
        Some(Issue::StaticBodyDriven { body, .. }) if body == "floor"
    ));
    assert_eq!(issue[0].severity(), Severity::Warning);
}

#[test]
fn rotating_shape_without_hinge_is_advice() {
    let mut f = fixture();
    let rect = f.add_rect("wheel");
    f.universe.set_attribute(rect, tags::ATTR_MASS, "3").unwrap();
    f.universe
        .set_attribute(rect, tags::ATTR_ROT_SPEED, "45")
        .unwrap();

    let rules = f.rules();
    assert_eq!(issues_of(&rules, rect), vec![&Issue::RotatingWithoutHinge]);
    assert_eq!(Issue::RotatingWithoutHinge.severity(), Severity::Advice);

    let hinge = f.add_logic(tags::HINGE);
    f.universe.set_attribute(hinge, tags::ATTR_ID, "pivot").unwrap();
    f.universe.set_attribute(hinge, tags::ATTR_BODY, "wheel").unwrap();
    assert!(issues_of(&f.rules(), rect).is_empty());
}

#[test]
fn force_field_size_without_center_warns() {
    let mut f = fixture();
    let field = f.add_logic(tags::FORCE_FIELD);
    f.universe
        .set_attribute(field, tags::ATTR_SIZE, "200,100")
        .unwrap();

    let rules = f.rules();
    assert_eq!(issues_of(&rules, field), vec![&Issue::FieldSizeWithoutCenter]);

    f.universe
        .set_attribute(field, tags::ATTR_CENTER, "0,0")
        .unwrap();
    assert!(issues_of(&f.rules(), field).is_empty());
}

#[test]
fn exit_outside_scene_bounds_warns() {
    let mut f = fixture();
    let exit = f.add_logic(tags::EXIT);
    f.universe
        .set_attribute(exit, tags::ATTR_POS, "900,0")
        .unwrap();

    let rules = f.rules();
    assert_eq!(issues_of(&rules, exit), vec![&Issue::ExitOutOfBounds]);

    // Default bounds are -500..500; pull the exit back inside.
    f.universe
        .set_attribute(exit, tags::ATTR_POS, "400,-200")
        .unwrap();
    assert!(issues_of(&f.rules(), exit).is_empty());
}

#[test]
fn each_camera_aspect_needs_exactly_one_camera() {
    let mut f = fixture();
    let camera = f.add_logic(tags::CAMERA);
    f.universe
        .set_attribute(camera, tags::ATTR_ASPECT, tags::ASPECT_NORMAL)
        .unwrap();

    let rules = f.rules();
    let on_root = issues_of(&rules, f.logic_root);
    assert_eq!(on_root.len(), 1);
    assert!(matches!(
        on_root[0],
        Issue::CameraAspectCount { aspect, count: 0 } if aspect == tags::ASPECT_WIDESCREEN
    ));
}

// -- resources ------------------------------------------------------------

#[test]
fn unreferenced_image_is_advice_but_sounds_are_exempt() {
    let mut f = fixture();
    let image = f.add_image("bg", "textures/bg");
    let sound_meta = Arc::clone(
        &f.schema
            .resources_tree
            .root
            .child_spec(tags::SOUND)
            .unwrap()
            .meta,
    );
    let sound = f.universe.create_element(&sound_meta);
    f.universe.set_attribute(sound, tags::ATTR_ID, "clang").unwrap();
    f.universe
        .set_attribute(sound, tags::ATTR_PATH, "sounds/clang")
        .unwrap();
    f.universe.append(f.resources_root, sound).unwrap();

    let rules = f.rules();
    assert!(issues_of(&rules, image).iter().any(|issue| matches!(
        issue,
        Issue::ResourceUnused { identifier } if identifier == "bg"
    )));
    assert!(issues_of(&rules, sound).is_empty());

    let rect = f.add_rect("wall");
    f.universe
        .set_attribute(rect, tags::ATTR_TEXTURE, "bg")
        .unwrap();
    assert!(issues_of(&f.rules(), image).is_empty());
}

#[test]
fn missing_and_miscased_resource_files_are_reported() {
    let mut f = fixture();
    let wall = f.add_image("wall", "textures/wall");
    let sky = f.add_image("sky", "textures/sky");
    let rect = f.add_rect("backdrop");
    f.universe
        .set_attribute(rect, tags::ATTR_TEXTURE, "wall")
        .unwrap();
    let rect2 = f.add_rect("backdrop2");
    f.universe
        .set_attribute(rect2, tags::ATTR_TEXTURE, "sky")
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let textures = dir.path().join("intro").join("textures");
    std::fs::create_dir_all(&textures).unwrap();
    std::fs::write(textures.join("sky.PNG"), b"png").unwrap();

    let probe = DiskProbe::new(dir.path());
    let rules = check_world_rules(&f.universe, f.level, &probe);
    assert!(issues_of(&rules, wall).iter().any(|issue| matches!(
        issue,
        Issue::ResourceMissing { path } if path == "textures/wall.png"
    )));
    assert!(issues_of(&rules, sky).iter().any(|issue| matches!(
        issue,
        Issue::ResourceCasing { path } if path == "textures/sky.png"
    )));
    // Absent or miscased files warn, they do not block play.
    for element in [wall, sky] {
        for issue in issues_of(&rules, element) {
            assert_eq!(issue.severity(), Severity::Warning);
        }
    }
}

// -- engine ---------------------------------------------------------------

fn drain(engine: &mut Engine, universe: &mut Universe) -> Vec<ElementId> {
    let events = universe.take_events();
    engine.observe(universe, &events);
    let mut changed = Vec::new();
    while engine.has_pending_work() {
        changed.extend(engine.tick(universe));
    }
    changed
}

#[test]
fn engine_settles_issues_incrementally() {
    let mut f = fixture();
    f.make_playable();
    let mut engine = Engine::new(Box::new(NullProbe));
    drain(&mut engine, &mut f.universe);
    assert_eq!(
        engine.store().world_severity(&f.universe, f.level),
        Severity::None
    );

    let rect = f.add_rect("crate");
    let changed = drain(&mut engine, &mut f.universe);
    assert!(changed.contains(&rect));
    assert!(engine.store().issues_of(rect).contains(&&Issue::MissingMass));

    f.universe.set_attribute(rect, tags::ATTR_MASS, "4").unwrap();
    let changed = drain(&mut engine, &mut f.universe);
    assert!(changed.contains(&rect));
    assert!(engine.store().issues_of(rect).is_empty());
}

#[test]
fn removed_elements_carry_no_findings() {
    let mut f = fixture();
    f.make_playable();
    let rect = f.add_rect("crate");
    let mut engine = Engine::new(Box::new(NullProbe));
    drain(&mut engine, &mut f.universe);
    assert!(!engine.store().issues_of(rect).is_empty());

    f.universe.remove(f.scene_root, rect).unwrap();
    f.universe.destroy_element(rect).unwrap();
    let changed = drain(&mut engine, &mut f.universe);
    assert!(!changed.contains(&rect));
    assert!(engine.store().issues_of(rect).is_empty());
    assert_eq!(
        engine.store().world_severity(&f.universe, f.level),
        Severity::None
    );
}

#[test]
fn identifier_rename_updates_referers_and_claimants() {
    let mut f = fixture();
    let a = f.add_rect("rect_1");
    let b = f.add_rect("rect_2");
    let motor = f.add_logic(tags::MOTOR);
    f.universe
        .set_attribute(motor, tags::ATTR_BODY, "rect_2")
        .unwrap();
    let mut engine = Engine::new(Box::new(NullProbe));
    drain(&mut engine, &mut f.universe);
    assert!(engine.store().issues_of(motor).is_empty());

    // Renaming b both dangles the motor and collides with a.
    f.universe.set_attribute(b, tags::ATTR_ID, "rect_1").unwrap();
    drain(&mut engine, &mut f.universe);
    assert!(engine.store().issues_of(motor).iter().any(|issue| matches!(
        issue,
        Issue::DanglingReference { value, .. } if value == "rect_2"
    )));
    for claimant in [a, b] {
        assert!(
            engine
                .store()
                .issues_of(claimant)
                .iter()
                .any(|issue| matches!(issue, Issue::DuplicateIdentifier { .. })),
            "claimant {claimant} not flagged"
        );
    }
}

#[test]
fn removing_a_duplicate_clears_the_survivor() {
    let mut f = fixture();
    let a = f.add_rect("rect_1");
    f.universe.set_attribute(a, tags::ATTR_STATIC, "true").unwrap();
    let b = f.add_rect("rect_1");
    let mut engine = Engine::new(Box::new(NullProbe));
    drain(&mut engine, &mut f.universe);
    assert!(!engine.store().issues_of(a).is_empty());

    f.universe.remove(f.scene_root, b).unwrap();
    f.universe.destroy_element(b).unwrap();
    drain(&mut engine, &mut f.universe);
    assert!(engine.store().issues_of(a).is_empty());
}

#[test]
fn severity_aggregates_up_to_the_world() {
    let mut f = fixture();
    f.make_playable();
    let rect = f.add_rect("crate");
    let mut engine = Engine::new(Box::new(NullProbe));
    drain(&mut engine, &mut f.universe);

    assert_eq!(engine.store().own_severity(rect), Severity::Critical);
    assert_eq!(
        engine.store().element_severity(&f.universe, f.scene_root),
        Severity::Critical
    );
    assert_eq!(
        engine.store().world_severity(&f.universe, f.level),
        Severity::Critical
    );
    assert_eq!(engine.store().own_severity(f.scene_root), Severity::None);
}
