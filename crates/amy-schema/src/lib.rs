//! The concrete Amy game vocabulary.
//!
//! Declares the static meta-schema for the three level documents (game
//! logic, scene geometry, resource manifest) and the global texts document,
//! arranged in a two-level world hierarchy:
//!
//! ```text
//! global            - one per game, owns the texts tree
//!   level (keyed)   - one per level, owns logic + scene + resources trees
//! ```
//!
//! Identifier families: `geometry` and `joint` scope to the level world,
//! `image` and `sound` scope to the level world, `text` scopes to the
//! global world (so signs in any level can reference shared texts).
//!
//! The vocabulary is declared entirely in code; there is no external schema
//! file to load.

pub mod tags;

use std::sync::Arc;

use amy_meta::{
    AttributeKind, AttributeMeta, ElementMeta, MetaError, TreeMeta, WorldMeta,
};

/// The complete Amy meta-schema with handles to the commonly used kinds.
#[derive(Debug, Clone)]
pub struct AmySchema {
    /// The outermost world kind (`global`).
    pub global: Arc<WorldMeta>,
    /// The per-level world kind.
    pub level: Arc<WorldMeta>,
    /// Game logic document kind (`.level`).
    pub logic_tree: Arc<TreeMeta>,
    /// Scene geometry document kind (`.scene`).
    pub scene_tree: Arc<TreeMeta>,
    /// Resource manifest document kind (`.resrc`).
    pub resources_tree: Arc<TreeMeta>,
    /// Shared texts document kind, global scope.
    pub texts_tree: Arc<TreeMeta>,
}

impl AmySchema {
    /// The tree kind for a given kind name, if it is one of the four.
    pub fn find_tree_kind(&self, name: &str) -> Option<&Arc<TreeMeta>> {
        [
            &self.logic_tree,
            &self.scene_tree,
            &self.resources_tree,
            &self.texts_tree,
        ]
        .into_iter()
        .find(|t| t.name == name)
    }
}

/// Build and validate the Amy meta-schema.
///
/// # Errors
///
/// Construction errors indicate a bug in the declarations below; the schema
/// is static and a successful build is reproducible.
pub fn build() -> Result<AmySchema, MetaError> {
    let scene_tree = scene_tree()?;
    let logic_tree = logic_tree()?;
    let resources_tree = resources_tree()?;
    let texts_tree = texts_tree()?;

    let level = WorldMeta::builder(tags::WORLD_LEVEL)
        .tree(Arc::clone(&logic_tree))
        .tree(Arc::clone(&scene_tree))
        .tree(Arc::clone(&resources_tree))
        .build()?;

    let global = WorldMeta::builder(tags::WORLD_GLOBAL)
        .tree(Arc::clone(&texts_tree))
        .child(Arc::clone(&level))
        .build()?;

    global.validate()?;

    Ok(AmySchema {
        global,
        level,
        logic_tree,
        scene_tree,
        resources_tree,
        texts_tree,
    })
}

/// Shared attributes of every physical shape.
fn shape_attributes(builder: amy_meta::ElementMetaBuilder) -> amy_meta::ElementMetaBuilder {
    builder
        .attribute(
            AttributeMeta::new(
                tags::ATTR_ID,
                AttributeKind::identifier(tags::FAMILY_GEOMETRY, tags::WORLD_LEVEL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_POS, AttributeKind::Xy)
                .mandatory()
                .with_init("0,0")
                .position(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_ANGLE, AttributeKind::AngleDegrees)
                .with_default("0"),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_STATIC, AttributeKind::Boolean)
                .with_default("false"),
        )
        .attribute(AttributeMeta::new(tags::ATTR_MASS, AttributeKind::real()).remove_when_empty())
        .attribute(
            AttributeMeta::new(tags::ATTR_ROT_SPEED, AttributeKind::AngleDegrees)
                .remove_when_empty(),
        )
        .attribute(AttributeMeta::new(tags::ATTR_COLOR, AttributeKind::RgbColor).remove_when_empty())
        .attribute(
            AttributeMeta::new(
                tags::ATTR_TEXTURE,
                AttributeKind::reference(tags::FAMILY_IMAGE, tags::WORLD_LEVEL),
            )
            .remove_when_empty(),
        )
}

/// The `.scene` document: scene bounds plus top-level shapes.
///
/// Shapes nest one level deep: a top-level shape may carry part shapes
/// (same tags, distinct kinds) to form a composite body. Parts cannot nest
/// further, keeping the meta graph a DAG.
fn scene_tree() -> Result<Arc<TreeMeta>, MetaError> {
    let rectangle_part = shape_attributes(ElementMeta::builder(tags::RECTANGLE))
        .attribute(
            AttributeMeta::new(tags::ATTR_SIZE, AttributeKind::Size)
                .mandatory()
                .with_init("100,50"),
        )
        .build()?;
    let circle_part = shape_attributes(ElementMeta::builder(tags::CIRCLE))
        .attribute(
            AttributeMeta::new(tags::ATTR_RADIUS, AttributeKind::Radius)
                .mandatory()
                .with_init("50"),
        )
        .build()?;

    let rectangle = shape_attributes(ElementMeta::builder(tags::RECTANGLE))
        .attribute(
            AttributeMeta::new(tags::ATTR_SIZE, AttributeKind::Size)
                .mandatory()
                .with_init("100,50"),
        )
        .child(Arc::clone(&rectangle_part), 0, u32::MAX)
        .child(Arc::clone(&circle_part), 0, u32::MAX)
        .build()?;
    let circle = shape_attributes(ElementMeta::builder(tags::CIRCLE))
        .attribute(
            AttributeMeta::new(tags::ATTR_RADIUS, AttributeKind::Radius)
                .mandatory()
                .with_init("50"),
        )
        .child(rectangle_part, 0, u32::MAX)
        .child(circle_part, 0, u32::MAX)
        .build()?;

    let scene = ElementMeta::builder(tags::SCENE)
        .attribute(bound(tags::ATTR_MIN_X, "-500"))
        .attribute(bound(tags::ATTR_MIN_Y, "-500"))
        .attribute(bound(tags::ATTR_MAX_X, "500"))
        .attribute(bound(tags::ATTR_MAX_Y, "500"))
        .child(rectangle, 0, u32::MAX)
        .child(circle, 0, u32::MAX)
        .build()?;

    Ok(TreeMeta::new(tags::TREE_SCENE, scene))
}

fn bound(name: &str, init: &str) -> AttributeMeta {
    AttributeMeta::new(name, AttributeKind::real())
        .mandatory()
        .with_init(init)
        .with_default(init)
}

/// The `.level` document: cameras, exit, joints, motors, fields, signs.
fn logic_tree() -> Result<Arc<TreeMeta>, MetaError> {
    let camera = ElementMeta::builder(tags::CAMERA)
        .attribute(
            AttributeMeta::new(
                tags::ATTR_ASPECT,
                AttributeKind::enumerated(tags::CAMERA_ASPECTS.iter().copied()),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_POS, AttributeKind::Xy)
                .mandatory()
                .with_init("0,0")
                .position(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_ZOOM, AttributeKind::Real {
                min: Some(0.01),
                max: None,
            })
            .with_default("1"),
        )
        .build()?;

    let exit = ElementMeta::builder(tags::EXIT)
        .attribute(
            AttributeMeta::new(tags::ATTR_POS, AttributeKind::Xy)
                .mandatory()
                .with_init("0,0")
                .position(),
        )
        .build()?;

    let hinge = ElementMeta::builder(tags::HINGE)
        .attribute(
            AttributeMeta::new(
                tags::ATTR_ID,
                AttributeKind::identifier(tags::FAMILY_JOINT, tags::WORLD_LEVEL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(
                tags::ATTR_BODY,
                AttributeKind::reference(tags::FAMILY_GEOMETRY, tags::WORLD_LEVEL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_POS, AttributeKind::Xy)
                .mandatory()
                .with_init("0,0")
                .position(),
        )
        .build()?;

    let motor = ElementMeta::builder(tags::MOTOR)
        .attribute(
            AttributeMeta::new(
                tags::ATTR_BODY,
                AttributeKind::reference(tags::FAMILY_GEOMETRY, tags::WORLD_LEVEL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_SPEED, AttributeKind::real()).with_default("1"),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_TORQUE, AttributeKind::Real {
                min: Some(0.0),
                max: None,
            })
            .with_default("100"),
        )
        .build()?;

    let force_field = ElementMeta::builder(tags::FORCE_FIELD)
        .attribute(
            AttributeMeta::new(tags::ATTR_CENTER, AttributeKind::Xy)
                .remove_when_empty()
                .position(),
        )
        .attribute(AttributeMeta::new(tags::ATTR_SIZE, AttributeKind::Size).remove_when_empty())
        .attribute(
            AttributeMeta::new(tags::ATTR_STRENGTH, AttributeKind::real()).with_default("10"),
        )
        .build()?;

    let sign = ElementMeta::builder(tags::SIGN)
        .attribute(
            AttributeMeta::new(
                tags::ATTR_TEXT_REF,
                AttributeKind::reference(tags::FAMILY_TEXT, tags::WORLD_GLOBAL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_POS, AttributeKind::Xy)
                .mandatory()
                .with_init("0,0")
                .position(),
        )
        .build()?;

    let level = ElementMeta::builder(tags::LEVEL)
        .attribute(AttributeMeta::new(tags::ATTR_NAME, AttributeKind::String).remove_when_empty())
        .child(camera, 0, 2)
        .child(exit, 1, 1)
        .child(hinge, 0, u32::MAX)
        .child(motor, 0, u32::MAX)
        .child(force_field, 0, u32::MAX)
        .child(sign, 0, u32::MAX)
        .build()?;

    Ok(TreeMeta::new(tags::TREE_LOGIC, level))
}

/// The `.resrc` document: image and sound manifest entries.
fn resources_tree() -> Result<Arc<TreeMeta>, MetaError> {
    let image = ElementMeta::builder(tags::IMAGE)
        .attribute(
            AttributeMeta::new(
                tags::ATTR_ID,
                AttributeKind::identifier(tags::FAMILY_IMAGE, tags::WORLD_LEVEL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_PATH, AttributeKind::Path {
                strip_extension: true,
            })
            .mandatory()
            .deny_empty(),
        )
        .build()?;

    let sound = ElementMeta::builder(tags::SOUND)
        .attribute(
            AttributeMeta::new(
                tags::ATTR_ID,
                AttributeKind::identifier(tags::FAMILY_SOUND, tags::WORLD_LEVEL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(
            AttributeMeta::new(tags::ATTR_PATH, AttributeKind::Path {
                strip_extension: true,
            })
            .mandatory()
            .deny_empty(),
        )
        .build()?;

    let resources = ElementMeta::builder(tags::RESOURCES)
        .child(image, 0, u32::MAX)
        .child(sound, 0, u32::MAX)
        .build()?;

    Ok(TreeMeta::new(tags::TREE_RESOURCES, resources))
}

/// The global texts document.
fn texts_tree() -> Result<Arc<TreeMeta>, MetaError> {
    let text = ElementMeta::builder(tags::TEXT)
        .attribute(
            AttributeMeta::new(
                tags::ATTR_ID,
                AttributeKind::identifier(tags::FAMILY_TEXT, tags::WORLD_GLOBAL),
            )
            .mandatory()
            .deny_empty(),
        )
        .attribute(AttributeMeta::new(tags::ATTR_VALUE, AttributeKind::String))
        .build()?;

    let texts = ElementMeta::builder(tags::TEXTS)
        .child(text, 0, u32::MAX)
        .build()?;

    Ok(TreeMeta::new(tags::TREE_TEXTS, texts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_builds_and_validates() {
        let schema = build().expect("build Amy schema");
        assert_eq!(schema.global.name, tags::WORLD_GLOBAL);
        assert_eq!(schema.level.name, tags::WORLD_LEVEL);
        assert!(schema.global.find_child_kind(tags::WORLD_LEVEL).is_some());
    }

    #[test]
    fn level_world_owns_three_trees() {
        let schema = build().unwrap();
        for kind in [tags::TREE_LOGIC, tags::TREE_SCENE, tags::TREE_RESOURCES] {
            assert!(
                schema.level.find_tree_kind(kind).is_some(),
                "missing tree kind {kind}"
            );
        }
        assert!(schema.global.find_tree_kind(tags::TREE_TEXTS).is_some());
    }

    #[test]
    fn shapes_carry_one_identifier() {
        let schema = build().unwrap();
        let scene = &schema.scene_tree.root;
        let rectangle = &scene.child_spec(tags::RECTANGLE).unwrap().meta;
        let id = rectangle.identifier_attribute().expect("rectangle id");
        assert_eq!(id.family(), Some(tags::FAMILY_GEOMETRY));
        assert_eq!(id.world_kind(), Some(tags::WORLD_LEVEL));
    }

    #[test]
    fn composite_parts_do_not_nest() {
        let schema = build().unwrap();
        let scene = &schema.scene_tree.root;
        let rectangle = &scene.child_spec(tags::RECTANGLE).unwrap().meta;
        let part = &rectangle.child_spec(tags::RECTANGLE).unwrap().meta;
        assert!(part.children.is_empty());
    }

    #[test]
    fn exit_is_required_exactly_once() {
        let schema = build().unwrap();
        let level = &schema.logic_tree.root;
        let exit = level.child_spec(tags::EXIT).unwrap();
        assert_eq!(exit.min_occurrence, 1);
        assert_eq!(exit.max_occurrence, 1);
    }

    #[test]
    fn sign_references_global_text() {
        let schema = build().unwrap();
        let level = &schema.logic_tree.root;
        let sign = &level.child_spec(tags::SIGN).unwrap().meta;
        let text_ref = sign.attribute(tags::ATTR_TEXT_REF).unwrap();
        assert!(text_ref.is_reference());
        assert_eq!(text_ref.world_kind(), Some(tags::WORLD_GLOBAL));
    }
}
