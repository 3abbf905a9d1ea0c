//! Well-known names of the Amy vocabulary.
//!
//! Tags, attribute names, reference families, world and tree kind names.
//! Validation rules key off these constants rather than re-spelling
//! string literals.

// World kinds
pub const WORLD_GLOBAL: &str = "global";
pub const WORLD_LEVEL: &str = "level";

// Tree kinds (also the on-disk file extensions for level trees)
pub const TREE_LOGIC: &str = "level";
pub const TREE_SCENE: &str = "scene";
pub const TREE_RESOURCES: &str = "resrc";
pub const TREE_TEXTS: &str = "texts";

// Reference families
pub const FAMILY_GEOMETRY: &str = "geometry";
pub const FAMILY_JOINT: &str = "joint";
pub const FAMILY_IMAGE: &str = "image";
pub const FAMILY_SOUND: &str = "sound";
pub const FAMILY_TEXT: &str = "text";

// Scene tags
pub const SCENE: &str = "scene";
pub const RECTANGLE: &str = "rectangle";
pub const CIRCLE: &str = "circle";

// Logic tags
pub const LEVEL: &str = "level";
pub const CAMERA: &str = "camera";
pub const EXIT: &str = "exit";
pub const HINGE: &str = "hinge";
pub const MOTOR: &str = "motor";
pub const FORCE_FIELD: &str = "forcefield";
pub const SIGN: &str = "sign";

// Resource tags
pub const RESOURCES: &str = "resources";
pub const IMAGE: &str = "image";
pub const SOUND: &str = "sound";

// Global tags
pub const TEXTS: &str = "texts";
pub const TEXT: &str = "text";

// Attribute names shared across kinds
pub const ATTR_ID: &str = "id";
pub const ATTR_POS: &str = "pos";
pub const ATTR_SIZE: &str = "size";
pub const ATTR_ANGLE: &str = "angle";
pub const ATTR_STATIC: &str = "static";
pub const ATTR_MASS: &str = "mass";
pub const ATTR_ROT_SPEED: &str = "rotspeed";
pub const ATTR_COLOR: &str = "color";
pub const ATTR_TEXTURE: &str = "texture";
pub const ATTR_RADIUS: &str = "radius";
pub const ATTR_ASPECT: &str = "aspect";
pub const ATTR_ZOOM: &str = "zoom";
pub const ATTR_BODY: &str = "body";
pub const ATTR_SPEED: &str = "speed";
pub const ATTR_TORQUE: &str = "torque";
pub const ATTR_CENTER: &str = "center";
pub const ATTR_STRENGTH: &str = "strength";
pub const ATTR_PATH: &str = "path";
pub const ATTR_TEXT_REF: &str = "text";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_NAME: &str = "name";
pub const ATTR_MIN_X: &str = "minx";
pub const ATTR_MIN_Y: &str = "miny";
pub const ATTR_MAX_X: &str = "maxx";
pub const ATTR_MAX_Y: &str = "maxy";

// Camera aspects; exactly one camera per aspect is required in a level
pub const ASPECT_NORMAL: &str = "normal";
pub const ASPECT_WIDESCREEN: &str = "widescreen";
pub const CAMERA_ASPECTS: &[&str] = &[ASPECT_NORMAL, ASPECT_WIDESCREEN];
