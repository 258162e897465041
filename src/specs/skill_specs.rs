//! Declarative skill contracts and the read-only spec registry.
//!
//! A [`SkillSpec`] is the contract for one skill name: its input schema
//! (argument name to shape, or `None` for "takes no arguments"), its output
//! shape, and the skill names an entity should bind before using it. The
//! [`SkillSpecRegistry`] is populated once and never mutated afterwards —
//! it is configuration, not state.
//!
//! Naming convention: `c_*` for capabilities (directly backed by a device
//! or simulator), `s_*` for skills (composed on top of capabilities).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::shape::Shape;

// ---------------------------------------------------------------------------
// SkillSpec
// ---------------------------------------------------------------------------

/// Whether a spec describes a capability or a composed skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillKind {
    Capability,
    Skill,
}

/// The declared contract for one skill name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSpec {
    /// Human-readable description of what the skill does.
    pub description: String,
    /// Capability or composed skill.
    pub kind: SkillKind,
    /// Argument name to expected shape. `None` means no arguments at all;
    /// an empty list would instead mean "exactly zero named arguments" and
    /// is not used by the standard table.
    pub input: Option<Vec<(String, Shape)>>,
    /// Shape of the returned value.
    pub output: Shape,
    /// Skill names an entity should bind before using this one.
    pub dependencies: Vec<String>,
}

impl SkillSpec {
    /// Start a capability spec with no input and an `Any` output.
    pub fn capability(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind: SkillKind::Capability,
            input: None,
            output: Shape::Any,
            dependencies: Vec::new(),
        }
    }

    /// Start a composed-skill spec with no input and an `Any` output.
    pub fn skill(description: impl Into<String>) -> Self {
        Self {
            kind: SkillKind::Skill,
            ..Self::capability(description)
        }
    }

    /// Builder method to set the input schema.
    pub fn with_input(
        mut self,
        entries: impl IntoIterator<Item = (impl Into<String>, Shape)>,
    ) -> Self {
        self.input = Some(entries.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Builder method to set the output shape.
    pub fn with_output(mut self, output: Shape) -> Self {
        self.output = output;
        self
    }

    /// Builder method to set the dependency list.
    pub fn with_dependencies(
        mut self,
        deps: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// SkillSpecRegistry
// ---------------------------------------------------------------------------

/// Read-only mapping from skill name to [`SkillSpec`].
///
/// Built once (either the [standard table](SkillSpecRegistry::standard) or a
/// custom one via [`SkillSpecRegistry::from_table`]) and then frozen: no
/// mutating API exists. Lookups by unknown name return `None` and surface as
/// binding/validation errors at the call sites, never as silent skips.
#[derive(Debug, Clone)]
pub struct SkillSpecRegistry {
    specs: HashMap<String, SkillSpec>,
}

static STANDARD: Lazy<Arc<SkillSpecRegistry>> =
    Lazy::new(|| Arc::new(SkillSpecRegistry::from_table(standard_table())));

impl SkillSpecRegistry {
    /// The process-wide standard skill table, shared and immutable.
    pub fn standard() -> Arc<SkillSpecRegistry> {
        STANDARD.clone()
    }

    /// Build a registry from a custom table.
    pub fn from_table(table: impl IntoIterator<Item = (impl Into<String>, SkillSpec)>) -> Self {
        Self {
            specs: table.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Look up a spec by skill name.
    pub fn get(&self, name: &str) -> Option<&SkillSpec> {
        self.specs.get(name)
    }

    /// Whether the registry declares the given skill name.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// All declared skill names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Structured type vocabulary
// ---------------------------------------------------------------------------

/// Supported still-image encodings.
pub fn image_format() -> Shape {
    Shape::enumeration("ImageFormat", ["jpeg", "png", "bmp", "tiff", "webp"])
}

/// Camera sensor families.
pub fn camera_type() -> Shape {
    Shape::enumeration("CameraType", ["rgb", "depth", "infrared"])
}

pub fn image_metadata() -> Shape {
    Shape::record("ImageMetadata", [
        ("width", Shape::int()),
        ("height", Shape::int()),
        ("format", image_format()),
        ("camera_type", camera_type()),
    ])
}

/// A captured frame: raw bytes plus metadata.
pub fn image() -> Shape {
    Shape::record("Image", [
        ("image_raw", Shape::bytes()),
        ("metadata", image_metadata()),
    ])
}

pub fn bbox() -> Shape {
    Shape::record("BBox", [
        ("x", Shape::int()),
        ("y", Shape::int()),
        ("w", Shape::int()),
        ("h", Shape::int()),
    ])
}

pub fn detected_object() -> Shape {
    Shape::record("DetectedObject", [
        ("label", Shape::str()),
        ("bbox", bbox()),
        ("confidence", Shape::float()),
    ])
}

pub fn pose2d() -> Shape {
    Shape::record("Pose2D", [
        ("x", Shape::float()),
        ("y", Shape::float()),
        ("theta", Shape::float()),
    ])
}

pub fn pose6d() -> Shape {
    Shape::record("Pose6D", [
        ("x", Shape::float()),
        ("y", Shape::float()),
        ("z", Shape::float()),
        ("roll", Shape::float()),
        ("pitch", Shape::float()),
        ("yaw", Shape::float()),
    ])
}

pub fn lidar_scan() -> Shape {
    Shape::record("LidarScan", [
        ("ranges", Shape::sequence(Shape::float())),
        ("angle_min", Shape::float()),
        ("angle_max", Shape::float()),
        ("angle_increment", Shape::float()),
        ("time_increment", Shape::float()),
        ("scan_time", Shape::float()),
        ("range_min", Shape::float()),
        ("range_max", Shape::float()),
    ])
}

/// A rigid transform: translation plus quaternion rotation.
pub fn transform() -> Shape {
    Shape::record("Transform", [
        (
            "translation",
            Shape::tuple([Shape::float(), Shape::float(), Shape::float()]),
        ),
        (
            "rotation",
            Shape::tuple([
                Shape::float(),
                Shape::float(),
                Shape::float(),
                Shape::float(),
            ]),
        ),
    ])
}

pub fn nav_path() -> Shape {
    Shape::record("NavPath", [("poses", Shape::sequence(pose2d()))])
}

/// A target entity reference: either a bare path, or a path bundled with
/// the skill names the target is required to have bound.
fn entity_path_and_required() -> Shape {
    Shape::mapping([
        ("entity", Shape::str()),
        ("required", Shape::sequence(Shape::str())),
    ])
}

fn xyz() -> Vec<(String, Shape)> {
    vec![
        ("x".to_string(), Shape::float()),
        ("y".to_string(), Shape::float()),
        ("z".to_string(), Shape::float()),
    ]
}

fn success_output() -> Shape {
    Shape::mapping([("success", Shape::bool())])
}

// ---------------------------------------------------------------------------
// Standard table
// ---------------------------------------------------------------------------

fn standard_table() -> Vec<(&'static str, SkillSpec)> {
    vec![
        (
            "c_space_getpos",
            SkillSpec::capability("Get the position of the entity")
                .with_output(Shape::Mapping { entries: xyz() }),
        ),
        (
            "c_space_move",
            SkillSpec::capability("Move the entity to the given position")
                .with_input(xyz())
                .with_output(success_output()),
        ),
        (
            "c_image_capture",
            SkillSpec::capability("Capture an image from the entity's camera")
                .with_output(image()),
        ),
        (
            "s_space_move2entity",
            SkillSpec::skill("Move the entity to the vicinity of another entity")
                .with_input([
                    (
                        "target_entity",
                        Shape::union([entity_path_and_required(), Shape::str()]),
                    ),
                    ("distance", Shape::float()),
                ])
                .with_output(success_output())
                .with_dependencies(["c_space_move", "c_space_getpos"]),
        ),
        (
            "c_camera_rgb",
            SkillSpec::capability("Get the RGB image from the specified camera")
                .with_input([
                    ("camera_name", Shape::str()),
                    ("timeout_sec", Shape::float()),
                ])
                .with_output(Shape::Any),
        ),
        (
            "c_camera_dep_rgb",
            SkillSpec::capability("Get the RGB and depth images from the specified camera")
                .with_input([
                    ("camera_name", Shape::str()),
                    ("timeout_sec", Shape::float()),
                ])
                .with_output(Shape::tuple([Shape::Any, Shape::Any])),
        ),
        (
            "c_camera_info",
            SkillSpec::capability("Get the camera info of the specified camera")
                .with_input([
                    ("camera_name", Shape::str()),
                    ("timeout_sec", Shape::float()),
                ])
                .with_output(Shape::open_map(Shape::Any)),
        ),
        (
            "c_save_rgb_image",
            SkillSpec::capability("Capture and save an RGB image to a file")
                .with_input([
                    ("filename", Shape::str()),
                    ("camera_name", Shape::str()),
                    ("width", Shape::int()),
                    ("height", Shape::int()),
                ])
                .with_output(success_output()),
        ),
        (
            "c_save_depth_image",
            SkillSpec::capability("Capture and save a depth image to a file")
                .with_input([
                    ("filename", Shape::str()),
                    ("camera_name", Shape::str()),
                    ("width", Shape::int()),
                    ("height", Shape::int()),
                ])
                .with_output(success_output()),
        ),
        (
            "c_get_robot_pose",
            SkillSpec::capability("Get the current pose of the robot")
                .with_input([("timeout_sec", Shape::float())])
                .with_output(Shape::mapping([
                    ("x", Shape::float()),
                    ("y", Shape::float()),
                    ("z", Shape::float()),
                    ("yaw", Shape::float()),
                ])),
        ),
        (
            "c_calculate_object_global_position",
            SkillSpec::capability(
                "Calculate the global position of an object from robot pose, \
                 pixel coordinates, depth and camera parameters",
            )
            .with_input([
                ("pixel_x", Shape::float()),
                ("pixel_y", Shape::float()),
                ("depth", Shape::float()),
                ("camera_info", Shape::open_map(Shape::Any)),
                (
                    "robot_pose",
                    Shape::mapping([
                        ("x", Shape::float()),
                        ("y", Shape::float()),
                        ("z", Shape::float()),
                        ("yaw", Shape::float()),
                    ]),
                ),
            ])
            .with_output(Shape::tuple([
                Shape::float(),
                Shape::float(),
                Shape::float(),
            ])),
        ),
        (
            "c_tf_transform",
            SkillSpec::capability(
                "Transform coordinates from the source frame to the target frame",
            )
            .with_input([
                ("source_frame", Shape::str()),
                ("target_frame", Shape::str()),
                ("x", Shape::float()),
                ("y", Shape::float()),
                ("z", Shape::float()),
            ])
            .with_output(Shape::tuple([
                Shape::float(),
                Shape::float(),
                Shape::float(),
            ])),
        ),
        (
            "s_detect_objs",
            SkillSpec::skill("Detect objects in the current view of the specified camera")
                .with_input([("camera_name", Shape::str())])
                .with_output(Shape::open_map(Shape::tuple([
                    Shape::float(),
                    Shape::float(),
                    Shape::float(),
                ])))
                .with_dependencies([
                    "c_camera_dep_rgb",
                    "c_camera_info",
                    "c_calculate_object_global_position",
                    "c_get_robot_pose",
                ]),
        ),
    ]
}
