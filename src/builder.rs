//! Scene construction from declarative descriptors.
//!
//! [`build_scene`] turns a [`SceneDescriptor`] into a [`SceneGraph`] and a
//! [`CameraRig`]. Every geometry, material and point cloud goes through the
//! [`ResourceRegistry`], so whatever gets built is released by the registry's
//! teardown, including the parts of a build that failed halfway.

use std::f32::consts::PI;

use log::info;
use rand::Rng;
use thiserror::Error;

use crate::{
    camera::{Camera, CameraRig},
    config::{CameraConfig, MissionConfig},
    data_structures::{
        instance::Instance,
        mesh::{MeshData, star_positions},
        scene_graph::{Light, LightKind, Material, ObjectKind, SceneGraph, SceneObject, rgb},
    },
    resources::{GpuBackend, ResourceError, ResourceId, ResourceRegistry},
};

/// Name of the starfield object in every scene.
pub const STARFIELD: &str = "starfield";

/// Bodies visited by the guided mission, in order.
pub const MISSION_TARGETS: [(&str, u32); 5] = [
    ("Mercury", 0x8c8c8c),
    ("Venus", 0xe3bb76),
    ("Mars", 0xc1440e),
    ("Jupiter", 0xd8ca9d),
    ("Saturn", 0xead6b8),
];

const EXPLORER_BODIES: [(&str, u32); 4] = [
    ("Mercury", 0xECA72C),
    ("Venus", 0x804b98),
    ("Earth", 0x5dade2),
    ("Mars", 0xe74c3c),
];

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("viewport {width}x{height} has no area")]
    DegenerateViewport { width: u32, height: u32 },
    #[error("body `{name}` is invalid: {reason}")]
    InvalidBody { name: String, reason: &'static str },
    #[error("starfield is invalid: {0}")]
    InvalidStarfield(&'static str),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RingDescriptor {
    pub name: String,
    pub radius: f32,
    pub tube: f32,
    pub color: u32,
    pub opacity: f32,
    /// Rotation about the parent's X axis.
    pub tilt: f32,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodyDescriptor {
    pub name: String,
    pub color: u32,
    /// The radius is drawn uniformly from `min..=max`.
    pub radius: (f32, f32),
    pub segments: u32,
    pub shininess: f32,
    pub position: [f32; 3],
    pub interactive: bool,
    pub ring: Option<RingDescriptor>,
}

impl BodyDescriptor {
    fn validate(&self) -> Result<(), SceneError> {
        let (min, max) = self.radius;
        let invalid = |reason| SceneError::InvalidBody {
            name: self.name.clone(),
            reason,
        };
        if !(min > 0.0) {
            return Err(invalid("radius must be positive"));
        }
        if min > max {
            return Err(invalid("radius range is reversed"));
        }
        if let Some(ring) = &self.ring {
            if !(ring.radius > 0.0 && ring.tube > 0.0) {
                return Err(invalid("ring dimensions must be positive"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StarfieldDescriptor {
    pub count: usize,
    /// Edge length of the cube the stars are scattered in.
    pub spread: f32,
    pub size: f32,
    pub color: u32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneDescriptor {
    /// Camera distance on the +z axis, looking at the origin.
    pub camera_distance: f32,
    pub clear_colour: u32,
    pub lights: Vec<Light>,
    pub starfield: StarfieldDescriptor,
    pub bodies: Vec<BodyDescriptor>,
}

fn light(kind: LightKind, color: u32, intensity: f32, position: [f32; 3]) -> Light {
    Light {
        kind,
        color: rgb(color),
        intensity,
        position,
    }
}

impl SceneDescriptor {
    /// Four clickable planets bobbing in front of the camera.
    pub fn orbit_explorer() -> Self {
        let bodies = EXPLORER_BODIES
            .iter()
            .enumerate()
            .map(|(i, (name, color))| BodyDescriptor {
                name: name.to_string(),
                color: *color,
                radius: (0.8, 1.3),
                segments: 32,
                shininess: 100.0,
                position: [(i as f32 - 1.5) * 3.5, 0.0, 0.0],
                interactive: true,
                ring: None,
            })
            .collect();
        Self {
            camera_distance: 8.0,
            clear_colour: 0x31263e,
            lights: vec![
                light(LightKind::Ambient, 0xffffff, 0.5, [0.0; 3]),
                light(LightKind::Point, 0xffffff, 1.0, [10.0, 10.0, 10.0]),
            ],
            starfield: StarfieldDescriptor {
                count: 2000,
                spread: 50.0,
                size: 0.05,
                color: 0xfffdea,
                opacity: 1.0,
            },
            bodies,
        }
    }

    /// The mission scene with only the body for `target` in it.
    pub fn guided_mission(target: usize, config: &MissionConfig) -> Self {
        Self {
            camera_distance: 12.0,
            clear_colour: 0x020205,
            lights: vec![
                light(LightKind::Directional, 0xffffff, 2.0, [5.0, 5.0, 10.0]),
                light(LightKind::Ambient, 0x202020, 1.5, [0.0; 3]),
            ],
            starfield: StarfieldDescriptor {
                count: 5000,
                spread: 300.0,
                size: 0.08,
                color: 0xffffff,
                opacity: 0.8,
            },
            bodies: vec![mission_target(target, config)],
        }
    }
}

/// Descriptor of the mission body for `target`, placed at the start depth.
pub fn mission_target(target: usize, config: &MissionConfig) -> BodyDescriptor {
    let (name, color) = MISSION_TARGETS[target.min(MISSION_TARGETS.len() - 1)];
    BodyDescriptor {
        name: name.to_string(),
        color,
        radius: (4.0, 4.0),
        segments: 64,
        shininess: 15.0,
        position: [0.0, 0.0, config.start_depth],
        interactive: false,
        ring: Some(RingDescriptor {
            name: format!("{} ring", name),
            radius: 6.5,
            tube: 1.2,
            color: 0x9a8c73,
            opacity: 0.5,
            tilt: PI / 2.5,
            visible: false,
        }),
    }
}

/// Build a body and its ring. All allocations are registered.
pub fn build_body<B: GpuBackend, R: Rng>(
    desc: &BodyDescriptor,
    registry: &mut ResourceRegistry<B>,
    rng: &mut R,
) -> Result<SceneObject, SceneError> {
    desc.validate()?;
    let (min, max) = desc.radius;
    let radius = if min < max {
        rng.gen_range(min..=max)
    } else {
        min
    };
    let mut allocated = Vec::new();
    let body = assemble_body(desc, radius, registry, &mut allocated);
    if body.is_err() {
        for id in allocated {
            registry.release(id);
        }
    }
    body
}

/// Allocates everything a body needs, recording each id so a failed build
/// can hand them back.
fn assemble_body<B: GpuBackend>(
    desc: &BodyDescriptor,
    radius: f32,
    registry: &mut ResourceRegistry<B>,
    allocated: &mut Vec<ResourceId>,
) -> Result<SceneObject, SceneError> {
    let material = Material::phong(desc.color, desc.shininess);
    let geometry = registry.allocate_geometry(
        &desc.name,
        &MeshData::sphere(radius, desc.segments, desc.segments),
    )?;
    allocated.push(geometry);
    let material_id = registry.allocate_material(&desc.name, &material)?;
    allocated.push(material_id);
    let [x, y, z] = desc.position;
    let mut body = SceneObject::new(
        desc.name.clone(),
        ObjectKind::Body {
            geometry,
            material: material_id,
            radius,
        },
        material,
    )
    .with_transform(Instance::at(x, y, z));
    body.interactive = desc.interactive;

    if let Some(ring) = &desc.ring {
        let ring_material = Material {
            color: rgb(ring.color),
            opacity: ring.opacity,
            lit: false,
            double_sided: true,
            ..Material::default()
        };
        let geometry =
            registry.allocate_geometry(&ring.name, &MeshData::torus(ring.radius, ring.tube, 2, 100))?;
        allocated.push(geometry);
        let material = registry.allocate_material(&ring.name, &ring_material)?;
        allocated.push(material);
        let mut local = Instance::new();
        local.spin_x(ring.tilt);
        let mut child = SceneObject::new(
            ring.name.clone(),
            ObjectKind::Ring { geometry, material },
            ring_material,
        )
        .with_transform(local);
        child.visible = ring.visible;
        body.add_child(child);
    }
    Ok(body)
}

fn build_starfield<B: GpuBackend, R: Rng>(
    desc: &StarfieldDescriptor,
    registry: &mut ResourceRegistry<B>,
    rng: &mut R,
) -> Result<SceneObject, SceneError> {
    if desc.count == 0 {
        return Err(SceneError::InvalidStarfield("no stars"));
    }
    if !(desc.spread > 0.0) {
        return Err(SceneError::InvalidStarfield("spread must be positive"));
    }
    let material = Material::points(desc.color, desc.size, desc.opacity);
    let stars = star_positions(rng, desc.count, desc.spread);
    let points = registry.allocate_points(STARFIELD, &stars)?;
    let material_id = registry.allocate_material(STARFIELD, &material)?;
    Ok(SceneObject::new(
        STARFIELD,
        ObjectKind::Starfield {
            points,
            material: material_id,
        },
        material,
    ))
}

/// Build the complete scene for a positive viewport.
pub fn build_scene<B: GpuBackend, R: Rng>(
    viewport: (u32, u32),
    desc: &SceneDescriptor,
    camera: &CameraConfig,
    registry: &mut ResourceRegistry<B>,
    rng: &mut R,
) -> Result<(SceneGraph, CameraRig), SceneError> {
    let (width, height) = viewport;
    if width == 0 || height == 0 {
        return Err(SceneError::DegenerateViewport { width, height });
    }
    desc.bodies.iter().try_for_each(BodyDescriptor::validate)?;

    let rig = CameraRig::new(Camera::on_axis(desc.camera_distance), camera, width, height);
    let mut graph = SceneGraph::new(rgb(desc.clear_colour));
    graph.lights = desc.lights.clone();
    graph.add(build_starfield(&desc.starfield, registry, rng)?);
    for body in &desc.bodies {
        graph.add(build_body(body, registry, rng)?);
    }
    info!(
        "Built scene with {} bodies and {} stars for a {}x{} viewport",
        desc.bodies.len(),
        desc.starfield.count,
        width,
        height
    );
    Ok((graph, rig))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ResourceKind, headless::HeadlessBackend};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn explorer_registers_everything() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::new());
        let mut rng = StdRng::seed_from_u64(1);
        let (graph, rig) = build_scene(
            (800, 600),
            &SceneDescriptor::orbit_explorer(),
            &CameraConfig::default(),
            &mut registry,
            &mut rng,
        )
        .unwrap();

        assert_eq!(graph.objects().len(), 5);
        assert_eq!(graph.interactive_bodies().len(), 4);
        assert_eq!(rig.viewport(), (800, 600));
        let backend = registry.backend().stats();
        assert_eq!(backend.created_of(ResourceKind::Geometry), 4);
        assert_eq!(backend.created_of(ResourceKind::PointCloud), 1);
        assert_eq!(backend.created_of(ResourceKind::Material), 5);
        assert_eq!(registry.live_count(), 10);

        for (_, _, radius) in graph.interactive_bodies() {
            assert!((0.8..=1.3).contains(&radius));
        }
    }

    #[test]
    fn mission_body_carries_a_hidden_ring() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::new());
        let mut rng = StdRng::seed_from_u64(1);
        let config = MissionConfig::default();
        let (graph, _) = build_scene(
            (800, 600),
            &SceneDescriptor::guided_mission(0, &config),
            &CameraConfig::default(),
            &mut registry,
            &mut rng,
        )
        .unwrap();

        let body = graph.get("Mercury").unwrap();
        assert_eq!(body.local.position.z, -50.0);
        assert_eq!(body.children().len(), 1);
        assert!(!body.children()[0].visible);
        assert_eq!(registry.live_count(), 6);
    }

    #[test]
    fn degenerate_viewport_allocates_nothing() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::new());
        let mut rng = StdRng::seed_from_u64(1);
        let result = build_scene(
            (0, 600),
            &SceneDescriptor::orbit_explorer(),
            &CameraConfig::default(),
            &mut registry,
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(SceneError::DegenerateViewport { width: 0, .. })
        ));
        assert_eq!(registry.backend().stats().created_count(), 0);
    }

    #[test]
    fn invalid_body_allocates_nothing() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::new());
        let mut rng = StdRng::seed_from_u64(1);
        let mut desc = SceneDescriptor::orbit_explorer();
        desc.bodies[2].radius = (2.0, 1.0);
        let result = build_scene(
            (800, 600),
            &desc,
            &CameraConfig::default(),
            &mut registry,
            &mut rng,
        );
        assert!(matches!(result, Err(SceneError::InvalidBody { .. })));
        assert_eq!(registry.backend().stats().created_count(), 0);
    }

    #[test]
    fn failed_body_hands_back_its_allocations() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::failing_after(3));
        let stats = registry.backend().stats();
        let mut rng = StdRng::seed_from_u64(1);
        let desc = mission_target(0, &MissionConfig::default());
        let result = build_body(&desc, &mut registry, &mut rng);

        assert!(matches!(
            result,
            Err(SceneError::Resource(ResourceError::Allocation {
                kind: ResourceKind::Material,
                ..
            }))
        ));
        assert_eq!(stats.created_count(), 3);
        assert_eq!(registry.live_count(), 0);
        for id in stats.created_ids() {
            assert_eq!(stats.release_count(id), 1);
        }
    }
}
