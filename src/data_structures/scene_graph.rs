//! Scene graph and hierarchical scene organization.
//!
//! A scene is a flat list of root [`SceneObject`]s plus its lights. Objects
//! own their children: a ring attached to a planet lives inside the planet,
//! inherits its world transform and is released together with it.

use cgmath::Point3;
use log::warn;

use crate::{
    data_structures::instance::Instance,
    resources::{GpuBackend, ObjectUniform, ResourceError, ResourceId, ResourceRegistry},
};

/// Convert an sRGB `0xRRGGBB` colour to linear components.
pub fn rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub opacity: f32,
    pub shininess: f32,
    /// Only used by point clouds.
    pub point_size: f32,
    pub lit: bool,
    pub double_sided: bool,
}

impl Material {
    pub fn phong(color: u32, shininess: f32) -> Self {
        Self {
            color: rgb(color),
            shininess,
            ..Self::default()
        }
    }

    pub fn points(color: u32, size: f32, opacity: f32) -> Self {
        Self {
            color: rgb(color),
            opacity,
            point_size: size,
            lit: false,
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            shininess: 30.0,
            point_size: 1.0,
            lit: true,
            double_sided: false,
        }
    }
}

/// What an object is, together with the resources it has to give back.
///
/// Each variant lists its allocations explicitly; [`ObjectKind::dispose`]
/// releases exactly those.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Body {
        geometry: ResourceId,
        material: ResourceId,
        radius: f32,
    },
    Ring {
        geometry: ResourceId,
        material: ResourceId,
    },
    Starfield {
        points: ResourceId,
        material: ResourceId,
    },
}

impl ObjectKind {
    pub fn material(&self) -> ResourceId {
        match self {
            ObjectKind::Body { material, .. }
            | ObjectKind::Ring { material, .. }
            | ObjectKind::Starfield { material, .. } => *material,
        }
    }

    /// Release this object's own allocations. Returns how many were live.
    pub fn dispose<B: GpuBackend>(&self, registry: &mut ResourceRegistry<B>) -> usize {
        let ids = match self {
            ObjectKind::Body {
                geometry, material, ..
            }
            | ObjectKind::Ring { geometry, material } => [*geometry, *material],
            ObjectKind::Starfield { points, material } => [*points, *material],
        };
        ids.into_iter().filter(|id| registry.release(*id)).count()
    }
}

#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub material: Material,
    pub local: Instance,
    world: Instance,
    pub visible: bool,
    /// Eligible for pointer ray tests.
    pub interactive: bool,
    children: Vec<SceneObject>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind, material: Material) -> Self {
        Self {
            name: name.into(),
            kind,
            material,
            local: Instance::new(),
            world: Instance::new(),
            visible: true,
            interactive: false,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, local: Instance) -> Self {
        self.local = local;
        self.world = local;
        self
    }

    pub fn with_child(mut self, child: SceneObject) -> Self {
        self.add_child(child);
        self
    }

    pub fn add_child(&mut self, child: SceneObject) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[SceneObject] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [SceneObject] {
        &mut self.children
    }

    pub fn world(&self) -> &Instance {
        &self.world
    }

    pub fn update_world_transform(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transform(&world);
        }
    }

    /// Depth first search by name, including `self`.
    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    /// World-space bounding sphere of a body.
    pub fn bounding_sphere(&self) -> Option<(Point3<f32>, f32)> {
        match self.kind {
            ObjectKind::Body { radius, .. } => {
                Some((self.world.origin(), radius * self.world.max_scale()))
            }
            _ => None,
        }
    }

    /// Visit the object and its descendants. Invisible objects hide their
    /// whole subtree.
    pub fn for_each_visible<'a>(&'a self, f: &mut dyn FnMut(&'a SceneObject)) {
        if !self.visible {
            return;
        }
        f(self);
        for child in &self.children {
            child.for_each_visible(f);
        }
    }

    pub fn for_each<'a>(&'a self, f: &mut dyn FnMut(&'a SceneObject)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }

    /// Push world transforms and material parameters to the backend.
    pub fn sync<B: GpuBackend>(
        &self,
        registry: &mut ResourceRegistry<B>,
    ) -> Result<(), ResourceError> {
        let uniform = ObjectUniform::new(&self.world, &self.material);
        registry.write_material(self.kind.material(), &uniform)?;
        for child in &self.children {
            child.sync(registry)?;
        }
        Ok(())
    }

    /// Release this object and its whole subtree. Children go first.
    pub fn dispose<B: GpuBackend>(self, registry: &mut ResourceRegistry<B>) -> usize {
        let released: usize = self
            .children
            .into_iter()
            .map(|child| child.dispose(registry))
            .sum();
        released + self.kind.dispose(registry)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Position for point lights, direction source for directional ones.
    pub position: [f32; 3],
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub clear_colour: [f32; 3],
}

impl SceneGraph {
    pub fn new(clear_colour: [f32; 3]) -> Self {
        Self {
            objects: Vec::new(),
            lights: Vec::new(),
            clear_colour,
        }
    }

    pub fn add(&mut self, mut object: SceneObject) {
        if self.get(&object.name).is_some() {
            warn!("Scene already contains an object named {}", object.name);
        }
        object.update_world_transform(&Instance::new());
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find_map(|object| object.find(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects
            .iter_mut()
            .find_map(|object| object.find_mut(name))
    }

    /// Detach a root object. The caller becomes responsible for disposing it.
    pub fn remove(&mut self, name: &str) -> Option<SceneObject> {
        let idx = self.objects.iter().position(|o| o.name == name)?;
        Some(self.objects.remove(idx))
    }

    pub fn update_world_transforms(&mut self) {
        let root = Instance::new();
        for object in self.objects.iter_mut() {
            object.update_world_transform(&root);
        }
    }

    /// Bounding spheres of every interactive body in the graph.
    pub fn interactive_bodies(&self) -> Vec<(&str, Point3<f32>, f32)> {
        let mut bodies = Vec::new();
        for object in &self.objects {
            object.for_each(&mut |o| {
                if !o.interactive {
                    return;
                }
                if let Some((center, radius)) = o.bounding_sphere() {
                    bodies.push((o.name.as_str(), center, radius));
                }
            });
        }
        bodies
    }

    pub fn sync<B: GpuBackend>(
        &self,
        registry: &mut ResourceRegistry<B>,
    ) -> Result<(), ResourceError> {
        self.objects.iter().try_for_each(|o| o.sync(registry))
    }

    /// Release every object. The graph is empty afterwards.
    pub fn dispose<B: GpuBackend>(&mut self, registry: &mut ResourceRegistry<B>) -> usize {
        self.objects
            .drain(..)
            .map(|object| object.dispose(registry))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data_structures::mesh::MeshData, resources::headless::HeadlessBackend};

    fn body(registry: &mut ResourceRegistry<HeadlessBackend>, name: &str) -> SceneObject {
        let geometry = registry
            .allocate_geometry(name, &MeshData::sphere(1.0, 8, 4))
            .unwrap();
        let material = registry
            .allocate_material(name, &Material::default())
            .unwrap();
        SceneObject::new(
            name,
            ObjectKind::Body {
                geometry,
                material,
                radius: 1.0,
            },
            Material::default(),
        )
    }

    #[test]
    fn hex_colours() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb(0x0000ff), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn disposing_a_parent_releases_its_children() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::new());
        let child = body(&mut registry, "moon");
        let parent = body(&mut registry, "planet").with_child(child);
        let mut graph = SceneGraph::default();
        graph.add(parent);

        let detached = graph.remove("planet").unwrap();
        assert_eq!(detached.dispose(&mut registry), 4);
        assert_eq!(registry.live_count(), 0);
        assert!(graph.get("moon").is_none());
    }

    #[test]
    fn children_inherit_the_world_transform() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::new());
        let child = body(&mut registry, "moon").with_transform(Instance::at(2.0, 0.0, 0.0));
        let parent = body(&mut registry, "planet")
            .with_transform(Instance::at(0.0, 0.0, -10.0))
            .with_child(child);
        let mut graph = SceneGraph::default();
        graph.add(parent);

        graph.get_mut("planet").unwrap().local.position.z = -5.0;
        graph.update_world_transforms();
        let moon = graph.get("moon").unwrap().world().origin();
        assert_eq!(moon, Point3::new(2.0, 0.0, -5.0));
        registry.teardown();
    }

    #[test]
    fn hidden_parents_hide_children() {
        let mut registry = ResourceRegistry::new(HeadlessBackend::new());
        let child = body(&mut registry, "moon");
        let mut parent = body(&mut registry, "planet").with_child(child);
        parent.visible = false;
        let mut seen = 0;
        parent.for_each_visible(&mut |_| seen += 1);
        assert_eq!(seen, 0);
        registry.teardown();
    }
}
