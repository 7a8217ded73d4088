//! Resource lifecycle management.
//!
//! Every GPU-backed object a scene needs (geometries, materials and the star
//! point cloud) is allocated through a [`ResourceRegistry`]. The registry
//! remembers each live allocation and releases it exactly once, either
//! individually (when a target body is replaced) or all at once on
//! [`ResourceRegistry::teardown`]. Teardown is idempotent and also runs when
//! the registry is dropped, so an abrupt unmount cannot leak.
//!
//! The actual allocation is done by a [`GpuBackend`]. [`gpu::WgpuBackend`]
//! talks to wgpu, [`headless::HeadlessBackend`] only counts calls.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use thiserror::Error;

use crate::data_structures::{
    instance::{Instance, InstanceRaw},
    mesh::{MeshData, PointVertex},
    scene_graph::Material,
};

pub mod gpu;
pub mod headless;

/// Handle of one registered allocation. Never reused within a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    PointCloud,
}

#[derive(Debug, Error, PartialEq)]
pub enum ResourceError {
    #[error("backend failed to allocate {kind:?} `{label}`: {reason}")]
    Allocation {
        kind: ResourceKind,
        label: String,
        reason: String,
    },
    #[error("resource {0:?} is not live")]
    Unknown(ResourceId),
    #[error("the registry has been torn down")]
    TornDown,
}

/// Per-object data written into a material's uniform buffer every frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    transform: InstanceRaw,
    color: [f32; 4],
    /// shininess, point size, lit flag, unused
    params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: &Instance, material: &Material) -> Self {
        let [r, g, b] = material.color;
        Self {
            transform: world.to_raw(),
            color: [r, g, b, material.opacity],
            params: [
                material.shininess,
                material.point_size,
                if material.lit { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// Allocates and frees the GPU side of scene resources.
///
/// The registry guarantees that `release` is called at most once per id and
/// only for ids that were successfully created.
pub trait GpuBackend {
    fn create_geometry(
        &mut self,
        id: ResourceId,
        label: &str,
        mesh: &MeshData,
    ) -> Result<(), ResourceError>;

    fn create_points(
        &mut self,
        id: ResourceId,
        label: &str,
        points: &[PointVertex],
    ) -> Result<(), ResourceError>;

    fn create_material(
        &mut self,
        id: ResourceId,
        label: &str,
        material: &Material,
    ) -> Result<(), ResourceError>;

    fn write_material(&mut self, id: ResourceId, uniform: &ObjectUniform);

    fn release(&mut self, id: ResourceId, kind: ResourceKind);
}

#[derive(Debug)]
struct Allocation {
    kind: ResourceKind,
    label: String,
}

/// Owner of every live allocation of one scene session.
pub struct ResourceRegistry<B: GpuBackend> {
    backend: B,
    next_id: u64,
    live: BTreeMap<ResourceId, Allocation>,
    released: usize,
    torn_down: bool,
}

impl<B: GpuBackend> ResourceRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            next_id: 0,
            live: BTreeMap::new(),
            released: 0,
            torn_down: false,
        }
    }

    fn register(
        &mut self,
        kind: ResourceKind,
        label: &str,
        create: impl FnOnce(&mut B, ResourceId) -> Result<(), ResourceError>,
    ) -> Result<ResourceId, ResourceError> {
        if self.torn_down {
            return Err(ResourceError::TornDown);
        }
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        create(&mut self.backend, id)?;
        debug!("Allocated {:?} `{}` as {:?}", kind, label, id);
        self.live.insert(
            id,
            Allocation {
                kind,
                label: label.to_string(),
            },
        );
        Ok(id)
    }

    pub fn allocate_geometry(
        &mut self,
        label: &str,
        mesh: &MeshData,
    ) -> Result<ResourceId, ResourceError> {
        self.register(ResourceKind::Geometry, label, |backend, id| {
            backend.create_geometry(id, label, mesh)
        })
    }

    pub fn allocate_points(
        &mut self,
        label: &str,
        points: &[PointVertex],
    ) -> Result<ResourceId, ResourceError> {
        self.register(ResourceKind::PointCloud, label, |backend, id| {
            backend.create_points(id, label, points)
        })
    }

    pub fn allocate_material(
        &mut self,
        label: &str,
        material: &Material,
    ) -> Result<ResourceId, ResourceError> {
        self.register(ResourceKind::Material, label, |backend, id| {
            backend.create_material(id, label, material)
        })
    }

    /// Upload an object's world transform and material parameters.
    pub fn write_material(
        &mut self,
        id: ResourceId,
        uniform: &ObjectUniform,
    ) -> Result<(), ResourceError> {
        if self.torn_down {
            return Err(ResourceError::TornDown);
        }
        match self.live.get(&id) {
            Some(allocation) if allocation.kind == ResourceKind::Material => {
                self.backend.write_material(id, uniform);
                Ok(())
            }
            _ => Err(ResourceError::Unknown(id)),
        }
    }

    /// Release a single allocation. Returns `false` if it was not live.
    pub fn release(&mut self, id: ResourceId) -> bool {
        match self.live.remove(&id) {
            Some(allocation) => {
                debug!(
                    "Releasing {:?} `{}` ({:?})",
                    allocation.kind, allocation.label, id
                );
                self.backend.release(id, allocation.kind);
                self.released += 1;
                true
            }
            None => {
                warn!("Ignoring release of {:?}, it is not live", id);
                false
            }
        }
    }

    /// Release every live allocation. Later calls are no-ops.
    ///
    /// Returns the number of allocations released by this call.
    pub fn teardown(&mut self) -> usize {
        if self.torn_down {
            warn!("Resource registry is already torn down");
            return 0;
        }
        self.torn_down = true;
        let live = std::mem::take(&mut self.live);
        let count = live.len();
        for (id, allocation) in live {
            debug!(
                "Releasing {:?} `{}` ({:?})",
                allocation.kind, allocation.label, id
            );
            self.backend.release(id, allocation.kind);
        }
        self.released += count;
        info!(
            "Resource registry torn down, released {} of {} allocations in this call",
            count, self.released
        );
        count
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total number of releases over the registry's lifetime.
    pub fn released_count(&self) -> usize {
        self.released
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: GpuBackend> Drop for ResourceRegistry<B> {
    fn drop(&mut self) {
        if !self.torn_down {
            warn!("Resource registry dropped without teardown, releasing now");
            self.teardown();
        }
    }
}
