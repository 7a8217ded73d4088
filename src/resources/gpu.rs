//! wgpu implementation of [`GpuBackend`].
//!
//! Geometries get a vertex and an index buffer, point clouds a vertex buffer
//! and materials a uniform buffer with its bind group. Releasing an id
//! `destroy()`s its buffers right away instead of waiting for the last
//! handle to drop.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        mesh::{MeshData, PointVertex},
        scene_graph::Material,
    },
    resources::{GpuBackend, ObjectUniform, ResourceError, ResourceId, ResourceKind},
};

#[derive(Debug)]
pub struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

#[derive(Debug)]
pub struct GpuPoints {
    pub vertex_buffer: wgpu::Buffer,
    pub count: u32,
}

#[derive(Debug)]
pub struct GpuMaterial {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Layout of the per-object uniform (transform + material) at group 2.
pub fn object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("object_bind_group_layout"),
    })
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    object_layout: wgpu::BindGroupLayout,
    geometries: HashMap<ResourceId, GpuGeometry>,
    points: HashMap<ResourceId, GpuPoints>,
    materials: HashMap<ResourceId, GpuMaterial>,
}

impl WgpuBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
            object_layout: object_bind_group_layout(device),
            geometries: HashMap::new(),
            points: HashMap::new(),
            materials: HashMap::new(),
        }
    }

    pub fn object_layout(&self) -> &wgpu::BindGroupLayout {
        &self.object_layout
    }

    pub fn geometry(&self, id: ResourceId) -> Option<&GpuGeometry> {
        self.geometries.get(&id)
    }

    pub fn points(&self, id: ResourceId) -> Option<&GpuPoints> {
        self.points.get(&id)
    }

    pub fn material(&self, id: ResourceId) -> Option<&GpuMaterial> {
        self.materials.get(&id)
    }

    pub fn allocation_count(&self) -> usize {
        self.geometries.len() + self.points.len() + self.materials.len()
    }
}

impl GpuBackend for WgpuBackend {
    fn create_geometry(
        &mut self,
        id: ResourceId,
        label: &str,
        mesh: &MeshData,
    ) -> Result<(), ResourceError> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(ResourceError::Allocation {
                kind: ResourceKind::Geometry,
                label: label.to_string(),
                reason: "empty mesh".to_string(),
            });
        }
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", label)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", label)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.geometries.insert(
            id,
            GpuGeometry {
                vertex_buffer,
                index_buffer,
                num_elements: mesh.num_elements(),
            },
        );
        Ok(())
    }

    fn create_points(
        &mut self,
        id: ResourceId,
        label: &str,
        points: &[PointVertex],
    ) -> Result<(), ResourceError> {
        if points.is_empty() {
            return Err(ResourceError::Allocation {
                kind: ResourceKind::PointCloud,
                label: label.to_string(),
                reason: "no points".to_string(),
            });
        }
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Point Buffer", label)),
                contents: bytemuck::cast_slice(points),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.points.insert(
            id,
            GpuPoints {
                vertex_buffer,
                count: points.len() as u32,
            },
        );
        Ok(())
    }

    fn create_material(
        &mut self,
        id: ResourceId,
        label: &str,
        material: &Material,
    ) -> Result<(), ResourceError> {
        let uniform = ObjectUniform::new(&Instance::new(), material);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Material Buffer", label)),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{} Material Bind Group", label)),
        });
        self.materials
            .insert(id, GpuMaterial { buffer, bind_group });
        Ok(())
    }

    fn write_material(&mut self, id: ResourceId, uniform: &ObjectUniform) {
        if let Some(material) = self.materials.get(&id) {
            self.queue
                .write_buffer(&material.buffer, 0, bytemuck::cast_slice(&[*uniform]));
        }
    }

    fn release(&mut self, id: ResourceId, kind: ResourceKind) {
        match kind {
            ResourceKind::Geometry => {
                if let Some(geometry) = self.geometries.remove(&id) {
                    geometry.vertex_buffer.destroy();
                    geometry.index_buffer.destroy();
                }
            }
            ResourceKind::PointCloud => {
                if let Some(points) = self.points.remove(&id) {
                    points.vertex_buffer.destroy();
                }
            }
            ResourceKind::Material => {
                if let Some(material) = self.materials.remove(&id) {
                    material.buffer.destroy();
                }
            }
        }
    }
}
