//! Procedural geometry.
//!
//! Bodies are UV spheres, rings are tori and the starfield is a plain point
//! cloud. Meshes are generated on the CPU and uploaded by a
//! [`crate::resources::GpuBackend`].

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector3};
use rand::Rng;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// A single star. Each star is one instance, expanded to a quad on the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
}

impl Vertex for PointVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Triangle mesh in CPU memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// A UV sphere centered at the origin.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let normal = Vector3::new(
                    -(u * TAU).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * TAU).sin() * (v * PI).sin(),
                );
                vertices.push(ModelVertex {
                    position: (normal * radius).into(),
                    normal: normal.into(),
                });
            }
        }

        let row = width_segments + 1;
        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // the poles collapse to a single triangle per segment
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        Self { vertices, indices }
    }

    /// A torus in the XY plane around the origin.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial_segments = radial_segments.max(2);
        let tubular_segments = tubular_segments.max(3);
        let mut vertices = Vec::new();
        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * TAU;
                let position = Vector3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let offset = position - center;
                let normal = if offset.magnitude2() > 0.0 {
                    offset.normalize()
                } else {
                    Vector3::unit_z()
                };
                vertices.push(ModelVertex {
                    position: position.into(),
                    normal: normal.into(),
                });
            }
        }

        let row = tubular_segments + 1;
        let mut indices = Vec::new();
        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = row * j + i - 1;
                let b = row * (j - 1) + i - 1;
                let c = row * (j - 1) + i;
                let d = row * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        Self { vertices, indices }
    }

    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Random star positions inside a cube of edge `spread` around the origin.
pub fn star_positions<R: Rng>(rng: &mut R, count: usize, spread: f32) -> Vec<PointVertex> {
    (0..count)
        .map(|_| PointVertex {
            position: [
                (rng.r#gen::<f32>() - 0.5) * spread,
                (rng.r#gen::<f32>() - 0.5) * spread,
                (rng.r#gen::<f32>() - 0.5) * spread,
            ],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn sphere_vertices_lie_on_the_surface() {
        let mesh = MeshData::sphere(4.0, 16, 8);
        assert_eq!(mesh.vertices.len(), 17 * 9);
        // two pole rows with one triangle per segment, the rest with two
        assert_eq!(mesh.indices.len(), (16 * 2 + 16 * 6 * 2) * 3);
        for vertex in &mesh.vertices {
            let p = Vector3::from(vertex.position);
            assert!((p.magnitude() - 4.0).abs() < 1e-4);
        }
        let max = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn flat_torus_indices_are_in_range() {
        let mesh = MeshData::torus(6.5, 1.2, 2, 100);
        assert_eq!(mesh.vertices.len(), 3 * 101);
        assert_eq!(mesh.num_elements(), 2 * 100 * 6);
        let max = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn stars_stay_inside_their_cube() {
        let mut rng = StdRng::seed_from_u64(7);
        let stars = star_positions(&mut rng, 500, 50.0);
        assert_eq!(stars.len(), 500);
        assert!(
            stars
                .iter()
                .flat_map(|s| s.position)
                .all(|c| (-25.0..=25.0).contains(&c))
        );
    }
}
