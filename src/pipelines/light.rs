use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::{Light, LightKind};

/// Scene lighting as seen by the shaders: one ambient term and one key
/// light, either a point light or a directional one.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    /// w is 1 for point lights and 0 for directional lights.
    position: [f32; 4],
    color: [f32; 4],
}

impl LightUniform {
    /// Ambient lights add up, the first point or directional light is the key.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniform = Self {
            ambient: [0.0; 4],
            position: [0.0, 0.0, 1.0, 0.0],
            color: [0.0; 4],
        };
        let mut has_key = false;
        for light in lights {
            let [r, g, b] = light.color.map(|c| c * light.intensity);
            match light.kind {
                LightKind::Ambient => {
                    uniform.ambient[0] += r;
                    uniform.ambient[1] += g;
                    uniform.ambient[2] += b;
                }
                LightKind::Point | LightKind::Directional if !has_key => {
                    has_key = true;
                    let [x, y, z] = light.position;
                    let w = if light.kind == LightKind::Point { 1.0 } else { 0.0 };
                    uniform.position = [x, y, z, w];
                    uniform.color = [r, g, b, 1.0];
                }
                _ => log::debug!("Only one key light is supported, ignoring {:?}", light.kind),
            }
        }
        uniform
    }
}

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
        label: Some("light_bind_group_layout"),
    })
}
