use crate::{
    data_structures::mesh::{PointVertex, Vertex},
    pipelines::basic::{PipelineOptions, mk_pipeline_layout, mk_render_pipeline},
};

/// Vertices per star quad.
pub const STAR_QUAD_VERTICES: u32 = 6;

/// Starfield pipeline. One instance per star, six vertices per instance.
pub fn mk_stars_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    object_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Stars Pipeline Layout",
        camera_bind_group_layout,
        light_bind_group_layout,
        object_bind_group_layout,
    );
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Stars Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("stars.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        PipelineOptions {
            cull_mode: None,
            ..PipelineOptions::TRANSPARENT
        },
        &[PointVertex::desc()],
        shader,
    )
}
