use crate::{
    data_structures::mesh::{ModelVertex, Vertex},
    pipelines::basic::{PipelineOptions, mk_pipeline_layout, mk_render_pipeline},
};

/// Lit, opaque bodies.
pub fn mk_body_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    object_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Body Pipeline Layout",
        camera_bind_group_layout,
        light_bind_group_layout,
        object_bind_group_layout,
    );
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Body Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("body.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        PipelineOptions::OPAQUE,
        &[ModelVertex::desc()],
        shader,
    )
}
