use crate::{
    data_structures::mesh::{ModelVertex, Vertex},
    pipelines::basic::{PipelineOptions, mk_pipeline_layout, mk_render_pipeline},
};

/**
 * Pipeline for transparent, double sided meshes such as planetary rings.
 *
 * Shares the body shader; unlit materials skip the lighting term there.
 * Draw these after all opaque objects.
 */
pub fn mk_ring_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    object_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Ring Pipeline Layout",
        camera_bind_group_layout,
        light_bind_group_layout,
        object_bind_group_layout,
    );
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Ring Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("body.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        PipelineOptions::TRANSPARENT,
        &[ModelVertex::desc()],
        shader,
    )
}
