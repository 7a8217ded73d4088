//! Frame drawing.
//!
//! The [`Renderer`] owns the camera and light uniforms and one pipeline per
//! kind of object. Every frame it walks the visible part of the scene graph,
//! sorts the objects into [`Render`] batches and draws them in one pass:
//! lit bodies first, then stars, then the blended rings.

use wgpu::util::DeviceExt;

use crate::{
    camera::{CameraRig, CameraUniform},
    context::Context,
    data_structures::scene_graph::{ObjectKind, SceneGraph},
    pipelines::{
        body::mk_body_pipeline,
        light::{LightResources, LightUniform},
        ring::mk_ring_pipeline,
        stars::{STAR_QUAD_VERTICES, mk_stars_pipeline},
    },
    resources::gpu::{GpuGeometry, GpuMaterial, GpuPoints, WgpuBackend},
};

/// The pipeline an object is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Lit, back-face culled, depth written.
    Body,
    /// Unlit, double-sided, alpha blended.
    Ring,
    Stars,
}

impl Pass {
    /// Bodies always take the lit pass, whatever their opacity.
    pub fn of(kind: &ObjectKind) -> Self {
        match kind {
            ObjectKind::Body { .. } => Pass::Body,
            ObjectKind::Ring { .. } => Pass::Ring,
            ObjectKind::Starfield { .. } => Pass::Stars,
        }
    }
}

/// One draw call and the pipeline it belongs to.
pub enum Render<'a> {
    Body(&'a GpuGeometry, &'a GpuMaterial),
    Ring(&'a GpuGeometry, &'a GpuMaterial),
    Stars(&'a GpuPoints, &'a GpuMaterial),
}

/// Collect the draw calls of every visible object.
///
/// Objects whose allocations are no longer known to the backend are
/// skipped.
pub fn collect<'a>(graph: &'a SceneGraph, backend: &'a WgpuBackend) -> Vec<Render<'a>> {
    let mut renders = Vec::new();
    for object in graph.objects() {
        object.for_each_visible(&mut |o| {
            let Some(material) = backend.material(o.kind.material()) else {
                return;
            };
            let render = match (Pass::of(&o.kind), &o.kind) {
                (Pass::Body, ObjectKind::Body { geometry, .. }) => backend
                    .geometry(*geometry)
                    .map(|g| Render::Body(g, material)),
                (Pass::Ring, ObjectKind::Ring { geometry, .. }) => backend
                    .geometry(*geometry)
                    .map(|g| Render::Ring(g, material)),
                (Pass::Stars, ObjectKind::Starfield { points, .. }) => {
                    backend.points(*points).map(|p| Render::Stars(p, material))
                }
                _ => None,
            };
            if let Some(render) = render {
                renders.push(render);
            }
        });
    }
    renders
}

fn clear_colour(colour: [f32; 3]) -> wgpu::Color {
    let [r, g, b] = colour.map(f64::from);
    wgpu::Color { r, g, b, a: 1.0 }
}

pub struct Renderer {
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    light: LightResources,
    body_pipeline: wgpu::RenderPipeline,
    ring_pipeline: wgpu::RenderPipeline,
    stars_pipeline: wgpu::RenderPipeline,
}

impl Renderer {
    pub fn new(ctx: &Context, backend: &WgpuBackend) -> Self {
        let device = &ctx.device;
        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout =
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
                label: Some("camera_bind_group_layout"),
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        let light = LightResources::new(device, LightUniform::from_lights(&[]));
        let object_layout = backend.object_layout();

        let body_pipeline = mk_body_pipeline(
            device,
            &ctx.config,
            &camera_bind_group_layout,
            &light.bind_group_layout,
            object_layout,
        );
        let ring_pipeline = mk_ring_pipeline(
            device,
            &ctx.config,
            &camera_bind_group_layout,
            &light.bind_group_layout,
            object_layout,
        );
        let stars_pipeline = mk_stars_pipeline(
            device,
            &ctx.config,
            &camera_bind_group_layout,
            &light.bind_group_layout,
            object_layout,
        );

        Self {
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            light,
            body_pipeline,
            ring_pipeline,
            stars_pipeline,
        }
    }

    /// Draw one frame. Frames the surface cannot provide are skipped.
    pub fn render(
        &mut self,
        ctx: &Context,
        graph: &SceneGraph,
        rig: &CameraRig,
        backend: &WgpuBackend,
    ) -> anyhow::Result<()> {
        let (output, suboptimal) = match ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture) => (texture, false),
            wgpu::CurrentSurfaceTexture::Suboptimal(texture) => (texture, true),
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => {
                return Ok(());
            }
            wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                log::warn!("Surface is outdated, reconfiguring");
                ctx.reconfigure();
                return Ok(());
            }
            wgpu::CurrentSurfaceTexture::Validation => {
                anyhow::bail!("surface texture could not be acquired")
            }
        };

        self.camera_uniform.update_view_proj(rig);
        ctx.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
        self.light
            .update(&ctx.queue, LightUniform::from_lights(&graph.lights));

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let renders = collect(graph, backend);
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour(graph.clear_colour)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_bind_group(1, &self.light.bind_group, &[]);

            render_pass.set_pipeline(&self.body_pipeline);
            for render in &renders {
                if let Render::Body(geometry, material) = render {
                    draw_geometry(&mut render_pass, geometry, material);
                }
            }

            render_pass.set_pipeline(&self.stars_pipeline);
            for render in &renders {
                if let Render::Stars(points, material) = render {
                    render_pass.set_bind_group(2, &material.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, points.vertex_buffer.slice(..));
                    render_pass.draw(0..STAR_QUAD_VERTICES, 0..points.count);
                }
            }

            render_pass.set_pipeline(&self.ring_pipeline);
            for render in &renders {
                if let Render::Ring(geometry, material) = render {
                    draw_geometry(&mut render_pass, geometry, material);
                }
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        ctx.window.pre_present_notify();
        output.present();
        if suboptimal {
            ctx.reconfigure();
        }
        Ok(())
    }
}

fn draw_geometry(
    render_pass: &mut wgpu::RenderPass<'_>,
    geometry: &GpuGeometry,
    material: &GpuMaterial,
) {
    render_pass.set_bind_group(2, &material.bind_group, &[]);
    render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
    render_pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    render_pass.draw_indexed(0..geometry.num_elements, 0, 0..1);
}
