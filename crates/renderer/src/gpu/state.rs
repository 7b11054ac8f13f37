use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use material::{ShaderProgram, UniformTable};
use tracing::{debug, info};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::camera::OrbitCamera;
use crate::mesh::Icosphere;
use crate::types::RendererConfig;

use super::context::{GpuContext, DEPTH_FORMAT};
use super::pipeline::{MaterialPipeline, PipelineLayouts};
use super::uniforms::SceneUniforms;

enum PipelineFuture {
    Ready(Box<MaterialPipeline>),
    Threaded {
        receiver: Receiver<Result<MaterialPipeline>>,
    },
}

impl PipelineFuture {
    /// Returns the pipeline once the worker has delivered it. A failed build
    /// is returned as an error exactly once.
    fn poll(&mut self) -> Result<Option<&mut MaterialPipeline>> {
        if let PipelineFuture::Threaded { receiver } = self {
            match receiver.try_recv() {
                Ok(result) => {
                    let pipeline = result?;
                    info!("material pipeline ready");
                    *self = PipelineFuture::Ready(Box::new(pipeline));
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => {
                    return Err(anyhow!(
                        "pipeline build worker disconnected before returning a result"
                    ))
                }
            }
        }
        match self {
            PipelineFuture::Ready(pipeline) => Ok(Some(&mut **pipeline)),
            PipelineFuture::Threaded { .. } => Ok(None),
        }
    }

    fn ready(&self) -> Option<&MaterialPipeline> {
        match self {
            PipelineFuture::Ready(pipeline) => Some(&**pipeline),
            PipelineFuture::Threaded { .. } => None,
        }
    }
}

struct AttachmentTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl AttachmentTarget {
    fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct FrameStats {
    last_update: Instant,
    frames: u32,
}

pub(crate) struct GpuState {
    context: GpuContext,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    scene: SceneUniforms,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    depth_target: AttachmentTarget,
    multisample_target: Option<AttachmentTarget>,
    pipeline: PipelineFuture,
    camera: OrbitCamera,
    background: wgpu::Color,
    stats: FrameStats,
}

impl GpuState {
    pub(crate) fn new(
        window: Arc<Window>,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
        program: ShaderProgram,
    ) -> Result<Self> {
        let context = GpuContext::new(window, initial_size, config.antialiasing)?;
        let device = &context.device;
        let layouts = PipelineLayouts::new(device);
        let scene_config = &config.scene;

        let scene = SceneUniforms::new(scene_config);
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene uniforms"),
            contents: bytemuck::bytes_of(&scene),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene bind group"),
            layout: &layouts.scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let mesh = Icosphere::new(scene_config.mesh.radius, scene_config.mesh.subdivisions);
        debug!(
            vertices = mesh.vertices.len(),
            triangles = mesh.triangle_count(),
            "built icosphere"
        );
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("icosphere vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("icosphere indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let depth_target = AttachmentTarget::new(
            device,
            "depth target",
            DEPTH_FORMAT,
            context.size,
            context.sample_count,
        );
        let multisample_target = (context.sample_count > 1).then(|| {
            AttachmentTarget::new(
                device,
                "msaa color target",
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });

        let pipeline = Self::build_pipeline_threaded(&context, layouts, program);

        let camera_config = &scene_config.camera;
        let camera = OrbitCamera::new(
            glam::Vec3::from_array(camera_config.position),
            camera_config.fov,
            camera_config.damping,
        );
        let [r, g, b] = scene_config.lights.background.to_linear();

        Ok(Self {
            index_count: mesh.indices.len() as u32,
            context,
            scene_buffer,
            scene_bind_group,
            scene,
            vertex_buffer,
            index_buffer,
            depth_target,
            multisample_target,
            pipeline,
            camera,
            background: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            stats: FrameStats {
                last_update: Instant::now(),
                frames: 0,
            },
        })
    }

    fn build_pipeline_threaded(
        context: &GpuContext,
        layouts: PipelineLayouts,
        program: ShaderProgram,
    ) -> PipelineFuture {
        let device = context.device.clone();
        let surface_format = context.surface_format;
        let sample_count = context.sample_count;
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let started = Instant::now();
            let result =
                MaterialPipeline::new(&device, &layouts, surface_format, sample_count, program);
            debug!(
                duration_ms = started.elapsed().as_millis(),
                ok = result.is_ok(),
                "material pipeline build finished"
            );
            let _ = sender.send(result);
        });

        PipelineFuture::Threaded { receiver }
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    /// Uniform table of the compiled program, or `None` while the pipeline
    /// is still building.
    pub(crate) fn material_uniforms(&mut self) -> Result<Option<&mut UniformTable>> {
        Ok(self
            .pipeline
            .poll()?
            .map(|pipeline| pipeline.program.uniforms_mut()))
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.depth_target = AttachmentTarget::new(
            &self.context.device,
            "depth target",
            DEPTH_FORMAT,
            self.context.size,
            self.context.sample_count,
        );
        self.multisample_target = (self.context.sample_count > 1).then(|| {
            AttachmentTarget::new(
                &self.context.device,
                "msaa color target",
                self.context.surface_format,
                self.context.size,
                self.context.sample_count,
            )
        });
    }

    pub(crate) fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.camera.update();
        self.scene.set_camera(&self.camera, self.context.aspect());
        let queue = &self.context.queue;
        queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&self.scene));

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(material) = self.pipeline.ready() {
                material.upload_uniforms(queue);
                render_pass.set_pipeline(&material.pipeline);
                render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
                render_pass.set_bind_group(1, &material.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.record_frame();
        Ok(())
    }

    fn record_frame(&mut self) {
        self.stats.frames += 1;
        let elapsed = self.stats.last_update.elapsed();
        if elapsed >= Duration::from_secs(5) {
            debug!(
                fps = (self.stats.frames as f32 / elapsed.as_secs_f32()).round(),
                pipeline_ready = self.pipeline.ready().is_some(),
                "render stats"
            );
            self.stats.frames = 0;
            self.stats.last_update = Instant::now();
        }
    }
}
