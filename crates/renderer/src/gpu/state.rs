use std::time::{Duration, Instant};

use animator::{FrameCommands, PointField};
use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use textures::LoadEvent;
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::types::{Antialiasing, ColorSpaceMode, ShaderCompiler};

use super::context::GpuContext;
use super::pipeline::{self, PointPipeline};
use super::textures::TextureBank;
use super::uniforms::FieldUniforms;

/// Vertices in the quad strip drawn for every point.
const QUAD_VERTICES: u32 = 4;

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
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

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }
}

/// Everything the window needs to draw the point field.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: PointPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    textures: TextureBank,
    multisample_target: Option<MultisampleTarget>,
    last_fps_update: Instant,
    frames_since_last_update: u32,
    frames_per_second: f32,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        field: &PointField,
        antialiasing: Antialiasing,
        color_space: ColorSpaceMode,
        shader_compiler: ShaderCompiler,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, antialiasing, color_space)?;

        let uniform_layout = pipeline::uniform_layout(&context.device);
        let textures = TextureBank::new(&context.device, &context.queue, context.color_space);
        let pipeline = PointPipeline::new(
            &context.device,
            &uniform_layout,
            textures.layout(),
            context.surface_format,
            context.sample_count,
            shader_compiler,
        )?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: std::mem::size_of::<FieldUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let instance_buffer = create_instance_buffer(&context.device, field);
        let multisample_target = MultisampleTarget::for_context(&context);

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            instance_count: field.len() as u32,
            textures,
            multisample_target,
            last_fps_update: Instant::now(),
            frames_since_last_update: 0,
            frames_per_second: 60.0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn is_software(&self) -> bool {
        self.context.is_software
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    /// Reapplies the surface configuration after it was lost or outdated.
    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Replaces the instance buffer with a freshly generated field.
    pub(crate) fn reload_instances(&mut self, field: &PointField) {
        self.instance_buffer = create_instance_buffer(&self.context.device, field);
        self.instance_count = field.len() as u32;
    }

    pub(crate) fn apply_texture(&mut self, event: LoadEvent) {
        self.textures
            .apply(&self.context.device, &self.context.queue, event);
    }

    /// Draws one frame and presents it.
    pub(crate) fn render(&mut self, frame: &FrameCommands) -> Result<(), wgpu::SurfaceError> {
        let acquisition_start = Instant::now();
        let surface_texture = self.context.surface.get_current_texture()?;
        let acquisition = acquisition_start.elapsed();
        let frame_budget = Duration::from_secs_f32(1.0 / self.frames_per_second.max(1.0));
        if acquisition > frame_budget {
            warn!(
                acquisition_ms = acquisition.as_millis(),
                budget_ms = frame_budget.as_millis(),
                "acquiring frame took longer than the frame budget"
            );
        }

        let now = Instant::now();
        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                clock = frame.clock,
                cycle = frame.textures.current,
                placeholders = self.textures.placeholders(),
                "render stats"
            );
        }

        let uniforms = FieldUniforms::from_frame(frame);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("point pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, self.textures.bind_group(frame.textures), &[]);
            render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            render_pass.draw(0..QUAD_VERTICES, 0..self.instance_count);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}

fn create_instance_buffer(device: &wgpu::Device, field: &PointField) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("point instances"),
        contents: field.as_bytes(),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
