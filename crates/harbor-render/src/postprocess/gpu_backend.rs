//! wgpu implementation of the post-processing backend

use super::backend::{GraphicsBackend, Program, TargetDesc, UniformValue};
use super::quad::{QuadVertex, QUAD_VERTICES};
use super::target::{DEPTH_FORMAT, HDR_FORMAT};
use crate::context::{RenderContext, RenderError};
use crate::pipeline::uniform_entry;
use bytemuck::{Pod, Zeroable};
use harbor_core::Color;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Uniform block of `blur_shader.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
struct BlurUniforms {
    horizontal: u32,
    _pad: [u32; 3],
}

/// Uniform block of `composite_shader.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct CompositeUniforms {
    bloom: u32,
    exposure: f32,
    _pad: [f32; 2],
}

impl Default for CompositeUniforms {
    fn default() -> Self {
        Self {
            bloom: 1,
            exposure: 1.0,
            _pad: [0.0; 2],
        }
    }
}

/// Attachments of one offscreen target. Dropping the last handle frees them.
pub struct TargetTextures {
    colors: Vec<(wgpu::Texture, wgpu::TextureView)>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

pub struct WgpuTarget {
    inner: Arc<TargetTextures>,
}

pub struct WgpuQuad {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

enum Destination {
    Surface,
    Offscreen(Arc<TargetTextures>),
}

/// A quad-drawing program with its uniform buffer and texture layout
struct QuadProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bgl: wgpu::BindGroupLayout,
    texture_slots: u32,
}

impl QuadProgram {
    fn new(
        device: &wgpu::Device,
        name: &str,
        source: &str,
        fs_entry: &str,
        texture_slots: u32,
        uniform_size: usize,
        format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Shader", name)),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        // Group 0: program uniforms
        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Uniform BGL", name)),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });

        // Group 1: one texture per sampler slot, then the shared sampler
        let mut texture_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..texture_slots)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_slots,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Texture BGL", name)),
            entries: &texture_entries,
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", name)),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", name)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_quad"),
                buffers: &[QuadVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(fs_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniform Buffer", name)),
            size: uniform_size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Uniform Bind Group", name)),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bgl,
            texture_slots,
        }
    }
}

/// Texture slots the composite program samples; blur uses the first one
const MAX_TEXTURE_SLOTS: usize = 2;

/// Issues post-processing work through wgpu.
///
/// Every `clear` and `draw_quad` is encoded and submitted on its own, so
/// the uniform values written before a draw are the ones it sees.
pub struct WgpuBackend {
    context: RenderContext,
    blur: QuadProgram,
    composite: QuadProgram,
    sampler: wgpu::Sampler,
    blur_uniforms: BlurUniforms,
    composite_uniforms: CompositeUniforms,
    frame: Option<(wgpu::SurfaceTexture, wgpu::TextureView)>,
    destination: Destination,
    program: Option<Program>,
    textures: [Option<(Arc<TargetTextures>, usize)>; MAX_TEXTURE_SLOTS],
}

impl WgpuBackend {
    pub fn new(context: RenderContext) -> Self {
        let device = &context.device;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Linear Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let blur = QuadProgram::new(
            device,
            "Blur",
            include_str!("../blur_shader.wgsl"),
            "fs_blur",
            1,
            std::mem::size_of::<BlurUniforms>(),
            HDR_FORMAT,
        );
        let composite = QuadProgram::new(
            device,
            "Composite",
            include_str!("../composite_shader.wgsl"),
            "fs_composite",
            2,
            std::mem::size_of::<CompositeUniforms>(),
            context.surface_format(),
        );

        tracing::debug!(surface_format = ?context.surface_format(), "post-processing programs built");

        Self {
            context,
            blur,
            composite,
            sampler,
            blur_uniforms: BlurUniforms::default(),
            composite_uniforms: CompositeUniforms::default(),
            frame: None,
            destination: Destination::Surface,
            program: None,
            textures: [None, None],
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    /// Reconfigure the surface. Offscreen targets keep their size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context
            .resize(winit::dpi::PhysicalSize::new(width, height));
    }

    /// Acquire the next surface texture. Returns `false` when the frame
    /// should be skipped.
    pub fn begin_frame(&mut self) -> Result<bool, RenderError> {
        match self.context.surface.get_current_texture() {
            Ok(frame) => {
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frame = Some((frame, view));
                Ok(true)
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                Ok(false)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface texture acquisition timed out");
                Ok(false)
            }
            Err(e) => Err(RenderError::SurfaceError(e.to_string())),
        }
    }

    /// Present the frame and forget all bindings
    pub fn end_frame(&mut self) {
        self.reset_bindings();
        if let Some((frame, view)) = self.frame.take() {
            drop(view);
            frame.present();
        }
    }

    /// Drop the acquired frame without presenting it
    pub fn discard_frame(&mut self) {
        self.reset_bindings();
        self.frame = None;
    }

    fn reset_bindings(&mut self) {
        self.textures = [None, None];
        self.destination = Destination::Surface;
        self.program = None;
    }

    /// Record custom drawing into the bound destination, keeping its
    /// current contents. Used by the scene during capture.
    pub fn with_bound_pass<F>(&mut self, label: &str, draw: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut wgpu::RenderPass<'_>),
    {
        let (colors, depth) = self.destination_views()?;
        let color_attachments: Vec<_> = colors
            .into_iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();
        let depth_stencil_attachment = depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            draw(&mut pass);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn destination_views(
        &self,
    ) -> Result<(Vec<&wgpu::TextureView>, Option<&wgpu::TextureView>), RenderError> {
        match &self.destination {
            Destination::Surface => {
                let (_, view) = self.frame.as_ref().ok_or(RenderError::NoSurfaceFrame)?;
                Ok((vec![view], None))
            }
            Destination::Offscreen(target) => Ok((
                target.colors.iter().map(|(_, view)| view).collect(),
                target.depth.as_ref().map(|(_, view)| view),
            )),
        }
    }

    fn create_attachment(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

/// Store a named uniform for `program`. Names and value types are fixed
/// per program.
fn apply_uniform(
    program: Program,
    name: &str,
    value: UniformValue,
    blur: &mut BlurUniforms,
    composite: &mut CompositeUniforms,
) -> Result<(), RenderError> {
    match (program, name, value) {
        (Program::Blur, "horizontal", UniformValue::Bool(b)) => blur.horizontal = b as u32,
        (Program::Blur, "horizontal", UniformValue::Int(i)) => blur.horizontal = (i != 0) as u32,
        (Program::Composite, "bloom", UniformValue::Bool(b)) => composite.bloom = b as u32,
        (Program::Composite, "bloom", UniformValue::Int(i)) => composite.bloom = (i != 0) as u32,
        (Program::Composite, "exposure", UniformValue::Float(f)) => composite.exposure = f,
        _ => {
            return Err(RenderError::UnknownUniform {
                name: format!("{}: {}", name, value.type_name()),
                program: program.to_string(),
            })
        }
    }
    Ok(())
}

impl GraphicsBackend for WgpuBackend {
    type Target = WgpuTarget;
    type Quad = WgpuQuad;

    fn create_target(&mut self, desc: &TargetDesc) -> Result<WgpuTarget, RenderError> {
        let max = self.context.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(RenderError::allocation(
                &desc.label,
                format!("size {}x{} outside 1..={}", desc.width, desc.height, max),
            ));
        }

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let colors = (0..desc.color_attachments)
            .map(|i| {
                self.create_attachment(
                    &format!("{} Color {}", desc.label, i),
                    desc.width,
                    desc.height,
                    HDR_FORMAT,
                    wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                )
            })
            .collect();
        let depth = desc.depth.then(|| {
            self.create_attachment(
                &format!("{} Depth", desc.label),
                desc.width,
                desc.height,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
        });

        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            return Err(RenderError::allocation(&desc.label, err.to_string()));
        }

        Ok(WgpuTarget {
            inner: Arc::new(TargetTextures { colors, depth }),
        })
    }

    fn attachment_size(&self, target: &WgpuTarget, attachment: usize) -> Option<(u32, u32)> {
        target
            .inner
            .colors
            .get(attachment)
            .map(|(texture, _)| (texture.width(), texture.height()))
    }

    fn bind_target(&mut self, target: Option<&WgpuTarget>) -> Result<(), RenderError> {
        self.destination = match target {
            Some(target) => Destination::Offscreen(Arc::clone(&target.inner)),
            None => Destination::Surface,
        };
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<(), RenderError> {
        let clear = wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        };
        let (colors, depth) = self.destination_views()?;
        let color_attachments: Vec<_> = colors
            .into_iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();
        let depth_stencil_attachment = depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Clear Encoder"),
                });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn use_program(&mut self, program: Program) -> Result<(), RenderError> {
        self.program = Some(program);
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        let program = self.program.ok_or(RenderError::NoProgram)?;
        apply_uniform(
            program,
            name,
            value,
            &mut self.blur_uniforms,
            &mut self.composite_uniforms,
        )
    }

    fn bind_texture(
        &mut self,
        slot: u32,
        target: &WgpuTarget,
        attachment: usize,
    ) -> Result<(), RenderError> {
        let entry = self
            .textures
            .get_mut(slot as usize)
            .ok_or_else(|| RenderError::MissingBinding(format!("no texture slot {}", slot)))?;
        if attachment >= target.inner.colors.len() {
            return Err(RenderError::MissingBinding(format!(
                "color attachment {} (target has {})",
                attachment,
                target.inner.colors.len()
            )));
        }
        *entry = Some((Arc::clone(&target.inner), attachment));
        Ok(())
    }

    fn create_quad(&mut self) -> Result<WgpuQuad, RenderError> {
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Full-Screen Quad"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(WgpuQuad {
            buffer,
            vertex_count: QUAD_VERTICES.len() as u32,
        })
    }

    fn draw_quad(&mut self, quad: &WgpuQuad) -> Result<(), RenderError> {
        let program = self.program.ok_or(RenderError::NoProgram)?;
        let (quad_program, uniform_bytes) = match program {
            Program::Blur => (&self.blur, bytemuck::bytes_of(&self.blur_uniforms)),
            Program::Composite => (&self.composite, bytemuck::bytes_of(&self.composite_uniforms)),
        };

        // Blur renders into one HDR attachment, composite onto the surface
        match (program, &self.destination) {
            (Program::Blur, Destination::Offscreen(target)) if target.colors.len() == 1 => {}
            (Program::Composite, Destination::Surface) => {}
            _ => {
                return Err(RenderError::MissingBinding(format!(
                    "{} program cannot draw into the bound destination",
                    program
                )))
            }
        }

        let mut entries = Vec::with_capacity(quad_program.texture_slots as usize + 1);
        for slot in 0..quad_program.texture_slots {
            let (target, attachment) = self.textures[slot as usize].as_ref().ok_or_else(|| {
                RenderError::MissingBinding(format!("texture slot {} for {}", slot, program))
            })?;
            entries.push(wgpu::BindGroupEntry {
                binding: slot,
                resource: wgpu::BindingResource::TextureView(&target.colors[*attachment].1),
            });
        }
        entries.push(wgpu::BindGroupEntry {
            binding: quad_program.texture_slots,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });

        let device = &self.context.device;
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Post Texture Bind Group"),
            layout: &quad_program.texture_bgl,
            entries: &entries,
        });
        self.context
            .queue
            .write_buffer(&quad_program.uniform_buffer, 0, uniform_bytes);

        let (colors, _) = self.destination_views()?;
        let color_attachments: Vec<_> = colors
            .into_iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Post Quad Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(match program {
                    Program::Blur => "Blur Pass",
                    Program::Composite => "Composite Pass",
                }),
                color_attachments: &color_attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&quad_program.pipeline);
            pass.set_bind_group(0, &quad_program.uniform_bind_group, &[]);
            pass.set_bind_group(1, &texture_bind_group, &[]);
            pass.set_vertex_buffer(0, quad.buffer.slice(..));
            pass.draw(0..quad.vertex_count, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
