//! Lit scene pipelines writing into the HDR capture target

use crate::postprocess::{DEPTH_FORMAT, HDR_FORMAT};
use crate::primitives::Vertex;
use bytemuck::{Pod, Zeroable};
use harbor_core::{mat4_identity, Mat4};

/// Shading modes understood by `scene_shader.wgsl`
pub const LIGHTING_UNLIT: u32 = 0;
pub const LIGHTING_DIRECTIONAL: u32 = 1;
pub const LIGHTING_FULL: u32 = 2;

/// Per-object transform data (bind group 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TransformUniforms {
    pub view_proj: Mat4,
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub camera_pos: [f32; 3],
    pub _pad: f32,
}

impl Default for TransformUniforms {
    fn default() -> Self {
        Self {
            view_proj: mat4_identity(),
            model: mat4_identity(),
            normal_matrix: mat4_identity(),
            camera_pos: [0.0; 3],
            _pad: 0.0,
        }
    }
}

/// Material uniform buffer data (bind group 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
    pub specular_strength: f32,
    pub shininess: f32,
    pub lighting: u32,
    pub _pad: u32,
}

impl MaterialUniforms {
    /// Model surfaces: both lights, shininess 32
    pub fn lit(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            specular_strength: 0.5,
            shininess: 32.0,
            lighting: LIGHTING_FULL,
            _pad: 0,
        }
    }

    /// Sand floor: sun only, almost matte
    pub fn ground() -> Self {
        Self {
            base_color: [1.0; 4],
            specular_strength: 0.2,
            shininess: 1.0,
            lighting: LIGHTING_DIRECTIONAL,
            _pad: 0,
        }
    }

    /// Water surface: texture color with constant translucency
    pub fn water(alpha: f32) -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, alpha],
            specular_strength: 0.0,
            shininess: 1.0,
            lighting: LIGHTING_UNLIT,
            _pad: 0,
        }
    }
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::lit([1.0; 4])
    }
}

/// A directional light (the sun)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct DirectionalLight {
    pub direction: [f32; 3],
    pub _pad0: f32,
    pub ambient: [f32; 3],
    pub _pad1: f32,
    pub diffuse: [f32; 3],
    pub _pad2: f32,
    pub specular: [f32; 3],
    pub _pad3: f32,
}

/// A point light with constant/linear/quadratic attenuation
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct PointLight {
    pub position: [f32; 3],
    pub constant: f32,
    pub ambient: [f32; 3],
    pub linear: f32,
    pub diffuse: [f32; 3],
    pub quadratic: f32,
    pub specular: [f32; 3],
    pub _pad: f32,
}

impl PointLight {
    /// Attenuation factor at `distance` from the light
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// Light uniform buffer (bind group 2)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct LightUniforms {
    pub dir_light: DirectionalLight,
    pub point_light: PointLight,
}

impl LightUniforms {
    /// The harbor lighting rig: a pale sun plus a hot orange lamp whose
    /// diffuse term exceeds 1.0 so it feeds the bloom.
    pub fn harbor() -> Self {
        Self {
            dir_light: DirectionalLight {
                direction: [-0.2, -1.0, -0.3],
                ambient: [0.4; 3],
                diffuse: [0.8; 3],
                specular: [0.2; 3],
                ..Default::default()
            },
            point_light: PointLight {
                position: [0.0, 1.0, 5.0],
                constant: 1.0,
                ambient: [0.95, 0.5, 0.0],
                linear: 0.5,
                diffuse: [4.0, 2.6, 0.4],
                quadratic: 1.1,
                specular: [0.5; 3],
                _pad: 0.0,
            },
        }
    }
}

/// Pipelines for opaque and alpha-blended scene geometry
pub struct ScenePipeline {
    pub opaque: wgpu::RenderPipeline,
    pub water: wgpu::RenderPipeline,
    pub transform_bind_group_layout: wgpu::BindGroupLayout,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
    pub light_bind_group_layout: wgpu::BindGroupLayout,
}

pub(crate) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl ScenePipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene_shader.wgsl").into()),
        });

        // Bind group 0: Transform uniforms (vertex + fragment)
        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                )],
                label: Some("Transform Bind Group Layout"),
            });

        // Bind group 1: Material uniforms + base color texture
        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("Material Bind Group Layout"),
            });

        // Bind group 2: Light uniforms
        let light_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
                label: Some("Light Bind Group Layout"),
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                &transform_bind_group_layout,
                &material_bind_group_layout,
                &light_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let build = |label: &str, blend: Option<wgpu::BlendState>, depth_write: bool| {
            // Both HDR attachments receive the same shaded color
            let target = Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[target.clone(), target],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let opaque = build("Scene Opaque Pipeline", None, true);
        let water = build(
            "Scene Water Pipeline",
            Some(wgpu::BlendState::ALPHA_BLENDING),
            false,
        );

        Self {
            opaque,
            water,
            transform_bind_group_layout,
            material_bind_group_layout,
            light_bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<TransformUniforms>(), 208);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 32);
        assert_eq!(std::mem::size_of::<DirectionalLight>(), 64);
        assert_eq!(std::mem::size_of::<PointLight>(), 64);
        assert_eq!(std::mem::size_of::<LightUniforms>(), 128);
    }

    #[test]
    fn test_point_light_is_hdr() {
        let lights = LightUniforms::harbor();
        assert!(lights.point_light.diffuse[0] > 1.0);
        assert_eq!(lights.point_light.position, [0.0, 1.0, 5.0]);
        assert_eq!(lights.dir_light.direction, [-0.2, -1.0, -0.3]);
    }

    #[test]
    fn test_attenuation() {
        let light = LightUniforms::harbor().point_light;
        assert_eq!(light.attenuation(0.0), 1.0);
        let at_one = light.attenuation(1.0);
        assert!((at_one - 1.0 / 2.6).abs() < 1e-6);
    }

    #[test]
    fn test_material_presets() {
        assert_eq!(MaterialUniforms::lit([1.0; 4]).lighting, LIGHTING_FULL);
        assert_eq!(MaterialUniforms::ground().lighting, LIGHTING_DIRECTIONAL);
        let water = MaterialUniforms::water(0.6);
        assert_eq!(water.lighting, LIGHTING_UNLIT);
        assert_eq!(water.base_color[3], 0.6);
    }
}
