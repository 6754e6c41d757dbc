//! The harbor scene: fixed object placements drawn into the capture target

use crate::camera::Camera;
use crate::context::RenderError;
use crate::gpu_mesh::GpuModel;
use crate::pipeline::{LightUniforms, MaterialUniforms, ScenePipeline, TransformUniforms};
use crate::postprocess::{Drawable, WgpuBackend};
use crate::primitives::{create_box_mesh, create_plane_mesh};
use crate::skybox_pipeline::{SkyboxPipeline, SkyboxUniforms};
use crate::texture_cache::{load_cubemap_or, texture_path, GpuTexture, TextureCache};
use harbor_core::{mat4_identity, mat4_mul, normal_matrix, strip_translation, Mat4, ModelMatrix, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use wgpu::util::DeviceExt;

const SAND_TEXTURE: &str = "sand_texture1.jpg";
const WATER_TEXTURE: &str = "water_texture3.png";
const WATER_ALPHA: f32 = 0.75;

/// Side length of the sand and water planes
const PLANE_SIZE: f32 = 100.0;
const PLANE_UV_REPEAT: f32 = 10.0;
/// Height of the plane geometry before placement
const PLANE_Y: f32 = -1.0;

/// City block instances as (z, height scale)
const CITY_BLOCKS: [(f32, f32); 5] = [(-5.0, 0.5), (-3.0, 0.7), (-1.0, 1.0), (1.0, 1.3), (3.0, 1.0)];

/// Assets the scene places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneAsset {
    Sand,
    City,
    Boat,
    Flag,
    Airplane,
    Water,
}

impl SceneAsset {
    /// glTF file under `<resources>/objects`, for model assets
    pub fn model_file(&self) -> Option<&'static str> {
        match self {
            SceneAsset::City => Some("building_06/scene.gltf"),
            SceneAsset::Boat => Some("victorian_row_boat/scene.gltf"),
            SceneAsset::Flag => Some("red_flag/scene.gltf"),
            SceneAsset::Airplane => Some("airplane_crj-900_cityjet/scene.gltf"),
            SceneAsset::Sand | SceneAsset::Water => None,
        }
    }

    /// Color of the box drawn when the model cannot be loaded
    fn fallback_color(&self) -> [f32; 4] {
        match self {
            SceneAsset::City => [0.6, 0.6, 0.65, 1.0],
            SceneAsset::Boat => [0.45, 0.3, 0.15, 1.0],
            SceneAsset::Flag => [0.8, 0.1, 0.1, 1.0],
            SceneAsset::Airplane => [0.9, 0.9, 0.9, 1.0],
            SceneAsset::Sand => [0.76, 0.7, 0.5, 1.0],
            SceneAsset::Water => [0.1, 0.3, 0.6, 1.0],
        }
    }
}

/// One object instance for a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub asset: SceneAsset,
    pub model: Mat4,
}

/// Object placements at `time` seconds, in draw order. The water plane is
/// last so it blends over everything beneath it.
pub fn object_transforms(time: f32) -> Vec<Placement> {
    let mut placements = Vec::with_capacity(11);
    let place = |asset, model: ModelMatrix| Placement {
        asset,
        model: model.build(),
    };

    placements.push(place(
        SceneAsset::Sand,
        ModelMatrix::new().translate(Vec3::new(0.0, -5.0, 0.0)),
    ));

    for (z, height) in CITY_BLOCKS {
        placements.push(place(
            SceneAsset::City,
            ModelMatrix::new()
                .translate(Vec3::new(0.0, 1.0, z))
                .scale(Vec3::new(1.0, height, 1.0))
                .rotate_deg(90.0, Vec3::UP),
        ));
    }

    placements.push(place(
        SceneAsset::Boat,
        ModelMatrix::new()
            .translate(Vec3::new(0.0, 0.0, -0.5))
            .uniform_scale(6.0),
    ));

    // The flag model stands upright after this chain; the pole reuses it
    let flag_orientation = |m: ModelMatrix| {
        m.rotate_deg(180.0, Vec3::UP)
            .rotate_deg(-90.0, Vec3::new(1.0, 0.0, 0.0))
            .rotate_deg(90.0, Vec3::new(0.0, 0.0, 1.0))
    };
    placements.push(place(
        SceneAsset::Flag,
        flag_orientation(
            ModelMatrix::new()
                .translate(Vec3::new(0.0, 7.0, 1.0))
                .scale(Vec3::new(1.5, 1.0, 1.5)),
        ),
    ));
    placements.push(place(
        SceneAsset::Flag,
        flag_orientation(
            ModelMatrix::new()
                .translate(Vec3::new(0.0, -1.2, 1.0))
                .uniform_scale(3.0),
        ),
    ));

    placements.push(place(
        SceneAsset::Airplane,
        ModelMatrix::new()
            .translate(Vec3::new(5.0 * time.cos(), 5.0, 5.0 * time.sin()))
            .rotate_rad(time, Vec3::new(0.0, -1.0, 0.0))
            .rotate_deg(180.0, Vec3::UP)
            .rotate_deg(180.0, Vec3::new(0.0, 0.0, 1.0))
            .rotate_deg(90.0, Vec3::new(1.0, 0.0, 0.0)),
    ));

    placements.push(place(
        SceneAsset::Water,
        ModelMatrix::new().translate(Vec3::new(0.0, -0.5, 0.0)),
    ));

    placements
}

/// Skybox matrix: projection times the view with its translation removed
pub fn sky_view_projection(camera: &Camera) -> Mat4 {
    mat4_mul(
        &camera.projection_matrix(),
        &strip_translation(&camera.view_matrix()),
    )
}

struct ObjectSlot {
    asset: SceneAsset,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
}

/// Draws the fixed harbor scene into whichever target the backend has bound
pub struct HarborScene {
    pipeline: ScenePipeline,
    skybox: SkyboxPipeline,
    models: HashMap<SceneAsset, GpuModel>,
    slots: Vec<ObjectSlot>,
    light_bind_group: wgpu::BindGroup,
    sky_uniform_buffer: wgpu::Buffer,
    sky_uniform_bind_group: wgpu::BindGroup,
    sky_texture_bind_group: wgpu::BindGroup,
    view_proj: Mat4,
    sky_view_proj: Mat4,
    camera_pos: Vec3,
    time: f32,
}

impl HarborScene {
    /// Build pipelines and load every asset from `resources`. Missing
    /// assets are logged and replaced, so this never fails.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, resources: &Path) -> Self {
        let pipeline = ScenePipeline::new(device);
        let skybox = SkyboxPipeline::new(device);
        let mut textures = TextureCache::new(device, queue);

        let mut models = HashMap::new();
        for asset in [
            SceneAsset::City,
            SceneAsset::Boat,
            SceneAsset::Flag,
            SceneAsset::Airplane,
        ] {
            let model = load_model(device, queue, &pipeline, &mut textures, resources, asset);
            models.insert(asset, model);
        }

        let plane = create_plane_mesh(PLANE_SIZE, PLANE_Y, PLANE_UV_REPEAT, [1.0; 4]);
        let sand_texture = textures.load_file_or(
            device,
            queue,
            "sand",
            &texture_path(resources, SAND_TEXTURE),
            [194, 178, 128, 255],
        );
        let sand = GpuModel::from_mesh(
            device,
            &pipeline,
            "Sand",
            &plane,
            &MaterialUniforms::ground(),
            sand_texture,
        );
        models.insert(SceneAsset::Sand, sand);

        let water_texture = textures.load_file_or(
            device,
            queue,
            "water",
            &texture_path(resources, WATER_TEXTURE),
            [40, 90, 160, 255],
        );
        let water = GpuModel::from_mesh(
            device,
            &pipeline,
            "Water",
            &plane,
            &MaterialUniforms::water(WATER_ALPHA),
            water_texture,
        );
        models.insert(SceneAsset::Water, water);

        let slots = object_transforms(0.0)
            .iter()
            .enumerate()
            .map(|(i, placement)| {
                let transform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Object {} Transform Buffer", i)),
                    size: std::mem::size_of::<TransformUniforms>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("Object {} Transform Bind Group", i)),
                    layout: &pipeline.transform_bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: transform_buffer.as_entire_binding(),
                    }],
                });
                ObjectSlot {
                    asset: placement.asset,
                    transform_buffer,
                    transform_bind_group,
                }
            })
            .collect();

        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::bytes_of(&LightUniforms::harbor()),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Light Bind Group"),
            layout: &pipeline.light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let sky_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Skybox Uniform Buffer"),
            size: std::mem::size_of::<SkyboxUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sky_uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Uniform Bind Group"),
            layout: &skybox.uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: sky_uniform_buffer.as_entire_binding(),
            }],
        });
        let cubemap = load_cubemap_or(
            device,
            queue,
            &texture_path(resources, "skybox"),
            [120, 160, 210, 255],
        );
        let sky_texture_bind_group = cubemap_bind_group(device, &skybox, &cubemap);

        tracing::info!(
            resources = %resources.display(),
            models = models.len(),
            textures = textures.len(),
            "harbor scene loaded"
        );

        Self {
            pipeline,
            skybox,
            models,
            slots,
            light_bind_group,
            sky_uniform_buffer,
            sky_uniform_bind_group,
            sky_texture_bind_group,
            view_proj: mat4_identity(),
            sky_view_proj: mat4_identity(),
            camera_pos: Vec3::ZERO,
            time: 0.0,
        }
    }

    /// Take this frame's camera and animation time
    pub fn update(&mut self, camera: &Camera, time: f32) {
        self.view_proj = camera.view_projection_matrix();
        self.sky_view_proj = sky_view_projection(camera);
        self.camera_pos = camera.position;
        self.time = time;
    }

    fn write_uniforms(&self, queue: &wgpu::Queue) {
        for (slot, placement) in self.slots.iter().zip(object_transforms(self.time)) {
            let uniforms = TransformUniforms {
                view_proj: self.view_proj,
                model: placement.model,
                normal_matrix: normal_matrix(&placement.model),
                camera_pos: self.camera_pos.to_array(),
                _pad: 0.0,
            };
            queue.write_buffer(&slot.transform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }
        queue.write_buffer(
            &self.sky_uniform_buffer,
            0,
            bytemuck::bytes_of(&SkyboxUniforms {
                view_proj: self.sky_view_proj,
            }),
        );
    }

    fn record(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline.opaque);
        pass.set_bind_group(2, &self.light_bind_group, &[]);
        for slot in &self.slots {
            if slot.asset == SceneAsset::Water {
                pass.set_pipeline(&self.pipeline.water);
            }
            if let Some(model) = self.models.get(&slot.asset) {
                pass.set_bind_group(0, &slot.transform_bind_group, &[]);
                model.draw(pass);
            }
        }

        pass.set_pipeline(&self.skybox.pipeline);
        pass.set_bind_group(0, &self.sky_uniform_bind_group, &[]);
        pass.set_bind_group(1, &self.sky_texture_bind_group, &[]);
        pass.set_vertex_buffer(0, self.skybox.cube_buffer.slice(..));
        pass.draw(0..self.skybox.cube_vertex_count, 0..1);
    }
}

impl Drawable<WgpuBackend> for HarborScene {
    fn draw(&mut self, backend: &mut WgpuBackend) -> Result<(), RenderError> {
        self.write_uniforms(backend.queue());
        backend.with_bound_pass("Harbor Scene Pass", |pass| self.record(pass))
    }
}

fn load_model(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &ScenePipeline,
    textures: &mut TextureCache,
    resources: &Path,
    asset: SceneAsset,
) -> GpuModel {
    let path = model_path(resources, asset);
    match path.as_deref().map(harbor_import::import_gltf) {
        Some(Ok(import)) => GpuModel::from_import(device, queue, pipeline, textures, &import),
        Some(Err(err)) => {
            tracing::warn!(asset = ?asset, error = %err, "model failed to load, drawing a box");
            fallback_box(device, pipeline, &textures.default_white, asset)
        }
        None => fallback_box(device, pipeline, &textures.default_white, asset),
    }
}

fn model_path(resources: &Path, asset: SceneAsset) -> Option<PathBuf> {
    asset
        .model_file()
        .map(|file| resources.join("objects").join(file))
}

fn fallback_box(
    device: &wgpu::Device,
    pipeline: &ScenePipeline,
    white: &GpuTexture,
    asset: SceneAsset,
) -> GpuModel {
    let color = asset.fallback_color();
    let mesh = create_box_mesh(1.0, 1.0, 1.0, color);
    GpuModel::from_mesh(
        device,
        pipeline,
        &format!("{:?} Fallback", asset),
        &mesh,
        &MaterialUniforms::lit([1.0; 4]),
        white,
    )
}

fn cubemap_bind_group(
    device: &wgpu::Device,
    skybox: &SkyboxPipeline,
    cubemap: &GpuTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Skybox Texture Bind Group"),
        layout: &skybox.texture_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&cubemap.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&cubemap.sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_core::mat4_transform_point;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_draw_order() {
        let assets: Vec<_> = object_transforms(0.0).iter().map(|p| p.asset).collect();
        assert_eq!(assets.len(), 11);
        assert_eq!(assets[0], SceneAsset::Sand);
        assert!(assets[1..6].iter().all(|a| *a == SceneAsset::City));
        assert_eq!(assets[6], SceneAsset::Boat);
        assert_eq!(&assets[7..9], &[SceneAsset::Flag, SceneAsset::Flag]);
        assert_eq!(assets[9], SceneAsset::Airplane);
        assert_eq!(assets[10], SceneAsset::Water);
    }

    #[test]
    fn test_planes_heights() {
        let placements = object_transforms(0.0);
        let on_plane = Vec3::new(10.0, PLANE_Y, -20.0);
        let sand = mat4_transform_point(&placements[0].model, on_plane);
        let water = mat4_transform_point(&placements[10].model, on_plane);
        assert!(approx(sand, Vec3::new(10.0, -6.0, -20.0)));
        assert!(approx(water, Vec3::new(10.0, -1.5, -20.0)));
    }

    #[test]
    fn test_city_blocks_scaled_vertically() {
        let placements = object_transforms(0.0);
        for (i, (z, height)) in CITY_BLOCKS.iter().enumerate() {
            let model = &placements[1 + i].model;
            assert!(approx(
                mat4_transform_point(model, Vec3::ZERO),
                Vec3::new(0.0, 1.0, *z)
            ));
            let top = mat4_transform_point(model, Vec3::UP);
            assert!(approx(top, Vec3::new(0.0, 1.0 + height, *z)));
        }
    }

    #[test]
    fn test_airplane_circles() {
        let origin_at = |t: f32| mat4_transform_point(&object_transforms(t)[9].model, Vec3::ZERO);
        assert!(approx(origin_at(0.0), Vec3::new(5.0, 5.0, 0.0)));
        assert!(approx(origin_at(FRAC_PI_2), Vec3::new(0.0, 5.0, 5.0)));
    }

    #[test]
    fn test_only_models_have_files() {
        assert!(SceneAsset::Sand.model_file().is_none());
        assert!(SceneAsset::Water.model_file().is_none());
        let city = model_path(Path::new("res"), SceneAsset::City).unwrap();
        assert_eq!(city, Path::new("res/objects/building_06/scene.gltf"));
    }

    #[test]
    fn test_sky_ignores_camera_position() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 3.0));
        let before = sky_view_projection(&camera);
        camera.position = Vec3::new(40.0, -3.0, 12.0);
        assert_eq!(sky_view_projection(&camera), before);
    }
}
