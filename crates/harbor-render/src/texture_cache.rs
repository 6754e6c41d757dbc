//! GPU textures loaded from disk or imported models, with fallbacks
//!
//! Missing or unreadable images never abort a frame: they are logged and
//! replaced by a 1x1 texture so every sampler slot stays bound.

use crate::context::RenderError;
use harbor_import::ImportedTexture;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use wgpu::util::DeviceExt;

/// Cubemap faces in layer order (+X, -X, +Y, -Y, +Z, -Z)
pub const CUBEMAP_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// A GPU-resident texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Decoded RGBA8 pixels ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: color.to_vec(),
        }
    }

    /// Decode an image file from disk
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let img = image::open(path).map_err(|e| RenderError::AssetLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

/// Load six cubemap faces from `dir/<face>.png`. All faces must share one size.
pub fn load_cubemap_faces(dir: &Path) -> Result<Vec<RgbaImage>, RenderError> {
    let faces = CUBEMAP_FACES
        .iter()
        .map(|face| RgbaImage::load(&dir.join(format!("{}.png", face))))
        .collect::<Result<Vec<_>, _>>()?;

    let (w, h) = (faces[0].width, faces[0].height);
    if w != h || faces.iter().any(|f| f.width != w || f.height != h) {
        return Err(RenderError::AssetLoad {
            path: dir.display().to_string(),
            reason: "cubemap faces must be square and equally sized".into(),
        });
    }
    Ok(faces)
}

/// Cache of GPU textures, keyed by name, with built-in defaults
pub struct TextureCache {
    textures: HashMap<String, GpuTexture>,
    /// 1x1 white texture (default base color)
    pub default_white: GpuTexture,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let default_white = upload_2d(
            device,
            queue,
            "Default White",
            &RgbaImage::solid([255, 255, 255, 255]),
        );
        Self {
            textures: HashMap::new(),
            default_white,
        }
    }

    /// Load an image file under `name`. A file that cannot be read is logged
    /// and replaced with `fallback`; the texture is cached either way.
    pub fn load_file_or(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        path: &Path,
        fallback: [u8; 4],
    ) -> &GpuTexture {
        if !self.textures.contains_key(name) {
            let image = RgbaImage::load(path).unwrap_or_else(|err| {
                tracing::warn!(texture = name, error = %err, "using fallback texture");
                RgbaImage::solid(fallback)
            });
            self.textures
                .insert(name.to_string(), upload_2d(device, queue, name, &image));
        }
        &self.textures[name]
    }

    /// Upload a texture that came out of a glTF import
    pub fn upload_imported(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        imported: &ImportedTexture,
    ) -> &GpuTexture {
        if !self.textures.contains_key(name) {
            let image = RgbaImage {
                width: imported.width,
                height: imported.height,
                pixels: imported.rgba.clone(),
            };
            self.textures
                .insert(name.to_string(), upload_2d(device, queue, name, &image));
        }
        &self.textures[name]
    }

    /// Get a texture by name, returning None if not found
    pub fn get(&self, name: &str) -> Option<&GpuTexture> {
        self.textures.get(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn upload_2d(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &RgbaImage,
) -> GpuTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &image.pixels,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{} Sampler", label)),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        sampler,
    }
}

/// Upload a cubemap from `dir`, falling back to a flat sky color when any
/// face is missing or mis-sized.
pub fn load_cubemap_or(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    dir: &Path,
    fallback: [u8; 4],
) -> GpuTexture {
    let faces = load_cubemap_faces(dir).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "using fallback skybox");
        vec![RgbaImage::solid(fallback); 6]
    });
    let size = faces[0].width;
    let data: Vec<u8> = faces.iter().flat_map(|f| f.pixels.iter().copied()).collect();

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("Skybox Cubemap"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &data,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Skybox Cubemap View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Skybox Sampler"),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        sampler,
    }
}

/// Resolve `<resources>/textures/<file>`
pub fn texture_path(resources: &Path, file: &str) -> PathBuf {
    resources.join("textures").join(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_is_asset_error() {
        let err = RgbaImage::load(Path::new("no/such/texture.png")).unwrap_err();
        assert!(matches!(err, RenderError::AssetLoad { .. }));
    }

    #[test]
    fn test_missing_cubemap_dir_is_asset_error() {
        assert!(load_cubemap_faces(Path::new("no/such/skybox")).is_err());
    }

    #[test]
    fn test_solid_image() {
        let img = RgbaImage::solid([1, 2, 3, 4]);
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_cubemap_faces_order() {
        assert_eq!(CUBEMAP_FACES, ["px", "nx", "py", "ny", "pz", "nz"]);
        let path = texture_path(Path::new("resources"), "skybox");
        assert_eq!(path, Path::new("resources/textures/skybox"));
    }
}
