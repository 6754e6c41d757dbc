//! Harbor Render - wgpu renderer for the harbor scene
//!
//! Draws the harbor (sand, city blocks, boat, flag, airplane, water and a
//! cubemap sky) with Blinn-Phong lighting into an HDR capture target, then
//! runs the bloom and tonemapping passes in [`postprocess`].

mod camera;
mod context;
mod gpu_mesh;
mod pipeline;
pub mod postprocess;
mod primitives;
mod scene_renderer;
pub mod skybox_pipeline;
mod texture_cache;

pub use camera::{Camera, CameraMovement};
pub use context::{RenderContext, RenderError};
pub use gpu_mesh::{GpuMesh, GpuModel};
pub use pipeline::{
    DirectionalLight, LightUniforms, MaterialUniforms, PointLight, ScenePipeline,
    TransformUniforms,
};
pub use postprocess::{BloomParameters, PostProcessor, WgpuBackend, HDR_FORMAT};
pub use primitives::{create_box_mesh, create_plane_mesh, Mesh, Vertex};
pub use scene_renderer::{object_transforms, HarborScene, Placement, SceneAsset};
pub use skybox_pipeline::SkyboxPipeline;
pub use texture_cache::{GpuTexture, TextureCache};

#[cfg(test)]
mod tests {
    #[test]
    fn scene_shader_wgsl_parses() {
        let source = include_str!("scene_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("scene_shader.wgsl failed to parse");
    }

    #[test]
    fn skybox_shader_wgsl_parses() {
        let source = include_str!("skybox_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("skybox_shader.wgsl failed to parse");
    }

    #[test]
    fn blur_shader_wgsl_parses() {
        let source = include_str!("blur_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("blur_shader.wgsl failed to parse");
    }

    #[test]
    fn composite_shader_wgsl_parses() {
        let source = include_str!("composite_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("composite_shader.wgsl failed to parse");
    }
}
