//! Harbor Import - Model importers
//!
//! Loads glTF/GLB models into plain mesh, material, and texture data
//! that the renderer uploads to the GPU.

mod gltf_import;
mod types;

pub use gltf_import::import_gltf;
pub use types::{ImportResult, ImportedMaterial, ImportedMesh, ImportedTexture};
