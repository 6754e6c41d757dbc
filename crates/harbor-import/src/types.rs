//! Import result types

/// Result of importing a file
#[derive(Debug)]
pub struct ImportResult {
    /// File stem of the imported model
    pub name: String,
    /// Extracted meshes, with node transforms already applied
    pub meshes: Vec<ImportedMesh>,
    /// Extracted textures, expanded to RGBA8
    pub textures: Vec<ImportedTexture>,
    /// Extracted materials
    pub materials: Vec<ImportedMaterial>,
}

impl ImportResult {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }
}

/// An imported mesh with vertex data
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material_index: Option<usize>,
}

/// An imported texture, always RGBA8
#[derive(Debug, Clone)]
pub struct ImportedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// The subset of a glTF material the Blinn-Phong shader uses
#[derive(Debug, Clone)]
pub struct ImportedMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    /// Index into `ImportResult::textures`
    pub base_color_texture: Option<usize>,
}
