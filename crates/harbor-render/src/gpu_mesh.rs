//! GPU-resident meshes with their material bind groups

use crate::pipeline::{MaterialUniforms, ScenePipeline};
use crate::primitives::{Mesh, Vertex};
use crate::texture_cache::{GpuTexture, TextureCache};
use harbor_import::{ImportResult, ImportedMesh};
use wgpu::util::DeviceExt;

/// One drawable primitive
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub material_bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    fn upload(
        device: &wgpu::Device,
        pipeline: &ScenePipeline,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
        material: &MaterialUniforms,
        texture: &GpuTexture,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", label)),
            contents: bytemuck::bytes_of(material),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Material Bind Group", label)),
            layout: &pipeline.material_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            material_bind_group,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.material_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// All primitives of one model
pub struct GpuModel {
    pub name: String,
    pub meshes: Vec<GpuMesh>,
}

impl GpuModel {
    /// Upload an imported glTF model. Materials without a texture sample
    /// the shared white texture.
    pub fn from_import(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &ScenePipeline,
        textures: &mut TextureCache,
        import: &ImportResult,
    ) -> Self {
        let meshes = import
            .meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                let material = mesh
                    .material_index
                    .and_then(|m| import.materials.get(m));
                let base_color = material.map(|m| m.base_color).unwrap_or([1.0; 4]);
                let image = material
                    .and_then(|m| m.base_color_texture)
                    .and_then(|t| import.textures.get(t).map(|tex| (t, tex)));

                let texture = match image {
                    Some((t, tex)) => textures.upload_imported(
                        device,
                        queue,
                        &format!("{}#{}", import.name, t),
                        tex,
                    ),
                    None => &textures.default_white,
                };

                let vertices = imported_vertices(mesh);
                GpuMesh::upload(
                    device,
                    pipeline,
                    &format!("{}/{}", import.name, i),
                    &vertices,
                    &mesh.indices,
                    &MaterialUniforms::lit(base_color),
                    texture,
                )
            })
            .collect();

        tracing::debug!(
            model = %import.name,
            meshes = import.meshes.len(),
            vertices = import.vertex_count(),
            "uploaded model"
        );

        Self {
            name: import.name.clone(),
            meshes,
        }
    }

    /// Upload a procedural mesh with a fixed material and texture
    pub fn from_mesh(
        device: &wgpu::Device,
        pipeline: &ScenePipeline,
        name: &str,
        mesh: &Mesh,
        material: &MaterialUniforms,
        texture: &GpuTexture,
    ) -> Self {
        Self {
            name: name.to_string(),
            meshes: vec![GpuMesh::upload(
                device,
                pipeline,
                name,
                &mesh.vertices,
                &mesh.indices,
                material,
                texture,
            )],
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        for mesh in &self.meshes {
            mesh.draw(pass);
        }
    }
}

/// Interleave an imported mesh into scene vertices. Missing normals point
/// up and missing UVs are zero. Vertex colour stays white; the material's
/// base colour factor is applied by the material uniform alone.
pub fn imported_vertices(mesh: &ImportedMesh) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            color: [1.0; 4],
            uv: mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> ImportedMesh {
        ImportedMesh {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
            material_index: None,
        }
    }

    #[test]
    fn test_vertices_interleaved() {
        let verts = imported_vertices(&triangle());
        assert_eq!(verts.len(), 3);
        assert_eq!(verts[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(verts[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(verts[2].uv, [0.0, 1.0]);
        assert_eq!(verts[0].color, [1.0; 4]);
    }

    #[test]
    fn test_base_color_factor_applied_once() {
        // The shader multiplies material base colour by vertex colour
        let base_color = [0.5, 0.25, 0.75, 0.5];
        let material = MaterialUniforms::lit(base_color);
        for vertex in imported_vertices(&triangle()) {
            let albedo: Vec<f32> = (0..4)
                .map(|c| material.base_color[c] * vertex.color[c])
                .collect();
            assert_eq!(albedo, base_color.to_vec());
        }
    }

    #[test]
    fn test_missing_attributes_defaulted() {
        let mut mesh = triangle();
        mesh.normals.clear();
        mesh.uvs.truncate(1);
        let verts = imported_vertices(&mesh);
        assert_eq!(verts[2].normal, [0.0, 1.0, 0.0]);
        assert_eq!(verts[2].uv, [0.0, 0.0]);
        assert_eq!(verts[0].uv, [0.0, 0.0]);
    }
}
