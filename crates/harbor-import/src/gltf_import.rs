//! glTF/GLB file importer

use crate::types::{ImportResult, ImportedMaterial, ImportedMesh, ImportedTexture};
use harbor_core::{
    mat4_identity, mat4_mul, mat4_transform_point, normal_matrix, HarborError, Mat4, Result, Vec3,
};
use std::path::Path;

/// Import a glTF or GLB file.
///
/// Meshes are flattened: every primitive reachable from the default scene is
/// emitted once per referencing node, with that node's world transform baked
/// into its positions and normals.
pub fn import_gltf<P: AsRef<Path>>(path: P) -> Result<ImportResult> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path).map_err(|e| {
        HarborError::ImportError(format!("Failed to import {}: {}", path.display(), e))
    })?;

    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();

    let mut meshes = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, &mat4_identity(), &buffers, &mut meshes);
            }
        }
        None => {
            for mesh in document.meshes() {
                read_mesh(&mesh, &mat4_identity(), &buffers, &mut meshes);
            }
        }
    }

    let textures = images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let tex_name = document
                .images()
                .nth(i)
                .and_then(|img| img.name().map(String::from))
                .unwrap_or_else(|| format!("{}_image_{}", name, i));
            to_rgba_texture(tex_name, image)
        })
        .collect();

    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            ImportedMaterial {
                name: material
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0))),
                base_color: pbr.base_color_factor(),
                base_color_texture: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect();

    let result = ImportResult {
        name,
        meshes,
        textures,
        materials,
    };
    tracing::debug!(
        model = %result.name,
        meshes = result.meshes.len(),
        vertices = result.vertex_count(),
        "imported glTF"
    );
    Ok(result)
}

fn collect_node(
    node: &gltf::Node,
    parent: &Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ImportedMesh>,
) {
    let world = mat4_mul(parent, &node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        read_mesh(&mesh, &world, buffers, out);
    }
    for child in node.children() {
        collect_node(&child, &world, buffers, out);
    }
}

fn read_mesh(
    mesh: &gltf::Mesh,
    transform: &Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ImportedMesh>,
) {
    let mesh_name = mesh
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

    let normal_m = normal_matrix(transform);

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .map(|iter| {
                iter.map(|p| mat4_transform_point(transform, Vec3::from_array(p)).to_array())
                    .collect()
            })
            .unwrap_or_default();

        if positions.is_empty() {
            continue;
        }

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.map(|n| transform_normal(&normal_m, n)).collect())
            .unwrap_or_default();

        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_default();

        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        out.push(ImportedMesh {
            name: mesh_name.clone(),
            positions,
            normals,
            uvs,
            indices,
            material_index: primitive.material().index(),
        });
    }
}

/// Apply a normal matrix (see [`normal_matrix`]) and renormalize
fn transform_normal(m: &Mat4, n: [f32; 3]) -> [f32; 3] {
    Vec3::new(
        m[0][0] * n[0] + m[1][0] * n[1] + m[2][0] * n[2],
        m[0][1] * n[0] + m[1][1] * n[1] + m[2][1] * n[2],
        m[0][2] * n[0] + m[1][2] * n[1] + m[2][2] * n[2],
    )
    .normalized()
    .to_array()
}

fn to_rgba_texture(name: String, image: &gltf::image::Data) -> ImportedTexture {
    use gltf::image::Format;

    let rgba = match image.format {
        Format::R8G8B8A8 => Some(image.pixels.clone()),
        Format::R8G8B8 => Some(
            image
                .pixels
                .chunks_exact(3)
                .flat_map(|c| [c[0], c[1], c[2], 255])
                .collect(),
        ),
        Format::R8G8 => Some(
            image
                .pixels
                .chunks_exact(2)
                .flat_map(|c| [c[0], c[1], 0, 255])
                .collect(),
        ),
        Format::R8 => Some(image.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect()),
        _ => None,
    };

    match rgba {
        Some(rgba) => ImportedTexture {
            name,
            width: image.width,
            height: image.height,
            rgba,
        },
        None => {
            tracing::warn!(texture = %name, format = ?image.format, "unsupported texture format, using white");
            ImportedTexture {
                name,
                width: 1,
                height: 1,
                rgba: vec![255; 4],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_import_error() {
        let err = import_gltf("does/not/exist.glb").unwrap_err();
        assert!(matches!(err, HarborError::ImportError(_)));
    }

    #[test]
    fn test_rgb_expands_to_rgba() {
        let image = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let tex = to_rgba_texture("t".into(), &image);
        assert_eq!(tex.rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_unsupported_format_falls_back_to_white() {
        let image = gltf::image::Data {
            pixels: vec![0; 8],
            format: gltf::image::Format::R16G16B16A16,
            width: 1,
            height: 1,
        };
        let tex = to_rgba_texture("t".into(), &image);
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(tex.rgba, vec![255; 4]);
    }

    #[test]
    fn test_normal_transform_ignores_translation() {
        let mut m = mat4_identity();
        m[3] = [5.0, 6.0, 7.0, 1.0];
        assert_eq!(
            transform_normal(&normal_matrix(&m), [0.0, 1.0, 0.0]),
            [0.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_normal_stays_perpendicular_under_non_uniform_scale() {
        let mut m = mat4_identity();
        m[0][0] = 2.0;
        let s = std::f32::consts::FRAC_1_SQRT_2;
        let n = Vec3::from_array(transform_normal(&normal_matrix(&m), [s, s, 0.0]));
        // The surface tangent (1, -1, 0) is stretched along x with the mesh
        let tangent = mat4_transform_point(&m, Vec3::new(1.0, -1.0, 0.0));
        assert!(n.dot(&tangent).abs() < 1e-5);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }
}
