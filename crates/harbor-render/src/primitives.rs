//! Mesh primitives (box, ground plane, skybox cube)

use bytemuck::{Pod, Zeroable};

/// A vertex with position, normal, color, and UV coordinates
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
        3 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// A mesh with vertices and indices
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// Create a box mesh with the given dimensions and color.
///
/// Each face gets its own four vertices so normals stay flat, wound
/// counter-clockwise when seen from outside.
pub fn create_box_mesh(width: f32, height: f32, depth: f32, color: [f32; 4]) -> Mesh {
    let h = [width / 2.0, height / 2.0, depth / 2.0];

    // (normal, u axis, v axis) per face; u x v == normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = std::array::from_fn(|i| (normal[i] + su * u[i] + sv * v[i]) * h[i]);
            vertices.push(Vertex {
                position,
                normal,
                color,
                uv: [(su + 1.0) / 2.0, (sv + 1.0) / 2.0],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh { vertices, indices }
}

/// Create a horizontal square plane at height `y`, facing up, with UVs
/// running from 0 to `uv_repeat` across its width.
pub fn create_plane_mesh(size: f32, y: f32, uv_repeat: f32, color: [f32; 4]) -> Mesh {
    let hs = size / 2.0;
    let corner = |x: f32, z: f32, u: f32, v: f32| Vertex {
        position: [x, y, z],
        normal: [0.0, 1.0, 0.0],
        color,
        uv: [u, v],
    };

    let vertices = vec![
        corner(-hs, hs, 0.0, 0.0),
        corner(hs, hs, uv_repeat, 0.0),
        corner(hs, -hs, uv_repeat, uv_repeat),
        corner(-hs, -hs, 0.0, uv_repeat),
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];

    Mesh { vertices, indices }
}

/// Positions of a unit cube as 36 triangle-list corners, for the skybox.
/// The skybox is drawn without culling, so winding does not matter.
pub fn skybox_cube_positions() -> Vec<[f32; 3]> {
    let mesh = create_box_mesh(2.0, 2.0, 2.0, [1.0; 4]);
    mesh.indices
        .iter()
        .map(|&i| mesh.vertices[i as usize].position)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[test]
    fn test_box_counts_and_extent() {
        let mesh = create_box_mesh(2.0, 4.0, 6.0, [1.0; 4]);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        for v in &mesh.vertices {
            assert_eq!(v.position[0].abs(), 1.0);
            assert_eq!(v.position[1].abs(), 2.0);
            assert_eq!(v.position[2].abs(), 3.0);
        }
    }

    #[test]
    fn test_box_winding_matches_normals() {
        let mesh = create_box_mesh(1.0, 1.0, 1.0, [1.0; 4]);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let n = cross(sub(b.position, a.position), sub(c.position, a.position));
            let d = n[0] * a.normal[0] + n[1] * a.normal[1] + n[2] * a.normal[2];
            assert!(d > 0.0, "face with normal {:?} is wound clockwise", a.normal);
        }
    }

    #[test]
    fn test_plane_faces_up_with_tiling() {
        let mesh = create_plane_mesh(100.0, -1.0, 10.0, [1.0; 4]);
        assert_eq!(mesh.index_count(), 6);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == -1.0));
        assert!(mesh.vertices.iter().any(|v| v.uv == [10.0, 10.0]));

        let [a, b, c] = [0, 1, 2].map(|i| mesh.vertices[i].position);
        let n = cross(sub(b, a), sub(c, a));
        assert!(n[1] > 0.0);
    }

    #[test]
    fn test_skybox_cube_has_36_corners() {
        let positions = skybox_cube_positions();
        assert_eq!(positions.len(), 36);
        assert!(positions
            .iter()
            .all(|p| p.iter().all(|c| c.abs() == 1.0)));
    }
}
