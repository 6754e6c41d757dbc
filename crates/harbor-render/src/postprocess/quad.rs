//! Full-screen quad shared by the blur and composite passes

use super::backend::GraphicsBackend;
use crate::context::RenderError;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Four corners covering clip space, drawn as a triangle strip
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        uv: [1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        uv: [1.0, 0.0],
    },
];

/// Quad geometry uploaded on first draw and reused afterwards
pub struct FullScreenQuad<B: GraphicsBackend> {
    quad: Option<B::Quad>,
}

impl<B: GraphicsBackend> Default for FullScreenQuad<B> {
    fn default() -> Self {
        Self { quad: None }
    }
}

impl<B: GraphicsBackend> FullScreenQuad<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocated(&self) -> bool {
        self.quad.is_some()
    }

    pub fn draw(&mut self, backend: &mut B) -> Result<(), RenderError> {
        let quad = match self.quad.take() {
            Some(quad) => quad,
            None => {
                tracing::debug!("uploading full-screen quad");
                backend.create_quad()?
            }
        };
        let result = backend.draw_quad(&quad);
        self.quad = Some(quad);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::testing::{Call, RecordingBackend};

    #[test]
    fn test_quad_covers_clip_space() {
        for v in QUAD_VERTICES {
            assert_eq!(v.position[0].abs(), 1.0);
            assert_eq!(v.position[1].abs(), 1.0);
            // uv follows position
            assert_eq!(v.uv[0], (v.position[0] + 1.0) / 2.0);
            assert_eq!(v.uv[1], (v.position[1] + 1.0) / 2.0);
        }
        assert_eq!(std::mem::size_of::<QuadVertex>(), 20);
    }

    #[test]
    fn test_quad_created_once() {
        let mut backend = RecordingBackend::new();
        let mut quad = FullScreenQuad::new();
        assert!(!quad.allocated());

        quad.draw(&mut backend).unwrap();
        quad.draw(&mut backend).unwrap();
        quad.draw(&mut backend).unwrap();

        assert!(quad.allocated());
        assert_eq!(backend.count(|c| matches!(c, Call::CreateQuad(_))), 1);
        assert_eq!(backend.count(|c| *c == Call::DrawQuad(0)), 3);
    }
}
