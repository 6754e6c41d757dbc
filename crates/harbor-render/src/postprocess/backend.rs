//! The seam between the post-processing passes and the GPU

use crate::context::RenderError;
use harbor_core::{Color, Mat4};
use std::fmt;

/// Shader programs the post-processing passes can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// One direction of the separable Gaussian blur
    Blur,
    /// Bloom merge and exposure tonemapping onto the surface
    Composite,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::Blur => write!(f, "blur"),
            Program::Composite => write!(f, "composite"),
        }
    }
}

/// A value for a named shader parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Bool(_) => "bool",
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

/// Shape of an offscreen render target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Number of HDR color attachments
    pub color_attachments: usize,
    /// Whether a depth attachment is allocated
    pub depth: bool,
}

/// GPU operations issued by the post-processing passes.
///
/// A `Target` owns its attachments; dropping it releases them. Binding
/// `None` as the target selects the visible surface.
pub trait GraphicsBackend {
    type Target;
    type Quad;

    /// Allocate a target. Any failure is a hard `ResourceAllocation` error.
    fn create_target(&mut self, desc: &TargetDesc) -> Result<Self::Target, RenderError>;

    /// Pixel size of one color attachment, or `None` if it does not exist
    fn attachment_size(&self, target: &Self::Target, attachment: usize) -> Option<(u32, u32)>;

    /// Route subsequent clears and draws to `target`, or to the surface
    fn bind_target(&mut self, target: Option<&Self::Target>) -> Result<(), RenderError>;

    /// Clear every color attachment and the depth attachment of the bound destination
    fn clear(&mut self, color: Color) -> Result<(), RenderError>;

    fn use_program(&mut self, program: Program) -> Result<(), RenderError>;

    /// Set a named parameter on the program in use
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError>;

    /// Bind a color attachment of `target` to a sampler slot
    fn bind_texture(
        &mut self,
        slot: u32,
        target: &Self::Target,
        attachment: usize,
    ) -> Result<(), RenderError>;

    /// Upload the full-screen quad geometry
    fn create_quad(&mut self) -> Result<Self::Quad, RenderError>;

    /// Draw the quad with the program in use into the bound destination
    fn draw_quad(&mut self, quad: &Self::Quad) -> Result<(), RenderError>;
}

/// Something that can render itself into the currently bound target
pub trait Drawable<B: GraphicsBackend> {
    fn draw(&mut self, backend: &mut B) -> Result<(), RenderError>;
}
