//! HDR bloom post-processing
//!
//! The scene is captured into a two-attachment HDR target, attachment 1 is
//! blurred by ping-ponging between two single-attachment targets, and the
//! composite pass tonemaps the sharp image plus the blur onto the surface.
//!
//! Every GPU call goes through [`GraphicsBackend`], so the pass sequence
//! runs unchanged against [`WgpuBackend`] or a recording fake in tests.

mod backend;
mod blur;
mod capture;
mod composite;
mod config;
mod gpu_backend;
mod processor;
mod quad;
mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Drawable, GraphicsBackend, Program, TargetDesc, UniformValue};
pub use blur::{blur_schedule, final_blur_output, BlurSource, BlurStep, BlurStepPass};
pub use capture::CapturePass;
pub use composite::CompositePass;
pub use config::{BloomParameters, MIN_EXPOSURE};
pub use gpu_backend::{WgpuBackend, WgpuQuad, WgpuTarget};
pub use processor::{FrameContext, PostPass, PostProcessor, PostResources};
pub use quad::{FullScreenQuad, QuadVertex, QUAD_VERTICES};
pub use target::{
    PingPongPair, RenderTarget, BRIGHT_ATTACHMENT, DEPTH_FORMAT, HDR_FORMAT, SCENE_ATTACHMENT,
};
