//! Bloom merge and exposure tonemapping onto the surface

use super::backend::{GraphicsBackend, Program, UniformValue};
use super::blur::BlurSource;
use super::processor::{FrameContext, PostPass, PostResources};
use super::target::{BRIGHT_ATTACHMENT, SCENE_ATTACHMENT};
use crate::context::RenderError;

/// Samples the sharp image in slot 0 and the blurred image in slot 1
#[derive(Debug, Default)]
pub struct CompositePass;

impl<B: GraphicsBackend> PostPass<B> for CompositePass {
    fn label(&self) -> &str {
        "composite"
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_, B>,
        res: &mut PostResources<B>,
    ) -> Result<(), RenderError> {
        let backend = &mut *ctx.backend;

        backend.bind_target(None)?;
        backend.clear(ctx.clear_color)?;
        backend.use_program(Program::Composite)?;
        backend.bind_texture(0, res.capture.handle(), SCENE_ATTACHMENT)?;
        match res.blur_output {
            BlurSource::BrightPass => {
                backend.bind_texture(1, res.capture.handle(), BRIGHT_ATTACHMENT)?
            }
            BlurSource::PingPong(i) => backend.bind_texture(1, res.ping_pong.get(i).handle(), 0)?,
        }
        backend.set_uniform("bloom", UniformValue::Bool(ctx.params.bloom_enabled))?;
        backend.set_uniform("exposure", UniformValue::Float(ctx.params.exposure))?;
        res.quad.draw(backend)
    }
}
