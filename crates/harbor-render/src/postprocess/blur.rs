//! Ping-pong Gaussian blur of the bright attachment

use super::backend::{GraphicsBackend, Program, UniformValue};
use super::processor::{FrameContext, PostPass, PostResources};
use super::target::BRIGHT_ATTACHMENT;
use crate::context::RenderError;

/// Where a blur step samples from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurSource {
    /// Attachment 1 of the capture target
    BrightPass,
    /// One of the two ping-pong buffers
    PingPong(usize),
}

/// One step of the blur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurStep {
    pub index: u32,
    pub horizontal: bool,
    /// Ping-pong buffer written by this step
    pub write: usize,
    pub source: BlurSource,
}

/// Steps for `iterations` blur passes. Directions alternate starting
/// horizontal; each step after the first reads what the previous one wrote.
pub fn blur_schedule(iterations: u32) -> Vec<BlurStep> {
    let mut horizontal = true;
    let mut steps = Vec::with_capacity(iterations as usize);
    for index in 0..iterations {
        let write = horizontal as usize;
        let source = if index == 0 {
            BlurSource::BrightPass
        } else {
            BlurSource::PingPong(1 - write)
        };
        steps.push(BlurStep {
            index,
            horizontal,
            write,
            source,
        });
        horizontal = !horizontal;
    }
    steps
}

/// The buffer holding the finished blur
pub fn final_blur_output(iterations: u32) -> BlurSource {
    match blur_schedule(iterations).last() {
        Some(step) => BlurSource::PingPong(step.write),
        None => BlurSource::BrightPass,
    }
}

pub struct BlurStepPass {
    step: BlurStep,
    label: String,
}

impl BlurStepPass {
    pub fn new(step: BlurStep) -> Self {
        let label = format!(
            "blur {} ({})",
            step.index,
            if step.horizontal { "horizontal" } else { "vertical" }
        );
        Self { step, label }
    }

    pub fn step(&self) -> BlurStep {
        self.step
    }
}

impl<B: GraphicsBackend> PostPass<B> for BlurStepPass {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_, B>,
        res: &mut PostResources<B>,
    ) -> Result<(), RenderError> {
        let backend = &mut *ctx.backend;
        let step = self.step;

        backend.bind_target(Some(res.ping_pong.write_target(step.horizontal).handle()))?;
        backend.use_program(Program::Blur)?;
        backend.set_uniform("horizontal", UniformValue::Bool(step.horizontal))?;
        match step.source {
            BlurSource::BrightPass => {
                backend.bind_texture(0, res.capture.handle(), BRIGHT_ATTACHMENT)?
            }
            BlurSource::PingPong(i) => backend.bind_texture(0, res.ping_pong.get(i).handle(), 0)?,
        }
        res.quad.draw(backend)?;

        res.blur_output = BlurSource::PingPong(step.write);
        Ok(())
    }
}
