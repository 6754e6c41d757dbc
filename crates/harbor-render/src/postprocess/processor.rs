//! The ordered pass list that turns a scene into a bloomed, tonemapped frame

use super::backend::{Drawable, GraphicsBackend};
use super::blur::{blur_schedule, BlurSource, BlurStepPass};
use super::capture::CapturePass;
use super::composite::CompositePass;
use super::config::BloomParameters;
use super::quad::FullScreenQuad;
use super::target::{PingPongPair, RenderTarget};
use crate::context::RenderError;
use harbor_core::Color;

/// Everything a pass needs for one frame
pub struct FrameContext<'a, B: GraphicsBackend> {
    pub backend: &'a mut B,
    pub scene: &'a mut dyn Drawable<B>,
    pub params: &'a BloomParameters,
    pub clear_color: Color,
}

/// GPU resources that live as long as the processor
pub struct PostResources<B: GraphicsBackend> {
    pub capture: RenderTarget<B>,
    pub ping_pong: PingPongPair<B>,
    pub quad: FullScreenQuad<B>,
    /// Where the most recent blur result lives
    pub blur_output: BlurSource,
}

/// One stage of the frame
pub trait PostPass<B: GraphicsBackend> {
    fn label(&self) -> &str;

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_, B>,
        res: &mut PostResources<B>,
    ) -> Result<(), RenderError>;
}

/// Runs capture, the blur steps and composite in that order
pub struct PostProcessor<B: GraphicsBackend> {
    resources: PostResources<B>,
    passes: Vec<Box<dyn PostPass<B>>>,
    blur_iterations: u32,
}

impl<B: GraphicsBackend> PostProcessor<B> {
    /// Allocate all targets at `width` x `height`. Allocation failure is fatal.
    pub fn new(
        backend: &mut B,
        width: u32,
        height: u32,
        params: &BloomParameters,
    ) -> Result<Self, RenderError> {
        let capture = RenderTarget::capture(backend, width, height)?;
        let ping_pong = PingPongPair::new(backend, width, height)?;

        tracing::info!(
            width,
            height,
            blur_iterations = params.blur_iterations,
            "post-processing targets created"
        );

        Ok(Self {
            resources: PostResources {
                capture,
                ping_pong,
                quad: FullScreenQuad::new(),
                blur_output: BlurSource::BrightPass,
            },
            passes: build_passes(params.blur_iterations),
            blur_iterations: params.blur_iterations,
        })
    }

    pub fn pass_labels(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.label()).collect()
    }

    /// Render one frame. The first failing pass aborts the rest.
    pub fn render_frame(&mut self, ctx: &mut FrameContext<'_, B>) -> Result<(), RenderError> {
        if ctx.params.blur_iterations != self.blur_iterations {
            tracing::debug!(
                from = self.blur_iterations,
                to = ctx.params.blur_iterations,
                "rebuilding blur passes"
            );
            self.blur_iterations = ctx.params.blur_iterations;
            self.passes = build_passes(self.blur_iterations);
        }

        self.resources.blur_output = BlurSource::BrightPass;
        for pass in self.passes.iter_mut() {
            if let Err(err) = pass.execute(ctx, &mut self.resources) {
                tracing::error!(pass = pass.label(), error = %err, "post-processing pass failed");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Re-create every target at the new size. Targets are never resized
    /// any other way.
    pub fn resize(&mut self, backend: &mut B, width: u32, height: u32) -> Result<(), RenderError> {
        if (width, height) == self.size() {
            return Ok(());
        }
        let capture = RenderTarget::capture(backend, width, height)?;
        let ping_pong = PingPongPair::new(backend, width, height)?;
        self.resources.capture = capture;
        self.resources.ping_pong = ping_pong;
        self.resources.blur_output = BlurSource::BrightPass;
        tracing::info!(width, height, "post-processing targets resized");
        Ok(())
    }

    pub fn resources(&self) -> &PostResources<B> {
        &self.resources
    }

    pub fn size(&self) -> (u32, u32) {
        (
            self.resources.capture.width(),
            self.resources.capture.height(),
        )
    }
}

fn build_passes<B: GraphicsBackend>(blur_iterations: u32) -> Vec<Box<dyn PostPass<B>>> {
    let mut passes: Vec<Box<dyn PostPass<B>>> = Vec::with_capacity(blur_iterations as usize + 2);
    passes.push(Box::new(CapturePass));
    for step in blur_schedule(blur_iterations) {
        passes.push(Box::new(BlurStepPass::new(step)));
    }
    passes.push(Box::new(CompositePass));
    passes
}
