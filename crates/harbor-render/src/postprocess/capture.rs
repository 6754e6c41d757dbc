//! Scene capture into the HDR target

use super::backend::GraphicsBackend;
use super::processor::{FrameContext, PostPass, PostResources};
use crate::context::RenderError;

/// Clears the capture target and draws the scene into both attachments
#[derive(Debug, Default)]
pub struct CapturePass;

impl<B: GraphicsBackend> PostPass<B> for CapturePass {
    fn label(&self) -> &str {
        "capture"
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_, B>,
        res: &mut PostResources<B>,
    ) -> Result<(), RenderError> {
        ctx.backend.bind_target(Some(res.capture.handle()))?;
        ctx.backend.clear(ctx.clear_color)?;
        ctx.scene.draw(ctx.backend)?;
        ctx.backend.bind_target(None)
    }
}
