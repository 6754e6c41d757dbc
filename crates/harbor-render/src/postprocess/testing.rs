//! Recording backend for exercising the pass sequence without a GPU

use super::backend::{Drawable, GraphicsBackend, Program, TargetDesc, UniformValue};
use crate::context::RenderError;
use harbor_core::Color;
use std::cell::Cell;
use std::rc::Rc;

/// One recorded backend call. Targets and quads are identified by the
/// order they were created in.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTarget(usize),
    BindTarget(Option<usize>),
    Clear,
    UseProgram(Program),
    SetUniform(String, UniformValue),
    BindTexture {
        slot: u32,
        target: usize,
        attachment: usize,
    },
    CreateQuad(usize),
    DrawQuad(usize),
    SceneDraw,
}

pub struct FakeTarget {
    pub id: usize,
    pub desc: TargetDesc,
    live: Rc<Cell<usize>>,
}

impl Drop for FakeTarget {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

pub struct FakeQuad {
    pub id: usize,
}

#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub fail_allocations: bool,
    next_target: usize,
    next_quad: usize,
    live: Rc<Cell<usize>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets created and not yet dropped
    pub fn live_targets(&self) -> usize {
        self.live.get()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Index of the first call matching `pred`
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(pred)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl GraphicsBackend for RecordingBackend {
    type Target = FakeTarget;
    type Quad = FakeQuad;

    fn create_target(&mut self, desc: &TargetDesc) -> Result<FakeTarget, RenderError> {
        if self.fail_allocations {
            return Err(RenderError::allocation(&desc.label, "simulated failure"));
        }
        let id = self.next_target;
        self.next_target += 1;
        self.live.set(self.live.get() + 1);
        self.calls.push(Call::CreateTarget(id));
        Ok(FakeTarget {
            id,
            desc: desc.clone(),
            live: Rc::clone(&self.live),
        })
    }

    fn attachment_size(&self, target: &FakeTarget, attachment: usize) -> Option<(u32, u32)> {
        (attachment < target.desc.color_attachments).then_some((target.desc.width, target.desc.height))
    }

    fn bind_target(&mut self, target: Option<&FakeTarget>) -> Result<(), RenderError> {
        self.calls.push(Call::BindTarget(target.map(|t| t.id)));
        Ok(())
    }

    fn clear(&mut self, _color: Color) -> Result<(), RenderError> {
        self.calls.push(Call::Clear);
        Ok(())
    }

    fn use_program(&mut self, program: Program) -> Result<(), RenderError> {
        self.calls.push(Call::UseProgram(program));
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        self.calls.push(Call::SetUniform(name.to_string(), value));
        Ok(())
    }

    fn bind_texture(
        &mut self,
        slot: u32,
        target: &FakeTarget,
        attachment: usize,
    ) -> Result<(), RenderError> {
        self.calls.push(Call::BindTexture {
            slot,
            target: target.id,
            attachment,
        });
        Ok(())
    }

    fn create_quad(&mut self) -> Result<FakeQuad, RenderError> {
        let id = self.next_quad;
        self.next_quad += 1;
        self.calls.push(Call::CreateQuad(id));
        Ok(FakeQuad { id })
    }

    fn draw_quad(&mut self, quad: &FakeQuad) -> Result<(), RenderError> {
        self.calls.push(Call::DrawQuad(quad.id));
        Ok(())
    }
}

/// A scene that only records that it was drawn
#[derive(Default)]
pub struct RecordingScene {
    pub fail: bool,
}

impl Drawable<RecordingBackend> for RecordingScene {
    fn draw(&mut self, backend: &mut RecordingBackend) -> Result<(), RenderError> {
        if self.fail {
            return Err(RenderError::AssetLoad {
                path: "scene".into(),
                reason: "simulated draw failure".into(),
            });
        }
        backend.calls.push(Call::SceneDraw);
        Ok(())
    }
}
