//! Harbor Runtime - Frame loop infrastructure
//!
//! Provides the per-frame building blocks the player loop consumes:
//! - `FrameClock` - per-frame delta time and total elapsed time
//! - `InputState` - keyboard, mouse, and scroll tracking with action bindings

mod clock;
mod input;

pub use clock::FrameClock;
pub use input::{Action, InputState};
