//! Harbor Player - interactive harbor scene with HDR bloom

mod config;
mod player_app;
mod state;

pub use config::{PlayerConfig, WindowConfig};
pub use player_app::PlayerApp;
pub use state::ProgramState;
