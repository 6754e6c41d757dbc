//! Harbor Core - Foundational types for the Harbor demo
//!
//! This crate provides the types that all other Harbor crates depend on:
//! - `Vec3`, `Color` - Spatial and color types
//! - `Mat4` helpers and the `ModelMatrix` builder
//! - Error types and Result alias

mod error;
mod math;
mod types;

pub use error::{HarborError, Result};
pub use math::{
    mat4_identity, mat4_mul, mat4_transform_point, normal_matrix, strip_translation, Mat4,
    ModelMatrix,
};
pub use types::{Color, Vec3};
