pub mod buffer;
pub mod camera;
pub mod diagnostics;
pub mod drawable;
pub mod gpu_buffer;
pub mod object;
mod render;
pub mod shader;

pub use crate::core::rendering::render::*;
