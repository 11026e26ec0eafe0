use glam::Mat4;

use crate::core::platform::backend::GraphicsBackend;
use crate::core::rendering::render::RenderError;
use crate::core::rendering::shader::{Shader, ShaderHandle, ShaderLibrary};

/// Something the renderer can draw with a single combined transform
pub trait Drawable<B: GraphicsBackend> {
    /// Object to world transform
    fn model_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    /// Draw with `transform` = projection * view * model. Must leave every
    /// vertex attribute array it enabled disabled again.
    fn render(&self, shaders: &ShaderLibrary<B>, transform: &Mat4) -> Result<(), RenderError>;
}

pub(crate) fn resolve_shader<B: GraphicsBackend>(
    shaders: &ShaderLibrary<B>,
    handle: ShaderHandle,
) -> Result<&Shader<B>, RenderError> {
    shaders.get(handle).ok_or(RenderError::StaleShader(handle))
}

pub(crate) fn resolve_uniform<'a, B: GraphicsBackend>(
    shader: &'a Shader<B>,
    name: &str,
) -> Result<&'a B::UniformLocation, RenderError> {
    shader
        .uniform(name)
        .ok_or_else(|| RenderError::MissingUniform {
            shader: shader.name().to_string(),
            uniform: name.to_string(),
        })
}
