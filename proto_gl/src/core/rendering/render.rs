use std::rc::Rc;

use glam::Vec4;
use thiserror::Error;

use crate::core::assets_management::models::ModelError;
use crate::core::platform::backend::{Capability, DepthFunction, GlError, GraphicsBackend};
use crate::core::rendering::camera::{Camera, CameraError};
use crate::core::rendering::diagnostics::check_for_errors;
use crate::core::rendering::drawable::Drawable;
use crate::core::rendering::gpu_buffer::BufferError;
use crate::core::rendering::shader::{ShaderError, ShaderHandle, ShaderLibrary};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("could not create vertex array: {0}")]
    VertexArray(String),
    #[error("shader handle {0} does not refer to a live shader")]
    StaleShader(ShaderHandle),
    #[error("shader '{shader}' has no registered uniform '{uniform}'")]
    MissingUniform { shader: String, uniform: String },
    /// Every vertex needs exactly one texture coordinate
    #[error("{positions} positions but {uvs} texture coordinates")]
    StreamMismatch { positions: usize, uvs: usize },
    #[error("{0} vertices do not fit in a single draw call")]
    TooManyVertices(usize),
    #[error("required extensions are not supported: {}", .0.join(", "))]
    MissingExtensions(Vec<String>),
}

/// Draws a list of drawables once per frame through one camera.
///
/// Owns the shader library the drawables refer to and the single vertex
/// array all attribute state is recorded in.
pub struct Renderer<B: GraphicsBackend> {
    gl: Rc<B>,
    vertex_array: B::VertexArray,
    shaders: ShaderLibrary<B>,
    drawables: Vec<Box<dyn Drawable<B>>>,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Set up the context for rendering: bind a vertex array, enable depth
    /// testing and back-face culling, and set the clear colour
    pub fn new(gl: Rc<B>, clear_color: Vec4) -> Result<Self, RenderError> {
        let vertex_array = gl.create_vertex_array().map_err(RenderError::VertexArray)?;
        gl.bind_vertex_array(Some(vertex_array));

        gl.enable(Capability::DepthTest);
        gl.depth_func(DepthFunction::Less);
        // Triangles facing away from the camera are dropped
        gl.enable(Capability::CullFace);
        gl.clear_color(clear_color);

        log::info!("Renderer initialized");
        Ok(Renderer {
            shaders: ShaderLibrary::new(gl.clone()),
            gl,
            vertex_array,
            drawables: vec![],
        })
    }

    #[inline(always)]
    pub fn backend(&self) -> &Rc<B> {
        &self.gl
    }

    #[inline(always)]
    pub fn shaders(&self) -> &ShaderLibrary<B> {
        &self.shaders
    }

    #[inline(always)]
    pub fn shaders_mut(&mut self) -> &mut ShaderLibrary<B> {
        &mut self.shaders
    }

    /// Register a drawable, returning its index
    pub fn add_drawable(&mut self, drawable: Box<dyn Drawable<B>>) -> usize {
        self.drawables.push(drawable);
        self.drawables.len() - 1
    }

    pub fn drawable(&self, index: usize) -> Option<&dyn Drawable<B>> {
        self.drawables.get(index).map(Box::as_ref)
    }

    #[inline(always)]
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    pub fn set_clear_color(&self, clear_color: Vec4) {
        self.gl.clear_color(clear_color);
    }

    /// Draw every drawable with `projection * view * model`.
    ///
    /// The camera matrices are recomputed first. Driver errors raised during
    /// the frame are logged and returned, they never fail the frame. A
    /// drawable that fails stops the frame, after the driver errors raised so
    /// far have been logged and drained.
    pub fn render_frame(&self, camera: &mut Camera) -> Result<Vec<GlError>, RenderError> {
        camera.update_matrices()?;
        self.gl.clear();

        let view_projection = camera.view_projection();
        for drawable in self.drawables.iter() {
            let transform = view_projection * drawable.model_matrix();
            if let Err(err) = drawable.render(&self.shaders, &transform) {
                let errors = check_for_errors(self.gl.as_ref());
                log::error!(
                    "Frame aborted: {} ({} OpenGL errors drained)",
                    err,
                    errors.len()
                );
                return Err(err);
            }
        }

        Ok(check_for_errors(self.gl.as_ref()))
    }

    /// Follow a window resize: new viewport and camera aspect ratio.
    /// A zero sized (minimized) window keeps the previous aspect ratio.
    pub fn on_resize(&self, width: u32, height: u32, camera: &mut Camera) -> Result<(), RenderError> {
        let (width, height) = (width.min(i32::MAX as u32), height.min(i32::MAX as u32));
        self.gl.viewport(0, 0, width as i32, height as i32);
        if width > 0 && height > 0 {
            camera.set_aspect_ratio(width as f32 / height as f32)?;
        }
        log::debug!("Viewport resized to {}x{}", width, height);
        Ok(())
    }
}

impl<B: GraphicsBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        // Drawables own GPU buffers and go first
        self.drawables.clear();
        self.gl.bind_vertex_array(None);
        self.gl.delete_vertex_array(self.vertex_array);
    }
}
