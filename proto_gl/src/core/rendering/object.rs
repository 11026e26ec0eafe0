use std::path::Path;
use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};

use crate::core::assets_management::models::load_obj;
use crate::core::platform::backend::{BufferTarget, BufferUsage, GraphicsBackend, PrimitiveMode};
use crate::core::rendering::buffer::BufferLayout;
use crate::core::rendering::drawable::{resolve_shader, resolve_uniform, Drawable};
use crate::core::rendering::gpu_buffer::GpuBuffer;
use crate::core::rendering::render::RenderError;
use crate::core::rendering::shader::{
    ShaderHandle, ShaderLibrary, TEXTURE_SAMPLER_UNIFORM, TRANSFORM_UNIFORM,
};

/// Attribute slot receiving vertex positions
pub const POSITION_SLOT: u32 = 0;
/// Attribute slot receiving texture coordinates
pub const UV_SLOT: u32 = 1;
/// Texture unit textured objects sample from
pub const TEXTURE_UNIT: u32 = 0;

/// Vertex positions are uploaded as mutable storage since they may be
/// streamed again later
const POSITION_USAGE: BufferUsage = BufferUsage::DynamicDraw;

/// A mesh drawn with positions only, as a triangle list
pub struct Object<B: GraphicsBackend> {
    vertex_buffer: GpuBuffer<Vec3, B>,
    shader: ShaderHandle,
    model_matrix: Mat4,
}

impl<B: GraphicsBackend> Object<B> {
    /// Object with an empty vertex buffer, to be filled before drawing
    pub fn new(gl: Rc<B>, shader: ShaderHandle) -> Result<Self, RenderError> {
        Ok(Object {
            vertex_buffer: GpuBuffer::new(gl)?,
            shader,
            model_matrix: Mat4::IDENTITY,
        })
    }

    pub fn from_vertices(gl: Rc<B>, vertices: &[Vec3], shader: ShaderHandle) -> Result<Self, RenderError> {
        Ok(Object {
            vertex_buffer: GpuBuffer::with_mutable_data(gl, vertices, POSITION_USAGE)?,
            shader,
            model_matrix: Mat4::IDENTITY,
        })
    }

    /// Load the positions of an OBJ file. UVs and normals are dropped.
    pub fn from_obj_file(gl: Rc<B>, path: impl AsRef<Path>, shader: ShaderHandle) -> Result<Self, RenderError> {
        let geometry = load_obj(path)?;
        Self::from_vertices(gl, &geometry.positions, shader)
    }

    #[inline(always)]
    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    #[inline(always)]
    pub fn set_shader(&mut self, shader: ShaderHandle) {
        self.shader = shader;
    }

    #[inline(always)]
    pub fn vertex_buffer(&self) -> &GpuBuffer<Vec3, B> {
        &self.vertex_buffer
    }

    /// Stream new geometry without rebuilding the object
    #[inline(always)]
    pub fn vertex_buffer_mut(&mut self) -> &mut GpuBuffer<Vec3, B> {
        &mut self.vertex_buffer
    }

    #[inline(always)]
    pub fn set_model_matrix(&mut self, model_matrix: Mat4) {
        self.model_matrix = model_matrix;
    }
}

impl<B: GraphicsBackend> Drawable<B> for Object<B> {
    fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    fn render(&self, shaders: &ShaderLibrary<B>, transform: &Mat4) -> Result<(), RenderError> {
        let shader = resolve_shader(shaders, self.shader)?;
        let mvp = resolve_uniform(shader, TRANSFORM_UNIFORM)?;
        let count = vertex_count(&self.vertex_buffer)?;

        let gl = self.vertex_buffer.backend();
        gl.use_program(Some(shader.program()));
        gl.uniform_matrix_4(mvp, transform);

        let layout = BufferLayout::positions();
        self.vertex_buffer.bind_to(BufferTarget::Array);
        layout.apply(gl.as_ref(), POSITION_SLOT);

        gl.draw_arrays(PrimitiveMode::Triangles, 0, count);
        log::trace!("Drew {} vertices with shader '{}'", count, shader.name());

        layout.disable(gl.as_ref(), POSITION_SLOT);
        Ok(())
    }
}

/// A mesh drawn with positions and texture coordinates, sampling one texture
pub struct TexturedObject<B: GraphicsBackend> {
    vertex_buffer: GpuBuffer<Vec3, B>,
    uv_buffer: GpuBuffer<Vec2, B>,
    texture: B::Texture,
    shader: ShaderHandle,
    model_matrix: Mat4,
}

impl<B: GraphicsBackend> TexturedObject<B> {
    /// `texture` is owned by the caller and must outlive the object's draws
    pub fn from_streams(
        gl: Rc<B>,
        vertices: &[Vec3],
        uvs: &[Vec2],
        shader: ShaderHandle,
        texture: B::Texture,
    ) -> Result<Self, RenderError> {
        if vertices.len() != uvs.len() {
            return Err(RenderError::StreamMismatch {
                positions: vertices.len(),
                uvs: uvs.len(),
            });
        }

        Ok(TexturedObject {
            vertex_buffer: GpuBuffer::with_mutable_data(gl.clone(), vertices, POSITION_USAGE)?,
            uv_buffer: GpuBuffer::with_mutable_data(gl, uvs, BufferUsage::StaticDraw)?,
            texture,
            shader,
            model_matrix: Mat4::IDENTITY,
        })
    }

    /// Load the positions and UVs of an OBJ file. Normals are dropped.
    pub fn from_obj_file(
        gl: Rc<B>,
        path: impl AsRef<Path>,
        shader: ShaderHandle,
        texture: B::Texture,
    ) -> Result<Self, RenderError> {
        let geometry = load_obj(path)?;
        Self::from_streams(gl, &geometry.positions, &geometry.uvs, shader, texture)
    }

    #[inline(always)]
    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    #[inline(always)]
    pub fn set_shader(&mut self, shader: ShaderHandle) {
        self.shader = shader;
    }

    #[inline(always)]
    pub fn texture(&self) -> B::Texture {
        self.texture
    }

    #[inline(always)]
    pub fn set_texture(&mut self, texture: B::Texture) {
        self.texture = texture;
    }

    #[inline(always)]
    pub fn vertex_buffer(&self) -> &GpuBuffer<Vec3, B> {
        &self.vertex_buffer
    }

    #[inline(always)]
    pub fn vertex_buffer_mut(&mut self) -> &mut GpuBuffer<Vec3, B> {
        &mut self.vertex_buffer
    }

    #[inline(always)]
    pub fn uv_buffer(&self) -> &GpuBuffer<Vec2, B> {
        &self.uv_buffer
    }

    #[inline(always)]
    pub fn uv_buffer_mut(&mut self) -> &mut GpuBuffer<Vec2, B> {
        &mut self.uv_buffer
    }

    #[inline(always)]
    pub fn set_model_matrix(&mut self, model_matrix: Mat4) {
        self.model_matrix = model_matrix;
    }
}

impl<B: GraphicsBackend> Drawable<B> for TexturedObject<B> {
    fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    fn render(&self, shaders: &ShaderLibrary<B>, transform: &Mat4) -> Result<(), RenderError> {
        let shader = resolve_shader(shaders, self.shader)?;
        let mvp = resolve_uniform(shader, TRANSFORM_UNIFORM)?;
        let sampler = resolve_uniform(shader, TEXTURE_SAMPLER_UNIFORM)?;

        let count = vertex_count(&self.vertex_buffer)?;
        let uv_count = self.uv_buffer.len();
        if uv_count != count as usize {
            return Err(RenderError::StreamMismatch {
                positions: count as usize,
                uvs: uv_count,
            });
        }

        let gl = self.vertex_buffer.backend();
        gl.use_program(Some(shader.program()));
        gl.uniform_matrix_4(mvp, transform);

        gl.active_texture_unit(TEXTURE_UNIT);
        gl.bind_texture_2d(Some(self.texture));
        gl.uniform_i32(sampler, TEXTURE_UNIT as i32);

        let positions = BufferLayout::positions();
        self.vertex_buffer.bind_to(BufferTarget::Array);
        positions.apply(gl.as_ref(), POSITION_SLOT);

        let uvs = BufferLayout::uvs();
        self.uv_buffer.bind_to(BufferTarget::Array);
        uvs.apply(gl.as_ref(), UV_SLOT);

        gl.draw_arrays(PrimitiveMode::Triangles, 0, count);
        log::trace!(
            "Drew {} textured vertices with shader '{}'",
            count,
            shader.name()
        );

        uvs.disable(gl.as_ref(), UV_SLOT);
        positions.disable(gl.as_ref(), POSITION_SLOT);
        Ok(())
    }
}

/// The buffer length is the authoritative vertex count of a draw
fn vertex_count<T: bytemuck::Pod, B: GraphicsBackend>(buffer: &GpuBuffer<T, B>) -> Result<i32, RenderError> {
    let len = buffer.len();
    i32::try_from(len).map_err(|_| RenderError::TooManyVertices(len))
}
