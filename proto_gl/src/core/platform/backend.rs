use std::collections::HashSet;
use std::fmt::Debug;

use bitflags::bitflags;
use glam::{Mat4, Vec4};

use crate::core::rendering::shader::ShaderError;

/// Extension providing immutable buffer storage below OpenGL 4.4
pub const BUFFER_STORAGE_EXTENSION: &str = "GL_ARB_buffer_storage";

/// Binding points a buffer can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferTarget {
    /// Vertex attribute data
    #[default]
    Array,
    /// Vertex indices
    ElementArray,
    Uniform,
    CopyRead,
    CopyWrite,
    PixelPack,
    PixelUnpack,
    Texture,
    TransformFeedback,
}

impl BufferTarget {
    pub fn to_gl(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
            BufferTarget::Uniform => glow::UNIFORM_BUFFER,
            BufferTarget::CopyRead => glow::COPY_READ_BUFFER,
            BufferTarget::CopyWrite => glow::COPY_WRITE_BUFFER,
            BufferTarget::PixelPack => glow::PIXEL_PACK_BUFFER,
            BufferTarget::PixelUnpack => glow::PIXEL_UNPACK_BUFFER,
            BufferTarget::Texture => glow::TEXTURE_BUFFER,
            BufferTarget::TransformFeedback => glow::TRANSFORM_FEEDBACK_BUFFER,
        }
    }
}

/// Usage hint for mutable buffer storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StreamDraw,
    StreamRead,
    StreamCopy,
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

impl BufferUsage {
    pub fn to_gl(self) -> u32 {
        match self {
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
            BufferUsage::StreamRead => glow::STREAM_READ,
            BufferUsage::StreamCopy => glow::STREAM_COPY,
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::StaticRead => glow::STATIC_READ,
            BufferUsage::StaticCopy => glow::STATIC_COPY,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::DynamicRead => glow::DYNAMIC_READ,
            BufferUsage::DynamicCopy => glow::DYNAMIC_COPY,
        }
    }

    pub fn from_gl(value: u32) -> Option<Self> {
        let usage = match value {
            glow::STREAM_DRAW => BufferUsage::StreamDraw,
            glow::STREAM_READ => BufferUsage::StreamRead,
            glow::STREAM_COPY => BufferUsage::StreamCopy,
            glow::STATIC_DRAW => BufferUsage::StaticDraw,
            glow::STATIC_READ => BufferUsage::StaticRead,
            glow::STATIC_COPY => BufferUsage::StaticCopy,
            glow::DYNAMIC_DRAW => BufferUsage::DynamicDraw,
            glow::DYNAMIC_READ => BufferUsage::DynamicRead,
            glow::DYNAMIC_COPY => BufferUsage::DynamicCopy,
            _ => return None,
        };
        Some(usage)
    }
}

bitflags! {
    /// Flags fixed at the creation of immutable buffer storage.
    /// Without `DYNAMIC_STORAGE` the contents can never be written again.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct StorageFlags: u32 {
        const MAP_READ        = glow::MAP_READ_BIT;
        const MAP_WRITE       = glow::MAP_WRITE_BIT;
        const MAP_PERSISTENT  = glow::MAP_PERSISTENT_BIT;
        const MAP_COHERENT    = glow::MAP_COHERENT_BIT;
        const DYNAMIC_STORAGE = glow::DYNAMIC_STORAGE_BIT;
        const CLIENT_STORAGE  = glow::CLIENT_STORAGE_BIT;
    }
}

/// Integer buffer parameters that can be queried from the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferParameter {
    /// Allocated size in bytes
    Size,
    /// Usage hint of mutable storage
    Usage,
    /// Non-zero if the storage was declared immutable
    ImmutableStorage,
    /// Flags of immutable storage
    StorageFlags,
}

impl BufferParameter {
    pub fn to_gl(self) -> u32 {
        match self {
            BufferParameter::Size => glow::BUFFER_SIZE,
            BufferParameter::Usage => glow::BUFFER_USAGE,
            BufferParameter::ImmutableStorage => glow::BUFFER_IMMUTABLE_STORAGE,
            BufferParameter::StorageFlags => glow::BUFFER_STORAGE_FLAGS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    Points,
    Lines,
    Triangles,
}

impl PrimitiveMode {
    pub fn to_gl(self) -> u32 {
        match self {
            PrimitiveMode::Points => glow::POINTS,
            PrimitiveMode::Lines => glow::LINES,
            PrimitiveMode::Triangles => glow::TRIANGLES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    CullFace,
}

impl Capability {
    pub fn to_gl(self) -> u32 {
        match self {
            Capability::DepthTest => glow::DEPTH_TEST,
            Capability::CullFace => glow::CULL_FACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunction {
    Less,
    LessEqual,
    Always,
}

impl DepthFunction {
    pub fn to_gl(self) -> u32 {
        match self {
            DepthFunction::Less => glow::LESS,
            DepthFunction::LessEqual => glow::LEQUAL,
            DepthFunction::Always => glow::ALWAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverString {
    Version,
    Renderer,
    Vendor,
}

impl DriverString {
    pub fn to_gl(self) -> u32 {
        match self {
            DriverString::Version => glow::VERSION,
            DriverString::Renderer => glow::RENDERER,
            DriverString::Vendor => glow::VENDOR,
        }
    }
}

/// Error codes reported by the driver through `glGetError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    StackOverflow,
    StackUnderflow,
    OutOfMemory,
    InvalidFramebufferOperation,
    Unknown(u32),
}

impl GlError {
    /// `None` for `GL_NO_ERROR`
    pub fn from_gl(code: u32) -> Option<Self> {
        let error = match code {
            glow::NO_ERROR => return None,
            glow::INVALID_ENUM => GlError::InvalidEnum,
            glow::INVALID_VALUE => GlError::InvalidValue,
            glow::INVALID_OPERATION => GlError::InvalidOperation,
            glow::STACK_OVERFLOW => GlError::StackOverflow,
            glow::STACK_UNDERFLOW => GlError::StackUnderflow,
            glow::OUT_OF_MEMORY => GlError::OutOfMemory,
            glow::INVALID_FRAMEBUFFER_OPERATION => GlError::InvalidFramebufferOperation,
            other => GlError::Unknown(other),
        };
        Some(error)
    }

    pub fn to_gl(self) -> u32 {
        match self {
            GlError::InvalidEnum => glow::INVALID_ENUM,
            GlError::InvalidValue => glow::INVALID_VALUE,
            GlError::InvalidOperation => glow::INVALID_OPERATION,
            GlError::StackOverflow => glow::STACK_OVERFLOW,
            GlError::StackUnderflow => glow::STACK_UNDERFLOW,
            GlError::OutOfMemory => glow::OUT_OF_MEMORY,
            GlError::InvalidFramebufferOperation => glow::INVALID_FRAMEBUFFER_OPERATION,
            GlError::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for GlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlError::InvalidEnum => write!(f, "GL_INVALID_ENUM"),
            GlError::InvalidValue => write!(f, "GL_INVALID_VALUE"),
            GlError::InvalidOperation => write!(f, "GL_INVALID_OPERATION"),
            GlError::StackOverflow => write!(f, "GL_STACK_OVERFLOW"),
            GlError::StackUnderflow => write!(f, "GL_STACK_UNDERFLOW"),
            GlError::OutOfMemory => write!(f, "GL_OUT_OF_MEMORY"),
            GlError::InvalidFramebufferOperation => write!(f, "GL_INVALID_FRAMEBUFFER_OPERATION"),
            GlError::Unknown(code) => write!(f, "unknown error 0x{:04X}", code),
        }
    }
}

/// The slice of the graphics API the rendering core talks to.
///
/// All calls are issued from the thread that owns the context, in program
/// order. Implementations translate them to a concrete API (see
/// [crate::core::platform::opengl]) or emulate them
/// (see [crate::core::platform::headless]).
///
/// Nothing here assumes a binding survives between calls: every operation
/// that reads or writes a buffer acts on whatever is bound to `target`
/// right now, so callers bind immediately before use.
pub trait GraphicsBackend {
    type Buffer: Copy + Eq + Debug;
    type Program: Copy + Eq + Debug;
    type UniformLocation: Clone + Debug;
    type Texture: Copy + Eq + Debug;
    type VertexArray: Copy + Eq + Debug;

    // Buffers
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn delete_buffer(&self, buffer: Self::Buffer);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn buffer_storage(&self, target: BufferTarget, data: &[u8], flags: StorageFlags);
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);
    fn get_buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &mut [u8]);
    fn get_buffer_parameter(&self, target: BufferTarget, parameter: BufferParameter) -> i32;
    /// True if [GraphicsBackend::buffer_storage] and the immutable storage
    /// queries are available (OpenGL 4.4 or [BUFFER_STORAGE_EXTENSION])
    fn supports_buffer_storage(&self) -> bool;

    // Programs
    fn compile_program(
        &self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, ShaderError>;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);
    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn uniform_matrix_4(&self, location: &Self::UniformLocation, value: &Mat4);
    fn uniform_i32(&self, location: &Self::UniformLocation, value: i32);

    // Textures
    fn active_texture_unit(&self, unit: u32);
    fn bind_texture_2d(&self, texture: Option<Self::Texture>);

    // Vertex state and drawing
    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn disable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn draw_arrays(&self, mode: PrimitiveMode, first: i32, count: i32);

    // Frame state
    fn clear_color(&self, color: Vec4);
    fn clear(&self);
    fn enable(&self, capability: Capability);
    fn depth_func(&self, function: DepthFunction);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    // Diagnostics
    /// Raw `glGetError` code, `0` when the queue is empty
    fn get_error(&self) -> u32;
    fn supported_extensions(&self) -> HashSet<String>;
    fn get_parameter_string(&self, parameter: DriverString) -> String;
}
