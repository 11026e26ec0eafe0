use std::collections::HashSet;

use glam::{Mat4, Vec4};
use glow::{Context, HasContext, NativeShader};

use crate::core::platform::backend::{
    BufferParameter, BufferTarget, BufferUsage, Capability, DepthFunction, DriverString,
    GraphicsBackend, PrimitiveMode, StorageFlags, BUFFER_STORAGE_EXTENSION,
};
use crate::core::rendering::shader::ShaderError;

/// OpenGL through glow. The context must be current on the calling thread
/// for every call, which is the caller's contract with the window layer.
impl GraphicsBackend for Context {
    type Buffer = <Context as HasContext>::Buffer;
    type Program = <Context as HasContext>::Program;
    type UniformLocation = <Context as HasContext>::UniformLocation;
    type Texture = <Context as HasContext>::Texture;
    type VertexArray = <Context as HasContext>::VertexArray;

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target.to_gl(), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        if gl_size("glBufferData size", data.len()).is_none() {
            return;
        }
        unsafe { self.buffer_data_u8_slice(target.to_gl(), data, usage.to_gl()) }
    }

    fn buffer_storage(&self, target: BufferTarget, data: &[u8], flags: StorageFlags) {
        let Some(size) = gl_size("glBufferStorage size", data.len()) else {
            return;
        };
        unsafe { HasContext::buffer_storage(self, target.to_gl(), size, Some(data), flags.bits()) }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let Some(offset) = gl_size("glBufferSubData offset", offset) else {
            return;
        };
        unsafe { self.buffer_sub_data_u8_slice(target.to_gl(), offset, data) }
    }

    fn get_buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &mut [u8]) {
        let Some(offset) = gl_size("glGetBufferSubData offset", offset) else {
            return;
        };
        unsafe { HasContext::get_buffer_sub_data(self, target.to_gl(), offset, data) }
    }

    fn get_buffer_parameter(&self, target: BufferTarget, parameter: BufferParameter) -> i32 {
        unsafe { self.get_buffer_parameter_i32(target.to_gl(), parameter.to_gl()) }
    }

    fn supports_buffer_storage(&self) -> bool {
        let version = HasContext::version(self);
        (!version.is_embedded && (version.major, version.minor) >= (4, 4))
            || HasContext::supported_extensions(self).contains(BUFFER_STORAGE_EXTENSION)
    }

    fn compile_program(
        &self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, ShaderError> {
        compile_shaders(
            self,
            &[
                (glow::VERTEX_SHADER, vertex_src),
                (glow::FRAGMENT_SHADER, fragment_src),
            ],
        )
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn uniform_matrix_4(&self, location: &Self::UniformLocation, value: &Mat4) {
        unsafe { self.uniform_matrix_4_f32_slice(Some(location), false, &value.to_cols_array()) }
    }

    fn uniform_i32(&self, location: &Self::UniformLocation, value: i32) {
        unsafe { self.uniform_1_i32(Some(location), value) }
    }

    fn active_texture_unit(&self, unit: u32) {
        unsafe { self.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture_2d(&self, texture: Option<Self::Texture>) {
        unsafe { self.bind_texture(glow::TEXTURE_2D, texture) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::disable_vertex_attrib_array(self, index) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self,
                index,
                size,
                glow::FLOAT,
                normalized,
                stride,
                offset,
            )
        }
    }

    fn draw_arrays(&self, mode: PrimitiveMode, first: i32, count: i32) {
        unsafe { HasContext::draw_arrays(self, mode.to_gl(), first, count) }
    }

    fn clear_color(&self, color: Vec4) {
        unsafe { HasContext::clear_color(self, color.x, color.y, color.z, color.w) }
    }

    fn clear(&self) {
        unsafe { HasContext::clear(self, glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) }
    }

    fn enable(&self, capability: Capability) {
        unsafe { HasContext::enable(self, capability.to_gl()) }
    }

    fn depth_func(&self, function: DepthFunction) {
        unsafe { HasContext::depth_func(self, function.to_gl()) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn get_error(&self) -> u32 {
        unsafe { HasContext::get_error(self) }
    }

    fn supported_extensions(&self) -> HashSet<String> {
        HasContext::supported_extensions(self).clone()
    }

    fn get_parameter_string(&self, parameter: DriverString) -> String {
        unsafe { HasContext::get_parameter_string(self, parameter.to_gl()) }
    }
}

/// Sizes and offsets cross into GL as `i32`. Anything larger is logged and
/// the call skipped, since a wrapped value would address the wrong bytes.
fn gl_size(what: &str, value: usize) -> Option<i32> {
    match i32::try_from(value) {
        Ok(value) => Some(value),
        Err(_) => {
            log::error!("{} of {} bytes does not fit in a GLint, call skipped", what, value);
            None
        }
    }
}

/// Compile shaders into a program. The slice pairs a shader type (fragment, vertex)
/// with its source code: (shader_type, shader_code)
fn compile_shaders(
    gl: &Context,
    shaders: &[(u32, &str)],
) -> Result<<Context as HasContext>::Program, ShaderError> {
    unsafe {
        let program = gl
            .create_program()
            .map_err(ShaderError::ResourceCreation)?;
        let mut created_shaders: Vec<NativeShader> = vec![];

        for (shader_type, source) in shaders.iter() {
            let shader = match gl.create_shader(*shader_type) {
                Ok(shader) => shader,
                Err(message) => {
                    for shader in created_shaders.into_iter() {
                        gl.delete_shader(shader);
                    }
                    HasContext::delete_program(gl, program);
                    return Err(ShaderError::ResourceCreation(message));
                }
            };
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            // Check if compilation for this shader went ok
            if !gl.get_shader_compile_status(shader) {
                let info_log = gl.get_shader_info_log(shader);

                gl.delete_shader(shader);
                for shader in created_shaders.into_iter() {
                    gl.delete_shader(shader)
                }
                HasContext::delete_program(gl, program);

                log::error!("Error compiling shader: {}", info_log);
                return Err(ShaderError::CompilationError(info_log));
            }

            gl.attach_shader(program, shader);
            created_shaders.push(shader);
        }

        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let info_log = gl.get_program_info_log(program);
            HasContext::delete_program(gl, program);
            for shader in created_shaders.into_iter() {
                gl.delete_shader(shader);
            }

            log::error!("Error linking program: {}", info_log);
            return Err(ShaderError::LinkError(info_log));
        }

        // Linked: the program keeps the binaries, the shader objects can go
        for shader in created_shaders.into_iter() {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }

        Ok(program)
    }
}
