//! In-memory stand-in for a graphics context.
//!
//! Buffers, binding points, programs and attribute-array state are emulated
//! closely enough that the buffer and draw logic of the core can be
//! exercised without a window. Misuse is reported through the same error
//! queue a driver would fill (`GL_INVALID_OPERATION`, `GL_INVALID_VALUE`),
//! so `check_for_errors` works against it too.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use glam::{Mat4, Vec4};

use crate::core::platform::backend::{
    BufferParameter, BufferTarget, BufferUsage, Capability, DepthFunction, DriverString, GlError,
    GraphicsBackend, PrimitiveMode, StorageFlags,
};
use crate::core::rendering::shader::ShaderError;
use crate::core::utils::handle::{Allocator, Handle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmulatedStorage {
    Unallocated,
    Mutable(BufferUsage),
    Immutable(StorageFlags),
}

#[derive(Debug)]
struct EmulatedBuffer {
    data: Vec<u8>,
    storage: EmulatedStorage,
}

#[derive(Debug)]
struct EmulatedProgram {
    source: String,
}

/// Uniform location handed out by [HeadlessBackend]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessUniform {
    pub program: Handle,
    pub name: String,
}

/// Attribute pointer as last described for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributePointer {
    pub size: i32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
    pub buffer: Option<Handle>,
}

/// A recorded `draw_arrays` call together with the state it ran under
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: PrimitiveMode,
    pub first: i32,
    pub count: i32,
    pub program: Option<Handle>,
    pub enabled_attributes: Vec<u32>,
    pub array_buffer: Option<Handle>,
}

/// A recorded `mat4` uniform upload
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixUpload {
    pub uniform: HeadlessUniform,
    pub value: Mat4,
}

#[derive(Default)]
struct HeadlessState {
    buffers: Allocator<EmulatedBuffer>,
    bindings: HashMap<BufferTarget, Handle>,
    programs: Allocator<EmulatedProgram>,
    current_program: Option<Handle>,
    enabled_attributes: BTreeSet<u32>,
    attribute_pointers: HashMap<u32, AttributePointer>,
    draw_calls: Vec<DrawCall>,
    matrix_uploads: Vec<MatrixUpload>,
    int_uploads: Vec<(HeadlessUniform, i32)>,
    active_texture_unit: u32,
    bound_textures: HashMap<u32, u32>,
    next_vertex_array: u32,
    bound_vertex_array: Option<u32>,
    capabilities: HashSet<Capability>,
    depth_function: Option<DepthFunction>,
    clear_color: Vec4,
    clear_count: usize,
    viewport: (i32, i32, i32, i32),
    errors: VecDeque<u32>,
    extensions: HashSet<String>,
    /// Emulate a pre-4.4 context without `GL_ARB_buffer_storage`
    no_buffer_storage: bool,
}

impl HeadlessState {
    fn raise(&mut self, error: GlError) {
        log::trace!("headless backend raised {}", error);
        self.errors.push_back(error.to_gl());
    }

    /// The buffer bound to `target`, raising `GL_INVALID_OPERATION` when
    /// nothing is bound, as a driver would
    fn bound_buffer_mut(&mut self, target: BufferTarget) -> Option<&mut EmulatedBuffer> {
        let Some(handle) = self.bindings.get(&target).copied() else {
            self.raise(GlError::InvalidOperation);
            return None;
        };
        self.buffers.get_mut(handle)
    }
}

/// Graphics backend without a GPU. See the module docs.
#[derive(Default)]
pub struct HeadlessBackend {
    state: RefCell<HeadlessState>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend advertising the given extensions
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        backend.state.borrow_mut().extensions = extensions.into_iter().map(Into::into).collect();
        backend
    }

    /// Backend emulating an OpenGL 3.3 context: immutable storage calls and
    /// queries raise errors instead of succeeding
    pub fn without_buffer_storage() -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().no_buffer_storage = true;
        backend
    }

    /// Queue an error as if the driver had reported it
    pub fn inject_error(&self, error: GlError) {
        self.state.borrow_mut().errors.push_back(error.to_gl());
    }

    pub fn pending_errors(&self) -> Vec<GlError> {
        self.state
            .borrow()
            .errors
            .iter()
            .filter_map(|code| GlError::from_gl(*code))
            .collect()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn is_buffer_live(&self, buffer: Handle) -> bool {
        self.state.borrow().buffers.is_live(buffer)
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<Handle> {
        self.state.borrow().bindings.get(&target).copied()
    }

    pub fn live_program_count(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn current_program(&self) -> Option<Handle> {
        self.state.borrow().current_program
    }

    pub fn enabled_attributes(&self) -> Vec<u32> {
        self.state.borrow().enabled_attributes.iter().copied().collect()
    }

    pub fn attribute_pointer(&self, index: u32) -> Option<AttributePointer> {
        self.state.borrow().attribute_pointers.get(&index).copied()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draw_calls.clone()
    }

    pub fn last_draw_call(&self) -> Option<DrawCall> {
        self.state.borrow().draw_calls.last().cloned()
    }

    pub fn matrix_uploads(&self) -> Vec<MatrixUpload> {
        self.state.borrow().matrix_uploads.clone()
    }

    pub fn int_uploads(&self) -> Vec<(HeadlessUniform, i32)> {
        self.state.borrow().int_uploads.clone()
    }

    pub fn bound_texture(&self, unit: u32) -> Option<u32> {
        self.state.borrow().bound_textures.get(&unit).copied()
    }

    pub fn bound_vertex_array(&self) -> Option<u32> {
        self.state.borrow().bound_vertex_array
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    pub fn depth_function(&self) -> Option<DepthFunction> {
        self.state.borrow().depth_function
    }

    pub fn current_clear_color(&self) -> Vec4 {
        self.state.borrow().clear_color
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clear_count
    }

    pub fn current_viewport(&self) -> (i32, i32, i32, i32) {
        self.state.borrow().viewport
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Buffer = Handle;
    type Program = Handle;
    type UniformLocation = HeadlessUniform;
    type Texture = u32;
    type VertexArray = u32;

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        let mut state = self.state.borrow_mut();
        Ok(state.buffers.allocate(EmulatedBuffer {
            data: Vec::new(),
            storage: EmulatedStorage::Unallocated,
        }))
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        let mut state = self.state.borrow_mut();
        // Deleting an unknown name is silently ignored by GL
        if state.buffers.free(buffer).is_some() {
            state.bindings.retain(|_, bound| *bound != buffer);
        }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(handle) if !state.buffers.is_live(handle) => {
                state.raise(GlError::InvalidOperation);
            }
            Some(handle) => {
                state.bindings.insert(target, handle);
            }
            None => {
                state.bindings.remove(&target);
            }
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer_mut(target) else {
            return;
        };
        if let EmulatedStorage::Immutable(_) = buffer.storage {
            state.raise(GlError::InvalidOperation);
            return;
        }
        buffer.data = data.to_vec();
        buffer.storage = EmulatedStorage::Mutable(usage);
    }

    fn buffer_storage(&self, target: BufferTarget, data: &[u8], flags: StorageFlags) {
        let mut state = self.state.borrow_mut();
        if state.no_buffer_storage {
            state.raise(GlError::InvalidOperation);
            return;
        }
        let Some(buffer) = state.bound_buffer_mut(target) else {
            return;
        };
        if let EmulatedStorage::Immutable(_) = buffer.storage {
            state.raise(GlError::InvalidOperation);
            return;
        }
        buffer.data = data.to_vec();
        buffer.storage = EmulatedStorage::Immutable(flags);
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer_mut(target) else {
            return;
        };
        if let EmulatedStorage::Immutable(flags) = buffer.storage {
            if !flags.contains(StorageFlags::DYNAMIC_STORAGE) {
                state.raise(GlError::InvalidOperation);
                return;
            }
        }
        let end = offset + data.len();
        if end > buffer.data.len() {
            state.raise(GlError::InvalidValue);
            return;
        }
        buffer.data[offset..end].copy_from_slice(data);
    }

    fn get_buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &mut [u8]) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer_mut(target) else {
            return;
        };
        let end = offset + data.len();
        if end > buffer.data.len() {
            state.raise(GlError::InvalidValue);
            return;
        }
        data.copy_from_slice(&buffer.data[offset..end]);
    }

    fn get_buffer_parameter(&self, target: BufferTarget, parameter: BufferParameter) -> i32 {
        let mut state = self.state.borrow_mut();
        if state.no_buffer_storage
            && matches!(
                parameter,
                BufferParameter::ImmutableStorage | BufferParameter::StorageFlags
            )
        {
            state.raise(GlError::InvalidEnum);
            return 0;
        }
        let Some(buffer) = state.bound_buffer_mut(target) else {
            return 0;
        };
        match (parameter, buffer.storage) {
            (BufferParameter::Size, _) => buffer.data.len() as i32,
            (BufferParameter::Usage, EmulatedStorage::Mutable(usage)) => usage.to_gl() as i32,
            // GL reports the initial usage for never-populated and immutable storage
            (BufferParameter::Usage, _) => BufferUsage::StaticDraw.to_gl() as i32,
            (BufferParameter::ImmutableStorage, EmulatedStorage::Immutable(_)) => 1,
            (BufferParameter::ImmutableStorage, _) => 0,
            (BufferParameter::StorageFlags, EmulatedStorage::Immutable(flags)) => {
                flags.bits() as i32
            }
            (BufferParameter::StorageFlags, _) => 0,
        }
    }

    fn supports_buffer_storage(&self) -> bool {
        !self.state.borrow().no_buffer_storage
    }

    fn compile_program(
        &self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, ShaderError> {
        if vertex_src.trim().is_empty() || fragment_src.trim().is_empty() {
            return Err(ShaderError::CompilationError(
                "empty shader source".to_string(),
            ));
        }
        let mut state = self.state.borrow_mut();
        Ok(state.programs.allocate(EmulatedProgram {
            source: format!("{}\n{}", vertex_src, fragment_src),
        }))
    }

    fn delete_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        if state.programs.free(program).is_some() && state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        let mut state = self.state.borrow_mut();
        match program {
            Some(handle) if !state.programs.is_live(handle) => {
                state.raise(GlError::InvalidOperation);
            }
            _ => state.current_program = program,
        }
    }

    /// A uniform exists if the program source mentions its name
    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let state = self.state.borrow();
        let emulated = state.programs.get(program)?;
        emulated
            .source
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| word == name)
            .then(|| HeadlessUniform {
                program,
                name: name.to_string(),
            })
    }

    fn uniform_matrix_4(&self, location: &Self::UniformLocation, value: &Mat4) {
        let mut state = self.state.borrow_mut();
        if state.current_program != Some(location.program) {
            state.raise(GlError::InvalidOperation);
            return;
        }
        state.matrix_uploads.push(MatrixUpload {
            uniform: location.clone(),
            value: *value,
        });
    }

    fn uniform_i32(&self, location: &Self::UniformLocation, value: i32) {
        let mut state = self.state.borrow_mut();
        if state.current_program != Some(location.program) {
            state.raise(GlError::InvalidOperation);
            return;
        }
        state.int_uploads.push((location.clone(), value));
    }

    fn active_texture_unit(&self, unit: u32) {
        self.state.borrow_mut().active_texture_unit = unit;
    }

    fn bind_texture_2d(&self, texture: Option<Self::Texture>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_texture_unit;
        match texture {
            Some(texture) => state.bound_textures.insert(unit, texture),
            None => state.bound_textures.remove(&unit),
        };
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        let mut state = self.state.borrow_mut();
        state.next_vertex_array += 1;
        Ok(state.next_vertex_array)
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        let mut state = self.state.borrow_mut();
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array;
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.state.borrow_mut().enabled_attributes.insert(index);
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        self.state.borrow_mut().enabled_attributes.remove(&index);
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let mut state = self.state.borrow_mut();
        if !(1..=4).contains(&size) {
            state.raise(GlError::InvalidValue);
            return;
        }
        let buffer = state.bindings.get(&BufferTarget::Array).copied();
        state.attribute_pointers.insert(
            index,
            AttributePointer {
                size,
                normalized,
                stride,
                offset,
                buffer,
            },
        );
    }

    fn draw_arrays(&self, mode: PrimitiveMode, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        if first < 0 || count < 0 {
            state.raise(GlError::InvalidValue);
            return;
        }
        let call = DrawCall {
            mode,
            first,
            count,
            program: state.current_program,
            enabled_attributes: state.enabled_attributes.iter().copied().collect(),
            array_buffer: state.bindings.get(&BufferTarget::Array).copied(),
        };
        state.draw_calls.push(call);
    }

    fn clear_color(&self, color: Vec4) {
        self.state.borrow_mut().clear_color = color;
    }

    fn clear(&self) {
        self.state.borrow_mut().clear_count += 1;
    }

    fn enable(&self, capability: Capability) {
        self.state.borrow_mut().capabilities.insert(capability);
    }

    fn depth_func(&self, function: DepthFunction) {
        self.state.borrow_mut().depth_function = Some(function);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        if width < 0 || height < 0 {
            state.raise(GlError::InvalidValue);
            return;
        }
        state.viewport = (x, y, width, height);
    }

    fn get_error(&self) -> u32 {
        self.state
            .borrow_mut()
            .errors
            .pop_front()
            .unwrap_or(glow::NO_ERROR)
    }

    fn supported_extensions(&self) -> HashSet<String> {
        self.state.borrow().extensions.clone()
    }

    fn get_parameter_string(&self, parameter: DriverString) -> String {
        match parameter {
            DriverString::Version if self.state.borrow().no_buffer_storage => {
                "3.3 (headless)".to_string()
            }
            DriverString::Version => "4.5 (headless)".to_string(),
            DriverString::Renderer => "proto_gl headless".to_string(),
            DriverString::Vendor => "proto_gl".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_target_reports_invalid_operation() {
        let gl = HeadlessBackend::new();
        gl.buffer_data(BufferTarget::Array, &[1, 2, 3], BufferUsage::StaticDraw);
        assert_eq!(gl.get_error(), GlError::InvalidOperation.to_gl());
        assert_eq!(gl.get_error(), glow::NO_ERROR);
    }

    #[test]
    fn test_deleting_a_buffer_unbinds_it() {
        let gl = HeadlessBackend::new();
        let buffer = GraphicsBackend::create_buffer(&gl).unwrap();
        gl.bind_buffer(BufferTarget::Uniform, Some(buffer));
        assert_eq!(gl.bound_buffer(BufferTarget::Uniform), Some(buffer));

        gl.delete_buffer(buffer);
        assert_eq!(gl.bound_buffer(BufferTarget::Uniform), None);
        assert_eq!(gl.live_buffer_count(), 0);
    }

    #[test]
    fn test_immutable_storage_rejects_writes_without_dynamic_flag() {
        let gl = HeadlessBackend::new();
        let buffer = GraphicsBackend::create_buffer(&gl).unwrap();
        gl.bind_buffer(BufferTarget::Array, Some(buffer));
        gl.buffer_storage(BufferTarget::Array, &[0; 8], StorageFlags::MAP_READ);

        gl.buffer_sub_data(BufferTarget::Array, 0, &[1; 4]);
        assert_eq!(gl.pending_errors(), vec![GlError::InvalidOperation]);
    }

    #[test]
    fn test_storage_queries_fail_without_buffer_storage() {
        let gl = HeadlessBackend::without_buffer_storage();
        assert!(!gl.supports_buffer_storage());
        let buffer = GraphicsBackend::create_buffer(&gl).unwrap();
        gl.bind_buffer(BufferTarget::Array, Some(buffer));

        gl.get_buffer_parameter(BufferTarget::Array, BufferParameter::ImmutableStorage);
        gl.buffer_storage(BufferTarget::Array, &[0; 8], StorageFlags::empty());
        assert_eq!(
            gl.pending_errors(),
            vec![GlError::InvalidEnum, GlError::InvalidOperation]
        );
        assert_eq!(
            gl.get_buffer_parameter(BufferTarget::Array, BufferParameter::Size),
            0
        );
    }

    #[test]
    fn test_uniform_lookup_matches_whole_words() {
        let gl = HeadlessBackend::new();
        let program = gl
            .compile_program("uniform mat4 MVP;", "uniform sampler2D textureSampler;")
            .unwrap();
        assert!(gl.get_uniform_location(program, "MVP").is_some());
        assert!(gl.get_uniform_location(program, "MV").is_none());
    }
}
