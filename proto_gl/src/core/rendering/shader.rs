use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::core::platform::backend::GraphicsBackend;
use crate::core::utils::handle::{Allocator, Handle};

/// Name of the uniform receiving the combined projection * view * model matrix
pub const TRANSFORM_UNIFORM: &str = "MVP";
/// Name of the sampler uniform of textured shaders
pub const TEXTURE_SAMPLER_UNIFORM: &str = "textureSampler";

pub type ShaderHandle = Handle;

/// Possible attribute and uniform data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDataType {
    None,
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
    Int,
    Int2,
    Int3,
    Int4,
    Bool,
}

impl ShaderDataType {
    /// Size in bytes for this data type
    pub fn get_size(&self) -> u32 {
        match self {
            ShaderDataType::None => 0,
            ShaderDataType::Float | ShaderDataType::Int => 4,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2 * 4,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3 * 4,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4 * 4,
            ShaderDataType::Mat3 => 3 * 3 * 4,
            ShaderDataType::Mat4 => 4 * 4 * 4,
            ShaderDataType::Bool => 1,
        }
    }

    pub fn get_component_count(&self) -> u32 {
        match self {
            ShaderDataType::None => 0,
            ShaderDataType::Float | ShaderDataType::Int | ShaderDataType::Bool => 1,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4,
            ShaderDataType::Mat3 => 3 * 3,
            ShaderDataType::Mat4 => 4 * 4,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            ShaderDataType::Float
                | ShaderDataType::Float2
                | ShaderDataType::Float3
                | ShaderDataType::Float4
                | ShaderDataType::Mat3
                | ShaderDataType::Mat4
        )
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    /// The driver refused to hand out a program or shader object
    #[error("could not create shader object: {0}")]
    ResourceCreation(String),
    /// Could not compile this shader
    #[error("shader compilation failed: {0}")]
    CompilationError(String),
    #[error("program linking failed: {0}")]
    LinkError(String),
    /// Colliding name of the uniform
    #[error("uniform '{uniform_name}' is already registered on shader '{shader_name}'")]
    UniformAlreadyExists {
        shader_name: String,
        uniform_name: String,
    },
    /// The linked program has no active uniform with that name
    #[error("shader '{shader_name}' has no active uniform '{uniform_name}'. Did you forget to USE it in the shader?")]
    UniformNotFound {
        shader_name: String,
        uniform_name: String,
    },
    #[error("shader handle {0} does not refer to a live shader")]
    StaleHandle(ShaderHandle),
}

/// A linked program and the uniform locations registered on it
pub struct Shader<B: GraphicsBackend> {
    name: String,
    program: B::Program,
    uniforms: HashMap<String, B::UniformLocation>,
}

impl<B: GraphicsBackend> Shader<B> {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn program(&self) -> B::Program {
        self.program
    }

    /// Location of a uniform previously registered with [ShaderLibrary::add_uniform]
    pub fn uniform(&self, name: &str) -> Option<&B::UniformLocation> {
        self.uniforms.get(name)
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }
}

/// Arena of compiled shaders.
///
/// Objects keep a [ShaderHandle] into the library instead of a pointer to
/// the shader. A reloaded shader keeps its handle; a destroyed one turns
/// every outstanding handle stale, which rendering reports as an error.
pub struct ShaderLibrary<B: GraphicsBackend> {
    gl: Rc<B>,
    shaders: Allocator<Shader<B>>,
}

impl<B: GraphicsBackend> ShaderLibrary<B> {
    pub fn new(gl: Rc<B>) -> Self {
        ShaderLibrary {
            gl,
            shaders: Allocator::new(),
        }
    }

    pub fn create(
        &mut self,
        name: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        let program = self.gl.compile_program(vertex_src, fragment_src)?;
        log::debug!("Compiled shader '{}'", name);

        Ok(self.shaders.allocate(Shader {
            name: name.to_string(),
            program,
            uniforms: HashMap::new(),
        }))
    }

    pub fn add_uniform(&mut self, handle: ShaderHandle, name: &str) -> Result<(), ShaderError> {
        let shader = self
            .shaders
            .get_mut(handle)
            .ok_or(ShaderError::StaleHandle(handle))?;

        if shader.uniforms.contains_key(name) {
            return Err(ShaderError::UniformAlreadyExists {
                shader_name: shader.name.clone(),
                uniform_name: name.to_string(),
            });
        }

        let location = self
            .gl
            .get_uniform_location(shader.program, name)
            .ok_or_else(|| ShaderError::UniformNotFound {
                shader_name: shader.name.clone(),
                uniform_name: name.to_string(),
            })?;
        shader.uniforms.insert(name.to_string(), location);
        Ok(())
    }

    pub fn add_uniforms(&mut self, handle: ShaderHandle, names: &[&str]) -> Result<(), ShaderError> {
        for name in names {
            self.add_uniform(handle, name)?;
        }
        Ok(())
    }

    #[inline(always)]
    pub fn get(&self, handle: ShaderHandle) -> Option<&Shader<B>> {
        self.shaders.get(handle)
    }

    #[inline(always)]
    pub fn contains(&self, handle: ShaderHandle) -> bool {
        self.shaders.is_live(handle)
    }

    pub fn find_by_name(&self, name: &str) -> Option<ShaderHandle> {
        self.shaders
            .iter()
            .find(|(_, shader)| shader.name == name)
            .map(|(handle, _)| handle)
    }

    /// Recompile the shader behind `handle` in place. Registered uniforms are
    /// looked up again in the new program. On failure the old program stays.
    pub fn reload(
        &mut self,
        handle: ShaderHandle,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<(), ShaderError> {
        if !self.shaders.is_live(handle) {
            return Err(ShaderError::StaleHandle(handle));
        }
        let program = self.gl.compile_program(vertex_src, fragment_src)?;

        let Some(shader) = self.shaders.get_mut(handle) else {
            self.gl.delete_program(program);
            return Err(ShaderError::StaleHandle(handle));
        };

        let mut uniforms = HashMap::with_capacity(shader.uniforms.len());
        for name in shader.uniforms.keys() {
            match self.gl.get_uniform_location(program, name) {
                Some(location) => {
                    uniforms.insert(name.clone(), location);
                }
                None => {
                    self.gl.delete_program(program);
                    return Err(ShaderError::UniformNotFound {
                        shader_name: shader.name.clone(),
                        uniform_name: name.clone(),
                    });
                }
            }
        }

        self.gl.delete_program(shader.program);
        shader.program = program;
        shader.uniforms = uniforms;
        log::info!("Reloaded shader '{}'", shader.name);
        Ok(())
    }

    pub fn destroy(&mut self, handle: ShaderHandle) -> Result<(), ShaderError> {
        let shader = self
            .shaders
            .free(handle)
            .ok_or(ShaderError::StaleHandle(handle))?;
        self.gl.delete_program(shader.program);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

impl<B: GraphicsBackend> Drop for ShaderLibrary<B> {
    fn drop(&mut self) {
        for (_, shader) in self.shaders.iter() {
            self.gl.delete_program(shader.program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::headless::HeadlessBackend;

    const VERTEX: &str = "uniform mat4 MVP; void main() {}";
    const FRAGMENT: &str = "void main() {}";

    #[test]
    fn test_uniform_registration() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut library = ShaderLibrary::new(gl.clone());
        let handle = library.create("plain", VERTEX, FRAGMENT).unwrap();

        library.add_uniform(handle, TRANSFORM_UNIFORM).unwrap();
        assert!(library.get(handle).unwrap().uniform(TRANSFORM_UNIFORM).is_some());

        assert!(matches!(
            library.add_uniform(handle, TRANSFORM_UNIFORM),
            Err(ShaderError::UniformAlreadyExists { .. })
        ));
        assert!(matches!(
            library.add_uniform(handle, TEXTURE_SAMPLER_UNIFORM),
            Err(ShaderError::UniformNotFound { .. })
        ));
    }

    #[test]
    fn test_destroyed_handle_goes_stale() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut library = ShaderLibrary::new(gl.clone());
        let handle = library.create("plain", VERTEX, FRAGMENT).unwrap();
        assert_eq!(library.find_by_name("plain"), Some(handle));

        library.destroy(handle).unwrap();
        assert_eq!(gl.live_program_count(), 0);
        assert!(library.get(handle).is_none());
        assert!(matches!(
            library.destroy(handle),
            Err(ShaderError::StaleHandle(_))
        ));
    }

    #[test]
    fn test_reload_keeps_handle_and_uniforms() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut library = ShaderLibrary::new(gl.clone());
        let handle = library.create("plain", VERTEX, FRAGMENT).unwrap();
        library.add_uniform(handle, TRANSFORM_UNIFORM).unwrap();
        let old_program = library.get(handle).unwrap().program();

        library
            .reload(handle, "uniform mat4 MVP; // v2", FRAGMENT)
            .unwrap();
        let new_program = library.get(handle).unwrap().program();
        assert_ne!(new_program, old_program);
        assert!(library.get(handle).unwrap().uniform(TRANSFORM_UNIFORM).is_some());
        assert_eq!(gl.live_program_count(), 1);

        // A program that lost the uniform is rejected, the old one stays
        assert!(matches!(
            library.reload(handle, "void main() {}", FRAGMENT),
            Err(ShaderError::UniformNotFound { .. })
        ));
        assert_eq!(library.get(handle).unwrap().program(), new_program);
        assert_eq!(gl.live_program_count(), 1);
    }
}
