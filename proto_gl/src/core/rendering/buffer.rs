use std::slice::Iter;

use crate::core::platform::backend::GraphicsBackend;
use crate::core::rendering::shader::ShaderDataType;

/// Describes how the vertices of one buffer are fed to consecutive
/// attribute slots of a shader
#[derive(Debug, Default, Clone)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn from_elements(elements: Vec<BufferElement>) -> Self {
        let mut layout = BufferLayout {
            elements,
            stride: 0,
        };

        layout.compute_offset_and_stride();

        layout
    }

    /// Three tightly packed, non-normalized floats per vertex
    pub fn positions() -> Self {
        Self::from_elements(vec![BufferElement::new(
            "position".to_string(),
            ShaderDataType::Float3,
            false,
        )])
    }

    /// Two tightly packed, non-normalized floats per vertex
    pub fn uvs() -> Self {
        Self::from_elements(vec![BufferElement::new(
            "uv".to_string(),
            ShaderDataType::Float2,
            false,
        )])
    }

    fn compute_offset_and_stride(&mut self) {
        let mut offset = 0;
        for element in self.elements.iter_mut() {
            element.offset = offset;
            offset += element.size;
        }

        self.stride = offset;
    }

    #[inline(always)]
    pub fn get_buffer_elements(&self) -> &[BufferElement] {
        &self.elements
    }

    #[inline(always)]
    pub fn get_stride(&self) -> u32 {
        self.stride
    }

    #[inline(always)]
    pub fn iter(&self) -> Iter<'_, BufferElement> {
        self.elements.iter()
    }

    /// Enable one attribute array per element, starting at `first_slot`, and
    /// point it at the buffer currently bound to the array target.
    ///
    /// A layout with a single element is described with stride 0, which GL
    /// reads as tightly packed.
    pub fn apply<B: GraphicsBackend>(&self, gl: &B, first_slot: u32) {
        let stride = if self.elements.len() == 1 {
            0
        } else {
            self.stride as i32
        };

        for (i, element) in self.elements.iter().enumerate() {
            let slot = first_slot + i as u32;
            debug_assert!(
                element.get_data_type().is_float(),
                "Only float attributes are supported, got {:?}",
                element.get_data_type()
            );
            gl.enable_vertex_attrib_array(slot);
            gl.vertex_attrib_pointer_f32(
                slot,
                element.get_component_count() as i32,
                element.is_normalized(),
                stride,
                element.get_offset() as i32,
            );
        }
    }

    /// Disable the attribute arrays enabled by [BufferLayout::apply]
    pub fn disable<B: GraphicsBackend>(&self, gl: &B, first_slot: u32) {
        for i in 0..self.elements.len() {
            gl.disable_vertex_attrib_array(first_slot + i as u32);
        }
    }
}

/// Describes a buffer element, part of the vertex data to send to a shader
#[derive(Debug, Clone)]
pub struct BufferElement {
    name: String,
    data_type: ShaderDataType,
    size: u32,
    offset: u32,
    normalized: bool,
}

impl BufferElement {
    pub fn new(name: String, data_type: ShaderDataType, normalized: bool) -> Self {
        BufferElement {
            size: data_type.get_size(),
            name,
            data_type,
            normalized,
            offset: 0,
        }
    }

    pub fn get_component_count(&self) -> u32 {
        self.data_type.get_component_count()
    }

    pub fn get_data_type(&self) -> ShaderDataType {
        self.data_type
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub fn get_offset(&self) -> u32 {
        self.offset
    }

    #[inline(always)]
    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::headless::HeadlessBackend;

    #[test]
    fn test_offsets_and_stride() {
        let layout = BufferLayout::from_elements(vec![
            BufferElement::new("position".into(), ShaderDataType::Float3, false),
            BufferElement::new("normal".into(), ShaderDataType::Float3, false),
            BufferElement::new("uv".into(), ShaderDataType::Float2, false),
        ]);

        let offsets: Vec<u32> = layout.iter().map(BufferElement::get_offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(layout.get_stride(), 32);
    }

    #[test]
    fn test_apply_then_disable_leaves_no_enabled_slot() {
        let gl = HeadlessBackend::new();
        let layout = BufferLayout::positions();

        layout.apply(&gl, 0);
        assert_eq!(gl.enabled_attributes(), vec![0]);
        let pointer = gl.attribute_pointer(0).unwrap();
        assert_eq!((pointer.size, pointer.stride, pointer.offset), (3, 0, 0));
        assert!(!pointer.normalized);

        layout.disable(&gl, 0);
        assert!(gl.enabled_attributes().is_empty());
    }
}
