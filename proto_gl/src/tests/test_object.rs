// -- < Testing renderable objects > ---------------------------
#[cfg(test)]
pub mod object_test {
    use glam::{Mat4, Vec2, Vec3};

    use crate::core::assets_management::models::ModelError;
    use crate::core::platform::backend::{BufferUsage, PrimitiveMode};
    use crate::core::rendering::drawable::Drawable;
    use crate::core::rendering::object::{Object, TexturedObject, POSITION_SLOT, UV_SLOT};
    use crate::core::rendering::shader::{ShaderLibrary, TEXTURE_SAMPLER_UNIFORM, TRANSFORM_UNIFORM};
    use crate::core::rendering::RenderError;

    use super::super::shared_fixtures::fixtures::*;

    const TEXTURE: u32 = 42;

    #[test]
    fn test_render_issues_one_triangle_list_draw() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = plain_shader(&mut shaders);
        let object = Object::from_vertices(gl.clone(), &triangle(), shader).unwrap();

        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        object.render(&shaders, &transform).unwrap();

        let draw = gl.last_draw_call().unwrap();
        assert_eq!(draw.mode, PrimitiveMode::Triangles);
        assert_eq!((draw.first, draw.count), (0, 3));
        assert_eq!(draw.program, Some(shaders.get(shader).unwrap().program()));
        assert_eq!(draw.enabled_attributes, vec![POSITION_SLOT]);
        assert_eq!(draw.array_buffer, Some(object.vertex_buffer().id()));

        let upload = gl.matrix_uploads().pop().unwrap();
        assert_eq!(upload.uniform.name, TRANSFORM_UNIFORM);
        assert_eq!(upload.value, transform);

        let pointer = gl.attribute_pointer(POSITION_SLOT).unwrap();
        assert_eq!((pointer.size, pointer.stride, pointer.offset), (3, 0, 0));
        assert!(!pointer.normalized);
        assert_eq!(pointer.buffer, Some(object.vertex_buffer().id()));

        // Attribute state does not leak into later draws
        assert!(gl.enabled_attributes().is_empty());
        assert!(gl.pending_errors().is_empty());
    }

    #[test]
    fn test_empty_object_draws_zero_vertices() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = plain_shader(&mut shaders);
        let object = Object::new(gl.clone(), shader).unwrap();

        object.render(&shaders, &Mat4::IDENTITY).unwrap();

        assert_eq!(gl.last_draw_call().unwrap().count, 0);
        assert!(gl.enabled_attributes().is_empty());
        assert!(gl.pending_errors().is_empty());
    }

    #[test]
    fn test_streamed_geometry_sets_the_vertex_count() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = plain_shader(&mut shaders);
        let mut object = Object::new(gl.clone(), shader).unwrap();

        let quad = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::Y,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
        ];
        object
            .vertex_buffer_mut()
            .set_mutable_data(&quad, BufferUsage::DynamicDraw)
            .unwrap();
        object.render(&shaders, &Mat4::IDENTITY).unwrap();

        assert_eq!(gl.last_draw_call().unwrap().count, 6);
    }

    #[test]
    fn test_stale_shader_fails_before_touching_gl() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = plain_shader(&mut shaders);
        let object = Object::from_vertices(gl.clone(), &triangle(), shader).unwrap();

        shaders.destroy(shader).unwrap();
        assert!(matches!(
            object.render(&shaders, &Mat4::IDENTITY),
            Err(RenderError::StaleShader(handle)) if handle == shader
        ));
        assert!(gl.draw_calls().is_empty());
        assert_eq!(gl.current_program(), None);
    }

    #[test]
    fn test_missing_transform_uniform_fails() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        // Compiled but the uniform was never registered
        let shader = shaders.create("bare", PLAIN_VERTEX, PLAIN_FRAGMENT).unwrap();
        let object = Object::from_vertices(gl.clone(), &triangle(), shader).unwrap();

        match object.render(&shaders, &Mat4::IDENTITY) {
            Err(RenderError::MissingUniform { shader, uniform }) => {
                assert_eq!(shader, "bare");
                assert_eq!(uniform, TRANSFORM_UNIFORM);
            }
            other => panic!("expected a missing uniform, got {:?}", other),
        }
        assert!(gl.draw_calls().is_empty());
        assert!(gl.matrix_uploads().is_empty());
    }

    #[test]
    fn test_switching_shaders() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let plain = plain_shader(&mut shaders);
        let textured = textured_shader(&mut shaders);
        let mut object = Object::from_vertices(gl.clone(), &triangle(), plain).unwrap();

        object.set_shader(textured);
        assert_eq!(object.shader(), textured);
        object.render(&shaders, &Mat4::IDENTITY).unwrap();
        assert_eq!(
            gl.last_draw_call().unwrap().program,
            Some(shaders.get(textured).unwrap().program())
        );
    }

    #[test]
    fn test_model_matrix() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = plain_shader(&mut shaders);
        let mut object = Object::new(gl.clone(), shader).unwrap();
        assert_eq!(object.model_matrix(), Mat4::IDENTITY);

        let model = Mat4::from_scale(Vec3::splat(2.0));
        object.set_model_matrix(model);
        assert_eq!(object.model_matrix(), model);
    }

    #[test]
    fn test_object_from_obj_file() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = plain_shader(&mut shaders);

        let path = temp_obj_file("object_triangle.obj", TRIANGLE_OBJ);
        let object = Object::from_obj_file(gl.clone(), &path, shader).unwrap();
        assert_eq!(object.vertex_buffer().read_data().unwrap(), triangle());

        assert!(matches!(
            Object::from_obj_file(gl.clone(), path.with_file_name("nope.obj"), shader),
            Err(RenderError::Model(ModelError::Io { .. }))
        ));
    }

    #[test]
    fn test_textured_render() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = textured_shader(&mut shaders);
        let uvs = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let object = TexturedObject::from_streams(gl.clone(), &triangle(), &uvs, shader, TEXTURE).unwrap();

        object.render(&shaders, &Mat4::IDENTITY).unwrap();

        let draw = gl.last_draw_call().unwrap();
        assert_eq!(draw.count, 3);
        assert_eq!(draw.enabled_attributes, vec![POSITION_SLOT, UV_SLOT]);
        assert_eq!(gl.bound_texture(0), Some(TEXTURE));

        let (sampler, unit) = gl.int_uploads().pop().unwrap();
        assert_eq!(sampler.name, TEXTURE_SAMPLER_UNIFORM);
        assert_eq!(unit, 0);

        let positions = gl.attribute_pointer(POSITION_SLOT).unwrap();
        assert_eq!(positions.size, 3);
        assert_eq!(positions.buffer, Some(object.vertex_buffer().id()));
        let uv_pointer = gl.attribute_pointer(UV_SLOT).unwrap();
        assert_eq!((uv_pointer.size, uv_pointer.stride), (2, 0));
        assert_eq!(uv_pointer.buffer, Some(object.uv_buffer().id()));

        assert!(gl.enabled_attributes().is_empty());
        assert!(gl.pending_errors().is_empty());
    }

    #[test]
    fn test_textured_streams_must_match() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = textured_shader(&mut shaders);

        assert!(matches!(
            TexturedObject::from_streams(gl.clone(), &triangle(), &[Vec2::ZERO], shader, TEXTURE),
            Err(RenderError::StreamMismatch {
                positions: 3,
                uvs: 1
            })
        ));

        // Streams edited apart after construction are caught at draw time
        let uvs = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let mut object = TexturedObject::from_streams(gl.clone(), &triangle(), &uvs, shader, TEXTURE).unwrap();
        object
            .uv_buffer_mut()
            .set_mutable_data(&uvs[..2], BufferUsage::StaticDraw)
            .unwrap();
        assert!(matches!(
            object.render(&shaders, &Mat4::IDENTITY),
            Err(RenderError::StreamMismatch {
                positions: 3,
                uvs: 2
            })
        ));
        assert!(gl.draw_calls().is_empty());
    }

    #[test]
    fn test_textured_object_needs_a_sampler() {
        let gl = backend();
        let mut shaders = ShaderLibrary::new(gl.clone());
        let shader = plain_shader(&mut shaders);
        let path = temp_obj_file("textured_triangle.obj", TRIANGLE_OBJ);
        let object = TexturedObject::from_obj_file(gl.clone(), &path, shader, TEXTURE).unwrap();
        assert_eq!(object.uv_buffer().len(), 3);

        assert!(matches!(
            object.render(&shaders, &Mat4::IDENTITY),
            Err(RenderError::MissingUniform { .. })
        ));
        assert_eq!(gl.bound_texture(0), None);
    }
}
