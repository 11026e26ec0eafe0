// -- < Testing camera math > ---------------------------
#[cfg(test)]
pub mod camera_test {
    use approx::assert_relative_eq;
    use glam::{Mat4, Vec3, Vec4};

    use crate::core::math::Positioned;
    use crate::core::rendering::camera::*;

    #[test]
    fn test_defaults() {
        let camera = Camera::new();

        assert_eq!(camera.position(), Vec3::ZERO);
        assert_eq!(camera.direction(), LookDirection::Vector(Vec3::NEG_Z));
        assert_eq!(camera.up_vector(), Vec3::Y);
        assert_eq!(camera.field_of_view(), 90.0);
        assert_relative_eq!(camera.aspect_ratio(), 4.0 / 3.0);
        assert_eq!(camera.clipping_planes(), (0.1, 100.0));

        // Nothing is derived until the first update
        assert!(camera.matrices_stale());
        assert_eq!(camera.view_matrix(), Mat4::IDENTITY);
        assert_eq!(camera.projection_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_square_projection() {
        let mut camera = Camera::with_lens(90.0, 1.0).unwrap();
        camera.set_clipping_planes(0.1, 100.0).unwrap();
        camera.update_matrices().unwrap();

        let projection = camera.projection_matrix();
        assert!(projection.col(0).x > 0.0);
        assert!(projection.col(1).y > 0.0);
        // Right-handed: the perspective divide uses -z
        assert_eq!(projection.col(2).w, -1.0);
        // A 90 degree square frustum maps the edge at depth 1 to x = 1
        assert_relative_eq!(projection.col(0).x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(projection.col(1).y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_field_of_view_is_horizontal() {
        assert_relative_eq!(
            horizontal_to_vertical_fov(90.0, 1.0),
            90_f32.to_radians(),
            epsilon = 1e-6
        );
        // Wider than tall: the vertical angle is the smaller one
        let vertical = horizontal_to_vertical_fov(90.0, 2.0);
        assert_relative_eq!(vertical, 2.0 * 0.5_f32.atan(), epsilon = 1e-6);

        let mut camera = Camera::with_lens(90.0, 2.0).unwrap();
        camera.update_matrices().unwrap();
        let projection = camera.projection_matrix();
        // x scale is 1 / tan(fov_x / 2) whatever the aspect ratio
        assert_relative_eq!(projection.col(0).x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(projection.col(1).y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_view_looks_down_negative_z() {
        let mut camera = Camera::new();
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));
        camera.look_at(Vec3::ZERO);
        camera.update_matrices().unwrap();

        let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-6);

        // Point and vector conventions agree
        let point_view = camera.view_matrix();
        camera.set_direction(LookDirection::Vector(Vec3::new(0.0, 0.0, -3.0)));
        camera.update_matrices().unwrap();
        assert_relative_eq!(camera.view_matrix(), point_view, epsilon = 1e-6);
    }

    #[test]
    fn test_inverted_up_vector_flips_the_image() {
        let mut camera = Camera::new();
        camera.update_matrices().unwrap();
        let upright = camera.view_matrix().transform_point3(Vec3::new(0.0, 1.0, -1.0));

        camera.set_up_vector(Vec3::NEG_Y).unwrap();
        camera.update_matrices().unwrap();
        let flipped = camera.view_matrix().transform_point3(Vec3::new(0.0, 1.0, -1.0));

        assert_relative_eq!(upright.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(flipped.y, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_setters_mark_matrices_stale() {
        let mut camera = Camera::new();
        camera.update_matrices().unwrap();
        assert!(!camera.matrices_stale());

        camera.translate(Vec3::X);
        assert!(camera.matrices_stale());
        assert_eq!(camera.position(), Vec3::X);
        camera.update_matrices().unwrap();

        camera.set_aspect_ratio(16.0 / 9.0).unwrap();
        assert!(camera.matrices_stale());
        camera.update_matrices().unwrap();

        camera.set_field_of_view(60.0).unwrap();
        assert!(camera.matrices_stale());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let mut camera = Camera::new();

        for fov in [0.0, 180.0, -10.0, f32::NAN] {
            assert!(matches!(
                camera.set_field_of_view(fov),
                Err(CameraError::InvalidFieldOfView(_))
            ));
        }
        for aspect in [0.0, -1.0, f32::INFINITY] {
            assert!(matches!(
                camera.set_aspect_ratio(aspect),
                Err(CameraError::InvalidAspectRatio(_))
            ));
        }
        assert_eq!(
            camera.set_clipping_planes(1.0, 1.0),
            Err(CameraError::InvalidClippingPlanes { near: 1.0, far: 1.0 })
        );
        assert!(camera.set_clipping_planes(0.0, 10.0).is_err());
        assert_eq!(
            camera.set_up_vector(Vec3::ZERO),
            Err(CameraError::ZeroUpVector)
        );

        // Rejected values leave the camera untouched
        assert_eq!(camera.field_of_view(), DEFAULT_FIELD_OF_VIEW);
        assert_eq!(camera.clipping_planes(), (DEFAULT_NEAR_PLANE, DEFAULT_FAR_PLANE));
    }

    #[test]
    fn test_degenerate_views_are_rejected() {
        let mut camera = Camera::new();
        camera.look_at(Vec3::ZERO);
        assert!(matches!(
            camera.update_matrices(),
            Err(CameraError::DegenerateView { .. })
        ));

        camera.set_direction(LookDirection::Vector(Vec3::Y));
        assert!(matches!(
            camera.update_matrices(),
            Err(CameraError::DegenerateView { .. })
        ));
        assert!(camera.matrices_stale());
    }

    #[test]
    fn test_short_directions_are_accepted() {
        let mut camera = Camera::new();
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        camera.set_direction(LookDirection::Vector(Vec3::new(0.0, 0.0, -1e-4)));
        camera.update_matrices().unwrap();
        let short_view = camera.view_matrix();

        camera.set_direction(LookDirection::Vector(Vec3::NEG_Z));
        camera.update_matrices().unwrap();
        assert_relative_eq!(short_view, camera.view_matrix(), epsilon = 1e-5);

        // A target very close to the camera is still a valid direction
        camera.look_at(Vec3::new(1.0, 2.0, 3.0 - 1e-3));
        camera.update_matrices().unwrap();
        assert_relative_eq!(short_view, camera.view_matrix(), epsilon = 1e-4);

        camera.set_direction(LookDirection::Vector(Vec3::new(f32::NAN, 0.0, -1.0)));
        assert!(matches!(
            camera.update_matrices(),
            Err(CameraError::DegenerateView { .. })
        ));
    }

    #[test]
    fn test_view_projection_order() {
        let mut camera = Camera::new();
        camera.set_position(Vec3::new(0.0, 0.0, 2.0));
        camera.update_matrices().unwrap();

        assert_eq!(
            camera.view_projection(),
            camera.projection_matrix() * camera.view_matrix()
        );
        // The origin lands in the middle of the screen, inside the depth range
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }
}
