//! Perspective camera.
//!
//! Conventions: right-handed world space, OpenGL clip space (z in [-1, 1]).
//! The field of view given to the camera is HORIZONTAL and in degrees; it is
//! converted once, in [horizontal_to_vertical_fov], to the vertical radians
//! the projection routine works with.

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::core::math::{Entity, Positioned};

/// Horizontal, in degrees
pub const DEFAULT_FIELD_OF_VIEW: f32 = 90.0;
pub const DEFAULT_ASPECT_RATIO: f32 = 4.0 / 3.0;
pub const DEFAULT_NEAR_PLANE: f32 = 0.1;
pub const DEFAULT_FAR_PLANE: f32 = 100.0;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CameraError {
    #[error("field of view must be strictly between 0 and 180 degrees, got {0}")]
    InvalidFieldOfView(f32),
    #[error("aspect ratio must be positive, got {0}")]
    InvalidAspectRatio(f32),
    #[error("clipping planes must satisfy 0 < near < far, got near = {near}, far = {far}")]
    InvalidClippingPlanes { near: f32, far: f32 },
    #[error("up vector must not be zero")]
    ZeroUpVector,
    /// Looking nowhere, or straight along the up vector
    #[error("camera looks along {forward} with up {up}, which defines no view")]
    DegenerateView { forward: Vec3, up: Vec3 },
}

/// Where the camera looks. Points are absolute world positions, vectors are
/// directions relative to the camera position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookDirection {
    Point(Vec3),
    Vector(Vec3),
}

impl Default for LookDirection {
    fn default() -> Self {
        LookDirection::Vector(Vec3::NEG_Z)
    }
}

/// Convert a horizontal field of view in degrees to the vertical field of
/// view in radians, for a viewport of the given aspect ratio (width / height)
pub fn horizontal_to_vertical_fov(fov_x_degrees: f32, aspect_ratio: f32) -> f32 {
    let half_x = fov_x_degrees.to_radians() * 0.5;
    2.0 * (half_x.tan() / aspect_ratio).atan()
}

#[derive(Debug, Clone)]
pub struct Camera {
    entity: Entity,
    direction: LookDirection,
    up_vector: Vec3,
    field_of_view_x: f32,
    aspect_ratio: f32,
    near_plane: f32,
    far_plane: f32,

    view_matrix: Mat4,
    projection_matrix: Mat4,
    stale: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            entity: Entity::default(),
            direction: LookDirection::default(),
            up_vector: Vec3::Y,
            field_of_view_x: DEFAULT_FIELD_OF_VIEW,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            near_plane: DEFAULT_NEAR_PLANE,
            far_plane: DEFAULT_FAR_PLANE,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            stale: true,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with the given horizontal field of view (degrees) and aspect ratio
    pub fn with_lens(field_of_view_x: f32, aspect_ratio: f32) -> Result<Self, CameraError> {
        let mut camera = Self::default();
        camera.set_field_of_view(field_of_view_x)?;
        camera.set_aspect_ratio(aspect_ratio)?;
        Ok(camera)
    }

    #[inline(always)]
    pub fn direction(&self) -> LookDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: LookDirection) {
        self.direction = direction;
        self.stale = true;
    }

    /// Look at a world position
    pub fn look_at(&mut self, target: Vec3) {
        self.set_direction(LookDirection::Point(target));
    }

    #[inline(always)]
    pub fn up_vector(&self) -> Vec3 {
        self.up_vector
    }

    /// A negated up vector gives an upside-down camera
    pub fn set_up_vector(&mut self, up_vector: Vec3) -> Result<(), CameraError> {
        if up_vector.length_squared() <= f32::EPSILON || !up_vector.is_finite() {
            return Err(CameraError::ZeroUpVector);
        }
        self.up_vector = up_vector.normalize();
        self.stale = true;
        Ok(())
    }

    /// Horizontal field of view, in degrees
    #[inline(always)]
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view_x
    }

    pub fn set_field_of_view(&mut self, degrees: f32) -> Result<(), CameraError> {
        if !(degrees > 0.0 && degrees < 180.0) {
            return Err(CameraError::InvalidFieldOfView(degrees));
        }
        self.field_of_view_x = degrees;
        self.stale = true;
        Ok(())
    }

    #[inline(always)]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) -> Result<(), CameraError> {
        if !(aspect_ratio > 0.0 && aspect_ratio.is_finite()) {
            return Err(CameraError::InvalidAspectRatio(aspect_ratio));
        }
        self.aspect_ratio = aspect_ratio;
        self.stale = true;
        Ok(())
    }

    #[inline(always)]
    pub fn clipping_planes(&self) -> (f32, f32) {
        (self.near_plane, self.far_plane)
    }

    pub fn set_clipping_planes(&mut self, near: f32, far: f32) -> Result<(), CameraError> {
        if !(near > 0.0 && near < far && far.is_finite()) {
            return Err(CameraError::InvalidClippingPlanes { near, far });
        }
        self.near_plane = near;
        self.far_plane = far;
        self.stale = true;
        Ok(())
    }

    /// True if a parameter changed since the last [Camera::update_matrices]
    #[inline(always)]
    pub fn matrices_stale(&self) -> bool {
        self.stale
    }

    /// Recompute the view and projection matrices. Call once per frame,
    /// before reading them.
    pub fn update_matrices(&mut self) -> Result<(), CameraError> {
        let position = self.entity.position();
        let forward = match self.direction {
            LookDirection::Point(target) => target - position,
            LookDirection::Vector(direction) => direction,
        };
        // Directions are scale-invariant, only zero or non-finite vectors are invalid
        let has_direction = forward.length_squared() > 0.0 && forward.is_finite();
        if !has_direction
            || forward.normalize().cross(self.up_vector).length_squared() <= f32::EPSILON
        {
            return Err(CameraError::DegenerateView {
                forward,
                up: self.up_vector,
            });
        }

        self.view_matrix = match self.direction {
            LookDirection::Point(target) => Mat4::look_at_rh(position, target, self.up_vector),
            LookDirection::Vector(direction) => {
                Mat4::look_to_rh(position, direction.normalize(), self.up_vector)
            }
        };
        self.projection_matrix = Mat4::perspective_rh_gl(
            horizontal_to_vertical_fov(self.field_of_view_x, self.aspect_ratio),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        );
        self.stale = false;
        Ok(())
    }

    /// World to camera space, as of the last update. Identity before the first one.
    #[inline(always)]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    /// Camera to clip space, as of the last update. Identity before the first one.
    #[inline(always)]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline(always)]
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }
}

impl Positioned for Camera {
    #[inline(always)]
    fn position(&self) -> Vec3 {
        self.entity.position()
    }

    fn set_position(&mut self, position: Vec3) {
        self.entity.set_position(position);
        self.stale = true;
    }
}
