use glam::{Affine3A, EulerRot, Mat4, Quat, Vec3, Vec3A};

/// Helper data structure to build model matrices
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformMatrix {
    /// Internal matrix representation
    matrix: Affine3A,
}

impl Default for TransformMatrix {
    fn default() -> Self {
        TransformMatrix {
            matrix: Affine3A::IDENTITY,
        }
    }
}

impl TransformMatrix {
    pub fn from_translation(translation: Vec3) -> Self {
        TransformMatrix {
            matrix: Affine3A::from_translation(translation),
        }
    }

    /// Get the transformation matrix corresponding to this transform
    #[inline(always)]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from(self.matrix)
    }

    #[inline(always)]
    pub fn translation(&self) -> Vec3 {
        self.matrix.translation.into()
    }

    pub fn translate(&mut self, translation: Vec3) {
        self.matrix.translation += Vec3A::from(translation);
    }

    /// Rotate around the local origin, keeping the current translation.
    /// Angles are in degrees, applied in XYZ order.
    pub fn rotate(&mut self, euler_degs: Vec3) {
        let old_translation = self.matrix.translation;
        self.matrix.translation = Vec3A::ZERO;
        self.matrix = Affine3A::from_quat(Quat::from_euler(
            EulerRot::XYZ,
            euler_degs.x.to_radians(),
            euler_degs.y.to_radians(),
            euler_degs.z.to_radians(),
        )) * self.matrix;
        self.matrix.translation = old_translation;
    }

    pub fn scale(&mut self, scale: Vec3) {
        self.matrix *= Affine3A::from_scale(scale);
    }
}
