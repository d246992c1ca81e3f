//! Local TRS transform shared by bind poses, dummies and keyframes

use glam::{Mat4, Quat, Vec3};

/// Maximum allowed deviation of a rotation quaternion's length from 1.0
pub const ROTATION_TOLERANCE: f32 = 1e-4;

/// Translation / rotation / scale relative to the parent bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Unit quaternion
    pub rotation: Quat,
    /// All components > 0
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Decompose an affine matrix (column-vector convention).
    ///
    /// A mirrored matrix decomposes to a negative scale component, which
    /// [`Transform::check`] rejects.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// Compose into a local-to-parent matrix (scale, then rotate, then translate)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Check the transform invariants, returning a reason on failure
    pub fn check(&self) -> Result<(), String> {
        if !self.translation.is_finite() {
            return Err(format!("translation {} is not finite", self.translation));
        }
        if !self.rotation.is_finite() {
            return Err(format!("rotation {} is not finite", self.rotation));
        }
        let length = self.rotation.length();
        if (length - 1.0).abs() > ROTATION_TOLERANCE {
            return Err(format!(
                "rotation {} is not normalized (length {})",
                self.rotation, length
            ));
        }
        if !self.scale.is_finite() || self.scale.min_element() <= 0.0 {
            return Err(format!("scale {} must be positive", self.scale));
        }
        Ok(())
    }

    /// Component-wise comparison, treating `q` and `-q` as the same rotation
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        let rotation_matches = self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
            || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff);
        rotation_matches
            && self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_valid() {
        assert!(Transform::IDENTITY.check().is_ok());
        assert_eq!(Transform::IDENTITY.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_matrix_roundtrip() {
        let original = Transform::new(
            Vec3::new(1.0, -2.0, 3.5),
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3),
            Vec3::new(1.0, 2.0, 0.5),
        );
        let decomposed = Transform::from_matrix(original.to_matrix());
        assert!(decomposed.abs_diff_eq(&original, 1e-5));
    }

    #[test]
    fn test_check_rejects_bad_components() {
        let unnormalized = Transform::new(Vec3::ZERO, Quat::from_xyzw(0.0, 0.0, 0.0, 2.0), Vec3::ONE);
        assert!(unnormalized.check().is_err());

        let zero_scale = Transform::new(Vec3::ZERO, Quat::IDENTITY, Vec3::new(1.0, 0.0, 1.0));
        assert!(zero_scale.check().is_err());

        let nan_translation = Transform::from_translation(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(nan_translation.check().is_err());
    }

    #[test]
    fn test_mirrored_matrix_is_rejected() {
        let mirrored = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        assert!(Transform::from_matrix(mirrored).check().is_err());
    }

    #[test]
    fn test_opposite_quaternions_compare_equal() {
        let a = Transform::new(Vec3::ZERO, Quat::from_rotation_z(1.0), Vec3::ONE);
        let b = Transform { rotation: -a.rotation, ..a };
        assert!(a.abs_diff_eq(&b, 1e-6));
    }
}
