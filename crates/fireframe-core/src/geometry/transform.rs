use super::{Quaternion, Vec3};

pub const DEFAULT_SCALE: f64 = 200.0;
pub const DEFAULT_TRANSLATE_Z: f64 = 3.0;

/// Per-entity placement: projection scale, translation, orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub translation: Vec3,
    pub orientation: Quaternion,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            translation: Vec3::new(0.0, 0.0, DEFAULT_TRANSLATE_Z),
            orientation: Quaternion::IDENTITY,
        }
    }
}

impl Transform {
    /// Rotate by `dx` about X then `dy` about Y, in world space.
    ///
    /// Renormalizes every call; many small increments would otherwise drift
    /// off unit length.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.orientation
            .pre_multiply(Quaternion::from_euler_xy(dx, dy));
        self.orientation.normalize();
    }

    pub fn inc_scale(&mut self, amount: f64) {
        self.scale += amount;
    }

    pub fn set_translate_z(&mut self, z: f64) {
        self.translation.z = z;
    }

    pub fn inc_translate_z(&mut self, amount: f64) {
        self.translation.z += amount;
    }

    /// Model space to camera space: rotate, then translate.
    #[inline]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        self.orientation.rotate(v) + self.translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let t = Transform::default();
        assert_eq!(t.scale, 200.0);
        assert_eq!(t.translation, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(t.orientation, Quaternion::IDENTITY);
    }

    #[test]
    fn many_small_rotations_stay_unit() {
        let mut t = Transform::default();
        for _ in 0..100_000 {
            t.rotate(0.013, 0.029);
        }
        assert!((t.orientation.magnitude() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn increments() {
        let mut t = Transform::default();
        t.inc_scale(-50.0);
        t.inc_translate_z(1.0);
        assert_eq!(t.scale, 150.0);
        assert_eq!(t.translation.z, 4.0);
    }

    #[test]
    fn apply_translates_after_rotating() {
        let mut t = Transform::default();
        t.rotate(0.0, std::f64::consts::PI);
        let p = t.apply(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(-1.0, 0.0, 3.0)).length() < 1e-9);
    }
}
