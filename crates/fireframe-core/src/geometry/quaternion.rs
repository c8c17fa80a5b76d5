use std::ops::Mul;

use super::Vec3;

/// Below this magnitude a quaternion is treated as degenerate.
const DEGENERATE_MAGNITUDE: f64 = 1e-10;

/// Orientation as a unit quaternion `w + xi + yj + zk`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians about `axis`, which must be unit length.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Rotation about X by `angle_x` followed by rotation about Y by
    /// `angle_y`.
    pub fn from_euler_xy(angle_x: f64, angle_y: f64) -> Self {
        let qx = Self::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), angle_x);
        let qy = Self::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), angle_y);
        qy * qx
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit quaternion in the same direction; identity if degenerate.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mag = self.magnitude();
        if mag < DEGENERATE_MAGNITUDE {
            return Self::IDENTITY;
        }
        Self::new(self.w / mag, self.x / mag, self.y / mag, self.z / mag)
    }

    pub fn normalize(&mut self) {
        *self = self.normalized();
    }

    /// `self = q * self`: apply `q` in world space after the current
    /// orientation.
    pub fn pre_multiply(&mut self, q: Self) {
        *self = q * *self;
    }

    #[inline]
    fn vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Rotate `v`, assuming `self` is unit length.
    ///
    /// `t = 2 (q × v)`, `v' = v + w t + q × t`.
    #[inline]
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let q = self.vector();
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }
}

/// Hamilton product.
impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, q: Self) -> Self {
        Self::new(
            self.w * q.w - self.x * q.x - self.y * q.y - self.z * q.z,
            self.w * q.x + self.x * q.w + self.y * q.z - self.z * q.y,
            self.w * q.y - self.x * q.z + self.y * q.w + self.z * q.x,
            self.w * q.z + self.x * q.y - self.y * q.x + self.z * q.w,
        )
    }
}
