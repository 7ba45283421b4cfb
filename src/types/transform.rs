//! Conversion between file units (UOR) and master units.
//!
//! A design file stores coordinates as 32-bit integers. The TCB record
//! gives the number of UORs per master unit and a global origin; decoded
//! points are `uor * scale - origin`.

use super::Vector3;

/// Largest magnitude a UOR coordinate can hold.
pub const UOR_LIMIT: f64 = 2_147_483_647.0;

/// Per-session scale and origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    /// Master units per UOR
    pub scale: f64,
    /// Global origin, in master units
    pub origin: Vector3,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        CoordinateTransform {
            scale: 1.0,
            origin: Vector3::ZERO,
        }
    }
}

impl CoordinateTransform {
    pub fn new(scale: f64, origin: Vector3) -> Self {
        CoordinateTransform { scale, origin }
    }

    /// UOR to master units.
    pub fn to_master(&self, p: Vector3) -> Vector3 {
        Vector3::new(
            p.x * self.scale - self.origin.x,
            p.y * self.scale - self.origin.y,
            p.z * self.scale - self.origin.z,
        )
    }

    /// Master units to UOR, without rounding or clamping.
    pub fn to_uor(&self, p: Vector3) -> Vector3 {
        Vector3::new(
            (p.x + self.origin.x) / self.scale,
            (p.y + self.origin.y) / self.scale,
            (p.z + self.origin.z) / self.scale,
        )
    }

    /// Master units to UOR integers, saturating into the signed 32-bit range.
    pub fn to_uor_int(&self, p: Vector3) -> [i32; 3] {
        let u = self.to_uor(p);
        [saturate(u.x), saturate(u.y), saturate(u.z)]
    }

    /// Scale a length (no origin shift).
    pub fn scale_length(&self, v: f64) -> f64 {
        v * self.scale
    }
}

/// Clamp a UOR value into `i32`, truncating toward zero.
pub fn saturate(v: f64) -> i32 {
    v.clamp(-UOR_LIMIT, UOR_LIMIT) as i32
}

/// Quaternion for a rotation of `degrees` about the z axis, as stored in 3D
/// arc, ellipse and text records.
pub fn rotation_to_quaternion(degrees: f64) -> [i32; 4] {
    let half = -degrees.to_radians() / 2.0;
    [
        (half.cos() * UOR_LIMIT) as i32,
        0,
        0,
        (half.sin() * UOR_LIMIT) as i32,
    ]
}
