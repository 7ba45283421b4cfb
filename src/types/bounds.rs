//! Bounding boxes in master units and in raw file units.

use super::Vector3;
use std::fmt;

/// Axis aligned box in master units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox3D {
    pub min: Vector3,
    pub max: Vector3,
}

impl Default for BoundingBox3D {
    fn default() -> Self {
        BoundingBox3D {
            min: Vector3::ZERO,
            max: Vector3::ZERO,
        }
    }
}

impl BoundingBox3D {
    pub fn new(min: Vector3, max: Vector3) -> Self {
        BoundingBox3D { min, max }
    }

    pub fn from_point(point: Vector3) -> Self {
        BoundingBox3D {
            min: point,
            max: point,
        }
    }

    /// Create a bounding box that contains all given points
    pub fn from_points(points: &[Vector3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = BoundingBox3D::from_point(*first);
        for p in rest {
            bbox.expand_to_include(*p);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn depth(&self) -> f64 {
        self.max.z - self.min.z
    }

    pub fn contains(&self, point: Vector3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn expand_to_include(&mut self, point: Vector3) {
        self.min = self.min.min(&point);
        self.max = self.max.max(&point);
    }

    /// Grow the box by `margin` in every direction
    pub fn inflate(&self, margin: f64) -> BoundingBox3D {
        let m = Vector3::new(margin, margin, margin);
        BoundingBox3D::new(self.min - m, self.max + m)
    }

    pub fn merge(&self, other: &BoundingBox3D) -> BoundingBox3D {
        BoundingBox3D {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }
}

impl fmt::Display for BoundingBox3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3D[{} -> {}]", self.min, self.max)
    }
}

/// Range block of a record, as stored on disk.
///
/// Values are unsigned "binary offset" integers: the real UOR coordinate is
/// the stored value minus 2^31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UorExtents {
    pub min: [u32; 3],
    pub max: [u32; 3],
}

impl UorExtents {
    pub fn new(min: [u32; 3], max: [u32; 3]) -> Self {
        UorExtents { min, max }
    }

    pub fn merge(&self, other: &UorExtents) -> UorExtents {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Signed UOR coordinates of the corners, with the 2^31 bias removed.
    pub fn unbiased(&self) -> ([f64; 3], [f64; 3]) {
        let unbias = |v: u32| v as f64 - 2_147_483_648.0;
        (
            [unbias(self.min[0]), unbias(self.min[1]), unbias(self.min[2])],
            [unbias(self.max[0]), unbias(self.max[1]), unbias(self.max[2])],
        )
    }
}
