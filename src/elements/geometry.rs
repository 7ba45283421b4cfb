//! Geometric payloads: vertex lists, arcs and ellipses, cones.

use crate::types::Vector3;

/// Line, line string, shape, curve and B-spline pole vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiPoint {
    pub vertices: Vec<Vector3>,
}

impl MultiPoint {
    /// Maximum number of vertices one record can hold.
    pub const MAX_VERTICES: usize = 101;

    pub fn new(vertices: Vec<Vector3>) -> Self {
        MultiPoint { vertices }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }
}

/// Arc or full ellipse.
///
/// Angles are in degrees. In 3D files the orientation is only available as
/// the raw quaternion; `rotation` then stays zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArcElement {
    pub origin: Vector3,
    pub primary_axis: f64,
    pub secondary_axis: f64,
    /// Counter-clockwise rotation of the primary axis (2D)
    pub rotation: f64,
    /// Orientation quaternion (3D)
    pub quat: [i32; 4],
    pub start_angle: f64,
    pub sweep_angle: f64,
}

/// Truncated cone (3D only).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cone {
    pub unknown: u16,
    pub quat: [i32; 4],
    pub center_1: Vector3,
    pub radius_1: f64,
    pub center_2: Vector3,
    pub radius_2: f64,
}
