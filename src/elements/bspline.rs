//! B-spline headers, boundaries and knot/weight arrays.

use crate::types::Vector3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BSplineSurfaceHeader {
    pub desc_words: i32,
    pub curve_type: u8,
    pub u_order: u8,
    pub u_properties: u8,
    pub num_poles_u: u16,
    pub num_knots_u: u16,
    pub rule_lines_u: u16,
    pub v_order: u8,
    pub v_properties: u8,
    pub num_poles_v: u16,
    pub num_knots_v: u16,
    pub rule_lines_v: u16,
    pub num_bounds: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BSplineCurveHeader {
    pub desc_words: i32,
    pub order: u8,
    pub properties: u8,
    pub curve_type: u8,
    pub num_poles: u16,
    pub num_knots: u16,
}

/// Trimming boundary of a B-spline surface, in parametric space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BSplineSurfaceBoundary {
    pub number: u16,
    pub vertices: Vec<Vector3>,
}

/// Knot vector or weight factors, as fractions of `i32::MAX`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnotWeight {
    pub values: Vec<f32>,
}
