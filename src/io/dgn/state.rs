//! Per-session state that decoding updates as a side effect.

use crate::types::{ColorTable, CoordinateTransform};

/// Dimension, units and palette of an open design file.
///
/// Starts as a 2D file with identity units and the default palette; the
/// first TCB record fixes dimension and units, and every color table record
/// replaces the palette.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// 2 or 3
    pub dimension: u8,
    pub transform: CoordinateTransform,
    pub got_tcb: bool,
    pub color_table: ColorTable,
    pub got_color_table: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            dimension: 2,
            transform: CoordinateTransform::default(),
            got_tcb: false,
            color_table: ColorTable::default(),
            got_color_table: false,
        }
    }
}

impl SessionState {
    pub fn new(dimension: u8) -> Self {
        SessionState {
            dimension,
            ..Default::default()
        }
    }

    pub fn is_3d(&self) -> bool {
        self.dimension == 3
    }
}
