//! Cells, cell libraries and shared cell definitions.

use crate::types::Vector3;
use nalgebra::Matrix3;

/// Placed cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellHeader {
    pub totlength: u16,
    /// Six character Radix-50 name
    pub name: String,
    pub cclass: u16,
    /// 64 bit level occurrence mask
    pub levels: [u16; 4],
    pub rnglow: Vector3,
    pub rnghigh: Vector3,
    /// Cell transform, scaled to unity. 2D cells fill the upper 2x2 block.
    pub trans: Matrix3<f64>,
    pub origin: Vector3,
    pub xscale: f64,
    pub yscale: f64,
    /// Rotation in degrees (2D)
    pub rotation: f64,
}

impl Default for CellHeader {
    fn default() -> Self {
        CellHeader {
            totlength: 0,
            name: String::new(),
            cclass: 0,
            levels: [0; 4],
            rnglow: Vector3::ZERO,
            rnghigh: Vector3::ZERO,
            trans: Matrix3::identity(),
            origin: Vector3::ZERO,
            xscale: 1.0,
            yscale: 1.0,
            rotation: 0.0,
        }
    }
}

/// Cell library directory entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellLibrary {
    pub name: String,
    pub numwords: u16,
    pub properties: u16,
    pub dispsymb: u16,
    pub cclass: u16,
    pub levels: [u16; 4],
    /// 27 character Radix-50 description
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedCellDefn {
    pub totlength: u16,
}
