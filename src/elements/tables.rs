//! Non-graphic records: the TCB (design file header) and color tables.

use crate::types::{ColorTable, Vector3};

/// One of the eight saved views of the TCB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewInfo {
    pub flags: u16,
    /// 64 bit level display mask
    pub levels: [u8; 8],
    pub origin: Vector3,
    pub delta: Vector3,
    /// Row-major 3x3 view rotation
    pub transmatrx: [f64; 9],
    pub conversion: f64,
    pub activez: u32,
}

/// Design file header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tcb {
    /// 2 or 3
    pub dimension: u8,
    /// Global origin, master units
    pub origin: Vector3,
    pub uor_per_subunit: i32,
    pub sub_units: String,
    pub subunits_per_master: i32,
    pub master_units: String,
    pub views: [ViewInfo; 8],
}

impl Tcb {
    /// Master units per UOR, 1.0 when the unit ratios are unset.
    pub fn scale(&self) -> f64 {
        let uors = self.uor_per_subunit as f64 * self.subunits_per_master as f64;
        if uors != 0.0 {
            1.0 / uors
        } else {
            1.0
        }
    }
}

/// Color table record (group data on level 1).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTableElement {
    pub screen_flag: u16,
    pub colors: ColorTable,
}
