//! Complex chain, complex shape, 3D surface and 3D solid headers.

/// Header of a complex group.
///
/// `surftype` and `boundelms` are only meaningful for 3D surface and solid
/// headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexHeader {
    /// Words following the header that belong to the group
    pub totlength: u16,
    pub numelems: u16,
    pub surftype: u8,
    pub boundelms: u16,
}
