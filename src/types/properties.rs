//! Bit flags stored in element records and index entries.

use bitflags::bitflags;

bitflags! {
    /// Display properties word (bytes 32..34 of graphic elements).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct ElementProperties: u16 {
        /// Element class, 0 = primary
        const CLASS_MASK = 0x000f;
        const LOCKED = 0x0100;
        const NEW = 0x0200;
        const MODIFIED = 0x0400;
        /// Attribute linkages follow the element body
        const ATTRIBUTES = 0x0800;
        const ORIENTATION = 0x1000;
        const PLANAR = 0x2000;
        const SNAPPABLE = 0x4000;
        /// Shape is a hole rather than a solid
        const HOLE = 0x8000;
    }
}

impl ElementProperties {
    /// Element class, the low nibble of the properties word.
    pub fn class(self) -> u8 {
        (self.bits() & Self::CLASS_MASK.bits()) as u8
    }
}

bitflags! {
    /// Flags kept on index entries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct IndexFlags: u8 {
        const DELETED = 0x01;
        const COMPLEX = 0x02;
    }
}
