//! Attribute linkage scanning.
//!
//! Linkages are the variable length sub-records stored after an element's
//! body. Their boundaries are found heuristically: an 8 byte "DMRS" form
//! starting `00 00` or `00 80`, or a generic form whose second byte has bit
//! 4 set and whose first byte holds the length in words minus one.

use super::cursor::ByteCursor;
use crate::elements::Element;

/// Linkage type codes.
pub mod linkage_type {
    pub const DMRS: u16 = 0x0000;
    pub const INFORMIX: u16 = 0x3848;
    pub const ODBC: u16 = 0x5e62;
    pub const ORACLE: u16 = 0x6091;
    pub const RIS: u16 = 0x71fb;
    pub const SYBASE: u16 = 0x4f58;
    pub const XBASE: u16 = 0x1971;
    pub const SHAPE_FILL: u16 = 0x0041;
    pub const ASSOC_ID: u16 = 0x7d2f;

    /// Name of a database linkage type, if it is one.
    pub fn name(code: u16) -> Option<&'static str> {
        Some(match code {
            DMRS => "DMRS",
            INFORMIX => "Informix",
            ODBC => "ODBC",
            ORACLE => "Oracle",
            RIS => "RIS",
            SYBASE => "Sybase",
            XBASE => "xBase",
            SHAPE_FILL => "Shape Fill",
            ASSOC_ID => "Association ID",
            _ => return None,
        })
    }
}

/// Size in bytes of the linkage starting at `offset`, or 0 when there is
/// none (fewer than 4 bytes left, or an unrecognised form).
pub fn attr_link_size(attr: &[u8], offset: usize) -> usize {
    let Some(head) = offset.checked_add(4).and_then(|end| attr.get(offset..end)) else {
        return 0;
    };

    // DMRS linkage
    if (head[0] == 0 && head[1] == 0) || (head[0] == 0 && head[1] == 0x80) {
        return 8;
    }

    // Generic linkage, length in words minus one
    if head[1] & 0x10 != 0 {
        return head[0] as usize * 2 + 2;
    }

    0
}

/// A linkage located inside an element's attribute bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linkage<'a> {
    /// Position of the linkage in the attribute list
    pub index: usize,
    /// Byte offset inside the attribute bytes
    pub offset: usize,
    pub linkage_type: u16,
    /// Entity number for database linkages, 0 otherwise
    pub entity_num: u32,
    /// MSLINK key for database linkages, 0 otherwise
    pub ms_link: u32,
    /// The linkage bytes, header included
    pub data: &'a [u8],
}

impl<'a> Linkage<'a> {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn decode(index: usize, offset: usize, data: &'a [u8]) -> Self {
        let c = ByteCursor::new(data);
        let mut link = Linkage {
            index,
            offset,
            linkage_type: 0,
            entity_num: 0,
            ms_link: 0,
            data,
        };

        if data[0] == 0 && (data[1] == 0 || data[1] == 0x80) {
            link.linkage_type = linkage_type::DMRS;
            link.entity_num = c.u16_at(2).unwrap_or(0) as u32;
            link.ms_link = c.u8_at(4).unwrap_or(0) as u32
                | (c.u8_at(5).unwrap_or(0) as u32) << 8
                | (c.u8_at(6).unwrap_or(0) as u32) << 16;
        } else {
            link.linkage_type = c.u16_at(2).unwrap_or(0);
        }

        // External database linkage, fields shifted four bytes
        if data.len() == 16 && link.linkage_type != linkage_type::SHAPE_FILL {
            link.entity_num = c.u16_at(6).unwrap_or(0) as u32;
            link.ms_link = c.u32_le_at(8).unwrap_or(0);
        }

        link
    }
}

/// Walks the linkages of an attribute byte image in order.
#[derive(Debug, Clone)]
pub struct LinkageIter<'a> {
    attr: &'a [u8],
    offset: usize,
    index: usize,
    done: bool,
}

impl<'a> LinkageIter<'a> {
    pub fn new(attr: &'a [u8]) -> Self {
        LinkageIter {
            attr,
            offset: 0,
            index: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for LinkageIter<'a> {
    type Item = Linkage<'a>;

    fn next(&mut self) -> Option<Linkage<'a>> {
        if self.done {
            return None;
        }

        let mut size = attr_link_size(self.attr, self.offset);
        if size == 0 {
            self.done = true;
            return None;
        }
        if size <= 4 {
            tracing::error!(offset = self.offset, size, "corrupt linkage, size too small");
            self.done = true;
            return None;
        }

        let remaining = self.attr.len() - self.offset;
        if size > remaining {
            tracing::error!(
                offset = self.offset,
                size,
                remaining,
                "linkage runs past the attribute bytes, clamping"
            );
            size = remaining;
        }

        let data = &self.attr[self.offset..self.offset + size];
        let link = Linkage::decode(self.index, self.offset, data);
        self.offset += size;
        self.index += 1;
        Some(link)
    }
}

/// Iterate the linkages of an element.
pub fn linkages(element: &Element) -> LinkageIter<'_> {
    LinkageIter::new(&element.core.attr_data)
}

/// Linkage number `index` of an element.
pub fn get_linkage(element: &Element, index: usize) -> Option<Linkage<'_>> {
    linkages(element).nth(index)
}

/// Fill color from a shape fill linkage.
pub fn shape_fill_color(element: &Element) -> Option<u8> {
    linkages(element)
        .find(|l| l.linkage_type == linkage_type::SHAPE_FILL && l.size() >= 9)
        .map(|l| l.data[8])
}

/// Association id from an association linkage.
pub fn assoc_id(element: &Element) -> Option<u32> {
    linkages(element)
        .find(|l| l.linkage_type == linkage_type::ASSOC_ID && l.size() >= 8)
        .map(|l| ByteCursor::new(l.data).u32_le_at(4).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementCore, ElementKind};

    fn element_with_attr(attr: Vec<u8>) -> Element {
        let mut core = ElementCore::new(6, 1);
        core.attr_data = attr;
        Element::new(core, ElementKind::Core)
    }

    #[test]
    fn test_dmrs_size_heuristic() {
        let attr = [0x00, 0x00, 0x05, 0x00, 0x01, 0x02, 0x03, 0x00];
        assert_eq!(attr_link_size(&attr, 0), 8);
        assert_eq!(attr_link_size(&[0x00, 0x80, 0, 0], 0), 8);
        assert_eq!(attr_link_size(&attr, 6), 0);
    }

    #[test]
    fn test_generic_size_heuristic() {
        // 0x07 words after the first: 16 bytes
        assert_eq!(attr_link_size(&[0x07, 0x10, 0x41, 0x00], 0), 16);
        assert_eq!(attr_link_size(&[0x07, 0x00, 0x41, 0x00], 0), 0);
    }

    #[test]
    fn test_dmrs_fields() {
        let e = element_with_attr(vec![0x00, 0x00, 0x05, 0x00, 0x01, 0x02, 0x03, 0x00]);
        let l = get_linkage(&e, 0).unwrap();
        assert_eq!(l.linkage_type, linkage_type::DMRS);
        assert_eq!(l.entity_num, 5);
        assert_eq!(l.ms_link, 0x030201);
        assert!(get_linkage(&e, 1).is_none());
    }

    #[test]
    fn test_external_database_linkage() {
        let mut attr = vec![0x07, 0x10, 0x62, 0x5e, 0x81, 0x0f, 0x0c, 0x00];
        attr.extend_from_slice(&77u32.to_le_bytes());
        attr.extend_from_slice(&[0, 0, 0, 0]);
        let e = element_with_attr(attr);
        let l = get_linkage(&e, 0).unwrap();
        assert_eq!(l.linkage_type, linkage_type::ODBC);
        assert_eq!(l.entity_num, 12);
        assert_eq!(l.ms_link, 77);
    }

    #[test]
    fn test_shape_fill_and_assoc_id() {
        let mut attr = vec![0x07, 0x10, 0x41, 0x00, 0x02, 0x08, 0x01, 0x00, 9, 0, 0, 0, 0, 0, 0, 0];
        attr.extend_from_slice(&[0x03, 0x10, 0x2f, 0x7d, 0x2a, 0x00, 0x00, 0x00]);
        let e = element_with_attr(attr);
        assert_eq!(linkages(&e).count(), 2);
        assert_eq!(shape_fill_color(&e), Some(9));
        assert_eq!(assoc_id(&e), Some(42));
    }

    #[test]
    fn test_overrunning_linkage_is_clamped() {
        // declares 16 bytes, only 10 present
        let e = element_with_attr(vec![0x07, 0x10, 0x41, 0x00, 0, 0, 0, 0, 3, 0]);
        let l = get_linkage(&e, 0).unwrap();
        assert_eq!(l.size(), 10);
        assert_eq!(linkages(&e).count(), 1);
        assert_eq!(shape_fill_color(&e), Some(3));
    }
}
