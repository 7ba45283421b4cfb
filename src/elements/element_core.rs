//! Fields shared by every element.

use crate::types::{has_display_header, type_to_name, ElementProperties, ElementType};
use std::borrow::Cow;

/// Header information common to all element kinds.
///
/// `element_id` (position in the file's element sequence) and `offset`
/// (byte position in the file) are both `None` for elements that have not
/// been written yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementCore {
    pub element_id: Option<usize>,
    pub offset: Option<u64>,
    /// Record size in bytes, header included
    pub size: usize,

    /// Level, 0..=63
    pub level: u8,
    /// Type code, 0..=127
    pub element_type: u8,
    /// Member of a complex group
    pub complex: bool,
    pub deleted: bool,

    pub graphic_group: u16,
    pub properties: ElementProperties,
    /// Color index into the active color table
    pub color: u8,
    /// Line weight, 0..=31
    pub weight: u8,
    /// Line style, 0..=7
    pub style: u8,

    /// Attribute linkage bytes
    pub attr_data: Vec<u8>,
    /// Complete record image, empty when not captured
    pub raw_data: Vec<u8>,
}

impl ElementCore {
    /// Empty core for an element of the given type and level.
    pub fn new(element_type: u8, level: u8) -> Self {
        ElementCore {
            element_type,
            level,
            ..Default::default()
        }
    }

    pub fn kind_type(&self) -> Option<ElementType> {
        ElementType::from_code(self.element_type)
    }

    pub fn type_name(&self) -> Cow<'static, str> {
        type_to_name(self.element_type)
    }

    pub fn has_raw_data(&self) -> bool {
        !self.raw_data.is_empty()
    }

    pub fn has_display_header(&self) -> bool {
        has_display_header(self.element_type)
    }

    /// Forget where the element lives, so the next write appends it.
    pub fn clear_position(&mut self) {
        self.element_id = None;
        self.offset = None;
    }
}
