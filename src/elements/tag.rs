//! Tag set definitions and tag values.

use std::fmt;

/// Tag value type codes.
pub mod tag_type {
    pub const STRING: u16 = 1;
    pub const INTEGER: u16 = 3;
    pub const FLOAT: u16 = 4;
}

/// A typed tag value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TagData {
    String(String),
    Integer(i32),
    Float(f64),
    /// Type code without a decoded value
    #[default]
    None,
}

impl fmt::Display for TagData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagData::String(s) => write!(f, "\"{}\"", s),
            TagData::Integer(v) => write!(f, "{}", v),
            TagData::Float(v) => write!(f, "{}", v),
            TagData::None => write!(f, "(none)"),
        }
    }
}

/// One tag definition inside a tag set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagDef {
    pub name: String,
    pub id: u16,
    pub prompt: String,
    pub tag_type: u16,
    pub default_value: TagData,
}

/// Tag set definition (application element on level 24).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet {
    /// Set number, when the element carries the tag set linkage
    pub tag_set: Option<u16>,
    pub flags: u16,
    pub tag_set_name: String,
    pub tags: Vec<TagDef>,
}

impl TagSet {
    pub fn tag_by_id(&self, id: u16) -> Option<&TagDef> {
        self.tags.iter().find(|t| t.id == id)
    }
}

/// Value of one tag attached to an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagValue {
    pub tag_type: u16,
    pub tag_set: u32,
    pub tag_index: u16,
    pub tag_length: u16,
    pub value: TagData,
}
