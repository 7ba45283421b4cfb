//! Text and text node payloads.

use crate::types::Vector3;

/// Single line of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextElement {
    pub font_id: u8,
    pub justification: u8,
    /// Character width, master units
    pub length_mult: f64,
    /// Character height, master units
    pub height_mult: f64,
    /// Rotation in degrees (2D)
    pub rotation: f64,
    pub quat: [i32; 4],
    pub origin: Vector3,
    pub text: String,
}

/// Header of a multi-line text group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextNode {
    /// Words following the header that belong to the node
    pub totlength: u16,
    pub numelems: u16,
    pub node_number: u16,
    pub max_length: u8,
    pub max_used: u8,
    pub font_id: u8,
    pub justification: u8,
    pub length_mult: f64,
    pub height_mult: f64,
    pub rotation: f64,
    pub origin: Vector3,
}
