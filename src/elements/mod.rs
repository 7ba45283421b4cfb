//! Decoded DGN elements.
//!
//! An [`Element`] is an [`ElementCore`] (fields every record has) plus an
//! [`ElementKind`] carrying the type-specific payload. Records the codec does
//! not interpret are [`ElementKind::Core`] and always keep their raw image.

pub mod bspline;
pub mod cell;
pub mod complex;
pub mod element_core;
pub mod dump;
pub mod geometry;
pub mod tables;
pub mod tag;
pub mod text;

pub use element_core::ElementCore;
pub use bspline::{BSplineCurveHeader, BSplineSurfaceBoundary, BSplineSurfaceHeader, KnotWeight};
pub use cell::{CellHeader, CellLibrary, SharedCellDefn};
pub use complex::ComplexHeader;
pub use dump::dump_element;
pub use geometry::{ArcElement, Cone, MultiPoint};
pub use tables::{ColorTableElement, Tcb, ViewInfo};
pub use tag::{TagData, TagDef, TagSet, TagValue};
pub use text::{TextElement, TextNode};

use crate::types::ElementType;
use std::fmt;

/// Level on which application elements hold tag set definitions.
pub const TAG_SET_LEVEL: u8 = 24;
/// Level on which group data records hold the color table.
pub const COLOR_TABLE_LEVEL: u8 = 1;

/// Payload kind of an element, as recorded in the element index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureType {
    Core,
    MultiPoint,
    Arc,
    Text,
    TextNode,
    ComplexHeader,
    ColorTable,
    Tcb,
    CellHeader,
    CellLibrary,
    TagSet,
    TagValue,
    Cone,
    BSplineSurfaceHeader,
    BSplineCurveHeader,
    BSplineSurfaceBoundary,
    KnotWeight,
    SharedCellDefn,
}

impl StructureType {
    /// Payload kind a record of this type and level decodes to.
    pub fn classify(element_type: u8, level: u8) -> StructureType {
        use ElementType as T;
        match ElementType::from_code(element_type) {
            Some(T::Line | T::LineString | T::Shape | T::Curve | T::BSplinePole) => {
                StructureType::MultiPoint
            }
            Some(T::GroupData) if level == COLOR_TABLE_LEVEL => StructureType::ColorTable,
            Some(T::Ellipse | T::Arc) => StructureType::Arc,
            Some(
                T::ComplexChainHeader
                | T::ComplexShapeHeader
                | T::Surface3dHeader
                | T::Solid3dHeader,
            ) => StructureType::ComplexHeader,
            Some(T::Text) => StructureType::Text,
            Some(T::TextNode) => StructureType::TextNode,
            Some(T::TagValue) => StructureType::TagValue,
            Some(T::ApplicationElem) if level == TAG_SET_LEVEL => StructureType::TagSet,
            Some(T::Tcb) => StructureType::Tcb,
            Some(T::Cone) => StructureType::Cone,
            Some(T::CellHeader) => StructureType::CellHeader,
            Some(T::CellLibrary) => StructureType::CellLibrary,
            Some(T::BSplineSurfaceHeader) => StructureType::BSplineSurfaceHeader,
            Some(T::BSplineCurveHeader) => StructureType::BSplineCurveHeader,
            Some(T::BSplineSurfaceBoundary) => StructureType::BSplineSurfaceBoundary,
            Some(T::BSplineKnot | T::BSplineWeightFactor) => StructureType::KnotWeight,
            Some(T::SharedCellDefn) => StructureType::SharedCellDefn,
            _ => StructureType::Core,
        }
    }
}

/// Type specific payload of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Nothing beyond the common header is decoded.
    Core,
    MultiPoint(MultiPoint),
    Arc(ArcElement),
    Text(TextElement),
    TextNode(TextNode),
    ComplexHeader(ComplexHeader),
    ColorTable(ColorTableElement),
    Tcb(Box<Tcb>),
    CellHeader(CellHeader),
    CellLibrary(CellLibrary),
    TagSet(TagSet),
    TagValue(TagValue),
    Cone(Cone),
    BSplineSurfaceHeader(BSplineSurfaceHeader),
    BSplineCurveHeader(BSplineCurveHeader),
    BSplineSurfaceBoundary(BSplineSurfaceBoundary),
    KnotWeight(KnotWeight),
    SharedCellDefn(SharedCellDefn),
}

impl ElementKind {
    pub fn structure_type(&self) -> StructureType {
        match self {
            ElementKind::Core => StructureType::Core,
            ElementKind::MultiPoint(_) => StructureType::MultiPoint,
            ElementKind::Arc(_) => StructureType::Arc,
            ElementKind::Text(_) => StructureType::Text,
            ElementKind::TextNode(_) => StructureType::TextNode,
            ElementKind::ComplexHeader(_) => StructureType::ComplexHeader,
            ElementKind::ColorTable(_) => StructureType::ColorTable,
            ElementKind::Tcb(_) => StructureType::Tcb,
            ElementKind::CellHeader(_) => StructureType::CellHeader,
            ElementKind::CellLibrary(_) => StructureType::CellLibrary,
            ElementKind::TagSet(_) => StructureType::TagSet,
            ElementKind::TagValue(_) => StructureType::TagValue,
            ElementKind::Cone(_) => StructureType::Cone,
            ElementKind::BSplineSurfaceHeader(_) => StructureType::BSplineSurfaceHeader,
            ElementKind::BSplineCurveHeader(_) => StructureType::BSplineCurveHeader,
            ElementKind::BSplineSurfaceBoundary(_) => StructureType::BSplineSurfaceBoundary,
            ElementKind::KnotWeight(_) => StructureType::KnotWeight,
            ElementKind::SharedCellDefn(_) => StructureType::SharedCellDefn,
        }
    }
}

/// A decoded (or freshly built) element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub core: ElementCore,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(core: ElementCore, kind: ElementKind) -> Self {
        Element { core, kind }
    }

    pub fn structure_type(&self) -> StructureType {
        self.kind.structure_type()
    }

    pub fn element_type(&self) -> u8 {
        self.core.element_type
    }

    pub fn as_multi_point(&self) -> Option<&MultiPoint> {
        match &self.kind {
            ElementKind::MultiPoint(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_arc(&self) -> Option<&ArcElement> {
        match &self.kind {
            ElementKind::Arc(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_complex_header(&self) -> Option<&ComplexHeader> {
        match &self.kind {
            ElementKind::ComplexHeader(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cell_header(&self) -> Option<&CellHeader> {
        match &self.kind {
            ElementKind::CellHeader(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tcb(&self) -> Option<&Tcb> {
        match &self.kind {
            ElementKind::Tcb(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_color_table(&self) -> Option<&ColorTableElement> {
        match &self.kind {
            ElementKind::ColorTable(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tag_set(&self) -> Option<&TagSet> {
        match &self.kind {
            ElementKind::TagSet(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tag_value(&self) -> Option<&TagValue> {
        match &self.kind {
            ElementKind::TagValue(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_cone(&self) -> Option<&Cone> {
        match &self.kind {
            ElementKind::Cone(c) => Some(c),
            _ => None,
        }
    }

    /// Independent copy with no file position, ready to be written into
    /// another (or the same) file as a new element.
    pub fn clone_for_write(&self) -> Element {
        let mut copy = self.clone();
        copy.core.clear_position();
        copy
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        dump_element(self, &mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
