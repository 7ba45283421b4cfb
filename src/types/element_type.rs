//! Element type codes.

use std::borrow::Cow;
use std::fmt;

/// Known element type codes (low 7 bits of header byte 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    CellLibrary = 1,
    CellHeader = 2,
    Line = 3,
    LineString = 4,
    GroupData = 5,
    Shape = 6,
    TextNode = 7,
    DigitizerSetup = 8,
    Tcb = 9,
    LevelSymbology = 10,
    Curve = 11,
    ComplexChainHeader = 12,
    ComplexShapeHeader = 14,
    Ellipse = 15,
    Arc = 16,
    Text = 17,
    Surface3dHeader = 18,
    Solid3dHeader = 19,
    BSplinePole = 21,
    PointString = 70,
    Cone = 23,
    BSplineSurfaceHeader = 24,
    BSplineSurfaceBoundary = 25,
    BSplineKnot = 26,
    BSplineCurveHeader = 27,
    BSplineWeightFactor = 28,
    SharedCellDefn = 34,
    SharedCellElem = 35,
    TagValue = 37,
    ApplicationElem = 66,
}

impl ElementType {
    /// Map a raw type code to a known type.
    pub fn from_code(code: u8) -> Option<Self> {
        use ElementType::*;
        Some(match code {
            1 => CellLibrary,
            2 => CellHeader,
            3 => Line,
            4 => LineString,
            5 => GroupData,
            6 => Shape,
            7 => TextNode,
            8 => DigitizerSetup,
            9 => Tcb,
            10 => LevelSymbology,
            11 => Curve,
            12 => ComplexChainHeader,
            14 => ComplexShapeHeader,
            15 => Ellipse,
            16 => Arc,
            17 => Text,
            18 => Surface3dHeader,
            19 => Solid3dHeader,
            21 => BSplinePole,
            70 => PointString,
            23 => Cone,
            24 => BSplineSurfaceHeader,
            25 => BSplineSurfaceBoundary,
            26 => BSplineKnot,
            27 => BSplineCurveHeader,
            28 => BSplineWeightFactor,
            34 => SharedCellDefn,
            35 => SharedCellElem,
            37 => TagValue,
            66 => ApplicationElem,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Display name used by Microstation tooling
    pub fn name(self) -> &'static str {
        use ElementType::*;
        match self {
            CellLibrary => "Cell Library",
            CellHeader => "Cell Header",
            Line => "Line",
            LineString => "Line String",
            GroupData => "Group Data",
            Shape => "Shape",
            TextNode => "Text Node",
            DigitizerSetup => "Digitizer Setup",
            Tcb => "TCB",
            LevelSymbology => "Level Symbology",
            Curve => "Curve",
            ComplexChainHeader => "Complex Chain Header",
            ComplexShapeHeader => "Complex Shape Header",
            Ellipse => "Ellipse",
            Arc => "Arc",
            Text => "Text",
            Surface3dHeader => "3D Surface Header",
            Solid3dHeader => "3D Solid Header",
            BSplinePole => "B-Spline Pole",
            PointString => "Point String",
            Cone => "Cone",
            BSplineSurfaceHeader => "B-Spline Surface Header",
            BSplineSurfaceBoundary => "B-Spline Surface Boundary",
            BSplineKnot => "B-Spline Knot",
            BSplineCurveHeader => "B-Spline Curve Header",
            BSplineWeightFactor => "B-Spline Weight Factor",
            SharedCellDefn => "Shared Cell Definition",
            SharedCellElem => "Shared Cell Element",
            TagValue => "Tag Value",
            ApplicationElem => "Application Element",
        }
    }

    /// Whether the record carries the range block at bytes 4..28.
    pub fn has_range(self) -> bool {
        use ElementType::*;
        matches!(
            self,
            Line | LineString
                | Shape
                | Curve
                | BSplinePole
                | BSplineSurfaceHeader
                | BSplineCurveHeader
                | Ellipse
                | Arc
                | Text
                | TextNode
                | ComplexChainHeader
                | ComplexShapeHeader
                | Cone
                | Surface3dHeader
                | Solid3dHeader
        )
    }

    /// Multipoint geometry: a vertex list following the display header.
    pub fn is_multipoint(self) -> bool {
        use ElementType::*;
        matches!(self, Line | LineString | Shape | Curve | BSplinePole)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether records of this type carry the display header (bytes 28..36).
pub fn has_display_header(code: u8) -> bool {
    !matches!(code, 0 | 1 | 9 | 10 | 32 | 44 | 48 | 49 | 50 | 51 | 57 | 60 | 61 | 62 | 63)
}

/// Human readable name of a type code; unknown codes render as the number.
pub fn type_to_name(code: u8) -> Cow<'static, str> {
    match ElementType::from_code(code) {
        Some(t) => Cow::Borrowed(t.name()),
        None => Cow::Owned(code.to_string()),
    }
}
