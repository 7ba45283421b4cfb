//! Record decoder: raw record bytes to a typed [`Element`].
//!
//! Every record first gets its common header decoded into an
//! [`ElementCore`], then the type code selects the payload layout. Fixed
//! offsets below are byte positions from the start of the record, header
//! included.

use super::cursor::{decode_int32, ByteCursor};
use super::float::vax_slice_to_ieee;
use super::raw_reader::RawHeader;
use super::state::SessionState;
use crate::elements::tag::tag_type;
use crate::elements::*;
use crate::error::{DgnError, Result};
use crate::notification::{NotificationCollection, NotificationType};
use crate::types::{
    rad50_to_ascii, ColorTable, ElementProperties, ElementType, Rgb, Vector3,
};
use encoding_rs::{EUC_KR, WINDOWS_1252};
use nalgebra::Matrix3;
use nom::bytes::complete::{tag, take, take_till};
use nom::multi::count;
use nom::number::complete::{le_i32, le_u16};
use nom::sequence::terminated;
use nom::IResult;

/// Angles are stored in 1/360000 degree units.
const ANGLE_UNITS: f64 = 360_000.0;
/// Text size multipliers are stored in 1000/6 UOR units.
const TEXT_SIZE_FACTOR: f64 = 6.0 / 1000.0;
/// Fractional vertex offsets are stored in 1/32767 UOR units.
const DELTA_UNITS: f64 = 32767.0;

/// Decodes records for one session.
///
/// Color table and TCB records update `state`; problems that do not stop the
/// decode are added to `notifications`.
pub struct ElementDecoder<'a> {
    state: &'a mut SessionState,
    notifications: &'a mut NotificationCollection,
    capture_raw_data: bool,
    element_id: usize,
}

impl<'a> ElementDecoder<'a> {
    pub fn new(
        state: &'a mut SessionState,
        notifications: &'a mut NotificationCollection,
        capture_raw_data: bool,
    ) -> Self {
        ElementDecoder {
            state,
            notifications,
            capture_raw_data,
            element_id: 0,
        }
    }

    /// Sequence id used when reporting problems.
    pub fn with_element_id(mut self, element_id: usize) -> Self {
        self.element_id = element_id;
        self
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.notifications
            .notify_element(NotificationType::Warning, self.element_id, message);
    }

    /// Decode one record.
    ///
    /// Fails when the record is too short for its layout or violates a
    /// structural minimum (fewer than two vertices, a cone in a 2D file...).
    pub fn decode(&mut self, raw: &[u8], header: RawHeader) -> Result<Element> {
        let element_type = header.element_type;
        let c = ByteCursor::new(raw);
        let mut element = self.decode_kind(&c, header).map_err(|e| match e {
            DgnError::OutOfBounds { .. } => DgnError::malformed(element_type, e.to_string()),
            other => other,
        })?;

        if element.kind == ElementKind::Core || self.capture_raw_data {
            element.core.raw_data = raw.to_vec();
        }
        element.core.size = raw.len();
        element.core.element_id = Some(self.element_id);
        Ok(element)
    }

    // ------------------------------------------------------------------
    // Common header
    // ------------------------------------------------------------------

    fn parse_core(&mut self, c: &ByteCursor, header: RawHeader) -> Result<ElementCore> {
        let b0 = c.u8_at(0)?;
        let b1 = c.u8_at(1)?;
        let mut core = ElementCore::new(b1 & 0x7f, b0 & 0x3f);
        core.complex = b0 & 0x80 != 0;
        core.deleted = b1 & 0x80 != 0;

        if c.len() >= 36 && core.has_display_header() {
            core.graphic_group = c.u16_at(28)?;
            core.properties = ElementProperties::from_bits_retain(c.u16_at(32)?);
            let symbology = c.u8_at(34)?;
            core.style = symbology & 0x07;
            core.weight = (symbology & 0xf8) >> 3;
            core.color = c.u8_at(35)?;
        }

        if core.properties.contains(ElementProperties::ATTRIBUTES) {
            let attr_start = c.u16_at(30)? as usize * 2 + 32;
            if attr_start < c.len() {
                core.attr_data = c.bytes_at(attr_start, c.len() - attr_start)?.to_vec();
            } else {
                self.warn(format!(
                    "computed {} bytes of attribute data for a {} record, \
                     perhaps the type has no display header",
                    c.len() as i64 - attr_start as i64,
                    core.type_name()
                ));
            }
        }

        debug_assert_eq!(core.element_type, header.element_type);
        Ok(core)
    }

    fn decode_kind(&mut self, c: &ByteCursor, header: RawHeader) -> Result<Element> {
        let core = self.parse_core(c, header)?;
        let t = header.element_type;

        use ElementType as T;
        let kind = match ElementType::from_code(t) {
            Some(T::CellHeader) => ElementKind::CellHeader(self.cell_header(c)?),
            Some(T::CellLibrary) => {
                let (lib, properties) = self.cell_library(c)?;
                return Ok(Element::new(
                    ElementCore {
                        properties,
                        ..core
                    },
                    ElementKind::CellLibrary(lib),
                ));
            }
            Some(T::Line) => ElementKind::MultiPoint(self.line(c, &core)?),
            Some(T::LineString | T::Shape | T::Curve | T::BSplinePole) => {
                ElementKind::MultiPoint(self.multi_point(c, &core, t)?)
            }
            Some(T::GroupData) if header.level == COLOR_TABLE_LEVEL => {
                ElementKind::ColorTable(self.color_table(c)?)
            }
            Some(T::Ellipse) => ElementKind::Arc(self.ellipse(c)?),
            Some(T::Arc) => ElementKind::Arc(self.arc(c)?),
            Some(T::Text) => ElementKind::Text(self.text(c)?),
            Some(T::TextNode) => ElementKind::TextNode(self.text_node(c)?),
            Some(T::Tcb) => ElementKind::Tcb(Box::new(self.tcb(c)?)),
            Some(T::ComplexChainHeader | T::ComplexShapeHeader) => {
                ElementKind::ComplexHeader(ComplexHeader {
                    totlength: c.u16_at(36)?,
                    numelems: c.u16_at(38)?,
                    ..Default::default()
                })
            }
            Some(T::Surface3dHeader | T::Solid3dHeader) => {
                ElementKind::ComplexHeader(ComplexHeader {
                    totlength: c.u16_at(36)?,
                    numelems: c.u16_at(38)?,
                    surftype: c.u8_at(40)?,
                    boundelms: c.u8_at(41)? as u16 + 1,
                })
            }
            Some(T::TagValue) => ElementKind::TagValue(self.tag_value(c)?),
            Some(T::ApplicationElem) if header.level == TAG_SET_LEVEL => {
                ElementKind::TagSet(self.tag_set(c, &core)?)
            }
            Some(T::Cone) => ElementKind::Cone(self.cone(c)?),
            Some(T::BSplineSurfaceHeader) => {
                ElementKind::BSplineSurfaceHeader(self.bspline_surface_header(c)?)
            }
            Some(T::BSplineCurveHeader) => {
                ElementKind::BSplineCurveHeader(self.bspline_curve_header(c)?)
            }
            Some(T::BSplineSurfaceBoundary) => {
                ElementKind::BSplineSurfaceBoundary(self.bspline_boundary(c, &core)?)
            }
            Some(T::BSplineKnot | T::BSplineWeightFactor) => {
                ElementKind::KnotWeight(self.knot_weight(c)?)
            }
            Some(T::SharedCellDefn) => ElementKind::SharedCellDefn(SharedCellDefn {
                totlength: c.u16_at(36)?,
            }),
            _ => ElementKind::Core,
        };

        Ok(Element::new(core, kind))
    }

    // ------------------------------------------------------------------
    // Coordinate helpers
    // ------------------------------------------------------------------

    fn is_3d(&self) -> bool {
        self.state.is_3d()
    }

    /// Integer point in UOR, z only read in 3D files.
    fn int_point_at(&self, c: &ByteCursor, offset: usize) -> Result<Vector3> {
        let x = c.int32_at(offset)? as f64;
        let y = c.int32_at(offset + 4)? as f64;
        let z = if self.is_3d() {
            c.int32_at(offset + 8)? as f64
        } else {
            0.0
        };
        Ok(Vector3::new(x, y, z))
    }

    /// Floating point in UOR, z only read in 3D files.
    fn vax_point_at(&self, c: &ByteCursor, offset: usize) -> Result<Vector3> {
        let x = c.vax_at(offset)?;
        let y = c.vax_at(offset + 8)?;
        let z = if self.is_3d() { c.vax_at(offset + 16)? } else { 0.0 };
        Ok(Vector3::new(x, y, z))
    }

    fn to_master(&self, p: Vector3) -> Vector3 {
        self.state.transform.to_master(p)
    }

    fn scale(&self) -> f64 {
        self.state.transform.scale
    }

    fn quat_at(c: &ByteCursor, offset: usize) -> Result<[i32; 4]> {
        Ok([
            c.int32_at(offset)?,
            c.int32_at(offset + 4)?,
            c.int32_at(offset + 8)?,
            c.int32_at(offset + 12)?,
        ])
    }

    // ------------------------------------------------------------------
    // Vertex lists
    // ------------------------------------------------------------------

    fn line(&mut self, c: &ByteCursor, core: &ElementCore) -> Result<MultiPoint> {
        let stride = if self.is_3d() { 12 } else { 8 };
        let mut vertices = vec![self.int_point_at(c, 36)?, self.int_point_at(c, 36 + stride)?];

        if let Some(delta) = DeltaLinkage::find(core) {
            if delta.has(1) {
                for (i, v) in vertices.iter_mut().enumerate() {
                    delta.apply(i, v);
                }
            }
        }

        Ok(MultiPoint::new(
            vertices.into_iter().map(|v| self.to_master(v)).collect(),
        ))
    }

    fn multi_point(&mut self, c: &ByteCursor, core: &ElementCore, t: u8) -> Result<MultiPoint> {
        let point_size = self.state.dimension as usize * 4;
        let declared = c.u16_at(36)? as usize;
        if declared < 2 {
            return Err(DgnError::malformed(t, format!("vertex count {} < 2", declared)));
        }

        let mut num = declared;
        if c.len() < 38 + num * point_size {
            num = (c.len() - 38) / point_size;
            self.warn(format!(
                "trimming multipoint vertices to {} from {} because the element is short",
                num, declared
            ));
        }

        let delta = DeltaLinkage::find(core);
        let mut vertices = Vec::with_capacity(num);
        for i in 0..num {
            let mut v = self.int_point_at(c, 38 + i * point_size)?;
            if let Some(d) = &delta {
                d.apply(i, &mut v);
            }
            vertices.push(self.to_master(v));
        }
        Ok(MultiPoint::new(vertices))
    }

    // ------------------------------------------------------------------
    // Arcs, ellipses, cones
    // ------------------------------------------------------------------

    fn ellipse(&mut self, c: &ByteCursor) -> Result<ArcElement> {
        let mut arc = ArcElement {
            primary_axis: c.vax_at(36)? * self.scale(),
            secondary_axis: c.vax_at(44)? * self.scale(),
            start_angle: 0.0,
            sweep_angle: 360.0,
            ..Default::default()
        };

        let origin = if self.is_3d() {
            arc.quat = Self::quat_at(c, 52)?;
            self.vax_point_at(c, 68)?
        } else {
            arc.rotation = c.int32_at(52)? as f64 / ANGLE_UNITS;
            self.vax_point_at(c, 56)?
        };
        arc.origin = self.to_master(origin);
        Ok(arc)
    }

    fn arc(&mut self, c: &ByteCursor) -> Result<ArcElement> {
        let start = c.int32_at(36)? as f64 / ANGLE_UNITS;

        // Sign and magnitude: the top bit flags a negative sweep.
        let mut sweep_bytes = [0u8; 4];
        sweep_bytes.copy_from_slice(c.bytes_at(40, 4)?);
        let sweep_val = if sweep_bytes[1] & 0x80 != 0 {
            sweep_bytes[1] &= 0x7f;
            -decode_int32(&sweep_bytes)
        } else {
            decode_int32(&sweep_bytes)
        };
        let sweep = if sweep_val == 0 {
            360.0
        } else {
            sweep_val as f64 / ANGLE_UNITS
        };

        let mut arc = ArcElement {
            primary_axis: c.vax_at(44)? * self.scale(),
            secondary_axis: c.vax_at(52)? * self.scale(),
            start_angle: start,
            sweep_angle: sweep,
            ..Default::default()
        };

        let origin = if self.is_3d() {
            arc.quat = Self::quat_at(c, 60)?;
            self.vax_point_at(c, 76)?
        } else {
            arc.rotation = c.int32_at(60)? as f64 / ANGLE_UNITS;
            self.vax_point_at(c, 64)?
        };
        arc.origin = self.to_master(origin);
        Ok(arc)
    }

    fn cone(&mut self, c: &ByteCursor) -> Result<Cone> {
        if !self.is_3d() {
            return Err(DgnError::malformed(
                ElementType::Cone.code(),
                "cone element in a 2D file",
            ));
        }
        Ok(Cone {
            unknown: c.u16_at(36)?,
            quat: Self::quat_at(c, 38)?,
            center_1: self.to_master(self.vax_point_at(c, 54)?),
            radius_1: c.vax_at(78)? * self.scale(),
            center_2: self.to_master(self.vax_point_at(c, 86)?),
            radius_2: c.vax_at(110)? * self.scale(),
        })
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    fn text(&mut self, c: &ByteCursor) -> Result<TextElement> {
        let size_scale = self.scale() * TEXT_SIZE_FACTOR;
        let mut text = TextElement {
            font_id: c.u8_at(36)?,
            justification: c.u8_at(37)?,
            length_mult: c.int32_at(38)? as f64 * size_scale,
            height_mult: c.int32_at(42)? as f64 * size_scale,
            ..Default::default()
        };

        let (num_chars, text_off, origin) = if self.is_3d() {
            text.quat = Self::quat_at(c, 46)?;
            (c.u8_at(74)? as usize, 76, self.int_point_at(c, 62)?)
        } else {
            text.rotation = c.int32_at(46)? as f64 / ANGLE_UNITS;
            (c.u8_at(58)? as usize, 60, self.int_point_at(c, 50)?)
        };
        text.origin = self.to_master(origin);
        text.text = self.text_string(c, text_off, num_chars);
        Ok(text)
    }

    /// Text bytes, either single byte (Windows-1252) or, behind an `FF FD`
    /// marker, 16-bit words holding EUC-KR double byte characters.
    fn text_string(&mut self, c: &ByteCursor, offset: usize, num_chars: usize) -> String {
        let available = c.len().saturating_sub(offset);
        let mut n = num_chars;
        if n > available {
            self.warn(format!(
                "text declares {} characters, only {} bytes remain",
                num_chars, available
            ));
            n = available;
        }

        let is_multibyte = c.u8_at(offset).ok() == Some(0xff)
            && c.u8_at(offset + 1).ok() == Some(0xfd);
        if is_multibyte {
            let mut bytes = Vec::with_capacity(num_chars);
            for i in 0..(num_chars / 2).saturating_sub(1) {
                let Ok(w) = c.u16_at(offset + 2 + i * 2) else {
                    break;
                };
                if w < 256 {
                    bytes.push(w as u8);
                } else {
                    bytes.push((w >> 8) as u8);
                    bytes.push((w & 0xff) as u8);
                }
            }
            let (s, _, _) = EUC_KR.decode(until_nul(&bytes));
            return s.into_owned();
        }

        let raw = c.bytes_at(offset, n).unwrap_or(&[]);
        decode_single_byte(until_nul(raw))
    }

    fn text_node(&mut self, c: &ByteCursor) -> Result<TextNode> {
        let size_scale = self.scale() * TEXT_SIZE_FACTOR;
        let mut node = TextNode {
            totlength: c.u16_at(36)?,
            numelems: c.u16_at(38)?,
            node_number: c.u16_at(40)?,
            max_length: c.u8_at(42)?,
            max_used: c.u8_at(43)?,
            font_id: c.u8_at(44)?,
            justification: c.u8_at(45)?,
            length_mult: c.int32_at(50)? as f64 * size_scale,
            height_mult: c.int32_at(54)? as f64 * size_scale,
            ..Default::default()
        };

        let origin = if self.is_3d() {
            self.int_point_at(c, 74)?
        } else {
            node.rotation = c.int32_at(58)? as f64 / ANGLE_UNITS;
            self.int_point_at(c, 62)?
        };
        node.origin = self.to_master(origin);
        Ok(node)
    }

    // ------------------------------------------------------------------
    // Cells
    // ------------------------------------------------------------------

    fn cell_header(&mut self, c: &ByteCursor) -> Result<CellHeader> {
        let mut cell = CellHeader {
            totlength: c.u16_at(36)?,
            name: rad50_to_ascii(c.u16_at(38)?) + &rad50_to_ascii(c.u16_at(40)?),
            cclass: c.u16_at(42)?,
            levels: [c.u16_at(44)?, c.u16_at(46)?, c.u16_at(48)?, c.u16_at(50)?],
            ..Default::default()
        };

        // Positive 2^31; readers that divide by the int (1 << 31) get -2^31.
        const UNITY: f64 = 2_147_483_648.0;
        let (rnglow, rnghigh, origin) = if self.is_3d() {
            let mut m = [0.0; 9];
            for (i, v) in m.iter_mut().enumerate() {
                *v = c.int32_at(76 + i * 4)? as f64 / UNITY;
            }
            cell.trans = Matrix3::from_row_slice(&m);
            (
                self.int_point_at(c, 52)?,
                self.int_point_at(c, 64)?,
                self.int_point_at(c, 112)?,
            )
        } else {
            let a = c.int32_at(68)? as f64;
            let b = c.int32_at(72)? as f64;
            let cc = c.int32_at(76)? as f64;
            let d = c.int32_at(80)? as f64;
            cell.trans = Matrix3::new(
                a / UNITY,
                b / UNITY,
                0.0,
                cc / UNITY,
                d / UNITY,
                0.0,
                0.0,
                0.0,
                1.0,
            );

            let (xscale, yscale, rotation) = decompose_cell_matrix(a, b, cc, d);
            cell.xscale = xscale;
            cell.yscale = yscale;
            cell.rotation = rotation;
            (
                self.int_point_at(c, 52)?,
                self.int_point_at(c, 60)?,
                self.int_point_at(c, 84)?,
            )
        };

        cell.rnglow = self.to_master(rnglow);
        cell.rnghigh = self.to_master(rnghigh);
        cell.origin = self.to_master(origin);
        Ok(cell)
    }

    /// Cell library entries keep their own properties word at byte 38.
    fn cell_library(&mut self, c: &ByteCursor) -> Result<(CellLibrary, ElementProperties)> {
        let mut description = String::with_capacity(27);
        for word in 0..9 {
            description.push_str(&rad50_to_ascii(c.u16_at(52 + word * 2)?));
        }
        let lib = CellLibrary {
            name: rad50_to_ascii(c.u16_at(32)?) + &rad50_to_ascii(c.u16_at(34)?),
            numwords: c.u16_at(36)?,
            properties: c.u16_at(38)?,
            dispsymb: c.u16_at(40)?,
            cclass: c.u16_at(42)?,
            levels: [c.u16_at(44)?, c.u16_at(46)?, c.u16_at(48)?, c.u16_at(50)?],
            description,
        };
        let properties = ElementProperties::from_bits_retain(lib.properties);
        Ok((lib, properties))
    }

    // ------------------------------------------------------------------
    // Session-global records
    // ------------------------------------------------------------------

    fn color_table(&mut self, c: &ByteCursor) -> Result<ColorTableElement> {
        let mut colors = ColorTable::default();
        let rgb = |off: usize| -> Result<Rgb> {
            let b = c.bytes_at(off, 3)?;
            Ok(Rgb::new(b[0], b[1], b[2]))
        };

        colors.set(255, rgb(38)?);
        for i in 0..255u8 {
            colors.set(i, rgb(41 + i as usize * 3)?);
        }

        // The last color table in the file wins.
        self.state.color_table = colors.clone();
        self.state.got_color_table = true;

        Ok(ColorTableElement {
            screen_flag: c.u16_at(36)?,
            colors,
        })
    }

    fn tcb(&mut self, c: &ByteCursor) -> Result<Tcb> {
        let mut tcb = Tcb {
            dimension: if c.u8_at(1214)? & 0x40 != 0 { 3 } else { 2 },
            subunits_per_master: c.int32_at(1112)?,
            uor_per_subunit: c.int32_at(1116)?,
            master_units: decode_single_byte(until_nul(c.bytes_at(1120, 2)?)),
            sub_units: decode_single_byte(until_nul(c.bytes_at(1122, 2)?)),
            ..Default::default()
        };

        let mut origin = Vector3::new(c.vax_at(1240)?, c.vax_at(1248)?, c.vax_at(1256)?);
        let uors = tcb.uor_per_subunit as f64 * tcb.subunits_per_master as f64;
        if tcb.uor_per_subunit != 0 && tcb.subunits_per_master != 0 {
            origin = origin / uors;
        }
        tcb.origin = origin;

        // Only the first TCB of a session sets its units.
        if !self.state.got_tcb {
            self.state.got_tcb = true;
            self.state.dimension = tcb.dimension;
            self.state.transform.origin = origin;
            if tcb.uor_per_subunit != 0 && tcb.subunits_per_master != 0 {
                self.state.transform.scale = 1.0 / uors;
            }
        }

        for (i, view) in tcb.views.iter_mut().enumerate() {
            let base = 46 + i * 118;
            view.flags = c.u16_at(base)?;
            view.levels.copy_from_slice(c.bytes_at(base + 2, 8)?);

            let origin = Vector3::new(
                c.int32_at(base + 10)? as f64,
                c.int32_at(base + 14)? as f64,
                c.int32_at(base + 18)? as f64,
            );
            view.origin = self.state.transform.to_master(origin);

            view.delta = Vector3::new(
                c.int32_at(base + 22)? as f64,
                c.int32_at(base + 26)? as f64,
                c.int32_at(base + 30)? as f64,
            ) * self.state.transform.scale;

            for (j, m) in view.transmatrx.iter_mut().enumerate() {
                *m = c.vax_at(base + 34 + j * 8)?;
            }
            view.conversion = c.vax_at(base + 106)?;
            view.activez = c.uint32_at(base + 114)?;
        }

        Ok(tcb)
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    fn tag_value(&mut self, c: &ByteCursor) -> Result<TagValue> {
        let mut tag = TagValue {
            tag_type: c.u16_at(74)?,
            tag_set: c.u32_le_at(68)?,
            tag_index: c.u16_at(72)?,
            tag_length: c.u16_at(150)?,
            value: TagData::None,
        };
        tag.value = match tag.tag_type {
            tag_type::STRING => {
                let raw = c.bytes_at(154, c.len().saturating_sub(154))?;
                TagData::String(decode_single_byte(until_nul(raw)))
            }
            tag_type::INTEGER => TagData::Integer(c.i32_le_at(154)?),
            tag_type::FLOAT => TagData::Float(c.vax_at(154)?),
            _ => TagData::None,
        };
        Ok(tag)
    }

    fn tag_set(&mut self, c: &ByteCursor, core: &ElementCore) -> Result<TagSet> {
        let tag_count = c.u16_at(44)? as usize;
        let flags = c.u16_at(46)?;

        let attr = &core.attr_data;
        let tag_set = if attr.len() >= 8 && attr[..4] == [0x03, 0x10, 0x2f, 0x7d] {
            Some(attr[4] as u16 + attr[5] as u16 * 256)
        } else {
            None
        };

        let body = c.bytes_at(48, c.len().saturating_sub(48))?;
        let (_, (name, tags)) = tag_set_body(body, tag_count).map_err(|_| {
            DgnError::malformed(
                ElementType::ApplicationElem.code(),
                format!("tag set with {} tags runs past the end of the record", tag_count),
            )
        })?;

        Ok(TagSet {
            tag_set,
            flags,
            tag_set_name: decode_single_byte(name),
            tags,
        })
    }

    // ------------------------------------------------------------------
    // B-splines
    // ------------------------------------------------------------------

    fn bspline_surface_header(&mut self, c: &ByteCursor) -> Result<BSplineSurfaceHeader> {
        let u = c.u8_at(40)?;
        let v = c.u8_at(48)?;
        Ok(BSplineSurfaceHeader {
            desc_words: c.int32_at(36)?,
            curve_type: c.u8_at(41)?,
            u_order: (u & 0x0f) + 2,
            u_properties: u & 0xf0,
            num_poles_u: c.u16_at(42)?,
            num_knots_u: c.u16_at(44)?,
            rule_lines_u: c.u16_at(46)?,
            v_order: (v & 0x0f) + 2,
            v_properties: v & 0xf0,
            num_poles_v: c.u16_at(50)?,
            num_knots_v: c.u16_at(52)?,
            rule_lines_v: c.u16_at(54)?,
            // 556, not 256: kept as observed in existing readers
            num_bounds: c.u8_at(56)? as u32 + c.u8_at(57)? as u32 * 556,
        })
    }

    fn bspline_curve_header(&mut self, c: &ByteCursor) -> Result<BSplineCurveHeader> {
        let flags = c.u8_at(40)?;
        Ok(BSplineCurveHeader {
            desc_words: c.int32_at(36)?,
            order: (flags & 0x0f) + 2,
            properties: flags & 0xf0,
            curve_type: c.u8_at(41)?,
            num_poles: c.u16_at(42)?,
            num_knots: c.u16_at(44)?,
        })
    }

    /// Boundary vertices stay in raw (parametric) units.
    fn bspline_boundary(
        &mut self,
        c: &ByteCursor,
        core: &ElementCore,
    ) -> Result<BSplineSurfaceBoundary> {
        let numverts = c.i16_at(38)?;
        if numverts <= 0 {
            return Err(DgnError::malformed(
                ElementType::BSplineSurfaceBoundary.code(),
                format!("boundary vertex count {}", numverts),
            ));
        }

        let delta = DeltaLinkage::find(core);
        let mut vertices = Vec::with_capacity(numverts as usize);
        for i in 0..numverts as usize {
            if 44 + i * 8 + 4 > c.len() {
                break;
            }
            let mut v = Vector3::xy(
                c.int32_at(40 + i * 8)? as f64,
                c.int32_at(44 + i * 8)? as f64,
            );
            if let Some(d) = &delta {
                d.apply(i, &mut v);
            }
            vertices.push(v);
        }

        Ok(BSplineSurfaceBoundary {
            number: c.u16_at(36)?,
            vertices,
        })
    }

    fn knot_weight(&mut self, c: &ByteCursor) -> Result<KnotWeight> {
        let attr_index = c.u16_at(30).unwrap_or(0) as i64;
        let len = c.len() as i64;
        let attr_bytes = len - attr_index * 2 - 32;
        let fit = ((len - 36) / 4).max(0);
        let num = ((len - 36 - attr_bytes) / 4).clamp(0, fit) as usize;

        let mut values = Vec::with_capacity(num);
        for i in 0..num {
            values.push((c.int32_at(36 + i * 4)? as f64 / i32::MAX as f64) as f32);
        }
        Ok(KnotWeight { values })
    }
}

/// Fractional vertex offsets carried in an `A9 51` linkage.
struct DeltaLinkage<'a> {
    attr: &'a [u8],
    start: usize,
}

impl<'a> DeltaLinkage<'a> {
    fn find(core: &'a ElementCore) -> Option<Self> {
        if !core.properties.contains(ElementProperties::ATTRIBUTES) {
            return None;
        }
        let attr = &core.attr_data;
        let pos = attr.windows(4).position(|w| w[0] == 0xa9 && w[1] == 0x51)?;
        let length = (attr[pos + 2] as usize + attr[pos + 3] as usize * 256) * 2;
        if length == 0 {
            return None;
        }
        Some(DeltaLinkage {
            attr,
            start: pos + 6,
        })
    }

    fn has(&self, vertex: usize) -> bool {
        self.start + vertex * 4 + 4 <= self.attr.len()
    }

    fn apply(&self, vertex: usize, v: &mut Vector3) {
        if !self.has(vertex) {
            return;
        }
        let c = ByteCursor::new(self.attr);
        let off = self.start + vertex * 4;
        if let (Ok(dx), Ok(dy)) = (c.i16_at(off), c.i16_at(off + 2)) {
            v.x += dx as f64 / DELTA_UNITS;
            v.y += dy as f64 / DELTA_UNITS;
        }
    }
}

/// Split the 2D cell matrix into x scale, y scale and rotation (degrees).
fn decompose_cell_matrix(a: f64, b: f64, c: f64, d: f64) -> (f64, f64, f64) {
    let a2c2 = a * a + c * c;
    let xscale = a2c2.sqrt() / 214_748.0;
    let yscale = (b * b + d * d).sqrt() / 214_748.0;
    let angle = if a2c2 <= 0.0 {
        0.0
    } else {
        (a / a2c2.sqrt()).acos()
    };
    let rotation = if b <= 0.0 {
        angle.to_degrees()
    } else {
        360.0 - angle.to_degrees()
    };
    (xscale, yscale, rotation)
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Decode single byte text.
pub(crate) fn decode_single_byte(bytes: &[u8]) -> String {
    let (s, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    s.into_owned()
}

fn c_string(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_till(|b| b == 0), tag(&b"\0"[..]))(input)
}

/// Set name, one pad byte, then `tag_count` tag definitions.
fn tag_set_body(input: &[u8], tag_count: usize) -> IResult<&[u8], (&[u8], Vec<TagDef>)> {
    let (input, name) = c_string(input)?;
    let (input, _) = take(1usize)(input)?;
    let (input, tags) = count(tag_def, tag_count)(input)?;
    Ok((input, (name, tags)))
}

fn tag_def(input: &[u8]) -> IResult<&[u8], TagDef> {
    let (input, name) = c_string(input)?;
    let (input, id) = le_u16(input)?;
    let (input, prompt) = c_string(input)?;
    let (input, tag_type) = le_u16(input)?;
    let (input, _) = take(5usize)(input)?;

    let (input, default_value) = match tag_type {
        tag_type::STRING => {
            let (input, s) = c_string(input)?;
            (input, TagData::String(decode_single_byte(s)))
        }
        tag_type::INTEGER | 5 => {
            let (input, v) = le_i32(input)?;
            (input, TagData::Integer(v))
        }
        tag_type::FLOAT => {
            let (input, b) = take(8usize)(input)?;
            (input, TagData::Float(vax_slice_to_ieee(b).unwrap_or(0.0)))
        }
        _ => {
            let (input, _) = take(4usize)(input)?;
            (input, TagData::None)
        }
    };

    Ok((
        input,
        TagDef {
            name: decode_single_byte(name),
            id,
            prompt: decode_single_byte(prompt),
            tag_type,
            default_value,
        },
    ))
}
