//! Element factories.
//!
//! Every factory returns an element with a complete raw image in the
//! session's units and dimension, ready for [`DgnFile::write_element`].
//! The core display fields default to zero; set them with
//! [`update_element_core`](super::writer::update_element_core).

use super::cursor::ByteCursorMut;
use super::file::DgnFile;
use super::writer::{add_raw_linkage, update_core_fields, write_bounds};
use crate::elements::*;
use crate::error::{DgnError, Result};
use crate::notification::NotificationType;
use crate::types::{
    ascii_to_rad50, rotation_to_quaternion, BoundingBox3D, ColorTable, ElementType, Vector3,
};
use encoding_rs::WINDOWS_1252;
use std::io::{Read, Seek};

const ANGLE_UNITS: f64 = 360_000.0;
/// Cell transforms store unit scale as this value.
const CELL_UNITY: f64 = 214_748.0;
/// Sweeps above this are stored as 0, meaning a full turn.
const FULL_SWEEP: f64 = 364.9999;

/// Blank element of `size` bytes.
fn blank(element_type: ElementType, size: usize, kind: ElementKind) -> Element {
    let mut core = ElementCore::new(element_type.code(), 0);
    core.raw_data = vec![0u8; size];
    core.size = size;
    Element::new(core, kind)
}

/// Write an integer point, x and y only in 2D.
fn put_point(w: &mut ByteCursorMut, offset: usize, p: [i32; 3], dimension: usize) -> Result<()> {
    for (axis, v) in p.iter().take(dimension).enumerate() {
        w.put_int32(offset + axis * 4, *v)?;
    }
    Ok(())
}

fn put_vax_point(w: &mut ByteCursorMut, offset: usize, p: Vector3, dimension: usize) -> Result<()> {
    for (axis, v) in p.to_array().iter().take(dimension).enumerate() {
        w.put_vax(offset + axis * 8, *v)?;
    }
    Ok(())
}

fn put_quat(w: &mut ByteCursorMut, offset: usize, quat: [i32; 4]) -> Result<()> {
    for (i, q) in quat.iter().enumerate() {
        w.put_int32(offset + i * 4, *q)?;
    }
    Ok(())
}

fn is_zero_quat(quat: &[i32; 4]) -> bool {
    quat.iter().all(|&q| q == 0)
}

/// Encoded sweep angle: sign and magnitude, with 0 meaning a full turn.
fn encode_sweep(sweep: f64) -> i32 {
    if sweep < 0.0 {
        ((-sweep * ANGLE_UNITS) as i32) | i32::MIN
    } else if sweep > FULL_SWEEP {
        0
    } else {
        (sweep * ANGLE_UNITS) as i32
    }
}

/// Split a cell name into its two Radix-50 words.
fn cell_name_words(name: &str) -> (u16, u16) {
    let split = name.char_indices().nth(3).map_or(name.len(), |(i, _)| i);
    let (head, tail) = name.split_at(split);
    (ascii_to_rad50(head), ascii_to_rad50(tail))
}

/// Level occurrence mask for a set of levels, packed as four words.
fn level_mask<I: IntoIterator<Item = u8>>(levels: I) -> [u16; 4] {
    let mut bytes = [0u8; 8];
    for level in levels {
        let l = level.clamp(1, 64) as usize - 1;
        bytes[l >> 3] |= 1 << (l & 7);
    }
    let mut words = [0u16; 4];
    for (i, w) in words.iter_mut().enumerate() {
        *w = u16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
    }
    words
}

impl<S: Read + Seek> DgnFile<S> {
    /// Load units before building a record.
    fn prepare_factory(&mut self) -> Result<()> {
        if !self.load_tcb()? {
            self.notifications.notify(
                NotificationType::Warning,
                "no TCB found, creating elements with default units",
            );
        }
        Ok(())
    }

    fn dims(&self) -> usize {
        self.state.dimension as usize
    }

    fn finish(&self, element: &mut Element, min: Vector3, max: Vector3) -> Result<()> {
        update_core_fields(element)?;
        write_bounds(element, &self.state.transform, min, max)
    }

    /// Union of the ranges of a complex group's members, marking each one
    /// as a complex member on the way.
    fn collect_group(
        &mut self,
        members: &mut [Element],
        what: &str,
    ) -> Result<(usize, BoundingBox3D)> {
        if members.is_empty() {
            return Err(DgnError::InvalidArgument(format!(
                "need at least one element to form a {}",
                what
            )));
        }

        let level = members[0].core.level;
        let mut words = 0usize;
        let mut bounds: Option<BoundingBox3D> = None;
        let mut mismatch = false;

        for member in members.iter_mut() {
            if member.core.raw_data.is_empty() {
                return Err(DgnError::ContractViolation(format!(
                    "{} member has no raw image",
                    member.core.type_name()
                )));
            }
            words += member.core.raw_data.len() / 2;
            member.core.complex = true;
            member.core.raw_data[0] |= 0x80;
            mismatch |= member.core.level != level;

            if let Some(ext) = self.element_extents(member) {
                bounds = Some(bounds.map_or(ext, |b| b.merge(&ext)));
            }
        }

        if mismatch {
            self.notifications.notify(
                NotificationType::Warning,
                format!("not all level values match in a {} group", what),
            );
        }
        Ok((words, bounds.unwrap_or_default()))
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Line, line string, shape, curve or B-spline pole element.
    pub fn create_multi_point(
        &mut self,
        element_type: ElementType,
        vertices: &[Vector3],
    ) -> Result<Element> {
        self.prepare_factory()?;
        let n = vertices.len();

        use ElementType as T;
        match element_type {
            T::Line if n != 2 => {
                return Err(DgnError::InvalidArgument(format!(
                    "a line needs exactly 2 vertices, got {}",
                    n
                )))
            }
            T::Line => {}
            T::LineString | T::Shape | T::Curve | T::BSplinePole => {
                if n < 2 {
                    return Err(DgnError::InvalidArgument(format!(
                        "{} needs at least 2 vertices, got {}",
                        element_type, n
                    )));
                }
                if n > MultiPoint::MAX_VERTICES {
                    return Err(DgnError::InvalidArgument(format!(
                        "{} vertices exceed the {} vertex limit of one element",
                        n,
                        MultiPoint::MAX_VERTICES
                    )));
                }
            }
            other => {
                return Err(DgnError::InvalidArgument(format!(
                    "{} is not a multi-point element type",
                    other
                )))
            }
        }

        let dims = self.dims();
        let point_size = dims * 4;
        let (size, first) = if element_type == T::Line {
            (36 + point_size * 2, 36)
        } else {
            (38 + point_size * n, 38)
        };

        let mut element = blank(
            element_type,
            size,
            ElementKind::MultiPoint(MultiPoint::new(vertices.to_vec())),
        );
        {
            let mut w = ByteCursorMut::new(&mut element.core.raw_data);
            if element_type != T::Line {
                w.put_u16(36, n as u16)?;
            }
            for (i, v) in vertices.iter().enumerate() {
                let p = self.state.transform.to_uor_int(*v);
                put_point(&mut w, first + i * point_size, p, dims)?;
            }
        }

        let mut bounds = BoundingBox3D::from_points(vertices).unwrap_or_default();
        if dims == 2 {
            bounds.min.z = 0.0;
            bounds.max.z = 0.0;
        }
        self.finish(&mut element, bounds.min, bounds.max)?;
        Ok(element)
    }

    /// Arc or ellipse element.
    ///
    /// For ellipses the start and sweep angles are ignored. In 3D files a
    /// zero `quat` is replaced by the quaternion for `rotation`.
    pub fn create_arc(&mut self, element_type: ElementType, arc: &ArcElement) -> Result<Element> {
        self.prepare_factory()?;
        let is_3d = self.state.is_3d();
        let dims = self.dims();
        let scale = self.state.transform.scale;

        let mut arc = arc.clone();
        if is_3d && is_zero_quat(&arc.quat) {
            arc.quat = rotation_to_quaternion(arc.rotation);
        }
        let origin = self.state.transform.to_uor(arc.origin);

        let mut element = match element_type {
            ElementType::Ellipse => {
                arc.start_angle = 0.0;
                arc.sweep_angle = 360.0;
                let mut e = blank(element_type, if is_3d { 92 } else { 72 }, ElementKind::Core);
                let mut w = ByteCursorMut::new(&mut e.core.raw_data);
                w.put_vax(36, arc.primary_axis / scale)?;
                w.put_vax(44, arc.secondary_axis / scale)?;
                if is_3d {
                    put_quat(&mut w, 52, arc.quat)?;
                    put_vax_point(&mut w, 68, origin, dims)?;
                } else {
                    w.put_int32(52, (arc.rotation * ANGLE_UNITS) as i32)?;
                    put_vax_point(&mut w, 56, origin, dims)?;
                }
                e
            }
            ElementType::Arc => {
                let mut e = blank(element_type, if is_3d { 100 } else { 80 }, ElementKind::Core);
                let mut w = ByteCursorMut::new(&mut e.core.raw_data);
                w.put_int32(36, (arc.start_angle * ANGLE_UNITS) as i32)?;
                w.put_int32(40, encode_sweep(arc.sweep_angle))?;
                w.put_vax(44, arc.primary_axis / scale)?;
                w.put_vax(52, arc.secondary_axis / scale)?;
                if is_3d {
                    put_quat(&mut w, 60, arc.quat)?;
                    put_vax_point(&mut w, 76, origin, dims)?;
                } else {
                    w.put_int32(60, (arc.rotation * ANGLE_UNITS) as i32)?;
                    put_vax_point(&mut w, 64, origin, dims)?;
                }
                e
            }
            other => {
                return Err(DgnError::InvalidArgument(format!(
                    "{} is not an arc or ellipse type",
                    other
                )))
            }
        };

        let r = arc.primary_axis.max(arc.secondary_axis);
        let reach = Vector3::new(r, r, r);
        let (min, max) = (arc.origin - reach, arc.origin + reach);
        element.kind = ElementKind::Arc(arc);
        self.finish(&mut element, min, max)?;
        Ok(element)
    }

    /// Cone element; 3D files only.
    ///
    /// A zero `quat` is replaced by the identity orientation.
    pub fn create_cone(&mut self, cone: &Cone) -> Result<Element> {
        self.prepare_factory()?;
        if !self.state.is_3d() {
            return Err(DgnError::ContractViolation(
                "cone elements can only be created in 3D files".into(),
            ));
        }

        let mut cone = cone.clone();
        if is_zero_quat(&cone.quat) {
            cone.quat = [i32::MIN, 0, 0, 0];
        }
        let scale = self.state.transform.scale;

        let mut element = blank(ElementType::Cone, 118, ElementKind::Core);
        {
            let mut w = ByteCursorMut::new(&mut element.core.raw_data);
            w.put_u16(36, cone.unknown)?;
            put_quat(&mut w, 38, cone.quat)?;
            put_vax_point(&mut w, 54, self.state.transform.to_uor(cone.center_1), 3)?;
            w.put_vax(78, cone.radius_1 / scale)?;
            put_vax_point(&mut w, 86, self.state.transform.to_uor(cone.center_2), 3)?;
            w.put_vax(110, cone.radius_2 / scale)?;
        }

        let r = cone.radius_1.max(cone.radius_2);
        let reach = Vector3::new(r, r, r);
        let min = cone.center_1.min(&cone.center_2) - reach;
        let max = cone.center_1.max(&cone.center_2) + reach;
        element.kind = ElementKind::Cone(cone);
        self.finish(&mut element, min, max)?;
        Ok(element)
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Single line text element.
    pub fn create_text(&mut self, text: &TextElement) -> Result<Element> {
        self.prepare_factory()?;
        let (encoded, _, had_errors) = WINDOWS_1252.encode(&text.text);
        if had_errors {
            return Err(DgnError::Encoding(format!(
                "{:?} cannot be stored as single byte text",
                text.text
            )));
        }
        if encoded.len() > 255 {
            return Err(DgnError::InvalidArgument(format!(
                "text of {} characters exceeds 255",
                encoded.len()
            )));
        }

        let is_3d = self.state.is_3d();
        let dims = self.dims();
        let scale = self.state.transform.scale;
        let mut text = text.clone();
        if is_3d && is_zero_quat(&text.quat) {
            text.quat = rotation_to_quaternion(text.rotation);
        }

        let mut size = (if is_3d { 76 } else { 60 }) + encoded.len();
        size += size % 2;
        let mut element = blank(ElementType::Text, size, ElementKind::Core);
        {
            let size_units = |m: f64| (m * 1000.0 / (scale * 6.0) + 0.5) as i32;
            let origin = self.state.transform.to_uor_int(text.origin);
            let mut w = ByteCursorMut::new(&mut element.core.raw_data);
            w.put_u8(36, text.font_id)?;
            w.put_u8(37, text.justification)?;
            w.put_int32(38, size_units(text.length_mult))?;
            w.put_int32(42, size_units(text.height_mult))?;

            let base = if is_3d {
                put_quat(&mut w, 46, text.quat)?;
                put_point(&mut w, 62, origin, dims)?;
                74
            } else {
                w.put_int32(46, (text.rotation * ANGLE_UNITS) as i32)?;
                put_point(&mut w, 50, origin, dims)?;
                58
            };
            w.put_u8(base, encoded.len() as u8)?;
            w.put_u8(base + 1, 0)?;
            w.put_bytes(base + 2, &encoded)?;
        }

        let n = encoded.len() as f64;
        let min = Vector3::new(
            text.origin.x - text.length_mult * n,
            text.origin.y - text.height_mult,
            0.0,
        );
        let max = Vector3::new(
            text.origin.x + text.length_mult * n,
            text.origin.y + text.height_mult,
            0.0,
        );
        element.kind = ElementKind::Text(text);
        self.finish(&mut element, min, max)?;
        Ok(element)
    }

    // ------------------------------------------------------------------
    // Color table
    // ------------------------------------------------------------------

    /// Color table element (group data on level 1).
    pub fn create_color_table(&mut self, screen_flag: u16, colors: &ColorTable) -> Result<Element> {
        self.prepare_factory()?;
        let mut element = blank(
            ElementType::GroupData,
            806,
            ElementKind::ColorTable(ColorTableElement {
                screen_flag,
                colors: colors.clone(),
            }),
        );
        element.core.level = COLOR_TABLE_LEVEL;
        {
            let mut w = ByteCursorMut::new(&mut element.core.raw_data);
            w.put_u16(36, screen_flag)?;
            w.put_bytes(38, &colors.get(255).to_array())?;
            for i in 0..255u8 {
                w.put_bytes(41 + i as usize * 3, &colors.get(i).to_array())?;
            }
        }
        update_core_fields(&mut element)?;
        Ok(element)
    }

    // ------------------------------------------------------------------
    // Complex groups
    // ------------------------------------------------------------------

    fn complex_header(
        &mut self,
        element_type: ElementType,
        size: usize,
        header: ComplexHeader,
        total_length: u16,
    ) -> Result<Element> {
        let mut element = blank(element_type, size, ElementKind::ComplexHeader(header.clone()));
        element.core.complex = true;
        {
            let mut w = ByteCursorMut::new(&mut element.core.raw_data);
            w.put_u16(36, total_length.wrapping_sub(4))?;
            w.put_u16(38, header.numelems)?;
            if size >= 42 {
                w.put_u8(40, header.surftype)?;
                w.put_u8(41, header.boundelms.wrapping_sub(1) as u8)?;
            }
        }
        if let ElementKind::ComplexHeader(h) = &mut element.kind {
            h.totlength = total_length.wrapping_sub(4);
        }
        update_core_fields(&mut element)?;

        // Pad the header to the 48 byte minimum element size.
        add_raw_linkage(&mut element, &[0u8; 8])?;
        Ok(element)
    }

    /// Complex chain or shape header.
    ///
    /// `total_length` counts the words of the header (after its first four
    /// bytes) and all members; `num_elems` excludes the header.
    pub fn create_complex_header(
        &mut self,
        element_type: ElementType,
        total_length: u16,
        num_elems: u16,
    ) -> Result<Element> {
        self.prepare_factory()?;
        if !matches!(
            element_type,
            ElementType::ComplexChainHeader | ElementType::ComplexShapeHeader
        ) {
            return Err(DgnError::InvalidArgument(format!(
                "{} is not a complex chain or shape header type",
                element_type
            )));
        }
        let header = ComplexHeader {
            numelems: num_elems,
            ..Default::default()
        };
        self.complex_header(element_type, 40, header, total_length)
    }

    /// Complex chain or shape header for `members`, which are marked as
    /// complex members. The header takes its level from the first member
    /// and its range from all of them.
    pub fn create_complex_header_from_group(
        &mut self,
        element_type: ElementType,
        members: &mut [Element],
    ) -> Result<Element> {
        self.prepare_factory()?;
        let (words, bounds) = self.collect_group(members, "complex")?;
        let mut header = self.create_complex_header(
            element_type,
            (5 + words) as u16,
            members.len() as u16,
        )?;
        header.core.level = members[0].core.level;
        update_core_fields(&mut header)?;
        write_bounds(&mut header, &self.state.transform, bounds.min, bounds.max)?;
        Ok(header)
    }

    /// 3D surface or solid header.
    pub fn create_solid_header(
        &mut self,
        element_type: ElementType,
        surface_type: u8,
        boundary_elements: u16,
        total_length: u16,
        num_elems: u16,
    ) -> Result<Element> {
        self.prepare_factory()?;
        if !matches!(
            element_type,
            ElementType::Surface3dHeader | ElementType::Solid3dHeader
        ) {
            return Err(DgnError::InvalidArgument(format!(
                "{} is not a 3D surface or solid header type",
                element_type
            )));
        }
        let header = ComplexHeader {
            numelems: num_elems,
            surftype: surface_type,
            boundelms: boundary_elements,
            ..Default::default()
        };
        self.complex_header(element_type, 42, header, total_length)
    }

    /// 3D surface or solid header for `members`.
    pub fn create_solid_header_from_group(
        &mut self,
        element_type: ElementType,
        surface_type: u8,
        boundary_elements: u16,
        members: &mut [Element],
    ) -> Result<Element> {
        self.prepare_factory()?;
        let (words, bounds) = self.collect_group(members, "solid")?;
        let mut header = self.create_solid_header(
            element_type,
            surface_type,
            boundary_elements,
            (6 + words) as u16,
            members.len() as u16,
        )?;
        header.core.level = members[0].core.level;
        update_core_fields(&mut header)?;
        write_bounds(&mut header, &self.state.transform, bounds.min, bounds.max)?;
        Ok(header)
    }

    // ------------------------------------------------------------------
    // Cells
    // ------------------------------------------------------------------

    /// Cell header.
    ///
    /// Uses `totlength`, `name`, `cclass`, `levels`, the range, `origin`
    /// and the scale/rotation fields of `cell`; the stored transform is
    /// built from `xscale`, `yscale` and `rotation`.
    pub fn create_cell_header(&mut self, cell: &CellHeader) -> Result<Element> {
        self.prepare_factory()?;
        let is_3d = self.state.is_3d();
        let dims = self.dims();
        let t = self.state.transform;

        let (cos_a, sin_a) = {
            let a = (-cell.rotation).to_radians();
            (a.cos(), a.sin())
        };
        let m = [
            cos_a * cell.xscale * CELL_UNITY,
            sin_a * cell.yscale * CELL_UNITY,
            -sin_a * cell.xscale * CELL_UNITY,
            cos_a * cell.yscale * CELL_UNITY,
        ];

        let mut element = blank(
            ElementType::CellHeader,
            if is_3d { 124 } else { 92 },
            ElementKind::Core,
        );
        {
            let (name_1, name_2) = cell_name_words(&cell.name);
            let mut w = ByteCursorMut::new(&mut element.core.raw_data);
            w.put_u16(36, cell.totlength)?;
            w.put_u16(38, name_1)?;
            w.put_u16(40, name_2)?;
            w.put_u16(42, cell.cclass)?;
            for (i, level) in cell.levels.iter().enumerate() {
                w.put_u16(44 + i * 2, *level)?;
            }

            if is_3d {
                put_point(&mut w, 52, t.to_uor_int(cell.rnglow), dims)?;
                put_point(&mut w, 64, t.to_uor_int(cell.rnghigh), dims)?;
                let rows = [m[0], m[1], 0.0, m[2], m[3], 0.0, 0.0, 0.0, CELL_UNITY];
                for (i, v) in rows.iter().enumerate() {
                    w.put_int32(76 + i * 4, *v as i32)?;
                }
                put_point(&mut w, 112, t.to_uor_int(cell.origin), dims)?;
            } else {
                put_point(&mut w, 52, t.to_uor_int(cell.rnglow), dims)?;
                put_point(&mut w, 60, t.to_uor_int(cell.rnghigh), dims)?;
                for (i, v) in m.iter().enumerate() {
                    w.put_int32(68 + i * 4, *v as i32)?;
                }
                put_point(&mut w, 84, t.to_uor_int(cell.origin), dims)?;
            }
        }

        element.kind = ElementKind::CellHeader(cell.clone());
        update_core_fields(&mut element)?;
        Ok(element)
    }

    /// Cell header for `members`, which are marked as complex members.
    ///
    /// Without explicit `levels` the mask of the members' levels is used.
    #[allow(clippy::too_many_arguments)]
    pub fn create_cell_header_from_group(
        &mut self,
        name: &str,
        cclass: u16,
        levels: Option<[u16; 4]>,
        members: &mut [Element],
        origin: Vector3,
        xscale: f64,
        yscale: f64,
        rotation: f64,
    ) -> Result<Element> {
        self.prepare_factory()?;
        let (words, bounds) = self.collect_group(members, "cell")?;
        let base = if self.state.is_3d() { 43 } else { 27 };
        let levels = levels.unwrap_or_else(|| level_mask(members.iter().map(|m| m.core.level)));

        let cell = CellHeader {
            totlength: (base + words) as u16,
            name: name.to_string(),
            cclass,
            levels,
            rnglow: bounds.min,
            rnghigh: bounds.max,
            origin,
            xscale,
            yscale,
            rotation,
            ..Default::default()
        };
        let mut element = self.create_cell_header(&cell)?;
        write_bounds(&mut element, &self.state.transform, bounds.min, bounds.max)?;
        Ok(element)
    }
}
