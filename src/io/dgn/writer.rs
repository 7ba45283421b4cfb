//! Writing elements back to a design file.
//!
//! Writing works on the element's raw image: factories build it, decoded
//! elements carry it when read with `capture_raw_data`. Struct fields are
//! only pushed into the image by [`update_core_fields`]; everything else is
//! the caller's job.

use super::cursor::ByteCursorMut;
use super::file::{DgnFile, DgnReaderConfiguration};
use super::linkage::{linkage_type, linkages};
use super::raw_reader::{RawHeader, MAX_ELEMENT_SIZE};
use crate::elements::{Element, ElementKind, StructureType};
use crate::error::{DgnError, Result};
use crate::types::{CoordinateTransform, ElementProperties, Vector3};
use bitflags::bitflags;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Largest record a linkage may grow an element to.
pub const MAX_LINKED_ELEMENT_SIZE: usize = 768;

/// Size of the seed TCB record.
const TCB_SIZE: usize = 1536;

bitflags! {
    /// Options for [`DgnFile::create`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CreationFlags: u32 {
        /// Keep the seed's working units instead of the given ones
        const USE_SEED_UNITS = 0x01;
        /// Keep the seed's global origin
        const USE_SEED_ORIGIN = 0x02;
        /// Copy the seed's color table
        const COPY_SEED_FILE_COLOR_TABLE = 0x04;
        /// Copy every seed element, not just the leading ones
        const COPY_WHOLE_SEED_FILE = 0x08;
    }
}

/// Working units of a new file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    /// Two character master unit name
    pub master_units: String,
    pub sub_units_per_master: i32,
    /// Two character sub unit name
    pub sub_units: String,
    pub uor_per_sub_unit: i32,
}

impl UnitSpec {
    pub fn new(
        master_units: impl Into<String>,
        sub_units_per_master: i32,
        sub_units: impl Into<String>,
        uor_per_sub_unit: i32,
    ) -> Self {
        UnitSpec {
            master_units: master_units.into(),
            sub_units_per_master,
            sub_units: sub_units.into(),
            uor_per_sub_unit,
        }
    }
}

// ============================================================================
// Raw image updates
// ============================================================================

fn require_raw(element: &Element, min: usize) -> Result<()> {
    if element.core.raw_data.len() < min {
        return Err(DgnError::ContractViolation(format!(
            "{} element needs a raw image of at least {} bytes, has {}",
            element.core.type_name(),
            min,
            element.core.raw_data.len()
        )));
    }
    Ok(())
}

/// Push the core fields (level, type, flags, size, symbology) into the raw
/// image.
///
/// A zero attribute index is pointed at the current end of the record.
pub fn update_core_fields(element: &mut Element) -> Result<()> {
    require_raw(element, 36)?;
    let core = &mut element.core;
    let len = core.raw_data.len();
    let words = (len / 2 - 2) as u16;
    let display_header = core.has_display_header();
    let rd = &mut core.raw_data;

    rd[0] = core.level | if core.complex { 0x80 } else { 0 };
    rd[1] = core.element_type | if core.deleted { 0x80 } else { 0 };
    rd[2..4].copy_from_slice(&words.to_le_bytes());

    if rd[30] == 0 && rd[31] == 0 {
        let attr_index = ((len - 32) / 2) as u16;
        rd[30..32].copy_from_slice(&attr_index.to_le_bytes());
    }

    if len > 36 && display_header {
        rd[28..30].copy_from_slice(&core.graphic_group.to_le_bytes());
        rd[32..34].copy_from_slice(&core.properties.bits().to_le_bytes());
        rd[34] = (core.style & 0x07) | (core.weight << 3);
        rd[35] = core.color;
    }
    Ok(())
}

/// Set the common display fields and push them into the raw image.
pub fn update_element_core(
    element: &mut Element,
    level: u8,
    graphic_group: u16,
    color: u8,
    weight: u8,
    style: u8,
) -> Result<()> {
    let core = &mut element.core;
    core.level = level & 0x3f;
    core.graphic_group = graphic_group;
    core.color = color;
    core.weight = weight & 0x1f;
    core.style = style & 0x07;
    update_core_fields(element)
}

/// Write the range block from master unit bounds.
pub fn write_bounds(
    element: &mut Element,
    transform: &CoordinateTransform,
    min: Vector3,
    max: Vector3,
) -> Result<()> {
    require_raw(element, 28)?;
    let lo = transform.to_uor_int(min);
    let hi = transform.to_uor_int(max);
    let mut w = ByteCursorMut::new(&mut element.core.raw_data);
    for axis in 0..3 {
        w.put_int32(4 + axis * 4, lo[axis])?;
        w.put_int32(16 + axis * 4, hi[axis])?;
    }
    // Flip the sign bits so the stored values are biased by 2^31.
    for at in [5, 9, 13, 17, 21, 25] {
        element.core.raw_data[at] ^= 0x80;
    }
    Ok(())
}

// ============================================================================
// Attribute linkages
// ============================================================================

/// Append a linkage to an element; returns its index among the element's
/// linkages.
///
/// Odd sized data is padded with a zero byte. The element is left untouched
/// if the result would exceed [`MAX_LINKED_ELEMENT_SIZE`].
pub fn add_raw_linkage(element: &mut Element, data: &[u8]) -> Result<usize> {
    require_raw(element, 36)?;
    let mut link = data.to_vec();
    if link.len() % 2 == 1 {
        link.push(0);
    }

    let size = element.core.raw_data.len();
    if size + link.len() > MAX_LINKED_ELEMENT_SIZE {
        return Err(DgnError::InvalidArgument(format!(
            "adding a {} byte linkage to a {} byte element exceeds the maximum element size",
            link.len(),
            size
        )));
    }

    element.core.properties |= ElementProperties::ATTRIBUTES;
    element.core.attr_data.extend_from_slice(&link);
    element.core.raw_data.extend_from_slice(&link);

    let grow = (link.len() / 2) as u16;
    let totlength = match &mut element.kind {
        ElementKind::ComplexHeader(h) => {
            h.totlength = h.totlength.wrapping_add(grow);
            Some(h.totlength)
        }
        ElementKind::TextNode(n) => {
            n.totlength = n.totlength.wrapping_add(grow);
            Some(n.totlength)
        }
        _ => None,
    };
    if let Some(total) = totlength {
        element.core.raw_data[36..38].copy_from_slice(&total.to_le_bytes());
    }

    update_core_fields(element)?;
    element.core.size = element.core.raw_data.len();

    Ok(linkages(element).count().saturating_sub(1))
}

/// Append a database (MSLINK) linkage.
pub fn add_ms_link(
    element: &mut Element,
    link_type: u16,
    entity_num: u16,
    ms_link: u32,
) -> Result<usize> {
    let e = entity_num.to_le_bytes();
    let m = ms_link.to_le_bytes();
    if link_type == linkage_type::DMRS {
        add_raw_linkage(element, &[0x00, 0x00, e[0], e[1], m[0], m[1], m[2], 0x01])
    } else {
        let t = link_type.to_le_bytes();
        add_raw_linkage(
            element,
            &[
                0x07, 0x10, t[0], t[1], 0x81, 0x0f, e[0], e[1], m[0], m[1], m[2], m[3], 0, 0, 0, 0,
            ],
        )
    }
}

/// Append a shape fill linkage.
pub fn add_shape_fill_info(element: &mut Element, color: u8) -> Result<usize> {
    add_raw_linkage(
        element,
        &[
            0x07, 0x10, 0x41, 0x00, 0x02, 0x08, 0x01, 0x00, color, 0, 0, 0, 0, 0, 0, 0,
        ],
    )
}

// ============================================================================
// Session writes
// ============================================================================

impl<S: Read + Write + Seek> DgnFile<S> {
    /// Change the size of an element's raw image.
    ///
    /// An element that lives in the file is tombstoned there (its deleted
    /// bit is set) and loses its position, so the next write appends it.
    /// That includes an element whose image already has `new_size` bytes
    /// but whose stored record differs, as after adding linkages.
    /// Growing pads with zeros.
    pub fn resize_element(&mut self, element: &mut Element, new_size: usize) -> Result<()> {
        let core = &element.core;
        if core.raw_data.is_empty() || core.raw_data.len() != core.size {
            return Err(DgnError::ContractViolation(format!(
                "cannot resize an element without a complete raw image ({} of {} bytes)",
                core.raw_data.len(),
                core.size
            )));
        }
        if new_size % 2 == 1 || !(36..=MAX_ELEMENT_SIZE).contains(&new_size) {
            return Err(DgnError::InvalidArgument(format!(
                "{} is not a valid element size",
                new_size
            )));
        }
        let stored = match core.offset {
            Some(offset) => Some(self.stored_record_size(offset)?),
            None => None,
        };
        if new_size == core.size && stored.map_or(true, |size| size == new_size) {
            return Ok(());
        }

        if let Some(offset) = core.offset {
            let saved = self.stream.stream_position()?;
            self.stream.seek(SeekFrom::Start(offset))?;
            let mut head = [0u8; 2];
            self.stream.read_exact(&mut head)?;
            head[1] |= 0x80;
            self.stream.seek(SeekFrom::Start(offset))?;
            self.stream.write_all(&head)?;
            self.stream.seek(SeekFrom::Start(saved))?;

            if let (Some(id), Some(index)) = (core.element_id, self.index.as_mut()) {
                index.mark_deleted(id);
            }
            tracing::debug!(offset, "tombstoned element before resize");
        }

        let core = &mut element.core;
        core.clear_position();
        core.raw_data.resize(new_size, 0);
        core.size = new_size;
        let words = (new_size / 2 - 2) as u16;
        core.raw_data[2..4].copy_from_slice(&words.to_le_bytes());
        Ok(())
    }

    /// Write an element's raw image.
    ///
    /// Elements with a file position are rewritten in place; the record on
    /// disk must have the same size (see [`resize_element`](Self::resize_element)).
    /// Others are appended after the last element and get the next id. The
    /// end marker is rewritten only once the record bytes are flushed, and
    /// the index and element position change only after the write succeeds.
    pub fn write_element(&mut self, element: &mut Element) -> Result<()> {
        require_raw(element, 4)?;

        match (element.core.offset, element.core.element_id) {
            (Some(offset), Some(id)) => self.rewrite_in_place(element, offset, id),
            (None, _) => self.append_element(element),
            (Some(_), None) => Err(DgnError::ContractViolation(
                "element has a file offset but no element id".into(),
            )),
        }
    }

    fn rewrite_in_place(&mut self, element: &Element, offset: u64, id: usize) -> Result<()> {
        let raw = &element.core.raw_data;

        let on_disk = self.stored_record_size(offset)?;
        if on_disk != raw.len() {
            return Err(DgnError::ContractViolation(format!(
                "element {} is {} bytes but its record on disk is {}; resize it before writing",
                id,
                raw.len(),
                on_disk
            )));
        }

        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.write_all(raw)?;
        self.stream.flush()?;
        self.reader.set_next_element_id(id + 1);
        self.filter.reset_group();

        tracing::trace!(element_id = id, offset, "rewrote element");
        Ok(())
    }

    /// Size of the record stored at `offset`, leaving the stream where it was.
    fn stored_record_size(&mut self, offset: u64) -> Result<usize> {
        let saved = self.stream.stream_position()?;
        self.stream.seek(SeekFrom::Start(offset))?;
        let mut head = [0u8; 4];
        self.stream.read_exact(&mut head)?;
        self.stream.seek(SeekFrom::Start(saved))?;
        Ok(RawHeader::parse(&head).size)
    }

    fn append_element(&mut self, element: &mut Element) -> Result<()> {
        self.build_index()?;

        let last = self.index.as_ref().and_then(|i| i.last()).copied();
        let offset = match last {
            Some(entry) => {
                self.stream.seek(SeekFrom::Start(entry.offset))?;
                let mut head = [0u8; 4];
                self.stream.read_exact(&mut head)?;
                entry.offset + RawHeader::parse(&head).size as u64
            }
            None => 0,
        };
        let id = self.index.as_ref().map_or(0, |i| i.len());

        let raw = &element.core.raw_data;
        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.write_all(raw)?;
        self.stream.flush()?;
        self.stream.write_all(&[0xff, 0xff])?;
        self.stream.flush()?;
        self.stream.seek(SeekFrom::Current(-2))?;

        let header = RawHeader::parse(&[raw[0], raw[1], raw[2], raw[3]]);
        let index = self.index.get_or_insert_with(Default::default);
        index.push(offset, header, raw);
        element.core.element_id = Some(id);
        element.core.offset = Some(offset);
        self.reader.set_next_element_id(id + 1);
        self.filter.reset_group();

        tracing::trace!(element_id = id, offset, "appended element");
        Ok(())
    }

    /// Start a new design file in `target` from a seed file.
    ///
    /// The seed's TCB is copied with the requested units and origin applied,
    /// followed by the first two seed elements (or, per `flags`, the color
    /// table or the whole seed).
    pub fn create_from_seed<T: Read + Seek>(
        seed: &mut DgnFile<T>,
        mut target: S,
        flags: CreationFlags,
        origin: Vector3,
        units: &UnitSpec,
    ) -> Result<Self> {
        let seed_config = DgnReaderConfiguration {
            capture_raw_data: true,
            ..seed.config().clone()
        };
        seed.set_options(seed_config);
        seed.rewind()?;

        let tcb = match seed.read_element()? {
            Some(e) if e.structure_type() == StructureType::Tcb => e,
            _ => {
                return Err(DgnError::InvalidFormat(
                    "seed file does not start with a TCB".into(),
                ))
            }
        };
        if tcb.core.raw_data.len() < TCB_SIZE {
            return Err(DgnError::InvalidFormat(format!(
                "seed TCB is {} bytes, expected at least {}",
                tcb.core.raw_data.len(),
                TCB_SIZE
            )));
        }

        let mut raw = tcb.core.raw_data.clone();
        let mut w = ByteCursorMut::new(&mut raw);
        let (uor_per_sub, sub_per_master) = if flags.contains(CreationFlags::USE_SEED_UNITS) {
            let r = w.reader();
            (r.int32_at(1116)?, r.int32_at(1112)?)
        } else {
            w.put_bytes(1120, &unit_name(&units.master_units))?;
            w.put_bytes(1122, &unit_name(&units.sub_units))?;
            w.put_int32(1116, units.uor_per_sub_unit)?;
            w.put_int32(1112, units.sub_units_per_master)?;
            (units.uor_per_sub_unit, units.sub_units_per_master)
        };

        if !flags.contains(CreationFlags::USE_SEED_ORIGIN) {
            let uors = uor_per_sub as f64 * sub_per_master as f64;
            w.put_vax(1240, origin.x * uors)?;
            w.put_vax(1248, origin.y * uors)?;
            w.put_vax(1256, origin.z * uors)?;
        }

        target.seek(SeekFrom::Start(0))?;
        target.write_all(&raw)?;
        target.write_all(&[0xff, 0xff])?;
        target.flush()?;
        target.seek(SeekFrom::Start(0))?;

        let mut dgn = DgnFile::from_stream(target)?;

        let mut copied = 0usize;
        while let Some(src) = seed.read_element()? {
            let id = src.core.element_id.unwrap_or(0);
            let wanted = flags.contains(CreationFlags::COPY_WHOLE_SEED_FILE)
                || (src.structure_type() == StructureType::ColorTable
                    && flags.contains(CreationFlags::COPY_SEED_FILE_COLOR_TABLE))
                || id <= 2;
            if wanted {
                let mut copy = dgn.clone_element(&src)?;
                dgn.write_element(&mut copy)?;
                copied += 1;
            }
        }

        tracing::debug!(copied, ?flags, "created design file from seed");
        dgn.rewind()?;
        Ok(dgn)
    }
}

impl DgnFile<File> {
    /// Create a design file at `path` from the seed file at `seed`.
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(
        path: P,
        seed: Q,
        flags: CreationFlags,
        origin: Vector3,
        units: &UnitSpec,
    ) -> Result<Self> {
        let mut seed = DgnFile::open(seed)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        DgnFile::create_from_seed(&mut seed, file, flags, origin, units)
    }
}

impl<S: Read + Seek> DgnFile<S> {
    /// Copy of an element, possibly from another file, ready to be written
    /// into this one.
    pub fn clone_element(&mut self, element: &Element) -> Result<Element> {
        self.load_tcb()?;
        Ok(element.clone_for_write())
    }
}

/// Two byte unit name, zero padded.
fn unit_name(name: &str) -> [u8; 2] {
    let mut out = [0u8; 2];
    for (slot, b) in out.iter_mut().zip(name.bytes()) {
        *slot = b;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ComplexHeader, ElementCore, MultiPoint, TextNode};
    use crate::io::dgn::linkage::get_linkage;
    use std::io::Cursor;

    fn line_element() -> Element {
        let mut core = ElementCore::new(3, 4);
        core.raw_data = vec![0u8; 52];
        core.size = 52;
        core.color = 7;
        core.weight = 2;
        core.style = 1;
        Element::new(core, ElementKind::MultiPoint(MultiPoint::default()))
    }

    #[test]
    fn test_update_core_fields() {
        let mut e = line_element();
        e.core.complex = true;
        update_core_fields(&mut e).unwrap();
        let rd = &e.core.raw_data;
        assert_eq!(rd[0], 0x84);
        assert_eq!(rd[1], 0x03);
        assert_eq!(u16::from_le_bytes([rd[2], rd[3]]), 24);
        assert_eq!(u16::from_le_bytes([rd[30], rd[31]]), 10);
        assert_eq!(rd[34], 1 | (2 << 3));
        assert_eq!(rd[35], 7);
    }

    #[test]
    fn test_update_core_needs_raw() {
        let mut e = line_element();
        e.core.raw_data.truncate(20);
        assert!(matches!(
            update_core_fields(&mut e),
            Err(DgnError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_write_bounds_biases() {
        let mut e = line_element();
        write_bounds(
            &mut e,
            &CoordinateTransform::default(),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(10.0, 20.0, 0.0),
        )
        .unwrap();
        let ext = super::super::filter::raw_extents(3, &e.core.raw_data).unwrap();
        let (min, max) = ext.unbiased();
        assert_eq!(min, [-1.0, 0.0, 0.0]);
        assert_eq!(max, [10.0, 20.0, 0.0]);
    }

    #[test]
    fn test_add_ms_link() {
        let mut e = line_element();
        update_core_fields(&mut e).unwrap();
        assert_eq!(add_ms_link(&mut e, linkage_type::DMRS, 5, 0x01_0203).unwrap(), 0);
        assert_eq!(add_ms_link(&mut e, linkage_type::ORACLE, 7, 99).unwrap(), 1);

        assert_eq!(e.core.size, 52 + 8 + 16);
        assert!(e.core.properties.contains(ElementProperties::ATTRIBUTES));

        let dmrs = get_linkage(&e, 0).unwrap();
        assert_eq!(dmrs.entity_num, 5);
        assert_eq!(dmrs.ms_link, 0x01_0203);
        let oracle = get_linkage(&e, 1).unwrap();
        assert_eq!(oracle.linkage_type, linkage_type::ORACLE);
        assert_eq!(oracle.entity_num, 7);
        assert_eq!(oracle.ms_link, 99);
    }

    #[test]
    fn test_linkage_size_limit() {
        let mut e = line_element();
        e.core.raw_data.resize(760, 0);
        e.core.size = 760;
        let before = e.clone();
        assert!(add_shape_fill_info(&mut e, 3).is_err());
        assert_eq!(e, before);
    }

    #[test]
    fn test_linkage_grows_complex_totlength() {
        let mut core = ElementCore::new(12, 1);
        core.raw_data = vec![0u8; 40];
        core.size = 40;
        let mut e = Element::new(
            core,
            ElementKind::ComplexHeader(ComplexHeader {
                totlength: 10,
                numelems: 2,
                ..Default::default()
            }),
        );
        add_shape_fill_info(&mut e, 9).unwrap();
        assert_eq!(e.as_complex_header().unwrap().totlength, 18);
        assert_eq!(u16::from_le_bytes([e.core.raw_data[36], e.core.raw_data[37]]), 18);

        let mut core = ElementCore::new(7, 1);
        core.raw_data = vec![0u8; 60];
        core.size = 60;
        let mut node = Element::new(
            core,
            ElementKind::TextNode(TextNode {
                totlength: 3,
                ..Default::default()
            }),
        );
        add_raw_linkage(&mut node, &[0x00, 0x00, 1, 0, 2, 0, 0, 1]).unwrap();
        assert_eq!(u16::from_le_bytes([node.core.raw_data[36], node.core.raw_data[37]]), 7);
    }

    #[test]
    fn test_odd_linkage_padded() {
        let mut e = line_element();
        update_core_fields(&mut e).unwrap();
        add_raw_linkage(&mut e, &[0x00, 0x00, 1, 0, 2, 0, 0]).unwrap();
        assert_eq!(e.core.attr_data.len(), 8);
        assert_eq!(e.core.raw_data.len(), 60);
    }

    fn tcb() -> Vec<u8> {
        let mut raw = vec![0u8; TCB_SIZE];
        raw[0] = 0x08;
        raw[1] = 0x09;
        raw[2] = 0xfe;
        raw[3] = 0x02;
        raw
    }

    #[test]
    fn test_append_and_resize() {
        let mut bytes = tcb();
        bytes.extend_from_slice(&[0xff, 0xff]);
        let mut dgn = DgnFile::from_stream(Cursor::new(bytes)).unwrap();

        let mut e = line_element();
        update_core_fields(&mut e).unwrap();
        dgn.write_element(&mut e).unwrap();
        assert_eq!(e.core.element_id, Some(1));
        assert_eq!(e.core.offset, Some(TCB_SIZE as u64));

        dgn.resize_element(&mut e, 60).unwrap();
        assert_eq!(e.core.offset, None);
        assert_eq!(&e.core.raw_data[2..4], &[28, 0]);
        dgn.write_element(&mut e).unwrap();
        assert_eq!(e.core.element_id, Some(2));

        let index = dgn.element_index().unwrap();
        assert_eq!(index.len(), 3);
        assert!(index[1].is_deleted());
        assert!(!index[2].is_deleted());

        let bytes = dgn.into_inner().into_inner();
        assert_eq!(bytes.len(), TCB_SIZE + 52 + 60 + 2);
        assert_eq!(bytes[TCB_SIZE + 1], 0x83);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xff, 0xff]);
    }

    #[test]
    fn test_resize_contract() {
        let mut dgn = DgnFile::from_stream(Cursor::new(tcb())).unwrap();
        let mut e = line_element();
        assert!(matches!(
            dgn.resize_element(&mut e, 55),
            Err(DgnError::InvalidArgument(_))
        ));
        e.core.size = 10;
        assert!(matches!(
            dgn.resize_element(&mut e, 60),
            Err(DgnError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_unit_name() {
        assert_eq!(unit_name("MU"), *b"MU");
        assert_eq!(unit_name("m"), [b'm', 0]);
        assert_eq!(unit_name("feet"), *b"fe");
    }
}
